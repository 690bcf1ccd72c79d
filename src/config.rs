use std::path::{Path, PathBuf};

use crate::assembler::Exclusions;
use crate::error::Error;
use crate::reference::SyntaxLanguage;
use crate::registry::ConflictPolicy;

/// Config file looked up in the working directory.
pub const CONFIG_FILE: &str = ".refdoc.toml";

/// Project configuration loaded from `.refdoc.toml`.
/// Relative `input` and `output` paths resolve against the config's directory.
#[derive(Debug, Clone)]
pub struct Config {
    /// Extra type names and namespaces to skip.
    pub exclusions: Exclusions,
    /// Directory of extraction manifests.
    pub input: PathBuf,
    /// Page language.
    pub language: SyntaxLanguage,
    /// What to do when fragments disagree on a scalar.
    pub on_conflict: ConflictPolicy,
    /// Directory pages are written to.
    pub output: PathBuf,
    /// Assemble pages on the rayon pool.
    pub parallel: bool,
}

/// Raw TOML structure for `.refdoc.toml`.
#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct RefdocTomlConfig {
    #[serde(default)]
    exclude_names: Vec<String>,
    #[serde(default)]
    exclude_namespaces: Vec<String>,
    #[serde(default)]
    input: Option<PathBuf>,
    #[serde(default)]
    language: SyntaxLanguage,
    #[serde(default)]
    on_conflict: ConflictPolicy,
    #[serde(default)]
    output: Option<PathBuf>,
    #[serde(default)]
    parallel: bool,
}

impl Config {
    /// Load config from `.refdoc.toml` in the given root directory.
    /// Returns defaults if the file doesn't exist. A file that exists but is
    /// malformed is an error, never a silent fallback.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails (other than not-found),
    /// or `Error::TomlDe` if the TOML is malformed.
    pub fn load(root: &Path) -> Result<Self, Error> {
        let path = root.join(CONFIG_FILE);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::defaults(root)),
            Err(e) => return Err(Error::Io(e)),
        };
        return Self::parse(root, &content);
    }

    /// Load an explicitly named config file; its directory is the root.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigNotFound` if the file does not exist, otherwise
    /// the same errors as [`Config::load`].
    pub fn load_file(path: &Path) -> Result<Self, Error> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::ConfigNotFound { path: path.to_path_buf() });
            },
            Err(e) => return Err(Error::Io(e)),
        };
        let root = path.parent().unwrap_or_else(|| return Path::new("."));
        return Self::parse(root, &content);
    }

    /// Parse TOML content rooted at `root`.
    fn parse(root: &Path, content: &str) -> Result<Self, Error> {
        let raw: RefdocTomlConfig = toml::from_str(content)?;
        let defaults = Self::defaults(root);
        return Ok(Self {
            input: raw.input.map_or(defaults.input, |p| return root.join(p)),
            output: raw.output.map_or(defaults.output, |p| return root.join(p)),
            language: raw.language,
            on_conflict: raw.on_conflict,
            exclusions: Exclusions {
                names: raw.exclude_names,
                namespaces: raw.exclude_namespaces,
            },
            parallel: raw.parallel,
        });
    }

    /// `obj/api` in, `api` out, C#, prefer-base, sequential.
    fn defaults(root: &Path) -> Self {
        return Self {
            input: root.join("obj").join("api"),
            output: root.join("api"),
            language: SyntaxLanguage::default(),
            on_conflict: ConflictPolicy::default(),
            exclusions: Exclusions::default(),
            parallel: false,
        };
    }
}
