//! Extraction manifests: discovery, loading, and consolidation into a corpus.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;
use walkdir::WalkDir;

use crate::error::Error;
use crate::reference::{ReferenceItem, SyntaxLanguage};
use crate::registry::{ConflictPolicy, ReferenceRegistry};
use crate::symbols::TypeSymbol;

/// One extraction pass over one module.
#[derive(Debug, Deserialize)]
pub struct Manifest {
    /// Language the pass rendered names in.
    #[serde(default)]
    pub language: Option<SyntaxLanguage>,
    /// Declaring module name, without extension.
    pub module: String,
    /// Reference fragments by symbol id, in file order.
    #[serde(default)]
    pub references: IndexMap<String, ReferenceItem>,
    /// Top-level types seen by the pass.
    #[serde(default)]
    pub types: Vec<TypeSymbol>,
}

impl Manifest {
    /// Read and parse one manifest file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the file cannot be read, or
    /// `Error::ManifestCorrupt` if it is not a valid manifest.
    pub fn read(path: &Path) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path)?;
        return serde_json::from_str(&content).map_err(|e| {
            return Error::ManifestCorrupt {
                path: path.to_path_buf(),
                reason: e.to_string(),
            };
        });
    }
}

/// Every `*.json` file under `input`, in sorted path order.
///
/// # Errors
///
/// Returns `Error::Io` if `input` cannot be walked.
pub fn discover(input: &Path) -> Result<Vec<PathBuf>, Error> {
    let mut paths = Vec::new();
    for entry in WalkDir::new(input).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        if entry.file_type().is_file() && entry.path().extension().is_some_and(|ext| return ext == "json") {
            paths.push(entry.into_path());
        }
    }
    return Ok(paths);
}

/// Consolidated extraction output: one record per type, one merged fragment per symbol.
#[derive(Debug)]
pub struct Corpus {
    /// Merged reference fragments.
    pub registry: ReferenceRegistry,
    /// Types by full id, partial declarations folded together.
    pub types: BTreeMap<String, TypeSymbol>,
}

impl Corpus {
    /// Empty corpus whose registry applies `policy`.
    pub fn new(policy: ConflictPolicy) -> Self {
        return Self {
            types: BTreeMap::new(),
            registry: ReferenceRegistry::new(policy),
        };
    }

    /// Load every manifest under `input` in sorted order.
    ///
    /// # Errors
    ///
    /// Returns the first read, parse, or merge failure.
    pub fn load(input: &Path, policy: ConflictPolicy) -> Result<Self, Error> {
        let mut corpus = Self::new(policy);
        for path in discover(input)? {
            let manifest = Manifest::read(&path)?;
            tracing::debug!(
                path = %path.display(),
                module = %manifest.module,
                language = ?manifest.language,
                types = manifest.types.len(),
                references = manifest.references.len(),
                "manifest loaded"
            );
            corpus.add(manifest)?;
        }
        if corpus.types.is_empty() && corpus.registry.is_empty() {
            tracing::warn!(input = %input.display(), "no extraction output found");
        }
        return Ok(corpus);
    }

    /// Fold one manifest in: types are consolidated by id, fragments merged by id.
    ///
    /// # Errors
    ///
    /// Returns merge failures from the registry.
    pub fn add(&mut self, manifest: Manifest) -> Result<(), Error> {
        for mut symbol in manifest.types {
            if symbol.module.is_empty() {
                symbol.module.clone_from(&manifest.module);
            }
            match self.types.get_mut(&symbol.id) {
                Some(existing) => existing.absorb(symbol),
                None => {
                    self.types.insert(symbol.id.clone(), symbol);
                },
            }
        }
        for (id, fragment) in manifest.references {
            self.registry.ingest(&id, fragment)?;
        }
        return Ok(());
    }
}
