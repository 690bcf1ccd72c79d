//! CLI commands for refdoc: build and check.

use std::path::PathBuf;
use std::process::ExitCode;

use crate::assembler::{Assembler, Assembly};
use crate::codec;
use crate::config::Config;
use crate::error::Error;
use crate::formatter::ManifestFormatter;
use crate::manifest::Corpus;
use crate::symbols::TypeSymbol;

/// Command-line overrides layered over `.refdoc.toml`.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// Explicit config file instead of `./.refdoc.toml`.
    pub config: Option<PathBuf>,
    /// Manifest directory.
    pub input: Option<PathBuf>,
    /// Page directory.
    pub output: Option<PathBuf>,
}

impl Overrides {
    /// Load the config and apply these overrides on top.
    ///
    /// # Errors
    ///
    /// Returns config loading errors.
    pub fn resolve(&self) -> Result<Config, Error> {
        let mut config = match &self.config {
            Some(path) => Config::load_file(path)?,
            None => Config::load(&PathBuf::from("."))?,
        };
        if let Some(input) = &self.input {
            config.input.clone_from(input);
        }
        if let Some(output) = &self.output {
            config.output.clone_from(output);
        }
        return Ok(config);
    }
}

/// Load, consolidate, merge, and assemble without touching the output directory.
///
/// # Errors
///
/// Returns the first fatal condition from any stage.
fn run_pipeline(config: &Config) -> Result<(Corpus, Assembly), Error> {
    let corpus = Corpus::load(&config.input, config.on_conflict)?;
    tracing::debug!(
        types = corpus.types.len(),
        references = corpus.registry.len(),
        "corpus consolidated"
    );

    let formatter = ManifestFormatter::new(&corpus.registry, config.language);
    let symbols: Vec<&TypeSymbol> = corpus.types.values().collect();
    let assembly = Assembler::new(&formatter)
        .with_exclusions(config.exclusions.clone())
        .parallel(config.parallel)
        .assemble(&symbols)?;
    return Ok((corpus, assembly));
}

/// Encode everything `build` would write and decode it back, so `check`
/// catches what the persisted form would reject.
///
/// # Errors
///
/// Returns codec errors from either direction.
fn verify_encoding(corpus: &Corpus, assembly: &Assembly) -> Result<(), Error> {
    for page in &assembly.pages {
        codec::decode_page(&codec::encode_page(page)?)?;
    }
    codec::decode_toc(&codec::encode_toc(&assembly.toc)?)?;
    codec::decode_references(&codec::encode_references(corpus.registry.items())?)?;
    return Ok(());
}

/// Assemble every page and write pages, `toc.yml`, and `references.yml`.
///
/// # Errors
///
/// Returns pipeline errors or write failures.
pub fn build(overrides: &Overrides) -> Result<ExitCode, Error> {
    let config = overrides.resolve()?;
    let (corpus, assembly) = run_pipeline(&config)?;

    for page in &assembly.pages {
        let path = codec::write_page(&config.output, page)?;
        tracing::debug!(path = %path.display(), "page written");
    }
    let toc_path = codec::write_toc(&config.output, &assembly.toc)?;
    tracing::info!(path = %toc_path.display(), namespaces = assembly.toc.namespaces.len(), "table of contents written");
    codec::write_references(&config.output, corpus.registry.items())?;

    let count = assembly.pages.len();
    tracing::info!(pages = count, output = %config.output.display(), "build finished");
    println!("Wrote {count} pages to {}", config.output.display());
    return Ok(ExitCode::SUCCESS);
}

/// Run the pipeline and report every disagreement settled by policy.
///
/// Exit 0 when every fragment agreed, 1 when conflicts were resolved or
/// incongruent fragments were discarded.
///
/// # Errors
///
/// Returns pipeline errors, including `Error::ScalarConflict` and projection
/// mismatches under the abort policy.
pub fn check(overrides: &Overrides) -> Result<ExitCode, Error> {
    let config = overrides.resolve()?;
    let (corpus, assembly) = run_pipeline(&config)?;
    verify_encoding(&corpus, &assembly)?;

    let conflicts = corpus.registry.conflicts();
    for recorded in conflicts {
        println!(
            "CONFLICT  {} {}: kept `{}`, discarded `{}`",
            recorded.id, recorded.conflict.field, recorded.conflict.kept, recorded.conflict.discarded
        );
    }
    let mismatches = corpus.registry.mismatches();
    for recorded in mismatches {
        println!(
            "MISMATCH  {} {} ({}): fragment discarded",
            recorded.id, recorded.projection, recorded.language
        );
        tracing::debug!(id = %recorded.id, reason = %recorded.reason, "discarded fragment");
    }

    if conflicts.is_empty() && mismatches.is_empty() {
        println!(
            "All {} symbols consistent, {} pages",
            corpus.registry.len(),
            assembly.pages.len()
        );
        return Ok(ExitCode::SUCCESS);
    }
    println!();
    println!("{} conflicts, {} mismatches", conflicts.len(), mismatches.len());
    return Ok(ExitCode::from(1));
}
