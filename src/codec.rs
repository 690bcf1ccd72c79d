//! YAML persistence for pages, the table of contents, and merged references.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::page::ReferencePage;
use crate::reference::ReferenceItem;
use crate::toc::{Toc, page_href};

/// Schema marker on the first line of every page file.
pub const PAGE_MIME: &str = "#YamlMime:Reference";

/// Schema marker on the first line of the TOC file.
pub const TOC_MIME: &str = "#YamlMime:TableOfContent";

/// TOC file name inside the output directory.
pub const TOC_FILE: &str = "toc.yml";

/// Merged reference file name inside the output directory.
pub const REFERENCES_FILE: &str = "references.yml";

/// Serialize a page with its schema marker.
///
/// # Errors
///
/// Returns `Error::Yaml` if serialization fails.
pub fn encode_page(page: &ReferencePage) -> Result<String, Error> {
    return Ok(format!("{PAGE_MIME}\n{}", serde_yaml::to_string(page)?));
}

/// Parse a page document and re-check its invariants.
///
/// # Errors
///
/// Returns `Error::MimeMismatch` for a missing or wrong marker, `Error::Yaml`
/// for malformed content (including an invalid page id), or
/// `Error::SectionTooDeep` for an over-nested body.
pub fn decode_page(text: &str) -> Result<ReferencePage, Error> {
    let body = strip_marker(text, PAGE_MIME)?;
    let page: ReferencePage = serde_yaml::from_str(body)?;
    page.validate()?;
    return Ok(page);
}

/// Serialize the table of contents with its schema marker.
///
/// # Errors
///
/// Returns `Error::Yaml` if serialization fails.
pub fn encode_toc(toc: &Toc) -> Result<String, Error> {
    return Ok(format!("{TOC_MIME}\n{}", serde_yaml::to_string(toc)?));
}

/// Parse a table-of-contents document.
///
/// # Errors
///
/// Returns `Error::MimeMismatch` for a missing or wrong marker, or `Error::Yaml`.
pub fn decode_toc(text: &str) -> Result<Toc, Error> {
    let body = strip_marker(text, TOC_MIME)?;
    return Ok(serde_yaml::from_str(body)?);
}

/// Everything after the marker line, if the marker matches.
fn strip_marker<'a>(text: &'a str, expected: &str) -> Result<&'a str, Error> {
    let (first, rest) = text.split_once('\n').unwrap_or((text, ""));
    if first.trim_end() != expected {
        return Err(Error::MimeMismatch {
            expected: expected.to_string(),
            found: first.trim_end().to_string(),
        });
    }
    return Ok(rest);
}

/// Write `<output>/<id>.yml`, creating directories as needed.
///
/// # Errors
///
/// Returns `Error::Io` or `Error::Yaml`.
pub fn write_page(output: &Path, page: &ReferencePage) -> Result<PathBuf, Error> {
    let path = output.join(page_href(&page.id));
    write_file(&path, &encode_page(page)?)?;
    return Ok(path);
}

/// Write `<output>/toc.yml`.
///
/// # Errors
///
/// Returns `Error::Io` or `Error::Yaml`.
pub fn write_toc(output: &Path, toc: &Toc) -> Result<PathBuf, Error> {
    let path = output.join(TOC_FILE);
    write_file(&path, &encode_toc(toc)?)?;
    return Ok(path);
}

/// Write `<output>/references.yml`: every merged fragment keyed by id.
///
/// # Errors
///
/// Returns `Error::Io` or `Error::Yaml`.
pub fn write_references(output: &Path, items: &BTreeMap<String, ReferenceItem>) -> Result<PathBuf, Error> {
    let path = output.join(REFERENCES_FILE);
    write_file(&path, &encode_references(items)?)?;
    return Ok(path);
}

/// Serialize merged fragments keyed by id, using the extraction wire names.
///
/// # Errors
///
/// Returns `Error::Yaml` if serialization fails.
pub fn encode_references(items: &BTreeMap<String, ReferenceItem>) -> Result<String, Error> {
    return Ok(serde_yaml::to_string(items)?);
}

/// Read `references.yml` back.
///
/// # Errors
///
/// Returns `Error::Yaml`, including for a language missing from one projection slot.
pub fn decode_references(text: &str) -> Result<BTreeMap<String, ReferenceItem>, Error> {
    return Ok(serde_yaml::from_str(text)?);
}

/// Write `content` to `path`, creating parent directories.
fn write_file(path: &Path, content: &str) -> Result<(), Error> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    return Ok(());
}
