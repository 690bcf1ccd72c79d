//! Reference pages: one documentation unit per top-level entity.

use std::fmt;
use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::component::{Component, validate_body};
use crate::error::Error;

/// Allowed page id characters.
#[allow(clippy::expect_used, reason = "hardcoded pattern is a compile-time invariant")]
static PAGE_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"^[a-zA-Z0-9\-_.@/]+$").expect("valid regex"));

/// Stable page identifier matching `[a-zA-Z0-9-_.@/]+`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PageId(String);

impl PageId {
    /// Validate a raw id.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidPageId` when the id is empty, contains a character
    /// outside the pattern, or has an empty, `.` or `..` path segment. Ids name
    /// files under the output directory and must never leave it.
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let escapes = raw.split('/').any(|segment| return matches!(segment, "" | "." | ".."));
        if !PAGE_ID_PATTERN.is_match(raw) || escapes {
            return Err(Error::InvalidPageId { id: raw.to_string() });
        }
        return Ok(Self(raw.to_string()));
    }

    /// Derive a page id from a symbol's full identifier. The generic-arity
    /// marker (`` Box`1 ``) becomes a hyphen; nothing else is rewritten.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidPageId` when the rewritten id still fails the pattern.
    pub fn from_symbol_id(symbol_id: &str) -> Result<Self, Error> {
        return Self::parse(&symbol_id.replace('`', "-"));
    }

    /// The id text.
    pub fn as_str(&self) -> &str {
        return &self.0;
    }
}

impl TryFrom<String> for PageId {
    type Error = Error;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        return Self::parse(&raw);
    }
}

impl From<PageId> for String {
    fn from(id: PageId) -> Self {
        return id.0;
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f.write_str(&self.0);
    }
}

/// Deprecation marker: a bare flag or a markdown reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Deprecation {
    /// Deprecated (or explicitly not) without a reason.
    Flag(bool),
    /// Deprecated with a markdown reason.
    Reason(String),
}

impl Deprecation {
    /// Whether this marks something as deprecated.
    pub const fn is_deprecated(&self) -> bool {
        return match self {
            Self::Flag(flag) => *flag,
            Self::Reason(_) => true,
        };
    }
}

/// One documentation page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferencePage {
    /// Components from top to bottom.
    body: Vec<Component>,
    /// Deprecation flag or reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<Deprecation>,
    /// Page id, also the file stem.
    pub id: PageId,
    /// Language identifier of the page.
    pub language_id: String,
    /// Free-form metadata, in insertion order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<IndexMap<String, serde_json::Value>>,
    /// Short summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Page title.
    pub title: String,
}

impl ReferencePage {
    /// Build a page, validating its body.
    ///
    /// # Errors
    ///
    /// Returns `Error::SectionTooDeep` when the body nests sections past two levels.
    pub fn new(id: PageId, language_id: &str, title: String, body: Vec<Component>) -> Result<Self, Error> {
        validate_body(&body)?;
        return Ok(Self {
            id,
            language_id: language_id.to_string(),
            title,
            summary: None,
            metadata: None,
            deprecated: None,
            body,
        });
    }

    /// Components from top to bottom.
    #[cfg(test)]
    pub fn body(&self) -> &[Component] {
        return &self.body;
    }

    /// Re-check invariants on a page that did not come through [`ReferencePage::new`].
    ///
    /// # Errors
    ///
    /// Returns `Error::SectionTooDeep` when the body nests sections past two levels.
    pub fn validate(&self) -> Result<(), Error> {
        return validate_body(&self.body);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Section;

    #[test]
    fn page_id_pattern() {
        assert!(PageId::parse("Contoso.Widget").is_ok());
        assert!(PageId::parse("net/Contoso.Box-1@v2").is_ok());
        assert!(PageId::parse("").is_err());
        assert!(PageId::parse("Contoso.Box`1").is_err());
        assert!(PageId::parse("Contoso Widget").is_err());
        assert_eq!(PageId::from_symbol_id("Contoso.Box`1").unwrap().as_str(), "Contoso.Box-1");
        assert!(PageId::from_symbol_id("Contoso.Outer+Inner").is_err());
    }

    #[test]
    fn page_id_stays_inside_output() {
        assert!(PageId::parse("Contoso..Widget").is_ok());
        for raw in ["../x", "net/../../x", "..", "./x", "/etc/x", "net//x", "net/"] {
            assert!(PageId::parse(raw).is_err(), "{raw} accepted");
        }
        assert!(PageId::from_symbol_id("../Contoso.Box`1").is_err());
        let json = serde_json::json!({ "id": "../x", "languageId": "csharp", "title": "T", "body": [] });
        assert!(serde_json::from_value::<ReferencePage>(json).is_err());
    }

    #[test]
    fn deserializing_invalid_id_fails() {
        let json = serde_json::json!({ "id": "bad id", "languageId": "csharp", "title": "T", "body": [] });
        assert!(serde_json::from_value::<ReferencePage>(json).is_err());
    }

    #[test]
    fn deprecation_accepts_flag_or_reason() {
        let flag: Deprecation = serde_json::from_value(serde_json::json!(true)).unwrap();
        let reason: Deprecation = serde_json::from_value(serde_json::json!("Use `Gadget`.")).unwrap();
        assert!(flag.is_deprecated());
        assert!(reason.is_deprecated());
        assert!(!Deprecation::Flag(false).is_deprecated());
    }

    #[test]
    fn new_rejects_deep_body() {
        let json = serde_json::json!([
            { "section": "a", "body": [ { "section": "b", "body": [ { "section": "c", "body": [] } ] } ] }
        ]);
        let body: Vec<Component> = serde_json::from_value(json).unwrap();
        let id = PageId::parse("Contoso.Widget").unwrap();
        let err = ReferencePage::new(id.clone(), "csharp", "Widget Class".to_string(), body).unwrap_err();
        assert!(matches!(err, Error::SectionTooDeep { depth: 3, .. }));

        let ok = Section::new("Methods", vec![Component::markdown("x")]).unwrap();
        let page = ReferencePage::new(id, "csharp", "Widget Class".to_string(), vec![ok.into()]).unwrap();
        assert_eq!(page.body().len(), 1);
    }
}
