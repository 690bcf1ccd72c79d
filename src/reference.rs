//! Reference fragments: per-symbol, per-language partial descriptions.
//!
//! A fragment is what one extraction pass knows about one symbol. Its three
//! name projections are held together per language in a [`Projections`]
//! triple, so a language key can never be present in one slot and missing
//! from another. The persisted form keeps the three slots as separate
//! mappings and is converted at the serde boundary.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Prefix the extraction collaborator puts on comment ids it could not resolve.
const UNRESOLVED_PREFIX: &str = "!:";

/// Source language a projection was rendered in. Ordering is the iteration
/// order of every per-language loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SyntaxLanguage {
    /// C#.
    #[default]
    CSharp,
    /// F#.
    FSharp,
    /// Visual Basic.
    VB,
}

impl SyntaxLanguage {
    /// Language identifier used on pages and declaration blocks.
    pub const fn language_id(self) -> &'static str {
        return match self {
            Self::CSharp => "csharp",
            Self::VB => "vb",
            Self::FSharp => "fsharp",
        };
    }
}

impl fmt::Display for SyntaxLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f.write_str(self.language_id());
    }
}

/// One of the three display verbosities of a symbol name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Projection {
    /// Short name, e.g. `Add(int)`.
    Name,
    /// Name with containing type, e.g. `Widget.Add(int)`.
    NameWithType,
    /// Fully qualified, e.g. `Contoso.Widget.Add(int)`.
    QualifiedName,
}

impl Projection {
    /// All projections in slot order.
    pub const ALL: [Self; 3] = [Self::Name, Self::NameWithType, Self::QualifiedName];
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Name => "name",
            Self::NameWithType => "nameWithType",
            Self::QualifiedName => "qualifiedName",
        };
        return f.write_str(name);
    }
}

/// One token of a name projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkItem {
    /// Text shown for this token.
    #[serde(rename = "name")]
    pub display_name: String,
    /// Resolved later; `None` until then.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    /// True when the target has no in-repository declaration.
    #[serde(rename = "isExternal", default, skip_serializing_if = "std::ops::Not::not")]
    pub is_external_path: bool,
    /// Id of the referenced symbol; `None` for punctuation and other non-symbol tokens.
    #[serde(rename = "id", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[cfg(test)]
impl LinkItem {
    /// A token referencing a documented symbol.
    pub fn symbol(id: &str, display_name: &str, is_external_path: bool) -> Self {
        return Self {
            name: Some(id.to_string()),
            display_name: display_name.to_string(),
            is_external_path,
            href: None,
        };
    }

    /// A punctuation or keyword token with no symbol behind it.
    pub fn text(display_name: &str) -> Self {
        return Self {
            name: None,
            display_name: display_name.to_string(),
            is_external_path: false,
            href: None,
        };
    }
}

/// The three parallel projections of one symbol in one language.
/// An empty sequence means "not populated yet".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Projections {
    /// Short-name tokens.
    pub name: Vec<LinkItem>,
    /// Name-with-type tokens.
    pub name_with_type: Vec<LinkItem>,
    /// Qualified-name tokens.
    pub qualified_name: Vec<LinkItem>,
}

impl Projections {
    /// Borrow the sequence for one slot.
    pub fn get(&self, projection: Projection) -> &[LinkItem] {
        return match projection {
            Projection::Name => &self.name,
            Projection::NameWithType => &self.name_with_type,
            Projection::QualifiedName => &self.qualified_name,
        };
    }

    /// Mutably borrow the sequence for one slot.
    pub fn get_mut(&mut self, projection: Projection) -> &mut Vec<LinkItem> {
        return match projection {
            Projection::Name => &mut self.name,
            Projection::NameWithType => &mut self.name_with_type,
            Projection::QualifiedName => &mut self.qualified_name,
        };
    }
}

/// A documentation-comment id as reported by extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CommentId {
    /// A usable id such as `T:Contoso.Widget`.
    Resolved(String),
    /// The collaborator could not resolve the id; holds the raw text after the `!:` prefix.
    Unresolved(String),
}

impl CommentId {
    /// Whether this id can be used to look documentation up.
    pub const fn is_resolved(&self) -> bool {
        return matches!(self, Self::Resolved(_));
    }
}

impl From<String> for CommentId {
    fn from(raw: String) -> Self {
        return match raw.strip_prefix(UNRESOLVED_PREFIX) {
            Some(rest) => Self::Unresolved(rest.to_string()),
            None => Self::Resolved(raw),
        };
    }
}

impl From<CommentId> for String {
    fn from(id: CommentId) -> Self {
        return match id {
            CommentId::Resolved(value) => value,
            CommentId::Unresolved(rest) => format!("{UNRESOLVED_PREFIX}{rest}"),
        };
    }
}

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return match self {
            Self::Resolved(value) => f.write_str(value),
            Self::Unresolved(rest) => write!(f, "{UNRESOLVED_PREFIX}{rest}"),
        };
    }
}

/// The mergeable unit describing one logical API symbol.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireReferenceItem", into = "WireReferenceItem")]
pub struct ReferenceItem {
    /// Name projections keyed by language, iterated in language order.
    pub projections: BTreeMap<SyntaxLanguage, Projections>,
    /// Whether this fragment comes from the symbol's declaration site.
    pub is_definition: Option<bool>,
    /// Id of the canonical defining symbol, for references to symbols defined elsewhere.
    pub definition: Option<String>,
    /// Id of the logically containing symbol.
    pub parent: Option<String>,
    /// Raw documentation-comment id.
    pub comment_id: Option<CommentId>,
}

impl ReferenceItem {
    /// Tokens for one projection in one language, if populated.
    pub fn tokens(&self, language: SyntaxLanguage, projection: Projection) -> Option<&[LinkItem]> {
        let tokens = self.projections.get(&language)?.get(projection);
        if tokens.is_empty() {
            return None;
        }
        return Some(tokens);
    }
}

/// Persisted shape: three independent slot mappings as the extraction tools emit them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireReferenceItem {
    /// Short-name slot.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    name: BTreeMap<SyntaxLanguage, Vec<LinkItem>>,
    /// Name-with-type slot.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    name_with_type: BTreeMap<SyntaxLanguage, Vec<LinkItem>>,
    /// Qualified-name slot.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    qualified_name: BTreeMap<SyntaxLanguage, Vec<LinkItem>>,
    /// See [`ReferenceItem::is_definition`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    is_definition: Option<bool>,
    /// See [`ReferenceItem::definition`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    definition: Option<String>,
    /// See [`ReferenceItem::parent`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parent: Option<String>,
    /// See [`ReferenceItem::comment_id`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    comment_id: Option<CommentId>,
}

impl TryFrom<WireReferenceItem> for ReferenceItem {
    type Error = Error;

    fn try_from(wire: WireReferenceItem) -> Result<Self, Self::Error> {
        let WireReferenceItem {
            mut name,
            mut name_with_type,
            mut qualified_name,
            is_definition,
            definition,
            parent,
            comment_id,
        } = wire;

        let mut languages: Vec<SyntaxLanguage> = name
            .keys()
            .chain(name_with_type.keys())
            .chain(qualified_name.keys())
            .copied()
            .collect();
        languages.sort_unstable();
        languages.dedup();

        let mut projections = BTreeMap::new();
        for language in languages {
            let triple = Projections {
                name: name.remove(&language).ok_or(Error::ProjectionSlotsIncomplete {
                    language,
                    missing: Projection::Name,
                })?,
                name_with_type: name_with_type.remove(&language).ok_or(
                    Error::ProjectionSlotsIncomplete {
                        language,
                        missing: Projection::NameWithType,
                    },
                )?,
                qualified_name: qualified_name.remove(&language).ok_or(
                    Error::ProjectionSlotsIncomplete {
                        language,
                        missing: Projection::QualifiedName,
                    },
                )?,
            };
            projections.insert(language, triple);
        }

        return Ok(Self {
            projections,
            is_definition,
            definition,
            parent,
            comment_id,
        });
    }
}

impl From<ReferenceItem> for WireReferenceItem {
    fn from(item: ReferenceItem) -> Self {
        let mut wire = Self {
            is_definition: item.is_definition,
            definition: item.definition,
            parent: item.parent,
            comment_id: item.comment_id,
            ..Self::default()
        };
        for (language, triple) in item.projections {
            wire.name.insert(language, triple.name);
            wire.name_with_type.insert(language, triple.name_with_type);
            wire.qualified_name.insert(language, triple.qualified_name);
        }
        return wire;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comment_id_sentinel_round_trips_through_strings() {
        let unresolved = CommentId::from("!:Widget.Missing".to_string());
        assert_eq!(unresolved, CommentId::Unresolved("Widget.Missing".to_string()));
        assert!(!unresolved.is_resolved());
        assert_eq!(String::from(unresolved), "!:Widget.Missing");

        let resolved = CommentId::from("T:Contoso.Widget".to_string());
        assert!(resolved.is_resolved());
    }

    #[test]
    fn wire_form_splits_projection_triple_into_slots() {
        let mut item = ReferenceItem::default();
        item.projections.insert(
            SyntaxLanguage::CSharp,
            Projections {
                name: vec![LinkItem::symbol("Contoso.Widget", "Widget", false)],
                name_with_type: vec![LinkItem::symbol("Contoso.Widget", "Widget", false)],
                qualified_name: vec![LinkItem::symbol("Contoso.Widget", "Contoso.Widget", false)],
            },
        );
        item.is_definition = Some(true);

        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["name"]["csharp"][0]["id"], "Contoso.Widget");
        assert_eq!(json["qualifiedName"]["csharp"][0]["name"], "Contoso.Widget");
        assert_eq!(json["isDefinition"], true);
        assert!(json["name"]["csharp"][0].get("isExternal").is_none());

        let back: ReferenceItem = serde_json::from_value(json).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn wire_form_rejects_language_missing_from_a_slot() {
        let json = serde_json::json!({
            "name": { "csharp": [ { "id": "A", "name": "A" } ] },
            "nameWithType": { "csharp": [ { "id": "A", "name": "A" } ] }
        });
        let err = serde_json::from_value::<ReferenceItem>(json).unwrap_err();
        assert!(err.to_string().contains("qualifiedName"), "unexpected error: {err}");
    }

    #[test]
    fn tokens_treats_empty_sequence_as_absent() {
        let mut item = ReferenceItem::default();
        item.projections.insert(SyntaxLanguage::VB, Projections::default());
        assert!(item.tokens(SyntaxLanguage::VB, Projection::Name).is_none());
        assert!(item.tokens(SyntaxLanguage::CSharp, Projection::Name).is_none());
    }
}
