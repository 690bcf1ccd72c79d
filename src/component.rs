//! Page content blocks.
//!
//! Each variant serializes to the object shape renderers expect, distinguished
//! by its key (`section`, `markdown`, `declaration`, `fact`, `jumplist`,
//! `parameters`). Sections may contain sections, but only two levels deep;
//! [`Section::new`] refuses anything deeper and [`validate_body`] re-checks
//! trees that arrived through deserialization.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::inline::Inline;

/// Deepest allowed section nesting, counting the outermost section as 1.
pub const MAX_SECTION_DEPTH: usize = 2;

/// Ordered key/value facts; insertion order is display order.
pub type Facts = IndexMap<String, Inline>;

/// One block of page content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Component {
    /// Non-actionable code declaration.
    Declaration {
        /// Plaintext declaration.
        declaration: String,
        /// Highlighting language; the page language applies when absent.
        #[serde(rename = "languageId", default, skip_serializing_if = "Option::is_none")]
        language_id: Option<String>,
    },
    /// Key/value facts in tabular form.
    Fact {
        /// The facts.
        fact: Facts,
    },
    /// Quick summary of items to jump to.
    JumpList {
        /// Items in display order.
        jumplist: Vec<JumpListItem>,
    },
    /// Indented parameter list.
    ParameterList {
        /// Parameters in display order.
        parameters: Vec<Parameter>,
    },
    /// A headed group of nested components.
    Section(Section),
    /// Markdown text, opaque to the core.
    TextBlock {
        /// Markdown content.
        markdown: String,
    },
}

impl Component {
    /// Markdown block.
    pub fn markdown(text: impl Into<String>) -> Self {
        return Self::TextBlock { markdown: text.into() };
    }

    /// Declaration block using the page language.
    pub fn declaration(text: impl Into<String>) -> Self {
        return Self::Declaration {
            declaration: text.into(),
            language_id: None,
        };
    }

    /// How many section levels this component spans.
    pub fn nesting(&self) -> usize {
        return match self {
            Self::Section(section) => section.nesting(),
            Self::TextBlock { .. }
            | Self::Declaration { .. }
            | Self::Fact { .. }
            | Self::JumpList { .. }
            | Self::ParameterList { .. } => 0,
        };
    }
}

/// A headed group of components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Nested components.
    body: Vec<Component>,
    /// Header text.
    section: String,
}

impl Section {
    /// Build a section, refusing bodies that would push nesting past [`MAX_SECTION_DEPTH`].
    ///
    /// # Errors
    ///
    /// Returns `Error::SectionTooDeep` when `body` already contains a section with its own section.
    pub fn new(header: impl Into<String>, body: Vec<Component>) -> Result<Self, Error> {
        let section = Self {
            section: header.into(),
            body,
        };
        let depth = section.nesting();
        if depth > MAX_SECTION_DEPTH {
            return Err(Error::SectionTooDeep {
                header: section.section,
                depth,
            });
        }
        return Ok(section);
    }

    /// Header text.
    pub fn header(&self) -> &str {
        return &self.section;
    }

    /// Nested components.
    #[cfg(test)]
    pub fn body(&self) -> &[Component] {
        return &self.body;
    }

    /// Levels of section nesting including this one.
    fn nesting(&self) -> usize {
        let inner = self.body.iter().map(Component::nesting).max().unwrap_or(0);
        return inner.saturating_add(1);
    }
}

impl From<Section> for Component {
    fn from(section: Section) -> Self {
        return Self::Section(section);
    }
}

/// One row of a jump list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JumpListItem {
    /// Whether the item is deprecated.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
    /// Markdown description.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Item name to jump to.
    pub name: Inline,
}

/// One entry of a parameter list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    /// Default value, plaintext.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    /// Whether the parameter is deprecated.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
    /// Markdown description.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Extra facts about the parameter.
    #[serde(rename = "fact", default, skip_serializing_if = "Option::is_none")]
    pub facts: Option<Facts>,
    /// Parameter name. Empty for return-value entries.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Whether the parameter is required.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    /// Parameter type.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_ref: Option<Inline>,
}

/// Check every component in a page body against [`MAX_SECTION_DEPTH`].
///
/// # Errors
///
/// Returns `Error::SectionTooDeep` for the first offending top-level section.
pub fn validate_body(body: &[Component]) -> Result<(), Error> {
    for component in body {
        if let Component::Section(section) = component {
            let depth = section.nesting();
            if depth > MAX_SECTION_DEPTH {
                return Err(Error::SectionTooDeep {
                    header: section.header().to_string(),
                    depth,
                });
            }
        }
    }
    return Ok(());
}
