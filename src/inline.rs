//! Mixed text/link runs shared by every renderer.

use serde::{Deserialize, Serialize};

use crate::reference::LinkItem;

/// A single text run that mixes plain text and links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Inline {
    /// A hyperlink to another page.
    Link {
        /// Display text.
        link: String,
        /// Target reference.
        href: String,
    },
    /// An ordered run of inlines rendered back to back.
    Run(Vec<Inline>),
    /// Plain text.
    Text(String),
}

impl Inline {
    /// Build an inline from projection tokens. Tokens with an href become
    /// links; everything else is text. Adjacent text tokens are joined.
    pub fn from_link_items(items: &[LinkItem]) -> Self {
        let mut run: Vec<Self> = Vec::with_capacity(items.len());
        for item in items {
            let next = match &item.href {
                Some(href) => Self::Link {
                    link: item.display_name.clone(),
                    href: href.clone(),
                },
                None => Self::Text(item.display_name.clone()),
            };
            match (run.last_mut(), next) {
                (Some(Self::Text(prev)), Self::Text(text)) => prev.push_str(&text),
                (_, next) => run.push(next),
            }
        }

        if run.len() == 1 {
            if let Some(single) = run.pop() {
                return single;
            }
        }
        return Self::Run(run);
    }

    /// The display text with link targets dropped.
    pub fn plain_text(&self) -> String {
        return match self {
            Self::Text(text) => text.clone(),
            Self::Link { link, .. } => link.clone(),
            Self::Run(parts) => parts.iter().map(Self::plain_text).collect(),
        };
    }
}

impl From<&str> for Inline {
    fn from(text: &str) -> Self {
        return Self::Text(text.to_string());
    }
}

impl From<String> for Inline {
    fn from(text: String) -> Self {
        return Self::Text(text);
    }
}
