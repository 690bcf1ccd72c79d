//! Table of contents: concurrent accumulation, sorted grouping on finalize.

use std::fmt;
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::page::PageId;
use crate::symbols::TypeKind;

/// TOC group name used for types outside any namespace.
pub const GLOBAL_NAMESPACE: &str = "global";

/// Kind label a page is grouped under. Variant order is the display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TypeLabel {
    /// Classes.
    Classes,
    /// Delegates and function pointers.
    Delegates,
    /// Enums.
    Enums,
    /// Interfaces.
    Interfaces,
    /// Structs.
    Structs,
}

impl TypeLabel {
    /// Label for a type kind; `None` for kinds that never get a page.
    pub const fn of(kind: TypeKind) -> Option<Self> {
        return match kind {
            TypeKind::Class => Some(Self::Classes),
            TypeKind::Struct => Some(Self::Structs),
            TypeKind::Interface => Some(Self::Interfaces),
            TypeKind::Enum => Some(Self::Enums),
            TypeKind::Delegate | TypeKind::FunctionPointer => Some(Self::Delegates),
            TypeKind::Other => None,
        };
    }

    /// Header text.
    pub const fn as_str(self) -> &'static str {
        return match self {
            Self::Classes => "Classes",
            Self::Delegates => "Delegates",
            Self::Enums => "Enums",
            Self::Interfaces => "Interfaces",
            Self::Structs => "Structs",
        };
    }
}

impl fmt::Display for TypeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f.write_str(self.as_str());
    }
}

/// One emitted page, as recorded during assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    /// Kind group.
    pub label: TypeLabel,
    /// Display name.
    pub name: String,
    /// Namespace of the type; empty for the global namespace.
    pub namespace: String,
    /// Page the entry links to.
    pub page_id: PageId,
}

/// A row under a namespace: a kind header or a page link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TocItem {
    /// Kind group header.
    Label {
        /// Header text.
        label: String,
    },
    /// Link to one page.
    Link {
        /// Display name.
        name: String,
        /// Page file relative to the output directory.
        href: String,
    },
}

/// All entries for one namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocNamespace {
    /// Headers and links in display order.
    pub items: Vec<TocItem>,
    /// Namespace name.
    pub name: String,
}

/// Finalized table of contents, namespaces in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Toc {
    /// Namespace groups.
    pub namespaces: Vec<TocNamespace>,
}

/// Page file name for a page id.
pub fn page_href(id: &PageId) -> String {
    return format!("{id}.yml");
}

/// Append-only entry list shared by page-assembly workers.
#[derive(Debug, Default)]
pub struct TocBuilder {
    /// Entries in arrival order.
    entries: Mutex<Vec<TocEntry>>,
}

impl TocBuilder {
    /// Empty builder.
    pub fn new() -> Self {
        return Self::default();
    }

    /// Record one page. Safe to call from several threads.
    pub fn push(&self, entry: TocEntry) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }

    /// Sort by namespace, then kind label, then name, and group.
    /// Arrival order has no effect on the result.
    pub fn finalize(self) -> Toc {
        let mut entries = self.entries.into_inner().unwrap_or_else(PoisonError::into_inner);
        entries.sort_by(|a, b| {
            return (&a.namespace, a.label, &a.name, &a.page_id).cmp(&(&b.namespace, b.label, &b.name, &b.page_id));
        });

        let mut toc = Toc::default();
        let mut current: Option<(String, TypeLabel)> = None;
        for entry in entries {
            let same_namespace = current.as_ref().is_some_and(|(ns, _)| return *ns == entry.namespace);
            if !same_namespace {
                let name = if entry.namespace.is_empty() {
                    GLOBAL_NAMESPACE.to_string()
                } else {
                    entry.namespace.clone()
                };
                toc.namespaces.push(TocNamespace { name, items: Vec::new() });
            }
            let same_label = same_namespace && current.as_ref().is_some_and(|(_, label)| return *label == entry.label);
            let Some(group) = toc.namespaces.last_mut() else {
                continue;
            };
            if !same_label {
                group.items.push(TocItem::Label {
                    label: entry.label.to_string(),
                });
            }
            group.items.push(TocItem::Link {
                name: entry.name,
                href: page_href(&entry.page_id),
            });
            current = Some((entry.namespace, entry.label));
        }
        return toc;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(namespace: &str, label: TypeLabel, name: &str) -> TocEntry {
        let id = if namespace.is_empty() {
            name.to_string()
        } else {
            format!("{namespace}.{name}")
        };
        return TocEntry {
            namespace: namespace.to_string(),
            label,
            name: name.to_string(),
            page_id: PageId::parse(&id).unwrap(),
        };
    }

    fn link(name: &str, href: &str) -> TocItem {
        return TocItem::Link {
            name: name.to_string(),
            href: href.to_string(),
        };
    }

    fn label(text: &str) -> TocItem {
        return TocItem::Label { label: text.to_string() };
    }

    #[test]
    fn groups_by_namespace_then_label() {
        let builder = TocBuilder::new();
        builder.push(entry("A", TypeLabel::Interfaces, "IBar"));
        builder.push(entry("B", TypeLabel::Classes, "Zed"));
        builder.push(entry("A", TypeLabel::Classes, "Foo"));
        builder.push(entry("A", TypeLabel::Classes, "Baz"));
        let toc = builder.finalize();

        assert_eq!(toc.namespaces.len(), 2);
        assert_eq!(toc.namespaces[0].name, "A");
        assert_eq!(
            toc.namespaces[0].items,
            vec![
                label("Classes"),
                link("Baz", "A.Baz.yml"),
                link("Foo", "A.Foo.yml"),
                label("Interfaces"),
                link("IBar", "A.IBar.yml"),
            ]
        );
        assert_eq!(toc.namespaces[1].items, vec![label("Classes"), link("Zed", "B.Zed.yml")]);
    }

    #[test]
    fn arrival_order_is_irrelevant() {
        let entries = [
            entry("A", TypeLabel::Structs, "S"),
            entry("A", TypeLabel::Delegates, "D"),
            entry("", TypeLabel::Enums, "E"),
            entry("A", TypeLabel::Classes, "C"),
        ];
        let forward = TocBuilder::new();
        entries.iter().cloned().for_each(|e| forward.push(e));
        let backward = TocBuilder::new();
        entries.iter().rev().cloned().for_each(|e| backward.push(e));

        let toc = forward.finalize();
        assert_eq!(toc, backward.finalize());
        assert_eq!(toc.namespaces[0].name, GLOBAL_NAMESPACE);
        let labels: Vec<&str> = toc.namespaces[1]
            .items
            .iter()
            .filter_map(|item| match item {
                TocItem::Label { label } => Some(label.as_str()),
                TocItem::Link { .. } => None,
            })
            .collect();
        assert_eq!(labels, vec!["Classes", "Delegates", "Structs"]);
    }

    #[test]
    fn concurrent_pushes_are_all_kept() {
        let builder = TocBuilder::new();
        std::thread::scope(|scope| {
            for worker in 0..4 {
                let builder = &builder;
                scope.spawn(move || {
                    for i in 0..25 {
                        builder.push(entry("N", TypeLabel::Classes, &format!("T{worker}x{i}")));
                    }
                });
            }
        });
        let toc = builder.finalize();
        assert_eq!(toc.namespaces[0].items.len(), 101);
    }

    #[test]
    fn serializes_to_label_and_link_shapes() {
        let builder = TocBuilder::new();
        builder.push(entry("A", TypeLabel::Enums, "Color"));
        let json = serde_json::to_value(builder.finalize()).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                { "name": "A", "items": [ { "label": "Enums" }, { "name": "Color", "href": "A.Color.yml" } ] }
            ])
        );
    }
}
