//! Name and declaration formatting seam between extraction output and page assembly.

use crate::error::Error;
use crate::inline::Inline;
use crate::reference::{LinkItem, Projection, SyntaxLanguage};
use crate::registry::ReferenceRegistry;
use crate::symbols::TypeRef;
use crate::xml_comment::XmlComment;

/// What the assembler needs from the extraction side to render a symbol.
/// Implementations must be shareable across page-assembly threads.
pub trait Formatter: Sync {
    /// Language every projection and declaration is rendered in.
    fn language(&self) -> SyntaxLanguage;

    /// Tokens of one projection of `id`, if extraction produced them.
    fn tokens(&self, id: &str, projection: Projection) -> Option<&[LinkItem]>;

    /// Declaration text for `id`.
    ///
    /// # Errors
    ///
    /// Returns `Error::FormattingFault` when no declaration can be produced.
    fn declaration(&self, id: &str, declaration: Option<&str>) -> Result<String, Error>;

    /// Parsed documentation; `None` when absent or malformed.
    fn comment(&self, blob: Option<&str>) -> Option<XmlComment> {
        return XmlComment::parse(blob);
    }

    /// Render a signature type: its `name` projection when known, else its display text.
    fn type_inline(&self, type_ref: &TypeRef) -> Inline {
        let tokens = type_ref.id.as_deref().and_then(|id| return self.tokens(id, Projection::Name));
        return match tokens {
            Some(tokens) => Inline::from_link_items(tokens),
            None => Inline::Text(type_ref.display.clone()),
        };
    }
}

/// Formatter backed by the merged reference registry and the declaration
/// text extraction recorded on each symbol.
#[derive(Debug, Clone, Copy)]
pub struct ManifestFormatter<'a> {
    /// Page language.
    language: SyntaxLanguage,
    /// Merged fragments to read projections from.
    registry: &'a ReferenceRegistry,
}

impl<'a> ManifestFormatter<'a> {
    /// Formatter over `registry` rendering in `language`.
    pub const fn new(registry: &'a ReferenceRegistry, language: SyntaxLanguage) -> Self {
        return Self { registry, language };
    }
}

impl Formatter for ManifestFormatter<'_> {
    fn language(&self) -> SyntaxLanguage {
        return self.language;
    }

    fn tokens(&self, id: &str, projection: Projection) -> Option<&[LinkItem]> {
        return self.registry.get(id)?.tokens(self.language, projection);
    }

    fn declaration(&self, id: &str, declaration: Option<&str>) -> Result<String, Error> {
        return match declaration.map(str::trim) {
            Some(text) if !text.is_empty() => Ok(text.to_string()),
            _ => Err(Error::FormattingFault {
                symbol: id.to_string(),
                reason: "no declaration text".to_string(),
            }),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::{Projections, ReferenceItem};
    use crate::registry::ConflictPolicy;

    fn registry_with_list() -> ReferenceRegistry {
        let tokens = vec![
            LinkItem {
                href: Some("System.Collections.Generic.List-1.yml".to_string()),
                ..LinkItem::symbol("System.Collections.Generic.List`1", "List", true)
            },
            LinkItem::text("<"),
            LinkItem::symbol("Contoso.Widget", "Widget", false),
            LinkItem::text(">"),
        ];
        let mut item = ReferenceItem::default();
        item.projections.insert(
            SyntaxLanguage::CSharp,
            Projections {
                name: tokens.clone(),
                name_with_type: tokens.clone(),
                qualified_name: tokens,
            },
        );
        let mut registry = ReferenceRegistry::new(ConflictPolicy::PreferBase);
        registry.ingest("List{Widget}", item).unwrap();
        return registry;
    }

    #[test]
    fn type_inline_prefers_projection() {
        let registry = registry_with_list();
        let formatter = ManifestFormatter::new(&registry, SyntaxLanguage::CSharp);
        let known = TypeRef {
            display: "List<Widget>".to_string(),
            id: Some("List{Widget}".to_string()),
        };
        let inline = formatter.type_inline(&known);
        assert_eq!(inline.plain_text(), "List<Widget>");
        assert!(matches!(&inline, Inline::Run(parts) if matches!(parts[0], Inline::Link { .. })));

        let unknown = TypeRef {
            display: "int".to_string(),
            id: Some("System.Int32".to_string()),
        };
        assert_eq!(formatter.type_inline(&unknown), Inline::Text("int".to_string()));
    }

    #[test]
    fn other_language_falls_back_to_display() {
        let registry = registry_with_list();
        let formatter = ManifestFormatter::new(&registry, SyntaxLanguage::VB);
        let known = TypeRef {
            display: "List(Of Widget)".to_string(),
            id: Some("List{Widget}".to_string()),
        };
        assert_eq!(formatter.type_inline(&known), Inline::Text("List(Of Widget)".to_string()));
    }

    #[test]
    fn missing_declaration_is_a_formatting_fault() {
        let registry = ReferenceRegistry::new(ConflictPolicy::PreferBase);
        let formatter = ManifestFormatter::new(&registry, SyntaxLanguage::CSharp);
        assert_eq!(formatter.declaration("A", Some(" public class A ")).unwrap(), "public class A");
        assert!(matches!(formatter.declaration("A", None), Err(Error::FormattingFault { .. })));
        assert!(matches!(formatter.declaration("A", Some("  ")), Err(Error::FormattingFault { .. })));
    }
}
