//! Cross-fragment merge: combine two reference fragments for one symbol.
//!
//! `merge` is pure. Both inputs are borrowed and a new consolidated item is
//! returned, so one base fragment can be merged against many incoming ones.
//!
//! Precedence is asymmetric. Scalars coalesce to whichever side is present;
//! when both are present and differ the base value is kept and the
//! disagreement is reported as a [`Conflict`]. That tie-break makes the
//! result depend on arrival order for conflicting scalars only. Projection
//! tokens combine with AND (`is_external_path`) and first-non-null (`href`),
//! which converge regardless of order except when two different hrefs are
//! both present, where the base href is kept.

use std::fmt;

use crate::error::Error;
use crate::reference::{CommentId, LinkItem, Projection, Projections, ReferenceItem, SyntaxLanguage};

/// Scalar field of a [`ReferenceItem`] that can conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarField {
    /// `commentId`.
    CommentId,
    /// `definition`.
    Definition,
    /// `isDefinition`.
    IsDefinition,
    /// `parent`.
    Parent,
}

impl fmt::Display for ScalarField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::IsDefinition => "isDefinition",
            Self::Definition => "definition",
            Self::Parent => "parent",
            Self::CommentId => "commentId",
        };
        return f.write_str(name);
    }
}

/// A scalar disagreement resolved in favor of the base fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    /// Value discarded (from the incoming fragment).
    pub discarded: String,
    /// Field the fragments disagree on.
    pub field: ScalarField,
    /// Value kept (from the base fragment).
    pub kept: String,
}

/// Result of a successful merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Merged {
    /// Scalar conflicts settled by keeping the base value.
    pub conflicts: Vec<Conflict>,
    /// The consolidated fragment.
    pub item: ReferenceItem,
}

/// Merge `incoming` into `base` for the symbol `id`.
///
/// # Errors
///
/// Returns `Error::ProjectionLengthMismatch` or `Error::ProjectionTokenMismatch`
/// when two populated sequences for one language and slot are not positionally
/// congruent. Those fragments do not describe the same symbol and nothing is merged.
pub fn merge(id: &str, base: &ReferenceItem, incoming: &ReferenceItem) -> Result<Merged, Error> {
    let mut conflicts = Vec::new();

    let is_definition = coalesce(
        ScalarField::IsDefinition,
        base.is_definition,
        incoming.is_definition,
        &mut conflicts,
    );
    let definition = coalesce(
        ScalarField::Definition,
        base.definition.clone(),
        incoming.definition.clone(),
        &mut conflicts,
    );
    let parent = coalesce(ScalarField::Parent, base.parent.clone(), incoming.parent.clone(), &mut conflicts);

    // Comment ids only matter on the declaration-site fragment.
    let comment_id = if is_definition == Some(true) {
        merge_comment_id(base.comment_id.as_ref(), incoming.comment_id.as_ref(), &mut conflicts)
    } else {
        base.comment_id.clone()
    };

    let mut projections = base.projections.clone();
    for (language, theirs) in &incoming.projections {
        match projections.get_mut(language) {
            None => {
                projections.insert(*language, theirs.clone());
            },
            Some(ours) => merge_projections(id, *language, ours, theirs)?,
        }
    }

    return Ok(Merged {
        item: ReferenceItem {
            projections,
            is_definition,
            definition,
            parent,
            comment_id,
        },
        conflicts,
    });
}

/// Present value wins; on disagreement keep `base` and record the conflict.
fn coalesce<T>(field: ScalarField, base: Option<T>, incoming: Option<T>, conflicts: &mut Vec<Conflict>) -> Option<T>
where
    T: PartialEq + fmt::Display,
{
    return match (base, incoming) {
        (Some(ours), Some(theirs)) => {
            if ours != theirs {
                conflicts.push(Conflict {
                    field,
                    kept: ours.to_string(),
                    discarded: theirs.to_string(),
                });
            }
            Some(ours)
        },
        (Some(ours), None) => Some(ours),
        (None, theirs) => theirs,
    };
}

/// Resolved ids beat unresolved ones; two unresolved ids yield nothing.
fn merge_comment_id(
    base: Option<&CommentId>,
    incoming: Option<&CommentId>,
    conflicts: &mut Vec<Conflict>,
) -> Option<CommentId> {
    // An id merged with itself is unchanged, resolved or not.
    if base == incoming {
        return base.cloned();
    }

    let ours = base.filter(|c| return c.is_resolved());
    let theirs = incoming.filter(|c| return c.is_resolved());
    return match (ours, theirs) {
        (Some(ours), Some(theirs)) => {
            conflicts.push(Conflict {
                field: ScalarField::CommentId,
                kept: ours.to_string(),
                discarded: theirs.to_string(),
            });
            Some(ours.clone())
        },
        (Some(ours), None) => Some(ours.clone()),
        (None, Some(theirs)) => Some(theirs.clone()),
        (None, None) => None,
    };
}

/// Merge each slot of one language's projection triple in place.
///
/// # Errors
///
/// Returns the first congruence failure across the three slots.
fn merge_projections(
    id: &str,
    language: SyntaxLanguage,
    ours: &mut Projections,
    theirs: &Projections,
) -> Result<(), Error> {
    for projection in Projection::ALL {
        merge_tokens(id, language, projection, ours.get_mut(projection), theirs.get(projection))?;
    }
    return Ok(());
}

/// Combine two token sequences position by position.
///
/// # Errors
///
/// Returns `Error::ProjectionLengthMismatch` or `Error::ProjectionTokenMismatch`
/// when both sequences are populated and not congruent.
fn merge_tokens(
    id: &str,
    language: SyntaxLanguage,
    projection: Projection,
    ours: &mut Vec<LinkItem>,
    theirs: &[LinkItem],
) -> Result<(), Error> {
    if theirs.is_empty() {
        return Ok(());
    }
    if ours.is_empty() {
        ours.extend_from_slice(theirs);
        return Ok(());
    }
    if ours.len() != theirs.len() {
        return Err(Error::ProjectionLengthMismatch {
            id: id.to_string(),
            base_len: ours.len(),
            incoming_len: theirs.len(),
            language,
            projection,
        });
    }

    // Check congruence before touching anything so a failure leaves `ours` intact.
    if let Some((index, (mine, other))) = ours
        .iter()
        .zip(theirs)
        .enumerate()
        .find(|(_, (mine, other))| return mine.name != other.name)
    {
        return Err(Error::ProjectionTokenMismatch {
            id: id.to_string(),
            base: mine.name.clone(),
            incoming: other.name.clone(),
            index,
            language,
            projection,
        });
    }

    for (mine, other) in ours.iter_mut().zip(theirs) {
        mine.is_external_path = mine.is_external_path && other.is_external_path;
        if mine.href.is_none() {
            mine.href.clone_from(&other.href);
        }
    }
    return Ok(());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget_tokens(external: bool, href: Option<&str>) -> Vec<LinkItem> {
        let mut list = LinkItem::symbol("System.Collections.Generic.List`1", "List", external);
        list.href = href.map(str::to_string);
        return vec![
            list,
            LinkItem::text("<"),
            LinkItem::symbol("Contoso.Widget", "Widget", false),
            LinkItem::text(">"),
        ];
    }

    fn fragment(external: bool, href: Option<&str>) -> ReferenceItem {
        let tokens = widget_tokens(external, href);
        let mut item = ReferenceItem::default();
        item.projections.insert(
            SyntaxLanguage::CSharp,
            Projections {
                name: tokens.clone(),
                name_with_type: tokens.clone(),
                qualified_name: tokens,
            },
        );
        return item;
    }

    const ID: &str = "System.Collections.Generic.List{Contoso.Widget}";

    #[test]
    fn merging_with_itself_is_a_no_op() {
        let mut item = fragment(true, Some("list.html"));
        item.is_definition = Some(true);
        item.parent = Some("System.Collections.Generic".to_string());
        item.comment_id = Some(CommentId::Unresolved("List".to_string()));

        let merged = merge(ID, &item, &item.clone()).unwrap();
        assert_eq!(merged.item, item);
        assert!(merged.conflicts.is_empty());
    }

    #[test]
    fn projection_combination_is_order_independent() {
        let a = fragment(true, Some("list.html"));
        let b = fragment(false, None);

        let ab = merge(ID, &a, &b).unwrap().item;
        let ba = merge(ID, &b, &a).unwrap().item;
        assert_eq!(ab.projections, ba.projections);

        let name = ab.tokens(SyntaxLanguage::CSharp, Projection::Name).unwrap();
        assert!(!name[0].is_external_path, "external only when every fragment agrees");
        assert_eq!(name[0].href.as_deref(), Some("list.html"));
    }

    #[test]
    fn base_href_wins_when_both_present() {
        let a = fragment(false, Some("a.html"));
        let b = fragment(false, Some("b.html"));

        let ab = merge(ID, &a, &b).unwrap().item;
        let ba = merge(ID, &b, &a).unwrap().item;
        assert_eq!(ab.tokens(SyntaxLanguage::CSharp, Projection::Name).unwrap()[0].href.as_deref(), Some("a.html"));
        assert_eq!(ba.tokens(SyntaxLanguage::CSharp, Projection::Name).unwrap()[0].href.as_deref(), Some("b.html"));
    }

    #[test]
    fn empty_sequence_adopts_populated_side() {
        let populated = fragment(true, None);
        let mut empty = ReferenceItem::default();
        empty.projections.insert(SyntaxLanguage::CSharp, Projections::default());

        let merged = merge(ID, &empty, &populated).unwrap().item;
        assert_eq!(merged.projections, populated.projections);

        let merged = merge(ID, &populated, &empty).unwrap().item;
        assert_eq!(merged.projections, populated.projections);
    }

    #[test]
    fn language_present_on_one_side_is_adopted() {
        let csharp = fragment(false, None);
        let mut vb = ReferenceItem::default();
        vb.projections.insert(
            SyntaxLanguage::VB,
            Projections {
                name: vec![LinkItem::symbol("Contoso.Widget", "Widget", false)],
                name_with_type: vec![LinkItem::symbol("Contoso.Widget", "Widget", false)],
                qualified_name: vec![LinkItem::symbol("Contoso.Widget", "Contoso.Widget", false)],
            },
        );

        let merged = merge(ID, &csharp, &vb).unwrap().item;
        let languages: Vec<_> = merged.projections.keys().copied().collect();
        assert_eq!(languages, vec![SyntaxLanguage::CSharp, SyntaxLanguage::VB]);
    }

    #[test]
    fn length_mismatch_is_a_consistency_violation() {
        let a = fragment(false, None);
        let mut b = fragment(false, None);
        b.projections.get_mut(&SyntaxLanguage::CSharp).unwrap().name.pop();

        let err = merge(ID, &a, &b).unwrap_err();
        assert!(matches!(
            err,
            Error::ProjectionLengthMismatch { base_len: 4, incoming_len: 3, projection: Projection::Name, .. }
        ));
    }

    #[test]
    fn token_identity_mismatch_is_a_consistency_violation() {
        let a = fragment(false, None);
        let mut b = fragment(false, None);
        b.projections.get_mut(&SyntaxLanguage::CSharp).unwrap().qualified_name[2].name =
            Some("Contoso.Gadget".to_string());

        let err = merge(ID, &a, &b).unwrap_err();
        let Error::ProjectionTokenMismatch { index, projection, incoming, .. } = &err else {
            panic!("unexpected error: {err}");
        };
        assert_eq!(*index, 2);
        assert_eq!(*projection, Projection::QualifiedName);
        assert_eq!(incoming.as_deref(), Some("Contoso.Gadget"));
    }

    #[test]
    fn scalars_coalesce_and_report_conflicts_keeping_base() {
        let mut base = ReferenceItem {
            parent: Some("Contoso".to_string()),
            ..ReferenceItem::default()
        };
        let incoming = ReferenceItem {
            parent: Some("Fabrikam".to_string()),
            definition: Some("Contoso.Box`1".to_string()),
            ..ReferenceItem::default()
        };

        let merged = merge(ID, &base, &incoming).unwrap();
        assert_eq!(merged.item.parent.as_deref(), Some("Contoso"));
        assert_eq!(merged.item.definition.as_deref(), Some("Contoso.Box`1"));
        assert_eq!(
            merged.conflicts,
            vec![Conflict {
                field: ScalarField::Parent,
                kept: "Contoso".to_string(),
                discarded: "Fabrikam".to_string(),
            }]
        );

        base.parent = None;
        let reversed = merge(ID, &incoming, &base).unwrap();
        assert_eq!(reversed.item.parent.as_deref(), Some("Fabrikam"));
        assert!(reversed.conflicts.is_empty());
    }

    fn definition_with(comment_id: &str) -> ReferenceItem {
        return ReferenceItem {
            is_definition: Some(true),
            comment_id: Some(CommentId::from(comment_id.to_string())),
            ..ReferenceItem::default()
        };
    }

    #[test]
    fn comment_id_resolved_beats_unresolved() {
        let merged = merge(ID, &definition_with("!:x"), &definition_with("C1")).unwrap();
        assert_eq!(merged.item.comment_id, Some(CommentId::Resolved("C1".to_string())));
        assert!(merged.conflicts.is_empty());
    }

    #[test]
    fn comment_id_two_resolved_values_conflict() {
        let merged = merge(ID, &definition_with("C1"), &definition_with("C2")).unwrap();
        assert_eq!(merged.item.comment_id, Some(CommentId::Resolved("C1".to_string())));
        assert_eq!(merged.conflicts.len(), 1);
        assert_eq!(merged.conflicts[0].field, ScalarField::CommentId);
        assert_eq!(merged.conflicts[0].discarded, "C2");
    }

    #[test]
    fn comment_id_two_unresolved_values_yield_none() {
        let merged = merge(ID, &definition_with("!:x"), &definition_with("!:y")).unwrap();
        assert_eq!(merged.item.comment_id, None);
    }

    #[test]
    fn comment_id_ignored_on_reference_fragments() {
        let base = ReferenceItem {
            comment_id: Some(CommentId::from("!:x".to_string())),
            ..ReferenceItem::default()
        };
        let incoming = ReferenceItem {
            comment_id: Some(CommentId::from("C1".to_string())),
            ..ReferenceItem::default()
        };
        let merged = merge(ID, &base, &incoming).unwrap();
        assert_eq!(merged.item.comment_id, base.comment_id);
    }

    #[test]
    fn comment_id_merges_when_incoming_makes_it_a_definition() {
        let base = ReferenceItem {
            comment_id: Some(CommentId::from("!:x".to_string())),
            ..ReferenceItem::default()
        };
        let merged = merge(ID, &base, &definition_with("T:Contoso.Widget")).unwrap();
        assert_eq!(merged.item.is_definition, Some(true));
        assert_eq!(merged.item.comment_id, Some(CommentId::Resolved("T:Contoso.Widget".to_string())));
    }
}
