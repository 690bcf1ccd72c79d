//! Reference registry: incremental, any-order ingestion of fragments by id.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::Error;
use crate::merge::{self, Conflict};
use crate::reference::{Projection, ReferenceItem, SyntaxLanguage};

/// What to do when two fragments disagree on a scalar field or on the
/// positions of their projection tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictPolicy {
    /// Fail the run on the first disagreement.
    Abort,
    /// Keep what the registry already holds and log the disagreement.
    #[default]
    PreferBase,
}

/// A conflict observed while ingesting, tagged with the symbol id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedConflict {
    /// The settled disagreement.
    pub conflict: Conflict,
    /// Symbol id the fragments describe.
    pub id: String,
}

/// An incoming fragment whose projection tokens did not line up with the
/// registry entry. The fragment was discarded whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedMismatch {
    /// Symbol id the fragments describe.
    pub id: String,
    /// Language key of the incongruent sequence.
    pub language: SyntaxLanguage,
    /// Projection slot of the incongruent sequence.
    pub projection: Projection,
    /// Rendered merge error.
    pub reason: String,
}

/// Consolidated fragments keyed by symbol id, iterated in id order.
#[derive(Debug, Default)]
pub struct ReferenceRegistry {
    /// Every conflict settled under `PreferBase`, in arrival order.
    conflicts: Vec<RecordedConflict>,
    /// Merged fragment per symbol id.
    items: BTreeMap<String, ReferenceItem>,
    /// Fragments discarded under `PreferBase` for incongruent projections.
    mismatches: Vec<RecordedMismatch>,
    /// Policy applied on disagreements.
    policy: ConflictPolicy,
}

impl ReferenceRegistry {
    /// Empty registry using `policy`.
    pub fn new(policy: ConflictPolicy) -> Self {
        return Self {
            items: BTreeMap::new(),
            conflicts: Vec::new(),
            mismatches: Vec::new(),
            policy,
        };
    }

    /// Merge one fragment into whatever the registry already holds for `id`.
    /// The first fragment seen for an id is the base for all later ones.
    ///
    /// # Errors
    ///
    /// Under the `Abort` policy, returns projection congruence errors from the
    /// merge engine or `Error::ScalarConflict`. On error the registry entry
    /// for `id` is unchanged.
    pub fn ingest(&mut self, id: &str, fragment: ReferenceItem) -> Result<(), Error> {
        let Some(existing) = self.items.get(id) else {
            self.items.insert(id.to_string(), fragment);
            return Ok(());
        };

        let merged = match merge::merge(id, existing, &fragment) {
            Ok(merged) => merged,
            Err(e) => {
                let Some((language, projection)) = incongruent_slot(&e) else {
                    return Err(e);
                };
                if self.policy == ConflictPolicy::Abort {
                    return Err(e);
                }
                tracing::warn!(
                    id,
                    %language,
                    slot = %projection,
                    error = %e,
                    "incongruent projections, discarding incoming fragment"
                );
                self.mismatches.push(RecordedMismatch {
                    id: id.to_string(),
                    language,
                    projection,
                    reason: e.to_string(),
                });
                return Ok(());
            },
        };
        if let Some(first) = merged.conflicts.first()
            && self.policy == ConflictPolicy::Abort
        {
            return Err(Error::ScalarConflict {
                id: id.to_string(),
                field: first.field.to_string(),
                existing: first.kept.clone(),
                incoming: first.discarded.clone(),
            });
        }

        for conflict in merged.conflicts {
            tracing::warn!(
                id,
                field = %conflict.field,
                kept = %conflict.kept,
                discarded = %conflict.discarded,
                "conflicting fragments, keeping existing value"
            );
            self.conflicts.push(RecordedConflict {
                id: id.to_string(),
                conflict,
            });
        }
        self.items.insert(id.to_string(), merged.item);
        return Ok(());
    }

    /// The merged fragment for `id`.
    pub fn get(&self, id: &str) -> Option<&ReferenceItem> {
        return self.items.get(id);
    }

    /// All merged fragments in id order.
    pub const fn items(&self) -> &BTreeMap<String, ReferenceItem> {
        return &self.items;
    }

    /// Conflicts settled by keeping the existing value.
    pub fn conflicts(&self) -> &[RecordedConflict] {
        return &self.conflicts;
    }

    /// Fragments discarded for incongruent projections.
    pub fn mismatches(&self) -> &[RecordedMismatch] {
        return &self.mismatches;
    }

    /// Number of distinct symbols.
    pub fn len(&self) -> usize {
        return self.items.len();
    }

    /// True before the first fragment is ingested.
    pub fn is_empty(&self) -> bool {
        return self.items.is_empty();
    }
}

/// Language and slot of a positional congruence failure.
const fn incongruent_slot(error: &Error) -> Option<(SyntaxLanguage, Projection)> {
    return match *error {
        Error::ProjectionLengthMismatch {
            language, projection, ..
        }
        | Error::ProjectionTokenMismatch {
            language, projection, ..
        } => Some((language, projection)),
        _ => None,
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::ScalarField;
    use crate::reference::{LinkItem, Projections};

    fn named(parent: Option<&str>, external: bool) -> ReferenceItem {
        let tokens = vec![LinkItem::symbol("Contoso.Widget", "Widget", external)];
        let mut item = ReferenceItem {
            parent: parent.map(str::to_string),
            ..ReferenceItem::default()
        };
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

    #[test]
    fn arrival_order_does_not_change_projections() {
        let fragments = [named(Some("Contoso"), true), named(None, false), named(None, true)];

        let mut forward = ReferenceRegistry::new(ConflictPolicy::PreferBase);
        for fragment in fragments.iter().cloned() {
            forward.ingest("Contoso.Widget", fragment).unwrap();
        }
        let mut backward = ReferenceRegistry::new(ConflictPolicy::PreferBase);
        for fragment in fragments.iter().rev().cloned() {
            backward.ingest("Contoso.Widget", fragment).unwrap();
        }

        assert_eq!(forward.get("Contoso.Widget"), backward.get("Contoso.Widget"));
        let tokens = forward
            .get("Contoso.Widget")
            .and_then(|item| return item.tokens(SyntaxLanguage::CSharp, Projection::Name))
            .unwrap();
        assert!(!tokens[0].is_external_path);
    }

    #[test]
    fn prefer_base_keeps_first_value_and_records_conflict() {
        let mut registry = ReferenceRegistry::new(ConflictPolicy::PreferBase);
        registry.ingest("Contoso.Widget", named(Some("Contoso"), false)).unwrap();
        registry.ingest("Contoso.Widget", named(Some("Fabrikam"), false)).unwrap();

        assert_eq!(registry.get("Contoso.Widget").unwrap().parent.as_deref(), Some("Contoso"));
        assert_eq!(registry.conflicts().len(), 1);
        assert_eq!(registry.conflicts()[0].conflict.field, ScalarField::Parent);
    }

    #[test]
    fn abort_policy_fails_and_leaves_entry_untouched() {
        let mut registry = ReferenceRegistry::new(ConflictPolicy::Abort);
        registry.ingest("Contoso.Widget", named(Some("Contoso"), true)).unwrap();
        let err = registry.ingest("Contoso.Widget", named(Some("Fabrikam"), false)).unwrap_err();

        assert!(matches!(err, Error::ScalarConflict { ref field, .. } if field == "parent"));
        let tokens = registry
            .get("Contoso.Widget")
            .and_then(|item| return item.tokens(SyntaxLanguage::CSharp, Projection::Name))
            .unwrap();
        assert!(tokens[0].is_external_path);
    }

    fn with_extra_token(item: ReferenceItem) -> ReferenceItem {
        let mut item = item;
        if let Some(projections) = item.projections.get_mut(&SyntaxLanguage::CSharp) {
            projections.name.push(LinkItem::text("?"));
        }
        return item;
    }

    #[test]
    fn incongruent_fragment_is_discarded_under_prefer_base() {
        let mut registry = ReferenceRegistry::new(ConflictPolicy::PreferBase);
        assert!(registry.is_empty(), "new registry holds nothing");
        registry.ingest("Contoso.Widget", named(Some("Contoso"), false)).unwrap();
        registry
            .ingest("Contoso.Widget", with_extra_token(named(Some("Fabrikam"), false)))
            .unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("Contoso.Widget"), Some(&named(Some("Contoso"), false)));
        assert!(registry.conflicts().is_empty(), "discarded fragment settles no scalars");
        assert_eq!(registry.mismatches().len(), 1);
        let mismatch = &registry.mismatches()[0];
        assert_eq!(mismatch.id, "Contoso.Widget");
        assert_eq!(mismatch.language, SyntaxLanguage::CSharp);
        assert_eq!(mismatch.projection, Projection::Name);
    }

    #[test]
    fn incongruent_fragment_fails_under_abort() {
        let mut registry = ReferenceRegistry::new(ConflictPolicy::Abort);
        registry.ingest("Contoso.Widget", named(None, false)).unwrap();
        let err = registry
            .ingest("Contoso.Widget", with_extra_token(named(None, false)))
            .unwrap_err();

        assert!(
            matches!(err, Error::ProjectionLengthMismatch { base_len: 1, incoming_len: 2, .. }),
            "unexpected error: {err}"
        );
        assert_eq!(registry.get("Contoso.Widget"), Some(&named(None, false)));
        assert!(registry.mismatches().is_empty(), "abort records nothing");
    }
}
