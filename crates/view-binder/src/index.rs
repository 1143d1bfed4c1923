#![forbid(unsafe_code)]

//! `(control id, property)` → relation lookup for indexed dispatch.
//!
//! Built once per bind call. Lookups return relation positions in the order
//! they were given, so indexed dispatch writes in the same order as one
//! subscription per relation would.

use ahash::AHashMap;

use crate::relation::ResolvedRelation;

/// Index from control address to relation positions.
#[derive(Clone, Debug, Default)]
pub struct RelationIndex {
    by_control: AHashMap<String, AHashMap<String, Vec<usize>>>,
}

impl RelationIndex {
    /// Index `relations` as bound to the control `control_id`.
    #[must_use]
    pub fn build(control_id: &str, relations: &[ResolvedRelation]) -> Self {
        let mut by_property: AHashMap<String, Vec<usize>> = AHashMap::new();
        for (pos, relation) in relations.iter().enumerate() {
            by_property
                .entry(relation.property.clone())
                .or_default()
                .push(pos);
        }
        let mut by_control = AHashMap::new();
        if !by_property.is_empty() {
            by_control.insert(control_id.to_owned(), by_property);
        }
        Self { by_control }
    }

    /// Relation positions bound to `property` on `control_id`.
    #[must_use]
    pub fn lookup(&self, control_id: &str, property: &str) -> &[usize] {
        self.by_control
            .get(control_id)
            .and_then(|by_property| by_property.get(property))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of distinct `(control, property)` addresses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_control.values().map(|by_property| by_property.len()).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
