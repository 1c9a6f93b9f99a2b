//! Records of export batches.

use std::collections::BTreeMap;

use codex_foundation::{EntityId, EntityKind};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A record of one export batch: its roots and every entity it produced.
///
/// Manifests let a later import select a whole batch again by label.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Manifest {
    /// Label the batch was recorded under.
    pub label: String,
    /// Root identifiers, in the store the manifest lives in.
    pub roots: Vec<EntityId>,
    /// Every identifier of the batch, grouped by kind.
    pub roster: BTreeMap<EntityKind, Vec<EntityId>>,
}

impl Manifest {
    /// Creates an empty manifest.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            roots: Vec::new(),
            roster: BTreeMap::new(),
        }
    }

    /// Sets the roots.
    #[must_use]
    pub fn with_roots(mut self, roots: Vec<EntityId>) -> Self {
        self.roots = roots;
        self
    }

    /// Adds an identifier to the roster.
    pub fn enlist(&mut self, kind: EntityKind, id: EntityId) {
        let ids = self.roster.entry(kind).or_default();
        if !ids.contains(&id) {
            ids.push(id);
        }
    }

    /// Total number of identifiers on the roster.
    #[must_use]
    pub fn len(&self) -> usize {
        self.roster.values().map(Vec::len).sum()
    }

    /// Returns true if the roster is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if `id` is on the roster.
    #[must_use]
    pub fn lists(&self, id: EntityId) -> bool {
        self.roster.values().any(|ids| ids.contains(&id))
    }
}
