//! Identifier remapping tables.

use std::collections::BTreeMap;

use codex_foundation::EntityId;

/// A table of `old -> new` identifiers built during pass 1 of a transfer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IdentifierMap {
    entries: BTreeMap<EntityId, EntityId>,
}

impl IdentifierMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `old -> new`, returning the previous mapping for `old`.
    pub fn insert(&mut self, old: EntityId, new: EntityId) -> Option<EntityId> {
        self.entries.insert(old, new)
    }

    /// Looks up the new identifier for `old`.
    #[must_use]
    pub fn lookup(&self, old: EntityId) -> Option<EntityId> {
        self.entries.get(&old).copied()
    }

    /// Translates `id`, leaving unmapped identifiers unchanged.
    #[must_use]
    pub fn translate(&self, id: EntityId) -> EntityId {
        self.lookup(id).unwrap_or(id)
    }

    /// Returns true if `old` is mapped.
    #[must_use]
    pub fn contains(&self, old: EntityId) -> bool {
        self.entries.contains_key(&old)
    }

    /// Number of mappings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is mapped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(old, new)` pairs in order of `old`.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, EntityId)> + '_ {
        self.entries.iter().map(|(old, new)| (*old, *new))
    }

    /// Chains two maps: `a -> b` here and `b -> c` in `then` give `a -> c`.
    ///
    /// Entries whose image `then` does not map are dropped.
    #[must_use]
    pub fn compose(&self, then: &IdentifierMap) -> IdentifierMap {
        self.iter()
            .filter_map(|(old, mid)| then.lookup(mid).map(|new| (old, new)))
            .collect()
    }

    /// Reverses the map.
    ///
    /// When several identifiers share an image (a `Skip` import can map two
    /// archived entities onto one live entity), the smallest one wins.
    #[must_use]
    pub fn invert(&self) -> IdentifierMap {
        let mut inverted = IdentifierMap::new();
        for (old, new) in self.iter() {
            inverted.entries.entry(new).or_insert(old);
        }
        inverted
    }
}

impl FromIterator<(EntityId, EntityId)> for IdentifierMap {
    fn from_iter<I: IntoIterator<Item = (EntityId, EntityId)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl Extend<(EntityId, EntityId)> for IdentifierMap {
    fn extend<I: IntoIterator<Item = (EntityId, EntityId)>>(&mut self, iter: I) {
        self.entries.extend(iter);
    }
}
