//! Change sets, graph operations, and update notices.

use std::collections::BTreeSet;
use std::fmt;

use codex_foundation::EntityId;
use codex_storage::{Payload, RelationField};

/// Identifiers of entities whose payload changed, returned by every operation
/// so callers can refresh whatever views they hold.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChangeSet {
    ids: BTreeSet<EntityId>,
}

impl ChangeSet {
    /// Creates an empty change set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a changed entity.
    pub fn insert(&mut self, id: EntityId) {
        self.ids.insert(id);
    }

    /// Folds another change set into this one.
    pub fn merge(&mut self, other: ChangeSet) {
        self.ids.extend(other.ids);
    }

    /// Returns true if `id` changed.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.ids.contains(&id)
    }

    /// Number of changed entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns true if nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Iterates over changed identifiers in order.
    pub fn iter(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.ids.iter().copied()
    }
}

impl FromIterator<EntityId> for ChangeSet {
    fn from_iter<I: IntoIterator<Item = EntityId>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

impl Extend<EntityId> for ChangeSet {
    fn extend<I: IntoIterator<Item = EntityId>>(&mut self, iter: I) {
        self.ids.extend(iter);
    }
}

impl IntoIterator for ChangeSet {
    type Item = EntityId;
    type IntoIter = std::collections::btree_set::IntoIter<EntityId>;

    fn into_iter(self) -> Self::IntoIter {
        self.ids.into_iter()
    }
}

/// A pairwise operation issued by the reconciler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GraphOp {
    /// `link(entity, field, target)`
    Link {
        /// Owner of the field.
        entity: EntityId,
        /// Field on the owner.
        field: RelationField,
        /// Referenced entity.
        target: EntityId,
    },
    /// `unlink(entity, field, target)`
    Unlink {
        /// Owner of the field.
        entity: EntityId,
        /// Field on the owner.
        field: RelationField,
        /// Referenced entity.
        target: EntityId,
    },
}

impl fmt::Display for GraphOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Link {
                entity,
                field,
                target,
            } => write!(f, "link {entity} {field} {target}"),
            Self::Unlink {
                entity,
                field,
                target,
            } => write!(f, "unlink {entity} {field} {target}"),
        }
    }
}

/// Identity of one top-level engine call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub u64);

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scope#{}", self.0)
    }
}

/// A change observed on the shared notification path.
#[derive(Clone, Debug, PartialEq)]
pub struct UpdateNotice {
    /// The entity that was written.
    pub entity: EntityId,
    /// Payload before an external edit. Engine writes carry none.
    pub before: Option<Payload>,
    /// Scope of the engine call that issued the write; none for external edits.
    pub scope: Option<ScopeId>,
}

impl UpdateNotice {
    /// A notice for an edit made outside the engine.
    #[must_use]
    pub fn external(entity: EntityId, before: Payload) -> Self {
        Self {
            entity,
            before: Some(before),
            scope: None,
        }
    }

    /// A notice for a write the engine issued within `scope`.
    #[must_use]
    pub fn consequence(entity: EntityId, scope: ScopeId) -> Self {
        Self {
            entity,
            before: None,
            scope: Some(scope),
        }
    }

    /// Returns true if the notice came from an engine write.
    #[must_use]
    pub fn is_consequence(&self) -> bool {
        self.scope.is_some()
    }
}
