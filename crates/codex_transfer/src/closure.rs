//! Closure traversal: everything reachable from a set of roots.

use std::collections::{BTreeMap, BTreeSet};

use codex_foundation::{EntityId, Result};
use codex_storage::{Entity, EntityStore};
use tracing::{trace, warn};

use crate::config::TransferConfig;
use crate::text::InlineReferences;

/// The entities reachable from a set of roots.
#[derive(Clone, Debug, Default)]
pub struct Subgraph {
    /// Roots that resolved, in the order given.
    pub roots: Vec<EntityId>,
    /// Identifiers in discovery order.
    pub order: Vec<EntityId>,
    /// The entities, keyed by identifier.
    pub entities: BTreeMap<EntityId, Entity>,
    /// Identifiers that were referenced but resolve to nothing.
    pub missing: BTreeSet<EntityId>,
}

impl Subgraph {
    /// Returns true if `id` is part of the subgraph.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Number of entities collected.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns true if nothing was collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Entities in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.order.iter().filter_map(|id| self.entities.get(id))
    }
}

/// Collects every entity reachable from `roots` over relationship fields.
///
/// Each entity is visited once. Identifiers that do not resolve are recorded
/// in [`Subgraph::missing`] and not traversed further. With
/// [`TransferConfig::follow_text_references`] set, inline tokens in
/// description and notes count as edges too.
///
/// # Errors
///
/// Returns an error only if the inline token matcher cannot be built.
pub fn collect_subgraph<S: EntityStore + ?Sized>(
    store: &S,
    roots: &[EntityId],
    config: &TransferConfig,
) -> Result<Subgraph> {
    let inline = if config.follow_text_references {
        Some(InlineReferences::new()?)
    } else {
        None
    };

    let mut subgraph = Subgraph::default();
    let mut visited = BTreeSet::new();
    let mut stack: Vec<EntityId> = roots.iter().rev().copied().collect();

    while let Some(id) = stack.pop() {
        if !visited.insert(id) {
            continue;
        }
        let Some(entity) = store.get(id) else {
            warn!(entity = %id, "linked entity not found during traversal");
            subgraph.missing.insert(id);
            continue;
        };
        trace!(entity = %id, kind = %entity.kind(), "collected");

        let mut next: Vec<EntityId> =
            entity.payload.references().map(|(_, target)| target).collect();
        if let Some(inline) = &inline {
            next.extend(inline.ids(&entity.description));
            next.extend(inline.ids(&entity.notes));
        }
        stack.extend(next.into_iter().rev().filter(|target| !visited.contains(target)));

        if roots.contains(&id) {
            subgraph.roots.push(id);
        }
        subgraph.order.push(id);
        subgraph.entities.insert(id, entity);
    }

    subgraph.roots.sort_by_key(|id| roots.iter().position(|root| root == id));
    Ok(subgraph)
}
