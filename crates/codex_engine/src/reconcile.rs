//! Turning bulk edits into pairwise operations.

use codex_foundation::{EntityId, Error, Result};
use codex_storage::{EntityStore, Payload, RelationField};
use tracing::{debug, warn};

use crate::changes::{ChangeSet, GraphOp};
use crate::config::EngineConfig;
use crate::mutation::{link, unlink, write_payload};
use crate::nesting::can_add_member_to;

/// A pairwise operation that did not go through.
#[derive(Debug)]
pub struct OpFailure {
    /// The operation.
    pub op: GraphOp,
    /// Why it failed.
    pub error: Error,
}

/// What a reconciliation did.
#[derive(Debug, Default)]
pub struct ReconcileOutcome {
    /// Operations issued, in order.
    pub ops: Vec<GraphOp>,
    /// Every entity written.
    pub changes: ChangeSet,
    /// Operations that failed; the rest still ran.
    pub failures: Vec<OpFailure>,
}

impl ReconcileOutcome {
    /// Returns true if every operation succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Identifiers in `left` but not in `right`, first occurrence order, excluding `skip`.
fn difference(left: &[EntityId], right: &[EntityId], skip: EntityId) -> Vec<EntityId> {
    let mut out: Vec<EntityId> = Vec::new();
    for &id in left {
        if id != skip && !right.contains(&id) && !out.contains(&id) {
            out.push(id);
        }
    }
    out
}

/// Applies the difference between two payloads of `entity` as link and unlink calls.
///
/// For each relationship field, removals run before additions, and each
/// identifier that appears on only one side gets exactly one call. Identifiers
/// present on both sides are never visited. The store may hold either payload
/// when this runs. A failing operation is recorded and the rest still run.
///
/// # Errors
///
/// - `EntityNotFound` if `entity` does not exist
/// - `FieldMismatch` if either payload belongs to another kind
pub fn reconcile<S: EntityStore + ?Sized>(
    store: &mut S,
    config: &EngineConfig,
    entity: EntityId,
    before: &Payload,
    after: &Payload,
) -> Result<ReconcileOutcome> {
    let stored = store
        .get(entity)
        .ok_or_else(|| Error::entity_not_found(entity))?;
    let kind = stored.kind();
    for payload in [before, after] {
        if payload.kind() != kind {
            return Err(Error::field_mismatch(entity, kind, "payload"));
        }
    }

    let mut outcome = ReconcileOutcome::default();
    for field in RelationField::fields_for(kind) {
        let (old, new) = (before.refs(field), after.refs(field));
        let removed = difference(old, new, entity);
        let added = difference(new, old, entity);
        if removed.is_empty() && added.is_empty() {
            continue;
        }
        debug!(%entity, %field, removed = removed.len(), added = added.len(), "reconciling field");

        for &target in &removed {
            let op = GraphOp::Unlink {
                entity,
                field,
                target,
            };
            apply(&mut outcome, op, unlink(store, config, entity, field, target));
        }
        // The store may already hold `after`, so new members are guarded
        // against the membership the edit started from.
        let mut members: Vec<EntityId> =
            old.iter().copied().filter(|id| !removed.contains(id)).collect();
        for target in added {
            let op = GraphOp::Link {
                entity,
                field,
                target,
            };
            if field == RelationField::GroupMembers && store.contains(target) {
                if let Err(reason) = can_add_member_to(&*store, entity, &members, target) {
                    apply(&mut outcome, op, Err(reason.into()));
                    continue;
                }
                members.push(target);
            }
            apply(&mut outcome, op, link(store, config, entity, field, target));
        }
    }

    normalize(store, config, entity, &mut outcome);
    Ok(outcome)
}

fn apply(outcome: &mut ReconcileOutcome, op: GraphOp, result: Result<ChangeSet>) {
    outcome.ops.push(op);
    match result {
        Ok(changes) => outcome.changes.merge(changes),
        Err(error) => {
            warn!(%op, %error, "reconcile operation failed");
            outcome.failures.push(OpFailure { op, error });
        }
    }
}

/// Undoes what an edit stored directly but the engine refused.
///
/// When the store already held the edited payload, a rejected link, a self
/// reference, or a duplicate would otherwise stay behind on the entity itself.
fn normalize<S: EntityStore + ?Sized>(
    store: &mut S,
    config: &EngineConfig,
    entity: EntityId,
    outcome: &mut ReconcileOutcome,
) {
    let Some(mut current) = store.get(entity) else {
        return;
    };
    let mut changed = false;
    for field in RelationField::fields_for(current.kind()) {
        let mut seen = Vec::new();
        changed |= current.payload.retain(field, |id| {
            if id == entity || seen.contains(&id) {
                return false;
            }
            seen.push(id);
            true
        });
    }
    for failure in &outcome.failures {
        if let GraphOp::Link { field, target, .. } = failure.op {
            changed |= current.payload.remove(field, target);
        }
    }
    if !changed {
        return;
    }
    match write_payload(store, config, entity, current.payload) {
        Ok(()) => outcome.changes.insert(entity),
        Err(error) => warn!(%entity, %error, "could not normalize reconciled entity"),
    }
}
