//! Pairwise link maintenance.
//!
//! [`link`] and [`unlink`] are the only operations that touch both sides of a
//! relationship. Everything else in the engine is built from them or from the
//! raw payload writes in this module.

use codex_foundation::{EntityId, Error, Result};
use codex_storage::{Arity, Entity, EntityStore, Payload, RelationField};
use tracing::{debug, trace, warn};

use crate::changes::ChangeSet;
use crate::config::EngineConfig;
use crate::nesting::can_add_member;

/// Writes a payload, reading it back when `verify_writes` is on.
pub(crate) fn write_payload<S: EntityStore + ?Sized>(
    store: &mut S,
    config: &EngineConfig,
    id: EntityId,
    payload: Payload,
) -> Result<()> {
    let expected = config.verify_writes.then(|| payload.clone());
    store.put(id, payload)?;
    if let Some(expected) = expected {
        let stored = store.get(id).map(|e| e.payload);
        if stored.as_ref() != Some(&expected) {
            return Err(Error::store_write(id, "write did not persist"));
        }
    }
    Ok(())
}

/// Reads `id` and checks that it owns `field`.
fn owner_of<S: EntityStore + ?Sized>(
    store: &S,
    id: EntityId,
    field: RelationField,
) -> Result<Entity> {
    let entity = store.get(id).ok_or_else(|| Error::entity_not_found(id))?;
    if entity.kind() != field.owner() {
        return Err(Error::field_mismatch(id, entity.kind(), field.name()));
    }
    Ok(entity)
}

/// Removes `target` from `holder.field`, tolerating a missing holder.
fn sever<S: EntityStore + ?Sized>(
    store: &mut S,
    config: &EngineConfig,
    holder: EntityId,
    field: RelationField,
    target: EntityId,
    changes: &mut ChangeSet,
) -> Result<()> {
    let Some(mut entity) = store.get(holder) else {
        warn!(%holder, %field, "previous counterpart is gone; nothing to sever");
        return Ok(());
    };
    if entity.payload.remove(field, target) {
        debug!(%holder, %field, %target, "severed previous link");
        write_payload(store, config, holder, entity.payload)?;
        changes.insert(holder);
    }
    Ok(())
}

/// Links `b` into `a.field` and mirrors `a` onto `b`'s inverse field.
///
/// Linking an entity to itself and re-linking an existing pair are silent
/// no-ops. When a one-valued side already points elsewhere, the stale
/// counterpart is severed first, so a shop moved to a new location leaves its
/// old location's `shops`. Links on `Group.members` go through the nesting
/// guard. A dangling `b` is stripped from `a.field` and the call succeeds,
/// unless `heal_dangling` is off.
///
/// # Errors
///
/// - `EntityNotFound` if `a` does not exist
/// - `FieldMismatch` if `a` does not own `field`
/// - `KindMismatch` if `field` cannot reference `b`'s kind
/// - `MembershipRejected` if the nesting guard refuses `b`
/// - `DanglingReference` if `b` does not exist and healing is off
/// - any store write failure
pub fn link<S: EntityStore + ?Sized>(
    store: &mut S,
    config: &EngineConfig,
    a: EntityId,
    field: RelationField,
    b: EntityId,
) -> Result<ChangeSet> {
    let mut changes = ChangeSet::new();
    if a == b {
        trace!(%a, %field, "ignoring self link");
        return Ok(changes);
    }
    let mut owner = owner_of(store, a, field)?;

    let Some(mut target) = store.get(b) else {
        if !config.heal_dangling {
            return Err(Error::dangling(a, field.name(), b));
        }
        warn!(entity = %a, %field, missing = %b, "dangling reference; healing");
        if owner.payload.remove(field, b) {
            write_payload(store, config, a, owner.payload)?;
            changes.insert(a);
        }
        return Ok(changes);
    };
    if !field.accepts(target.kind()) {
        return Err(Error::kind_mismatch(b, field.name(), target.kind()));
    }

    let Some(inverse) = field.inverse() else {
        if owner.holds(field, b) {
            return Ok(changes);
        }
        if field == RelationField::GroupMembers {
            if let Err(reason) = can_add_member(store, a, b) {
                warn!(group = %a, candidate = %b, %reason, "membership rejected");
                return Err(reason.into());
            }
        }
        owner.payload.insert(field, b);
        debug!(%a, %field, %b, "linked");
        write_payload(store, config, a, owner.payload)?;
        changes.insert(a);
        return Ok(changes);
    };

    // A one-valued side pointing elsewhere is moved, never duplicated.
    if field.arity() == Arity::One {
        if let Some(&previous) = owner.refs(field).first() {
            if previous != b {
                sever(store, config, previous, inverse, a, &mut changes)?;
            }
        }
    }
    if inverse.arity() == Arity::One {
        if let Some(&previous) = target.refs(inverse).first() {
            if previous != a {
                sever(store, config, previous, field, b, &mut changes)?;
            }
        }
    }

    if owner.payload.insert(field, b) {
        debug!(%a, %field, %b, "linked");
        write_payload(store, config, a, owner.payload)?;
        changes.insert(a);
    }
    if target.payload.insert(inverse, a) {
        debug!(a = %b, field = %inverse, b = %a, "linked inverse");
        write_payload(store, config, b, target.payload)?;
        changes.insert(b);
    }
    Ok(changes)
}

/// Removes `b` from `a.field` and `a` from `b`'s inverse field.
///
/// Removing an absent pair is a no-op. A one-valued field is cleared only if
/// it holds `b`. A dangling `b` still has its trace removed from `a`.
///
/// # Errors
///
/// - `EntityNotFound` if `a` does not exist
/// - `FieldMismatch` if `a` does not own `field`
/// - any store write failure
pub fn unlink<S: EntityStore + ?Sized>(
    store: &mut S,
    config: &EngineConfig,
    a: EntityId,
    field: RelationField,
    b: EntityId,
) -> Result<ChangeSet> {
    let mut changes = ChangeSet::new();
    if a == b {
        return Ok(changes);
    }
    let mut owner = owner_of(store, a, field)?;
    if owner.payload.remove(field, b) {
        debug!(%a, %field, %b, "unlinked");
        write_payload(store, config, a, owner.payload)?;
        changes.insert(a);
    }

    let Some(inverse) = field.inverse() else {
        return Ok(changes);
    };
    match store.get(b) {
        Some(mut target) => {
            if target.payload.remove(inverse, a) {
                debug!(a = %b, field = %inverse, b = %a, "unlinked inverse");
                write_payload(store, config, b, target.payload)?;
                changes.insert(b);
            }
        }
        None => warn!(entity = %a, %field, missing = %b, "unlinked a dangling reference"),
    }
    Ok(changes)
}
