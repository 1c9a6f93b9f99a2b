//! Audit and repair of a hand-corrupted store
//!
//! Stores edited outside the engine can hold any mix of broken references;
//! one repair pass must leave none.

use codex_engine::{Engine, InvariantViolation, invariant_violations};
use codex_foundation::{EntityId, EntityKind};
use codex_storage::{EntityDraft, EntityStore, MemoryStore, RelationField};

fn corrupt(store: &mut MemoryStore, id: EntityId, field: RelationField, refs: &[EntityId]) {
    let mut entity = store.get(id).unwrap();
    entity.payload.assign(field, refs);
    store.update(entity).unwrap();
}

#[test]
fn repair_fixes_every_kind_of_damage_at_once() {
    let mut store = MemoryStore::new(7);
    let mut create = |kind, name: &str| store.create(EntityDraft::new(kind, name)).unwrap();
    let vale = create(EntityKind::Region, "Vale");
    let mill = create(EntityKind::Location, "Old Mill");
    let square = create(EntityKind::Location, "Square");
    let tam = create(EntityKind::Npc, "Tam");
    let ida = create(EntityKind::Npc, "Ida");
    let a = create(EntityKind::Group, "A");
    let b = create(EntityKind::Group, "B");
    let ghost = create(EntityKind::Npc, "Ghost");
    store.delete(ghost).unwrap();

    // One-sided many-to-many, a duplicate, a dangling id, and a wrong kind.
    corrupt(&mut store, mill, RelationField::LocationNpcs, &[tam, tam, ghost, vale]);
    // Self reference.
    corrupt(&mut store, ida, RelationField::NpcAssociates, &[ida]);
    // Many-to-one side set, one-to-many side missing.
    corrupt(&mut store, square, RelationField::LocationParentRegion, &[vale]);
    // One-to-many side set, many-to-one side missing.
    corrupt(&mut store, vale, RelationField::RegionLocations, &[mill]);
    // Membership loop.
    corrupt(&mut store, a, RelationField::GroupMembers, &[b]);
    corrupt(&mut store, b, RelationField::GroupMembers, &[a]);

    let found = invariant_violations(&store);
    assert!(found.iter().any(|v| matches!(v, InvariantViolation::GroupCycle { .. })));
    assert!(found.iter().any(|v| matches!(v, InvariantViolation::SelfReference { .. })));
    assert!(found.iter().any(|v| matches!(v, InvariantViolation::KindMismatch { .. })));

    let mut engine = Engine::new(store);
    let report = engine.repair();

    assert_eq!(report.found.len(), found.len());
    assert!(report.failures.is_empty());
    assert!(engine.invariant_violations().is_empty());

    let store = engine.store();
    assert_eq!(store.get(mill).unwrap().refs(RelationField::LocationNpcs), &[tam]);
    assert_eq!(store.get(tam).unwrap().refs(RelationField::NpcLocations), &[mill]);
    assert!(store.get(ida).unwrap().refs(RelationField::NpcAssociates).is_empty());
    // The single-valued side decides.
    assert_eq!(store.get(vale).unwrap().refs(RelationField::RegionLocations), &[square]);
    assert!(store.get(mill).unwrap().refs(RelationField::LocationParentRegion).is_empty());
    let a_members = store.get(a).unwrap().refs(RelationField::GroupMembers).len();
    let b_members = store.get(b).unwrap().refs(RelationField::GroupMembers).len();
    assert_eq!(a_members + b_members, 1);
}

#[test]
fn repairing_a_sound_store_writes_nothing() {
    let mut engine = Engine::new(MemoryStore::new(7));
    let mill = engine.create(EntityDraft::new(EntityKind::Location, "Mill")).unwrap();
    let tam = engine.create(EntityDraft::new(EntityKind::Npc, "Tam")).unwrap();
    engine.link(mill, RelationField::LocationNpcs, tam).unwrap();

    let report = engine.repair();
    assert!(report.found.is_empty());
    assert!(report.changes.is_empty());
    assert_eq!(report.summary(), "graph is consistent");
}
