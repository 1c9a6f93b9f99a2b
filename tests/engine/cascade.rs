//! Integration tests for delete cleanup
//!
//! Deleting an entity must leave no identifier of it anywhere in the store.

use codex_foundation::{EntityKind, ErrorKind};
use codex_storage::{EntityStore, RelationField};

use crate::{engine, spawn};

#[test]
fn deleting_miller_tam_cleans_every_holder() {
    let mut engine = engine();
    let mill = spawn(&mut engine, EntityKind::Location, "Old Mill");
    let stall = spawn(&mut engine, EntityKind::Shop, "Flour Stall");
    let tam = spawn(&mut engine, EntityKind::Npc, "Miller Tam");
    let ida = spawn(&mut engine, EntityKind::Npc, "Ida");
    let cabal = spawn(&mut engine, EntityKind::Group, "Cabal");

    engine.link(mill, RelationField::LocationNpcs, tam).unwrap();
    engine.link(stall, RelationField::ShopNpcs, tam).unwrap();
    engine.link(ida, RelationField::NpcAssociates, tam).unwrap();
    engine.add_member(cabal, tam).unwrap();

    let report = engine.delete(tam).unwrap();

    assert!(report.is_complete());
    assert!(!engine.store().contains(tam));
    for entity in engine.store().all() {
        assert!(
            entity.payload.references().all(|(_, id)| id != tam),
            "{} still references the deleted npc",
            entity.name
        );
    }
    assert_eq!(report.tally(EntityKind::Location).succeeded, 1);
    assert_eq!(report.tally(EntityKind::Shop).succeeded, 1);
    assert_eq!(report.tally(EntityKind::Group).succeeded, 1);
    assert!(engine.invariant_violations().is_empty());
}

#[test]
fn deleting_a_location_nullifies_shop_and_prunes_region() {
    let mut engine = engine();
    let vale = spawn(&mut engine, EntityKind::Region, "Vale");
    let mill = spawn(&mut engine, EntityKind::Location, "Old Mill");
    let stall = spawn(&mut engine, EntityKind::Shop, "Stall");
    engine.link(vale, RelationField::RegionLocations, mill).unwrap();
    engine.link(stall, RelationField::ShopLocation, mill).unwrap();

    engine.delete(mill).unwrap();

    let store = engine.store();
    assert!(store.get(vale).unwrap().refs(RelationField::RegionLocations).is_empty());
    assert!(store.get(stall).unwrap().refs(RelationField::ShopLocation).is_empty());
}

#[test]
fn unreferenced_entities_are_only_counted_as_skipped() {
    let mut engine = engine();
    let tam = spawn(&mut engine, EntityKind::Npc, "Tam");
    spawn(&mut engine, EntityKind::Location, "Empty Field");
    spawn(&mut engine, EntityKind::Location, "Barren Hill");

    let report = engine.cascade_delete(tam).unwrap();
    assert!(report.changes.is_empty());
    assert_eq!(report.tally(EntityKind::Location).skipped, 2);
    assert!(engine.store().contains(tam));
}

#[test]
fn forget_cleans_up_after_an_external_delete() {
    let mut engine = engine();
    let mill = spawn(&mut engine, EntityKind::Location, "Old Mill");
    let tam = spawn(&mut engine, EntityKind::Npc, "Tam");
    engine.link(mill, RelationField::LocationNpcs, tam).unwrap();

    engine.store_mut().delete(tam).unwrap();
    assert!(!engine.invariant_violations().is_empty());

    let report = engine.forget(tam, EntityKind::Npc);
    assert!(report.changes.contains(mill));
    assert!(engine.invariant_violations().is_empty());
}

#[test]
fn deleting_a_missing_entity_fails() {
    let mut engine = engine();
    let tam = spawn(&mut engine, EntityKind::Npc, "Tam");
    engine.delete(tam).unwrap();
    let err = engine.delete(tam).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::EntityNotFound(_)));
}
