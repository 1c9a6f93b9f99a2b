//! Integration tests for pairwise linking
//!
//! Both sides of every declared relationship must agree after each call.

use codex_foundation::{EntityKind, ErrorKind};
use codex_storage::{EntityStore, RelationField};

use crate::{engine, spawn};

// =============================================================================
// Basic Linking
// =============================================================================

#[test]
fn old_mill_gains_miller_tam() {
    let mut engine = engine();
    let mill = spawn(&mut engine, EntityKind::Location, "Old Mill");
    let tam = spawn(&mut engine, EntityKind::Npc, "Miller Tam");

    let changes = engine.link(mill, RelationField::LocationNpcs, tam).unwrap();

    assert!(changes.contains(mill));
    assert!(changes.contains(tam));
    let store = engine.store();
    assert_eq!(store.get(mill).unwrap().refs(RelationField::LocationNpcs), &[tam]);
    assert_eq!(store.get(tam).unwrap().refs(RelationField::NpcLocations), &[mill]);
}

#[test]
fn linking_from_either_side_is_equivalent() {
    let mut engine = engine();
    let shop = spawn(&mut engine, EntityKind::Shop, "Stall");
    let npc = spawn(&mut engine, EntityKind::Npc, "Ida");

    engine.link(npc, RelationField::NpcShops, shop).unwrap();
    let store = engine.store();
    assert_eq!(store.get(shop).unwrap().refs(RelationField::ShopNpcs), &[npc]);
    assert!(engine.invariant_violations().is_empty());
}

#[test]
fn relinking_is_idempotent() {
    let mut engine = engine();
    let mill = spawn(&mut engine, EntityKind::Location, "Old Mill");
    let tam = spawn(&mut engine, EntityKind::Npc, "Miller Tam");

    engine.link(mill, RelationField::LocationNpcs, tam).unwrap();
    let again = engine.link(mill, RelationField::LocationNpcs, tam).unwrap();

    assert!(again.is_empty());
    assert_eq!(engine.store().get(mill).unwrap().refs(RelationField::LocationNpcs).len(), 1);
}

#[test]
fn associates_are_symmetric() {
    let mut engine = engine();
    let a = spawn(&mut engine, EntityKind::Npc, "Ida");
    let b = spawn(&mut engine, EntityKind::Npc, "Bram");

    engine.link(a, RelationField::NpcAssociates, b).unwrap();
    let store = engine.store();
    assert_eq!(store.get(a).unwrap().refs(RelationField::NpcAssociates), &[b]);
    assert_eq!(store.get(b).unwrap().refs(RelationField::NpcAssociates), &[a]);

    engine.unlink(b, RelationField::NpcAssociates, a).unwrap();
    let store = engine.store();
    assert!(store.get(a).unwrap().refs(RelationField::NpcAssociates).is_empty());
    assert!(store.get(b).unwrap().refs(RelationField::NpcAssociates).is_empty());
}

#[test]
fn self_link_is_ignored() {
    let mut engine = engine();
    let a = spawn(&mut engine, EntityKind::Npc, "Ida");
    let changes = engine.link(a, RelationField::NpcAssociates, a).unwrap();
    assert!(changes.is_empty());
    assert!(engine.store().get(a).unwrap().refs(RelationField::NpcAssociates).is_empty());
}

// =============================================================================
// Move Semantics
// =============================================================================

#[test]
fn setting_parent_region_moves_the_location() {
    let mut engine = engine();
    let vale = spawn(&mut engine, EntityKind::Region, "Vale");
    let moor = spawn(&mut engine, EntityKind::Region, "Moor");
    let mill = spawn(&mut engine, EntityKind::Location, "Old Mill");

    engine.link(vale, RelationField::RegionLocations, mill).unwrap();
    engine.link(mill, RelationField::LocationParentRegion, moor).unwrap();

    let store = engine.store();
    assert!(store.get(vale).unwrap().refs(RelationField::RegionLocations).is_empty());
    assert_eq!(store.get(moor).unwrap().refs(RelationField::RegionLocations), &[mill]);
    assert_eq!(store.get(mill).unwrap().refs(RelationField::LocationParentRegion), &[moor]);
}

#[test]
fn adding_a_shop_to_a_location_takes_it_from_the_old_one() {
    let mut engine = engine();
    let mill = spawn(&mut engine, EntityKind::Location, "Old Mill");
    let square = spawn(&mut engine, EntityKind::Location, "Square");
    let stall = spawn(&mut engine, EntityKind::Shop, "Flour Stall");

    engine.link(stall, RelationField::ShopLocation, mill).unwrap();
    engine.link(square, RelationField::LocationShops, stall).unwrap();

    let store = engine.store();
    assert!(store.get(mill).unwrap().refs(RelationField::LocationShops).is_empty());
    assert_eq!(store.get(square).unwrap().refs(RelationField::LocationShops), &[stall]);
    assert_eq!(store.get(stall).unwrap().refs(RelationField::ShopLocation), &[square]);
    assert!(engine.invariant_violations().is_empty());
}

// =============================================================================
// Rejections
// =============================================================================

#[test]
fn wrong_target_kind_is_rejected_without_writes() {
    let mut engine = engine();
    let mill = spawn(&mut engine, EntityKind::Location, "Old Mill");
    let vale = spawn(&mut engine, EntityKind::Region, "Vale");

    let err = engine.link(mill, RelationField::LocationNpcs, vale).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::KindMismatch { .. }));
    assert!(engine.store().get(mill).unwrap().refs(RelationField::LocationNpcs).is_empty());
}

#[test]
fn field_of_another_kind_is_rejected() {
    let mut engine = engine();
    let vale = spawn(&mut engine, EntityKind::Region, "Vale");
    let tam = spawn(&mut engine, EntityKind::Npc, "Tam");
    let err = engine.link(vale, RelationField::LocationNpcs, tam).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::FieldMismatch { .. }));
}

#[test]
fn missing_target_heals_or_fails_by_config() {
    let mut engine = engine();
    let mill = spawn(&mut engine, EntityKind::Location, "Old Mill");
    let ghost = spawn(&mut engine, EntityKind::Npc, "Ghost");
    engine.store_mut().delete(ghost).unwrap();

    assert!(engine.link(mill, RelationField::LocationNpcs, ghost).is_ok());
    assert!(engine.store().get(mill).unwrap().refs(RelationField::LocationNpcs).is_empty());

    engine.set_config(codex_engine::EngineConfig::strict());
    let err = engine.link(mill, RelationField::LocationNpcs, ghost).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::DanglingReference { missing, .. } if missing == ghost));
}
