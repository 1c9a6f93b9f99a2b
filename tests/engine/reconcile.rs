//! Integration tests for bulk edits
//!
//! A field replaced wholesale must turn into exactly the pairwise calls its
//! difference requires.

use codex_engine::GraphOp;
use codex_foundation::{EntityKind, MembershipRejection};
use codex_storage::{EntityStore, RelationField};

use crate::{engine, spawn};

#[test]
fn edit_issues_removals_before_additions() {
    let mut engine = engine();
    let mill = spawn(&mut engine, EntityKind::Location, "Old Mill");
    let tam = spawn(&mut engine, EntityKind::Npc, "Tam");
    let ida = spawn(&mut engine, EntityKind::Npc, "Ida");
    let bram = spawn(&mut engine, EntityKind::Npc, "Bram");

    engine.edit(mill, RelationField::LocationNpcs, &[tam, ida]).unwrap();
    let outcome = engine.edit(mill, RelationField::LocationNpcs, &[ida, bram]).unwrap();

    assert!(outcome.is_clean());
    assert_eq!(outcome.ops, vec![
        GraphOp::Unlink {
            entity: mill,
            field: RelationField::LocationNpcs,
            target: tam,
        },
        GraphOp::Link {
            entity: mill,
            field: RelationField::LocationNpcs,
            target: bram,
        },
    ]);
    let store = engine.store();
    assert!(store.get(tam).unwrap().refs(RelationField::NpcLocations).is_empty());
    assert_eq!(store.get(ida).unwrap().refs(RelationField::NpcLocations), &[mill]);
    assert_eq!(store.get(bram).unwrap().refs(RelationField::NpcLocations), &[mill]);
}

#[test]
fn unchanged_field_issues_nothing() {
    let mut engine = engine();
    let mill = spawn(&mut engine, EntityKind::Location, "Old Mill");
    let tam = spawn(&mut engine, EntityKind::Npc, "Tam");
    engine.edit(mill, RelationField::LocationNpcs, &[tam]).unwrap();

    let outcome = engine.edit(mill, RelationField::LocationNpcs, &[tam]).unwrap();
    assert!(outcome.ops.is_empty());
    assert!(outcome.changes.is_empty());
}

#[test]
fn reorder_alone_issues_nothing() {
    let mut engine = engine();
    let mill = spawn(&mut engine, EntityKind::Location, "Old Mill");
    let tam = spawn(&mut engine, EntityKind::Npc, "Tam");
    let ida = spawn(&mut engine, EntityKind::Npc, "Ida");
    engine.edit(mill, RelationField::LocationNpcs, &[tam, ida]).unwrap();

    let outcome = engine.edit(mill, RelationField::LocationNpcs, &[ida, tam]).unwrap();
    assert!(outcome.ops.is_empty());
}

#[test]
fn self_reference_in_an_edit_is_dropped() {
    let mut engine = engine();
    let ida = spawn(&mut engine, EntityKind::Npc, "Ida");
    let bram = spawn(&mut engine, EntityKind::Npc, "Bram");

    let outcome = engine.edit(ida, RelationField::NpcAssociates, &[ida, bram]).unwrap();
    assert_eq!(outcome.ops.len(), 1);
    assert_eq!(
        engine.store().get(ida).unwrap().refs(RelationField::NpcAssociates),
        &[bram]
    );
    assert!(engine.invariant_violations().is_empty());
}

#[test]
fn failed_addition_is_recorded_and_rolled_back() {
    let mut engine = engine();
    let mill = spawn(&mut engine, EntityKind::Location, "Old Mill");
    let tam = spawn(&mut engine, EntityKind::Npc, "Tam");
    let vale = spawn(&mut engine, EntityKind::Region, "Vale");

    let outcome = engine.edit(mill, RelationField::LocationNpcs, &[tam, vale]).unwrap();

    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].op, GraphOp::Link {
        entity: mill,
        field: RelationField::LocationNpcs,
        target: vale,
    });
    assert_eq!(engine.store().get(mill).unwrap().refs(RelationField::LocationNpcs), &[tam]);
}

#[test]
fn single_valued_edit_moves_the_shop() {
    let mut engine = engine();
    let mill = spawn(&mut engine, EntityKind::Location, "Old Mill");
    let square = spawn(&mut engine, EntityKind::Location, "Square");
    let stall = spawn(&mut engine, EntityKind::Shop, "Stall");

    engine.edit(stall, RelationField::ShopLocation, &[mill]).unwrap();
    engine.edit(stall, RelationField::ShopLocation, &[square]).unwrap();

    let store = engine.store();
    assert!(store.get(mill).unwrap().refs(RelationField::LocationShops).is_empty());
    assert_eq!(store.get(square).unwrap().refs(RelationField::LocationShops), &[stall]);
}

#[test]
fn stored_membership_edit_is_guarded_like_a_link() {
    let mut engine = engine();
    let guild = spawn(&mut engine, EntityKind::Group, "Guild");
    let cell = spawn(&mut engine, EntityKind::Group, "Cell");
    let tam = spawn(&mut engine, EntityKind::Npc, "Tam");
    engine.add_member(guild, cell).unwrap();
    engine.add_member(cell, tam).unwrap();

    // Tam lands in the guild directly while already inside the cell.
    let before = engine.store().get(guild).unwrap().payload;
    let mut after = before.clone();
    after.insert(RelationField::GroupMembers, tam);
    engine.store_mut().put(guild, after.clone()).unwrap();
    let outcome = engine.reconcile(guild, &before, &after).unwrap();

    assert_eq!(outcome.failures.len(), 1);
    let Some(MembershipRejection::Duplicate { via, .. }) = outcome.failures[0].error.rejection()
    else {
        panic!("expected a duplicate rejection");
    };
    assert_eq!(*via, cell);
    assert_eq!(engine.store().get(guild).unwrap().refs(RelationField::GroupMembers), &[cell]);
    assert!(engine.invariant_violations().is_empty());
}
