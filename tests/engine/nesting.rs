//! Integration tests for nested group membership
//!
//! Groups may contain groups, but never themselves, never in a cycle, and
//! never the same entity twice through nesting.

use codex_engine::expand_members;
use codex_foundation::{EntityKind, ErrorKind, MembershipRejection};
use codex_storage::{EntityStore, RelationField};

use crate::{engine, spawn};

#[test]
fn nested_groups_expand_transitively() {
    let mut engine = engine();
    let guild = spawn(&mut engine, EntityKind::Group, "Guild");
    let cell = spawn(&mut engine, EntityKind::Group, "Cell");
    let tam = spawn(&mut engine, EntityKind::Npc, "Tam");
    let ida = spawn(&mut engine, EntityKind::Npc, "Ida");

    engine.add_member(cell, tam).unwrap();
    engine.add_member(guild, cell).unwrap();
    engine.add_member(guild, ida).unwrap();

    let expanded = expand_members(engine.store(), guild).unwrap();
    assert!(expanded.contains(&cell));
    assert!(expanded.contains(&tam));
    assert!(expanded.contains(&ida));
}

#[test]
fn a_group_cannot_join_itself() {
    let mut engine = engine();
    let guild = spawn(&mut engine, EntityKind::Group, "Guild");
    let err = engine.add_member(guild, guild).unwrap_err();
    assert!(matches!(
        err.rejection(),
        Some(MembershipRejection::SelfMembership { .. })
    ));
}

#[test]
fn a_three_group_cycle_is_rejected() {
    let mut engine = engine();
    let a = spawn(&mut engine, EntityKind::Group, "A");
    let b = spawn(&mut engine, EntityKind::Group, "B");
    let c = spawn(&mut engine, EntityKind::Group, "C");
    engine.add_member(a, b).unwrap();
    engine.add_member(b, c).unwrap();

    let err = engine.add_member(c, a).unwrap_err();

    let Some(MembershipRejection::Cycle { path, .. }) = err.rejection() else {
        panic!("expected a cycle rejection, got {err}");
    };
    assert_eq!(path.first(), Some(&a));
    assert!(err.to_string().contains("would create a cycle"));
    assert!(engine.store().get(c).unwrap().refs(RelationField::GroupMembers).is_empty());
}

#[test]
fn linking_members_directly_goes_through_the_guard() {
    let mut engine = engine();
    let a = spawn(&mut engine, EntityKind::Group, "A");
    let b = spawn(&mut engine, EntityKind::Group, "B");
    engine.link(a, RelationField::GroupMembers, b).unwrap();

    let err = engine.link(b, RelationField::GroupMembers, a).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::MembershipRejected(_)));
}

#[test]
fn members_reachable_through_a_nested_group_are_duplicates() {
    let mut engine = engine();
    let guild = spawn(&mut engine, EntityKind::Group, "Guild");
    let cell = spawn(&mut engine, EntityKind::Group, "Cell");
    let tam = spawn(&mut engine, EntityKind::Npc, "Tam");
    engine.add_member(cell, tam).unwrap();
    engine.add_member(guild, cell).unwrap();

    let rejection = engine.can_add_member(guild, tam).unwrap_err();
    assert!(matches!(rejection, MembershipRejection::Duplicate { via, .. } if via == cell));

    engine.add_member(cell, guild).unwrap_err();
    assert!(matches!(
        engine.can_add_member(cell, tam),
        Err(MembershipRejection::AlreadyMember { .. })
    ));
}

#[test]
fn non_group_owner_is_rejected() {
    let mut engine = engine();
    let tam = spawn(&mut engine, EntityKind::Npc, "Tam");
    let ida = spawn(&mut engine, EntityKind::Npc, "Ida");
    assert!(matches!(
        engine.can_add_member(tam, ida),
        Err(MembershipRejection::NotAGroup { .. })
    ));
}

#[test]
fn removing_a_member_is_one_sided() {
    let mut engine = engine();
    let guild = spawn(&mut engine, EntityKind::Group, "Guild");
    let tam = spawn(&mut engine, EntityKind::Npc, "Tam");
    engine.add_member(guild, tam).unwrap();

    let changes = engine.remove_member(guild, tam).unwrap();
    assert!(changes.contains(guild));
    assert!(!changes.contains(tam));
    assert!(engine.remove_member(guild, tam).unwrap().is_empty());
}
