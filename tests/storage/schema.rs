//! Integration tests for the relationship schema
//!
//! The link engine trusts this table, so its shape is checked here as a whole.

use codex_foundation::EntityKind;
use codex_storage::{Arity, Cardinality, OnDelete, RelationField, SCHEMA};

// =============================================================================
// Table Shape
// =============================================================================

#[test]
fn every_field_is_declared_once_in_order() {
    assert_eq!(SCHEMA.len(), RelationField::ALL.len());
    for (spec, field) in SCHEMA.iter().zip(RelationField::ALL) {
        assert_eq!(spec.field, field);
        assert_eq!(field.spec().field, field);
    }
}

#[test]
fn inverses_are_mutual() {
    for field in RelationField::ALL {
        let Some(inverse) = field.inverse() else {
            continue;
        };
        assert_eq!(inverse.inverse(), Some(field), "{field} and {inverse}");
        assert!(field.accepts(inverse.owner()), "{field} must accept {}", inverse.owner());
        assert!(inverse.accepts(field.owner()), "{inverse} must accept {}", field.owner());
    }
}

#[test]
fn cardinality_agrees_with_arity() {
    for field in RelationField::ALL {
        match field.cardinality() {
            Cardinality::ManyToOne => assert_eq!(field.arity(), Arity::One),
            Cardinality::OneToMany | Cardinality::ManyToMany | Cardinality::Directed => {
                assert_eq!(field.arity(), Arity::Many);
            }
        }
    }
}

#[test]
fn single_valued_fields_nullify_and_collections_remove() {
    for field in RelationField::ALL {
        let expected = match field.arity() {
            Arity::One => OnDelete::Nullify,
            Arity::Many => OnDelete::Remove,
        };
        assert_eq!(field.on_delete(), expected, "{field}");
    }
}

#[test]
fn associates_is_the_only_symmetric_field() {
    let symmetric: Vec<_> = RelationField::ALL
        .into_iter()
        .filter(|f| f.is_symmetric())
        .collect();
    assert_eq!(symmetric, vec![RelationField::NpcAssociates]);
}

#[test]
fn group_members_accept_every_kind_and_have_no_inverse() {
    let members = RelationField::GroupMembers;
    assert_eq!(members.inverse(), None);
    assert_eq!(members.cardinality(), Cardinality::Directed);
    for kind in EntityKind::ALL {
        assert!(members.accepts(kind));
    }
}

// =============================================================================
// Lookup
// =============================================================================

#[test]
fn lookup_by_short_name_is_per_kind() {
    assert_eq!(
        RelationField::lookup(EntityKind::Location, "npcs").unwrap(),
        RelationField::LocationNpcs
    );
    assert_eq!(
        RelationField::lookup(EntityKind::Shop, "npcs").unwrap(),
        RelationField::ShopNpcs
    );
    assert_eq!(
        RelationField::lookup(EntityKind::Location, "parentRegion").unwrap(),
        RelationField::LocationParentRegion
    );
    assert!(RelationField::lookup(EntityKind::Region, "npcs").is_err());
}

#[test]
fn referencing_lists_fields_that_can_hold_a_kind() {
    let holders: Vec<_> = RelationField::referencing(EntityKind::Shop).collect();
    assert!(holders.contains(&RelationField::LocationShops));
    assert!(holders.contains(&RelationField::NpcShops));
    assert!(holders.contains(&RelationField::GroupMembers));
    assert!(!holders.contains(&RelationField::ShopNpcs));
}
