//! Static declaration of the relationship schema.
//!
//! Every relationship field of every entity kind is listed once in
//! [`SCHEMA`], together with its owner, the kinds it may point at, its arity,
//! its inverse on the other side, and what happens to it when the target is
//! deleted. Nothing else in the workspace hardcodes these facts.

use std::fmt;

use codex_foundation::{EntityKind, Error, ErrorKind, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How many identifiers a field holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Arity {
    /// A single optional identifier.
    One,
    /// An ordered collection of distinct identifiers.
    Many,
}

/// Cardinality of a field, seen from its owner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Cardinality {
    /// The owner holds many targets, each target points back at one owner.
    OneToMany,
    /// The owner holds one target, the target lists many owners.
    ManyToOne,
    /// Both sides hold collections.
    ManyToMany,
    /// No inverse; the target never learns about the reference.
    Directed,
}

/// What happens to a field when an entity it references is deleted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OnDelete {
    /// Remove the identifier from the collection.
    Remove,
    /// Set the single value to none.
    Nullify,
}

/// A declared relationship field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RelationField {
    /// `Region.locations`
    RegionLocations,
    /// `Location.parentRegion`
    LocationParentRegion,
    /// `Location.npcs`
    LocationNpcs,
    /// `Location.shops`
    LocationShops,
    /// `Shop.location`
    ShopLocation,
    /// `Shop.npcs`
    ShopNpcs,
    /// `Npc.locations`
    NpcLocations,
    /// `Npc.shops`
    NpcShops,
    /// `Npc.associates`
    NpcAssociates,
    /// `Group.members`
    GroupMembers,
}

/// Full declaration of one relationship field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldSpec {
    /// The field being declared.
    pub field: RelationField,
    /// Short name as it appears on the owner.
    pub name: &'static str,
    /// Kind that owns the field.
    pub owner: EntityKind,
    /// Kinds the field may reference.
    pub targets: &'static [EntityKind],
    /// Single value or collection.
    pub arity: Arity,
    /// Field on the target that mirrors this one.
    pub inverse: Option<RelationField>,
    /// Cardinality seen from the owner.
    pub cardinality: Cardinality,
    /// Behaviour when a referenced entity is deleted.
    pub on_delete: OnDelete,
}

/// The complete relationship schema, in declaration order.
pub static SCHEMA: [FieldSpec; 10] = [
    FieldSpec {
        field: RelationField::RegionLocations,
        name: "locations",
        owner: EntityKind::Region,
        targets: &[EntityKind::Location],
        arity: Arity::Many,
        inverse: Some(RelationField::LocationParentRegion),
        cardinality: Cardinality::OneToMany,
        on_delete: OnDelete::Remove,
    },
    FieldSpec {
        field: RelationField::LocationParentRegion,
        name: "parentRegion",
        owner: EntityKind::Location,
        targets: &[EntityKind::Region],
        arity: Arity::One,
        inverse: Some(RelationField::RegionLocations),
        cardinality: Cardinality::ManyToOne,
        on_delete: OnDelete::Nullify,
    },
    FieldSpec {
        field: RelationField::LocationNpcs,
        name: "npcs",
        owner: EntityKind::Location,
        targets: &[EntityKind::Npc],
        arity: Arity::Many,
        inverse: Some(RelationField::NpcLocations),
        cardinality: Cardinality::ManyToMany,
        on_delete: OnDelete::Remove,
    },
    FieldSpec {
        field: RelationField::LocationShops,
        name: "shops",
        owner: EntityKind::Location,
        targets: &[EntityKind::Shop],
        arity: Arity::Many,
        inverse: Some(RelationField::ShopLocation),
        cardinality: Cardinality::OneToMany,
        on_delete: OnDelete::Remove,
    },
    FieldSpec {
        field: RelationField::ShopLocation,
        name: "location",
        owner: EntityKind::Shop,
        targets: &[EntityKind::Location],
        arity: Arity::One,
        inverse: Some(RelationField::LocationShops),
        cardinality: Cardinality::ManyToOne,
        on_delete: OnDelete::Nullify,
    },
    FieldSpec {
        field: RelationField::ShopNpcs,
        name: "npcs",
        owner: EntityKind::Shop,
        targets: &[EntityKind::Npc],
        arity: Arity::Many,
        inverse: Some(RelationField::NpcShops),
        cardinality: Cardinality::ManyToMany,
        on_delete: OnDelete::Remove,
    },
    FieldSpec {
        field: RelationField::NpcLocations,
        name: "locations",
        owner: EntityKind::Npc,
        targets: &[EntityKind::Location],
        arity: Arity::Many,
        inverse: Some(RelationField::LocationNpcs),
        cardinality: Cardinality::ManyToMany,
        on_delete: OnDelete::Remove,
    },
    FieldSpec {
        field: RelationField::NpcShops,
        name: "shops",
        owner: EntityKind::Npc,
        targets: &[EntityKind::Shop],
        arity: Arity::Many,
        inverse: Some(RelationField::ShopNpcs),
        cardinality: Cardinality::ManyToMany,
        on_delete: OnDelete::Remove,
    },
    FieldSpec {
        field: RelationField::NpcAssociates,
        name: "associates",
        owner: EntityKind::Npc,
        targets: &[EntityKind::Npc],
        arity: Arity::Many,
        inverse: Some(RelationField::NpcAssociates),
        cardinality: Cardinality::ManyToMany,
        on_delete: OnDelete::Remove,
    },
    FieldSpec {
        field: RelationField::GroupMembers,
        name: "members",
        owner: EntityKind::Group,
        targets: &EntityKind::ALL,
        arity: Arity::Many,
        inverse: None,
        cardinality: Cardinality::Directed,
        on_delete: OnDelete::Remove,
    },
];

impl RelationField {
    /// Every field, in declaration order.
    pub const ALL: [RelationField; 10] = [
        RelationField::RegionLocations,
        RelationField::LocationParentRegion,
        RelationField::LocationNpcs,
        RelationField::LocationShops,
        RelationField::ShopLocation,
        RelationField::ShopNpcs,
        RelationField::NpcLocations,
        RelationField::NpcShops,
        RelationField::NpcAssociates,
        RelationField::GroupMembers,
    ];

    /// Returns the full declaration of this field.
    #[must_use]
    pub fn spec(self) -> &'static FieldSpec {
        // SCHEMA is declared in the same order as the enum.
        &SCHEMA[self as usize]
    }

    /// Returns the kind that owns this field.
    #[must_use]
    pub fn owner(self) -> EntityKind {
        self.spec().owner
    }

    /// Returns the field's arity.
    #[must_use]
    pub fn arity(self) -> Arity {
        self.spec().arity
    }

    /// Returns the mirrored field on the target, if any.
    #[must_use]
    pub fn inverse(self) -> Option<RelationField> {
        self.spec().inverse
    }

    /// Returns the field's cardinality.
    #[must_use]
    pub fn cardinality(self) -> Cardinality {
        self.spec().cardinality
    }

    /// Returns the field's on-delete behaviour.
    #[must_use]
    pub fn on_delete(self) -> OnDelete {
        self.spec().on_delete
    }

    /// Returns true if the field may reference entities of `kind`.
    #[must_use]
    pub fn accepts(self, kind: EntityKind) -> bool {
        self.spec().targets.contains(&kind)
    }

    /// Returns true if the field is its own inverse.
    #[must_use]
    pub fn is_symmetric(self) -> bool {
        self.inverse() == Some(self)
    }

    /// Returns the short name of the field on its owner.
    #[must_use]
    pub fn short_name(self) -> &'static str {
        self.spec().name
    }

    /// Returns the qualified name, e.g. `Location.npcs`.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::RegionLocations => "Region.locations",
            Self::LocationParentRegion => "Location.parentRegion",
            Self::LocationNpcs => "Location.npcs",
            Self::LocationShops => "Location.shops",
            Self::ShopLocation => "Shop.location",
            Self::ShopNpcs => "Shop.npcs",
            Self::NpcLocations => "Npc.locations",
            Self::NpcShops => "Npc.shops",
            Self::NpcAssociates => "Npc.associates",
            Self::GroupMembers => "Group.members",
        }
    }

    /// Returns the fields owned by `kind`.
    pub fn fields_for(kind: EntityKind) -> impl Iterator<Item = RelationField> {
        Self::ALL.into_iter().filter(move |f| f.owner() == kind)
    }

    /// Returns the fields that may hold a reference to an entity of `kind`.
    pub fn referencing(kind: EntityKind) -> impl Iterator<Item = RelationField> {
        Self::ALL.into_iter().filter(move |f| f.accepts(kind))
    }

    /// Looks a field up by its short name on `kind`.
    ///
    /// Matching ignores ASCII case, so `parentregion` and `parentRegion` both
    /// resolve.
    ///
    /// # Errors
    ///
    /// Returns an error if `kind` declares no field with that name.
    pub fn lookup(kind: EntityKind, name: &str) -> Result<RelationField> {
        Self::fields_for(kind)
            .find(|f| f.short_name().eq_ignore_ascii_case(name))
            .ok_or_else(|| {
                Error::new(ErrorKind::Internal(format!(
                    "{kind} has no relationship field named {name:?}"
                )))
            })
    }
}

impl fmt::Display for RelationField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
