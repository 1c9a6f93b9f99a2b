//! Entity records with statically typed relationship payloads.

use codex_foundation::{EntityId, EntityKind};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::schema::RelationField;

/// A campaign entity as held by a store.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Entity {
    /// Stable global identifier.
    pub id: EntityId,
    /// Display name.
    pub name: String,
    /// Free-text description. May contain inline reference tokens.
    pub description: String,
    /// Free-text notes. May contain inline reference tokens.
    pub notes: String,
    /// Identifier this entity was copied from, persisted across transfers.
    pub origin: Option<EntityId>,
    /// Kind-specific relationship payload.
    pub payload: Payload,
}

impl Entity {
    /// Returns the entity's kind.
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        self.payload.kind()
    }

    /// Returns the identifiers held in `field`.
    #[must_use]
    pub fn refs(&self, field: RelationField) -> &[EntityId] {
        self.payload.refs(field)
    }

    /// Returns true if `field` holds `target`.
    #[must_use]
    pub fn holds(&self, field: RelationField, target: EntityId) -> bool {
        self.refs(field).contains(&target)
    }

    /// Returns the correlation key used to recognise this entity across stores.
    #[must_use]
    pub fn correlation_key(&self) -> EntityId {
        self.origin.unwrap_or(self.id)
    }
}

/// Links held by a region.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RegionLinks {
    /// Locations inside the region.
    pub locations: Vec<EntityId>,
}

/// Links held by a location.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LocationLinks {
    /// The region containing this location.
    pub parent_region: Option<EntityId>,
    /// Characters found here.
    pub npcs: Vec<EntityId>,
    /// Shops situated here.
    pub shops: Vec<EntityId>,
}

/// One line of a shop's stock. References the external item store.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct InventoryEntry {
    /// External item identifier.
    pub item: String,
    /// Units in stock.
    pub quantity: u32,
    /// Price overriding the item's own, before markup.
    pub custom_price: Option<f64>,
}

/// Links held by a shop.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ShopLinks {
    /// The location the shop is in.
    pub location: Option<EntityId>,
    /// Characters working here.
    pub npcs: Vec<EntityId>,
    /// Stock, outside the graph.
    pub inventory: Vec<InventoryEntry>,
    /// Price multiplier applied to stock.
    pub markup: f64,
}

impl Default for ShopLinks {
    fn default() -> Self {
        Self {
            location: None,
            npcs: Vec::new(),
            inventory: Vec::new(),
            markup: 1.0,
        }
    }
}

/// Links held by a non-player character.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NpcLinks {
    /// Locations the character frequents.
    pub locations: Vec<EntityId>,
    /// Shops the character works at.
    pub shops: Vec<EntityId>,
    /// Other characters, symmetric.
    pub associates: Vec<EntityId>,
    /// External actor identifier, outside the graph.
    pub actor: Option<String>,
}

/// Links held by a group.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GroupLinks {
    /// Members of any kind, including nested groups.
    pub members: Vec<EntityId>,
}

/// Kind-specific relationship payload.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Payload {
    /// A region.
    Region(RegionLinks),
    /// A location.
    Location(LocationLinks),
    /// A shop.
    Shop(ShopLinks),
    /// A non-player character.
    Npc(NpcLinks),
    /// A group.
    Group(GroupLinks),
}

/// Mutable access to one relationship field.
enum Slot<'a> {
    One(&'a mut Option<EntityId>),
    Many(&'a mut Vec<EntityId>),
}

impl Payload {
    /// Creates an empty payload of the given kind.
    #[must_use]
    pub fn empty(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Region => Self::Region(RegionLinks::default()),
            EntityKind::Location => Self::Location(LocationLinks::default()),
            EntityKind::Shop => Self::Shop(ShopLinks::default()),
            EntityKind::Npc => Self::Npc(NpcLinks::default()),
            EntityKind::Group => Self::Group(GroupLinks::default()),
        }
    }

    /// Returns the kind this payload belongs to.
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Region(_) => EntityKind::Region,
            Self::Location(_) => EntityKind::Location,
            Self::Shop(_) => EntityKind::Shop,
            Self::Npc(_) => EntityKind::Npc,
            Self::Group(_) => EntityKind::Group,
        }
    }

    /// Returns the identifiers held in `field`.
    ///
    /// Fields not owned by this payload's kind read as empty.
    #[must_use]
    pub fn refs(&self, field: RelationField) -> &[EntityId] {
        match (self, field) {
            (Self::Region(r), RelationField::RegionLocations) => &r.locations,
            (Self::Location(l), RelationField::LocationParentRegion) => {
                l.parent_region.as_slice()
            }
            (Self::Location(l), RelationField::LocationNpcs) => &l.npcs,
            (Self::Location(l), RelationField::LocationShops) => &l.shops,
            (Self::Shop(s), RelationField::ShopLocation) => s.location.as_slice(),
            (Self::Shop(s), RelationField::ShopNpcs) => &s.npcs,
            (Self::Npc(n), RelationField::NpcLocations) => &n.locations,
            (Self::Npc(n), RelationField::NpcShops) => &n.shops,
            (Self::Npc(n), RelationField::NpcAssociates) => &n.associates,
            (Self::Group(g), RelationField::GroupMembers) => &g.members,
            _ => &[],
        }
    }

    fn slot(&mut self, field: RelationField) -> Option<Slot<'_>> {
        let slot = match (self, field) {
            (Self::Region(r), RelationField::RegionLocations) => Slot::Many(&mut r.locations),
            (Self::Location(l), RelationField::LocationParentRegion) => {
                Slot::One(&mut l.parent_region)
            }
            (Self::Location(l), RelationField::LocationNpcs) => Slot::Many(&mut l.npcs),
            (Self::Location(l), RelationField::LocationShops) => Slot::Many(&mut l.shops),
            (Self::Shop(s), RelationField::ShopLocation) => Slot::One(&mut s.location),
            (Self::Shop(s), RelationField::ShopNpcs) => Slot::Many(&mut s.npcs),
            (Self::Npc(n), RelationField::NpcLocations) => Slot::Many(&mut n.locations),
            (Self::Npc(n), RelationField::NpcShops) => Slot::Many(&mut n.shops),
            (Self::Npc(n), RelationField::NpcAssociates) => Slot::Many(&mut n.associates),
            (Self::Group(g), RelationField::GroupMembers) => Slot::Many(&mut g.members),
            _ => return None,
        };
        Some(slot)
    }

    /// Adds `target` to a collection, or sets a single value.
    ///
    /// Returns true if the payload changed. Collections never gain a
    /// duplicate; a single value is overwritten.
    pub fn insert(&mut self, field: RelationField, target: EntityId) -> bool {
        match self.slot(field) {
            Some(Slot::One(value)) => value.replace(target) != Some(target),
            Some(Slot::Many(values)) => {
                if values.contains(&target) {
                    false
                } else {
                    values.push(target);
                    true
                }
            }
            None => false,
        }
    }

    /// Removes `target` from a collection, or clears a single value equal to it.
    ///
    /// Returns true if the payload changed.
    pub fn remove(&mut self, field: RelationField, target: EntityId) -> bool {
        match self.slot(field) {
            Some(Slot::One(value)) => {
                if *value == Some(target) {
                    *value = None;
                    true
                } else {
                    false
                }
            }
            Some(Slot::Many(values)) => {
                let before = values.len();
                values.retain(|id| *id != target);
                values.len() != before
            }
            None => false,
        }
    }

    /// Keeps only the identifiers of `field` for which `keep` returns true.
    ///
    /// Returns true if the payload changed.
    pub fn retain(&mut self, field: RelationField, mut keep: impl FnMut(EntityId) -> bool) -> bool {
        match self.slot(field) {
            Some(Slot::One(value)) => match *value {
                Some(id) if !keep(id) => {
                    *value = None;
                    true
                }
                _ => false,
            },
            Some(Slot::Many(values)) => {
                let before = values.len();
                values.retain(|id| keep(*id));
                values.len() != before
            }
            None => false,
        }
    }

    /// Replaces the contents of `field` wholesale.
    ///
    /// For a single-valued field only the first identifier is kept. Returns
    /// true if the payload changed.
    pub fn assign(&mut self, field: RelationField, targets: &[EntityId]) -> bool {
        match self.slot(field) {
            Some(Slot::One(value)) => {
                let next = targets.first().copied();
                let changed = *value != next;
                *value = next;
                changed
            }
            Some(Slot::Many(values)) => {
                let changed = values.as_slice() != targets;
                values.clear();
                values.extend_from_slice(targets);
                changed
            }
            None => false,
        }
    }

    /// Rewrites every identifier of `field` through `translate`.
    ///
    /// Identifiers mapped to `None` are dropped. Returns true if the payload
    /// changed.
    pub fn rewrite(
        &mut self,
        field: RelationField,
        mut translate: impl FnMut(EntityId) -> Option<EntityId>,
    ) -> bool {
        match self.slot(field) {
            Some(Slot::One(value)) => {
                let next = value.and_then(&mut translate);
                let changed = *value != next;
                *value = next;
                changed
            }
            Some(Slot::Many(values)) => {
                let next: Vec<_> = values.iter().filter_map(|id| translate(*id)).collect();
                let changed = *values != next;
                *values = next;
                changed
            }
            None => false,
        }
    }

    /// Iterates over every `(field, target)` reference in the payload.
    pub fn references(&self) -> impl Iterator<Item = (RelationField, EntityId)> + '_ {
        RelationField::fields_for(self.kind())
            .flat_map(move |field| self.refs(field).iter().map(move |id| (field, *id)))
    }
}

/// Input to [`EntityStore::create`](crate::EntityStore::create).
#[derive(Clone, Debug, PartialEq)]
pub struct EntityDraft {
    /// Display name.
    pub name: String,
    /// Free-text description.
    pub description: String,
    /// Free-text notes.
    pub notes: String,
    /// Correlation field.
    pub origin: Option<EntityId>,
    /// Initial payload.
    pub payload: Payload,
}

impl EntityDraft {
    /// Creates a draft with an empty payload.
    #[must_use]
    pub fn new(kind: EntityKind, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            notes: String::new(),
            origin: None,
            payload: Payload::empty(kind),
        }
    }

    /// Creates a draft copying everything but the identifier from `entity`.
    #[must_use]
    pub fn copy_of(entity: &Entity) -> Self {
        Self {
            name: entity.name.clone(),
            description: entity.description.clone(),
            notes: entity.notes.clone(),
            origin: entity.origin,
            payload: entity.payload.clone(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the notes.
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Sets the correlation field.
    #[must_use]
    pub fn with_origin(mut self, origin: EntityId) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Replaces the payload.
    #[must_use]
    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    /// Returns the draft's kind.
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        self.payload.kind()
    }

    /// Turns the draft into an entity with the given identifier.
    #[must_use]
    pub fn into_entity(self, id: EntityId) -> Entity {
        Entity {
            id,
            name: self.name,
            description: self.description,
            notes: self.notes,
            origin: self.origin,
            payload: self.payload,
        }
    }
}
