//! In-memory store backed by persistent maps.
//!
//! Cloning a [`MemoryStore`] is O(1) and shares structure with the original,
//! so callers can take snapshots before a risky batch and diff afterwards.

use im::{OrdMap, Vector};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use codex_foundation::{EntityId, EntityKind, Error, ID_LEN, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::entity::{Entity, EntityDraft, Payload};
use crate::manifest::Manifest;
use crate::store::EntityStore;

const ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Deterministic identifier source.
///
/// Serializes as its seed and the number of identifiers issued; loading
/// replays the stream so a reloaded store continues where it left off.
#[derive(Clone, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(from = "IdState", into = "IdState")
)]
struct IdGenerator {
    seed: u64,
    issued: u64,
    rng: ChaCha8Rng,
}

impl IdGenerator {
    fn new(seed: u64) -> Self {
        Self {
            seed,
            issued: 0,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    fn draw(&mut self) -> String {
        self.issued += 1;
        (0..ID_LEN)
            .map(|_| char::from(ALPHABET[self.rng.gen_range(0..ALPHABET.len())]))
            .collect()
    }

    fn next_id(&mut self) -> Result<EntityId> {
        EntityId::parse(&self.draw())
    }
}

#[cfg(feature = "serde")]
#[derive(Serialize, Deserialize)]
struct IdState {
    seed: u64,
    issued: u64,
}

#[cfg(feature = "serde")]
impl From<IdState> for IdGenerator {
    fn from(state: IdState) -> Self {
        let mut ids = IdGenerator::new(state.seed);
        for _ in 0..state.issued {
            ids.draw();
        }
        ids
    }
}

#[cfg(feature = "serde")]
impl From<IdGenerator> for IdState {
    fn from(ids: IdGenerator) -> Self {
        IdState {
            seed: ids.seed,
            issued: ids.issued,
        }
    }
}

/// An [`EntityStore`] held entirely in memory.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MemoryStore {
    entities: OrdMap<EntityId, Entity>,
    manifests: Vector<Manifest>,
    ids: IdGenerator,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(0)
    }
}

impl MemoryStore {
    /// Creates an empty store whose identifiers are drawn from `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            entities: OrdMap::new(),
            manifests: Vector::new(),
            ids: IdGenerator::new(seed),
        }
    }

    /// Returns the identifier seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.ids.seed
    }

    /// Inserts a record as-is, bypassing identifier issue.
    ///
    /// Used to load fixtures with known identifiers. Any existing record with
    /// the same identifier is replaced.
    pub fn insert(&mut self, entity: Entity) {
        self.entities.insert(entity.id, entity);
    }

    /// Iterates over every entity in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Finds an entity by exact name.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Vec<&Entity> {
        self.entities.values().filter(|e| e.name == name).collect()
    }
}

impl EntityStore for MemoryStore {
    fn get(&self, id: EntityId) -> Option<Entity> {
        self.entities.get(&id).cloned()
    }

    fn put(&mut self, id: EntityId, payload: Payload) -> Result<()> {
        let entity = self
            .entities
            .get_mut(&id)
            .ok_or_else(|| Error::entity_not_found(id))?;
        if entity.kind() != payload.kind() {
            return Err(Error::store_write(
                id,
                format!(
                    "payload of kind {} cannot replace a {}",
                    payload.kind(),
                    entity.kind()
                ),
            ));
        }
        entity.payload = payload;
        Ok(())
    }

    fn update(&mut self, entity: Entity) -> Result<()> {
        let slot = self
            .entities
            .get_mut(&entity.id)
            .ok_or_else(|| Error::entity_not_found(entity.id))?;
        *slot = entity;
        Ok(())
    }

    fn create(&mut self, draft: EntityDraft) -> Result<EntityId> {
        let mut id = self.ids.next_id()?;
        while self.entities.contains_key(&id) {
            id = self.ids.next_id()?;
        }
        self.entities.insert(id, draft.into_entity(id));
        Ok(id)
    }

    fn delete(&mut self, id: EntityId) -> Result<()> {
        self.entities
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| Error::entity_not_found(id))
    }

    fn query(&self, kind: EntityKind, predicate: &dyn Fn(&Entity) -> bool) -> Vec<Entity> {
        self.entities
            .values()
            .filter(|e| e.kind() == kind && predicate(e))
            .cloned()
            .collect()
    }

    fn record_manifest(&mut self, manifest: Manifest) -> Result<()> {
        self.manifests.retain(|m| m.label != manifest.label);
        self.manifests.push_back(manifest);
        Ok(())
    }

    fn manifests(&self) -> Vec<Manifest> {
        self.manifests.iter().cloned().collect()
    }

    fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    fn kind_of(&self, id: EntityId) -> Option<EntityKind> {
        self.entities.get(&id).map(Entity::kind)
    }

    fn len(&self) -> usize {
        self.entities.len()
    }
}
