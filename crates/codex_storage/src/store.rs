//! The store adapter contract.

use codex_foundation::{EntityId, EntityKind, Result};

use crate::entity::{Entity, EntityDraft, Payload};
use crate::manifest::Manifest;

/// Durable key-to-record storage addressed by [`EntityId`].
///
/// The engine reads and writes only through this trait, so any backend that
/// can do CRUD by identifier and a full scan by kind will do. Reads return
/// owned snapshots; writing one never changes another already handed out.
pub trait EntityStore {
    /// Reads an entity.
    fn get(&self, id: EntityId) -> Option<Entity>;

    /// Replaces an entity's relationship payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity does not exist, the payload belongs to
    /// another kind, or the backend fails to persist the write.
    fn put(&mut self, id: EntityId, payload: Payload) -> Result<()>;

    /// Replaces a whole entity record, keeping its identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity does not exist or the backend fails to
    /// persist the write.
    fn update(&mut self, entity: Entity) -> Result<()>;

    /// Creates an entity and returns its freshly issued identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to persist the write.
    fn create(&mut self, draft: EntityDraft) -> Result<EntityId>;

    /// Deletes an entity.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity does not exist or the backend fails.
    fn delete(&mut self, id: EntityId) -> Result<()>;

    /// Returns every entity of `kind` accepted by `predicate`, in identifier order.
    fn query(&self, kind: EntityKind, predicate: &dyn Fn(&Entity) -> bool) -> Vec<Entity>;

    /// Records an export batch manifest, replacing any with the same label.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to persist the write.
    fn record_manifest(&mut self, manifest: Manifest) -> Result<()>;

    /// Returns every recorded manifest.
    fn manifests(&self) -> Vec<Manifest>;

    /// Returns true if the entity exists.
    fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    /// Returns the kind of an existing entity.
    fn kind_of(&self, id: EntityId) -> Option<EntityKind> {
        self.get(id).map(|e| e.kind())
    }

    /// Returns every entity, grouped by kind.
    fn all(&self) -> Vec<Entity> {
        EntityKind::ALL
            .into_iter()
            .flat_map(|kind| self.query(kind, &|_| true))
            .collect()
    }

    /// Returns the number of entities.
    fn len(&self) -> usize {
        self.all().len()
    }

    /// Returns true if the store holds no entities.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Finds the manifest recorded under `label`.
    fn manifest(&self, label: &str) -> Option<Manifest> {
        self.manifests().into_iter().find(|m| m.label == label)
    }

    /// Finds entities of `kind` whose correlation key is `key`.
    fn find_correlated(&self, kind: EntityKind, key: EntityId) -> Vec<Entity> {
        self.query(kind, &|e| e.correlation_key() == key)
    }
}
