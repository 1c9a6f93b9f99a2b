//! Integration tests for Layer 2: Engine
//!
//! Tests for pairwise linking, reconciliation, cascade cleanup, the nesting
//! guard, and graph-wide properties.

mod cascade;
mod links;
mod nesting;
mod reconcile;

use codex_engine::{Engine, EngineConfig};
use codex_foundation::{EntityId, EntityKind};
use codex_storage::{EntityDraft, MemoryStore};

/// Creates an engine over an empty store.
pub fn engine() -> Engine<MemoryStore> {
    Engine::with_config(MemoryStore::new(42), EngineConfig::default())
}

/// Creates an entity through the engine.
pub fn spawn(engine: &mut Engine<MemoryStore>, kind: EntityKind, name: &str) -> EntityId {
    engine.create(EntityDraft::new(kind, name)).unwrap()
}
