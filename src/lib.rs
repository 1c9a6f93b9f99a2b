//! Codex Graph - relationship-graph consistency engine
//!
//! This crate re-exports all layers of the Codex Graph system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 4: codex_runtime     - REPL, CLI, store persistence
//! Layer 3: codex_transfer    - Export/import with identifier remapping
//! Layer 2: codex_engine      - Link maintenance, reconcile, cascade, nesting guard
//! Layer 1: codex_storage     - Entity records, relationship schema, store adapter
//! Layer 0: codex_foundation  - Core types (EntityId, EntityKind, Error)
//! ```

pub use codex_engine as engine;
pub use codex_foundation as foundation;
pub use codex_runtime as runtime;
pub use codex_storage as storage;
pub use codex_transfer as transfer;
