//! Link maintenance, reconciliation, cascade cleanup, and nesting guard for Codex Graph.
//!
//! This crate provides:
//! - [`link`] / [`unlink`] - Pairwise mutation keeping both sides in sync
//! - [`reconcile`] - Turn a bulk edit into the minimal sequence of pairwise ops
//! - [`cascade_delete`] - Strip every reference to an entity before it goes
//! - [`can_add_member`] - Cycle and duplicate prevention for nested groups
//! - [`invariant_violations`] / [`repair`] - Whole-graph audit and repair
//! - [`Engine`] - Façade owning a store, its config, and the notification queue
//!
//! The free functions work directly on any [`EntityStore`](codex_storage::EntityStore).
//! [`Engine`] adds call scopes so consequence writes are never re-reconciled.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod cascade;
pub mod changes;
pub mod config;
pub mod engine;
pub mod invariants;
pub mod mutation;
pub mod nesting;
pub mod reconcile;
pub mod repair;
pub mod report;

pub use cascade::{CleanupReport, cascade_delete, strip_references};
pub use changes::{ChangeSet, GraphOp, ScopeId, UpdateNotice};
pub use config::EngineConfig;
pub use engine::{Engine, ProcessStats};
pub use invariants::{InvariantViolation, invariant_violations};
pub use mutation::{link, unlink};
pub use nesting::{can_add_member, can_add_member_to, expand_members};
pub use reconcile::{OpFailure, ReconcileOutcome, reconcile};
pub use repair::{RepairReport, repair};
pub use report::{KindTally, Tallies, WriteFailure, render_tallies};
