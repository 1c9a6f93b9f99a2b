//! Export and import of entity subgraphs between independent stores.
//!
//! Copying a connected set of entities into another store is done in two
//! passes. The first pass copies every entity under a fresh identifier and
//! records `old -> new` in an [`IdentifierMap`]. The second pass rewrites every
//! relationship field and every inline `@UUID[...]` token through the map.
//!
//! This crate provides:
//! - [`collect_subgraph`] - Closure traversal from a set of roots
//! - [`export_subgraph`] - Copy a subgraph out, optionally recording a manifest
//! - [`import_subgraph`] / [`import_manifest`] - Bring a subgraph back in under a [`MergePolicy`]
//! - [`IdentifierMap`] - The remapping table, composable and invertible
//! - [`InlineReferences`] - Inline reference token matching and rewriting

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod closure;
pub mod config;
pub mod export;
pub mod idmap;
pub mod import;
mod passes;
pub mod report;
pub mod text;

pub use closure::{Subgraph, collect_subgraph};
pub use config::{DanglingPolicy, MergePolicy, TransferConfig};
pub use export::export_subgraph;
pub use idmap::IdentifierMap;
pub use import::{import_manifest, import_subgraph};
pub use report::{RewriteStats, TransferReport};
pub use text::{InlineReferences, Rewritten};
