//! Entity records, relationship schema, and store adapters for Codex Graph.
//!
//! This crate provides:
//! - [`RelationField`] - The static relationship schema
//! - [`Entity`] and [`Payload`] - Statically typed entity records
//! - [`EntityStore`] - The store adapter contract
//! - [`MemoryStore`] - Persistent in-memory store with O(1) snapshots
//! - [`Manifest`] - Record of an export batch

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod entity;
pub mod manifest;
pub mod memory;
pub mod schema;
pub mod store;

pub use entity::{
    Entity, EntityDraft, GroupLinks, InventoryEntry, LocationLinks, NpcLinks, Payload,
    RegionLinks, ShopLinks,
};
pub use manifest::Manifest;
pub use memory::MemoryStore;
pub use schema::{Arity, Cardinality, FieldSpec, OnDelete, RelationField, SCHEMA};
pub use store::EntityStore;
