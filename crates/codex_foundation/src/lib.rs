//! Core identifiers, entity kinds, and error types for Codex Graph.
//!
//! This crate provides:
//! - [`EntityId`] - Stable global entity identifiers
//! - [`EntityKind`] - The five kinds of campaign entity
//! - [`Error`] - Rich error types with context
//! - [`MembershipRejection`] - Why a group refused a new member

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod entity;
pub mod error;
pub mod kind;

pub use entity::{EntityId, ID_LEN};
pub use error::{Error, ErrorContext, ErrorKind, MembershipRejection, Result};
pub use kind::EntityKind;
