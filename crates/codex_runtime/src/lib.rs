//! REPL, CLI, and store files for Codex Graph.
//!
//! This crate provides:
//! - [`Repl`] - Interactive command loop over a live store and an archive
//! - [`Command`] - The line command language
//! - Store file saving and loading in `MessagePack`

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod command;
pub mod editor;
pub mod repl;
pub mod serialize;
pub mod session;

pub use command::{Command, CommandError, MemberAction, parse_command};
pub use editor::{LineEditor, ReadResult, RustylineEditor};
pub use repl::Repl;
pub use session::Session;
