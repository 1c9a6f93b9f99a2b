//! Error types for the Codex Graph system.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.

use std::fmt;

use thiserror::Error;

use crate::entity::EntityId;
use crate::kind::EntityKind;

/// Result alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for Codex Graph operations.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Creates an entity not found error.
    #[must_use]
    pub fn entity_not_found(id: EntityId) -> Self {
        Self::new(ErrorKind::EntityNotFound(id))
    }

    /// Creates a field mismatch error for a field the entity's kind does not own.
    #[must_use]
    pub fn field_mismatch(entity: EntityId, kind: EntityKind, field: &'static str) -> Self {
        Self::new(ErrorKind::FieldMismatch {
            entity,
            kind,
            field,
        })
    }

    /// Creates a kind mismatch error for a target the field does not accept.
    #[must_use]
    pub fn kind_mismatch(entity: EntityId, field: &'static str, actual: EntityKind) -> Self {
        Self::new(ErrorKind::KindMismatch {
            entity,
            field,
            actual,
        })
    }

    /// Creates a dangling reference error.
    #[must_use]
    pub fn dangling(entity: EntityId, field: &'static str, missing: EntityId) -> Self {
        Self::new(ErrorKind::DanglingReference {
            entity,
            field,
            missing,
        })
    }

    /// Creates a store write failure.
    #[must_use]
    pub fn store_write(entity: EntityId, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::StoreWrite {
            entity,
            message: message.into(),
        })
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal(message.into()))
    }

    /// Returns the membership rejection carried by this error, if any.
    #[must_use]
    pub fn rejection(&self) -> Option<&MembershipRejection> {
        match &self.kind {
            ErrorKind::MembershipRejected(reason) => Some(reason),
            _ => None,
        }
    }
}

impl From<MembershipRejection> for Error {
    fn from(reason: MembershipRejection) -> Self {
        Self::new(ErrorKind::MembershipRejected(reason))
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// Entity was not found in the store.
    #[error("entity not found: {0}")]
    EntityNotFound(EntityId),

    /// Text could not be parsed as an entity identifier.
    #[error("invalid entity id: {0:?}")]
    InvalidId(String),

    /// The field is not declared on the entity's kind.
    #[error("{kind} {entity} has no field {field}")]
    FieldMismatch {
        /// The entity the field was requested on.
        entity: EntityId,
        /// The entity's actual kind.
        kind: EntityKind,
        /// Qualified name of the field.
        field: &'static str,
    },

    /// The target's kind is not accepted by the field.
    #[error("{field} cannot reference {actual} {entity}")]
    KindMismatch {
        /// The offending target.
        entity: EntityId,
        /// Qualified name of the field.
        field: &'static str,
        /// Kind of the offending target.
        actual: EntityKind,
    },

    /// An identifier in a relationship field resolves to nothing.
    #[error("dangling reference in {field} of {entity}: {missing} does not exist")]
    DanglingReference {
        /// The entity holding the reference.
        entity: EntityId,
        /// Qualified name of the field.
        field: &'static str,
        /// The identifier that failed to resolve.
        missing: EntityId,
    },

    /// A group refused a new member.
    #[error("{0}")]
    MembershipRejected(MembershipRejection),

    /// The store failed to persist a write.
    #[error("store write failed for {entity}: {message}")]
    StoreWrite {
        /// The entity whose write failed.
        entity: EntityId,
        /// Adapter supplied description.
        message: String,
    },

    /// An identifier could not be resolved in the source store of a transfer.
    #[error("cannot resolve {0} in source store")]
    ImportResolution(EntityId),

    /// No manifest with the given label exists.
    #[error("no manifest labelled {0:?}")]
    ManifestNotFound(String),

    /// Encoding or decoding failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Filesystem access failed.
    #[error("I/O error: {0}")]
    Io(String),

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Reason a group refused a candidate member.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MembershipRejection {
    /// A group cannot contain itself.
    #[error("group {group} cannot contain itself")]
    SelfMembership {
        /// The group.
        group: EntityId,
    },

    /// The candidate group already contains the group somewhere below it.
    #[error("adding {candidate} to group {group} would create a cycle: {}", render_path(.path))]
    Cycle {
        /// The group.
        group: EntityId,
        /// The candidate group.
        candidate: EntityId,
        /// Path from the candidate down to the revisited identifier.
        path: Vec<EntityId>,
    },

    /// The candidate is already a direct member.
    #[error("{candidate} is already a member of group {group}")]
    AlreadyMember {
        /// The group.
        group: EntityId,
        /// The candidate.
        candidate: EntityId,
    },

    /// The candidate is already reachable through a nested member group.
    #[error("{candidate} is already in group {group} through nested group {via}")]
    Duplicate {
        /// The group.
        group: EntityId,
        /// The candidate.
        candidate: EntityId,
        /// The attached member group that already contains the candidate.
        via: EntityId,
    },

    /// The group does not exist.
    #[error("group {0} does not exist")]
    UnknownGroup(EntityId),

    /// The target of the membership is not a group.
    #[error("{id} is a {kind}, not a group")]
    NotAGroup {
        /// The target.
        id: EntityId,
        /// Its actual kind.
        kind: EntityKind,
    },

    /// The candidate does not exist.
    #[error("candidate {0} does not exist")]
    UnknownCandidate(EntityId),
}

fn render_path(path: &[EntityId]) -> String {
    path.iter()
        .map(EntityId::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Name of the top-level operation.
    pub operation: Option<String>,
    /// Entities the operation was working on, outermost first.
    pub stack: Vec<String>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the operation name.
    #[must_use]
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    /// Adds a stack frame.
    #[must_use]
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.stack.push(frame.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(operation) = &self.operation {
            write!(f, "during {operation}")?;
        }
        if !self.stack.is_empty() {
            writeln!(f)?;
            for frame in &self.stack {
                writeln!(f, "  at {frame}")?;
            }
        }
        Ok(())
    }
}
