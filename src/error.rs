//! Error taxonomy for board operations
//!
//! Every mutating operation validates before committing, so any of these
//! errors leaves the board unmodified. Nothing is retried internally; the
//! caller decides whether to re-prompt or abort.

use std::fmt;

use thiserror::Error;
use uuid::Uuid;

use crate::domain::task::TaskStatus;
use crate::domain::Id;

/// Which kind of board entity an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Project,
    Task,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Project => write!(f, "project"),
            EntityKind::Task => write!(f, "task"),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum Error {
    #[error("{kind} with id {id} not found")]
    NotFound { kind: EntityKind, id: Id },

    #[error("duplicate {kind} uuid {uuid}")]
    DuplicateUuid { kind: EntityKind, uuid: Uuid },

    #[error("duplicate {kind} name '{name}'")]
    DuplicateName { kind: EntityKind, name: String },

    #[error("{kind} name '{name}' matches {count} entries with no clear winner")]
    AmbiguousName {
        kind: EntityKind,
        name: String,
        count: usize,
    },

    #[error("{kind} name '{name}' must contain at least one letter")]
    InvalidName { kind: EntityKind, name: String },

    #[error("{field} must be a non-negative number, got {value}")]
    InvalidScore { field: &'static str, value: f64 },

    #[error("cannot {action} task with status '{status}'")]
    TaskStatus {
        action: &'static str,
        status: TaskStatus,
    },

    #[error("inconsistent timestamps: {0}")]
    InconsistentTimestamp(String),

    #[error("cannot merge a version {theirs} board into a version {ours} board")]
    VersionMismatch { ours: u64, theirs: u64 },
}

pub type Result<T> = std::result::Result<T, Error>;
