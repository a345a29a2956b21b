//! kanri - core model for a personal work-tracking board
//!
//! A board owns projects and tasks, keyed by small board-local ids; each
//! entity also carries a uuid that survives merges between replicas. Tasks
//! move through a todo -> active -> paused -> complete lifecycle tracked by
//! timestamps, from which lead time, cycle time, and total time worked are
//! derived.
//!
//! This crate is the pure core: data types, state transitions, validation,
//! by-name lookup, scoring, and replica merge, plus a serde boundary
//! ([`Snapshot`]) for persistence layers built on top. There is no IO and
//! no global state; behavior that varies is passed in through [`Settings`].
//!
//! ```
//! use kanri::{Board, Settings, StatusAction, Task};
//!
//! let settings = Settings::default();
//! let mut board = Board::new("work");
//! let id = board
//!     .create_task(Task::new("Write the report"), &settings)
//!     .unwrap();
//! board
//!     .apply_status_action(id, StatusAction::Start, None, None)
//!     .unwrap();
//! assert_eq!(board.get_task(id).unwrap().status().to_string(), "active");
//! ```

pub mod domain;
pub mod error;
pub mod settings;
pub mod time;

pub use domain::{
    Board, Days, Id, Log, Meta, Progress, Project, Snapshot, StatusAction, Task, TaskScorer,
    TaskStatus, Value, BOARD_VERSION,
};
pub use error::{EntityKind, Error, Result};
pub use settings::{NameMatcher, Settings};
