//! Domain models for the board core
//!
//! The board aggregate owns projects and tasks; tasks carry a progress
//! state machine derived from their work timestamps. Everything here is
//! pure data plus validation, with no IO.

pub mod board;
mod merge;
pub mod meta;
pub mod project;
pub mod score;
pub mod snapshot;
pub mod task;

/// Board-local entity id.
///
/// Ids are per-board and per-entity-kind, assigned as the lowest unused
/// value on creation, and may be remapped when boards merge. The uuid on
/// each entity is the stable cross-board identifier.
pub type Id = u64;

pub use board::{Board, BOARD_VERSION};
pub use meta::{Meta, Value};
pub use project::Project;
pub use score::{
    PriorityDifficultyScorer, PriorityRateScorer, PriorityScorer, TaskScorer, DEFAULT_SCORER,
};
pub use snapshot::Snapshot;
pub use task::{Days, Log, Progress, StatusAction, Task, TaskStatus};
