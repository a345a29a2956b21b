//! Task domain model
//!
//! Tasks move through a lifecycle of todo -> active -> paused -> complete.
//! The lifecycle position is held in [`Progress`], a tagged union carrying
//! exactly the timestamps that are meaningful in each state, so invalid
//! combinations are unrepresentable in memory. On the wire a task is a flat
//! record of optional timestamps; loading one re-derives the state and
//! rejects inconsistent combinations instead of coercing them.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::meta::Meta;
use super::Id;
use crate::error::{Error, Result};
use crate::time;

/// Duration in days.
pub type Days = f64;

/// Status of a task, derived from its progress timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    Active,
    Paused,
    Complete,
}

impl TaskStatus {
    /// Returns true if this status represents completion
    pub fn is_complete(&self) -> bool {
        matches!(self, TaskStatus::Complete)
    }

    /// Display-layer grouping of statuses into board columns
    pub fn groups() -> &'static [(&'static str, &'static [TaskStatus])] {
        &[
            ("todo", &[TaskStatus::Todo]),
            ("active", &[TaskStatus::Active, TaskStatus::Paused]),
            ("complete", &[TaskStatus::Complete]),
        ]
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Todo => write!(f, "todo"),
            TaskStatus::Active => write!(f, "active"),
            TaskStatus::Paused => write!(f, "paused"),
            TaskStatus::Complete => write!(f, "complete"),
        }
    }
}

/// A lifecycle transition requested by a caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusAction {
    Start,
    Pause,
    Resume,
    Complete,
    Reset,
}

impl StatusAction {
    fn verb(&self) -> &'static str {
        match self {
            StatusAction::Start => "start",
            StatusAction::Pause => "pause",
            StatusAction::Resume => "resume",
            StatusAction::Complete => "complete",
            StatusAction::Reset => "reset",
        }
    }
}

/// A dated note attached to a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Log {
    /// When the log was recorded
    #[serde(with = "time::timestamp")]
    pub created_time: DateTime<Utc>,

    /// Textual content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    /// Progress rating on a 0-10 scale
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
}

impl Log {
    /// Creates a log with a note, dated now
    pub fn note(text: impl Into<String>) -> Self {
        Self {
            created_time: time::now(),
            note: Some(text.into()),
            rating: None,
        }
    }
}

/// Lifecycle position of a task
///
/// Each variant carries only the timestamps valid in that state:
/// `last_started`/`last_paused` are mutually exclusive by construction, a
/// paused task always has accumulated work, and a completion time cannot
/// exist without a first start.
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    Todo,
    Active {
        first_started: DateTime<Utc>,
        /// Unset on imported data; the first start stands in for it.
        last_started: Option<DateTime<Utc>>,
        prior_time_worked: Option<Days>,
    },
    Paused {
        first_started: DateTime<Utc>,
        last_paused: DateTime<Utc>,
        prior_time_worked: Days,
    },
    Complete {
        first_started: DateTime<Utc>,
        last_started: Option<DateTime<Utc>>,
        completed: DateTime<Utc>,
        prior_time_worked: Option<Days>,
    },
}

/// A task to be performed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTask", into = "RawTask")]
pub struct Task {
    /// Stable identifier; survives board merges, unlike the board-local id
    pub uuid: Uuid,

    /// Task name (must contain at least one letter)
    pub name: String,

    /// More detailed description
    pub description: Option<String>,

    /// Priority score (non-negative, unbounded)
    pub priority: Option<f64>,

    /// Estimated difficulty score (non-negative, unbounded)
    pub difficulty: Option<f64>,

    /// Expected number of days to complete the task
    pub expected_duration: Option<Days>,

    /// When the task is due
    pub due_time: Option<DateTime<Utc>>,

    /// Board-local id of the owning project
    pub project_id: Option<Id>,

    /// Tags associated with the task
    pub tags: BTreeSet<String>,

    /// Links associated with the task
    pub links: BTreeSet<String>,

    /// When the task was created
    pub created_time: DateTime<Utc>,

    /// When the task was last modified
    pub modified_time: DateTime<Utc>,

    /// Lifecycle position and its timestamps
    pub progress: Progress,

    /// Board-local ids of tasks blocking this one
    pub blocked_by: BTreeSet<Id>,

    /// Board-local id of the parent task
    pub parent: Option<Id>,

    /// Dated logs
    pub logs: Vec<Log>,

    /// Free-form notes
    pub notes: Vec<String>,

    /// Open-schema extra fields
    pub extra: Meta,
}

impl Task {
    /// Creates a new todo task with the given name
    pub fn new(name: impl Into<String>) -> Self {
        let now = time::now();
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            description: None,
            priority: None,
            difficulty: None,
            expected_duration: None,
            due_time: None,
            project_id: None,
            tags: BTreeSet::new(),
            links: BTreeSet::new(),
            created_time: now,
            modified_time: now,
            progress: Progress::Todo,
            blocked_by: BTreeSet::new(),
            parent: None,
            logs: Vec::new(),
            notes: Vec::new(),
            extra: Meta::new(),
        }
    }

    /// Sets the owning project, builder style
    pub fn with_project(mut self, project_id: Id) -> Self {
        self.project_id = Some(project_id);
        self
    }

    /// Sets the priority, builder style
    pub fn with_priority(mut self, priority: f64) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Sets the due time, builder style
    pub fn with_due_time(mut self, due: DateTime<Utc>) -> Self {
        self.due_time = Some(due);
        self
    }

    // ------------------------------------------------------------------
    // Derived state
    // ------------------------------------------------------------------

    /// Current status, a pure function of the progress timestamps
    pub fn status(&self) -> TaskStatus {
        match self.progress {
            Progress::Todo => TaskStatus::Todo,
            Progress::Active { .. } => TaskStatus::Active,
            Progress::Paused { .. } => TaskStatus::Paused,
            Progress::Complete { .. } => TaskStatus::Complete,
        }
    }

    /// When the task was first started
    pub fn first_started_time(&self) -> Option<DateTime<Utc>> {
        match self.progress {
            Progress::Todo => None,
            Progress::Active { first_started, .. }
            | Progress::Paused { first_started, .. }
            | Progress::Complete { first_started, .. } => Some(first_started),
        }
    }

    /// When the task was last started, if not paused
    pub fn last_started_time(&self) -> Option<DateTime<Utc>> {
        match self.progress {
            Progress::Active { last_started, .. } | Progress::Complete { last_started, .. } => {
                last_started
            }
            _ => None,
        }
    }

    /// When the task was last paused
    pub fn last_paused_time(&self) -> Option<DateTime<Utc>> {
        match self.progress {
            Progress::Paused { last_paused, .. } => Some(last_paused),
            _ => None,
        }
    }

    /// When the task was completed
    pub fn completed_time(&self) -> Option<DateTime<Utc>> {
        match self.progress {
            Progress::Complete { completed, .. } => Some(completed),
            _ => None,
        }
    }

    /// Time worked prior to the last start
    pub fn prior_time_worked(&self) -> Option<Days> {
        match self.progress {
            Progress::Todo => None,
            Progress::Active {
                prior_time_worked, ..
            }
            | Progress::Complete {
                prior_time_worked, ..
            } => prior_time_worked,
            Progress::Paused {
                prior_time_worked, ..
            } => Some(prior_time_worked),
        }
    }

    /// Total time (in days) worked on the task as of `now`
    ///
    /// The live clock only runs while the task is active; paused tasks
    /// report their accumulated total and completed tasks freeze at their
    /// completion time.
    pub fn total_time_worked(&self, now: DateTime<Utc>) -> Days {
        match self.progress {
            Progress::Todo => 0.0,
            Progress::Active {
                first_started,
                last_started,
                prior_time_worked,
            } => {
                let anchor = last_started.unwrap_or(first_started);
                prior_time_worked.unwrap_or(0.0) + time::days_between(anchor, now).max(0.0)
            }
            Progress::Paused {
                prior_time_worked, ..
            } => prior_time_worked,
            Progress::Complete {
                first_started,
                last_started,
                completed,
                prior_time_worked,
            } => {
                let anchor = last_started.unwrap_or(first_started);
                prior_time_worked.unwrap_or(0.0) + time::days_between(anchor, completed)
            }
        }
    }

    /// Elapsed days from creation to completion (complete tasks only)
    pub fn lead_time(&self) -> Option<Days> {
        match self.progress {
            Progress::Complete { completed, .. } => {
                Some(time::days_between(self.created_time, completed))
            }
            _ => None,
        }
    }

    /// Elapsed days from first start to completion (complete tasks only)
    pub fn cycle_time(&self) -> Option<Days> {
        match self.progress {
            Progress::Complete {
                first_started,
                completed,
                ..
            } => Some(time::days_between(first_started, completed)),
            _ => None,
        }
    }

    /// Returns true if the task was not (or will not be) completed by its
    /// due time
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        match self.due_time {
            Some(due) => self.completed_time().unwrap_or(now) > due,
            None => false,
        }
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    /// Starts a todo task at `dt`
    pub fn start(&self, dt: DateTime<Utc>) -> Result<Task> {
        match self.progress {
            Progress::Todo => {
                if dt < self.created_time {
                    return Err(Error::InconsistentTimestamp(format!(
                        "start time {} precedes creation time {}",
                        time::format_timestamp(dt),
                        time::format_timestamp(self.created_time)
                    )));
                }
                Ok(self.advanced(Progress::Active {
                    first_started: dt,
                    last_started: Some(dt),
                    prior_time_worked: None,
                }))
            }
            _ => Err(self.status_error(StatusAction::Start)),
        }
    }

    /// Completes an active task at `dt`
    pub fn complete(&self, dt: DateTime<Utc>) -> Result<Task> {
        match self.progress {
            Progress::Active {
                first_started,
                last_started,
                prior_time_worked,
            } => {
                let anchor = last_started.unwrap_or(first_started);
                if dt < anchor {
                    return Err(Error::InconsistentTimestamp(format!(
                        "completion time {} precedes last start time {}",
                        time::format_timestamp(dt),
                        time::format_timestamp(anchor)
                    )));
                }
                Ok(self.advanced(Progress::Complete {
                    first_started,
                    last_started,
                    completed: dt,
                    prior_time_worked,
                }))
            }
            _ => Err(self.status_error(StatusAction::Complete)),
        }
    }

    /// Pauses an active task at `dt`, folding elapsed time into the
    /// accumulated total
    pub fn pause(&self, dt: DateTime<Utc>) -> Result<Task> {
        match self.progress {
            Progress::Active {
                first_started,
                last_started,
                prior_time_worked,
            } => {
                let anchor = last_started.unwrap_or(first_started);
                if dt < anchor {
                    return Err(Error::InconsistentTimestamp(format!(
                        "pause time {} precedes last start time {}",
                        time::format_timestamp(dt),
                        time::format_timestamp(anchor)
                    )));
                }
                Ok(self.advanced(Progress::Paused {
                    first_started,
                    last_paused: dt,
                    prior_time_worked: prior_time_worked.unwrap_or(0.0)
                        + time::days_between(anchor, dt),
                }))
            }
            _ => Err(self.status_error(StatusAction::Pause)),
        }
    }

    /// Resumes a paused task, or reopens a completed one, at `dt`
    pub fn resume(&self, dt: DateTime<Utc>) -> Result<Task> {
        match self.progress {
            Progress::Paused {
                first_started,
                last_paused,
                prior_time_worked,
            } => {
                if dt < last_paused {
                    return Err(Error::InconsistentTimestamp(format!(
                        "resume time {} precedes pause time {}",
                        time::format_timestamp(dt),
                        time::format_timestamp(last_paused)
                    )));
                }
                Ok(self.advanced(Progress::Active {
                    first_started,
                    last_started: Some(dt),
                    prior_time_worked: Some(prior_time_worked),
                }))
            }
            Progress::Complete {
                first_started,
                last_started,
                completed,
                prior_time_worked,
            } => {
                if dt < completed {
                    return Err(Error::InconsistentTimestamp(format!(
                        "resume time {} precedes completion time {}",
                        time::format_timestamp(dt),
                        time::format_timestamp(completed)
                    )));
                }
                // Reopening folds the full worked total back into the
                // accumulated prior time.
                let anchor = last_started.unwrap_or(first_started);
                let prior_total =
                    prior_time_worked.unwrap_or(0.0) + time::days_between(anchor, completed);
                Ok(self.advanced(Progress::Active {
                    first_started,
                    last_started: Some(dt),
                    prior_time_worked: Some(prior_total),
                }))
            }
            _ => Err(self.status_error(StatusAction::Resume)),
        }
    }

    /// Returns the task to todo from any state, clearing all progress
    /// timestamps, accumulated work, blockers, parent, and logs while
    /// preserving identity, name, and creation metadata.
    ///
    /// Idempotent: resetting an already-clean todo task returns an equal
    /// value.
    pub fn reset(&self) -> Task {
        let already_clean = matches!(self.progress, Progress::Todo)
            && self.blocked_by.is_empty()
            && self.parent.is_none()
            && self.logs.is_empty();
        if already_clean {
            return self.clone();
        }
        let mut task = self.clone();
        task.progress = Progress::Todo;
        task.blocked_by.clear();
        task.parent = None;
        task.logs.clear();
        task.modified_time = time::now();
        task
    }

    /// Applies a status action, chaining two transitions where the current
    /// state requires it
    ///
    /// `dt` defaults to now and `first_dt` to `dt`. Completing a todo task
    /// performs start(`first_dt`) then complete(`dt`); completing a paused
    /// task performs resume(`first_dt`) then complete(`dt`); starting a
    /// paused or completed task resumes it.
    pub fn apply(
        &self,
        action: StatusAction,
        dt: Option<DateTime<Utc>>,
        first_dt: Option<DateTime<Utc>>,
    ) -> Result<Task> {
        let dt = dt.unwrap_or_else(time::now);
        let first_dt = first_dt.unwrap_or(dt);
        match (action, self.status()) {
            (StatusAction::Start, TaskStatus::Todo) => self.start(dt),
            (StatusAction::Start, TaskStatus::Paused | TaskStatus::Complete) => self.resume(dt),
            (StatusAction::Pause, TaskStatus::Active) => self.pause(dt),
            (StatusAction::Pause, TaskStatus::Todo) => self.start(first_dt)?.pause(dt),
            (StatusAction::Pause, TaskStatus::Complete) => self.resume(first_dt)?.pause(dt),
            (StatusAction::Resume, TaskStatus::Paused | TaskStatus::Complete) => self.resume(dt),
            (StatusAction::Complete, TaskStatus::Active) => self.complete(dt),
            (StatusAction::Complete, TaskStatus::Todo) => self.start(first_dt)?.complete(dt),
            (StatusAction::Complete, TaskStatus::Paused) => self.resume(first_dt)?.complete(dt),
            (StatusAction::Reset, _) => Ok(self.reset()),
            (action, _) => Err(self.status_error(action)),
        }
    }

    /// Re-checks the cross-field timestamp constraints. Needed after field
    /// updates that can move `created_time` or rebuild `progress` by hand.
    pub fn validate(&self) -> Result<()> {
        check_consistent_times(
            self.created_time,
            self.first_started_time(),
            self.last_started_time(),
            self.last_paused_time(),
            self.completed_time(),
            self.prior_time_worked(),
        )
    }

    fn advanced(&self, progress: Progress) -> Task {
        let mut task = self.clone();
        task.progress = progress;
        task.modified_time = time::now();
        task
    }

    fn status_error(&self, action: StatusAction) -> Error {
        Error::TaskStatus {
            action: action.verb(),
            status: self.status(),
        }
    }
}

/// Derives a status from raw optional timestamps. These rules are the
/// source of truth for what [`Progress`] encodes structurally.
pub fn derive_status(
    first_started: Option<DateTime<Utc>>,
    last_paused: Option<DateTime<Utc>>,
    completed: Option<DateTime<Utc>>,
) -> TaskStatus {
    if first_started.is_none() {
        TaskStatus::Todo
    } else if last_paused.is_some() {
        TaskStatus::Paused
    } else if completed.is_some() {
        TaskStatus::Complete
    } else {
        TaskStatus::Active
    }
}

fn check_consistent_times(
    created: DateTime<Utc>,
    first_started: Option<DateTime<Utc>>,
    last_started: Option<DateTime<Utc>>,
    last_paused: Option<DateTime<Utc>>,
    completed: Option<DateTime<Utc>>,
    prior_time_worked: Option<Days>,
) -> Result<()> {
    let fail = |msg: &str| Err(Error::InconsistentTimestamp(msg.to_string()));

    let Some(first) = first_started else {
        if last_started.is_some() || last_paused.is_some() || completed.is_some() {
            return fail("progress timestamps require first_started_time");
        }
        if prior_time_worked.is_some() {
            return fail("prior_time_worked requires first_started_time");
        }
        return Ok(());
    };

    if first < created {
        return fail("first_started_time precedes created_time");
    }
    if let Some(last) = last_started {
        if last_paused.is_some() {
            return fail("last_started_time and last_paused_time are mutually exclusive");
        }
        if last < first {
            return fail("last_started_time precedes first_started_time");
        }
    }
    if let Some(paused) = last_paused {
        if paused < first {
            return fail("last_paused_time precedes first_started_time");
        }
        if completed.is_some() {
            return fail("last_paused_time and completed_time are mutually exclusive");
        }
        if prior_time_worked.is_none() {
            return fail("paused task requires prior_time_worked");
        }
    }
    if let Some(done) = completed {
        if done < first {
            return fail("completed_time precedes first_started_time");
        }
        if let Some(last) = last_started {
            if done < last {
                return fail("completed_time precedes last_started_time");
            }
        }
    }
    Ok(())
}

/// Flat wire form of a task, as stored in snapshots
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawTask {
    uuid: Uuid,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    priority: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    difficulty: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expected_duration: Option<Days>,
    #[serde(
        with = "time::timestamp_opt",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    due_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    project_id: Option<Id>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    tags: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    links: BTreeSet<String>,
    #[serde(with = "time::timestamp")]
    created_time: DateTime<Utc>,
    #[serde(with = "time::timestamp")]
    modified_time: DateTime<Utc>,
    #[serde(
        with = "time::timestamp_opt",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    first_started_time: Option<DateTime<Utc>>,
    #[serde(
        with = "time::timestamp_opt",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    last_started_time: Option<DateTime<Utc>>,
    #[serde(
        with = "time::timestamp_opt",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    last_paused_time: Option<DateTime<Utc>>,
    #[serde(
        with = "time::timestamp_opt",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    completed_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    prior_time_worked: Option<Days>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    blocked_by: BTreeSet<Id>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parent: Option<Id>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    logs: Vec<Log>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    notes: Vec<String>,
    #[serde(default, skip_serializing_if = "Meta::is_empty")]
    extra: Meta,
}

impl TryFrom<RawTask> for Task {
    type Error = Error;

    fn try_from(raw: RawTask) -> Result<Task> {
        check_consistent_times(
            raw.created_time,
            raw.first_started_time,
            raw.last_started_time,
            raw.last_paused_time,
            raw.completed_time,
            raw.prior_time_worked,
        )?;

        let progress = match raw.first_started_time {
            None => Progress::Todo,
            Some(first_started) => {
                if let Some(last_paused) = raw.last_paused_time {
                    Progress::Paused {
                        first_started,
                        last_paused,
                        // presence checked above
                        prior_time_worked: raw.prior_time_worked.unwrap_or(0.0),
                    }
                } else if let Some(completed) = raw.completed_time {
                    Progress::Complete {
                        first_started,
                        last_started: raw.last_started_time,
                        completed,
                        prior_time_worked: raw.prior_time_worked,
                    }
                } else {
                    Progress::Active {
                        first_started,
                        last_started: raw.last_started_time,
                        prior_time_worked: raw.prior_time_worked,
                    }
                }
            }
        };

        Ok(Task {
            uuid: raw.uuid,
            name: raw.name,
            description: raw.description,
            priority: raw.priority,
            difficulty: raw.difficulty,
            expected_duration: raw.expected_duration,
            due_time: raw.due_time,
            project_id: raw.project_id,
            tags: raw.tags,
            links: raw.links,
            created_time: raw.created_time,
            modified_time: raw.modified_time,
            progress,
            blocked_by: raw.blocked_by,
            parent: raw.parent,
            logs: raw.logs,
            notes: raw.notes,
            extra: raw.extra,
        })
    }
}

impl From<Task> for RawTask {
    fn from(task: Task) -> RawTask {
        RawTask {
            first_started_time: task.first_started_time(),
            last_started_time: task.last_started_time(),
            last_paused_time: task.last_paused_time(),
            completed_time: task.completed_time(),
            prior_time_worked: task.prior_time_worked(),
            uuid: task.uuid,
            name: task.name,
            description: task.description,
            priority: task.priority,
            difficulty: task.difficulty,
            expected_duration: task.expected_duration,
            due_time: task.due_time,
            project_id: task.project_id,
            tags: task.tags,
            links: task.links,
            created_time: task.created_time,
            modified_time: task.modified_time,
            blocked_by: task.blocked_by,
            parent: task.parent,
            logs: task.logs,
            notes: task.notes,
            extra: task.extra,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap()
    }

    fn task_created_at(dt: DateTime<Utc>) -> Task {
        let mut task = Task::new("Write report");
        task.created_time = dt;
        task.modified_time = dt;
        task
    }

    #[test]
    fn new_task_is_todo() {
        let task = Task::new("Write report");
        assert_eq!(task.status(), TaskStatus::Todo);
        assert!(task.first_started_time().is_none());
        assert_eq!(task.total_time_worked(time::now()), 0.0);
    }

    #[test]
    fn start_before_creation_is_inconsistent() {
        let task = task_created_at(at(10, 0));
        let err = task.start(at(9, 0)).unwrap_err();
        assert!(matches!(err, Error::InconsistentTimestamp(_)));
    }

    #[test]
    fn start_sets_both_start_times() {
        let task = task_created_at(at(1, 0)).start(at(2, 0)).unwrap();
        assert_eq!(task.status(), TaskStatus::Active);
        assert_eq!(task.first_started_time(), Some(at(2, 0)));
        assert_eq!(task.last_started_time(), Some(at(2, 0)));
    }

    #[test]
    fn full_lifecycle_accumulates_time() {
        let task = task_created_at(at(1, 0));
        let task = task.start(at(1, 0)).unwrap();
        let task = task.pause(at(1, 12)).unwrap();
        assert_eq!(task.status(), TaskStatus::Paused);
        assert_eq!(task.prior_time_worked(), Some(0.5));
        assert_eq!(task.total_time_worked(at(5, 0)), 0.5);

        let task = task.resume(at(2, 0)).unwrap();
        assert_eq!(task.status(), TaskStatus::Active);
        assert_eq!(task.last_paused_time(), None);
        assert_eq!(task.last_started_time(), Some(at(2, 0)));

        let task = task.complete(at(2, 12)).unwrap();
        assert_eq!(task.status(), TaskStatus::Complete);
        assert_eq!(task.completed_time(), Some(at(2, 12)));
        assert_eq!(task.total_time_worked(at(9, 0)), 1.0);
        assert!(task.completed_time().unwrap() >= task.first_started_time().unwrap());
    }

    #[test]
    fn pause_before_last_start_is_inconsistent() {
        let task = task_created_at(at(1, 0)).start(at(2, 0)).unwrap();
        assert!(matches!(
            task.pause(at(1, 12)),
            Err(Error::InconsistentTimestamp(_))
        ));
    }

    #[test]
    fn complete_before_last_start_is_inconsistent() {
        let task = task_created_at(at(1, 0)).start(at(2, 0)).unwrap();
        assert!(matches!(
            task.complete(at(1, 12)),
            Err(Error::InconsistentTimestamp(_))
        ));
    }

    #[test]
    fn resume_before_pause_is_inconsistent() {
        let task = task_created_at(at(1, 0))
            .start(at(1, 0))
            .unwrap()
            .pause(at(2, 0))
            .unwrap();
        assert!(matches!(
            task.resume(at(1, 12)),
            Err(Error::InconsistentTimestamp(_))
        ));
    }

    #[test]
    fn invalid_transitions_are_status_errors() {
        let todo = task_created_at(at(1, 0));
        assert!(matches!(
            todo.pause(at(2, 0)),
            Err(Error::TaskStatus {
                action: "pause",
                ..
            })
        ));
        assert!(matches!(
            todo.complete(at(2, 0)),
            Err(Error::TaskStatus { .. })
        ));
        assert!(matches!(
            todo.resume(at(2, 0)),
            Err(Error::TaskStatus { .. })
        ));

        let active = todo.start(at(2, 0)).unwrap();
        assert!(matches!(
            active.start(at(3, 0)),
            Err(Error::TaskStatus {
                action: "start",
                ..
            })
        ));
    }

    #[test]
    fn reopen_restores_prior_total() {
        let task = task_created_at(at(1, 0))
            .start(at(1, 0))
            .unwrap()
            .complete(at(2, 0))
            .unwrap();

        let reopened = task.resume(at(3, 0)).unwrap();
        assert_eq!(reopened.status(), TaskStatus::Active);
        assert_eq!(reopened.completed_time(), None);
        assert_eq!(reopened.prior_time_worked(), Some(1.0));
        assert_eq!(reopened.last_started_time(), Some(at(3, 0)));
    }

    #[test]
    fn reopen_before_completion_is_inconsistent() {
        let task = task_created_at(at(1, 0))
            .start(at(1, 0))
            .unwrap()
            .complete(at(2, 0))
            .unwrap();
        assert!(matches!(
            task.resume(at(1, 12)),
            Err(Error::InconsistentTimestamp(_))
        ));
    }

    #[test]
    fn reset_clears_progress_and_is_idempotent() {
        let mut task = task_created_at(at(1, 0));
        task.blocked_by.insert(7);
        task.parent = Some(3);
        task.logs.push(Log::note("halfway"));
        let task = task.start(at(1, 0)).unwrap().pause(at(2, 0)).unwrap();

        let reset = task.reset();
        assert_eq!(reset.status(), TaskStatus::Todo);
        assert!(reset.blocked_by.is_empty());
        assert!(reset.parent.is_none());
        assert!(reset.logs.is_empty());
        assert_eq!(reset.name, task.name);
        assert_eq!(reset.uuid, task.uuid);
        assert_eq!(reset.created_time, task.created_time);

        // A second reset is a no-op by value.
        assert_eq!(reset.reset(), reset);
    }

    #[test]
    fn reset_on_clean_todo_returns_equal_value() {
        let task = task_created_at(at(1, 0));
        assert_eq!(task.reset(), task);
    }

    #[test]
    fn apply_complete_on_todo_chains_start() {
        let task = task_created_at(at(1, 0));
        let done = task
            .apply(StatusAction::Complete, Some(at(5, 0)), Some(at(2, 0)))
            .unwrap();
        assert_eq!(done.status(), TaskStatus::Complete);
        assert_eq!(done.first_started_time(), Some(at(2, 0)));
        assert_eq!(done.completed_time(), Some(at(5, 0)));
    }

    #[test]
    fn apply_complete_on_paused_chains_resume() {
        let task = task_created_at(at(1, 0))
            .start(at(1, 0))
            .unwrap()
            .pause(at(2, 0))
            .unwrap();
        let done = task
            .apply(StatusAction::Complete, Some(at(4, 0)), Some(at(3, 0)))
            .unwrap();
        assert_eq!(done.status(), TaskStatus::Complete);
        assert_eq!(done.last_started_time(), Some(at(3, 0)));
        assert_eq!(done.completed_time(), Some(at(4, 0)));
        assert_eq!(done.total_time_worked(at(9, 0)), 2.0);
    }

    #[test]
    fn apply_start_on_paused_resumes() {
        let task = task_created_at(at(1, 0))
            .start(at(1, 0))
            .unwrap()
            .pause(at(2, 0))
            .unwrap();
        let resumed = task
            .apply(StatusAction::Start, Some(at(3, 0)), None)
            .unwrap();
        assert_eq!(resumed.status(), TaskStatus::Active);
    }

    #[test]
    fn apply_first_dt_defaults_to_dt() {
        let task = task_created_at(at(1, 0));
        let done = task
            .apply(StatusAction::Complete, Some(at(2, 0)), None)
            .unwrap();
        assert_eq!(done.first_started_time(), Some(at(2, 0)));
        assert_eq!(done.completed_time(), Some(at(2, 0)));
    }

    #[test]
    fn lead_and_cycle_time() {
        let task = task_created_at(at(1, 0))
            .start(at(2, 0))
            .unwrap()
            .complete(at(4, 0))
            .unwrap();
        assert_eq!(task.lead_time(), Some(3.0));
        assert_eq!(task.cycle_time(), Some(2.0));

        let open = task_created_at(at(1, 0));
        assert_eq!(open.lead_time(), None);
        assert_eq!(open.cycle_time(), None);
    }

    #[test]
    fn overdue_uses_completion_or_now() {
        let task = task_created_at(at(1, 0)).with_due_time(at(3, 0));
        assert!(!task.is_overdue(at(2, 0)));
        assert!(task.is_overdue(at(4, 0)));

        let on_time = task.start(at(1, 0)).unwrap().complete(at(2, 0)).unwrap();
        assert!(!on_time.is_overdue(at(9, 0)));

        let no_due = task_created_at(at(1, 0));
        assert!(!no_due.is_overdue(at(9, 0)));
    }

    #[test]
    fn serde_roundtrip_preserves_progress() {
        let task = task_created_at(at(1, 0))
            .start(at(1, 0))
            .unwrap()
            .pause(at(2, 0))
            .unwrap();

        let json = serde_json::to_string(&task).unwrap();
        let parsed: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, task);
        assert_eq!(parsed.status(), TaskStatus::Paused);
    }

    #[test]
    fn wire_form_is_flat_timestamps() {
        let task = task_created_at(at(1, 0))
            .start(at(1, 0))
            .unwrap()
            .pause(at(2, 0))
            .unwrap();
        let json = serde_json::to_value(&task).unwrap();

        assert_eq!(json["first_started_time"], "2024-01-01T00:00:00Z+0000");
        assert_eq!(json["last_paused_time"], "2024-01-02T00:00:00Z+0000");
        assert_eq!(json["prior_time_worked"], 1.0);
        assert!(json.get("last_started_time").is_none());
        assert!(json.get("completed_time").is_none());
    }

    #[test]
    fn deserialize_rejects_inconsistent_timestamps() {
        let base = serde_json::json!({
            "uuid": "8c7c7700-3c3a-4af6-a670-2225f5b0a4a8",
            "name": "Broken",
            "created_time": "2024-01-05T00:00:00Z+0000",
            "modified_time": "2024-01-05T00:00:00Z+0000",
        });

        // first start before creation
        let mut bad = base.clone();
        bad["first_started_time"] = "2024-01-01T00:00:00Z+0000".into();
        assert!(serde_json::from_value::<Task>(bad).is_err());

        // paused without prior time worked
        let mut bad = base.clone();
        bad["first_started_time"] = "2024-01-06T00:00:00Z+0000".into();
        bad["last_paused_time"] = "2024-01-07T00:00:00Z+0000".into();
        assert!(serde_json::from_value::<Task>(bad).is_err());

        // last started and last paused together
        let mut bad = base.clone();
        bad["first_started_time"] = "2024-01-06T00:00:00Z+0000".into();
        bad["last_started_time"] = "2024-01-06T00:00:00Z+0000".into();
        bad["last_paused_time"] = "2024-01-07T00:00:00Z+0000".into();
        bad["prior_time_worked"] = 0.5.into();
        assert!(serde_json::from_value::<Task>(bad).is_err());

        // completion without any start
        let mut bad = base.clone();
        bad["completed_time"] = "2024-01-07T00:00:00Z+0000".into();
        assert!(serde_json::from_value::<Task>(bad).is_err());

        // completion before last start
        let mut bad = base;
        bad["first_started_time"] = "2024-01-06T00:00:00Z+0000".into();
        bad["last_started_time"] = "2024-01-08T00:00:00Z+0000".into();
        bad["completed_time"] = "2024-01-07T00:00:00Z+0000".into();
        assert!(serde_json::from_value::<Task>(bad).is_err());
    }

    #[test]
    fn active_without_last_started_uses_first_start() {
        let json = serde_json::json!({
            "uuid": "8c7c7700-3c3a-4af6-a670-2225f5b0a4a8",
            "name": "Imported",
            "created_time": "2024-01-01T00:00:00Z+0000",
            "modified_time": "2024-01-01T00:00:00Z+0000",
            "first_started_time": "2024-01-02T00:00:00Z+0000",
        });
        let task: Task = serde_json::from_value(json).unwrap();
        assert_eq!(task.status(), TaskStatus::Active);
        assert_eq!(task.last_started_time(), None);
        assert_eq!(task.total_time_worked(at(3, 0)), 1.0);

        // Completing anchors on the first start.
        let done = task.complete(at(4, 0)).unwrap();
        assert_eq!(done.total_time_worked(at(9, 0)), 2.0);
    }

    #[test]
    fn status_group_columns() {
        let groups = TaskStatus::groups();
        assert_eq!(groups.len(), 3);
        assert!(groups[1].1.contains(&TaskStatus::Paused));
    }

    proptest! {
        /// Any raw timestamp combination either fails validation or loads
        /// into a task whose status matches the derivation rules.
        #[test]
        fn status_matches_derivation_for_all_loadable_combinations(
            first in proptest::option::of(0i64..100),
            last_started in proptest::option::of(0i64..100),
            last_paused in proptest::option::of(0i64..100),
            completed in proptest::option::of(0i64..100),
            prior in proptest::option::of(0.0f64..10.0),
        ) {
            let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
            let dt = |offset: i64| base + chrono::Duration::hours(offset);

            let mut json = serde_json::json!({
                "uuid": "8c7c7700-3c3a-4af6-a670-2225f5b0a4a8",
                "name": "Prop",
                "created_time": time::format_timestamp(base),
                "modified_time": time::format_timestamp(base),
            });
            if let Some(h) = first {
                json["first_started_time"] = time::format_timestamp(dt(h)).into();
            }
            if let Some(h) = last_started {
                json["last_started_time"] = time::format_timestamp(dt(h)).into();
            }
            if let Some(h) = last_paused {
                json["last_paused_time"] = time::format_timestamp(dt(h)).into();
            }
            if let Some(h) = completed {
                json["completed_time"] = time::format_timestamp(dt(h)).into();
            }
            if let Some(p) = prior {
                json["prior_time_worked"] = p.into();
            }

            if let Ok(task) = serde_json::from_value::<Task>(json) {
                let expected = derive_status(
                    first.map(dt),
                    last_paused.map(dt),
                    completed.map(dt),
                );
                prop_assert_eq!(task.status(), expected);
                prop_assert!(task.total_time_worked(dt(200)) >= 0.0);
            }
        }
    }
}
