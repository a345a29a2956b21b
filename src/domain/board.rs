//! Board aggregate
//!
//! The board owns all projects and tasks for one workspace, keyed by
//! board-local integer ids. It enforces uniqueness and referential
//! invariants on every mutation: a failed call leaves the board exactly as
//! it was. Entities are immutable values, so updates substitute a fresh
//! copy with a refreshed `modified_time` rather than mutating in place.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::project::Project;
use super::snapshot::Snapshot;
use super::task::{StatusAction, Task};
use super::Id;
use crate::error::{EntityKind, Error, Result};
use crate::settings::{valid_name, Settings};
use crate::time;

/// Current board schema version.
pub const BOARD_VERSION: u64 = 0;

/// A board of projects and tasks
///
/// Serializes through [`Snapshot`], the flat wire form consumed by
/// persistence and import/export layers; loading a snapshot revalidates
/// entities and rebuilds the uuid indices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Snapshot", into = "Snapshot")]
pub struct Board {
    /// Board name
    pub name: String,

    /// Optional description
    pub description: Option<String>,

    /// When the board was created
    pub created_time: DateTime<Utc>,

    pub(crate) projects: BTreeMap<Id, Project>,
    pub(crate) tasks: BTreeMap<Id, Task>,
    pub(crate) version: u64,

    // Derived indices, rebuilt on load and kept in sync by create/delete.
    pub(crate) project_uuids: HashMap<Uuid, Id>,
    pub(crate) task_uuids: HashMap<Uuid, Id>,
}

impl Board {
    /// Creates an empty board with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            created_time: time::now(),
            projects: BTreeMap::new(),
            tasks: BTreeMap::new(),
            version: BOARD_VERSION,
            project_uuids: HashMap::new(),
            task_uuids: HashMap::new(),
        }
    }

    /// Sets the description, builder style
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Schema version of this board
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Iterates over all projects with their ids
    pub fn projects(&self) -> impl Iterator<Item = (Id, &Project)> {
        self.projects.iter().map(|(id, p)| (*id, p))
    }

    /// Iterates over all tasks with their ids
    pub fn tasks(&self) -> impl Iterator<Item = (Id, &Task)> {
        self.tasks.iter().map(|(id, t)| (*id, t))
    }

    /// Number of projects on the board
    pub fn num_projects(&self) -> usize {
        self.projects.len()
    }

    /// Number of tasks on the board
    pub fn num_tasks(&self) -> usize {
        self.tasks.len()
    }

    // ------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------

    /// Gets a project by id
    pub fn get_project(&self, id: Id) -> Result<&Project> {
        self.projects.get(&id).ok_or(Error::NotFound {
            kind: EntityKind::Project,
            id,
        })
    }

    /// Gets a task by id
    pub fn get_task(&self, id: Id) -> Result<&Task> {
        self.tasks.get(&id).ok_or(Error::NotFound {
            kind: EntityKind::Task,
            id,
        })
    }

    /// Resolves a project id by name under the active matcher
    ///
    /// An exact match always outranks a fuzzy one. Multiple residual
    /// matches with no single winner raise an ambiguity error; no match
    /// returns `None`.
    pub fn get_project_id_by_name(&self, name: &str, settings: &Settings) -> Result<Option<Id>> {
        resolve_name(
            self.projects.iter().map(|(id, p)| (*id, p.name.as_str(), true)),
            name,
            settings,
            EntityKind::Project,
        )
    }

    /// Resolves a task id by name under the active matcher
    ///
    /// Same ranking as projects, with one addition: an incomplete match
    /// outranks a complete-only match, so finished tasks can share a name
    /// with a live one without shadowing it.
    pub fn get_task_id_by_name(&self, name: &str, settings: &Settings) -> Result<Option<Id>> {
        resolve_name(
            self.tasks
                .iter()
                .map(|(id, t)| (*id, t.name.as_str(), !t.status().is_complete())),
            name,
            settings,
            EntityKind::Task,
        )
    }

    // ------------------------------------------------------------------
    // Create / update / delete
    // ------------------------------------------------------------------

    /// Adds a new project and returns its id (the smallest unused one)
    pub fn create_project(&mut self, project: Project, settings: &Settings) -> Result<Id> {
        if self.project_uuids.contains_key(&project.uuid) {
            return Err(Error::DuplicateUuid {
                kind: EntityKind::Project,
                uuid: project.uuid,
            });
        }
        self.validate_project(&project, None, settings)?;

        let id = lowest_unused_id(&self.projects);
        self.project_uuids.insert(project.uuid, id);
        self.projects.insert(id, project);
        Ok(id)
    }

    /// Adds a new task and returns its id (the smallest unused one)
    pub fn create_task(&mut self, task: Task, settings: &Settings) -> Result<Id> {
        if self.task_uuids.contains_key(&task.uuid) {
            return Err(Error::DuplicateUuid {
                kind: EntityKind::Task,
                uuid: task.uuid,
            });
        }
        self.validate_task(&task, None, settings)?;

        let id = lowest_unused_id(&self.tasks);
        self.task_uuids.insert(task.uuid, id);
        self.tasks.insert(id, task);
        Ok(id)
    }

    /// Updates a project through a closure over a copy of its current value
    ///
    /// The replacement gets a fresh `modified_time` and is revalidated
    /// before committing; identity fields (uuid, created_time) are
    /// preserved from the original.
    pub fn update_project<F>(&mut self, id: Id, settings: &Settings, f: F) -> Result<()>
    where
        F: FnOnce(&mut Project),
    {
        let original = self.get_project(id)?;
        let mut updated = original.clone();
        f(&mut updated);
        updated.uuid = original.uuid;
        updated.created_time = original.created_time;
        updated.modified_time = time::now();

        if updated.parent == Some(id) {
            return Err(Error::NotFound {
                kind: EntityKind::Project,
                id,
            });
        }
        self.validate_project(&updated, Some(id), settings)?;
        self.projects.insert(id, updated);
        Ok(())
    }

    /// Updates a task through a closure over a copy of its current value
    pub fn update_task<F>(&mut self, id: Id, settings: &Settings, f: F) -> Result<()>
    where
        F: FnOnce(&mut Task),
    {
        let original = self.get_task(id)?;
        let mut updated = original.clone();
        f(&mut updated);
        updated.uuid = original.uuid;
        updated.created_time = original.created_time;
        updated.modified_time = time::now();

        self.validate_task(&updated, Some(id), settings)?;
        self.tasks.insert(id, updated);
        Ok(())
    }

    /// Deletes a project, nulling `project_id` on every referencing task
    pub fn delete_project(&mut self, id: Id) -> Result<()> {
        let project = self.projects.remove(&id).ok_or(Error::NotFound {
            kind: EntityKind::Project,
            id,
        })?;
        self.project_uuids.remove(&project.uuid);

        let referencing: Vec<Id> = self
            .tasks
            .iter()
            .filter(|(_, t)| t.project_id == Some(id))
            .map(|(tid, _)| *tid)
            .collect();
        for tid in referencing {
            if let Some(task) = self.tasks.get(&tid) {
                let mut updated = task.clone();
                updated.project_id = None;
                updated.modified_time = time::now();
                self.tasks.insert(tid, updated);
            }
        }
        Ok(())
    }

    /// Deletes a task
    ///
    /// Only the task and its index entry are removed: ids lingering in
    /// other tasks' `blocked_by` sets are left as-is.
    pub fn delete_task(&mut self, id: Id) -> Result<()> {
        let task = self.tasks.remove(&id).ok_or(Error::NotFound {
            kind: EntityKind::Task,
            id,
        })?;
        self.task_uuids.remove(&task.uuid);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Status and blocking
    // ------------------------------------------------------------------

    /// Applies a status action to a task, returning the new value
    ///
    /// `dt` defaults to now; `first_dt` covers the earlier of two chained
    /// transitions when retroactively recording, and defaults to `dt`.
    pub fn apply_status_action(
        &mut self,
        id: Id,
        action: StatusAction,
        dt: Option<DateTime<Utc>>,
        first_dt: Option<DateTime<Utc>>,
    ) -> Result<Task> {
        let updated = self.get_task(id)?.apply(action, dt, first_dt)?;
        self.tasks.insert(id, updated.clone());
        Ok(updated)
    }

    /// Records that one task blocks another
    pub fn add_blocking_task(&mut self, blocking_id: Id, blocked_id: Id) -> Result<()> {
        // ensure the blocking task exists
        self.get_task(blocking_id)?;
        let mut updated = self.get_task(blocked_id)?.clone();
        updated.blocked_by.insert(blocking_id);
        updated.modified_time = time::now();
        self.tasks.insert(blocked_id, updated);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------------

    fn validate_project(
        &self,
        project: &Project,
        exclude: Option<Id>,
        settings: &Settings,
    ) -> Result<()> {
        if !valid_name(&project.name) {
            return Err(Error::InvalidName {
                kind: EntityKind::Project,
                name: project.name.clone(),
            });
        }
        if let Some(parent) = project.parent {
            self.get_project(parent)?;
        }

        let clash = self
            .projects
            .iter()
            .filter(|(id, _)| Some(**id) != exclude)
            .any(|(_, other)| names_clash(&settings.matcher, &project.name, &other.name));
        if clash {
            return Err(Error::DuplicateName {
                kind: EntityKind::Project,
                name: project.name.clone(),
            });
        }
        Ok(())
    }

    fn validate_task(&self, task: &Task, exclude: Option<Id>, settings: &Settings) -> Result<()> {
        if !valid_name(&task.name) {
            return Err(Error::InvalidName {
                kind: EntityKind::Task,
                name: task.name.clone(),
            });
        }
        check_score("priority", task.priority)?;
        check_score("difficulty", task.difficulty)?;
        check_score("expected_duration", task.expected_duration)?;
        task.validate()?;

        if let Some(project_id) = task.project_id {
            self.get_project(project_id)?;
        }

        // Completed tasks may share a name as historical records; only
        // incomplete ones count toward uniqueness.
        if !task.status().is_complete() {
            let clash = self
                .tasks
                .iter()
                .filter(|(id, _)| Some(**id) != exclude)
                .filter(|(_, other)| !other.status().is_complete())
                .any(|(_, other)| names_clash(&settings.matcher, &task.name, &other.name));
            if clash {
                return Err(Error::DuplicateName {
                    kind: EntityKind::Task,
                    name: task.name.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Smallest non-negative id not present in the map.
pub(super) fn lowest_unused_id<T>(map: &BTreeMap<Id, T>) -> Id {
    let mut candidate = 0;
    for id in map.keys() {
        if *id == candidate {
            candidate += 1;
        } else if *id > candidate {
            break;
        }
    }
    candidate
}

fn names_clash(matcher: &crate::settings::NameMatcher, a: &str, b: &str) -> bool {
    matcher.is_match(a, b) || matcher.is_match(b, a)
}

fn check_score(field: &'static str, value: Option<f64>) -> Result<()> {
    if let Some(v) = value {
        if !v.is_finite() || v < 0.0 {
            return Err(Error::InvalidScore { field, value: v });
        }
    }
    Ok(())
}

/// Ranked by-name resolution shared by projects and tasks.
///
/// `preferred` marks the tier favored within the same exactness (incomplete
/// tasks; always true for projects).
fn resolve_name<'a>(
    candidates: impl Iterator<Item = (Id, &'a str, bool)>,
    name: &str,
    settings: &Settings,
    kind: EntityKind,
) -> Result<Option<Id>> {
    let matcher = &settings.matcher;
    let mut best_rank = u8::MAX;
    let mut winners: Vec<Id> = Vec::new();

    for (id, candidate, preferred) in candidates {
        let rank = if matcher.is_exact(name, candidate) {
            if preferred {
                0
            } else {
                1
            }
        } else if matcher.is_match(name, candidate) {
            if preferred {
                2
            } else {
                3
            }
        } else {
            continue;
        };

        if rank < best_rank {
            best_rank = rank;
            winners.clear();
        }
        if rank == best_rank {
            winners.push(id);
        }
    }

    match winners.len() {
        0 => Ok(None),
        1 => Ok(Some(winners[0])),
        count => Err(Error::AmbiguousName {
            kind,
            name: name.to_string(),
            count,
        }),
    }
}
