//! Flat wire form of a board
//!
//! A [`Snapshot`] is what persistence and import/export layers see: plain
//! maps from decimal-string entity ids to entities, with no derived
//! indices. Converting back into a [`Board`] rebuilds the uuid indices and
//! re-checks the invariants a hand-edited or foreign file might violate.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::board::Board;
use super::project::Project;
use super::task::Task;
use super::Id;
use crate::error::{EntityKind, Error};
use crate::time;

/// Serialized form of a [`Board`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Board name
    pub name: String,

    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// When the board was created
    #[serde(with = "time::timestamp")]
    pub created_time: DateTime<Utc>,

    /// Projects keyed by board-local id
    #[serde(default)]
    pub projects: BTreeMap<Id, Project>,

    /// Tasks keyed by board-local id
    #[serde(default)]
    pub tasks: BTreeMap<Id, Task>,

    /// Schema version; absent in old files, which read as 0
    #[serde(default)]
    pub version: u64,
}

impl TryFrom<Snapshot> for Board {
    type Error = Error;

    fn try_from(snapshot: Snapshot) -> Result<Self, Error> {
        let mut project_uuids: HashMap<Uuid, Id> = HashMap::new();
        for (id, project) in &snapshot.projects {
            if project_uuids.insert(project.uuid, *id).is_some() {
                return Err(Error::DuplicateUuid {
                    kind: EntityKind::Project,
                    uuid: project.uuid,
                });
            }
            if let Some(parent) = project.parent {
                if !snapshot.projects.contains_key(&parent) {
                    return Err(Error::NotFound {
                        kind: EntityKind::Project,
                        id: parent,
                    });
                }
            }
        }

        let mut task_uuids: HashMap<Uuid, Id> = HashMap::new();
        for (id, task) in &snapshot.tasks {
            if task_uuids.insert(task.uuid, *id).is_some() {
                return Err(Error::DuplicateUuid {
                    kind: EntityKind::Task,
                    uuid: task.uuid,
                });
            }
            if let Some(project_id) = task.project_id {
                if !snapshot.projects.contains_key(&project_id) {
                    return Err(Error::NotFound {
                        kind: EntityKind::Project,
                        id: project_id,
                    });
                }
            }
        }

        Ok(Board {
            name: snapshot.name,
            description: snapshot.description,
            created_time: snapshot.created_time,
            projects: snapshot.projects,
            tasks: snapshot.tasks,
            version: snapshot.version,
            project_uuids,
            task_uuids,
        })
    }
}

impl From<Board> for Snapshot {
    fn from(board: Board) -> Self {
        Snapshot {
            name: board.name,
            description: board.description,
            created_time: board.created_time,
            projects: board.projects,
            tasks: board.tasks,
            version: board.version,
        }
    }
}
