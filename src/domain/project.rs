//! Project domain model
//!
//! Projects group related tasks and may form a tree through parent links.
//! They are immutable values: the board substitutes a fresh copy on every
//! update.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::meta::Meta;
use super::Id;
use crate::time;

/// A project grouping related tasks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Stable identifier; survives board merges, unlike the board-local id
    pub uuid: Uuid,

    /// Project name (must contain at least one letter)
    pub name: String,

    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// When the project was created
    #[serde(with = "time::timestamp")]
    pub created_time: DateTime<Utc>,

    /// When the project was last modified
    #[serde(with = "time::timestamp")]
    pub modified_time: DateTime<Utc>,

    /// Links associated with the project
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub links: BTreeSet<String>,

    /// Board-local id of the parent project, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<Id>,

    /// Free-form notes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,

    /// Open-schema extra fields
    #[serde(default, skip_serializing_if = "Meta::is_empty")]
    pub extra: Meta,
}

impl Project {
    /// Creates a new project with the given name
    pub fn new(name: impl Into<String>) -> Self {
        let now = time::now();
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            description: None,
            created_time: now,
            modified_time: now,
            links: BTreeSet::new(),
            parent: None,
            notes: Vec::new(),
            extra: Meta::new(),
        }
    }

    /// Sets the description, builder style
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the parent project id, builder style
    pub fn with_parent(mut self, parent: Id) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Appends a note
    pub fn add_note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }
}
