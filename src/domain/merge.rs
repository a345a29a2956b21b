//! Board merge
//!
//! Reconciles two replicas of the same board, e.g. copies synced between
//! machines. Entities pair up by uuid, never by board-local id: matched
//! pairs resolve last-writer-wins on `modified_time`, unmatched incoming
//! entities are adopted under fresh ids, and id-valued references inside
//! adopted or replaced entities are rewritten to this board's id space.

use std::collections::HashMap;

use super::board::{lowest_unused_id, Board};
use super::Id;
use crate::error::{Error, Result};

impl Board {
    /// Merges another board's entities into this one.
    ///
    /// Conflict resolution is whole-entity: when both sides changed the
    /// same uuid, the copy with the later `modified_time` wins outright
    /// and field-level edits on the losing side are discarded. Equal
    /// timestamps keep ours. Merging is commutative up to board-local
    /// ids: both replicas converge to the same entities by uuid.
    ///
    /// A board from a newer schema version is rejected before any entity
    /// is touched; older versions merge fine.
    pub fn update_with_board(&mut self, other: &Board) -> Result<()> {
        if other.version > self.version {
            return Err(Error::VersionMismatch {
                ours: self.version,
                theirs: other.version,
            });
        }

        // other-board id -> our id, for every incoming entity
        let mut project_map: HashMap<Id, Id> = HashMap::new();
        let mut task_map: HashMap<Id, Id> = HashMap::new();
        // entities whose id references need rewriting into our id space
        let mut adopted_projects: Vec<Id> = Vec::new();
        let mut adopted_tasks: Vec<Id> = Vec::new();

        for (their_id, theirs) in &other.projects {
            match self.project_uuids.get(&theirs.uuid).copied() {
                Some(our_id) => {
                    project_map.insert(*their_id, our_id);
                    if let Some(ours) = self.projects.get(&our_id) {
                        if ours != theirs && theirs.modified_time > ours.modified_time {
                            self.projects.insert(our_id, theirs.clone());
                            adopted_projects.push(our_id);
                        }
                    }
                }
                None => {
                    let our_id = lowest_unused_id(&self.projects);
                    self.project_uuids.insert(theirs.uuid, our_id);
                    self.projects.insert(our_id, theirs.clone());
                    project_map.insert(*their_id, our_id);
                    adopted_projects.push(our_id);
                }
            }
        }

        for (their_id, theirs) in &other.tasks {
            match self.task_uuids.get(&theirs.uuid).copied() {
                Some(our_id) => {
                    task_map.insert(*their_id, our_id);
                    if let Some(ours) = self.tasks.get(&our_id) {
                        if ours != theirs && theirs.modified_time > ours.modified_time {
                            self.tasks.insert(our_id, theirs.clone());
                            adopted_tasks.push(our_id);
                        }
                    }
                }
                None => {
                    let our_id = lowest_unused_id(&self.tasks);
                    self.task_uuids.insert(theirs.uuid, our_id);
                    self.tasks.insert(our_id, theirs.clone());
                    task_map.insert(*their_id, our_id);
                    adopted_tasks.push(our_id);
                }
            }
        }

        // Adopted entities still carry the other board's ids in their
        // references; rewrite them through the maps. Unmapped ids (already
        // dangling on the other board) pass through unchanged.
        let remap = |map: &HashMap<Id, Id>, id: Id| map.get(&id).copied().unwrap_or(id);

        for id in adopted_projects {
            if let Some(project) = self.projects.get(&id) {
                let parent = project.parent.map(|p| remap(&project_map, p));
                if parent != project.parent {
                    let mut updated = project.clone();
                    updated.parent = parent;
                    self.projects.insert(id, updated);
                }
            }
        }
        for id in adopted_tasks {
            if let Some(task) = self.tasks.get(&id) {
                let project_id = task.project_id.map(|p| remap(&project_map, p));
                let parent = task.parent.map(|p| remap(&task_map, p));
                let blocked_by: std::collections::BTreeSet<Id> =
                    task.blocked_by.iter().map(|b| remap(&task_map, *b)).collect();
                if project_id != task.project_id
                    || parent != task.parent
                    || blocked_by != task.blocked_by
                {
                    let mut updated = task.clone();
                    updated.project_id = project_id;
                    updated.parent = parent;
                    updated.blocked_by = blocked_by;
                    self.tasks.insert(id, updated);
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::domain::project::Project;
    use crate::domain::task::Task;
    use crate::settings::Settings;

    fn board_json(board: &Board) -> String {
        serde_json::to_string(board).unwrap()
    }

    #[test]
    fn merging_a_clone_is_a_no_op() {
        let settings = Settings::default();
        let mut board = Board::new("work");
        let pid = board
            .create_project(Project::new("Website"), &settings)
            .unwrap();
        board
            .create_task(Task::new("Deploy").with_project(pid), &settings)
            .unwrap();

        let clone = board.clone();
        let before = board_json(&board);
        board.update_with_board(&clone).unwrap();
        assert_eq!(board_json(&board), before);
    }

    #[test]
    fn version_mismatch_aborts_untouched() {
        let settings = Settings::default();
        let mut board = Board::new("work");
        board.create_task(Task::new("Deploy"), &settings).unwrap();

        let mut other = board.clone();
        other.version += 1;
        other.create_task(Task::new("Extra"), &settings).unwrap();

        let before = board_json(&board);
        assert!(matches!(
            board.update_with_board(&other),
            Err(Error::VersionMismatch { ours: 0, theirs: 1 })
        ));
        assert_eq!(board_json(&board), before);
    }

    #[test]
    fn older_version_merges_fine() {
        let settings = Settings::default();
        let mut board = Board::new("work");
        board.version = 1;

        let mut old = Board::new("work");
        old.create_task(Task::new("Legacy"), &settings).unwrap();

        board.update_with_board(&old).unwrap();
        assert_eq!(board.num_tasks(), 1);
    }

    #[test]
    fn later_modified_time_wins_whole_entity() {
        let settings = Settings::default();
        let mut ours = Board::new("work");
        let id = ours.create_task(Task::new("Deploy"), &settings).unwrap();
        let mut theirs = ours.clone();

        // Their replica renamed the task later; ours set a priority
        // earlier. The later whole entity wins, so our priority is lost.
        let base = ours.get_task(id).unwrap().modified_time;
        ours.update_task(id, &settings, |t| t.priority = Some(9.0))
            .unwrap();
        theirs
            .update_task(id, &settings, |t| t.name = "Deploy v2".to_string())
            .unwrap();
        {
            let mut bump = theirs.get_task(id).unwrap().clone();
            bump.modified_time = base + Duration::hours(1);
            theirs.tasks.insert(id, bump.clone());
            let mut ours_task = ours.get_task(id).unwrap().clone();
            ours_task.modified_time = base + Duration::minutes(1);
            ours.tasks.insert(id, ours_task);
        }

        ours.update_with_board(&theirs).unwrap();
        let merged = ours.get_task(id).unwrap();
        assert_eq!(merged.name, "Deploy v2");
        assert_eq!(merged.priority, None);
    }

    #[test]
    fn equal_timestamps_keep_ours() {
        let settings = Settings::default();
        let mut ours = Board::new("work");
        let id = ours.create_task(Task::new("Deploy"), &settings).unwrap();
        let mut theirs = ours.clone();

        let shared = ours.get_task(id).unwrap().modified_time;
        let mut their_task = theirs.get_task(id).unwrap().clone();
        their_task.name = "Renamed".to_string();
        their_task.modified_time = shared;
        theirs.tasks.insert(id, their_task);

        ours.update_with_board(&theirs).unwrap();
        assert_eq!(ours.get_task(id).unwrap().name, "Deploy");
    }

    #[test]
    fn new_entities_are_adopted_with_remapped_references() {
        let settings = Settings::default();
        let mut ours = Board::new("work");
        ours.create_task(Task::new("Existing"), &settings).unwrap();

        // The other replica has its own entities at ids that collide with
        // ours; uuids distinguish them.
        let mut theirs = Board::new("work");
        let their_pid = theirs
            .create_project(Project::new("Website"), &settings)
            .unwrap();
        let blocker = theirs.create_task(Task::new("Design"), &settings).unwrap();
        let blocked = theirs
            .create_task(Task::new("Build").with_project(their_pid), &settings)
            .unwrap();
        theirs.add_blocking_task(blocker, blocked).unwrap();

        ours.update_with_board(&theirs).unwrap();
        assert_eq!(ours.num_tasks(), 3);
        assert_eq!(ours.num_projects(), 1);

        let build_id = ours
            .get_task_id_by_name("Build", &settings)
            .unwrap()
            .unwrap();
        let design_id = ours
            .get_task_id_by_name("Design", &settings)
            .unwrap()
            .unwrap();
        let build = ours.get_task(build_id).unwrap();

        // Design landed at a different id here than on the other board,
        // and Build's references follow it.
        assert_ne!(design_id, blocker);
        assert!(build.blocked_by.contains(&design_id));
        let pid = build.project_id.unwrap();
        assert_eq!(ours.get_project(pid).unwrap().name, "Website");
    }

    #[test]
    fn merge_converges_both_directions() {
        let settings = Settings::default();
        let mut a = Board::new("work");
        a.create_task(Task::new("Only on a"), &settings).unwrap();
        let mut b = Board::new("work");
        b.create_task(Task::new("Only on b"), &settings).unwrap();

        let mut ab = a.clone();
        ab.update_with_board(&b).unwrap();
        let mut ba = b.clone();
        ba.update_with_board(&a).unwrap();

        let uuids = |board: &Board| {
            let mut v: Vec<_> = board.tasks().map(|(_, t)| t.uuid).collect();
            v.sort();
            v
        };
        assert_eq!(uuids(&ab), uuids(&ba));
        assert_eq!(ab.num_tasks(), 2);
    }
}
