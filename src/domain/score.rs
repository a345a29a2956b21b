//! Task scoring
//!
//! Scorers rank tasks for "what should I work on next" views. Missing
//! fields fall back to per-scorer defaults so unscored tasks still sort
//! somewhere sensible.

use super::task::Task;

/// Assigns a sortable score to a task; higher means more urgent.
pub trait TaskScorer {
    /// Stable name used to select the scorer in configuration.
    fn name(&self) -> &'static str;

    /// Display units for the score, if any.
    fn units(&self) -> Option<&'static str> {
        None
    }

    fn score(&self, task: &Task) -> f64;
}

/// Priority alone.
#[derive(Debug, Clone, Copy)]
pub struct PriorityScorer {
    pub default_priority: f64,
}

impl Default for PriorityScorer {
    fn default() -> Self {
        Self {
            default_priority: 1.0,
        }
    }
}

impl TaskScorer for PriorityScorer {
    fn name(&self) -> &'static str {
        "priority"
    }

    fn units(&self) -> Option<&'static str> {
        Some("pri")
    }

    fn score(&self, task: &Task) -> f64 {
        task.priority.unwrap_or(self.default_priority)
    }
}

/// Priority divided by difficulty: easy wins among equal priorities.
#[derive(Debug, Clone, Copy)]
pub struct PriorityDifficultyScorer {
    pub default_priority: f64,
    pub default_difficulty: f64,
}

impl Default for PriorityDifficultyScorer {
    fn default() -> Self {
        Self {
            default_priority: 1.0,
            default_difficulty: 1.0,
        }
    }
}

impl TaskScorer for PriorityDifficultyScorer {
    fn name(&self) -> &'static str {
        "priority-difficulty"
    }

    fn units(&self) -> Option<&'static str> {
        Some("pri/diff")
    }

    fn score(&self, task: &Task) -> f64 {
        let priority = task.priority.unwrap_or(self.default_priority);
        let difficulty = task.difficulty.unwrap_or(self.default_difficulty);
        priority / difficulty
    }
}

/// Priority earned per expected day of work.
#[derive(Debug, Clone, Copy)]
pub struct PriorityRateScorer {
    pub default_priority: f64,
    /// Expected duration, in days, assumed for tasks without one.
    pub default_duration: f64,
}

impl Default for PriorityRateScorer {
    fn default() -> Self {
        Self {
            default_priority: 1.0,
            default_duration: 4.0,
        }
    }
}

impl TaskScorer for PriorityRateScorer {
    fn name(&self) -> &'static str {
        "priority-rate"
    }

    fn units(&self) -> Option<&'static str> {
        Some("pri/day")
    }

    fn score(&self, task: &Task) -> f64 {
        let priority = task.priority.unwrap_or(self.default_priority);
        let duration = task.expected_duration.unwrap_or(self.default_duration);
        priority / duration
    }
}

/// Name of the scorer used when none is configured.
pub const DEFAULT_SCORER: &str = "priority-rate";

/// Looks up a built-in scorer by its stable name.
pub fn scorer_by_name(name: &str) -> Option<Box<dyn TaskScorer>> {
    match name {
        "priority" => Some(Box::new(PriorityScorer::default())),
        "priority-difficulty" => Some(Box::new(PriorityDifficultyScorer::default())),
        "priority-rate" => Some(Box::new(PriorityRateScorer::default())),
        _ => None,
    }
}
