//! Plan (solution) model.
//!
//! A plan is the scheduled task set handed back to the caller together
//! with any capacity conflicts that could not be resolved.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::Task;

/// A time window `[start, end)` where demand for one resource exceeds
/// its capacity.
///
/// Two resources over capacity at the same instant produce two separate
/// intervals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictInterval {
    /// Over-allocated resource.
    pub resource: String,
    /// Window start (minutes, inclusive).
    pub start: f64,
    /// Window end (minutes, exclusive).
    pub end: f64,
    /// Summed demand during the window.
    pub usage: u32,
    /// Resource ceiling.
    pub capacity: u32,
    /// Tasks that overlap the window and hold the resource.
    pub culprits: Vec<String>,
}

impl ConflictInterval {
    /// Window length (minutes, never negative).
    #[inline]
    pub fn duration(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }

    /// Demand above capacity.
    #[inline]
    pub fn overuse(&self) -> u32 {
        self.usage.saturating_sub(self.capacity)
    }

    /// Severity contribution: `overuse * duration`.
    pub fn score(&self) -> f64 {
        f64::from(self.overuse()) * self.duration()
    }

    /// Whether `task_id` is listed as a culprit.
    pub fn involves(&self, task_id: &str) -> bool {
        self.culprits.iter().any(|c| c == task_id)
    }
}

impl fmt::Display for ConflictInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} over capacity during {}-{} min: {} > {}",
            self.resource, self.start, self.end, self.usage, self.capacity
        )
    }
}

/// Scheduled tasks plus residual conflicts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Plan {
    /// Tasks with their final timelines.
    pub tasks: Vec<Task>,
    /// Capacity violations remaining in `tasks`.
    pub conflicts: Vec<ConflictInterval>,
}

impl Plan {
    /// Creates a plan.
    pub fn new(tasks: Vec<Task>, conflicts: Vec<ConflictInterval>) -> Self {
        Self { tasks, conflicts }
    }

    /// Whether no capacity conflict remains.
    pub fn is_feasible(&self) -> bool {
        self.conflicts.is_empty()
    }

    /// Latest end time across all tasks (minutes).
    pub fn makespan(&self) -> f64 {
        self.tasks
            .iter()
            .filter_map(Task::end)
            .fold(0.0, f64::max)
    }

    /// Finds a task by ID.
    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Tasks active at time `t`.
    pub fn active_at(&self, t: f64) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|task| task.valid_timeline().is_some_and(|tl| tl.contains(t)))
            .collect()
    }

    /// Tasks whose end falls in `(from, to]`.
    pub fn ended_between(&self, from: f64, to: f64) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|task| task.end().is_some_and(|end| from < end && end <= to))
            .collect()
    }

    /// Conflicts on a given resource.
    pub fn conflicts_for_resource(&self, resource: &str) -> Vec<&ConflictInterval> {
        self.conflicts
            .iter()
            .filter(|c| c.resource == resource)
            .collect()
    }

    /// Conflicts that list a given task as culprit.
    pub fn conflicts_for_task(&self, task_id: &str) -> Vec<&ConflictInterval> {
        self.conflicts
            .iter()
            .filter(|c| c.involves(task_id))
            .collect()
    }
}
