//! Task model.
//!
//! A task is a single time-boxed cooking step. It occupies a
//! [`Timeline`], consumes resources for its whole active interval,
//! and may wait on other tasks through dependencies.
//!
//! # Time Representation
//! All times are in minutes relative to the start of the cooking session
//! (t=0). Intervals are half-open: `[start, end)`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The `[start, end)` interval currently assigned to a task (minutes).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    /// Start time (minutes).
    pub start: f64,
    /// End time (minutes).
    pub end: f64,
}

impl Timeline {
    /// Creates a timeline.
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Whether both bounds are usable numbers.
    pub fn is_valid(&self) -> bool {
        self.start.is_finite() && self.end.is_finite()
    }

    /// Whether this interval strictly overlaps `[start, end)`.
    #[inline]
    pub fn overlaps(&self, start: f64, end: f64) -> bool {
        self.start.max(start) < self.end.min(end)
    }

    /// Whether time `t` falls inside `[start, end)`.
    #[inline]
    pub fn contains(&self, t: f64) -> bool {
        self.start <= t && t < self.end
    }
}

/// A schedulable cooking step.
///
/// Passes only ever rewrite [`Task::timeline`]; every other field is
/// read-only input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier within the working set (`recipe:step` after merge).
    pub id: String,
    /// Originating recipe. Used for tie-breaks and dependency namespacing.
    pub group_id: String,
    /// Human-readable label.
    pub label: String,
    /// Current interval. `None` marks a malformed task that is skipped.
    pub timeline: Option<Timeline>,
    /// Explicit duration (minutes). Falls back to `end - start`.
    pub duration: Option<f64>,
    /// Resource name → quantity held while active.
    pub requirements: BTreeMap<String, u32>,
    /// IDs of tasks that must end before this one starts.
    pub dependencies: Vec<String>,
    /// Permitted delay past the baseline start (minutes).
    pub slack: f64,
    /// Lower values are moved first during leveling.
    pub priority: i32,
    /// Pinned tasks are never moved by the iterative leveler.
    pub pinned: bool,
}

impl Task {
    /// Creates a task with the given ID and no timeline.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            group_id: String::new(),
            label: String::new(),
            timeline: None,
            duration: None,
            requirements: BTreeMap::new(),
            dependencies: Vec::new(),
            slack: 0.0,
            priority: 0,
            pinned: false,
        }
    }

    /// Sets the originating group (recipe) ID.
    pub fn with_group(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = group_id.into();
        self
    }

    /// Sets the label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Sets the timeline.
    pub fn with_timeline(mut self, start: f64, end: f64) -> Self {
        self.timeline = Some(Timeline::new(start, end));
        self
    }

    /// Sets an explicit duration.
    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Adds a resource requirement.
    pub fn with_requirement(mut self, resource: impl Into<String>, quantity: u32) -> Self {
        self.requirements.insert(resource.into(), quantity);
        self
    }

    /// Adds a dependency.
    pub fn with_dependency(mut self, task_id: impl Into<String>) -> Self {
        self.dependencies.push(task_id.into());
        self
    }

    /// Sets the slack (minutes).
    pub fn with_slack(mut self, slack: f64) -> Self {
        self.slack = slack;
        self
    }

    /// Sets the leveling priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Marks the task as pinned.
    pub fn pinned(mut self) -> Self {
        self.pinned = true;
        self
    }

    /// The timeline, if present and numeric.
    pub fn valid_timeline(&self) -> Option<Timeline> {
        self.timeline.filter(Timeline::is_valid)
    }

    /// Start time, if the timeline is valid.
    pub fn start(&self) -> Option<f64> {
        self.valid_timeline().map(|t| t.start)
    }

    /// End time, if the timeline is valid.
    pub fn end(&self) -> Option<f64> {
        self.valid_timeline().map(|t| t.end)
    }

    /// Processing duration (minutes).
    ///
    /// Explicit duration when given, otherwise `max(0, end - start)`.
    pub fn duration(&self) -> f64 {
        match (self.duration, self.valid_timeline()) {
            (Some(d), _) => d,
            (None, Some(t)) => (t.end - t.start).max(0.0),
            (None, None) => 0.0,
        }
    }

    /// Slack, treating non-finite values as zero.
    pub fn effective_slack(&self) -> f64 {
        if self.slack.is_finite() {
            self.slack
        } else {
            0.0
        }
    }

    /// Quantity of `resource` this task holds (0 if none).
    pub fn requirement(&self, resource: &str) -> u32 {
        self.requirements.get(resource).copied().unwrap_or(0)
    }

    /// Whether the task holds a positive quantity of `resource`.
    pub fn demands(&self, resource: &str) -> bool {
        self.requirement(resource) > 0
    }

    /// Moves the task to `start`, keeping `end == start + duration`.
    pub fn place_at(&mut self, start: f64) {
        let duration = self.duration();
        self.timeline = Some(Timeline::new(start, start + duration));
    }
}
