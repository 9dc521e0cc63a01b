//! Scheduler configuration.
//!
//! Every option the passes recognize is a named field with a default,
//! so a partial JSON/TOML document deserializes cleanly:
//!
//! ```
//! use mise_schedule::config::{Objective, SchedulerConfig};
//!
//! let config = SchedulerConfig::new()
//!     .with_granularity(1.0)
//!     .with_objective(Objective::min_peak_usage("hands"))
//!     .with_target_end(60.0);
//! assert_eq!(config.max_iterations, 200);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Default search step (minutes).
pub const DEFAULT_GRANULARITY: f64 = 0.5;

/// Default iteration cap for the iterative leveler.
pub const DEFAULT_MAX_ITERATIONS: usize = 200;

/// What the iterative leveler tries to improve.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    /// Minimize total conflict severity.
    #[default]
    MinConflicts,
    /// Minimize peak concurrent demand for one resource, then severity.
    MinPeakUsage {
        /// Resource whose peak is minimized.
        resource: String,
    },
}

impl Objective {
    /// Shorthand for [`Objective::MinPeakUsage`].
    pub fn min_peak_usage(resource: impl Into<String>) -> Self {
        Self::MinPeakUsage {
            resource: resource.into(),
        }
    }

    /// Resource whose peak usage is tracked, if any.
    pub fn peak_resource(&self) -> Option<&str> {
        match self {
            Self::MinConflicts => None,
            Self::MinPeakUsage { resource } => Some(resource),
        }
    }
}

/// Options shared by the scheduling passes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Candidate start step (minutes, > 0).
    pub granularity: f64,
    /// Tasks the iterative leveler must not move.
    pub pinned_ids: BTreeSet<String>,
    /// Iteration cap for the iterative leveler.
    pub max_iterations: usize,
    /// Leveling objective.
    pub objective: Objective,
    /// Deadline for sink tasks. Enables the backward pass when set.
    pub target_end: Option<f64>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            granularity: DEFAULT_GRANULARITY,
            pinned_ids: BTreeSet::new(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            objective: Objective::MinConflicts,
            target_end: None,
        }
    }
}

impl SchedulerConfig {
    /// Creates a configuration with all defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the search granularity.
    pub fn with_granularity(mut self, granularity: f64) -> Self {
        self.granularity = granularity;
        self
    }

    /// Pins a task against leveling moves.
    pub fn with_pinned(mut self, task_id: impl Into<String>) -> Self {
        self.pinned_ids.insert(task_id.into());
        self
    }

    /// Sets the iteration cap.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets the leveling objective.
    pub fn with_objective(mut self, objective: Objective) -> Self {
        self.objective = objective;
        self
    }

    /// Sets the sink deadline.
    pub fn with_target_end(mut self, target_end: f64) -> Self {
        self.target_end = Some(target_end);
        self
    }

    /// Granularity actually used: invalid values fall back to the default.
    pub fn effective_granularity(&self) -> f64 {
        normalize_granularity(self.granularity)
    }

    /// Iteration cap actually used: zero falls back to the default.
    pub fn effective_max_iterations(&self) -> usize {
        normalize_max_iterations(self.max_iterations)
    }

    /// Deadline, if set and finite.
    pub fn effective_target_end(&self) -> Option<f64> {
        self.target_end.filter(|t| t.is_finite())
    }
}

pub(crate) fn normalize_granularity(granularity: f64) -> f64 {
    if granularity.is_finite() && granularity > 0.0 {
        granularity
    } else {
        DEFAULT_GRANULARITY
    }
}

pub(crate) fn normalize_max_iterations(max_iterations: usize) -> usize {
    if max_iterations == 0 {
        DEFAULT_MAX_ITERATIONS
    } else {
        max_iterations
    }
}
