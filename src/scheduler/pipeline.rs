//! Fixed scheduling pipeline.
//!
//! Backward leveler (only with a deadline) → greedy forward scheduler →
//! iterative leveler. Each stage receives the previous stage's output.

use tracing::debug;

use super::{BackwardLeveler, GreedyScheduler, IterativeLeveler};
use crate::config::SchedulerConfig;
use crate::models::{Capacity, Plan, Task};

/// Runs all passes with one shared configuration.
///
/// # Example
///
/// ```
/// use mise_schedule::config::SchedulerConfig;
/// use mise_schedule::models::{Capacity, Task};
/// use mise_schedule::scheduler::Pipeline;
///
/// let tasks = vec![
///     Task::new("boil").with_timeline(0.0, 10.0).with_requirement("stove", 1),
///     Task::new("fry")
///         .with_timeline(0.0, 5.0)
///         .with_requirement("stove", 1)
///         .with_slack(15.0),
/// ];
/// let plan = Pipeline::new(SchedulerConfig::default()).run(&tasks, &Capacity::kitchen());
/// assert!(plan.is_feasible());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: SchedulerConfig,
}

impl Pipeline {
    /// Creates a pipeline.
    pub fn new(config: SchedulerConfig) -> Self {
        Self { config }
    }

    /// The configuration in use.
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Schedules `tasks` and returns the final plan with residual conflicts.
    pub fn run(&self, tasks: &[Task], capacity: &Capacity) -> Plan {
        let leveled = match self.config.effective_target_end() {
            Some(_) => BackwardLeveler::from_config(&self.config).level(tasks),
            None => tasks.to_vec(),
        };
        let placed = GreedyScheduler::from_config(&self.config).schedule(&leveled, capacity);
        let outcome = IterativeLeveler::from_config(&self.config).level(&placed, capacity);

        debug!(
            tasks = outcome.tasks.len(),
            conflicts = outcome.conflicts.len(),
            stop_reason = ?outcome.stop_reason,
            "pipeline finished"
        );
        Plan::new(outcome.tasks, outcome.conflicts)
    }
}
