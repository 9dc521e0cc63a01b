//! Backward (late-start) leveler.
//!
//! # Algorithm
//!
//! 1. Build the dependents map and a topological order (Kahn's algorithm).
//! 2. Walk the order in reverse, so dependents are settled before their
//!    prerequisites.
//! 3. For each task:
//!    - `latest = start + slack`, capped by `min(dependent start) - duration`,
//!      or by `target_end - duration` for sinks when a deadline is set.
//!    - `earliest = max(prerequisite end)` (0 without prerequisites).
//!    - Move to `max(earliest, latest)` only if that is later than now.
//!
//! Tasks on a dependency cycle never reach in-degree zero, so they are
//! absent from the order and keep their timeline.
//!
//! # Reference
//! Kahn (1962), "Topological sorting of large networks"

use std::collections::{HashMap, VecDeque};

use tracing::{debug, trace};

use crate::config::SchedulerConfig;
use crate::models::Task;

/// Delays tasks as late as slack, dependents, and an optional deadline allow.
#[derive(Debug, Clone, Default)]
pub struct BackwardLeveler {
    target_end: Option<f64>,
}

impl BackwardLeveler {
    /// Creates a leveler without a deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a leveler from shared options.
    pub fn from_config(config: &SchedulerConfig) -> Self {
        Self {
            target_end: config.effective_target_end(),
        }
    }

    /// Sets the deadline for sink tasks (minutes).
    pub fn with_target_end(mut self, target_end: f64) -> Self {
        self.target_end = Some(target_end).filter(|t| t.is_finite());
        self
    }

    /// Returns a copy of `tasks` with every eligible task pushed later.
    ///
    /// No task ever starts earlier than in the input.
    pub fn level(&self, tasks: &[Task]) -> Vec<Task> {
        let mut tasks = tasks.to_vec();
        let index: HashMap<&str, usize> = tasks
            .iter()
            .enumerate()
            .map(|(i, t)| (t.id.as_str(), i))
            .collect();

        let prerequisites: Vec<Vec<usize>> = tasks
            .iter()
            .map(|t| {
                t.dependencies
                    .iter()
                    .filter_map(|dep| index.get(dep.as_str()).copied())
                    .collect()
            })
            .collect();

        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); tasks.len()];
        for (i, prereqs) in prerequisites.iter().enumerate() {
            for &p in prereqs {
                dependents[p].push(i);
            }
        }

        let order = topological_order(&prerequisites, &dependents);
        if order.len() < tasks.len() {
            debug!(
                excluded = tasks.len() - order.len(),
                "tasks on dependency cycles left in place"
            );
        }

        let mut moved = 0usize;
        for &i in order.iter().rev() {
            let Some(current) = tasks[i].valid_timeline() else {
                continue;
            };
            let duration = tasks[i].duration();

            let mut latest = current.start + tasks[i].effective_slack();
            if !dependents[i].is_empty() {
                let min_dependent_start = dependents[i]
                    .iter()
                    .map(|&j| tasks[j].start().unwrap_or(f64::INFINITY))
                    .fold(f64::INFINITY, f64::min);
                latest = latest.min(min_dependent_start - duration);
            } else if let Some(target_end) = self.target_end {
                latest = latest.min(target_end - duration);
            }

            let earliest = if prerequisites[i].is_empty() {
                0.0
            } else {
                prerequisites[i]
                    .iter()
                    .map(|&p| tasks[p].end().unwrap_or(0.0))
                    .fold(f64::NEG_INFINITY, f64::max)
            };

            let new_start = earliest.max(latest);
            if new_start > current.start {
                trace!(task = %tasks[i].id, from = current.start, to = new_start, "delayed");
                tasks[i].place_at(new_start);
                moved += 1;
            }
        }

        debug!(tasks = tasks.len(), moved, "backward leveling finished");
        tasks
    }
}

/// Kahn's algorithm. Nodes on cycles, and everything downstream of them,
/// are omitted.
pub(crate) fn topological_order(prerequisites: &[Vec<usize>], dependents: &[Vec<usize>]) -> Vec<usize> {
    let mut in_degree: Vec<usize> = prerequisites.iter().map(Vec::len).collect();
    let mut queue: VecDeque<usize> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, &d)| d == 0)
        .map(|(i, _)| i)
        .collect();

    let mut order = Vec::with_capacity(prerequisites.len());
    while let Some(node) = queue.pop_front() {
        order.push(node);
        for &next in &dependents[node] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                queue.push_back(next);
            }
        }
    }
    order
}
