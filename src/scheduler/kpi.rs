//! Plan quality metrics (KPIs).
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Makespan | Latest end time |
//! | Conflicts | Number of residual conflict intervals |
//! | Severity | Σ overuse × duration over residual conflicts |
//! | Peak usage | Max concurrent demand per resource |
//! | Peak load | Peak usage / capacity per resource |
//! | Total / max delay | Start shift against the baseline task set |

use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::conflict::{peak_usage, severity};
use crate::models::{Capacity, Plan, Task};

/// Plan performance indicators. Times are in minutes.
#[derive(Debug, Clone)]
pub struct PlanKpi {
    /// Latest end time.
    pub makespan: f64,
    /// Residual conflict intervals.
    pub conflict_count: usize,
    /// Residual severity.
    pub severity: f64,
    /// Peak concurrent demand per referenced resource.
    pub peak_usage: BTreeMap<String, u32>,
    /// Peak demand divided by capacity per referenced resource.
    pub peak_load: BTreeMap<String, f64>,
    /// Sum of start delays against the baseline.
    pub total_delay: f64,
    /// Largest single start delay.
    pub max_delay: f64,
}

impl PlanKpi {
    /// Computes KPIs for `plan`, measuring delay against `baseline`.
    ///
    /// Tasks are matched by ID; tasks missing from either side, or without
    /// a valid timeline, do not contribute to delay.
    pub fn calculate(plan: &Plan, baseline: &[Task], capacity: &Capacity) -> Self {
        let resources: BTreeSet<&str> = plan
            .tasks
            .iter()
            .flat_map(|t| t.requirements.keys().map(String::as_str))
            .collect();

        let peaks: BTreeMap<String, u32> = resources
            .iter()
            .map(|r| (r.to_string(), peak_usage(&plan.tasks, r)))
            .collect();
        let peak_load = peaks
            .iter()
            .map(|(r, &peak)| {
                let cap = capacity.of(r);
                let load = if cap == 0 {
                    f64::INFINITY
                } else {
                    f64::from(peak) / f64::from(cap)
                };
                (r.clone(), load)
            })
            .collect();

        let baseline_starts: HashMap<&str, f64> = baseline
            .iter()
            .filter_map(|t| t.start().map(|s| (t.id.as_str(), s)))
            .collect();
        let mut total_delay = 0.0;
        let mut max_delay: f64 = 0.0;
        for task in &plan.tasks {
            if let (Some(planned), Some(&base)) =
                (task.start(), baseline_starts.get(task.id.as_str()))
            {
                let delay = (planned - base).max(0.0);
                total_delay += delay;
                max_delay = max_delay.max(delay);
            }
        }

        Self {
            makespan: plan.makespan(),
            conflict_count: plan.conflicts.len(),
            severity: severity(&plan.conflicts),
            peak_usage: peaks,
            peak_load,
            total_delay,
            max_delay,
        }
    }

    /// Whether the plan is conflict-free and ends by `deadline`.
    pub fn meets_deadline(&self, deadline: f64) -> bool {
        self.conflict_count == 0 && self.makespan <= deadline
    }
}
