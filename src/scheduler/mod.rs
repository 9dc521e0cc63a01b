//! Scheduling passes and plan metrics.
//!
//! # Passes
//!
//! | Pass | Direction | Purpose |
//! |------|-----------|---------|
//! | [`detect_conflicts`] | — | Find windows where demand exceeds capacity |
//! | [`BackwardLeveler`] | later | Push tasks as late as slack and dependents allow |
//! | [`GreedyScheduler`] | earlier-first | Earliest capacity-feasible start per task |
//! | [`IterativeLeveler`] | later | Hill-climb away the worst remaining conflicts |
//! | [`Pipeline`] | — | Backward (optional) → Greedy → Iterative |
//!
//! Every pass takes a task slice and returns a fresh `Vec<Task>`; the
//! caller's tasks are never mutated.
//!
//! # KPI
//!
//! [`PlanKpi`] summarizes makespan, conflict severity, peak usage, and
//! delay against the baseline.

mod adjust;
mod backward;
mod conflict;
mod greedy;
mod kpi;
mod leveler;
mod pipeline;

pub use adjust::{apply_start_override, view_horizon};
pub use backward::BackwardLeveler;
pub(crate) use backward::topological_order;
pub use conflict::{detect_conflicts, peak_usage, severity};
pub use greedy::GreedyScheduler;
pub use kpi::PlanKpi;
pub use leveler::{IterativeLeveler, LevelingOutcome, StopReason};
pub use pipeline::Pipeline;

/// Tolerance for floating point time comparisons (minutes).
pub(crate) const EPSILON: f64 = 1e-9;

/// Rounds `x` up to the next multiple of `step`, absorbing float noise.
#[inline]
pub(crate) fn round_up(x: f64, step: f64) -> f64 {
    // `+ 0.0` turns -0.0 into 0.0
    (x / step - EPSILON).ceil() * step + 0.0
}
