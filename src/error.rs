//! Errors for caller-driven plan edits.
//!
//! Scheduling passes themselves never fail: infeasibility surfaces as
//! residual [`ConflictInterval`](crate::models::ConflictInterval)s.

use thiserror::Error;

/// Errors raised when editing a plan.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    /// No task with this ID exists in the working set.
    #[error("unknown task: {0}")]
    UnknownTask(String),
    /// The requested start time is not a finite number.
    #[error("invalid start time for task {0}")]
    InvalidStart(String),
}
