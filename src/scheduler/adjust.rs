//! Manual start overrides.
//!
//! A presentation layer lets the cook drag a step to a new start. The
//! override is snapped to the granularity grid, clamped to the visible
//! horizon, and applied to a fresh copy of the task set. Capacity is not
//! checked here; callers re-run [`detect_conflicts`](super::detect_conflicts).

use tracing::debug;

use crate::config::normalize_granularity;
use crate::error::PlanError;
use crate::models::Task;

/// Padding added past the last end when sizing the default horizon.
const HORIZON_PADDING: f64 = 5.0;

/// Default visible horizon: last end plus padding, rounded up to 5 minutes.
pub fn view_horizon(tasks: &[Task]) -> f64 {
    let last_end = tasks.iter().filter_map(Task::end).fold(0.0, f64::max);
    ((last_end + HORIZON_PADDING) / HORIZON_PADDING).ceil() * HORIZON_PADDING
}

/// Moves task `id` to `start`, snapped and clamped to `[0, horizon - duration]`.
///
/// # Errors
/// - [`PlanError::UnknownTask`] if no task has this ID.
/// - [`PlanError::InvalidStart`] if `start` is not finite.
pub fn apply_start_override(
    tasks: &[Task],
    id: &str,
    start: f64,
    horizon: f64,
    granularity: f64,
) -> Result<Vec<Task>, PlanError> {
    if !start.is_finite() {
        return Err(PlanError::InvalidStart(id.to_string()));
    }
    let mut tasks = tasks.to_vec();
    let task = tasks
        .iter_mut()
        .find(|t| t.id == id)
        .ok_or_else(|| PlanError::UnknownTask(id.to_string()))?;

    let step = normalize_granularity(granularity);
    let max_start = (horizon - task.duration()).max(0.0);
    let snapped = (start.clamp(0.0, max_start) / step).round() * step;
    let final_start = snapped.clamp(0.0, max_start);

    debug!(task = %id, requested = start, applied = final_start, "start override");
    task.place_at(final_start);
    Ok(tasks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tasks() -> Vec<Task> {
        vec![
            Task::new("A").with_timeline(0.0, 4.0),
            Task::new("B").with_timeline(4.0, 12.0),
        ]
    }

    #[test]
    fn test_view_horizon() {
        assert!((view_horizon(&tasks()) - 20.0).abs() < 1e-9);
        assert!((view_horizon(&[]) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_override_snaps_to_grid() {
        let moved = apply_start_override(&tasks(), "A", 2.3, 20.0, 0.5).unwrap();
        assert_eq!(moved[0].start(), Some(2.5));
        assert_eq!(moved[0].end(), Some(6.5));
    }

    #[test]
    fn test_override_clamped_to_horizon() {
        let moved = apply_start_override(&tasks(), "B", 18.0, 20.0, 0.5).unwrap();
        assert_eq!(moved[1].start(), Some(12.0));

        let early = apply_start_override(&tasks(), "B", -3.0, 20.0, 0.5).unwrap();
        assert_eq!(early[1].start(), Some(0.0));
    }

    #[test]
    fn test_override_errors() {
        assert_eq!(
            apply_start_override(&tasks(), "Z", 1.0, 20.0, 0.5).unwrap_err(),
            PlanError::UnknownTask("Z".into())
        );
        assert_eq!(
            apply_start_override(&tasks(), "A", f64::NAN, 20.0, 0.5).unwrap_err(),
            PlanError::InvalidStart("A".into())
        );
    }

    #[test]
    fn test_override_leaves_input_alone() {
        let original = tasks();
        let _ = apply_start_override(&original, "A", 3.0, 20.0, 0.5).unwrap();
        assert_eq!(original[0].start(), Some(0.0));
    }
}
