//! Input validation for task sets.
//!
//! The scheduling passes are tolerant: they skip malformed tasks and
//! silently leave cyclic tasks in place. Callers that want to reject bad
//! input up front can run [`validate_tasks`] first. Detects:
//! - Duplicate task IDs
//! - Dependencies on unknown tasks
//! - Circular dependencies, reported as the task chain that loops
//! - Missing, non-numeric, or inverted timelines
//! - Negative or non-finite slack
//! - Zero capacities
//!
//! # Reference
//! Kahn (1962), "Topological sorting of large networks"

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::models::{Capacity, Task};
use crate::scheduler::topological_order;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two tasks share the same ID.
    DuplicateId,
    /// A task depends on an ID that is not in the set.
    UnknownDependency,
    /// The dependency graph contains a cycle.
    CyclicDependency,
    /// A timeline is missing, non-numeric, or ends before it starts.
    InvalidTimeline,
    /// Slack is negative or not finite.
    InvalidSlack,
    /// A resource has capacity zero.
    ZeroCapacity,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates a task set and its capacity map.
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with every detected issue.
pub fn validate_tasks(tasks: &[Task], capacity: &Capacity) -> ValidationResult {
    let mut errors = Vec::new();

    let mut ids = HashSet::new();
    for task in tasks {
        if !ids.insert(task.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate task ID: {}", task.id),
            ));
        }

        match task.valid_timeline() {
            None => errors.push(ValidationError::new(
                ValidationErrorKind::InvalidTimeline,
                format!("Task '{}' has no numeric timeline", task.id),
            )),
            Some(tl) if tl.end < tl.start => errors.push(ValidationError::new(
                ValidationErrorKind::InvalidTimeline,
                format!("Task '{}' ends before it starts", task.id),
            )),
            Some(_) => {}
        }

        if !task.slack.is_finite() || task.slack < 0.0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidSlack,
                format!("Task '{}' has invalid slack {}", task.id, task.slack),
            ));
        }
    }

    for task in tasks {
        for dep in &task.dependencies {
            if !ids.contains(dep.as_str()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::UnknownDependency,
                    format!("Task '{}' depends on unknown task '{}'", task.id, dep),
                ));
            }
        }
    }

    for (resource, limit) in capacity.iter() {
        if limit == 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::ZeroCapacity,
                format!("Resource '{resource}' has zero capacity"),
            ));
        }
    }

    if let Some(cycle_err) = detect_cycles(tasks) {
        errors.push(cycle_err);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Reports one dependency cycle, named in execution order, if any exists.
///
/// Tasks left out of the topological order each keep at least one
/// prerequisite that is also left out, so following those prerequisites
/// from any of them must come back around.
fn detect_cycles(tasks: &[Task]) -> Option<ValidationError> {
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
    if order.len() == tasks.len() {
        return None;
    }
    let mut ordered = vec![false; tasks.len()];
    for &i in &order {
        ordered[i] = true;
    }

    let first = (0..tasks.len()).find(|&i| !ordered[i])?;
    let mut path = vec![first];
    let mut position: HashMap<usize, usize> = HashMap::from([(first, 0)]);
    let mut current = first;
    loop {
        let next = prerequisites[current].iter().copied().find(|&p| !ordered[p])?;
        if let Some(&at) = position.get(&next) {
            let mut cycle: Vec<&str> = path[at..]
                .iter()
                .rev()
                .map(|&i| tasks[i].id.as_str())
                .collect();
            let closing = cycle[0];
            cycle.push(closing);
            return Some(ValidationError::new(
                ValidationErrorKind::CyclicDependency,
                format!("Circular dependency: {}", cycle.join(" -> ")),
            ));
        }
        position.insert(next, path.len());
        path.push(next);
        current = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tasks() -> Vec<Task> {
        vec![
            Task::new("A").with_timeline(0.0, 5.0).with_requirement("stove", 1),
            Task::new("B")
                .with_timeline(5.0, 9.0)
                .with_dependency("A")
                .with_slack(3.0),
        ]
    }

    fn kinds(errors: &[ValidationError]) -> Vec<ValidationErrorKind> {
        errors.iter().map(|e| e.kind).collect()
    }

    #[test]
    fn test_valid_input() {
        assert!(validate_tasks(&sample_tasks(), &Capacity::kitchen()).is_ok());
    }

    #[test]
    fn test_duplicate_id() {
        let mut tasks = sample_tasks();
        tasks.push(Task::new("A").with_timeline(0.0, 1.0));
        let errors = validate_tasks(&tasks, &Capacity::new()).unwrap_err();
        assert_eq!(kinds(&errors), vec![ValidationErrorKind::DuplicateId]);
        assert_eq!(errors[0].to_string(), "Duplicate task ID: A");
    }

    #[test]
    fn test_unknown_dependency() {
        let tasks = vec![Task::new("A").with_timeline(0.0, 1.0).with_dependency("ghost")];
        let errors = validate_tasks(&tasks, &Capacity::new()).unwrap_err();
        assert_eq!(kinds(&errors), vec![ValidationErrorKind::UnknownDependency]);
    }

    #[test]
    fn test_cyclic_dependency() {
        let tasks = vec![
            Task::new("A").with_timeline(0.0, 1.0).with_dependency("C"),
            Task::new("B").with_timeline(1.0, 2.0).with_dependency("A"),
            Task::new("C").with_timeline(2.0, 3.0).with_dependency("B"),
        ];
        let errors = validate_tasks(&tasks, &Capacity::new()).unwrap_err();
        let cycle = errors
            .iter()
            .find(|e| e.kind == ValidationErrorKind::CyclicDependency)
            .unwrap();
        assert_eq!(cycle.to_string(), "Circular dependency: B -> C -> A -> B");
    }

    #[test]
    fn test_cycle_names_only_looping_tasks() {
        let tasks = vec![
            Task::new("plate").with_timeline(9.0, 10.0).with_dependency("sear"),
            Task::new("sear").with_timeline(0.0, 4.0).with_dependency("rest"),
            Task::new("rest").with_timeline(4.0, 8.0).with_dependency("sear"),
        ];
        let errors = validate_tasks(&tasks, &Capacity::new()).unwrap_err();
        assert_eq!(kinds(&errors), vec![ValidationErrorKind::CyclicDependency]);
        assert_eq!(errors[0].message, "Circular dependency: rest -> sear -> rest");
    }

    #[test]
    fn test_self_dependency_is_a_cycle() {
        let tasks = vec![Task::new("A").with_timeline(0.0, 1.0).with_dependency("A")];
        let errors = validate_tasks(&tasks, &Capacity::new()).unwrap_err();
        assert_eq!(errors[0].message, "Circular dependency: A -> A");
    }

    #[test]
    fn test_no_cycle_in_chain() {
        let tasks = vec![
            Task::new("A").with_timeline(0.0, 1.0),
            Task::new("B").with_timeline(1.0, 2.0).with_dependency("A"),
            Task::new("C").with_timeline(2.0, 3.0).with_dependency("B"),
        ];
        assert!(validate_tasks(&tasks, &Capacity::new()).is_ok());
    }

    #[test]
    fn test_timeline_and_slack_checks() {
        let tasks = vec![
            Task::new("missing"),
            Task::new("inverted").with_timeline(5.0, 2.0),
            Task::new("nan").with_timeline(f64::NAN, 1.0),
            Task::new("late").with_timeline(0.0, 1.0).with_slack(-1.0),
        ];
        let errors = validate_tasks(&tasks, &Capacity::new()).unwrap_err();
        assert_eq!(
            kinds(&errors),
            vec![
                ValidationErrorKind::InvalidTimeline,
                ValidationErrorKind::InvalidTimeline,
                ValidationErrorKind::InvalidTimeline,
                ValidationErrorKind::InvalidSlack,
            ]
        );
    }

    #[test]
    fn test_zero_capacity() {
        let capacity = Capacity::new().with_limit("oven", 0);
        let errors = validate_tasks(&sample_tasks(), &capacity).unwrap_err();
        assert_eq!(kinds(&errors), vec![ValidationErrorKind::ZeroCapacity]);
    }

    #[test]
    fn test_multiple_errors() {
        let tasks = vec![
            Task::new("A").with_dependency("nowhere"),
            Task::new("A").with_timeline(0.0, 1.0),
        ];
        let errors = validate_tasks(&tasks, &Capacity::new()).unwrap_err();
        assert!(errors.len() >= 3);
    }
}
