//! Capacity conflict detection.
//!
//! # Algorithm
//!
//! Sweep line over task start/end events:
//! 1. Emit one `start` and one `end` event per task with a valid timeline.
//! 2. Sort by time; at equal timestamps `end` precedes `start`, so a task
//!    ending exactly when another begins does not overlap it.
//! 3. Between consecutive distinct timestamps, every resource whose running
//!    usage exceeds its capacity yields a [`ConflictInterval`].
//! 4. Culprits are the tasks strictly overlapping the interval that hold
//!    the violated resource.
//!
//! # Complexity
//! O(n log n + e * r + c * n) for n tasks, e events, r resources, c conflicts.

use std::collections::{BTreeMap, BTreeSet};

use crate::models::{Capacity, ConflictInterval, Task};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum EventKind {
    End,
    Start,
}

struct Event<'a> {
    time: f64,
    kind: EventKind,
    task: &'a Task,
}

/// Finds every window where some resource is over capacity.
///
/// Tasks without a valid timeline are ignored. Output order follows time,
/// then resource name, but callers should treat it as unordered.
pub fn detect_conflicts(tasks: &[Task], capacity: &Capacity) -> Vec<ConflictInterval> {
    let resources: BTreeSet<&str> = tasks
        .iter()
        .flat_map(|t| t.requirements.keys().map(String::as_str))
        .collect();
    if resources.is_empty() {
        return Vec::new();
    }

    let mut events: Vec<Event<'_>> = Vec::with_capacity(tasks.len() * 2);
    for task in tasks {
        let Some(tl) = task.valid_timeline() else {
            continue;
        };
        events.push(Event {
            time: tl.start,
            kind: EventKind::Start,
            task,
        });
        events.push(Event {
            time: tl.end,
            kind: EventKind::End,
            task,
        });
    }
    events.sort_by(|a, b| a.time.total_cmp(&b.time).then(a.kind.cmp(&b.kind)));

    let mut usage: BTreeMap<&str, i64> = resources.iter().map(|r| (*r, 0)).collect();
    let mut prev_time: Option<f64> = None;
    let mut intervals = Vec::new();

    for event in &events {
        if let Some(prev) = prev_time {
            if prev < event.time {
                for (&resource, &current) in &usage {
                    let cap = capacity.of(resource);
                    if current > i64::from(cap) {
                        intervals.push(ConflictInterval {
                            resource: resource.to_string(),
                            start: prev,
                            end: event.time,
                            usage: u32::try_from(current).unwrap_or(u32::MAX),
                            capacity: cap,
                            culprits: Vec::new(),
                        });
                    }
                }
            }
        }

        for (resource, &quantity) in &event.task.requirements {
            if let Some(current) = usage.get_mut(resource.as_str()) {
                match event.kind {
                    EventKind::Start => *current += i64::from(quantity),
                    EventKind::End => *current -= i64::from(quantity),
                }
            }
        }
        prev_time = Some(event.time);
    }

    for interval in &mut intervals {
        interval.culprits = culprits_of(tasks, &interval.resource, interval.start, interval.end);
    }
    intervals
}

fn culprits_of(tasks: &[Task], resource: &str, start: f64, end: f64) -> Vec<String> {
    tasks
        .iter()
        .filter(|t| t.demands(resource))
        .filter(|t| t.valid_timeline().is_some_and(|tl| tl.overlaps(start, end)))
        .map(|t| t.id.clone())
        .collect()
}

/// Total severity: `Σ (usage - capacity) * duration`.
pub fn severity(conflicts: &[ConflictInterval]) -> f64 {
    conflicts.iter().map(ConflictInterval::score).sum()
}

/// Maximum concurrent demand for `resource` across the whole timeline.
///
/// Demand is sampled at the midpoint of every pair of consecutive task
/// boundaries, with the same half-open semantics as conflict detection.
pub fn peak_usage(tasks: &[Task], resource: &str) -> u32 {
    let mut points: Vec<f64> = tasks
        .iter()
        .filter_map(Task::valid_timeline)
        .flat_map(|tl| [tl.start, tl.end])
        .collect();
    points.sort_by(f64::total_cmp);
    points.dedup();

    points
        .windows(2)
        .map(|pair| {
            let mid = (pair[0] + pair[1]) / 2.0;
            tasks
                .iter()
                .filter(|t| t.valid_timeline().is_some_and(|tl| tl.contains(mid)))
                .map(|t| t.requirement(resource))
                .sum::<u32>()
        })
        .max()
        .unwrap_or(0)
}
