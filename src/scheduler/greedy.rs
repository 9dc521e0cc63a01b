//! Capacity-aware greedy forward scheduler.
//!
//! # Algorithm
//!
//! 1. Sort tasks by baseline start, ties broken by group ID.
//! 2. For each task, `earliest = max(baseline start, latest dependency end)`.
//! 3. Try starts on the granularity grid from `earliest` up to
//!    `earliest + slack`; commit the first one where capacity holds at every
//!    change-point midpoint against the tasks placed so far.
//! 4. If no start fits, place at `earliest` anyway so dependents are not
//!    blocked. The residual conflict is left for the leveler.
//!
//! # Complexity
//! O(n * s * p) where n=tasks, s=candidate starts per task, p=placed tasks.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, trace};

use super::{round_up, EPSILON};
use crate::config::{normalize_granularity, SchedulerConfig, DEFAULT_GRANULARITY};
use crate::models::{namespace_id, Capacity, Task};

/// An already-committed interval and what it holds.
#[derive(Debug, Clone)]
struct Placed {
    start: f64,
    end: f64,
    requirements: BTreeMap<String, u32>,
}

impl Placed {
    #[inline]
    fn overlaps(&self, start: f64, end: f64) -> bool {
        self.start.max(start) < self.end.min(end)
    }
}

/// Greedy forward placement honoring dependencies, slack, and capacity.
///
/// # Example
///
/// ```
/// use mise_schedule::models::{Capacity, Task};
/// use mise_schedule::scheduler::GreedyScheduler;
///
/// let tasks = vec![
///     Task::new("chop").with_timeline(0.0, 10.0).with_requirement("hands", 1),
///     Task::new("knead")
///         .with_timeline(5.0, 15.0)
///         .with_requirement("hands", 1)
///         .with_slack(10.0),
/// ];
/// let placed = GreedyScheduler::new().schedule(&tasks, &Capacity::new());
/// assert_eq!(placed[1].start(), Some(10.0));
/// ```
#[derive(Debug, Clone)]
pub struct GreedyScheduler {
    granularity: f64,
}

impl GreedyScheduler {
    /// Creates a scheduler with the default 0.5 minute granularity.
    pub fn new() -> Self {
        Self {
            granularity: DEFAULT_GRANULARITY,
        }
    }

    /// Creates a scheduler from shared options.
    pub fn from_config(config: &SchedulerConfig) -> Self {
        Self::new().with_granularity(config.granularity)
    }

    /// Sets the candidate start step (minutes).
    pub fn with_granularity(mut self, granularity: f64) -> Self {
        self.granularity = granularity;
        self
    }

    /// Places every task and returns the new task set in placement order.
    ///
    /// Tasks without a valid timeline are kept, unplaced, at the end.
    pub fn schedule(&self, tasks: &[Task], capacity: &Capacity) -> Vec<Task> {
        let step = normalize_granularity(self.granularity);
        let mut tasks = tasks.to_vec();
        tasks.sort_by(|a, b| {
            let a_start = a.start().unwrap_or(f64::INFINITY);
            let b_start = b.start().unwrap_or(f64::INFINITY);
            a_start
                .total_cmp(&b_start)
                .then_with(|| a.group_id.cmp(&b.group_id))
        });

        let index: HashMap<String, usize> = tasks
            .iter()
            .enumerate()
            .map(|(i, t)| (t.id.clone(), i))
            .collect();

        debug!(tasks = tasks.len(), granularity = step, "greedy placement started");

        let mut placed: Vec<Placed> = Vec::with_capacity(tasks.len());
        let mut fallbacks = 0usize;

        for i in 0..tasks.len() {
            let Some(baseline) = tasks[i].valid_timeline() else {
                trace!(task = %tasks[i].id, "skipping task without timeline");
                continue;
            };
            let duration = tasks[i].duration();
            let slack = tasks[i].effective_slack();

            let deps: Vec<usize> = resolve_dependencies(&tasks[i], &index);
            let deps_ready = if deps.is_empty() {
                0.0
            } else {
                deps.iter()
                    .map(|&j| tasks[j].end().unwrap_or(0.0))
                    .fold(f64::NEG_INFINITY, f64::max)
            };
            let earliest = baseline.start.max(deps_ready);
            let latest = earliest + slack;

            let requirements = &tasks[i].requirements;
            let mut chosen = None;
            let mut start = round_up(earliest, step);
            while start <= latest + EPSILON {
                if fits(&placed, start, start + duration, requirements, capacity) {
                    chosen = Some(start);
                    break;
                }
                let next = round_up(start + step, step);
                if next <= start {
                    // step is below float resolution at this magnitude
                    break;
                }
                start = next;
            }

            let start = match chosen {
                Some(start) => start,
                None => {
                    fallbacks += 1;
                    debug!(task = %tasks[i].id, earliest, "no feasible start within slack, placing at earliest");
                    earliest
                }
            };

            tasks[i].place_at(start);
            trace!(task = %tasks[i].id, start, end = start + duration, "placed");
            placed.push(Placed {
                start,
                end: start + duration,
                requirements: tasks[i].requirements.clone(),
            });
        }

        debug!(placed = placed.len(), fallbacks, "greedy placement finished");
        tasks
    }
}

impl Default for GreedyScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves a task's dependency IDs into positions of the working set.
///
/// Unqualified IDs are assumed to belong to the task's own group.
/// Dependencies outside the set are dropped.
fn resolve_dependencies(task: &Task, index: &HashMap<String, usize>) -> Vec<usize> {
    task.dependencies
        .iter()
        .filter_map(|dep| {
            let qualified = if task.group_id.is_empty() {
                dep.clone()
            } else {
                namespace_id(&task.group_id, dep)
            };
            index.get(&qualified).copied()
        })
        .collect()
}

/// Whether a candidate `[start, end)` fits under capacity.
///
/// Samples usage at the midpoint of every consecutive pair of change
/// points inside the window: the window bounds plus the boundaries of
/// placed intervals overlapping it.
fn fits(
    placed: &[Placed],
    start: f64,
    end: f64,
    requirements: &BTreeMap<String, u32>,
    capacity: &Capacity,
) -> bool {
    let mut points = vec![start, end];
    for p in placed.iter().filter(|p| p.overlaps(start, end)) {
        points.extend([p.start, p.end].into_iter().filter(|&t| start < t && t < end));
    }
    points.sort_by(f64::total_cmp);
    points.dedup();

    for pair in points.windows(2) {
        let mid = (pair[0] + pair[1]) / 2.0;
        let mut usage: BTreeMap<&str, u32> = BTreeMap::new();
        for p in placed.iter().filter(|p| p.start <= mid && mid < p.end) {
            for (resource, &quantity) in &p.requirements {
                *usage.entry(resource.as_str()).or_insert(0) += quantity;
            }
        }
        for (resource, &quantity) in requirements {
            *usage.entry(resource.as_str()).or_insert(0) += quantity;
        }
        if usage
            .iter()
            .any(|(resource, &total)| total > capacity.of(resource))
        {
            return false;
        }
    }
    true
}
