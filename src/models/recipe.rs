//! Recipe step lists and their merge into one task set.
//!
//! Each recipe numbers its steps independently, so merging several
//! recipes namespaces every step ID as `recipe:step`. Dependencies that
//! are already qualified (contain `:`) are kept as-is; the rest are
//! assumed to point into the same recipe.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

use super::{Task, Timeline};

/// Separator between recipe ID and step ID in merged task IDs.
pub const NAMESPACE_SEPARATOR: char = ':';

/// A recipe as supplied by the document source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Recipe {
    /// Recipe identifier.
    pub id: String,
    /// Display title.
    #[serde(default)]
    pub title: Option<String>,
    /// Steps in document order.
    #[serde(default)]
    pub steps: Vec<RecipeStep>,
}

/// Raw step bounds. Either side may be missing in hand-written documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StepTimeline {
    /// Baseline start (minutes).
    #[serde(default)]
    pub start: Option<f64>,
    /// Baseline end (minutes).
    #[serde(default)]
    pub end: Option<f64>,
}

/// One step of a recipe.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecipeStep {
    /// Step identifier, unique within its recipe.
    pub id: String,
    /// Display label.
    #[serde(default)]
    pub label: Option<String>,
    /// Explicit duration (minutes).
    #[serde(default)]
    pub time: Option<f64>,
    /// Baseline interval.
    #[serde(default)]
    pub timeline: Option<StepTimeline>,
    /// Resource requirements.
    #[serde(default)]
    pub req: BTreeMap<String, u32>,
    /// Step IDs this step waits on.
    #[serde(default)]
    pub after: Vec<String>,
    /// Permitted delay (minutes).
    #[serde(default)]
    pub slack: Option<f64>,
    /// Leveling priority.
    #[serde(default)]
    pub priority: Option<i32>,
}

impl Recipe {
    /// Creates an empty recipe.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Sets the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Appends a step.
    pub fn with_step(mut self, step: RecipeStep) -> Self {
        self.steps.push(step);
        self
    }

    fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.id)
    }
}

impl RecipeStep {
    /// Creates a step spanning `[start, end)`.
    pub fn new(id: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            id: id.into(),
            timeline: Some(StepTimeline {
                start: Some(start),
                end: Some(end),
            }),
            ..Self::default()
        }
    }

    /// Sets the label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Adds a resource requirement.
    pub fn with_req(mut self, resource: impl Into<String>, quantity: u32) -> Self {
        self.req.insert(resource.into(), quantity);
        self
    }

    /// Adds a dependency.
    pub fn after(mut self, step_id: impl Into<String>) -> Self {
        self.after.push(step_id.into());
        self
    }

    /// Sets the slack.
    pub fn with_slack(mut self, slack: f64) -> Self {
        self.slack = Some(slack);
        self
    }

    fn bounds(&self) -> Option<(f64, f64)> {
        let tl = self.timeline?;
        match (tl.start, tl.end) {
            (Some(start), Some(end)) if start.is_finite() && end.is_finite() => Some((start, end)),
            _ => None,
        }
    }
}

/// Qualifies `dep` with `group_id` unless it is already namespaced.
pub fn namespace_id(group_id: &str, dep: &str) -> String {
    if dep.contains(NAMESPACE_SEPARATOR) {
        dep.to_string()
    } else {
        format!("{group_id}{NAMESPACE_SEPARATOR}{dep}")
    }
}

/// Merges recipes into a single namespaced task set.
///
/// Duplicate recipe IDs are merged once (first occurrence wins). Steps
/// without a numeric timeline are dropped.
pub fn merge_recipes(recipes: &[Recipe]) -> Vec<Task> {
    let mut seen = HashSet::new();
    let mut merged = Vec::new();

    for recipe in recipes {
        if !seen.insert(recipe.id.as_str()) {
            debug!(recipe = %recipe.id, "skipping duplicate recipe");
            continue;
        }
        let title = recipe.display_title();

        for step in &recipe.steps {
            let Some((start, end)) = step.bounds() else {
                debug!(recipe = %recipe.id, step = %step.id, "skipping step without timeline");
                continue;
            };
            let label = step.label.as_deref().unwrap_or(&step.id);

            merged.push(Task {
                id: namespace_id(&recipe.id, &step.id),
                group_id: recipe.id.clone(),
                label: format!("[{title}] {label}"),
                timeline: Some(Timeline::new(start, end)),
                duration: Some(step.time.unwrap_or((end - start).max(0.0))),
                requirements: step.req.clone(),
                dependencies: step
                    .after
                    .iter()
                    .map(|dep| namespace_id(&recipe.id, dep))
                    .collect(),
                slack: step.slack.filter(|s| s.is_finite()).unwrap_or(0.0),
                priority: step.priority.unwrap_or(0),
                pinned: false,
            });
        }
    }

    debug!(recipes = seen.len(), tasks = merged.len(), "merged recipes");
    merged
}
