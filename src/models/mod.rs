//! Kitchen scheduling domain models.
//!
//! Provides the data types the scheduling passes read and produce.
//!
//! | Type | Meaning |
//! |------|---------|
//! | Task | One cooking step with a timeline, resource demand, and dependencies |
//! | Capacity | Ceiling per shared resource (stove, hands, oven) |
//! | ConflictInterval | A window where demand exceeds capacity |
//! | Plan | Scheduled tasks plus residual conflicts |
//! | Recipe | Source step list, merged into namespaced tasks |

mod capacity;
mod plan;
mod recipe;
mod task;

pub use capacity::{Capacity, DEFAULT_CAPACITY};
pub use plan::{ConflictInterval, Plan};
pub use recipe::{merge_recipes, namespace_id, Recipe, RecipeStep, StepTimeline, NAMESPACE_SEPARATOR};
pub use task::{Task, Timeline};
