//! Kitchen task scheduling.
//!
//! Plans cooking steps from one or more recipes that compete for a few
//! shared, capacity-limited resources (burners, hands, oven slots),
//! subject to dependencies and per-step slack.
//!
//! # Modules
//!
//! - **`models`**: Domain types — `Task`, `Timeline`, `Capacity`,
//!   `ConflictInterval`, `Plan`, `Recipe`
//! - **`scheduler`**: Conflict detection, greedy forward placement,
//!   backward and iterative leveling, the combined `Pipeline`, manual
//!   overrides, and KPIs
//! - **`config`**: `SchedulerConfig` with named, defaulted options
//! - **`validation`**: Optional input checks (duplicate IDs, cycles, timelines)
//! - **`error`**: `PlanError` for caller-driven edits
//!
//! # Example
//!
//! ```
//! use mise_schedule::config::SchedulerConfig;
//! use mise_schedule::models::{merge_recipes, Capacity, Recipe, RecipeStep};
//! use mise_schedule::scheduler::Pipeline;
//!
//! let recipes = vec![
//!     Recipe::new("rice").with_step(RecipeStep::new("cook", 0.0, 20.0).with_req("stove", 1)),
//!     Recipe::new("soup").with_step(
//!         RecipeStep::new("simmer", 0.0, 15.0).with_req("stove", 1).with_slack(30.0),
//!     ),
//! ];
//! let tasks = merge_recipes(&recipes);
//! let plan = Pipeline::new(SchedulerConfig::default()).run(&tasks, &Capacity::kitchen());
//! assert!(plan.is_feasible());
//! assert_eq!(plan.task("soup:simmer").and_then(|t| t.start()), Some(20.0));
//! ```
//!
//! # References
//!
//! - Kahn (1962), "Topological sorting of large networks"
//! - Kolisch (1996), "Serial and parallel resource-constrained project scheduling methods revisited"

pub mod config;
pub mod error;
pub mod models;
pub mod scheduler;
pub mod validation;
