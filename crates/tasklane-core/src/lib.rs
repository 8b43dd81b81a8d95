//! Domain types for tasklane: projects, tasks, activities, ordering and stats.

/// Identifier types.
pub mod id;
/// Rows and mutation requests.
pub mod model;
/// List ordering primitives.
pub mod order;
/// Aggregated project statistics.
pub mod stats;
/// Task workflow status.
pub mod status;

pub use id::{ActivityId, ProjectId, TaskId, UserId};
pub use model::{
    Activity, ActivityKind, NewActivity, NewProject, NewTask, Project, ProjectChanges, Task,
    TaskChanges,
};
pub use order::{MoveError, move_item, order_assignments, sort_tasks};
pub use stats::ProjectStats;
pub use status::{ParseStatusError, TaskStatus};
