//! Application layer for tasklane.
//!
//! This crate provides the task list controller, the project dashboard
//! service, session handling, and configuration shared by frontends.

pub mod activity;
pub mod async_store;
pub mod config;
pub mod error;
pub mod filter;
pub mod sequence;
pub mod service;
pub mod session;
pub mod task_list;
pub mod task_patch;

// Re-exports for convenience
pub use activity::ActivityLog;
pub use async_store::TaskStore;
pub use config::AppConfig;
pub use error::TaskError;
pub use filter::{StatusFilter, TimestampError, normalize_timestamp, parse_timestamp};
pub use sequence::SequenceTracker;
pub use service::{CompletedTask, ProjectEdit, ProjectService};
pub use session::{Session, resolve_user};
pub use task_list::{ControllerOptions, Reconciled, TaskListController};
pub use task_patch::{NewTaskInput, TaskEdit};
