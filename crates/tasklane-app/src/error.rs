use anyhow::Error;
use tasklane_core::{MoveError, ProjectId, TaskId};

/// Errors surfaced by [`TaskListController`](crate::task_list::TaskListController)
/// and [`ProjectService`](crate::service::ProjectService).
///
/// Every variant is recoverable by retrying the user action.
#[derive(thiserror::Error, Debug)]
pub enum TaskError {
    /// No live session.
    #[error("not authenticated")]
    Unauthenticated,
    /// The project belongs to another user.
    #[error("access to project {0} denied")]
    AccessDenied(ProjectId),
    /// Referenced project does not exist.
    #[error("project {0} not found")]
    ProjectNotFound(ProjectId),
    /// Referenced task is not part of the open project.
    #[error("task {0} not found")]
    TaskNotFound(TaskId),
    /// Input failed validation; nothing was written.
    #[error("{0}")]
    Validation(String),
    /// Reorder indices out of bounds.
    #[error("invalid move: {0}")]
    InvalidMove(#[from] MoveError),
    /// No project has been loaded (or the view was closed).
    #[error("no project loaded")]
    NotLoaded,
    /// Backing store returned an error.
    #[error("store error: {0}")]
    Store(#[from] Error),
}

impl TaskError {
    pub(crate) fn store<E: Into<Error>>(err: E) -> Self {
        Self::Store(err.into())
    }
}

/// Reject blank required text fields.
pub(crate) fn require_text(field: &str, value: &str) -> Result<(), TaskError> {
    if value.trim().is_empty() {
        return Err(TaskError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}
