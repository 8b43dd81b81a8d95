//! Error types for tasklane JSON store operations.

use tasklane_core::{ProjectId, TaskId};
use thiserror::Error;

/// Errors that can occur during `JsonStore` operations.
#[derive(Error, Debug)]
pub enum JsonStoreError {
    /// Project row does not exist.
    #[error("Project not found: {0}")]
    ProjectNotFound(ProjectId),

    /// Task row does not exist.
    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),

    /// Store document could not be parsed.
    #[error("Failed to parse store document {path}: {source}")]
    Parse {
        /// File being read.
        path: String,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// Store document could not be serialized.
    #[error("Failed to serialize store document: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Failed to acquire the table lock.
    #[error("Store lock error")]
    LockError,

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Other unclassified error.
    #[error("Other error: {0}")]
    Other(String),
}
