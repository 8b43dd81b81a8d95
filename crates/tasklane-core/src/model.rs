use crate::id::{ActivityId, ProjectId, TaskId, UserId};
use crate::stats::ProjectStats;
use crate::status::TaskStatus;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A task row as returned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Identifier of the task.
    pub id: TaskId,
    /// Project the task belongs to.
    pub project_id: ProjectId,
    /// User owning the task.
    pub owner: UserId,
    /// Human-readable title.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Workflow status.
    pub status: TaskStatus,
    /// Creation timestamp assigned by the store.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Last modification timestamp assigned by the store.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
    /// Optional due date.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub due_date: Option<OffsetDateTime>,
    /// Set while the task is `done`.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
    /// Optional reminder.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub reminder_at: Option<OffsetDateTime>,
    /// Persisted position within the project, once the list was reordered.
    #[serde(default)]
    pub order_index: Option<u32>,
}

/// Insert request for a task. The store assigns id and timestamps.
#[derive(Debug, Clone)]
pub struct NewTask {
    /// Owning project.
    pub project_id: ProjectId,
    /// Owning user.
    pub owner: UserId,
    /// Title (validated non-empty by callers).
    pub title: String,
    /// Description (validated non-empty by callers).
    pub description: String,
    /// Initial status.
    pub status: TaskStatus,
    /// Optional due date.
    pub due_date: Option<OffsetDateTime>,
    /// Optional reminder.
    pub reminder_at: Option<OffsetDateTime>,
}

/// Partial update for a task row.
///
/// Outer `None` leaves a field untouched; `Some(None)` clears an optional field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskChanges {
    /// New title.
    pub title: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New status.
    pub status: Option<TaskStatus>,
    /// New due date.
    pub due_date: Option<Option<OffsetDateTime>>,
    /// New completion timestamp.
    pub completed_at: Option<Option<OffsetDateTime>>,
    /// New reminder.
    pub reminder_at: Option<Option<OffsetDateTime>>,
}

impl TaskChanges {
    /// Write the provided fields onto `task`.
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title.clone_from(title);
        }
        if let Some(description) = &self.description {
            task.description.clone_from(description);
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        if let Some(completed_at) = self.completed_at {
            task.completed_at = completed_at;
        }
        if let Some(reminder_at) = self.reminder_at {
            task.reminder_at = reminder_at;
        }
    }
}

/// A project row. `tasks` is only populated by queries that join them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Identifier of the project.
    pub id: ProjectId,
    /// Owning user; projects are invisible to everyone else.
    pub owner: UserId,
    /// Project title.
    pub title: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Creation timestamp assigned by the store.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Last modification timestamp assigned by the store.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
    /// Loaded tasks.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tasks: Vec<Task>,
}

impl Project {
    /// Aggregate statistics over the loaded tasks.
    #[must_use]
    pub fn stats(&self) -> ProjectStats {
        ProjectStats::from_tasks(&self.tasks)
    }
}

/// Insert request for a project.
#[derive(Debug, Clone)]
pub struct NewProject {
    /// Owning user.
    pub owner: UserId,
    /// Project title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
}

/// Partial update for a project row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectChanges {
    /// New title.
    pub title: Option<String>,
    /// New description (`Some(None)` clears it).
    pub description: Option<Option<String>>,
}

impl ProjectChanges {
    /// Returns true when no field would change.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none()
    }

    /// Write the provided fields onto `project`.
    pub fn apply_to(&self, project: &mut Project) {
        if let Some(title) = &self.title {
            project.title.clone_from(title);
        }
        if let Some(description) = &self.description {
            project.description.clone_from(description);
        }
    }
}

/// Kind of an audit record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    /// A task was created.
    TaskCreate,
    /// A task was edited.
    TaskUpdate,
    /// A task was deleted.
    TaskDelete,
    /// A project was edited.
    ProjectUpdate,
}

impl ActivityKind {
    /// Name used by the store.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TaskCreate => "task_create",
            Self::TaskUpdate => "task_update",
            Self::TaskDelete => "task_delete",
            Self::ProjectUpdate => "project_update",
        }
    }
}

/// Append-only audit record written as a side effect of mutations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    /// Identifier of the record.
    pub id: ActivityId,
    /// What happened.
    pub kind: ActivityKind,
    /// User who caused it.
    pub owner: UserId,
    /// Project the activity belongs to.
    pub project_id: ProjectId,
    /// Task involved, if it still exists.
    #[serde(default)]
    pub task_id: Option<TaskId>,
    /// Project title at the time of the activity.
    pub project_title: String,
    /// Task title at the time of the activity.
    #[serde(default)]
    pub task_title: Option<String>,
    /// Status before an update.
    #[serde(default)]
    pub old_status: Option<TaskStatus>,
    /// Status after an update.
    #[serde(default)]
    pub new_status: Option<TaskStatus>,
    /// Creation timestamp assigned by the store.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Activity {
    /// One-line description for activity feeds.
    #[must_use]
    pub fn describe(&self) -> String {
        let task = self.task_title.as_deref().unwrap_or("untitled");
        match self.kind {
            ActivityKind::TaskCreate => {
                format!("Created task \"{task}\" in project \"{}\"", self.project_title)
            }
            ActivityKind::TaskUpdate => format!(
                "Updated task \"{task}\" from {} to {}",
                status_label(self.old_status),
                status_label(self.new_status)
            ),
            ActivityKind::TaskDelete => {
                format!("Deleted task from project \"{}\"", self.project_title)
            }
            ActivityKind::ProjectUpdate => format!("Updated project \"{}\"", self.project_title),
        }
    }
}

fn status_label(status: Option<TaskStatus>) -> &'static str {
    status.map_or("unknown", TaskStatus::label)
}

/// Insert request for an activity record.
#[derive(Debug, Clone)]
pub struct NewActivity {
    /// What happened.
    pub kind: ActivityKind,
    /// User who caused it.
    pub owner: UserId,
    /// Project the activity belongs to.
    pub project_id: ProjectId,
    /// Task involved, if any.
    pub task_id: Option<TaskId>,
    /// Project title.
    pub project_title: String,
    /// Task title.
    pub task_title: Option<String>,
    /// Status before an update.
    pub old_status: Option<TaskStatus>,
    /// Status after an update.
    pub new_status: Option<TaskStatus>,
}
