//! Best-effort audit trail written as a side effect of mutations.

use tasklane_core::{ActivityKind, NewActivity, Project, Task, TaskStatus, UserId};
use tracing::{debug, warn};

use crate::async_store::TaskStore;

/// Writes activity records; failures never reach the caller.
#[derive(Debug, Clone, Copy)]
pub struct ActivityLog {
    enabled: bool,
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl ActivityLog {
    /// Logger that writes only when `enabled`.
    #[must_use]
    pub const fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Insert `activity`, logging and swallowing any store error.
    pub async fn record<S: TaskStore>(&self, store: &S, activity: NewActivity) {
        if !self.enabled {
            return;
        }
        let kind = activity.kind;
        match store.insert_activity(activity).await {
            Ok(row) => debug!(kind = kind.as_str(), id = %row.id, "Recorded activity"),
            Err(err) => {
                let err: anyhow::Error = err.into();
                warn!(kind = kind.as_str(), "Failed to record activity: {err:#}");
            }
        }
    }
}

fn base(kind: ActivityKind, owner: &UserId, project: &Project) -> NewActivity {
    NewActivity {
        kind,
        owner: owner.clone(),
        project_id: project.id,
        task_id: None,
        project_title: project.title.clone(),
        task_title: None,
        old_status: None,
        new_status: None,
    }
}

/// `task_create` record.
#[must_use]
pub fn task_created(owner: &UserId, project: &Project, task: &Task) -> NewActivity {
    NewActivity {
        task_id: Some(task.id),
        task_title: Some(task.title.clone()),
        new_status: Some(task.status),
        ..base(ActivityKind::TaskCreate, owner, project)
    }
}

/// `task_update` record carrying the status transition.
#[must_use]
pub fn task_updated(
    owner: &UserId,
    project: &Project,
    task: &Task,
    old_status: TaskStatus,
) -> NewActivity {
    NewActivity {
        task_id: Some(task.id),
        task_title: Some(task.title.clone()),
        old_status: Some(old_status),
        new_status: Some(task.status),
        ..base(ActivityKind::TaskUpdate, owner, project)
    }
}

/// `task_delete` record. The task row is gone, so only its title is kept.
#[must_use]
pub fn task_deleted(owner: &UserId, project: &Project, task: &Task) -> NewActivity {
    NewActivity {
        task_title: Some(task.title.clone()),
        old_status: Some(task.status),
        ..base(ActivityKind::TaskDelete, owner, project)
    }
}

/// `project_update` record.
#[must_use]
pub fn project_updated(owner: &UserId, project: &Project) -> NewActivity {
    base(ActivityKind::ProjectUpdate, owner, project)
}
