use tasklane_core::{NewTask, ProjectId, Task, TaskChanges, TaskStatus, UserId};
use time::OffsetDateTime;

use crate::error::{TaskError, require_text};

/// User input for creating a task in the open project.
#[derive(Debug, Clone, Default)]
pub struct NewTaskInput {
    /// Task title; required.
    pub title: String,
    /// Task description; required.
    pub description: String,
    /// Initial status.
    pub status: TaskStatus,
    /// Optional due date.
    pub due_date: Option<OffsetDateTime>,
    /// Optional reminder.
    pub reminder_at: Option<OffsetDateTime>,
}

impl NewTaskInput {
    /// Input with the given title and description and default status.
    #[must_use]
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            ..Self::default()
        }
    }

    /// Validate and build the insert request for `project`.
    ///
    /// # Errors
    /// Returns [`TaskError::Validation`] when title or description is blank.
    pub fn into_new_task(self, project_id: ProjectId, owner: UserId) -> Result<NewTask, TaskError> {
        require_text("title", &self.title)?;
        require_text("description", &self.description)?;
        Ok(NewTask {
            project_id,
            owner,
            title: self.title.trim().to_owned(),
            description: self.description.trim().to_owned(),
            status: self.status,
            due_date: self.due_date,
            reminder_at: self.reminder_at,
        })
    }
}

/// Partial edit of an existing task.
#[derive(Debug, Clone, Default)]
pub struct TaskEdit {
    /// New title; must not be blank when provided.
    pub title: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New status.
    pub status: Option<TaskStatus>,
    /// New due date; `Some(None)` clears it.
    pub due_date: Option<Option<OffsetDateTime>>,
    /// New reminder; `Some(None)` clears it.
    pub reminder_at: Option<Option<OffsetDateTime>>,
}

impl TaskEdit {
    /// Returns true when the edit carries no field.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.due_date.is_none()
            && self.reminder_at.is_none()
    }

    /// Translate the edit into store changes against `current`.
    ///
    /// Entering `done` stamps `completed_at` with `now`, leaving it clears the
    /// stamp. A task that stays `done` keeps its original stamp. Clearing the
    /// due date also clears a reminder the edit does not set.
    ///
    /// # Errors
    /// Returns [`TaskError::Validation`] when the title is blank or the edit is empty.
    pub fn plan(&self, current: &Task, now: OffsetDateTime) -> Result<TaskChanges, TaskError> {
        if self.is_empty() {
            return Err(TaskError::Validation("no changes provided".into()));
        }
        if let Some(title) = &self.title {
            require_text("title", title)?;
        }

        let mut changes = TaskChanges {
            title: self.title.as_deref().map(|title| title.trim().to_owned()),
            description: self.description.clone(),
            status: self.status,
            due_date: self.due_date,
            completed_at: None,
            reminder_at: self.reminder_at,
        };

        if self.due_date == Some(None) && self.reminder_at.is_none() && current.reminder_at.is_some() {
            changes.reminder_at = Some(None);
        }

        if let Some(status) = self.status {
            if status.is_done() {
                if !current.status.is_done() || current.completed_at.is_none() {
                    changes.completed_at = Some(Some(now));
                }
            } else if current.completed_at.is_some() {
                changes.completed_at = Some(None);
            }
        }
        Ok(changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tasklane_core::TaskId;

    fn ts(secs: i64) -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(secs)
            .unwrap_or_else(|err| panic!("must convert unix timestamp: {err}"))
    }

    fn task(status: TaskStatus, completed_at: Option<OffsetDateTime>) -> Task {
        Task {
            id: TaskId::new(),
            project_id: ProjectId::new(),
            owner: UserId::from("alice"),
            title: "t".into(),
            description: "d".into(),
            status,
            created_at: ts(0),
            updated_at: None,
            due_date: None,
            completed_at,
            reminder_at: None,
            order_index: None,
        }
    }

    fn status_edit(status: TaskStatus) -> TaskEdit {
        TaskEdit {
            status: Some(status),
            ..TaskEdit::default()
        }
    }

    #[test]
    fn entering_done_stamps_completion() -> Result<(), TaskError> {
        let changes = status_edit(TaskStatus::Done).plan(&task(TaskStatus::Todo, None), ts(10))?;
        assert_eq!(changes.status, Some(TaskStatus::Done));
        assert_eq!(changes.completed_at, Some(Some(ts(10))));
        Ok(())
    }

    #[test]
    fn staying_done_keeps_original_stamp() -> Result<(), TaskError> {
        let current = task(TaskStatus::Done, Some(ts(5)));
        let changes = status_edit(TaskStatus::Done).plan(&current, ts(10))?;
        assert_eq!(changes.completed_at, None);
        Ok(())
    }

    #[test]
    fn leaving_done_clears_stamp() -> Result<(), TaskError> {
        let current = task(TaskStatus::Done, Some(ts(5)));
        let changes = status_edit(TaskStatus::InProgress).plan(&current, ts(10))?;
        assert_eq!(changes.completed_at, Some(None));

        let untouched = status_edit(TaskStatus::InProgress).plan(&task(TaskStatus::Todo, None), ts(10))?;
        assert_eq!(untouched.completed_at, None);
        Ok(())
    }

    #[test]
    fn reminder_can_be_moved_and_follows_cleared_due_date() -> Result<(), TaskError> {
        let mut current = task(TaskStatus::Todo, None);
        current.due_date = Some(ts(1_000));
        current.reminder_at = Some(ts(900));

        let moved = TaskEdit {
            reminder_at: Some(Some(ts(800))),
            ..TaskEdit::default()
        }
        .plan(&current, ts(0))?;
        assert_eq!(moved.reminder_at, Some(Some(ts(800))));
        assert_eq!(moved.due_date, None);

        let cleared = TaskEdit {
            due_date: Some(None),
            ..TaskEdit::default()
        }
        .plan(&current, ts(0))?;
        assert_eq!(cleared.reminder_at, Some(None));

        let kept = TaskEdit {
            due_date: Some(None),
            reminder_at: Some(Some(ts(700))),
            ..TaskEdit::default()
        }
        .plan(&current, ts(0))?;
        assert_eq!(kept.reminder_at, Some(Some(ts(700))));
        Ok(())
    }

    #[test]
    fn blank_title_and_empty_edit_are_rejected() {
        let current = task(TaskStatus::Todo, None);
        let blank = TaskEdit {
            title: Some("   ".into()),
            ..TaskEdit::default()
        };
        assert!(matches!(blank.plan(&current, ts(0)), Err(TaskError::Validation(_))));
        assert!(matches!(
            TaskEdit::default().plan(&current, ts(0)),
            Err(TaskError::Validation(_))
        ));
    }

    #[test]
    fn new_task_input_requires_title_and_description() {
        let project = ProjectId::new();
        let owner = UserId::from("alice");

        let Err(err) = NewTaskInput::new("", "body").into_new_task(project, owner.clone()) else {
            panic!("blank title should be rejected");
        };
        assert_eq!(err.to_string(), "title must not be empty");

        let Err(err) = NewTaskInput::new("title", " \n").into_new_task(project, owner.clone()) else {
            panic!("blank description should be rejected");
        };
        assert_eq!(err.to_string(), "description must not be empty");

        let Ok(new) = NewTaskInput::new("  Ship it ", "now").into_new_task(project, owner) else {
            panic!("valid input should pass");
        };
        assert_eq!(new.title, "Ship it");
        assert_eq!(new.status, TaskStatus::Todo);
    }
}
