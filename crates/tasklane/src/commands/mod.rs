use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tasklane_app::{
    AppConfig, ControllerOptions, ProjectService, Session, TaskListController, parse_timestamp,
};
use tasklane_core::{ProjectId, TaskId, TaskStatus};
use tasklane_store_json::JsonStore;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::Command;

mod handlers;

/// Everything a command needs: the opened store, configuration, and session.
pub struct Workspace {
    store: Arc<JsonStore>,
    config: AppConfig,
    session: Session,
}

impl Workspace {
    pub const fn new(store: Arc<JsonStore>, config: AppConfig, session: Session) -> Self {
        Self {
            store,
            config,
            session,
        }
    }

    pub const fn session(&self) -> &Session {
        &self.session
    }

    fn projects(&self) -> ProjectService<Arc<JsonStore>> {
        ProjectService::from_config(Arc::clone(&self.store), &self.config)
    }

    /// Controller with `project` already loaded.
    async fn open_list(&self, project: &str) -> Result<TaskListController<Arc<JsonStore>>> {
        let project = parse_project_id(project)?;
        let controller = TaskListController::with_options(
            Arc::clone(&self.store),
            ControllerOptions::from(&self.config),
        );
        controller.load(&self.session, project).await?;
        Ok(controller)
    }
}

pub async fn run(command: Command, workspace: &Workspace) -> Result<()> {
    match command {
        Command::ProjectNew { title, description } => {
            handlers::project_new(workspace, &title, description.as_deref()).await
        }
        Command::Projects => handlers::projects(workspace).await,
        Command::ProjectEdit {
            project,
            title,
            description,
            clear_description,
        } => {
            let description = if clear_description {
                Some(None)
            } else {
                description.map(Some)
            };
            handlers::project_edit(workspace, &project, title, description).await
        }
        Command::Tasks { project, status } => handlers::tasks(workspace, &project, &status).await,
        Command::Add {
            project,
            title,
            description,
            status,
            due,
            reminder,
        } => {
            let input = tasklane_app::NewTaskInput {
                title,
                description,
                status: parse_status(status.as_deref())?.unwrap_or_default(),
                due_date: parse_optional_timestamp("due", due.as_deref())?,
                reminder_at: parse_optional_timestamp("reminder", reminder.as_deref())?,
            };
            handlers::add(workspace, &project, input).await
        }
        Command::Edit {
            project,
            task,
            title,
            description,
            status,
            due,
            clear_due,
            reminder,
            clear_reminder,
        } => {
            let edit = tasklane_app::TaskEdit {
                title,
                description,
                status: parse_status(status.as_deref())?,
                due_date: parse_clearable_timestamp("due", due.as_deref(), clear_due)?,
                reminder_at: parse_clearable_timestamp("reminder", reminder.as_deref(), clear_reminder)?,
            };
            handlers::edit(workspace, &project, &task, edit).await
        }
        Command::Show { project, task } => handlers::show(workspace, &project, &task).await,
        Command::Rm { project, task } => handlers::remove(workspace, &project, &task).await,
        Command::Mv { project, from, to } => handlers::reorder(workspace, &project, from, to).await,
        Command::Stats { project } => handlers::stats(workspace, &project).await,
        Command::Completed => handlers::completed(workspace).await,
        Command::Recent { limit } => handlers::recent(workspace, limit).await,
    }
}

fn parse_project_id(raw: &str) -> Result<ProjectId> {
    ProjectId::from_str(raw).with_context(|| format!("Invalid project id: {raw}"))
}

fn parse_task_id(raw: &str) -> Result<TaskId> {
    TaskId::from_str(raw).with_context(|| format!("Invalid task id: {raw}"))
}

fn parse_status(raw: Option<&str>) -> Result<Option<TaskStatus>> {
    raw.map(|value| TaskStatus::from_str(value).context("Invalid --status"))
        .transpose()
}

fn parse_optional_timestamp(field: &str, raw: Option<&str>) -> Result<Option<OffsetDateTime>> {
    raw.map(|value| parse_timestamp(value).with_context(|| format!("Invalid --{field}")))
        .transpose()
}

/// `Some(None)` when `clear` is set, so the edit removes the field.
fn parse_clearable_timestamp(
    field: &str,
    raw: Option<&str>,
    clear: bool,
) -> Result<Option<Option<OffsetDateTime>>> {
    if clear {
        return Ok(Some(None));
    }
    Ok(parse_optional_timestamp(field, raw)?.map(Some))
}

fn format_timestamp(ts: OffsetDateTime) -> String {
    ts.format(&Rfc3339).unwrap_or_else(|_| ts.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn status_flag_is_optional() -> Result<()> {
        assert_eq!(parse_status(None)?, None);
        assert_eq!(parse_status(Some("done"))?, Some(TaskStatus::Done));
        let Err(err) = parse_status(Some("blocked")) else {
            panic!("unknown status should be rejected");
        };
        assert!(err.to_string().contains("--status"));
        Ok(())
    }

    #[test]
    fn timestamps_accept_dates() -> Result<()> {
        assert_eq!(
            parse_optional_timestamp("due", Some("2025-04-01"))?,
            Some(datetime!(2025-04-01 00:00 UTC))
        );
        assert!(parse_optional_timestamp("due", Some("soon")).is_err());
        Ok(())
    }

    #[test]
    fn clear_flag_overrides_missing_value() -> Result<()> {
        assert_eq!(parse_clearable_timestamp("reminder", None, true)?, Some(None));
        assert_eq!(parse_clearable_timestamp("reminder", None, false)?, None);
        assert_eq!(
            parse_clearable_timestamp("reminder", Some("2025-03-30"), false)?,
            Some(Some(datetime!(2025-03-30 00:00 UTC)))
        );
        let Err(err) = parse_clearable_timestamp("reminder", Some("later"), false) else {
            panic!("garbage timestamp should be rejected");
        };
        assert!(err.to_string().contains("--reminder"));
        Ok(())
    }

    #[test]
    fn invalid_ids_name_the_input() {
        let Err(err) = parse_project_id("nope") else {
            panic!("garbage id should be rejected");
        };
        assert_eq!(err.to_string(), "Invalid project id: nope");
        assert!(parse_task_id("0192b5c0-0000-7000-8000-000000000000").is_ok());
    }

    #[test]
    fn timestamps_render_as_rfc3339() {
        assert_eq!(
            format_timestamp(datetime!(2025-04-01 12:30 UTC)),
            "2025-04-01T12:30:00Z"
        );
    }
}
