use std::collections::HashMap;

use tasklane_core::{Activity, NewProject, Project, ProjectChanges, ProjectId, Task};

use crate::activity::{self, ActivityLog};
use crate::async_store::TaskStore;
use crate::config::AppConfig;
use crate::error::{TaskError, require_text};
use crate::session::Session;

/// Partial edit of a project.
#[derive(Debug, Clone, Default)]
pub struct ProjectEdit {
    /// New title; must not be blank when provided.
    pub title: Option<String>,
    /// New description; `Some(None)` clears it.
    pub description: Option<Option<String>>,
}

/// A completed task paired with the title of its project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedTask {
    /// The task row.
    pub task: Task,
    /// Title of the owning project.
    pub project_title: String,
}

/// Dashboard operations spanning every project of the session user.
pub struct ProjectService<S> {
    store: S,
    activity: ActivityLog,
    recent_limit: usize,
}

impl<S: TaskStore> ProjectService<S> {
    /// Service with default activity settings.
    pub fn new(store: S) -> Self {
        Self::from_config(store, &AppConfig::default())
    }

    /// Service configured from the `[activity]` section.
    pub fn from_config(store: S, config: &AppConfig) -> Self {
        Self {
            store,
            activity: ActivityLog::new(config.activity.enabled),
            recent_limit: config.activity.recent_limit,
        }
    }

    /// The session user's projects, newest first, with their tasks.
    ///
    /// # Errors
    /// Returns an error when the session expired or the store fails.
    pub async fn list_projects(&self, session: &Session) -> Result<Vec<Project>, TaskError> {
        session.ensure_live()?;
        self.store
            .list_projects(session.user())
            .await
            .map_err(TaskError::store)
    }

    /// Create a project owned by the session user.
    ///
    /// # Errors
    /// Returns an error when the title is blank, the session expired, or the
    /// store fails.
    pub async fn create_project(
        &self,
        session: &Session,
        title: &str,
        description: Option<&str>,
    ) -> Result<Project, TaskError> {
        session.ensure_live()?;
        require_text("title", title)?;
        let new = NewProject {
            owner: session.user().clone(),
            title: title.trim().to_owned(),
            description: normalize_description(description),
        };
        self.store.insert_project(new).await.map_err(TaskError::store)
    }

    /// Edit a project owned by the session user.
    ///
    /// # Errors
    /// Returns an error when the project is missing or foreign, the edit is
    /// invalid, or the store fails.
    pub async fn update_project(
        &self,
        session: &Session,
        project_id: ProjectId,
        edit: ProjectEdit,
    ) -> Result<Project, TaskError> {
        session.ensure_live()?;
        if let Some(title) = &edit.title {
            require_text("title", title)?;
        }
        let changes = ProjectChanges {
            title: edit.title.map(|title| title.trim().to_owned()),
            description: edit
                .description
                .map(|description| normalize_description(description.as_deref())),
        };
        if changes.is_empty() {
            return Err(TaskError::Validation("no changes provided".into()));
        }

        let current = self
            .store
            .fetch_project(project_id)
            .await
            .map_err(TaskError::store)?
            .ok_or(TaskError::ProjectNotFound(project_id))?;
        session.authorize(&current)?;

        let updated = self
            .store
            .update_project(project_id, &changes)
            .await
            .map_err(TaskError::store)?;
        self.activity
            .record(
                &self.store,
                activity::project_updated(session.user(), &updated),
            )
            .await;
        Ok(updated)
    }

    /// Completed tasks of the session user, newest first.
    ///
    /// # Errors
    /// Returns an error when the session expired or the store fails.
    pub async fn completed_tasks(&self, session: &Session) -> Result<Vec<CompletedTask>, TaskError> {
        session.ensure_live()?;
        let tasks = self
            .store
            .list_completed_tasks(session.user())
            .await
            .map_err(TaskError::store)?;
        let titles: HashMap<ProjectId, String> = self
            .store
            .list_projects(session.user())
            .await
            .map_err(TaskError::store)?
            .into_iter()
            .map(|project| (project.id, project.title))
            .collect();

        Ok(tasks
            .into_iter()
            .map(|task| CompletedTask {
                project_title: titles.get(&task.project_id).cloned().unwrap_or_default(),
                task,
            })
            .collect())
    }

    /// Most recent activities of the session user.
    ///
    /// `limit` falls back to the configured feed size.
    ///
    /// # Errors
    /// Returns an error when the session expired or the store fails.
    pub async fn recent_activity(
        &self,
        session: &Session,
        limit: Option<usize>,
    ) -> Result<Vec<Activity>, TaskError> {
        session.ensure_live()?;
        let limit = limit.filter(|limit| *limit > 0).unwrap_or(self.recent_limit);
        self.store
            .list_activities(session.user(), limit)
            .await
            .map_err(TaskError::store)
    }
}

fn normalize_description(description: Option<&str>) -> Option<String> {
    description
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tasklane_core::UserId;
    use tasklane_store_json::JsonStore;
    use time::Duration;

    fn session(user: &str) -> Session {
        Session::with_ttl(UserId::from(user), Duration::minutes(5))
    }

    fn service() -> ProjectService<Arc<JsonStore>> {
        ProjectService::new(Arc::new(JsonStore::in_memory()))
    }

    #[tokio::test]
    async fn create_rejects_blank_title() {
        let service = service();
        let Err(err) = service.create_project(&session("alice"), "  ", None).await else {
            panic!("blank title should be rejected");
        };
        assert!(matches!(err, TaskError::Validation(_)));
    }

    #[tokio::test]
    async fn projects_are_scoped_to_their_owner() -> Result<(), TaskError> {
        let service = service();
        let alice = session("alice");
        let bob = session("bob");
        let project = service.create_project(&alice, "Launch", Some("  ")).await?;
        assert_eq!(project.description, None);

        assert_eq!(service.list_projects(&alice).await?.len(), 1);
        assert!(service.list_projects(&bob).await?.is_empty());

        let edit = ProjectEdit {
            title: Some("Hijack".into()),
            ..ProjectEdit::default()
        };
        assert!(matches!(
            service.update_project(&bob, project.id, edit).await,
            Err(TaskError::AccessDenied(_))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn update_logs_project_activity() -> Result<(), TaskError> {
        let service = service();
        let alice = session("alice");
        let project = service.create_project(&alice, "Launch", None).await?;

        let edit = ProjectEdit {
            title: Some("Relaunch".into()),
            description: Some(Some("second try".into())),
        };
        let updated = service.update_project(&alice, project.id, edit).await?;
        assert_eq!(updated.title, "Relaunch");
        assert_eq!(updated.description.as_deref(), Some("second try"));

        let feed = service.recent_activity(&alice, None).await?;
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].describe(), "Updated project \"Relaunch\"");
        Ok(())
    }
}
