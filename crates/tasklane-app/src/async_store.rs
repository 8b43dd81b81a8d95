//! Async storage abstraction consumed by the task list controller.

use anyhow::Error;
use std::sync::Arc;
use tasklane_core::{
    Activity, NewActivity, NewProject, NewTask, Project, ProjectChanges, ProjectId, Task,
    TaskChanges, TaskId, UserId,
};
use tasklane_store_json::{JsonStore, JsonStoreError};

/// Row-oriented CRUD/query interface of the data store.
///
/// The store is the system of record: it assigns identifiers and timestamps,
/// and every mutation returns the row as persisted.
#[allow(async_fn_in_trait)]
pub trait TaskStore: Send + Sync {
    /// Error type bubbled up from the backing store.
    type Error: Into<Error> + Send;

    /// Fetch a project row without its tasks.
    ///
    /// # Errors
    /// Returns a store-specific error when the query fails.
    async fn fetch_project(&self, id: ProjectId) -> Result<Option<Project>, Self::Error>;

    /// Projects owned by `owner`, newest first, with their tasks joined.
    ///
    /// # Errors
    /// Returns a store-specific error when the query fails.
    async fn list_projects(&self, owner: &UserId) -> Result<Vec<Project>, Self::Error>;

    /// Insert a project row.
    ///
    /// # Errors
    /// Returns a store-specific error when the insert fails.
    async fn insert_project(&self, new: NewProject) -> Result<Project, Self::Error>;

    /// Apply a partial update to a project row.
    ///
    /// # Errors
    /// Returns a store-specific error when the row is missing or the update fails.
    async fn update_project(
        &self,
        id: ProjectId,
        changes: &ProjectChanges,
    ) -> Result<Project, Self::Error>;

    /// Tasks of a project ordered by creation time ascending.
    ///
    /// # Errors
    /// Returns a store-specific error when the query fails.
    async fn list_tasks(&self, project: ProjectId) -> Result<Vec<Task>, Self::Error>;

    /// Insert a task row.
    ///
    /// # Errors
    /// Returns a store-specific error when the insert fails.
    async fn insert_task(&self, new: NewTask) -> Result<Task, Self::Error>;

    /// Apply a partial update to a task row.
    ///
    /// # Errors
    /// Returns a store-specific error when the row is missing or the update fails.
    async fn update_task(&self, id: TaskId, changes: &TaskChanges) -> Result<Task, Self::Error>;

    /// Delete a task row, returning whether it existed.
    ///
    /// # Errors
    /// Returns a store-specific error when the delete fails.
    async fn delete_task(&self, id: TaskId) -> Result<bool, Self::Error>;

    /// Batch upsert of order indices keyed by task id.
    ///
    /// # Errors
    /// Returns a store-specific error when any row cannot be updated.
    async fn upsert_task_order(&self, order: &[(TaskId, u32)]) -> Result<usize, Self::Error>;

    /// Completed tasks of `owner`, newest first.
    ///
    /// # Errors
    /// Returns a store-specific error when the query fails.
    async fn list_completed_tasks(&self, owner: &UserId) -> Result<Vec<Task>, Self::Error>;

    /// Insert an activity record.
    ///
    /// # Errors
    /// Returns a store-specific error when the insert fails.
    async fn insert_activity(&self, new: NewActivity) -> Result<Activity, Self::Error>;

    /// Delete every activity referencing `task`.
    ///
    /// # Errors
    /// Returns a store-specific error when the delete fails.
    async fn delete_activities_for_task(&self, task: TaskId) -> Result<usize, Self::Error>;

    /// Activities of `owner`, newest first, at most `limit`.
    ///
    /// # Errors
    /// Returns a store-specific error when the query fails.
    async fn list_activities(
        &self,
        owner: &UserId,
        limit: usize,
    ) -> Result<Vec<Activity>, Self::Error>;
}

/// Run a blocking store call off the async executor.
async fn blocking<T, F>(store: &Arc<JsonStore>, f: F) -> Result<T, JsonStoreError>
where
    T: Send + 'static,
    F: FnOnce(&JsonStore) -> Result<T, JsonStoreError> + Send + 'static,
{
    let store = Arc::clone(store);
    tokio::task::spawn_blocking(move || f(&store))
        .await
        .map_err(|e| JsonStoreError::Other(format!("Task join error: {e}")))?
}

impl TaskStore for Arc<JsonStore> {
    type Error = JsonStoreError;

    async fn fetch_project(&self, id: ProjectId) -> Result<Option<Project>, Self::Error> {
        blocking(self, move |store| store.fetch_project(id)).await
    }

    async fn list_projects(&self, owner: &UserId) -> Result<Vec<Project>, Self::Error> {
        let owner = owner.clone();
        blocking(self, move |store| store.list_projects(&owner)).await
    }

    async fn insert_project(&self, new: NewProject) -> Result<Project, Self::Error> {
        blocking(self, move |store| store.insert_project(new)).await
    }

    async fn update_project(
        &self,
        id: ProjectId,
        changes: &ProjectChanges,
    ) -> Result<Project, Self::Error> {
        let changes = changes.clone();
        blocking(self, move |store| store.update_project(id, &changes)).await
    }

    async fn list_tasks(&self, project: ProjectId) -> Result<Vec<Task>, Self::Error> {
        blocking(self, move |store| store.list_tasks(project)).await
    }

    async fn insert_task(&self, new: NewTask) -> Result<Task, Self::Error> {
        blocking(self, move |store| store.insert_task(new)).await
    }

    async fn update_task(&self, id: TaskId, changes: &TaskChanges) -> Result<Task, Self::Error> {
        let changes = changes.clone();
        blocking(self, move |store| store.update_task(id, &changes)).await
    }

    async fn delete_task(&self, id: TaskId) -> Result<bool, Self::Error> {
        blocking(self, move |store| store.delete_task(id)).await
    }

    async fn upsert_task_order(&self, order: &[(TaskId, u32)]) -> Result<usize, Self::Error> {
        let order = order.to_vec();
        blocking(self, move |store| store.upsert_task_order(&order)).await
    }

    async fn list_completed_tasks(&self, owner: &UserId) -> Result<Vec<Task>, Self::Error> {
        let owner = owner.clone();
        blocking(self, move |store| store.list_completed_tasks(&owner)).await
    }

    async fn insert_activity(&self, new: NewActivity) -> Result<Activity, Self::Error> {
        blocking(self, move |store| store.insert_activity(new)).await
    }

    async fn delete_activities_for_task(&self, task: TaskId) -> Result<usize, Self::Error> {
        blocking(self, move |store| store.delete_activities_for_task(task)).await
    }

    async fn list_activities(
        &self,
        owner: &UserId,
        limit: usize,
    ) -> Result<Vec<Activity>, Self::Error> {
        let owner = owner.clone();
        blocking(self, move |store| store.list_activities(&owner, limit)).await
    }
}
