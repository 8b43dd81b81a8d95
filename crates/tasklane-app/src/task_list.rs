//! In-memory task list of one project kept in sync with the store.

use std::collections::HashMap;

use tasklane_core::{
    Project, ProjectId, ProjectStats, Task, TaskId, move_item, order_assignments, sort_tasks,
};
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::activity::{self, ActivityLog};
use crate::async_store::TaskStore;
use crate::config::AppConfig;
use crate::error::TaskError;
use crate::filter::StatusFilter;
use crate::sequence::SequenceTracker;
use crate::session::Session;
use crate::task_patch::{NewTaskInput, TaskEdit};

/// Behaviour switches for [`TaskListController`].
#[derive(Debug, Clone, Copy)]
pub struct ControllerOptions {
    /// Restore the previous order when persisting a reorder fails.
    pub rollback_on_failure: bool,
    /// Activity logger used for task mutations.
    pub activity: ActivityLog,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            rollback_on_failure: true,
            activity: ActivityLog::default(),
        }
    }
}

impl From<&AppConfig> for ControllerOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            rollback_on_failure: config.reorder.rollback_on_failure,
            activity: ActivityLog::new(config.activity.enabled),
        }
    }
}

/// Outcome of a mutation that succeeded in the store.
///
/// `Superseded` means the store accepted the write but the local list was
/// left alone because a newer request, a reload, or `close` got there first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciled<T> {
    /// The response was applied to the local list.
    Applied(T),
    /// The response was discarded locally.
    Superseded(T),
}

impl<T> Reconciled<T> {
    /// Whether the response reached the local list.
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    /// The store response regardless of local outcome.
    pub fn into_inner(self) -> T {
        match self {
            Self::Applied(value) | Self::Superseded(value) => value,
        }
    }
}

#[derive(Debug, Default)]
struct ListState {
    epoch: u64,
    project: Option<Project>,
    tasks: Vec<Task>,
    error: Option<String>,
    sequences: SequenceTracker,
    reorder_generation: u64,
}

impl ListState {
    fn record(&mut self, err: &TaskError) {
        self.error = Some(err.to_string());
    }

    fn position(&self, id: TaskId) -> Option<usize> {
        self.tasks.iter().position(|task| task.id == id)
    }

    fn open_project(&self) -> Result<Project, TaskError> {
        self.project.clone().ok_or(TaskError::NotLoaded)
    }

    fn authorized_project(&self, session: &Session) -> Result<Project, TaskError> {
        session.ensure_live()?;
        let project = self.open_project()?;
        session.authorize(&project)?;
        Ok(project)
    }

    fn authorized_task(
        &self,
        session: &Session,
        task_id: TaskId,
    ) -> Result<(Project, Task), TaskError> {
        let project = self.authorized_project(session)?;
        let task = self
            .position(task_id)
            .map(|index| self.tasks[index].clone())
            .ok_or(TaskError::TaskNotFound(task_id))?;
        Ok((project, task))
    }

    fn restore_order(&mut self, previous: &[(TaskId, Option<u32>)]) {
        let slots: HashMap<TaskId, (usize, Option<u32>)> = previous
            .iter()
            .enumerate()
            .map(|(position, (id, index))| (*id, (position, *index)))
            .collect();
        // Tasks added after the snapshot keep their relative order at the end.
        self.tasks
            .sort_by_key(|task| slots.get(&task.id).map_or(usize::MAX, |(position, _)| *position));
        for task in &mut self.tasks {
            if let Some((_, index)) = slots.get(&task.id) {
                task.order_index = *index;
            }
        }
    }
}

/// State controller for the task list of one open project.
///
/// Methods take `&self`, so several mutations can be in flight at once. The
/// state lock is never held across a store call.
pub struct TaskListController<S> {
    store: S,
    options: ControllerOptions,
    state: Mutex<ListState>,
}

impl<S> TaskListController<S>
where
    S: TaskStore,
{
    /// Controller with default options.
    pub fn new(store: S) -> Self {
        Self::with_options(store, ControllerOptions::default())
    }

    /// Controller with explicit options.
    pub fn with_options(store: S, options: ControllerOptions) -> Self {
        Self {
            store,
            options,
            state: Mutex::new(ListState::default()),
        }
    }

    /// Expose a reference to the underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Open `project_id` and fetch its tasks in display order.
    ///
    /// Any previously open project is discarded first, so the list stays
    /// empty when the fetch fails.
    ///
    /// # Errors
    /// Returns an error when the session is not live, the project is missing
    /// or foreign, or the store fails. The error is also recorded.
    pub async fn load(
        &self,
        session: &Session,
        project_id: ProjectId,
    ) -> Result<Reconciled<Vec<Task>>, TaskError> {
        let epoch = {
            let mut state = self.state.lock().await;
            let epoch = state.epoch + 1;
            *state = ListState {
                epoch,
                reorder_generation: state.reorder_generation + 1,
                ..ListState::default()
            };
            epoch
        };

        let (project, tasks) = match self.fetch_project_tasks(session, project_id).await {
            Ok(loaded) => loaded,
            Err(err) => return Err(self.fail(epoch, err).await),
        };

        let mut state = self.state.lock().await;
        if state.epoch != epoch {
            debug!(project = %project_id, "Discarding superseded load");
            return Ok(Reconciled::Superseded(tasks));
        }
        state.project = Some(project);
        state.tasks.clone_from(&tasks);
        drop(state);
        debug!(project = %project_id, count = tasks.len(), "Loaded tasks");
        Ok(Reconciled::Applied(tasks))
    }

    async fn fetch_project_tasks(
        &self,
        session: &Session,
        project_id: ProjectId,
    ) -> Result<(Project, Vec<Task>), TaskError> {
        session.ensure_live()?;
        let mut project = self
            .store
            .fetch_project(project_id)
            .await
            .map_err(TaskError::store)?
            .ok_or(TaskError::ProjectNotFound(project_id))?;
        session.authorize(&project)?;
        project.tasks.clear();

        let mut tasks = self
            .store
            .list_tasks(project_id)
            .await
            .map_err(TaskError::store)?;
        sort_tasks(&mut tasks);
        Ok((project, tasks))
    }

    /// Create a task in the open project.
    ///
    /// # Errors
    /// Returns an error when nothing is loaded, the input is invalid, the
    /// project is not owned by the session user, or the store fails. Local
    /// state is unchanged on error.
    pub async fn add(
        &self,
        session: &Session,
        input: NewTaskInput,
    ) -> Result<Reconciled<Task>, TaskError> {
        let (epoch, project) = self.begin().await?;
        let result = async {
            session.ensure_live()?;
            let new = input.into_new_task(project.id, session.user().clone())?;
            let current = self
                .store
                .fetch_project(project.id)
                .await
                .map_err(TaskError::store)?
                .ok_or(TaskError::ProjectNotFound(project.id))?;
            session.authorize(&current)?;
            self.store.insert_task(new).await.map_err(TaskError::store)
        }
        .await;
        let task = match result {
            Ok(task) => task,
            Err(err) => return Err(self.fail(epoch, err).await),
        };

        let outcome = {
            let mut state = self.state.lock().await;
            if state.epoch == epoch {
                match state.position(task.id) {
                    Some(index) => state.tasks[index] = task.clone(),
                    None => state.tasks.push(task.clone()),
                }
                Reconciled::Applied(task)
            } else {
                debug!(task = %task.id, "Discarding add response for a closed view");
                Reconciled::Superseded(task)
            }
        };

        let task = match &outcome {
            Reconciled::Applied(task) | Reconciled::Superseded(task) => task,
        };
        self.options
            .activity
            .record(
                &self.store,
                activity::task_created(session.user(), &project, task),
            )
            .await;
        Ok(outcome)
    }

    /// Apply a partial edit to a task of the open project.
    ///
    /// # Errors
    /// Returns an error when nothing is loaded, the task is unknown, the edit
    /// is invalid, or the store fails. Local state is unchanged on error.
    pub async fn edit(
        &self,
        session: &Session,
        task_id: TaskId,
        edit: TaskEdit,
    ) -> Result<Reconciled<Task>, TaskError> {
        let (epoch, project, previous, changes, ticket) = {
            let mut state = self.state.lock().await;
            let prepared =
                state
                    .authorized_task(session, task_id)
                    .and_then(|(project, current)| {
                        let changes = edit.plan(&current, OffsetDateTime::now_utc())?;
                        Ok((project, current, changes))
                    });
            match prepared {
                Ok((project, current, changes)) => {
                    let ticket = state.sequences.issue();
                    (state.epoch, project, current, changes, ticket)
                }
                Err(err) => {
                    state.record(&err);
                    return Err(err);
                }
            }
        };

        let mut row = match self.store.update_task(task_id, &changes).await {
            Ok(row) => row,
            Err(err) => return Err(self.fail(epoch, TaskError::store(err)).await),
        };

        let outcome = {
            let mut state = self.state.lock().await;
            let slot = match state.position(task_id) {
                Some(index) if state.epoch == epoch && state.sequences.accept(task_id, ticket) => {
                    Some(index)
                }
                _ => None,
            };
            if let Some(index) = slot {
                // The local position may belong to a reorder still in flight.
                row.order_index = state.tasks[index].order_index;
                state.tasks[index] = row.clone();
                Reconciled::Applied(row)
            } else {
                debug!(task = %task_id, ticket, "Discarding stale edit response");
                Reconciled::Superseded(row)
            }
        };

        let task = match &outcome {
            Reconciled::Applied(task) | Reconciled::Superseded(task) => task,
        };
        self.options
            .activity
            .record(
                &self.store,
                activity::task_updated(session.user(), &project, task, previous.status),
            )
            .await;
        Ok(outcome)
    }

    /// Delete a task together with the activities referencing it.
    ///
    /// The task row is deleted only after its activities are gone, and the
    /// local entry only after both succeeded.
    ///
    /// # Errors
    /// Returns an error when nothing is loaded, the task is unknown, or either
    /// delete fails.
    pub async fn remove(
        &self,
        session: &Session,
        task_id: TaskId,
    ) -> Result<Reconciled<Task>, TaskError> {
        let (epoch, project, task) = {
            let mut state = self.state.lock().await;
            match state.authorized_task(session, task_id) {
                Ok((project, task)) => (state.epoch, project, task),
                Err(err) => {
                    state.record(&err);
                    return Err(err);
                }
            }
        };

        let deleted = async {
            self.store
                .delete_activities_for_task(task_id)
                .await
                .map_err(TaskError::store)?;
            self.store
                .delete_task(task_id)
                .await
                .map_err(TaskError::store)
        }
        .await;
        let existed = match deleted {
            Ok(existed) => existed,
            Err(err) => return Err(self.fail(epoch, err).await),
        };

        let outcome = {
            let mut state = self.state.lock().await;
            if state.epoch == epoch {
                state.tasks.retain(|task| task.id != task_id);
                state.sequences.forget(task_id);
                Reconciled::Applied(task)
            } else {
                debug!(task = %task_id, "Discarding remove response for a closed view");
                Reconciled::Superseded(task)
            }
        };

        if existed {
            let task = match &outcome {
                Reconciled::Applied(task) | Reconciled::Superseded(task) => task,
            };
            self.options
                .activity
                .record(
                    &self.store,
                    activity::task_deleted(session.user(), &project, task),
                )
                .await;
        } else {
            debug!(task = %task_id, "Task row was already gone");
        }
        Ok(outcome)
    }

    /// Move the task at `from` to `to` and persist the new order.
    ///
    /// The local list changes immediately. When persisting fails the previous
    /// order is restored if rollback is enabled and no newer reorder or load
    /// happened in between.
    ///
    /// # Errors
    /// Returns an error when nothing is loaded, an index is out of bounds, or
    /// the store fails.
    pub async fn reorder(
        &self,
        session: &Session,
        from: usize,
        to: usize,
    ) -> Result<Reconciled<usize>, TaskError> {
        let (epoch, generation, assignments, previous) = {
            let mut state = self.state.lock().await;
            let previous: Vec<(TaskId, Option<u32>)> = state
                .tasks
                .iter()
                .map(|task| (task.id, task.order_index))
                .collect();
            let moved = state.authorized_project(session).and_then(|_| {
                move_item(&mut state.tasks, from, to).map_err(TaskError::from)
            });
            if let Err(err) = moved {
                state.record(&err);
                return Err(err);
            }
            if from == to {
                return Ok(Reconciled::Applied(0));
            }

            let ids: Vec<TaskId> = state.tasks.iter().map(|task| task.id).collect();
            let assignments = order_assignments(&ids);
            for (task, (_, position)) in state.tasks.iter_mut().zip(&assignments) {
                task.order_index = Some(*position);
            }
            state.reorder_generation += 1;
            (state.epoch, state.reorder_generation, assignments, previous)
        };

        match self.store.upsert_task_order(&assignments).await {
            Ok(updated) => {
                let state = self.state.lock().await;
                if state.epoch == epoch {
                    Ok(Reconciled::Applied(updated))
                } else {
                    Ok(Reconciled::Superseded(updated))
                }
            }
            Err(err) => {
                let err = TaskError::store(err);
                warn!("Failed to persist task order: {err}");
                let mut state = self.state.lock().await;
                if state.epoch == epoch {
                    state.record(&err);
                    if self.options.rollback_on_failure && state.reorder_generation == generation {
                        state.restore_order(&previous);
                    }
                }
                Err(err)
            }
        }
    }

    /// Tasks of the open project matching `filter`, in list order.
    pub async fn filtered(&self, filter: StatusFilter) -> Vec<Task> {
        let state = self.state.lock().await;
        state
            .tasks
            .iter()
            .filter(|task| filter.matches(task))
            .cloned()
            .collect()
    }

    /// Snapshot of the local task list.
    pub async fn tasks(&self) -> Vec<Task> {
        self.state.lock().await.tasks.clone()
    }

    /// The open project with the local task list joined.
    pub async fn project(&self) -> Option<Project> {
        let state = self.state.lock().await;
        state.project.clone().map(|mut project| {
            project.tasks.clone_from(&state.tasks);
            project
        })
    }

    /// Aggregate statistics over the local task list.
    pub async fn stats(&self) -> ProjectStats {
        ProjectStats::from_tasks(&self.state.lock().await.tasks)
    }

    /// Message of the most recent failure, if any.
    pub async fn last_error(&self) -> Option<String> {
        self.state.lock().await.error.clone()
    }

    /// Forget the recorded failure.
    pub async fn clear_error(&self) {
        self.state.lock().await.error = None;
    }

    /// Tear the view down. Responses still in flight are dropped on arrival.
    pub async fn close(&self) {
        let mut state = self.state.lock().await;
        let epoch = state.epoch + 1;
        *state = ListState {
            epoch,
            reorder_generation: state.reorder_generation + 1,
            ..ListState::default()
        };
    }

    async fn begin(&self) -> Result<(u64, Project), TaskError> {
        let mut state = self.state.lock().await;
        match state.open_project() {
            Ok(project) => Ok((state.epoch, project)),
            Err(err) => {
                state.record(&err);
                Err(err)
            }
        }
    }

    async fn fail(&self, epoch: u64, err: TaskError) -> TaskError {
        let mut state = self.state.lock().await;
        if state.epoch == epoch {
            state.record(&err);
        } else {
            debug!("Dropping error for a closed view: {err}");
        }
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tasklane_core::{NewProject, UserId};
    use tasklane_store_json::JsonStore;
    use time::Duration;

    fn session(user: &str) -> Session {
        Session::with_ttl(UserId::from(user), Duration::minutes(5))
    }

    async fn controller_with_project() -> (TaskListController<Arc<JsonStore>>, Project) {
        let store = Arc::new(JsonStore::in_memory());
        let project = store
            .insert_project(NewProject {
                owner: UserId::from("alice"),
                title: "Launch".into(),
                description: None,
            })
            .await
            .unwrap_or_else(|err| panic!("must insert project: {err}"));
        (TaskListController::new(store), project)
    }

    #[tokio::test]
    async fn operations_before_load_report_not_loaded() {
        let (controller, _) = controller_with_project().await;
        let alice = session("alice");
        assert!(matches!(
            controller.add(&alice, NewTaskInput::new("t", "d")).await,
            Err(TaskError::NotLoaded)
        ));
        assert!(matches!(
            controller.reorder(&alice, 0, 1).await,
            Err(TaskError::NotLoaded)
        ));
        assert_eq!(controller.last_error().await.as_deref(), Some("no project loaded"));
        controller.clear_error().await;
        assert_eq!(controller.last_error().await, None);
    }

    #[tokio::test]
    async fn add_then_edit_updates_local_entry() -> Result<(), TaskError> {
        let (controller, project) = controller_with_project().await;
        let alice = session("alice");
        controller.load(&alice, project.id).await?;

        let created = controller
            .add(&alice, NewTaskInput::new("Write", "draft"))
            .await?
            .into_inner();
        let edited = controller
            .edit(
                &alice,
                created.id,
                TaskEdit {
                    status: Some(tasklane_core::TaskStatus::Done),
                    ..TaskEdit::default()
                },
            )
            .await?;
        assert!(edited.is_applied());

        let tasks = controller.tasks().await;
        assert_eq!(tasks.len(), 1);
        assert!(tasks[0].status.is_done());
        assert!(tasks[0].completed_at.is_some());
        assert_eq!(controller.stats().await.progress, 100);
        Ok(())
    }

    #[tokio::test]
    async fn close_discards_loaded_state() -> Result<(), TaskError> {
        let (controller, project) = controller_with_project().await;
        let alice = session("alice");
        controller.load(&alice, project.id).await?;
        assert!(controller.project().await.is_some());

        controller.close().await;
        assert!(controller.project().await.is_none());
        assert!(controller.tasks().await.is_empty());
        Ok(())
    }
}
