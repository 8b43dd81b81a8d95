//! JSON-document storage implementation for tasklane.
//!
//! Holds the `projects`, `tasks` and `activities` tables in memory. A store
//! opened on a path rewrites the whole document after every mutation.

mod error;

pub use error::JsonStoreError;

use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tasklane_core::{
    Activity, ActivityId, NewActivity, NewProject, NewTask, Project, ProjectChanges, ProjectId,
    Task, TaskChanges, TaskId, TaskStatus, UserId, sort_tasks,
};
use tempfile::NamedTempFile;
use time::OffsetDateTime;
use tracing::{debug, info};

const SCHEMA: &str = "tasklane-store@1";

type Result<T> = std::result::Result<T, JsonStoreError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Tables {
    schema: String,
    #[serde(default)]
    projects: Vec<Project>,
    #[serde(default)]
    tasks: Vec<Task>,
    #[serde(default)]
    activities: Vec<Activity>,
}

impl Default for Tables {
    fn default() -> Self {
        Self {
            schema: SCHEMA.to_owned(),
            projects: Vec::new(),
            tasks: Vec::new(),
            activities: Vec::new(),
        }
    }
}

impl Tables {
    fn project_mut(&mut self, id: ProjectId) -> Result<&mut Project> {
        self.projects
            .iter_mut()
            .find(|project| project.id == id)
            .ok_or(JsonStoreError::ProjectNotFound(id))
    }

    fn task_mut(&mut self, id: TaskId) -> Result<&mut Task> {
        self.tasks
            .iter_mut()
            .find(|task| task.id == id)
            .ok_or(JsonStoreError::TaskNotFound(id))
    }
}

/// Storage backed by a single JSON document (or memory only).
pub struct JsonStore {
    path: Option<PathBuf>,
    tables: Mutex<Tables>,
}

impl JsonStore {
    /// Open the document at `path`; a missing file yields empty tables.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let tables = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            serde_json::from_str(&contents).map_err(|source| JsonStoreError::Parse {
                path: path.display().to_string(),
                source,
            })?
        } else {
            debug!(path = %path.display(), "Store document missing, starting empty");
            Tables::default()
        };
        Ok(Self {
            path: Some(path),
            tables: Mutex::new(tables),
        })
    }

    /// Store that never touches the filesystem.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            path: None,
            tables: Mutex::new(Tables::default()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>> {
        self.tables.lock().map_err(|_| JsonStoreError::LockError)
    }

    fn read<T>(&self, f: impl FnOnce(&Tables) -> T) -> Result<T> {
        let guard = self.lock()?;
        Ok(f(&guard))
    }

    /// Apply `f` to a copy of the tables, persist the copy, then swap it in.
    fn mutate<T>(&self, f: impl FnOnce(&mut Tables) -> Result<T>) -> Result<T> {
        let mut guard = self.lock()?;
        let mut next = guard.clone();
        let out = f(&mut next)?;
        if let Some(path) = &self.path {
            write_document(path, &next)?;
        }
        *guard = next;
        drop(guard);
        Ok(out)
    }

    /// Fetch a project row (without tasks).
    ///
    /// # Errors
    /// Returns an error if the table lock is poisoned.
    pub fn fetch_project(&self, id: ProjectId) -> Result<Option<Project>> {
        self.read(|tables| tables.projects.iter().find(|p| p.id == id).cloned())
    }

    /// Projects owned by `owner`, newest first, with their tasks joined.
    ///
    /// # Errors
    /// Returns an error if the table lock is poisoned.
    pub fn list_projects(&self, owner: &UserId) -> Result<Vec<Project>> {
        self.read(|tables| {
            let mut by_project: HashMap<ProjectId, Vec<Task>> = HashMap::new();
            for task in &tables.tasks {
                by_project.entry(task.project_id).or_default().push(task.clone());
            }
            let mut projects: Vec<Project> = tables
                .projects
                .iter()
                .filter(|project| &project.owner == owner)
                .cloned()
                .map(|mut project| {
                    let mut tasks = by_project.remove(&project.id).unwrap_or_default();
                    sort_tasks(&mut tasks);
                    project.tasks = tasks;
                    project
                })
                .collect();
            projects.sort_by_key(|project| Reverse((project.created_at, project.id)));
            projects
        })
    }

    /// Insert a project row.
    ///
    /// # Errors
    /// Returns an error if the document cannot be persisted.
    pub fn insert_project(&self, new: NewProject) -> Result<Project> {
        let project = Project {
            id: ProjectId::new(),
            owner: new.owner,
            title: new.title,
            description: new.description,
            created_at: OffsetDateTime::now_utc(),
            updated_at: None,
            tasks: Vec::new(),
        };
        let id = project.id;
        let out = self.mutate(|tables| {
            tables.projects.push(project.clone());
            Ok(project)
        })?;
        info!(project = %id, "Inserted project");
        Ok(out)
    }

    /// Apply a partial update to a project row.
    ///
    /// # Errors
    /// Returns [`JsonStoreError::ProjectNotFound`] for unknown ids, or a
    /// persistence error.
    pub fn update_project(&self, id: ProjectId, changes: &ProjectChanges) -> Result<Project> {
        let out = self.mutate(|tables| {
            let project = tables.project_mut(id)?;
            changes.apply_to(project);
            project.updated_at = Some(OffsetDateTime::now_utc());
            Ok(project.clone())
        })?;
        info!(project = %id, "Updated project");
        Ok(out)
    }

    /// Tasks of a project ordered by creation time ascending.
    ///
    /// # Errors
    /// Returns an error if the table lock is poisoned.
    pub fn list_tasks(&self, project: ProjectId) -> Result<Vec<Task>> {
        self.read(|tables| {
            let mut tasks: Vec<Task> = tables
                .tasks
                .iter()
                .filter(|task| task.project_id == project)
                .cloned()
                .collect();
            tasks.sort_by_key(|task| (task.created_at, task.id));
            tasks
        })
    }

    /// Insert a task row. The referenced project must exist.
    ///
    /// # Errors
    /// Returns [`JsonStoreError::ProjectNotFound`] for dangling project ids, or
    /// a persistence error.
    pub fn insert_task(&self, new: NewTask) -> Result<Task> {
        let out = self.mutate(|tables| {
            tables.project_mut(new.project_id)?;
            let task = Task {
                id: TaskId::new(),
                project_id: new.project_id,
                owner: new.owner,
                title: new.title,
                description: new.description,
                status: new.status,
                created_at: OffsetDateTime::now_utc(),
                updated_at: None,
                due_date: new.due_date,
                completed_at: new.status.is_done().then(OffsetDateTime::now_utc),
                reminder_at: new.reminder_at,
                order_index: None,
            };
            tables.tasks.push(task.clone());
            Ok(task)
        })?;
        info!(task = %out.id, project = %out.project_id, "Inserted task");
        Ok(out)
    }

    /// Apply a partial update to a task row.
    ///
    /// # Errors
    /// Returns [`JsonStoreError::TaskNotFound`] for unknown ids, or a
    /// persistence error.
    pub fn update_task(&self, id: TaskId, changes: &TaskChanges) -> Result<Task> {
        let out = self.mutate(|tables| {
            let task = tables.task_mut(id)?;
            changes.apply_to(task);
            task.updated_at = Some(OffsetDateTime::now_utc());
            Ok(task.clone())
        })?;
        info!(task = %id, "Updated task");
        Ok(out)
    }

    /// Delete a task row. Returns whether a row was removed.
    ///
    /// # Errors
    /// Returns an error if the document cannot be persisted.
    pub fn delete_task(&self, id: TaskId) -> Result<bool> {
        let removed = self.mutate(|tables| {
            let before = tables.tasks.len();
            tables.tasks.retain(|task| task.id != id);
            Ok(tables.tasks.len() != before)
        })?;
        info!(task = %id, removed, "Deleted task");
        Ok(removed)
    }

    /// Write order indices keyed by task id in one batch.
    ///
    /// Either every row is updated or none is.
    ///
    /// # Errors
    /// Returns [`JsonStoreError::TaskNotFound`] when any id is unknown, or a
    /// persistence error.
    pub fn upsert_task_order(&self, order: &[(TaskId, u32)]) -> Result<usize> {
        let now = OffsetDateTime::now_utc();
        let updated = self.mutate(|tables| {
            for (id, position) in order {
                let task = tables.task_mut(*id)?;
                task.order_index = Some(*position);
                task.updated_at = Some(now);
            }
            Ok(order.len())
        })?;
        info!(updated, "Persisted task order");
        Ok(updated)
    }

    /// Completed tasks across all projects of `owner`, newest first.
    ///
    /// # Errors
    /// Returns an error if the table lock is poisoned.
    pub fn list_completed_tasks(&self, owner: &UserId) -> Result<Vec<Task>> {
        self.read(|tables| {
            let mut tasks: Vec<Task> = tables
                .tasks
                .iter()
                .filter(|task| &task.owner == owner && task.status == TaskStatus::Done)
                .cloned()
                .collect();
            tasks.sort_by_key(|task| Reverse((task.created_at, task.id)));
            tasks
        })
    }

    /// Insert an activity record.
    ///
    /// # Errors
    /// Returns an error if the document cannot be persisted.
    pub fn insert_activity(&self, new: NewActivity) -> Result<Activity> {
        let activity = Activity {
            id: ActivityId::new(),
            kind: new.kind,
            owner: new.owner,
            project_id: new.project_id,
            task_id: new.task_id,
            project_title: new.project_title,
            task_title: new.task_title,
            old_status: new.old_status,
            new_status: new.new_status,
            created_at: OffsetDateTime::now_utc(),
        };
        let out = self.mutate(|tables| {
            tables.activities.push(activity.clone());
            Ok(activity)
        })?;
        debug!(activity = %out.id, kind = out.kind.as_str(), "Inserted activity");
        Ok(out)
    }

    /// Remove every activity referencing `task`. Returns the number removed.
    ///
    /// # Errors
    /// Returns an error if the document cannot be persisted.
    pub fn delete_activities_for_task(&self, task: TaskId) -> Result<usize> {
        let removed = self.mutate(|tables| {
            let before = tables.activities.len();
            tables.activities.retain(|activity| activity.task_id != Some(task));
            Ok(before - tables.activities.len())
        })?;
        debug!(%task, removed, "Deleted task activities");
        Ok(removed)
    }

    /// Activities of `owner`, newest first, at most `limit` entries.
    ///
    /// # Errors
    /// Returns an error if the table lock is poisoned.
    pub fn list_activities(&self, owner: &UserId, limit: usize) -> Result<Vec<Activity>> {
        self.read(|tables| {
            let mut activities: Vec<Activity> = tables
                .activities
                .iter()
                .filter(|activity| &activity.owner == owner)
                .cloned()
                .collect();
            activities.sort_by_key(|activity| Reverse((activity.created_at, activity.id)));
            activities.truncate(limit);
            activities
        })
    }
}

fn write_document(path: &Path, tables: &Tables) -> Result<()> {
    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;
    let body = serde_json::to_string_pretty(tables)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(body.as_bytes())?;
    tmp.persist(path).map_err(|err| JsonStoreError::IoError(err.error))?;
    Ok(())
}
