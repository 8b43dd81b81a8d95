use anyhow::Result;
use tasklane_app::{
    CompletedTask, NewTaskInput, ProjectEdit, Reconciled, StatusFilter, TaskEdit, TaskError,
};
use tasklane_core::{Activity, Project, ProjectStats, Task};
use time::OffsetDateTime;

use super::{Workspace, format_timestamp, parse_project_id, parse_task_id};

pub async fn project_new(workspace: &Workspace, title: &str, description: Option<&str>) -> Result<()> {
    let project = workspace
        .projects()
        .create_project(workspace.session(), title, description)
        .await?;
    println!("created project: {} ({})", project.id, project.title);
    Ok(())
}

pub async fn projects(workspace: &Workspace) -> Result<()> {
    let projects = workspace.projects().list_projects(workspace.session()).await?;
    if projects.is_empty() {
        println!("No projects found");
        return Ok(());
    }
    for line in render_projects(&projects) {
        println!("{line}");
    }
    Ok(())
}

pub async fn project_edit(
    workspace: &Workspace,
    project: &str,
    title: Option<String>,
    description: Option<Option<String>>,
) -> Result<()> {
    let project = parse_project_id(project)?;
    let updated = workspace
        .projects()
        .update_project(workspace.session(), project, ProjectEdit { title, description })
        .await?;
    println!("updated project: {} ({})", updated.id, updated.title);
    Ok(())
}

pub async fn tasks(workspace: &Workspace, project: &str, status: &str) -> Result<()> {
    let filter: StatusFilter = status.parse()?;
    let controller = workspace.open_list(project).await?;
    let tasks = controller.filtered(filter).await;
    if tasks.is_empty() {
        if filter == StatusFilter::All {
            println!("No tasks found");
        } else {
            println!("No tasks matched the provided filter");
        }
        return Ok(());
    }
    for line in render_task_table(&tasks) {
        println!("{line}");
    }
    Ok(())
}

pub async fn add(workspace: &Workspace, project: &str, input: NewTaskInput) -> Result<()> {
    let controller = workspace.open_list(project).await?;
    let task = controller
        .add(workspace.session(), input)
        .await?
        .into_inner();
    println!("created task: {} ({})", task.id, task.title);
    Ok(())
}

pub async fn edit(workspace: &Workspace, project: &str, task: &str, edit: TaskEdit) -> Result<()> {
    let task = parse_task_id(task)?;
    let controller = workspace.open_list(project).await?;
    let task = controller
        .edit(workspace.session(), task, edit)
        .await?
        .into_inner();
    println!("updated task: {} [{}] {}", task.id, task.status.label(), task.title);
    Ok(())
}

pub async fn show(workspace: &Workspace, project: &str, task: &str) -> Result<()> {
    let task_id = parse_task_id(task)?;
    let controller = workspace.open_list(project).await?;
    let task = controller
        .tasks()
        .await
        .into_iter()
        .find(|task| task.id == task_id)
        .ok_or(TaskError::TaskNotFound(task_id))?;
    let project_title = controller
        .project()
        .await
        .map(|project| project.title)
        .unwrap_or_default();
    for line in render_task_detail(&task, &project_title) {
        println!("{line}");
    }
    Ok(())
}

pub async fn remove(workspace: &Workspace, project: &str, task: &str) -> Result<()> {
    let task = parse_task_id(task)?;
    let controller = workspace.open_list(project).await?;
    let task = controller.remove(workspace.session(), task).await?.into_inner();
    println!("deleted task: {} ({})", task.id, task.title);
    Ok(())
}

pub async fn reorder(workspace: &Workspace, project: &str, from: usize, to: usize) -> Result<()> {
    let controller = workspace.open_list(project).await?;
    if let Reconciled::Applied(updated) = controller.reorder(workspace.session(), from, to).await? {
        println!("moved task {from} -> {to} ({updated} rows updated)");
    }
    for line in render_task_table(&controller.tasks().await) {
        println!("{line}");
    }
    Ok(())
}

pub async fn stats(workspace: &Workspace, project: &str) -> Result<()> {
    let controller = workspace.open_list(project).await?;
    let title = controller
        .project()
        .await
        .map(|project| project.title)
        .unwrap_or_default();
    println!("{title}");
    for line in render_stats(&controller.stats().await) {
        println!("{line}");
    }
    Ok(())
}

pub async fn completed(workspace: &Workspace) -> Result<()> {
    let tasks = workspace.projects().completed_tasks(workspace.session()).await?;
    if tasks.is_empty() {
        println!("No completed tasks");
        return Ok(());
    }
    for line in render_completed(&tasks) {
        println!("{line}");
    }
    Ok(())
}

pub async fn recent(workspace: &Workspace, limit: Option<usize>) -> Result<()> {
    let feed = workspace
        .projects()
        .recent_activity(workspace.session(), limit)
        .await?;
    if feed.is_empty() {
        println!("No recent activity");
        return Ok(());
    }
    for line in render_activity(&feed) {
        println!("{line}");
    }
    Ok(())
}

fn render_projects(projects: &[Project]) -> Vec<String> {
    let mut lines = vec![
        "ID | Title | Done | Progress".to_owned(),
        "-- | ----- | ---- | --------".to_owned(),
    ];
    lines.extend(projects.iter().map(|project| {
        let stats = project.stats();
        format!(
            "{} | {} | {}/{} | {}%",
            project.id, project.title, stats.completed, stats.total, stats.progress
        )
    }));
    lines
}

fn render_task_table(tasks: &[Task]) -> Vec<String> {
    let mut lines = vec![
        "# | ID | Status | Title | Due".to_owned(),
        "- | -- | ------ | ----- | ---".to_owned(),
    ];
    lines.extend(tasks.iter().enumerate().map(|(position, task)| {
        let due = task.due_date.map_or_else(|| "-".to_owned(), format_timestamp);
        format!(
            "{position} | {} | {} | {} | {due}",
            task.id,
            task.status.label(),
            task.title
        )
    }));
    lines
}

fn render_task_detail(task: &Task, project_title: &str) -> Vec<String> {
    let optional = |ts: Option<OffsetDateTime>| ts.map_or_else(|| "-".to_owned(), format_timestamp);
    vec![
        format!("id: {}", task.id),
        format!("project: {project_title} ({})", task.project_id),
        format!("title: {}", task.title),
        format!("status: {}", task.status.label()),
        format!("description: {}", task.description),
        format!("due: {}", optional(task.due_date)),
        format!("reminder: {}", optional(task.reminder_at)),
        format!("completed: {}", optional(task.completed_at)),
        format!("created: {}", format_timestamp(task.created_at)),
        format!("updated: {}", optional(task.updated_at)),
    ]
}

fn render_stats(stats: &ProjectStats) -> Vec<String> {
    vec![
        format!("total: {}", stats.total),
        format!("to do: {}", stats.todo()),
        format!("in progress: {}", stats.in_progress),
        format!("done: {}", stats.completed),
        format!("progress: {}%", stats.progress),
    ]
}

fn render_completed(tasks: &[CompletedTask]) -> Vec<String> {
    tasks
        .iter()
        .map(|entry| {
            let when = entry
                .task
                .completed_at
                .map_or_else(|| "-".to_owned(), format_timestamp);
            format!("{when} | {} | {}", entry.task.title, entry.project_title)
        })
        .collect()
}

fn render_activity(feed: &[Activity]) -> Vec<String> {
    feed.iter()
        .map(|activity| format!("{} | {}", format_timestamp(activity.created_at), activity.describe()))
        .collect()
}
