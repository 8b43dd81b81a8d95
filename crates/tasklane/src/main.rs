//! CLI entry point for tasklane.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tasklane_app::{AppConfig, Session, resolve_user};
use tasklane_store_json::JsonStore;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

use commands::Workspace;

mod commands;

/// Projects and ordered task lists kept in a local store.
#[derive(Parser, Debug)]
#[command(
    name = "tasklane",
    version,
    about = "tasklane: per-project task lists with reordering and activity feed"
)]
struct Cli {
    /// Workspace directory holding `.tasklane/` (defaults to current).
    #[arg(long, default_value = ".")]
    dir: PathBuf,

    /// Session user (falls back to TASKLANE_USER, then USER).
    #[arg(long)]
    user: Option<String>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a project.
    ProjectNew {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
    },

    /// List projects with progress.
    Projects,

    /// Edit a project's title or description.
    ProjectEdit {
        #[arg(long)]
        project: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long, conflicts_with = "clear_description")]
        description: Option<String>,
        #[arg(long)]
        clear_description: bool,
    },

    /// List the tasks of a project in display order.
    Tasks {
        #[arg(long)]
        project: String,
        /// `all`, `todo`, `in_progress` or `done`.
        #[arg(long, default_value = "all")]
        status: String,
    },

    /// Add a task to a project.
    Add {
        #[arg(long)]
        project: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        status: Option<String>,
        /// RFC3339 timestamp or YYYY-MM-DD.
        #[arg(long)]
        due: Option<String>,
        /// RFC3339 timestamp or YYYY-MM-DD.
        #[arg(long)]
        reminder: Option<String>,
    },

    /// Edit a task.
    Edit {
        #[arg(long)]
        project: String,
        #[arg(long)]
        task: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        status: Option<String>,
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<String>,
        #[arg(long)]
        clear_due: bool,
        /// RFC3339 timestamp or YYYY-MM-DD.
        #[arg(long, conflicts_with = "clear_reminder")]
        reminder: Option<String>,
        #[arg(long)]
        clear_reminder: bool,
    },

    /// Show every field of one task.
    Show {
        #[arg(long)]
        project: String,
        #[arg(long)]
        task: String,
    },

    /// Delete a task and its activity records.
    Rm {
        #[arg(long)]
        project: String,
        #[arg(long)]
        task: String,
    },

    /// Move the task at position `from` to position `to` (0-based).
    Mv {
        #[arg(long)]
        project: String,
        #[arg(long)]
        from: usize,
        #[arg(long)]
        to: usize,
    },

    /// Show progress statistics of a project.
    Stats {
        #[arg(long)]
        project: String,
    },

    /// List completed tasks across projects.
    Completed,

    /// Show the recent activity feed.
    Recent {
        #[arg(long)]
        limit: Option<usize>,
    },
}

fn main() -> Result<()> {
    let Cli { dir, user, cmd } = Cli::parse();
    install_tracing();

    let workspace = open_workspace(&dir, user.as_deref())?;
    tokio::runtime::Runtime::new()?.block_on(commands::run(cmd, &workspace))
}

fn open_workspace(dir: &Path, user: Option<&str>) -> Result<Workspace> {
    let config = AppConfig::from_workdir(dir)?;
    let store_path = config.store_path(dir);
    let store = JsonStore::open(&store_path)
        .with_context(|| format!("failed to open store {}", store_path.display()))?;
    let session = Session::with_ttl(resolve_user(user), config.session.ttl());
    Ok(Workspace::new(Arc::new(store), config, session))
}

fn install_tracing() {
    // RUST_LOG is honoured; the default level is INFO.
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_span_events(FmtSpan::NONE)
        .compact()
        .try_init();
}
