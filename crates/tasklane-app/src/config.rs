use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use time::Duration;

/// Directory holding configuration and the default store document.
pub const CONFIG_DIR: &str = ".tasklane";
const CONFIG_FILE: &str = "config.toml";
/// Longest accepted session lifetime: one year.
pub const MAX_TTL_MINUTES: u32 = 366 * 24 * 60;

/// Top-level configuration loaded from `.tasklane/config.toml`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    /// Where the store document lives.
    #[serde(default)]
    pub store: StoreConfig,
    /// Reorder failure policy.
    #[serde(default)]
    pub reorder: ReorderConfig,
    /// Activity feed switches.
    #[serde(default)]
    pub activity: ActivityConfig,
    /// Lifetime of CLI sessions.
    #[serde(default)]
    pub session: SessionConfig,
}

impl AppConfig {
    /// Load configuration from `<workdir>/.tasklane/config.toml`.
    ///
    /// A missing file yields the defaults.
    ///
    /// # Errors
    /// Returns an error when the file cannot be read, parsed, or fails validation.
    pub fn from_workdir(workdir: impl AsRef<Path>) -> Result<Self> {
        let config_path = workdir.as_ref().join(CONFIG_DIR).join(CONFIG_FILE);
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&config_path)
            .with_context(|| format!("failed to read {}", config_path.display()))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("failed to parse {}", config_path.display()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.store.file.as_os_str().is_empty() {
            bail!("store.file must not be empty");
        }
        if self.activity.recent_limit == 0 {
            bail!("activity.recent_limit must be greater than zero");
        }
        if self.session.ttl_minutes == 0 {
            bail!("session.ttl_minutes must be greater than zero");
        }
        if self.session.ttl_minutes > MAX_TTL_MINUTES {
            bail!("session.ttl_minutes must not exceed {MAX_TTL_MINUTES}");
        }
        Ok(())
    }

    /// Location of the store document for `workdir`.
    ///
    /// Relative paths are resolved against `<workdir>/.tasklane`.
    pub fn store_path(&self, workdir: impl AsRef<Path>) -> PathBuf {
        if self.store.file.is_absolute() {
            self.store.file.clone()
        } else {
            workdir.as_ref().join(CONFIG_DIR).join(&self.store.file)
        }
    }
}

/// `[store]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Store document path.
    pub file: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("store.json"),
        }
    }
}

/// `[reorder]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReorderConfig {
    /// Restore the previous order when persisting a move fails.
    pub rollback_on_failure: bool,
}

impl Default for ReorderConfig {
    fn default() -> Self {
        Self {
            rollback_on_failure: true,
        }
    }
}

/// `[activity]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ActivityConfig {
    /// Write activity records on task/project mutations.
    pub enabled: bool,
    /// Default size of the recent activity feed.
    pub recent_limit: usize,
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            recent_limit: 50,
        }
    }
}

/// `[session]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Lifetime of sessions created by the CLI.
    pub ttl_minutes: u32,
}

impl SessionConfig {
    /// Session lifetime as a duration.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::minutes(i64::from(self.ttl_minutes))
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { ttl_minutes: 60 }
    }
}
