//! Recently opened projects.
//!
//! Cached in `<cache_dir>/recent.json`, newest first. Loading runs in the
//! background so startup never waits on disk.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::startup::RecentLoader;

/// Maximum number of entries kept
pub const MAX_RECENT_PROJECTS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentProject {
    pub name: String,
    pub path: PathBuf,
    pub last_opened: DateTime<Utc>,
}

pub struct RecentProjectsStore {
    recent_path: PathBuf,
    projects: Arc<RwLock<Vec<RecentProject>>>,
    loader: Mutex<Option<JoinHandle<()>>>,
}

impl RecentProjectsStore {
    pub fn new(cache_dir: &Path) -> Self {
        Self {
            recent_path: cache_dir.join("recent.json"),
            projects: Arc::new(RwLock::new(Vec::new())),
            loader: Mutex::new(None),
        }
    }

    pub async fn projects(&self) -> Vec<RecentProject> {
        self.projects.read().await.clone()
    }

    /// Wait for a background load started by `load_recent` to finish.
    pub async fn wait_loaded(&self) {
        let handle = self.loader.lock().await.take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!("Recent projects loader task failed: {}", e);
            }
        }
    }

    /// Move `project` to the front of the list and persist it.
    ///
    /// Waits for a pending background load first, so the loaded entries are
    /// kept instead of being overwritten later.
    pub async fn record(&self, name: &str, path: &Path) -> Result<()> {
        self.wait_loaded().await;

        let snapshot = {
            let mut projects = self.projects.write().await;
            projects.retain(|p| p.path != path);
            projects.insert(
                0,
                RecentProject {
                    name: name.to_string(),
                    path: path.to_path_buf(),
                    last_opened: Utc::now(),
                },
            );
            projects.truncate(MAX_RECENT_PROJECTS);
            projects.clone()
        };

        let content = serde_json::to_string_pretty(&snapshot)
            .context("Failed to serialize recent projects")?;
        if let Some(parent) = self.recent_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }
        tokio::fs::write(&self.recent_path, content)
            .await
            .with_context(|| format!("Failed to write recent projects: {:?}", self.recent_path))?;

        debug!("Recorded recent project {:?}", path);
        Ok(())
    }
}

async fn read_recent(path: &Path) -> Result<Vec<RecentProject>> {
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        return Ok(Vec::new());
    }

    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read recent projects: {:?}", path))?;
    let mut projects: Vec<RecentProject> =
        serde_json::from_str(&content).context("Failed to parse recent projects JSON")?;

    projects.sort_by(|a, b| b.last_opened.cmp(&a.last_opened));
    projects.truncate(MAX_RECENT_PROJECTS);
    Ok(projects)
}

impl RecentLoader for RecentProjectsStore {
    fn load_recent(&self) -> Result<()> {
        let runtime = tokio::runtime::Handle::try_current()
            .context("Recent projects loader needs a running tokio runtime")?;

        let mut loader = self
            .loader
            .try_lock()
            .context("Recent projects are already being loaded")?;

        let path = self.recent_path.clone();
        let projects = self.projects.clone();

        let handle = runtime.spawn(async move {
            match read_recent(&path).await {
                Ok(loaded) => {
                    info!("📂 Loaded {} recent project(s)", loaded.len());
                    *projects.write().await = loaded;
                }
                Err(e) => warn!("Failed to load recent projects: {:#}", e),
            }
        });

        if let Some(previous) = loader.replace(handle) {
            previous.abort();
        }
        Ok(())
    }
}
