use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::connectivity::DEFAULT_PROBE_URL;

/// Backend used when neither `--api-url` nor `ASSETDESK_API_URL` is set
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

const CACHE_DIR_NAME: &str = ".assetdesk";

/// Resolved process configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_url: String,
    pub probe_url: String,
    pub cache_dir: PathBuf,
}

impl AppConfig {
    pub fn new(
        api_url: Option<String>,
        probe_url: Option<String>,
        cache_dir: Option<String>,
    ) -> Result<Self> {
        Ok(Self {
            api_url: api_url.unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            probe_url: probe_url.unwrap_or_else(|| DEFAULT_PROBE_URL.to_string()),
            cache_dir: resolve_cache_dir(cache_dir)?,
        })
    }
}

/// Explicit directory if given, otherwise `~/.assetdesk`.
pub fn resolve_cache_dir(cache_dir: Option<String>) -> Result<PathBuf> {
    match cache_dir {
        Some(dir) => Ok(PathBuf::from(dir)),
        None => {
            let home = dirs::home_dir().context("Could not determine home directory")?;
            Ok(home.join(CACHE_DIR_NAME))
        }
    }
}
