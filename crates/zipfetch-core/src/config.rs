use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Stale-archive sweep parameters (`[janitor]` section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JanitorConfig {
    /// Whether `serve` starts the background sweep.
    pub enabled: bool,
    /// Archives whose last modification is older than this are deleted.
    pub retention_secs: u64,
    /// Sleep between two sweep cycles.
    pub interval_secs: u64,
}

impl Default for JanitorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            retention_secs: 2 * 60 * 60,
            interval_secs: 60,
        }
    }
}

impl JanitorConfig {
    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}

/// Global configuration loaded from `~/.config/zipfetch/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZipfetchConfig {
    /// Address the HTTP server binds to.
    pub listen_addr: String,
    /// Directory holding named archives. Defaults to the working directory.
    #[serde(default)]
    pub storage_dir: Option<PathBuf>,
    /// Archive-producing requests processed at once; extra requests get 503.
    pub max_concurrent_requests: usize,
    /// Outbound fetches in flight at once, across all requests.
    pub max_concurrent_downloads: usize,
    /// Per-URL GET timeout in seconds.
    pub fetch_timeout_secs: u64,
    #[serde(default)]
    pub janitor: JanitorConfig,
}

impl Default for ZipfetchConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
            storage_dir: None,
            max_concurrent_requests: 3,
            max_concurrent_downloads: 3,
            fetch_timeout_secs: 30,
            janitor: JanitorConfig::default(),
        }
    }
}

impl ZipfetchConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs.max(1))
    }

    /// Storage directory, falling back to the process working directory.
    pub fn resolved_storage_dir(&self) -> Result<PathBuf> {
        match &self.storage_dir {
            Some(dir) => Ok(dir.clone()),
            None => std::env::current_dir().context("cannot determine working directory"),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("zipfetch")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<ZipfetchConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = ZipfetchConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: ZipfetchConfig =
        toml::from_str(&data).with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}
