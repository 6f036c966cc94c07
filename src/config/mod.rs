use crate::utils::{get_data_file, CONFIG_FILE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Header set by the authenticating proxy in front of the daemon
fn default_login_header() -> String {
    "x-login-id".to_string()
}

fn default_snapshot_file() -> String {
    "store.json".to_string()
}

/// Daemon configuration, read from `config.json` in the data directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaemonConfig {
    /// Request header carrying the authenticated user's login id.
    /// Requests without it are served as the anonymous user.
    #[serde(default = "default_login_header")]
    pub login_header: String,
    /// Store snapshot file name, relative to the data directory
    #[serde(default = "default_snapshot_file")]
    pub snapshot_file: String,
    /// Directory of `*.hbs` files overriding the built-in views
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub templates_dir: Option<String>,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            login_header: default_login_header(),
            snapshot_file: default_snapshot_file(),
            templates_dir: None,
        }
    }
}

impl DaemonConfig {
    pub fn snapshot_path(&self, data_dir: &Path) -> PathBuf {
        get_data_file(data_dir, &self.snapshot_file)
    }

    /// Template override directory, resolved against the data directory when relative
    pub fn templates_path(&self, data_dir: &Path) -> Option<PathBuf> {
        self.templates_dir.as_ref().map(|dir| data_dir.join(dir))
    }
}

/// Read the configuration file
pub async fn read_config(data_dir: &Path) -> Result<Option<DaemonConfig>, ConfigError> {
    let config_path = get_data_file(data_dir, CONFIG_FILE);

    if !config_path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(&config_path).await?;
    let config: DaemonConfig = serde_json::from_str(&content)?;
    Ok(Some(config))
}

/// Write the configuration file
pub async fn write_config(data_dir: &Path, config: &DaemonConfig) -> Result<(), ConfigError> {
    fs::create_dir_all(data_dir).await?;
    let config_path = get_data_file(data_dir, CONFIG_FILE);
    let content = serde_json::to_string_pretty(config)?;
    fs::write(&config_path, content).await?;
    Ok(())
}
