use crate::error::{Result, WtError};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable holding the workspace API bearer token. Tokens never
/// live in config.yaml.
pub const TOKEN_ENV: &str = "WT_WORKSPACE_TOKEN";

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// ProjectConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

// ---------------------------------------------------------------------------
// LogConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Governance log path, relative to the project root.
    #[serde(default = "default_log_path")]
    pub path: String,
}

fn default_log_path() -> String {
    paths::GOVERNANCE_LOG.to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            path: default_log_path(),
        }
    }
}

// ---------------------------------------------------------------------------
// WorkspaceConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Base URL of the workspace/document API (e.g. the platform's v1 REST
    /// endpoint). Required for any remote operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Database that mirrors governance entries when pushing remotely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub governance_database_id: Option<String>,
}

// ---------------------------------------------------------------------------
// StagingConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagingConfig {
    /// SQLite staging database path, relative to the project root.
    #[serde(default = "default_staging_db")]
    pub db_path: String,
}

fn default_staging_db() -> String {
    paths::STAGING_DB.to_string()
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            db_path: default_staging_db(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    pub project: ProjectConfig,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub workspace: WorkspaceConfig,
    #[serde(default)]
    pub staging: StagingConfig,
}

fn default_version() -> u32 {
    1
}

impl Config {
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            version: 1,
            project: ProjectConfig {
                name: project_name.into(),
                description: None,
            },
            log: LogConfig::default(),
            workspace: WorkspaceConfig::default(),
            staging: StagingConfig::default(),
        }
    }

    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(WtError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    /// Governance log path resolved against the project root.
    pub fn log_path(&self, root: &Path) -> std::path::PathBuf {
        root.join(&self.log.path)
    }

    /// Staging database path resolved against the project root.
    pub fn staging_db(&self, root: &Path) -> std::path::PathBuf {
        root.join(&self.staging.db_path)
    }

    /// Read the workspace API token from the environment.
    pub fn workspace_token() -> Result<String> {
        std::env::var(TOKEN_ENV).map_err(|_| WtError::MissingToken)
    }

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.project.name.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "project.name is empty".to_string(),
            });
        }

        if self.log.path.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "log.path is empty".to_string(),
            });
        }

        if let Some(url) = &self.workspace.base_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("workspace.base_url '{url}' is not an http(s) URL"),
                });
            }
        }

        if let Some(id) = &self.workspace.governance_database_id {
            if id.trim().is_empty() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: "workspace.governance_database_id is empty".to_string(),
                });
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
