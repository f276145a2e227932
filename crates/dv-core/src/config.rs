//! Configuration types and parsing for dimvault.yml

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Main project configuration from dimvault.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Project name
    pub name: String,

    /// Project version
    #[serde(default = "default_version")]
    pub version: String,

    /// Directories containing dimension definitions
    #[serde(default = "default_dimension_paths")]
    pub dimension_paths: Vec<String>,

    /// Output directory for run result files
    #[serde(default = "default_target_path")]
    pub target_path: String,

    /// Schema that `dv load` replaces landing tables in
    #[serde(default = "default_landing_schema")]
    pub landing_schema: String,

    /// Database connection configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Data-quality logging settings
    #[serde(default)]
    pub quality: QualityConfig,

    /// Named target configurations (e.g., dev, prod)
    #[serde(default)]
    pub targets: HashMap<String, TargetConfig>,
}

/// Target-specific configuration overrides
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct TargetConfig {
    /// Database configuration override
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
}

/// Database type selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DbType {
    /// DuckDB (default)
    #[default]
    DuckDb,
}

impl std::fmt::Display for DbType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DbType::DuckDb => write!(f, "duckdb"),
        }
    }
}

/// Database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Database type
    #[serde(rename = "type", default)]
    pub db_type: DbType,

    /// Database path (file-based or :memory:)
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            db_type: DbType::default(),
            path: default_db_path(),
        }
    }
}

/// Data-quality gate settings shared by every dimension
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QualityConfig {
    /// Append-only log table for check results
    #[serde(default = "default_log_table")]
    pub log_table: String,

    /// Halt `dv load` when the landing table row count differs from the file
    #[serde(default = "default_true")]
    pub abort_on_row_count: bool,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            log_table: default_log_table(),
            abort_on_row_count: true,
        }
    }
}

fn default_version() -> String {
    "1.0.0".to_string()
}

fn default_dimension_paths() -> Vec<String> {
    vec!["dimensions".to_string()]
}

fn default_target_path() -> String {
    "target".to_string()
}

fn default_landing_schema() -> String {
    "landing".to_string()
}

fn default_log_table() -> String {
    "main.data_quality_logs".to_string()
}

fn default_true() -> bool {
    true
}

const DEFAULT_DB_PATH: &str = ":memory:";

fn default_db_path() -> String {
    DEFAULT_DB_PATH.to_string()
}

/// Environment variable consulted when no `--target` flag is given
pub const TARGET_ENV_VAR: &str = "DV_TARGET";

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Config = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a project directory
    /// Looks for dimvault.yml or dimvault.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        let yml_path = dir.join("dimvault.yml");
        let yaml_path = dir.join("dimvault.yaml");

        if yml_path.exists() {
            Self::load(&yml_path)
        } else if yaml_path.exists() {
            Self::load(&yaml_path)
        } else {
            Err(CoreError::ConfigNotFound {
                path: yml_path.display().to_string(),
            })
        }
    }

    /// Validate the configuration
    fn validate(&self) -> CoreResult<()> {
        if self.name.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "Project name cannot be empty".to_string(),
            });
        }

        if self.dimension_paths.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "dimension_paths must list at least one directory".to_string(),
            });
        }

        if self.landing_schema.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "landing_schema cannot be empty".to_string(),
            });
        }

        if self.quality.log_table.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "quality.log_table cannot be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Get absolute target path
    pub fn target_path_absolute(&self, root: &Path) -> PathBuf {
        root.join(&self.target_path)
    }

    /// Get database configuration, optionally applying target overrides
    pub fn get_database_config(&self, target: Option<&str>) -> CoreResult<DatabaseConfig> {
        match target {
            Some(name) => {
                let target_config =
                    self.targets
                        .get(name)
                        .ok_or_else(|| CoreError::ConfigInvalid {
                            message: format!(
                                "Target '{}' not found. Available targets: {}",
                                name,
                                self.available_targets().join(", ")
                            ),
                        })?;

                Ok(target_config
                    .database
                    .clone()
                    .unwrap_or_else(|| self.database.clone()))
            }
            None => Ok(self.database.clone()),
        }
    }

    /// Names of all configured targets, sorted
    pub fn available_targets(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.targets.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Resolve target from CLI flag or the DV_TARGET environment variable
    ///
    /// Priority: CLI flag > DV_TARGET env var > None
    pub fn resolve_target(cli_target: Option<&str>) -> Option<String> {
        cli_target
            .map(String::from)
            .or_else(|| std::env::var(TARGET_ENV_VAR).ok())
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
