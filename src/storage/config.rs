//! Configuration handling for festival-cli
//!
//! Configuration is stored in `.fest/config.toml` (festival) and
//! `~/.config/fest/config.toml` (global).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Directory marking a festival root
pub const FEST_DIR: &str = ".fest";

const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Settings for structural edits
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RenumberConfig {
    /// Copy removed elements aside before deleting them
    pub backup: bool,

    /// Backup location, relative to the festival root
    pub backup_dir: PathBuf,
}

impl Default for RenumberConfig {
    fn default() -> Self {
        Self {
            backup: true,
            backup_dir: PathBuf::from(FEST_DIR).join("backups"),
        }
    }
}

/// Settings for building the dependency graph
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GraphConfig {
    /// Treat task numbers within a sequence as implicit ordering
    pub infer_sequence_order: bool,
}

/// Festival-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProjectConfig {
    pub renumber: RenumberConfig,
    pub graph: GraphConfig,
}

/// Global user configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GlobalConfig {
    /// Default output format (text or json)
    pub default_format: OutputFormat,
}

/// Output format for commands
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Combined configuration (global + festival)
#[derive(Debug, Clone)]
pub struct Config {
    pub project: ProjectConfig,
    pub global: GlobalConfig,
    pub festival_root: Option<PathBuf>,
}

impl Config {
    /// Loads configuration for a specific festival
    pub fn for_festival(festival_root: &Path) -> Result<Self> {
        let global = Self::load_global()?;
        let project = Self::load_project_config(festival_root)?;

        Ok(Self {
            project,
            global,
            festival_root: Some(festival_root.to_path_buf()),
        })
    }

    /// Returns the global config directory
    pub fn global_config_dir() -> Option<PathBuf> {
        ProjectDirs::from("dev", "fest", "fest").map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Loads global configuration
    pub fn load_global() -> Result<GlobalConfig> {
        let config_dir = match Self::global_config_dir() {
            Some(dir) => dir,
            None => return Ok(GlobalConfig::default()),
        };

        let config_path = config_dir.join(CONFIG_FILE);
        if !config_path.exists() {
            return Ok(GlobalConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read global config: {}", config_path.display()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse global config")
    }

    /// Loads festival configuration from a specific root
    fn load_project_config(festival_root: &Path) -> Result<ProjectConfig> {
        let config_path = festival_root.join(FEST_DIR).join(CONFIG_FILE);

        if !config_path.exists() {
            return Ok(ProjectConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read festival config: {}", config_path.display()))?;

        let config: ProjectConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse festival config")?;

        config.validate()?;
        Ok(config)
    }

    /// Finds the festival root by looking for a `.fest/` directory at or
    /// above `start`
    pub fn find_festival_root(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();

        loop {
            if current.join(FEST_DIR).is_dir() {
                return Some(current);
            }

            if !current.pop() {
                return None;
            }
        }
    }

    /// Returns the backup directory, resolved against the festival root
    pub fn backup_dir(&self) -> Option<PathBuf> {
        if !self.project.renumber.backup {
            return None;
        }
        let dir = &self.project.renumber.backup_dir;
        match &self.festival_root {
            Some(root) if dir.is_relative() => Some(root.join(dir)),
            _ => Some(dir.clone()),
        }
    }
}

impl ProjectConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.renumber.backup && self.renumber.backup_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "renumber.backup_dir must not be empty when backups are enabled".to_string(),
            ));
        }
        Ok(())
    }
}
