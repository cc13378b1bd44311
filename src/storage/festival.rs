//! Festival management
//!
//! Handles festival initialization and ties configuration, scanning and
//! renumbering to one root directory.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use super::config::{Config, FEST_DIR};
use super::renumber::{RenumberOptions, Renumberer};
use super::scan::{scan_festival, FestivalTree, ScanOptions};

#[derive(Debug, Error)]
pub enum FestivalError {
    #[error("Not in a festival. Run 'fest init' first.")]
    NotInFestival,

    #[error("Festival root does not exist: {0}")]
    MissingRoot(PathBuf),
}

/// A festival rooted at a directory holding `.fest/`
pub struct Festival {
    root: PathBuf,
    config: Config,
}

impl Festival {
    /// Opens an existing festival at the given path
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();

        if !root.join(FEST_DIR).is_dir() {
            return Err(FestivalError::NotInFestival.into());
        }

        let config = Config::for_festival(&root)?;

        Ok(Self { root, config })
    }

    /// Opens `root` when given, otherwise the festival containing the
    /// current directory
    ///
    /// An explicit root doesn't need `.fest/`; defaults apply without it.
    pub fn locate(root: Option<&Path>) -> Result<Self> {
        match root {
            Some(root) => {
                if !root.is_dir() {
                    return Err(FestivalError::MissingRoot(root.to_path_buf()).into());
                }
                let config = Config::for_festival(root)?;
                Ok(Self {
                    root: root.to_path_buf(),
                    config,
                })
            }
            None => {
                let current = std::env::current_dir().context("Failed to read current directory")?;
                let root =
                    Config::find_festival_root(&current).ok_or(FestivalError::NotInFestival)?;
                Self::open(root)
            }
        }
    }

    /// Initializes a new festival at the given path
    pub fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let fest_dir = root.join(FEST_DIR);

        fs::create_dir_all(&fest_dir)
            .with_context(|| format!("Failed to create .fest directory: {}", fest_dir.display()))?;

        let config_path = fest_dir.join("config.toml");
        if !config_path.exists() {
            let default_config = r#"# Festival configuration

[renumber]
# Copy removed elements aside before deleting them
backup = true
backup_dir = ".fest/backups"

[graph]
# Make each task depend on the previous task number in its sequence
infer_sequence_order = false
"#;
            fs::write(&config_path, default_config)
                .with_context(|| format!("Failed to write config: {}", config_path.display()))?;
        }

        let gitignore_path = fest_dir.join(".gitignore");
        if !gitignore_path.exists() {
            let gitignore = r#"# Ignore backups of removed elements
backups/
"#;
            fs::write(&gitignore_path, gitignore).with_context(|| {
                format!("Failed to write .gitignore: {}", gitignore_path.display())
            })?;
        }

        Self::open(root)
    }

    /// Returns the festival root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the .fest directory path
    pub fn fest_dir(&self) -> PathBuf {
        self.root.join(FEST_DIR)
    }

    /// Returns the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Resolves a path given on the command line against the festival root
    ///
    /// Relative paths that exist from the current directory win.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() || path.exists() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Scans the festival tree
    pub fn scan(&self) -> Result<FestivalTree> {
        let options = ScanOptions {
            infer_sequence_order: self.config.project.graph.infer_sequence_order,
        };
        scan_festival(&self.root, &options)
    }

    /// Builds a renumberer using the festival's backup settings
    pub fn renumberer(&self, dry_run: bool, verbose: bool, no_backup: bool) -> Renumberer {
        Renumberer::new(RenumberOptions {
            dry_run,
            verbose,
            backup_dir: if no_backup {
                None
            } else {
                self.config.backup_dir()
            },
        })
    }
}
