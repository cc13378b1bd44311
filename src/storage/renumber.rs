//! Renumbering engine
//!
//! Keeps a sibling set (phases in a festival, sequences in a phase, tasks in
//! a sequence) numbered `1..N` as elements are inserted or removed. Every
//! shift is computed up front as a [`RenamePlan`] and applied through the
//! staged, journaled executor in [`super::plan`].
//!
//! Tasks sharing a number form a parallel group; shifting moves whole
//! groups, and removing one member of a group leaves the numbering alone.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use thiserror::Error;

use super::plan::{self, Rename, RenamePlan};
use crate::domain::{classify_level, format_id, ElementName, IdError, Level};

#[derive(Debug, Error)]
pub enum RenumberError {
    #[error(transparent)]
    Id(#[from] IdError),

    #[error("Cannot insert after {level} {after}: the highest {level} number is {max}")]
    InvalidPosition { level: Level, after: u32, max: u32 },

    #[error("Target already exists: {0}")]
    TargetExists(PathBuf),

    #[error("Rename plan maps two elements onto {0}")]
    PlanCollision(PathBuf),

    #[error("An unfinished renumber is pending in {0}; run 'fest recover' first")]
    JournalPending(PathBuf),

    #[error("Not a festival element: {0}")]
    NotAnElement(PathBuf),
}

/// An element found in a sibling directory
#[derive(Debug, Clone)]
pub struct Sibling {
    pub name: ElementName,
    pub path: PathBuf,
}

/// Lists the elements of one level inside `dir`, sorted by `(number, name)`
///
/// Dot entries, symlinks and names that don't match the level's pattern are
/// skipped.
pub fn siblings(dir: &Path, level: Level) -> Result<Vec<Sibling>> {
    let mut found = Vec::new();

    for entry in fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?
    {
        let entry = entry.context("Failed to read directory entry")?;
        let path = entry.path();
        let file_type = entry
            .file_type()
            .with_context(|| format!("Failed to read file type: {}", path.display()))?;

        if file_type.is_symlink()
            || classify_level(&path) != Some(level)
            || file_type.is_dir() == level.is_file()
        {
            continue;
        }

        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if let Ok(name) = ElementName::parse(level, file_name) {
            found.push(Sibling { name, path });
        }
    }

    found.sort_by(|a, b| {
        a.name
            .number
            .cmp(&b.name.number)
            .then_with(|| a.name.name.cmp(&b.name.name))
    });
    Ok(found)
}

/// Options for a renumbering operation
#[derive(Debug, Clone, Default)]
pub struct RenumberOptions {
    /// Compute the plan without touching the filesystem
    pub dry_run: bool,

    /// Log each rename at info level as it is applied
    pub verbose: bool,

    /// Copy removed elements here (under a timestamped directory) first
    pub backup_dir: Option<PathBuf>,
}

/// What a renumbering operation did (or would do, for a dry run)
#[derive(Debug, Clone, Default, Serialize)]
pub struct RenumberReport {
    pub dry_run: bool,
    pub renames: Vec<Rename>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removed: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<PathBuf>,
}

/// Inserts, removes and renumbers festival elements on disk
#[derive(Debug, Clone, Default)]
pub struct Renumberer {
    options: RenumberOptions,
}

impl Renumberer {
    pub fn new(options: RenumberOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RenumberOptions {
        &self.options
    }

    /// Inserts a phase directory into a festival root
    pub fn insert_phase(&self, root: &Path, after: u32, name: &str) -> Result<RenumberReport> {
        self.insert(root, Level::Phase, after, name)
    }

    /// Inserts a sequence directory into a phase
    pub fn insert_sequence(&self, phase_dir: &Path, after: u32, name: &str) -> Result<RenumberReport> {
        self.insert(phase_dir, Level::Sequence, after, name)
    }

    /// Inserts a task file into a sequence
    pub fn insert_task(&self, sequence_dir: &Path, after: u32, name: &str) -> Result<RenumberReport> {
        self.insert(sequence_dir, Level::Task, after, name)
    }

    /// Inserts a new element at `after + 1`, shifting later siblings up
    ///
    /// `after = 0` inserts at the beginning. The new element is part of the
    /// journaled plan, so `recover` finishes it along with the shift.
    pub fn insert(&self, dir: &Path, level: Level, after: u32, name: &str) -> Result<RenumberReport> {
        let siblings = siblings(dir, level)?;

        let max = siblings.last().map_or(0, |s| s.name.number);
        let position = after
            .checked_add(1)
            .filter(|_| after <= max)
            .ok_or(RenumberError::InvalidPosition { level, after, max })?;
        let new_name = format_id(level, position, name).map_err(RenumberError::from)?;

        // Highest first
        let mut plan = RenamePlan::new(dir);
        for sibling in siblings.iter().rev().filter(|s| s.name.number > after) {
            let renamed = sibling
                .name
                .with_number(sibling.name.number + 1)
                .map_err(RenumberError::from)?;
            plan.push(sibling.path.clone(), dir.join(renamed.to_string()));
        }

        let created = dir.join(&new_name);
        let content = level.is_file().then(|| format!("# {}\n", task_title(name)));
        plan.create(created.clone(), content);
        plan.validate()?;

        let mut report = RenumberReport {
            dry_run: self.options.dry_run,
            created: Some(created.clone()),
            ..Default::default()
        };

        if self.options.dry_run {
            report.renames = plan.into_renames();
            return Ok(report);
        }

        plan::ensure_no_pending(dir)?;
        plan.apply(self.options.verbose)?;
        tracing::info!("Created {} {}", level, new_name);

        report.renames = plan.into_renames();
        Ok(report)
    }

    /// Removes an element and shifts later siblings down
    pub fn remove_element(&self, path: &Path) -> Result<RenumberReport> {
        let level = classify_level(path)
            .ok_or_else(|| RenumberError::NotAnElement(path.to_path_buf()))?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| RenumberError::NotAnElement(path.to_path_buf()))?;
        let removed = ElementName::parse(level, file_name).map_err(RenumberError::from)?;

        if !path.exists() {
            anyhow::bail!("Element not found: {}", path.display());
        }

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let siblings = siblings(&dir, level)?;

        // A number still held by a parallel sibling stays in place
        let vacated = !siblings
            .iter()
            .any(|s| s.name.number == removed.number && s.name != removed);

        // Lowest first
        let mut plan = RenamePlan::new(&dir);
        if vacated {
            for sibling in siblings.iter().filter(|s| s.name.number > removed.number) {
                let renamed = sibling
                    .name
                    .with_number(sibling.name.number - 1)
                    .map_err(RenumberError::from)?;
                plan.push(sibling.path.clone(), dir.join(renamed.to_string()));
            }
        }
        plan.validate_vacating(path)?;

        let backup = self.options.backup_dir.as_ref().map(|backup_dir| {
            backup_dir
                .join(Utc::now().format("%Y%m%dT%H%M%S%.3f").to_string())
                .join(file_name)
        });

        let mut report = RenumberReport {
            dry_run: self.options.dry_run,
            removed: Some(path.to_path_buf()),
            backup: backup.clone(),
            ..Default::default()
        };

        if self.options.dry_run {
            report.renames = plan.into_renames();
            return Ok(report);
        }

        plan::ensure_no_pending(&dir)?;

        if let Some(backup) = &backup {
            copy_recursively(path, backup)?;
            tracing::info!("Backed up {} to {}", file_name, backup.display());
        }

        if path.is_dir() {
            fs::remove_dir_all(path)
                .with_context(|| format!("Failed to remove directory: {}", path.display()))?;
        } else {
            fs::remove_file(path)
                .with_context(|| format!("Failed to remove file: {}", path.display()))?;
        }
        tracing::info!("Removed {} {}", level, file_name);

        plan.apply(self.options.verbose)?;

        report.renames = plan.into_renames();
        Ok(report)
    }

    /// Renumbers a sibling set to `1..N`, closing gaps
    ///
    /// Relative order is kept and tasks sharing a number keep sharing one.
    pub fn normalize(&self, dir: &Path, level: Level) -> Result<RenumberReport> {
        let siblings = siblings(dir, level)?;

        let mut plan = RenamePlan::new(dir);
        let mut next = 0;
        let mut previous = None;
        for sibling in &siblings {
            if previous != Some(sibling.name.number) {
                next += 1;
                previous = Some(sibling.name.number);
            }
            if sibling.name.number != next {
                let renamed = sibling.name.with_number(next).map_err(RenumberError::from)?;
                plan.push(sibling.path.clone(), dir.join(renamed.to_string()));
            }
        }
        plan.validate()?;

        let mut report = RenumberReport {
            dry_run: self.options.dry_run,
            ..Default::default()
        };

        if !self.options.dry_run {
            plan::ensure_no_pending(dir)?;
            plan.apply(self.options.verbose)?;
        }

        report.renames = plan.into_renames();
        Ok(report)
    }
}

/// Heading written into a new task file
fn task_title(name: &str) -> &str {
    name.trim().trim_end_matches(".md")
}

fn copy_recursively(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    if !from.is_dir() {
        fs::copy(from, to).with_context(|| {
            format!("Failed to copy {} to {}", from.display(), to.display())
        })?;
        return Ok(());
    }

    fs::create_dir_all(to)
        .with_context(|| format!("Failed to create directory: {}", to.display()))?;
    for entry in fs::read_dir(from)
        .with_context(|| format!("Failed to read directory: {}", from.display()))?
    {
        let entry = entry.context("Failed to read directory entry")?;
        copy_recursively(&entry.path(), &to.join(entry.file_name()))?;
    }
    Ok(())
}
