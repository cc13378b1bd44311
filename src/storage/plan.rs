//! Staged rename plans
//!
//! Renumbering a sibling set is a batch of renames inside one directory. A
//! plan is validated as a whole, recorded in a journal
//! (`.fest-renumber.json` in that directory), then applied in two passes:
//! every source moves to a unique staging name, then every staging name
//! moves to its target. No intermediate state has two siblings competing
//! for one path, and an interrupted plan can be finished with [`recover`]
//! or undone with [`rollback`].
//!
//! A plan may also carry one [`Creation`], the element an insert opens a
//! slot for. It is written after every rename has landed, so recovery
//! finishes it along with the shift.

use std::collections::HashSet;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::renumber::RenumberError;

/// Journal file name, kept inside the directory being renumbered
pub const JOURNAL_FILE: &str = ".fest-renumber.json";

const STAGING_PREFIX: &str = ".fest-stage-";

/// A single move within one directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rename {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// A new element written once a plan's renames are in place
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creation {
    pub path: PathBuf,
    /// File body; `None` creates a directory
    pub content: Option<String>,
}

impl Creation {
    fn write(&self) -> Result<()> {
        match &self.content {
            Some(content) => fs::write(&self.path, content)
                .with_context(|| format!("Failed to create file: {}", self.path.display())),
            None => fs::create_dir(&self.path)
                .with_context(|| format!("Failed to create directory: {}", self.path.display())),
        }
    }

    /// Deletes the element again; a directory must still be empty
    fn remove(&self) -> Result<()> {
        match &self.content {
            Some(_) => fs::remove_file(&self.path)
                .with_context(|| format!("Failed to remove file: {}", self.path.display())),
            None => fs::remove_dir(&self.path)
                .with_context(|| format!("Failed to remove directory: {}", self.path.display())),
        }
    }
}

/// An ordered batch of renames inside one directory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenamePlan {
    dir: PathBuf,
    renames: Vec<Rename>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    create: Option<Creation>,
}

impl RenamePlan {
    /// Creates an empty plan for a directory
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            renames: Vec::new(),
            create: None,
        }
    }

    /// Appends a rename
    pub fn push(&mut self, from: PathBuf, to: PathBuf) {
        self.renames.push(Rename { from, to });
    }

    /// Writes a new element at `path` once the renames have landed
    pub fn create(&mut self, path: PathBuf, content: Option<String>) {
        self.create = Some(Creation { path, content });
    }

    /// Returns the directory the plan operates in
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the renames in application order
    pub fn renames(&self) -> &[Rename] {
        &self.renames
    }

    pub fn into_renames(self) -> Vec<Rename> {
        self.renames
    }

    /// True when the plan neither renames nor creates anything
    pub fn is_empty(&self) -> bool {
        self.renames.is_empty() && self.create.is_none()
    }

    pub fn len(&self) -> usize {
        self.renames.len()
    }

    /// Checks the plan for internal collisions and for targets held by
    /// elements outside the plan
    pub fn validate(&self) -> Result<(), RenumberError> {
        self.check(None)
    }

    /// Like [`validate`](Self::validate), treating `vacated` (an element
    /// about to be deleted) as free
    pub fn validate_vacating(&self, vacated: &Path) -> Result<(), RenumberError> {
        self.check(vacated.file_name())
    }

    fn check(&self, vacated: Option<&OsStr>) -> Result<(), RenumberError> {
        let mut sources = HashSet::new();
        for rename in &self.renames {
            if !sources.insert(rename.from.as_path()) {
                return Err(RenumberError::PlanCollision(rename.from.clone()));
            }
        }

        let mut targets = HashSet::new();
        for rename in &self.renames {
            if !targets.insert(rename.to.as_path()) {
                return Err(RenumberError::PlanCollision(rename.to.clone()));
            }
            let freed = vacated.is_some() && rename.to.file_name() == vacated;
            if present(&rename.to) && !freed && !sources.contains(rename.to.as_path()) {
                return Err(RenumberError::TargetExists(rename.to.clone()));
            }
        }

        if let Some(creation) = &self.create {
            if targets.contains(creation.path.as_path()) {
                return Err(RenumberError::PlanCollision(creation.path.clone()));
            }
            if present(&creation.path) && !sources.contains(creation.path.as_path()) {
                return Err(RenumberError::TargetExists(creation.path.clone()));
            }
        }

        Ok(())
    }

    /// Short content hash that names this plan's staging entries
    pub fn plan_id(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for rename in &self.renames {
            hasher.update(rename.from.to_string_lossy().as_bytes());
            hasher.update(b"\0");
            hasher.update(rename.to.to_string_lossy().as_bytes());
            hasher.update(b"\n");
        }
        if let Some(creation) = &self.create {
            hasher.update(creation.path.to_string_lossy().as_bytes());
        }
        hasher.finalize().to_hex()[..7].to_string()
    }

    /// Applies the plan through a journal and a staging pass
    pub fn apply(&self, verbose: bool) -> Result<()> {
        if self.is_empty() {
            return Ok(());
        }

        self.validate()?;
        ensure_no_pending(&self.dir)?;

        let journal_path = journal_path(&self.dir);
        let mut journal = Journal::new(self.clone());
        journal.save(&journal_path)?;

        journal.stage()?;
        journal.phase = JournalPhase::Finalizing;
        journal.save(&journal_path)?;

        journal.finalize(verbose)?;
        remove_journal(&journal_path)
    }
}

/// How far an interrupted plan got
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JournalPhase {
    /// Sources are moving to staging names
    Staging,
    /// Every source is staged; staging names are moving to targets
    Finalizing,
}

/// On-disk record of a plan in flight
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Journal {
    pub plan_id: String,
    pub phase: JournalPhase,
    pub started_at: DateTime<Utc>,
    pub plan: RenamePlan,
}

impl Journal {
    fn new(plan: RenamePlan) -> Self {
        Self {
            plan_id: plan.plan_id(),
            phase: JournalPhase::Staging,
            started_at: Utc::now(),
            plan,
        }
    }

    fn staging_path(&self, index: usize) -> PathBuf {
        self.plan
            .dir
            .join(format!("{}{}-{}", STAGING_PREFIX, self.plan_id, index))
    }

    /// Re-roots every path in `dir`, so a journal written under one working
    /// directory can be replayed from another
    fn rebase(&mut self, dir: &Path) {
        let rebase = |path: &Path| match path.file_name() {
            Some(name) => dir.join(name),
            None => path.to_path_buf(),
        };

        for rename in &mut self.plan.renames {
            rename.from = rebase(&rename.from);
            rename.to = rebase(&rename.to);
        }
        if let Some(creation) = &mut self.plan.create {
            creation.path = rebase(&creation.path);
        }
        self.plan.dir = dir.to_path_buf();
    }

    fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read journal: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse journal: {}", path.display()))
    }

    /// Writes the journal atomically (temp file + rename)
    fn save(&self, path: &Path) -> Result<()> {
        let temp_path = path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(self).context("Failed to serialize journal")?;

        fs::write(&temp_path, content)
            .with_context(|| format!("Failed to write temp file: {}", temp_path.display()))?;

        fs::rename(&temp_path, path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                temp_path.display(),
                path.display()
            )
        })
    }

    /// Moves every source not yet staged to its staging name
    fn stage(&self) -> Result<()> {
        for (index, rename) in self.plan.renames.iter().enumerate() {
            let staged = self.staging_path(index);
            if present(&staged) {
                continue;
            }
            move_path(&rename.from, &staged)?;
        }
        Ok(())
    }

    /// Moves every staged entry to its target, then writes the creation
    fn finalize(&self, verbose: bool) -> Result<()> {
        for (index, rename) in self.plan.renames.iter().enumerate() {
            let staged = self.staging_path(index);
            if !present(&staged) {
                if present(&rename.to) {
                    continue;
                }
                anyhow::bail!(
                    "Lost track of {}: neither {} nor {} exists",
                    rename.from.display(),
                    staged.display(),
                    rename.to.display()
                );
            }

            if present(&rename.to) {
                return Err(RenumberError::TargetExists(rename.to.clone()).into());
            }

            move_path(&staged, &rename.to)?;
            log_rename(&rename.from, &rename.to, verbose);
        }

        if let Some(creation) = &self.plan.create {
            if !present(&creation.path) {
                creation.write()?;
                tracing::debug!("Created {}", display_name(&creation.path));
            }
        }
        Ok(())
    }

    /// Returns every entry to its original name
    fn unwind(&self, verbose: bool) -> Result<()> {
        if self.phase == JournalPhase::Finalizing {
            // The creation is written last, so it only exists once every
            // rename has landed
            if let Some(creation) = &self.plan.create {
                if present(&creation.path) && self.finalized() {
                    creation.remove()?;
                    tracing::debug!("Removed {}", display_name(&creation.path));
                }
            }

            // All sources were staged before any target was written, so an
            // existing target belongs to a finalized entry
            for (index, rename) in self.plan.renames.iter().enumerate() {
                let staged = self.staging_path(index);
                if !present(&staged) && present(&rename.to) {
                    move_path(&rename.to, &staged)?;
                }
            }
        }

        for (index, rename) in self.plan.renames.iter().enumerate() {
            let staged = self.staging_path(index);
            if present(&staged) {
                move_path(&staged, &rename.from)?;
                log_rename(&rename.to, &rename.from, verbose);
            }
        }
        Ok(())
    }

    /// True once no entry is left under a staging name
    fn finalized(&self) -> bool {
        (0..self.plan.renames.len()).all(|index| !present(&self.staging_path(index)))
    }
}

/// Like `Path::exists`, without following symlinks
fn present(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

fn move_path(from: &Path, to: &Path) -> Result<()> {
    fs::rename(from, to)
        .with_context(|| format!("Failed to rename {} to {}", from.display(), to.display()))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn log_rename(from: &Path, to: &Path, verbose: bool) {
    let (from, to) = (display_name(from), display_name(to));
    if verbose {
        tracing::info!("Renamed {} -> {}", from, to);
    } else {
        tracing::debug!("Renamed {} -> {}", from, to);
    }
}

fn remove_journal(path: &Path) -> Result<()> {
    fs::remove_file(path)
        .with_context(|| format!("Failed to remove journal: {}", path.display()))
}

/// Returns the journal path for a directory
pub fn journal_path(dir: &Path) -> PathBuf {
    dir.join(JOURNAL_FILE)
}

/// Loads the journal left in `dir` by an interrupted plan, if any
pub fn pending_journal(dir: &Path) -> Result<Option<Journal>> {
    let path = journal_path(dir);
    if !present(&path) {
        return Ok(None);
    }

    let mut journal = Journal::load(&path)?;
    journal.rebase(dir);
    Ok(Some(journal))
}

/// Fails if `dir` holds the journal of an unfinished plan
pub fn ensure_no_pending(dir: &Path) -> Result<()> {
    if present(&journal_path(dir)) {
        return Err(RenumberError::JournalPending(dir.to_path_buf()).into());
    }
    Ok(())
}

/// Finishes an interrupted plan, returning it if there was one
pub fn recover(dir: &Path, verbose: bool) -> Result<Option<RenamePlan>> {
    let Some(mut journal) = pending_journal(dir)? else {
        return Ok(None);
    };
    let path = journal_path(dir);
    tracing::info!(
        "Resuming renumber plan {} in {} ({:?})",
        journal.plan_id,
        dir.display(),
        journal.phase
    );

    if journal.phase == JournalPhase::Staging {
        journal.stage()?;
        journal.phase = JournalPhase::Finalizing;
        journal.save(&path)?;
    }

    journal.finalize(verbose)?;
    remove_journal(&path)?;
    Ok(Some(journal.plan))
}

/// Undoes an interrupted plan, returning it if there was one
pub fn rollback(dir: &Path, verbose: bool) -> Result<Option<RenamePlan>> {
    let Some(journal) = pending_journal(dir)? else {
        return Ok(None);
    };
    tracing::info!(
        "Rolling back renumber plan {} in {} ({:?})",
        journal.plan_id,
        dir.display(),
        journal.phase
    );

    journal.unwind(verbose)?;
    remove_journal(&journal_path(dir))?;
    Ok(Some(journal.plan))
}
