//! Structural commands (insert, remove, renumber, recover)

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Args, Subcommand};

use super::output::Output;
use crate::domain::{classify_level, Level};
use crate::storage::{self, Config, Festival};

#[derive(Subcommand)]
pub enum InsertCommands {
    /// Insert a phase into the festival root
    Phase(InsertArgs),

    /// Insert a sequence into a phase
    Sequence(InsertArgs),

    /// Insert a task into a sequence
    Task(InsertArgs),
}

#[derive(Args)]
pub struct InsertArgs {
    /// Directory receiving the new element
    pub dir: PathBuf,

    /// Number of the element to insert after (0 inserts at the beginning)
    #[arg(long)]
    pub after: u32,

    /// Name of the new element
    pub name: String,

    /// Show the renames without touching the filesystem
    #[arg(long)]
    pub dry_run: bool,
}

/// Opens the festival given on the command line, or the one holding `target`
fn open_festival(root: Option<&Path>, target: &Path) -> Result<Festival> {
    if root.is_none() {
        let found = target
            .canonicalize()
            .ok()
            .and_then(|path| Config::find_festival_root(&path));
        if let Some(found) = found {
            return Festival::open(found);
        }
    }
    Festival::locate(root)
}

pub fn insert(output: &Output, root: Option<&Path>, cmd: InsertCommands) -> Result<()> {
    let (level, args) = match cmd {
        InsertCommands::Phase(args) => (Level::Phase, args),
        InsertCommands::Sequence(args) => (Level::Sequence, args),
        InsertCommands::Task(args) => (Level::Task, args),
    };

    let festival = open_festival(root, &args.dir)?;
    let dir = festival.resolve(&args.dir);
    output.verbose_ctx(
        "insert",
        &format!("Inserting {} '{}' after {} in {}", level, args.name, args.after, dir.display()),
    );

    let renumberer = festival.renumberer(args.dry_run, output.is_verbose(), true);
    let report = renumberer.insert(&dir, level, args.after, &args.name)?;
    output.report(&report);

    Ok(())
}

pub fn remove(
    output: &Output,
    root: Option<&Path>,
    path: &Path,
    dry_run: bool,
    no_backup: bool,
) -> Result<()> {
    let festival = open_festival(root, path)?;
    let path = festival.resolve(path);
    output.verbose_ctx("remove", &format!("Removing {}", path.display()));

    let renumberer = festival.renumberer(dry_run, output.is_verbose(), no_backup);
    let report = renumberer.remove_element(&path)?;
    output.report(&report);

    Ok(())
}

pub fn renumber(output: &Output, root: Option<&Path>, dir: &Path, dry_run: bool) -> Result<()> {
    let festival = open_festival(root, dir)?;
    let dir = festival.resolve(dir);

    // The festival root holds phases; a phase holds sequences; a sequence holds tasks
    let level = match classify_level(&dir) {
        None => Level::Phase,
        Some(level) => level
            .child()
            .ok_or_else(|| anyhow::anyhow!("Not a directory of elements: {}", dir.display()))?,
    };
    output.verbose_ctx("renumber", &format!("Renumbering {}s in {}", level, dir.display()));

    let renumberer = festival.renumberer(dry_run, output.is_verbose(), true);
    let report = renumberer.normalize(&dir, level)?;
    output.report(&report);

    Ok(())
}

pub fn recover(output: &Output, root: Option<&Path>, dir: &Path, rollback: bool) -> Result<()> {
    let festival = open_festival(root, dir)?;
    let dir = festival.resolve(dir);

    let plan = if rollback {
        storage::rollback(&dir, output.is_verbose())?
    } else {
        storage::recover(&dir, output.is_verbose())?
    };

    let Some(plan) = plan else {
        if output.is_json() {
            output.data(&serde_json::json!({ "recovered": false }));
        } else {
            println!("Nothing to recover in {}", dir.display());
        }
        return Ok(());
    };

    if output.is_json() {
        output.data(&serde_json::json!({
            "recovered": true,
            "rolled_back": rollback,
            "renames": plan.renames(),
        }));
    } else {
        let verb = if rollback { "Rolled back" } else { "Recovered" };
        println!("{} {} rename(s) in {}", verb, plan.len(), dir.display());
        output.renames(plan.renames());
    }

    Ok(())
}
