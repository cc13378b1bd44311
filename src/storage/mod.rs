//! # Storage Layer
//!
//! The festival lives on disk as numbered directories and markdown files;
//! this layer reads that tree and edits it in place.
//!
//! ## Layout
//!
//! ```text
//! festival/
//! ├── .fest/
//! │   ├── config.toml           # Festival configuration
//! │   ├── backups/              # Copies of removed elements
//! │   └── .gitignore            # Ignores backups
//! ├── 001_PLAN/                 # Phase: three digits, upper case
//! │   ├── 01_research/          # Sequence: two digits, lower case
//! │   │   ├── 01_survey.md      # Task: two digits, markdown
//! │   │   ├── 02_api.md         # Same number: parallel tasks
//! │   │   └── 02_schema.md
//! │   └── 02_decide/
//! └── 002_BUILD/
//! ```
//!
//! ## Crash Safety
//!
//! Renames are staged through hidden names and journaled in
//! `.fest-renumber.json` inside the directory being renumbered. The element
//! an insert creates is journaled with its shift. An interrupted run is
//! finished by [`recover`] or undone by [`rollback`].
//!
//! ## Key Types
//!
//! - [`Festival`] - Entry point for a festival root
//! - [`Renumberer`] - Insert, remove and normalize elements
//! - [`RenamePlan`] - A validated set of renames applied atomically per directory
//! - [`FestivalTree`] - Scanned phases, sequences and tasks
//! - [`Config`] - Festival and global configuration

mod config;
mod festival;
mod plan;
mod renumber;
mod scan;

pub use config::{Config, ConfigError, GlobalConfig, OutputFormat, ProjectConfig, FEST_DIR};
pub use festival::{Festival, FestivalError};
pub use plan::{
    ensure_no_pending, journal_path, pending_journal, recover, rollback, Creation, Journal, JournalPhase,
    Rename, RenamePlan, JOURNAL_FILE,
};
pub use renumber::{siblings, RenumberError, RenumberOptions, RenumberReport, Renumberer, Sibling};
pub use scan::{scan_festival, FestivalTree, PhaseNode, ScanOptions, SequenceNode};
