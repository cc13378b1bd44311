//! # Command-Line Interface
//!
//! User-facing CLI commands and output formatting.
//!
//! ## Command Groups
//!
//! | Group | Purpose | Examples |
//! |-------|---------|----------|
//! | Core | Festival setup | `init`, `status` |
//! | Structure | Numbered edits | `insert task`, `remove`, `renumber`, `recover` |
//! | Query | Task state queries | `ready`, `blocked` |
//! | Graph | Dependency analysis | `graph order`, `graph critical-path`, `graph check` |
//!
//! ## Output Formats
//!
//! All commands support `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! ## Verbose Mode
//!
//! Use `--verbose` (or `-v`) for debug output; `RUST_LOG` overrides the
//! log filter:
//! ```bash
//! fest --verbose insert task 001_PLAN/01_setup --after 2 configure
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod output;
mod query;
mod structure;

pub use app::{run, Cli, Commands};
pub use output::{Output, OutputFormat};
