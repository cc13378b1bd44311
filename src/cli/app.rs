//! Main CLI application structure

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use super::output::{Output, OutputFormat};
use super::{query, structure};
use crate::storage::{Config, Festival};

#[derive(Parser)]
#[command(name = "fest")]
#[command(author, version, about = "Numbered festival plans with dependency-aware task queries")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (defaults to the global config, then text)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Festival root (defaults to the nearest directory holding .fest/)
    #[arg(long, global = true, env = "FEST_ROOT")]
    pub festival: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new festival
    Init {
        /// Path to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Insert a phase, sequence or task, shifting later siblings
    #[command(subcommand)]
    Insert(structure::InsertCommands),

    /// Remove a phase, sequence or task, shifting later siblings down
    Remove {
        /// Path of the element to remove
        path: PathBuf,

        /// Show the renames without touching the filesystem
        #[arg(long)]
        dry_run: bool,

        /// Skip the backup copy
        #[arg(long)]
        no_backup: bool,
    },

    /// Renumber the elements of a directory to close gaps
    Renumber {
        /// Festival root, phase or sequence directory
        dir: PathBuf,

        /// Show the renames without touching the filesystem
        #[arg(long)]
        dry_run: bool,
    },

    /// Finish (or undo) a renumber that was interrupted
    Recover {
        /// Directory holding the renumber journal
        dir: PathBuf,

        /// Undo the interrupted renames instead of finishing them
        #[arg(long)]
        rollback: bool,
    },

    /// Show tasks ready to work on
    Ready,

    /// Show blocked tasks
    Blocked,

    /// Dependency graph queries
    #[command(subcommand)]
    Graph(query::GraphCommands),

    /// Show festival status overview
    Status,
}

/// Installs the stderr log subscriber; `RUST_LOG` overrides the level
fn init_tracing(verbose: bool) {
    let default = if verbose {
        "festival_cli=debug"
    } else {
        "festival_cli=warn"
    };
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| default.into()),
    );

    // stdout is reserved for command output
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let format = match cli.format {
        Some(format) => format,
        None => Config::load_global()?.default_format,
    };
    let output = Output::new(format, cli.verbose);

    output.verbose("fest starting");
    let result = execute(&output, cli.festival.as_deref(), cli.command);

    // JSON callers get the failure on stderr as an object
    if let Err(e) = &result {
        if output.is_json() {
            output.error(&format!("{:#}", e));
            std::process::exit(1);
        }
    }

    result?;
    output.verbose("Command completed successfully");
    Ok(())
}

fn execute(output: &Output, root: Option<&Path>, command: Commands) -> Result<()> {
    match command {
        Commands::Init { path } => {
            let path = root.map(Path::to_path_buf).unwrap_or(path);
            output.verbose_ctx("init", &format!("Initializing festival at: {}", path.display()));
            let festival = Festival::init(&path)?;
            output.verbose_ctx(
                "init",
                &format!("Created .fest directory at: {}", festival.fest_dir().display()),
            );
            output.success(&format!("Initialized festival at {}", festival.root().display()));
        }

        Commands::Insert(cmd) => structure::insert(output, root, cmd)?,

        Commands::Remove { path, dry_run, no_backup } => {
            structure::remove(output, root, &path, dry_run, no_backup)?
        }

        Commands::Renumber { dir, dry_run } => structure::renumber(output, root, &dir, dry_run)?,

        Commands::Recover { dir, rollback } => structure::recover(output, root, &dir, rollback)?,

        Commands::Ready => {
            output.verbose_ctx("ready", "Querying ready tasks");
            query::ready(output, root)?
        }
        Commands::Blocked => {
            output.verbose_ctx("blocked", "Querying blocked tasks");
            query::blocked(output, root)?
        }
        Commands::Graph(cmd) => query::graph(output, root, cmd)?,
        Commands::Status => {
            output.verbose("Gathering festival status");
            query::status(output, root)?
        }
    }

    Ok(())
}
