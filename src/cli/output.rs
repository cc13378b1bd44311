//! Output formatting for CLI commands

use std::path::Path;

use serde::Serialize;

pub use crate::storage::OutputFormat;
use crate::storage::{Rename, RenumberReport};

/// Output helper for consistent formatting
pub struct Output {
    format: OutputFormat,
    verbose: bool,
}

impl Output {
    pub fn new(format: OutputFormat, verbose: bool) -> Self {
        Self { format, verbose }
    }

    /// Prints a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Text => println!("{}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({
                        "success": true,
                        "message": message
                    })
                );
            }
        }
    }

    /// Prints an error message on stderr
    pub fn error(&self, message: &str) {
        match self.format {
            OutputFormat::Text => eprintln!("Error: {}", message),
            OutputFormat::Json => {
                eprintln!(
                    "{}",
                    serde_json::json!({
                        "success": false,
                        "error": message
                    })
                );
            }
        }
    }

    /// Prints structured data as one JSON line (JSON only, ignored in text mode)
    pub fn data<T: Serialize>(&self, data: &T) {
        if self.format != OutputFormat::Json {
            return;
        }
        match serde_json::to_string(data) {
            Ok(json) => println!("{}", json),
            Err(e) => tracing::error!("Failed to serialize output: {}", e),
        }
    }

    /// Prints what an insert, remove or renumber did (or would do)
    pub fn report(&self, report: &RenumberReport) {
        if self.is_json() {
            self.data(report);
            return;
        }

        if report.dry_run {
            println!("Dry run, no changes made:");
        }
        if let Some(backup) = &report.backup {
            println!("Backup: {}", backup.display());
        }
        if let Some(removed) = &report.removed {
            println!("Removed: {}", removed.display());
        }
        self.renames(&report.renames);
        if let Some(created) = &report.created {
            println!("Created: {}", created.display());
        }
        if report.renames.is_empty() {
            println!("No renames needed.");
        }
    }

    /// Prints renames as `from -> to` lines of bare names (text only)
    pub fn renames(&self, renames: &[Rename]) {
        if self.is_json() {
            return;
        }
        for rename in renames {
            println!("  {} -> {}", file_name(&rename.from), file_name(&rename.to));
        }
    }

    /// Prints a table row (text only, ignored in JSON mode)
    pub fn row(&self, columns: &[&str]) {
        if self.format == OutputFormat::Text {
            println!("{}", columns.join("\t"));
        }
    }

    /// Prints a blank line (text only)
    pub fn blank(&self) {
        if self.format == OutputFormat::Text {
            println!();
        }
    }

    /// Returns true if using JSON format
    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    /// Returns true if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Prints a verbose debug message (only when --verbose is set)
    pub fn verbose(&self, message: &str) {
        if self.verbose {
            eprintln!("[verbose] {}", message);
        }
    }

    /// Prints a verbose debug message with context (only when --verbose is set)
    pub fn verbose_ctx(&self, context: &str, message: &str) {
        if self.verbose {
            eprintln!("[verbose:{}] {}", context, message);
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_strips_directories() {
        assert_eq!(file_name(Path::new("/festival/001_PLAN")), "001_PLAN");
        assert_eq!(file_name(Path::new("01_a.md")), "01_a.md");
        assert_eq!(file_name(Path::new("/")), "/");
    }

    #[test]
    fn format_flags() {
        let output = Output::new(OutputFormat::Json, true);
        assert!(output.is_json());
        assert!(output.is_verbose());

        let output = Output::new(OutputFormat::Text, false);
        assert!(!output.is_json());
        assert!(!output.is_verbose());
    }
}
