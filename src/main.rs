//! fest - numbered festival plans with dependency-aware task queries

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = festival_cli::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
