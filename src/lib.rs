//! festival-cli - numbered festival plans kept on disk
//!
//! A festival is a plan laid out as numbered directories: phases hold
//! sequences, sequences hold task files. This crate keeps the numbering
//! contiguous across inserts and removals (with crash-safe renames) and
//! answers dependency questions about the tasks: execution order, the
//! critical path, parallel groups and what is ready to start.

pub mod domain;
pub mod storage;
pub mod cli;

pub use domain::{DependencyGraph, Element, Level, Status, Task, TaskId, TaskKind};
pub use storage::{Festival, Renumberer};
