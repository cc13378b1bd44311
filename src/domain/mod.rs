//! Domain models for festival-cli
//!
//! Contains the naming scheme, the element model and the dependency graph,
//! without any I/O concerns.

mod id;
mod element;
mod graph;

pub use id::{
    classify_level, format_id, normalize_name, parse_number, ElementName, IdError, Level,
    TASK_EXTENSION,
};
pub use element::{Element, Status, Task, TaskId, TaskKind};
pub use graph::{BlockedTask, CycleError, DependencyGraph, GraphError};
