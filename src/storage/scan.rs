//! Festival tree scanner
//!
//! Walks `root/NNN_PHASE/NN_sequence/NN_task.md` and produces the element
//! and task records the renumbering engine and dependency graph work on.
//!
//! A task file may start with YAML frontmatter:
//!
//! ```text
//! ---
//! status: in_progress
//! kind: review
//! depends_on: [01_design, 02_build/01_api]
//! ---
//! ```
//!
//! Without a `status`, checkboxes decide: every `- [x]` checked means
//! complete, some checked means in progress. Dependency references are a
//! task stem in the same sequence, `SEQUENCE/TASK` in the same phase, or a
//! full task ID.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::renumber::siblings;
use crate::domain::{DependencyGraph, Element, GraphError, Level, Status, Task, TaskId, TaskKind};

/// Options for building tasks from a tree
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanOptions {
    /// Make each task depend on the tasks of the preceding number in its
    /// sequence, in addition to declared dependencies
    pub infer_sequence_order: bool,
}

/// Frontmatter of a task file
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TaskFrontmatter {
    status: Option<Status>,
    kind: TaskKind,
    depends_on: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SequenceNode {
    #[serde(flatten)]
    pub element: Element,
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PhaseNode {
    #[serde(flatten)]
    pub element: Element,
    pub sequences: Vec<SequenceNode>,
}

/// A scanned festival
#[derive(Debug, Clone, Serialize)]
pub struct FestivalTree {
    pub root: PathBuf,
    pub phases: Vec<PhaseNode>,
}

impl FestivalTree {
    /// Iterates over every task in tree order
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.phases
            .iter()
            .flat_map(|p| &p.sequences)
            .flat_map(|s| &s.tasks)
    }

    /// Builds the dependency graph of every task in the tree
    pub fn dependency_graph(&self) -> Result<DependencyGraph, GraphError> {
        DependencyGraph::from_tasks(self.tasks().cloned())
    }

    /// Aggregate status of the whole festival
    pub fn status(&self) -> Status {
        Status::aggregate(self.phases.iter().map(|p| p.element.status))
    }
}

/// Scans a festival root
pub fn scan_festival(root: &Path, options: &ScanOptions) -> Result<FestivalTree> {
    let mut phases = Vec::new();

    for phase in siblings(root, Level::Phase)? {
        let mut sequences = Vec::new();

        for sequence in siblings(&phase.path, Level::Sequence)? {
            let prefix = format!("{}/{}", phase.name, sequence.name);
            let mut tasks = Vec::new();

            for task in siblings(&sequence.path, Level::Task)? {
                let content = fs::read_to_string(&task.path)
                    .with_context(|| format!("Failed to read task file: {}", task.path.display()))?;

                let frontmatter = match parse_frontmatter(&content) {
                    Ok(frontmatter) => frontmatter,
                    Err(e) => {
                        tracing::warn!("Ignoring frontmatter of {}: {:#}", task.path.display(), e);
                        TaskFrontmatter::default()
                    }
                };

                let status = frontmatter
                    .status
                    .unwrap_or_else(|| checkbox_status(&content));

                let mut record = Task {
                    id: TaskId::new(format!("{}/{}", prefix, task.name.stem())),
                    number: task.name.number,
                    name: task.name.name.clone(),
                    path: task.path.clone(),
                    status,
                    kind: frontmatter.kind,
                    depends_on: Vec::new(),
                };
                for reference in &frontmatter.depends_on {
                    record.add_dependency(resolve_reference(
                        &phase.name.to_string(),
                        &sequence.name.to_string(),
                        reference,
                    ));
                }
                tasks.push(record);
            }

            if options.infer_sequence_order {
                infer_sequence_order(&mut tasks);
            }

            let status = Status::aggregate(tasks.iter().map(|t| t.status));
            sequences.push(SequenceNode {
                element: Element::new(&sequence.name, &sequence.path, status),
                tasks,
            });
        }

        let status = Status::aggregate(sequences.iter().map(|s| s.element.status));
        phases.push(PhaseNode {
            element: Element::new(&phase.name, &phase.path, status),
            sequences,
        });
    }

    Ok(FestivalTree {
        root: root.to_path_buf(),
        phases,
    })
}

/// Parses leading YAML frontmatter; content without one yields defaults
fn parse_frontmatter(content: &str) -> Result<TaskFrontmatter> {
    let content = content.trim_start();

    let Some(rest) = content.strip_prefix("---") else {
        return Ok(TaskFrontmatter::default());
    };

    let end_pos = rest
        .find("\n---")
        .ok_or_else(|| anyhow::anyhow!("Missing frontmatter end delimiter (---)"))?;

    let yaml_content = rest[..end_pos].trim();
    if yaml_content.is_empty() {
        return Ok(TaskFrontmatter::default());
    }

    serde_yaml::from_str(yaml_content).context("Failed to parse frontmatter")
}

/// Derives a status from markdown checkboxes
fn checkbox_status(content: &str) -> Status {
    let mut open = 0;
    let mut checked = 0;

    for line in content.lines() {
        let line = line.trim_start();
        let Some(item) = line.strip_prefix("- [").or_else(|| line.strip_prefix("* [")) else {
            continue;
        };
        if item.starts_with("x]") || item.starts_with("X]") {
            checked += 1;
        } else if item.starts_with(" ]") {
            open += 1;
        }
    }

    match (checked, open) {
        (0, _) => Status::Pending,
        (_, 0) => Status::Complete,
        _ => Status::InProgress,
    }
}

/// Qualifies a dependency reference relative to the referring task
fn resolve_reference(phase: &str, sequence: &str, reference: &str) -> TaskId {
    let reference = reference.trim().trim_matches('/');
    let reference = reference.strip_suffix(".md").unwrap_or(reference);

    match reference.matches('/').count() {
        0 => TaskId::new(format!("{}/{}/{}", phase, sequence, reference)),
        1 => TaskId::new(format!("{}/{}", phase, reference)),
        _ => TaskId::new(reference),
    }
}

/// Adds edges from every task of the previous number group in a sequence
fn infer_sequence_order(tasks: &mut [Task]) {
    let mut previous: Vec<TaskId> = Vec::new();
    let mut current: Vec<TaskId> = Vec::new();
    let mut current_number = None;

    for task in tasks.iter_mut() {
        if current_number != Some(task.number) {
            previous = std::mem::take(&mut current);
            current_number = Some(task.number);
        }
        for dep in &previous {
            task.add_dependency(dep.clone());
        }
        current.push(task.id.clone());
    }
}
