//! Festival elements and tasks
//!
//! Phases, sequences and tasks share one shape: a number among siblings, a
//! name, a path on disk and a status. Tasks additionally carry an ID, the
//! IDs of the tasks they depend on, and an explicit role.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::id::{ElementName, Level};

/// Status of an element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Pending,
    #[serde(alias = "in-progress")]
    InProgress,
    Blocked,
    #[serde(alias = "completed", alias = "done")]
    Complete,
}

impl Status {
    /// Returns true if this status represents completion
    pub fn is_complete(&self) -> bool {
        matches!(self, Status::Complete)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::InProgress => "in_progress",
            Status::Blocked => "blocked",
            Status::Complete => "complete",
        }
    }

    /// Aggregates child statuses into a parent status
    pub fn aggregate(statuses: impl IntoIterator<Item = Status>) -> Status {
        let mut total = 0;
        let mut complete = 0;
        let mut started = false;
        let mut blocked = false;

        for status in statuses {
            total += 1;
            match status {
                Status::Complete => complete += 1,
                Status::InProgress => started = true,
                Status::Blocked => blocked = true,
                Status::Pending => {}
            }
        }

        if total > 0 && complete == total {
            Status::Complete
        } else if started || complete > 0 {
            Status::InProgress
        } else if blocked {
            Status::Blocked
        } else {
            Status::Pending
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(Status::Pending),
            "in_progress" | "in-progress" => Ok(Status::InProgress),
            "blocked" => Ok(Status::Blocked),
            "complete" | "completed" | "done" => Ok(Status::Complete),
            other => Err(format!("unknown status '{}'", other)),
        }
    }
}

/// Role of a task, declared by the task file rather than guessed from its name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    #[default]
    Work,
    Testing,
    Review,
    Iterate,
}

impl TaskKind {
    /// Returns true for the testing/review/iterate gates that close a sequence
    pub fn is_quality_gate(&self) -> bool {
        !matches!(self, TaskKind::Work)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Work => "work",
            TaskKind::Testing => "testing",
            TaskKind::Review => "review",
            TaskKind::Iterate => "iterate",
        }
    }
}

/// Task ID, unique within a festival (`001_PLAN/01_setup/02_init`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A numbered phase or sequence directory
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Element {
    pub level: Level,
    pub number: u32,
    pub name: String,
    /// Directory/file name including the zero-padded prefix
    pub full_name: String,
    pub path: PathBuf,
    pub status: Status,
}

impl Element {
    /// Creates an element from its parsed name and location
    pub fn new(name: &ElementName, path: impl Into<PathBuf>, status: Status) -> Self {
        Self {
            level: name.level,
            number: name.number,
            name: name.name.clone(),
            full_name: name.to_string(),
            path: path.into(),
            status,
        }
    }
}

/// A task: the unit the dependency graph orders
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Task {
    pub id: TaskId,
    pub number: u32,
    pub name: String,
    pub path: PathBuf,
    pub status: Status,
    pub kind: TaskKind,
    /// Tasks that must complete before this one may start
    pub depends_on: Vec<TaskId>,
}

impl Task {
    /// Creates a pending work task with no dependencies
    pub fn new(id: impl Into<TaskId>, number: u32) -> Self {
        let id = id.into();
        Self {
            name: id.to_string(),
            id,
            number,
            path: PathBuf::new(),
            status: Status::Pending,
            kind: TaskKind::Work,
            depends_on: Vec::new(),
        }
    }

    /// Adds a dependency, ignoring duplicates
    pub fn add_dependency(&mut self, id: impl Into<TaskId>) -> bool {
        let id = id.into();
        if self.depends_on.contains(&id) {
            return false;
        }
        self.depends_on.push(id);
        true
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    pub fn with_dependency(mut self, id: impl Into<TaskId>) -> Self {
        self.add_dependency(id);
        self
    }

    /// Ordering key used to break ties between simultaneously eligible tasks
    pub fn order_key(&self) -> (u32, &TaskId) {
        (self.number, &self.id)
    }
}
