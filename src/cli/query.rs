//! Query commands (ready, blocked, status, graph)
//!
//! Every query rescans the festival and builds the dependency graph fresh.

use std::path::Path;

use anyhow::Result;
use clap::Subcommand;

use super::output::Output;
use crate::domain::{CycleError, DependencyGraph, Status, Task};
use crate::storage::{Festival, FestivalTree};

#[derive(Subcommand)]
pub enum GraphCommands {
    /// Show every task in dependency order
    Order,

    /// Show the longest chain of dependent tasks
    CriticalPath,

    /// Show tasks grouped by dependency depth
    Parallel,

    /// Check the graph for cycles and unknown dependencies
    Check,
}

fn load(output: &Output, root: Option<&Path>) -> Result<(FestivalTree, DependencyGraph)> {
    let festival = Festival::locate(root)?;
    output.verbose_ctx("scan", &format!("Scanning festival at: {}", festival.root().display()));

    let tree = festival.scan()?;
    let graph = tree.dependency_graph()?;
    output.verbose_ctx("scan", &format!("Built graph with {} tasks", graph.len()));

    Ok((tree, graph))
}

fn task_json(task: &Task) -> serde_json::Value {
    serde_json::json!({
        "id": task.id,
        "name": task.name,
        "number": task.number,
        "status": task.status,
        "kind": task.kind,
    })
}

fn print_tasks(tasks: &[&Task]) {
    println!("{:<40} {:<12} KIND", "ID", "STATUS");
    println!("{}", "-".repeat(64));
    for task in tasks {
        println!("{:<40} {:<12} {}", task.id, task.status, task.kind.as_str());
    }
}

/// Show tasks ready to work on
pub fn ready(output: &Output, root: Option<&Path>) -> Result<()> {
    let (_, graph) = load(output, root)?;
    let ready_tasks = graph.ready_tasks()?;

    output.verbose_ctx("ready", &format!("Found {} ready tasks", ready_tasks.len()));

    if output.is_json() {
        let items: Vec<_> = ready_tasks.iter().map(|t| task_json(t)).collect();
        output.data(&items);
    } else if ready_tasks.is_empty() {
        println!("No tasks ready to work on.");
    } else {
        println!("Ready tasks ({}):", ready_tasks.len());
        print_tasks(&ready_tasks);
    }

    Ok(())
}

/// Show blocked tasks
pub fn blocked(output: &Output, root: Option<&Path>) -> Result<()> {
    let (_, graph) = load(output, root)?;
    let blocked_tasks = graph.blocked_tasks();

    output.verbose_ctx(
        "blocked",
        &format!("Found {} blocked tasks", blocked_tasks.len()),
    );

    if output.is_json() {
        let items: Vec<_> = blocked_tasks
            .iter()
            .map(|b| {
                serde_json::json!({
                    "id": b.task.id,
                    "status": b.task.status,
                    "blocked_by": b.blockers.iter().map(|t| &t.id).collect::<Vec<_>>(),
                })
            })
            .collect();
        output.data(&items);
    } else if blocked_tasks.is_empty() {
        println!("No blocked tasks.");
    } else {
        println!("Blocked tasks ({}):", blocked_tasks.len());
        println!("{:<40} BLOCKED BY", "ID");
        println!("{}", "-".repeat(80));
        for b in blocked_tasks {
            let blockers: Vec<&str> = b.blockers.iter().map(|t| t.id.as_str()).collect();
            println!("{:<40} {}", b.task.id, blockers.join(", "));
        }
    }

    Ok(())
}

/// Runs a graph subcommand
pub fn graph(output: &Output, root: Option<&Path>, cmd: GraphCommands) -> Result<()> {
    let (_, graph) = load(output, root)?;

    match cmd {
        GraphCommands::Order => {
            let order = graph.topological_sort()?;
            if output.is_json() {
                let items: Vec<_> = order.iter().map(|t| task_json(t)).collect();
                output.data(&items);
            } else if order.is_empty() {
                println!("No tasks.");
            } else {
                for (position, task) in order.iter().enumerate() {
                    println!("{:>4}. {}", position + 1, task.id);
                }
            }
        }

        GraphCommands::CriticalPath => {
            let path = graph.critical_path()?;
            if output.is_json() {
                output.data(&serde_json::json!({
                    "length": path.len(),
                    "tasks": path.iter().map(|t| task_json(t)).collect::<Vec<_>>(),
                }));
            } else if path.is_empty() {
                println!("No tasks.");
            } else {
                println!("Critical path ({} tasks):", path.len());
                for task in path {
                    println!("  {}", task.id);
                }
            }
        }

        GraphCommands::Parallel => {
            let groups = graph.parallel_groups()?;
            if output.is_json() {
                let items: Vec<_> = groups
                    .iter()
                    .map(|g| g.iter().map(|t| &t.id).collect::<Vec<_>>())
                    .collect();
                output.data(&items);
            } else if groups.is_empty() {
                println!("No tasks.");
            } else {
                for (depth, group) in groups.iter().enumerate() {
                    let ids: Vec<&str> = group.iter().map(|t| t.id.as_str()).collect();
                    println!("Group {}: {}", depth + 1, ids.join(", "));
                }
            }
        }

        GraphCommands::Check => {
            if let Some(cycle) = graph.find_cycle() {
                return Err(CycleError { cycle }.into());
            }
            if output.is_json() {
                output.data(&serde_json::json!({
                    "acyclic": true,
                    "tasks": graph.len(),
                }));
            } else {
                output.success(&format!("No dependency cycles ({} tasks)", graph.len()));
            }
        }
    }

    Ok(())
}

fn count(tasks: &[&Task], status: Status) -> usize {
    tasks.iter().filter(|t| t.status == status).count()
}

/// Show festival status overview
pub fn status(output: &Output, root: Option<&Path>) -> Result<()> {
    let (tree, graph) = load(output, root)?;
    let tasks: Vec<&Task> = tree.tasks().collect();

    // A cycle leaves nothing ready; blocked tasks are still reported
    let ready_count = graph.ready_tasks().map_or(0, |ready| ready.len());
    let blocked_count = graph.blocked_tasks().len();
    let gates = tasks.iter().filter(|t| t.kind.is_quality_gate()).count();

    if output.is_json() {
        let phases: Vec<_> = tree
            .phases
            .iter()
            .map(|p| {
                serde_json::json!({
                    "name": p.element.full_name,
                    "status": p.element.status,
                    "sequences": p.sequences.len(),
                })
            })
            .collect();

        output.data(&serde_json::json!({
            "root": tree.root,
            "status": tree.status(),
            "phases": phases,
            "tasks": {
                "total": tasks.len(),
                "pending": count(&tasks, Status::Pending),
                "in_progress": count(&tasks, Status::InProgress),
                "blocked": count(&tasks, Status::Blocked),
                "complete": count(&tasks, Status::Complete),
                "ready": ready_count,
                "waiting": blocked_count,
                "quality_gates": gates,
            },
        }));
        return Ok(());
    }

    println!("Festival: {} ({})", tree.root.display(), tree.status());
    output.blank();

    println!("Phases:");
    for phase in &tree.phases {
        let done = phase
            .sequences
            .iter()
            .filter(|s| s.element.status.is_complete())
            .count();
        let name = format!("  {}", phase.element.full_name);
        let progress = format!("{}/{} sequences", done, phase.sequences.len());
        output.row(&[name.as_str(), phase.element.status.as_str(), progress.as_str()]);
    }
    output.blank();

    println!("Tasks:");
    println!("  Total:       {}", tasks.len());
    println!("  Pending:     {}", count(&tasks, Status::Pending));
    println!("  In progress: {}", count(&tasks, Status::InProgress));
    println!("  Blocked:     {}", count(&tasks, Status::Blocked));
    println!("  Complete:    {}", count(&tasks, Status::Complete));
    println!("  Ready:       {}", ready_count);
    println!("  Waiting:     {}", blocked_count);
    if gates > 0 {
        println!("  Gates:       {}", gates);
    }

    Ok(())
}
