//! Dependency graph for festival tasks
//!
//! Built fresh from the scanned task set for every query and never persisted.
//! Edges point from a prerequisite to the task that needs it. Every ordering
//! breaks ties by `(number, id)` ascending, so repeated runs over the same
//! tasks produce identical output. Uses petgraph for storage.

use std::collections::{BTreeSet, HashMap};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use thiserror::Error;

use super::element::{Task, TaskId};

fn join_ids(ids: &[TaskId]) -> String {
    ids.iter()
        .map(TaskId::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// A dependency cycle, closed: the first ID is repeated at the end
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Dependency cycle detected: {}", join_ids(.cycle))]
pub struct CycleError {
    pub cycle: Vec<TaskId>,
}

#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    #[error(transparent)]
    Cycle(#[from] CycleError),

    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("Self-dependency not allowed: {0}")]
    SelfDependency(TaskId),

    #[error("Duplicate task ID: {0}")]
    DuplicateTask(TaskId),
}

/// A task that cannot start yet, with the prerequisites holding it back
#[derive(Debug)]
pub struct BlockedTask<'a> {
    pub task: &'a Task,
    pub blockers: Vec<&'a Task>,
}

/// A dependency graph for tasks
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// The underlying directed graph
    graph: DiGraph<Task, ()>,

    /// Map from TaskId to node index
    node_map: HashMap<TaskId, NodeIndex>,
}

impl DependencyGraph {
    /// Creates an empty dependency graph
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            node_map: HashMap::new(),
        }
    }

    /// Builds a graph from a collection of tasks and their declared dependencies
    pub fn from_tasks(tasks: impl IntoIterator<Item = Task>) -> Result<Self, GraphError> {
        let mut graph = Self::new();
        let mut edges = Vec::new();

        // First pass: add all nodes
        for task in tasks {
            for dep in &task.depends_on {
                edges.push((dep.clone(), task.id.clone()));
            }
            graph.add_task(task)?;
        }

        // Second pass: add all edges
        for (from, to) in &edges {
            graph.add_edge(from, to)?;
        }

        Ok(graph)
    }

    /// Adds a task to the graph
    pub fn add_task(&mut self, task: Task) -> Result<(), GraphError> {
        if self.node_map.contains_key(&task.id) {
            return Err(GraphError::DuplicateTask(task.id));
        }
        let id = task.id.clone();
        let idx = self.graph.add_node(task);
        self.node_map.insert(id, idx);
        Ok(())
    }

    /// Adds an edge `from -> to`: `to` depends on `from`
    ///
    /// Repeated edges are collapsed. Cycles are not rejected here; they are
    /// reported by the ordering queries.
    pub fn add_edge(&mut self, from: &TaskId, to: &TaskId) -> Result<(), GraphError> {
        if from == to {
            return Err(GraphError::SelfDependency(to.clone()));
        }

        let from_idx = self.index(from)?;
        let to_idx = self.index(to)?;
        self.graph.update_edge(from_idx, to_idx, ());
        Ok(())
    }

    /// Adds a dependency: `task` depends on `depends_on`
    pub fn add_dependency(&mut self, task: &TaskId, depends_on: &TaskId) -> Result<(), GraphError> {
        self.add_edge(depends_on, task)
    }

    fn index(&self, id: &TaskId) -> Result<NodeIndex, GraphError> {
        self.node_map
            .get(id)
            .copied()
            .ok_or_else(|| GraphError::TaskNotFound(id.clone()))
    }

    fn key(&self, idx: NodeIndex) -> (u32, &TaskId) {
        self.graph[idx].order_key()
    }

    /// All nodes in `(number, id)` order
    fn sorted_nodes(&self) -> Vec<NodeIndex> {
        let mut nodes: Vec<_> = self.graph.node_indices().collect();
        nodes.sort_by(|a, b| self.key(*a).cmp(&self.key(*b)));
        nodes
    }

    /// Neighbors in one direction, in `(number, id)` order
    fn sorted_neighbors(&self, idx: NodeIndex, direction: Direction) -> Vec<NodeIndex> {
        let mut nodes: Vec<_> = self.graph.neighbors_directed(idx, direction).collect();
        nodes.sort_by(|a, b| self.key(*a).cmp(&self.key(*b)));
        nodes
    }

    fn tasks_at(&self, nodes: impl IntoIterator<Item = NodeIndex>) -> Vec<&Task> {
        nodes.into_iter().map(|idx| &self.graph[idx]).collect()
    }

    /// Returns the task with the given ID
    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        self.node_map.get(id).map(|idx| &self.graph[*idx])
    }

    /// Returns the direct prerequisites of a task
    pub fn dependencies(&self, id: &TaskId) -> Vec<&Task> {
        match self.node_map.get(id) {
            Some(idx) => self.tasks_at(self.sorted_neighbors(*idx, Direction::Incoming)),
            None => vec![],
        }
    }

    /// Returns the direct dependents of a task (tasks that depend on it)
    pub fn dependents(&self, id: &TaskId) -> Vec<&Task> {
        match self.node_map.get(id) {
            Some(idx) => self.tasks_at(self.sorted_neighbors(*idx, Direction::Outgoing)),
            None => vec![],
        }
    }

    /// Kahn's algorithm over a private copy of the in-degrees
    fn topological_indices(&self) -> Result<Vec<NodeIndex>, GraphError> {
        let mut in_degree: HashMap<NodeIndex, usize> = self
            .graph
            .node_indices()
            .map(|idx| {
                let degree = self.graph.neighbors_directed(idx, Direction::Incoming).count();
                (idx, degree)
            })
            .collect();

        // Ordered set keeps the tie-break global, not just per insertion
        let mut ready: BTreeSet<(u32, &TaskId, NodeIndex)> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(idx, _)| {
                let (number, id) = self.key(*idx);
                (number, id, *idx)
            })
            .collect();

        let mut order = Vec::with_capacity(self.len());
        while let Some((_, _, idx)) = ready.pop_first() {
            order.push(idx);
            for dependent in self.graph.neighbors_directed(idx, Direction::Outgoing) {
                if let Some(degree) = in_degree.get_mut(&dependent) {
                    *degree -= 1;
                    if *degree == 0 {
                        let (number, id) = self.key(dependent);
                        ready.insert((number, id, dependent));
                    }
                }
            }
        }

        if order.len() < self.len() {
            let cycle = self.find_cycle().unwrap_or_default();
            return Err(CycleError { cycle }.into());
        }

        Ok(order)
    }

    /// Returns all tasks in topological order (dependencies before dependents)
    pub fn topological_sort(&self) -> Result<Vec<&Task>, GraphError> {
        Ok(self.tasks_at(self.topological_indices()?))
    }

    /// Returns true if the dependencies contain a cycle
    pub fn has_cycle(&self) -> bool {
        self.topological_indices().is_err()
    }

    /// Finds one dependency cycle, if any
    ///
    /// Depth-first search with an explicit stack, so deep chains cannot
    /// exhaust the call stack. The result reads `start -> ... -> start`.
    pub fn find_cycle(&self) -> Option<Vec<TaskId>> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            OnStack,
            Done,
        }

        let mut marks: HashMap<NodeIndex, Mark> = HashMap::new();
        let mut parent: HashMap<NodeIndex, NodeIndex> = HashMap::new();

        for root in self.sorted_nodes() {
            if marks.contains_key(&root) {
                continue;
            }

            marks.insert(root, Mark::OnStack);
            let mut stack = vec![(root, self.sorted_neighbors(root, Direction::Outgoing), 0usize)];

            while let Some((node, children, next)) = stack.last_mut() {
                let node = *node;
                let child = children.get(*next).copied();
                *next += 1;

                let Some(child) = child else {
                    marks.insert(node, Mark::Done);
                    stack.pop();
                    continue;
                };

                match marks.get(&child) {
                    Some(Mark::OnStack) => return Some(self.close_cycle(node, child, &parent)),
                    Some(Mark::Done) => {}
                    None => {
                        marks.insert(child, Mark::OnStack);
                        parent.insert(child, node);
                        let grandchildren = self.sorted_neighbors(child, Direction::Outgoing);
                        stack.push((child, grandchildren, 0));
                    }
                }
            }
        }

        None
    }

    /// Walks parent pointers from `current` back to `ancestor`
    fn close_cycle(
        &self,
        current: NodeIndex,
        ancestor: NodeIndex,
        parent: &HashMap<NodeIndex, NodeIndex>,
    ) -> Vec<TaskId> {
        let mut cycle = vec![self.graph[current].id.clone()];
        let mut cursor = current;
        while cursor != ancestor {
            match parent.get(&cursor) {
                Some(&up) => {
                    cursor = up;
                    cycle.push(self.graph[cursor].id.clone());
                }
                None => break,
            }
        }
        cycle.reverse();
        cycle.push(self.graph[ancestor].id.clone());
        cycle
    }

    /// Returns the longest chain of dependent tasks, first task first
    ///
    /// When several chains share the maximum length, the one ending at the
    /// smallest `(number, id)` wins; within a chain, the predecessor with the
    /// smallest key wins.
    pub fn critical_path(&self) -> Result<Vec<&Task>, GraphError> {
        let order = self.topological_indices()?;
        let mut dist: HashMap<NodeIndex, usize> = HashMap::new();
        let mut prev: HashMap<NodeIndex, NodeIndex> = HashMap::new();

        for &idx in &order {
            let mut best: Option<(usize, NodeIndex)> = None;
            for dep in self.sorted_neighbors(idx, Direction::Incoming) {
                let candidate = dist[&dep] + 1;
                if best.map_or(true, |(longest, _)| candidate > longest) {
                    best = Some((candidate, dep));
                }
            }

            match best {
                Some((longest, dep)) => {
                    dist.insert(idx, longest);
                    prev.insert(idx, dep);
                }
                None => {
                    dist.insert(idx, 0);
                }
            }
        }

        let mut end: Option<NodeIndex> = None;
        for idx in self.sorted_nodes() {
            if end.map_or(true, |current| dist[&idx] > dist[&current]) {
                end = Some(idx);
            }
        }

        let Some(mut cursor) = end else {
            return Ok(Vec::new());
        };

        let mut path = vec![cursor];
        while let Some(&before) = prev.get(&cursor) {
            path.push(before);
            cursor = before;
        }
        path.reverse();

        Ok(self.tasks_at(path))
    }

    /// Groups tasks by dependency depth
    ///
    /// Group `n` holds tasks whose longest prerequisite chain has length `n`.
    /// No two tasks in a group are connected by a dependency path, so each
    /// group may run concurrently once the previous groups are done.
    pub fn parallel_groups(&self) -> Result<Vec<Vec<&Task>>, GraphError> {
        let order = self.topological_indices()?;
        let mut level: HashMap<NodeIndex, usize> = HashMap::new();

        for &idx in &order {
            let depth = self
                .graph
                .neighbors_directed(idx, Direction::Incoming)
                .map(|dep| level[&dep] + 1)
                .max()
                .unwrap_or(0);
            level.insert(idx, depth);
        }

        let group_count = level.values().max().map_or(0, |max| max + 1);
        let mut groups: Vec<Vec<&Task>> = vec![Vec::new(); group_count];
        for idx in self.sorted_nodes() {
            groups[level[&idx]].push(&self.graph[idx]);
        }

        Ok(groups)
    }

    /// Returns tasks that are ready (incomplete, with every prerequisite complete)
    pub fn ready_tasks(&self) -> Result<Vec<&Task>, GraphError> {
        self.topological_indices()?;

        Ok(self
            .sorted_nodes()
            .into_iter()
            .filter(|idx| {
                // Task must not be complete
                if self.graph[*idx].status.is_complete() {
                    return false;
                }

                // All dependencies must be complete
                self.graph
                    .neighbors_directed(*idx, Direction::Incoming)
                    .all(|dep| self.graph[dep].status.is_complete())
            })
            .map(|idx| &self.graph[idx])
            .collect())
    }

    /// Returns tasks that are blocked (have incomplete dependencies)
    pub fn blocked_tasks(&self) -> Vec<BlockedTask<'_>> {
        self.sorted_nodes()
            .into_iter()
            .filter(|idx| !self.graph[*idx].status.is_complete())
            .filter_map(|idx| {
                let blockers: Vec<&Task> = self
                    .sorted_neighbors(idx, Direction::Incoming)
                    .into_iter()
                    .map(|dep| &self.graph[dep])
                    .filter(|dep| !dep.status.is_complete())
                    .collect();

                if blockers.is_empty() {
                    None
                } else {
                    Some(BlockedTask {
                        task: &self.graph[idx],
                        blockers,
                    })
                }
            })
            .collect()
    }

    /// Returns true if the graph contains the task
    pub fn contains(&self, id: &TaskId) -> bool {
        self.node_map.contains_key(id)
    }

    /// Returns the number of tasks in the graph
    pub fn len(&self) -> usize {
        self.node_map.len()
    }

    /// Returns true if the graph is empty
    pub fn is_empty(&self) -> bool {
        self.node_map.is_empty()
    }

    /// Returns all tasks in `(number, id)` order
    pub fn tasks(&self) -> Vec<&Task> {
        self.tasks_at(self.sorted_nodes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Status;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn ids(tasks: &[&Task]) -> Vec<String> {
        tasks.iter().map(|t| t.id.to_string()).collect()
    }

    fn graph_of(tasks: Vec<Task>) -> DependencyGraph {
        DependencyGraph::from_tasks(tasks).unwrap()
    }

    /// A(1); B(2) and D(2) depend on A; C(3) depends on B
    fn scenario_graph() -> DependencyGraph {
        graph_of(vec![
            Task::new("A", 1),
            Task::new("B", 2).with_dependency("A"),
            Task::new("D", 2).with_dependency("A"),
            Task::new("C", 3).with_dependency("B"),
        ])
    }

    fn diamond() -> DependencyGraph {
        graph_of(vec![
            Task::new("A", 1),
            Task::new("B", 2).with_dependency("A"),
            Task::new("C", 2).with_dependency("A"),
            Task::new("D", 3).with_dependency("B").with_dependency("C"),
        ])
    }

    #[test]
    fn empty_graph() {
        let graph = DependencyGraph::new();
        assert!(graph.is_empty());
        assert_eq!(graph.len(), 0);
        assert!(graph.topological_sort().unwrap().is_empty());
        assert!(graph.critical_path().unwrap().is_empty());
        assert!(graph.parallel_groups().unwrap().is_empty());
        assert!(!graph.has_cycle());
    }

    #[test]
    fn add_edge_links_both_directions() {
        let mut graph = DependencyGraph::new();
        graph.add_task(Task::new("a", 1)).unwrap();
        graph.add_task(Task::new("b", 2)).unwrap();

        // b depends on a
        graph.add_dependency(&"b".into(), &"a".into()).unwrap();
        // Repeated edges collapse
        graph.add_edge(&"a".into(), &"b".into()).unwrap();

        assert_eq!(ids(&graph.dependencies(&"b".into())), vec!["a"]);
        assert_eq!(ids(&graph.dependents(&"a".into())), vec!["b"]);
    }

    #[test]
    fn self_dependency_rejected() {
        let mut graph = DependencyGraph::new();
        graph.add_task(Task::new("a", 1)).unwrap();

        let result = graph.add_edge(&"a".into(), &"a".into());
        assert!(matches!(result, Err(GraphError::SelfDependency(_))));
    }

    #[test]
    fn unknown_task_returns_error() {
        let result = DependencyGraph::from_tasks(vec![Task::new("a", 1).with_dependency("ghost")]);
        assert_eq!(
            result.unwrap_err(),
            GraphError::TaskNotFound(TaskId::from("ghost"))
        );
    }

    #[test]
    fn duplicate_task_rejected() {
        let result = DependencyGraph::from_tasks(vec![Task::new("a", 1), Task::new("a", 2)]);
        assert!(matches!(result, Err(GraphError::DuplicateTask(_))));
    }

    #[test]
    fn topological_sort_breaks_ties_by_number_then_id() {
        let graph = scenario_graph();
        let order = graph.topological_sort().unwrap();
        assert_eq!(ids(&order), vec!["A", "B", "D", "C"]);
    }

    #[test]
    fn topological_sort_reorders_late_arrivals() {
        // c(1) becomes ready after b(2) is already queued; it still goes first
        let graph = graph_of(vec![
            Task::new("a", 1),
            Task::new("b", 2),
            Task::new("c", 1).with_dependency("a"),
        ]);
        let order = graph.topological_sort().unwrap();
        assert_eq!(ids(&order), vec!["a", "c", "b"]);
    }

    #[test]
    fn two_task_cycle() {
        let graph = graph_of(vec![
            Task::new("A", 1).with_dependency("B"),
            Task::new("B", 2).with_dependency("A"),
        ]);

        assert!(graph.has_cycle());

        let cycle = graph.find_cycle().unwrap();
        assert!((2..=3).contains(&cycle.len()));
        assert!(cycle.contains(&"A".into()));
        assert!(cycle.contains(&"B".into()));
        assert_eq!(cycle.first(), cycle.last());
    }

    #[test]
    fn cycle_error_carries_real_edges() {
        let graph = graph_of(vec![
            Task::new("root", 1),
            Task::new("a", 2).with_dependency("root").with_dependency("c"),
            Task::new("b", 3).with_dependency("a"),
            Task::new("c", 4).with_dependency("b"),
        ]);

        let cycle = match graph.topological_sort() {
            Err(GraphError::Cycle(CycleError { cycle })) => cycle,
            other => panic!("expected a cycle error, got {:?}", other),
        };

        assert_eq!(cycle.first(), cycle.last());
        for pair in cycle.windows(2) {
            let dependents = graph.dependents(&pair[0]);
            assert!(
                dependents.iter().any(|t| t.id == pair[1]),
                "{} -> {} is not an edge",
                pair[0],
                pair[1]
            );
        }
        assert!(!cycle.contains(&"root".into()));
    }

    #[test]
    fn cycle_error_message_lists_path() {
        let err = CycleError {
            cycle: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(err.to_string(), "Dependency cycle detected: a -> b -> a");
    }

    #[test]
    fn ordering_queries_surface_cycles() {
        let graph = graph_of(vec![
            Task::new("A", 1).with_dependency("B"),
            Task::new("B", 2).with_dependency("A"),
            Task::new("C", 3),
        ]);

        assert!(matches!(graph.critical_path(), Err(GraphError::Cycle(_))));
        assert!(matches!(graph.parallel_groups(), Err(GraphError::Cycle(_))));
        assert!(matches!(graph.ready_tasks(), Err(GraphError::Cycle(_))));
    }

    #[test]
    fn deep_cycle_does_not_exhaust_stack() {
        let n = 20_000;
        let mut tasks: Vec<Task> = (0..n)
            .map(|i| {
                let task = Task::new(format!("t{:05}", i), i as u32);
                if i > 0 {
                    task.with_dependency(format!("t{:05}", i - 1))
                } else {
                    task
                }
            })
            .collect();
        tasks[0].add_dependency(format!("t{:05}", n - 1));

        let graph = graph_of(tasks);
        let cycle = graph.find_cycle().unwrap();
        assert_eq!(cycle.len(), n + 1);
    }

    #[test]
    fn diamond_parallel_groups() {
        let graph = diamond();
        let groups = graph.parallel_groups().unwrap();
        let groups: Vec<Vec<String>> = groups.iter().map(|g| ids(g)).collect();
        assert_eq!(groups, vec![vec!["A"], vec!["B", "C"], vec!["D"]]);
    }

    #[test]
    fn critical_path_follows_longest_chain() {
        let graph = graph_of(vec![
            Task::new("a", 1),
            Task::new("b", 2).with_dependency("a"),
            Task::new("c", 3).with_dependency("b"),
            Task::new("d", 4).with_dependency("c"),
            Task::new("x", 1),
            Task::new("y", 2).with_dependency("x"),
            Task::new("end", 5).with_dependency("d").with_dependency("y"),
        ]);

        let path = graph.critical_path().unwrap();
        assert_eq!(ids(&path), vec!["a", "b", "c", "d", "end"]);
    }

    #[test]
    fn critical_path_ties_pick_smallest_key() {
        let graph = diamond();
        let path = graph.critical_path().unwrap();
        assert_eq!(ids(&path), vec!["A", "B", "D"]);

        // Two equal chains: the one ending at the smaller key wins
        let graph = graph_of(vec![
            Task::new("p", 1),
            Task::new("q", 2).with_dependency("p"),
            Task::new("r", 1),
            Task::new("s", 1).with_dependency("r"),
        ]);
        assert_eq!(ids(&graph.critical_path().unwrap()), vec!["r", "s"]);
    }

    #[test]
    fn critical_path_of_independent_tasks_is_single_task() {
        let graph = graph_of(vec![Task::new("b", 2), Task::new("a", 2)]);
        assert_eq!(ids(&graph.critical_path().unwrap()), vec!["a"]);
    }

    #[test]
    fn ready_tasks() {
        let tasks = vec![
            Task::new("t1", 1),
            Task::new("t2", 2).with_dependency("t1"),
            Task::new("t3", 3),
        ];

        // t1 and t3 are ready (no deps), t2 is blocked
        let graph = graph_of(tasks.clone());
        assert_eq!(ids(&graph.ready_tasks().unwrap()), vec!["t1", "t3"]);

        // Complete t1
        let mut tasks = tasks;
        tasks[0].status = Status::Complete;
        let graph = graph_of(tasks);
        assert_eq!(ids(&graph.ready_tasks().unwrap()), vec!["t2", "t3"]);
    }

    #[test]
    fn ready_tasks_need_every_prerequisite_complete() {
        let graph = graph_of(vec![
            Task::new("A", 1).with_status(Status::Complete),
            Task::new("B", 2).with_status(Status::InProgress),
            Task::new("C", 3).with_dependency("A").with_dependency("B"),
            Task::new("D", 3).with_dependency("A").with_status(Status::Complete),
        ]);

        assert_eq!(ids(&graph.ready_tasks().unwrap()), vec!["B"]);
    }

    #[test]
    fn blocked_tasks_list_incomplete_blockers() {
        let graph = graph_of(vec![
            Task::new("A", 1).with_status(Status::Complete),
            Task::new("B", 2),
            Task::new("C", 3).with_dependency("A").with_dependency("B"),
        ]);

        let blocked = graph.blocked_tasks();
        assert_eq!(blocked.len(), 1);
        assert_eq!(blocked[0].task.id, TaskId::from("C"));
        assert_eq!(ids(&blocked[0].blockers), vec!["B"]);
    }

    #[test]
    fn repeated_queries_are_identical() {
        let build = || {
            graph_of(vec![
                Task::new("e", 2).with_dependency("a"),
                Task::new("c", 2).with_dependency("a"),
                Task::new("a", 1),
                Task::new("b", 1),
                Task::new("d", 2).with_dependency("b"),
            ])
        };

        let first = build();
        let second = build();
        assert_eq!(
            ids(&first.topological_sort().unwrap()),
            ids(&second.topological_sort().unwrap())
        );
        assert_eq!(
            ids(&first.ready_tasks().unwrap()),
            ids(&second.ready_tasks().unwrap())
        );
        let groups = |g: &DependencyGraph| -> Vec<Vec<String>> {
            g.parallel_groups().unwrap().iter().map(|x| ids(x)).collect()
        };
        assert_eq!(groups(&first), groups(&second));
        assert_eq!(ids(&first.topological_sort().unwrap()), vec!["a", "b", "c", "d", "e"]);
    }

    /// Random DAGs: edges only run from a lower index to a higher one
    fn dag() -> impl Strategy<Value = (usize, Vec<(usize, usize)>)> {
        (1usize..14).prop_flat_map(|n| (Just(n), prop::collection::vec((0..n, 0..n), 0..n * 3)))
    }

    fn build_dag(n: usize, edges: &[(usize, usize)]) -> DependencyGraph {
        let mut tasks: Vec<Task> = (0..n)
            .map(|i| Task::new(format!("t{:02}", i), (i % 3) as u32 + 1))
            .collect();
        for &(a, b) in edges {
            let (from, to) = (a.min(b), a.max(b));
            if from != to {
                tasks[to].add_dependency(format!("t{:02}", from));
            }
        }
        graph_of(tasks)
    }

    fn reachable(graph: &DependencyGraph, from: &TaskId) -> HashSet<TaskId> {
        let mut seen = HashSet::new();
        let mut stack = vec![from.clone()];
        while let Some(id) = stack.pop() {
            for next in graph.dependents(&id) {
                if seen.insert(next.id.clone()) {
                    stack.push(next.id.clone());
                }
            }
        }
        seen
    }

    proptest! {
        #[test]
        fn topological_sort_respects_every_edge((n, edges) in dag()) {
            let graph = build_dag(n, &edges);
            let order = graph.topological_sort().unwrap();
            prop_assert_eq!(order.len(), n);

            let position: HashMap<&TaskId, usize> =
                order.iter().enumerate().map(|(i, t)| (&t.id, i)).collect();
            for task in graph.tasks() {
                for dep in graph.dependencies(&task.id) {
                    prop_assert!(position[&dep.id] < position[&task.id]);
                }
            }
        }

        #[test]
        fn parallel_groups_partition_without_internal_paths((n, edges) in dag()) {
            let graph = build_dag(n, &edges);
            let groups = graph.parallel_groups().unwrap();

            let mut seen = HashSet::new();
            for group in &groups {
                prop_assert!(!group.is_empty());
                for task in group {
                    prop_assert!(seen.insert(task.id.clone()), "duplicate {}", task.id);
                }
            }
            prop_assert_eq!(seen.len(), n);

            for group in &groups {
                for task in group {
                    let downstream = reachable(&graph, &task.id);
                    for other in group {
                        prop_assert!(!downstream.contains(&other.id));
                    }
                }
            }
        }

        #[test]
        fn critical_path_is_a_chain_of_maximum_length((n, edges) in dag()) {
            let graph = build_dag(n, &edges);
            let path = graph.critical_path().unwrap();
            let groups = graph.parallel_groups().unwrap();

            // The longest chain visits one task per dependency level
            prop_assert_eq!(path.len(), groups.len());
            for pair in path.windows(2) {
                let dependents = graph.dependents(&pair[0].id);
                prop_assert!(dependents.iter().any(|t| t.id == pair[1].id));
            }
        }
    }
}
