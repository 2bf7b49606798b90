// The run's dependency structure as data.
//
// Stages used to be an implicit "call the next function" chain; making
// the graph explicit lets a scheduler inspect it and keeps each stage an
// independently callable unit. The pipeline walks `execution_order()`,
// which is a topological sort, so any future edge changes keep working
// without touching the runner.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use thiserror::Error;

/// One stage of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Task {
    Fetch,
    Enrich,
    Partition,
    Stage,
    Load,
}

impl Task {
    const ALL: [Task; 5] = [Task::Fetch, Task::Enrich, Task::Partition, Task::Stage, Task::Load];
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Task::Fetch => "fetch",
            Task::Enrich => "enrich",
            Task::Partition => "partition",
            Task::Stage => "stage",
            Task::Load => "load",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("task graph contains a cycle involving '{task}'")]
    Cycle { task: Task },
}

/// Directed acyclic graph of pipeline stages.
#[derive(Debug, Clone)]
pub struct TaskGraph {
    edges: Vec<(Task, Task)>,
}

impl TaskGraph {
    pub fn new(edges: Vec<(Task, Task)>) -> Self {
        Self { edges }
    }

    /// The linear chain fetch -> enrich -> partition -> stage -> load.
    pub fn linear() -> Self {
        Self::new(vec![
            (Task::Fetch, Task::Enrich),
            (Task::Enrich, Task::Partition),
            (Task::Partition, Task::Stage),
            (Task::Stage, Task::Load),
        ])
    }

    /// Tasks that must complete before `task` may start.
    pub fn dependencies(&self, task: Task) -> Vec<Task> {
        self.edges.iter().filter(|(_, to)| *to == task).map(|(from, _)| *from).collect()
    }

    /// Topological order over all tasks, dependencies first.
    pub fn execution_order(&self) -> Result<Vec<Task>, GraphError> {
        let mut in_degree: BTreeMap<Task, usize> =
            Task::ALL.iter().map(|&task| (task, 0)).collect();
        for (_, to) in &self.edges {
            *in_degree.entry(*to).or_insert(0) += 1;
        }

        let mut order = Vec::with_capacity(in_degree.len());
        let mut done = BTreeSet::new();
        while done.len() < in_degree.len() {
            // Candidates are scanned in declaration order, so ties resolve
            // deterministically.
            let ready = Task::ALL
                .iter()
                .copied()
                .find(|task| !done.contains(task) && in_degree.get(task) == Some(&0));

            let Some(task) = ready else {
                let stuck = Task::ALL
                    .iter()
                    .copied()
                    .find(|task| !done.contains(task))
                    .unwrap_or(Task::Fetch);
                return Err(GraphError::Cycle { task: stuck });
            };

            done.insert(task);
            order.push(task);
            for (from, to) in &self.edges {
                if *from == task {
                    if let Some(degree) = in_degree.get_mut(to) {
                        *degree = degree.saturating_sub(1);
                    }
                }
            }
        }

        Ok(order)
    }
}
