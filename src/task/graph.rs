//! Declared task dependencies and their topological order.
//!
//! Order is resolved with Kahn's algorithm. Among tasks that are ready at
//! the same time, the one declared first runs first, so the order is stable
//! and matches the declaration wherever dependencies allow.

use super::TaskName;
use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("task `{0}` is declared twice")]
    Duplicate(TaskName),

    #[error("task `{task}` depends on undeclared task `{dep}`")]
    UnknownDependency { task: TaskName, dep: TaskName },

    #[error("dependency cycle between {}", list(.0))]
    Cycle(Vec<TaskName>),
}

fn list(tasks: &[TaskName]) -> String {
    tasks
        .iter()
        .map(|t| format!("`{t}`"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone)]
struct Node {
    name: TaskName,
    deps: Vec<TaskName>,
}

/// Tasks in declaration order with the tasks each must run after.
#[derive(Debug, Clone, Default)]
pub struct TaskGraph {
    nodes: Vec<Node>,
}

impl TaskGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `name`, running after every task in `deps`.
    pub fn task(mut self, name: TaskName, deps: &[TaskName]) -> Self {
        self.nodes.push(Node {
            name,
            deps: deps.to_vec(),
        });
        self
    }

    /// The graph behind `build`.
    ///
    /// The grid partial feeds the stylesheets; the image cache is cleared
    /// before anything that may read it.
    pub fn standard() -> Self {
        use TaskName::*;

        Self::new()
            .task(Clean, &[])
            .task(Grid, &[Clean])
            .task(Styles, &[Clean, Grid])
            .task(ClearCache, &[Clean, Grid])
            .task(Icons, &[Clean, ClearCache])
            .task(Markup, &[Clean])
            .task(Scripts, &[Clean])
            .task(Static, &[Clean, ClearCache])
    }

    pub fn tasks(&self) -> impl Iterator<Item = TaskName> + '_ {
        self.nodes.iter().map(|n| n.name)
    }

    pub fn deps(&self, name: TaskName) -> Option<&[TaskName]> {
        self.nodes
            .iter()
            .find(|n| n.name == name)
            .map(|n| n.deps.as_slice())
    }

    pub fn validate(&self) -> Result<(), GraphError> {
        self.order().map(|_| ())
    }

    /// Every declared task, dependencies first.
    pub fn order(&self) -> Result<Vec<TaskName>, GraphError> {
        let mut index: FxHashMap<TaskName, usize> = FxHashMap::default();
        for (i, node) in self.nodes.iter().enumerate() {
            if index.insert(node.name, i).is_some() {
                return Err(GraphError::Duplicate(node.name));
            }
        }

        let mut pending = vec![0usize; self.nodes.len()];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); self.nodes.len()];
        for (i, node) in self.nodes.iter().enumerate() {
            let unique: FxHashSet<TaskName> = node.deps.iter().copied().collect();
            for dep in unique {
                let Some(&d) = index.get(&dep) else {
                    return Err(GraphError::UnknownDependency {
                        task: node.name,
                        dep,
                    });
                };
                pending[i] += 1;
                dependents[d].push(i);
            }
        }

        let mut done = vec![false; self.nodes.len()];
        let mut order = Vec::with_capacity(self.nodes.len());

        // Re-scanning from the front keeps the declaration-order tie-break.
        while let Some(next) = (0..self.nodes.len()).find(|&i| !done[i] && pending[i] == 0) {
            done[next] = true;
            order.push(self.nodes[next].name);
            for &dependent in &dependents[next] {
                pending[dependent] -= 1;
            }
        }

        if order.len() < self.nodes.len() {
            let stuck = self
                .nodes
                .iter()
                .zip(&done)
                .filter(|(_, done)| !**done)
                .map(|(n, _)| n.name)
                .collect();
            return Err(GraphError::Cycle(stuck));
        }

        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use TaskName::*;

    #[test]
    fn test_standard_build_order() {
        assert_eq!(
            TaskGraph::standard().order().unwrap(),
            vec![Clean, Grid, Styles, ClearCache, Icons, Markup, Scripts, Static]
        );
    }

    #[test]
    fn test_standard_covers_every_action() {
        let graph = TaskGraph::standard();
        for task in TaskName::ACTIONS {
            assert!(graph.deps(task).is_some(), "{task} missing");
        }
        assert!(graph.validate().is_ok());
    }

    #[test]
    fn test_grid_runs_before_styles() {
        let order = TaskGraph::standard().order().unwrap();
        let pos = |t| order.iter().position(|&o| o == t).unwrap();
        assert!(pos(Grid) < pos(Styles));
        assert!(pos(ClearCache) < pos(Icons));
        assert!(pos(ClearCache) < pos(Static));
    }

    #[test]
    fn test_dependencies_override_declaration_order() {
        let graph = TaskGraph::new()
            .task(Styles, &[Grid])
            .task(Markup, &[])
            .task(Grid, &[]);
        assert_eq!(graph.order().unwrap(), vec![Markup, Grid, Styles]);
    }

    #[test]
    fn test_cycle_rejected() {
        let graph = TaskGraph::new()
            .task(Clean, &[])
            .task(Grid, &[Styles])
            .task(Styles, &[Grid]);
        assert_eq!(graph.validate(), Err(GraphError::Cycle(vec![Grid, Styles])));
    }

    #[test]
    fn test_self_dependency_is_cycle() {
        let graph = TaskGraph::new().task(Icons, &[Icons]);
        assert!(matches!(graph.validate(), Err(GraphError::Cycle(_))));
    }

    #[test]
    fn test_unknown_dependency_rejected() {
        let graph = TaskGraph::new().task(Styles, &[Grid]);
        assert_eq!(
            graph.validate(),
            Err(GraphError::UnknownDependency {
                task: Styles,
                dep: Grid
            })
        );
    }

    #[test]
    fn test_duplicate_rejected() {
        let graph = TaskGraph::new().task(Clean, &[]).task(Clean, &[]);
        assert_eq!(graph.validate(), Err(GraphError::Duplicate(Clean)));
    }

    #[test]
    fn test_cycle_message() {
        let err = GraphError::Cycle(vec![Grid, Styles]);
        assert_eq!(err.to_string(), "dependency cycle between `grid`, `styles`");
    }
}
