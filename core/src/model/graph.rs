use std::collections::{HashMap, HashSet};

use crate::error::ModelError;

/// Common node interface for dependency graph handling.
pub trait TaskLike: Clone {
    fn id(&self) -> &str;
    fn dependencies(&self) -> &[String];
}

/// Task dependency graph (DAG) of one workflow
#[derive(Debug, Clone)]
pub struct TaskGraph<T: TaskLike> {
    /// Task nodes: name -> task
    pub nodes: HashMap<String, T>,

    /// Dependency edges: name -> predecessors
    pub edges: HashMap<String, Vec<String>>,

    /// Reverse edges: name -> successors
    pub reverse_edges: HashMap<String, Vec<String>>,

    /// Original insertion order (for stable sorting)
    insertion_order: Vec<String>,

    scope: String,
}

impl<T: TaskLike> TaskGraph<T> {
    /// Construct the graph of workflow `scope` from its task list
    pub fn from_tasks(scope: &str, tasks: &[T]) -> Result<Self, ModelError> {
        let mut nodes = HashMap::new();
        let mut edges = HashMap::new();
        let mut reverse_edges: HashMap<String, Vec<String>> = HashMap::new();
        let mut insertion_order = Vec::new();

        for task in tasks {
            if nodes.contains_key(task.id()) {
                return Err(ModelError::DuplicateTask {
                    workflow: scope.to_string(),
                    task: task.id().to_string(),
                });
            }

            let task_id = task.id().to_string();
            let dependencies = task.dependencies().to_vec();

            nodes.insert(task_id.clone(), task.clone());
            edges.insert(task_id.clone(), dependencies.clone());
            insertion_order.push(task_id.clone());

            for dep in dependencies {
                reverse_edges.entry(dep).or_default().push(task_id.clone());
            }
        }

        Ok(Self {
            nodes,
            edges,
            reverse_edges,
            insertion_order,
            scope: scope.to_string(),
        })
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Validate dependency relationships
    pub fn validate(&self) -> Result<(), ModelError> {
        for task_id in &self.insertion_order {
            for dep in self.edges.get(task_id).into_iter().flatten() {
                if !self.nodes.contains_key(dep) {
                    return Err(ModelError::DependencyNotFound {
                        task_id: task_id.clone(),
                        missing_dep: dep.clone(),
                    });
                }
            }
        }

        if let Some(cycle) = self.detect_cycle() {
            return Err(ModelError::CircularDependency(cycle));
        }

        Ok(())
    }

    /// Topological sort using Kahn's algorithm
    ///
    /// Returns stages where every task's predecessors live in earlier stages.
    /// Within a stage tasks keep their input order.
    ///
    /// # Time Complexity
    ///
    /// O(V + E) where V = number of tasks, E = number of dependencies
    pub fn topological_sort(&self) -> Result<Vec<Vec<String>>, ModelError> {
        let position: HashMap<&str, usize> = self
            .insertion_order
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), i))
            .collect();
        let order_key = |id: &String| position.get(id.as_str()).copied().unwrap_or(usize::MAX);

        // edges[A] = [B, C] means A waits on B and C, so A's in-degree = 2
        let mut in_degree: HashMap<&str, usize> = self
            .edges
            .iter()
            .map(|(id, deps)| (id.as_str(), deps.len()))
            .collect();

        let mut stages: Vec<Vec<String>> = Vec::new();
        let mut current_stage: Vec<String> = self
            .insertion_order
            .iter()
            .filter(|id| in_degree.get(id.as_str()).copied() == Some(0))
            .cloned()
            .collect();

        let mut processed = 0;

        while !current_stage.is_empty() {
            processed += current_stage.len();

            let mut next_stage = Vec::new();
            for task_id in &current_stage {
                for dependent in self.reverse_edges.get(task_id).into_iter().flatten() {
                    if let Some(degree) = in_degree.get_mut(dependent.as_str()) {
                        *degree = degree.saturating_sub(1);
                        if *degree == 0 {
                            next_stage.push(dependent.clone());
                        }
                    }
                }
            }

            next_stage.sort_by_key(order_key);
            stages.push(std::mem::replace(&mut current_stage, next_stage));
        }

        if processed != self.nodes.len() {
            return Err(ModelError::CircularDependency(format!(
                "unable to order workflow '{}' (cycle detected)",
                self.scope
            )));
        }

        Ok(stages)
    }

    /// Flattened topological order.
    pub fn topological_order(&self) -> Result<Vec<String>, ModelError> {
        Ok(self.topological_sort()?.into_iter().flatten().collect())
    }

    /// Detect circular dependencies using DFS
    fn detect_cycle(&self) -> Option<String> {
        let mut visited = HashSet::new();
        let mut stack = Vec::new();

        for task_id in &self.insertion_order {
            if !visited.contains(task_id) && self.dfs_cycle(task_id, &mut visited, &mut stack) {
                return Some(stack.join(" -> "));
            }
        }

        None
    }

    fn dfs_cycle(
        &self,
        node: &str,
        visited: &mut HashSet<String>,
        stack: &mut Vec<String>,
    ) -> bool {
        visited.insert(node.to_string());
        stack.push(node.to_string());

        if let Some(dependencies) = self.edges.get(node) {
            for dep in dependencies {
                if let Some(pos) = stack.iter().position(|x| x == dep) {
                    stack.push(dep.clone());
                    *stack = stack[pos..].to_vec();
                    return true;
                }

                if !visited.contains(dep) && self.dfs_cycle(dep, visited, stack) {
                    return true;
                }
            }
        }

        stack.pop();
        false
    }
}
