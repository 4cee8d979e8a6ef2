use std::collections::HashMap;

use super::task::{Task, TaskId};

/// A task DAG within the project. Tasks live in the project arena;
/// the workflow holds their ids and a precomputed topological order.
#[derive(Debug, Clone)]
pub struct Workflow {
    pub index: usize,
    pub id: String,
    tasks: Vec<TaskId>,
    order: Vec<TaskId>,
    stages: Vec<Vec<TaskId>>,
    by_name: HashMap<String, TaskId>,
    critical_path_length: f64,
}

impl Workflow {
    pub(crate) fn new(
        index: usize,
        id: String,
        tasks: Vec<TaskId>,
        stages: Vec<Vec<TaskId>>,
        by_name: HashMap<String, TaskId>,
    ) -> Self {
        let order = stages.iter().flatten().copied().collect();
        Self {
            index,
            id,
            tasks,
            order,
            stages,
            by_name,
            critical_path_length: 0.0,
        }
    }

    /// Tasks in input order.
    pub fn tasks(&self) -> &[TaskId] {
        &self.tasks
    }

    /// Tasks in topological order.
    pub fn order(&self) -> &[TaskId] {
        &self.order
    }

    pub fn stages(&self) -> &[Vec<TaskId>] {
        &self.stages
    }

    pub fn lookup(&self, name: &str) -> Option<TaskId> {
        self.by_name.get(name).copied()
    }

    /// Latest EFT among terminal tasks, as of the last PERT refresh.
    pub fn critical_path_length(&self) -> f64 {
        self.critical_path_length
    }

    /// Recompute EST/EFT/LST/LFT from the current remaining work.
    ///
    /// A single pass in topological order reaches the same fixpoint as
    /// repeated relaxation since every predecessor is settled first.
    pub fn update_pert(&mut self, tasks: &mut [Task], time: u32) {
        let now = f64::from(time);

        for id in &self.order {
            let est = tasks[id.0]
                .predecessors
                .iter()
                .map(|p| tasks[p.0].pert.eft)
                .fold(now, f64::max);
            let task = &mut tasks[id.0];
            task.pert.est = est;
            task.pert.eft = est + task.remaining().max(0.0);
        }

        self.critical_path_length = self
            .order
            .iter()
            .filter(|id| tasks[id.0].successors.is_empty())
            .map(|id| tasks[id.0].pert.eft)
            .fold(now, f64::max);

        for id in self.order.iter().rev() {
            let lft = tasks[id.0]
                .successors
                .iter()
                .map(|s| tasks[s.0].pert.lst)
                .reduce(f64::min)
                .unwrap_or(self.critical_path_length);
            let task = &mut tasks[id.0];
            task.pert.lft = lft;
            task.pert.lst = lft - task.remaining().max(0.0);
        }
    }
}
