use std::collections::{HashMap, HashSet};

use rand::Rng;

use crate::error::{ModelError, SimulationError};
use crate::state::{StateTransition, TaskState};

use super::graph::TaskGraph;
use super::input::ProjectSpec;
use super::resource::{Resource, ResourceId};
use super::task::{Task, TaskId};
use super::workflow::Workflow;

#[derive(Debug, Clone, Copy)]
pub struct ModelOptions {
    /// Reject (rather than sort) probability rows given out of ascending order.
    pub strict_probability_order: bool,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            strict_probability_order: true,
        }
    }
}

/// Workflows plus a resource pool, owned by exactly one simulation run.
///
/// `Clone` is a deep copy: tables, graph and run state are all duplicated,
/// so parallel runs never share mutable state.
#[derive(Debug, Clone)]
pub struct ProjectModel {
    name: String,
    workflows: Vec<Workflow>,
    tasks: Vec<Task>,
    resources: Vec<Resource>,
}

impl ProjectModel {
    pub fn from_spec(spec: &ProjectSpec, opts: ModelOptions) -> Result<Self, ModelError> {
        if spec.workflows.iter().all(|w| w.tasks.is_empty()) {
            return Err(ModelError::EmptyProject(spec.name.clone()));
        }

        let mut seen_workflows = HashSet::new();
        let mut workflows = Vec::with_capacity(spec.workflows.len());
        let mut tasks: Vec<Task> = Vec::new();

        for (index, wf_spec) in spec.workflows.iter().enumerate() {
            if !seen_workflows.insert(wf_spec.id.as_str()) {
                return Err(ModelError::DuplicateWorkflow(wf_spec.id.clone()));
            }

            let graph = TaskGraph::from_tasks(&wf_spec.id, &wf_spec.tasks)?;
            graph.validate()?;
            let stages = graph.topological_sort()?;

            let mut by_name = HashMap::new();
            let mut ids = Vec::with_capacity(wf_spec.tasks.len());
            for task_spec in &wf_spec.tasks {
                let id = TaskId(tasks.len());
                tasks.push(Task::new(
                    id,
                    index,
                    task_spec,
                    opts.strict_probability_order,
                )?);
                by_name.insert(task_spec.name.clone(), id);
                ids.push(id);
            }

            for (task_spec, id) in wf_spec.tasks.iter().zip(&ids) {
                for pred_name in &task_spec.predecessors {
                    // validate() guarantees the name resolves
                    if let Some(pred) = by_name.get(pred_name).copied() {
                        if !tasks[id.0].predecessors.contains(&pred) {
                            tasks[id.0].predecessors.push(pred);
                            tasks[pred.0].successors.push(*id);
                        }
                    }
                }
            }

            let stages: Vec<Vec<TaskId>> = stages
                .into_iter()
                .map(|stage| stage.iter().filter_map(|n| by_name.get(n).copied()).collect())
                .collect();

            workflows.push(Workflow::new(index, wf_spec.id.clone(), ids, stages, by_name));
        }

        let mut seen_resources = HashSet::new();
        let mut resources = Vec::with_capacity(spec.resources.len());
        for (index, res_spec) in spec.resources.iter().enumerate() {
            if !seen_resources.insert(res_spec.name.as_str()) {
                return Err(ModelError::DuplicateResource(res_spec.name.clone()));
            }
            resources.push(Resource::from_spec(ResourceId(index), res_spec)?);
        }

        let project = Self {
            name: spec.name.clone(),
            workflows,
            tasks,
            resources,
        };
        project.log_diagnostics();
        Ok(project)
    }

    fn log_diagnostics(&self) {
        for task in &self.tasks {
            let workflow = &self.workflows[task.workflow];
            for source in task.rework_table().sources() {
                if workflow.lookup(source).is_none() {
                    tracing::warn!(
                        task = %task.name,
                        source = %source,
                        workflow = %workflow.id,
                        "rework source does not resolve to a task; its events will be ignored"
                    );
                }
            }
            if !self.resources.iter().any(|r| r.can_perform(&task.name)) {
                tracing::warn!(
                    task = %task.name,
                    "no resource can perform this task; it will never start"
                );
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn workflows(&self) -> &[Workflow] {
        &self.workflows
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn task(&self, id: TaskId) -> &Task {
        &self.tasks[id.0]
    }

    pub fn resource(&self, id: ResourceId) -> &Resource {
        &self.resources[id.0]
    }

    pub fn find_task(&self, workflow: &str, name: &str) -> Option<&Task> {
        self.workflows
            .iter()
            .find(|w| w.id == workflow)
            .and_then(|w| w.lookup(name))
            .map(|id| &self.tasks[id.0])
    }

    pub fn find_resource(&self, name: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.name == name)
    }

    /// Reset every task and resource, mark source tasks READY at time 0
    /// and compute the initial PERT.
    pub fn initialize(&mut self) -> Result<(), SimulationError> {
        for task in &mut self.tasks {
            task.initialize();
        }
        for resource in &mut self.resources {
            resource.initialize();
        }
        self.check_ready(0)?;
        self.update_pert(0);
        Ok(())
    }

    pub fn is_finished(&self) -> bool {
        self.tasks
            .iter()
            .all(|t| StateTransition::is_terminal(t.state()))
    }

    pub fn unfinished_count(&self) -> usize {
        self.tasks
            .iter()
            .filter(|t| !StateTransition::is_terminal(t.state()))
            .count()
    }

    /// Attach `resource` to `task` at `time`.
    pub(crate) fn assign(
        &mut self,
        task: TaskId,
        resource: ResourceId,
        time: u32,
    ) -> Result<(), SimulationError> {
        self.resources[resource.0].engage(task, time);
        self.tasks[task.0].assign(resource, time)
    }

    /// Apply one tick of work to every active task and draw its rework table.
    pub(crate) fn perform<R: Rng + ?Sized>(
        &mut self,
        time: u32,
        rng: &mut R,
    ) -> Result<(), SimulationError> {
        for index in 0..self.tasks.len() {
            if !StateTransition::is_active(self.tasks[index].state()) {
                continue;
            }

            let work: f64 = {
                let task = &self.tasks[index];
                task.assigned()
                    .iter()
                    .map(|r| self.resources[r.0].contribution(&task.name))
                    .sum()
            };
            self.tasks[index].apply_work(work);

            if let Some(source) = self.tasks[index].sample_rework(rng) {
                let trigger = self.tasks[index].name.clone();
                let workflow = self.tasks[index].workflow;
                tracing::debug!(
                    time,
                    trigger = %trigger,
                    source = %source,
                    "rework drawn"
                );
                self.rework(workflow, &source, &trigger, time)?;
            }
        }
        Ok(())
    }

    /// Resolve tasks whose remaining work is exhausted: delay or finish.
    pub(crate) fn check_finished<R: Rng + ?Sized>(
        &mut self,
        time: u32,
        rng: &mut R,
    ) -> Result<(), SimulationError> {
        for index in 0..self.tasks.len() {
            let state = self.tasks[index].state();
            if !StateTransition::is_active(state) || !self.tasks[index].is_work_exhausted() {
                continue;
            }

            if state == TaskState::Working {
                if let Some(extra) = self.tasks[index].sample_delay(rng) {
                    tracing::debug!(
                        time,
                        task = %self.tasks[index].name,
                        extra,
                        "delay drawn"
                    );
                    self.tasks[index].start_additional_work(extra, time)?;
                    continue;
                }
            }

            let id = TaskId(index);
            let capacity = self.capacity_of(id);
            let released = self.tasks[index].finish(time, capacity)?;
            for r in released {
                self.resources[r.0].release(id, time);
            }
        }
        Ok(())
    }

    /// NONE tasks whose predecessors are all FINISHED become READY.
    pub(crate) fn check_ready(&mut self, time: u32) -> Result<(), SimulationError> {
        for index in 0..self.tasks.len() {
            let task = &self.tasks[index];
            if task.state() != TaskState::None {
                continue;
            }
            let ready = task
                .predecessors
                .iter()
                .all(|p| self.tasks[p.0].state() == TaskState::Finished);
            if ready {
                self.tasks[index].mark_ready(time)?;
            }
        }
        Ok(())
    }

    pub fn update_pert(&mut self, time: u32) {
        for workflow in &mut self.workflows {
            workflow.update_pert(&mut self.tasks, time);
        }
    }

    /// Send the task named `source` back to NONE on behalf of `trigger`.
    ///
    /// A FINISHED source cascades into its successors: started ones are reset
    /// the same way, READY ones lose their readiness. An unresolved source or
    /// one that has not started is a no-op.
    fn rework(
        &mut self,
        workflow: usize,
        source: &str,
        trigger: &str,
        time: u32,
    ) -> Result<(), SimulationError> {
        let Some(source_id) = self.workflows[workflow].lookup(source) else {
            tracing::debug!(source = %source, trigger = %trigger, "unresolved rework source");
            return Ok(());
        };

        let mut pending = vec![source_id];
        let mut visited = HashSet::new();
        while let Some(id) = pending.pop() {
            if !visited.insert(id) {
                continue;
            }
            let state = self.tasks[id.0].state();
            match state {
                TaskState::None => {}
                TaskState::Ready => {
                    if id != source_id {
                        self.tasks[id.0].revoke_ready(time)?;
                    }
                }
                TaskState::Working | TaskState::WorkingAdditionally | TaskState::Finished => {
                    let capacity = self.capacity_of(id);
                    let Some(released) =
                        self.tasks[id.0].reset_for_rework(time, trigger, capacity)?
                    else {
                        continue;
                    };
                    for r in released {
                        self.resources[r.0].release(id, time);
                    }
                    if state == TaskState::Finished {
                        pending.extend(self.tasks[id.0].successors.iter().copied());
                    }
                }
            }
        }
        Ok(())
    }

    /// Summed work amount skill of the distinct resources on a task.
    fn capacity_of(&self, id: TaskId) -> f64 {
        let task = &self.tasks[id.0];
        task.assigned()
            .iter()
            .map(|r| self.resources[r.0].skill_for(&task.name))
            .sum()
    }

    /// Last finish tick + 1, or 0 if nothing finished.
    pub fn duration(&self) -> u32 {
        self.tasks
            .iter()
            .filter_map(|t| t.last_finish())
            .max()
            .map(|t| t + 1)
            .unwrap_or(0)
    }

    pub fn total_cost(&self) -> f64 {
        self.resources.iter().map(|r| r.cost()).sum()
    }

    pub fn total_actual_work(&self) -> f64 {
        self.tasks.iter().map(|t| t.actual()).sum()
    }

    /// Names of the resources behind a list of ids.
    pub fn resource_names(&self, ids: &[ResourceId]) -> Vec<&str> {
        ids.iter()
            .map(|r| self.resources[r.0].name.as_str())
            .collect()
    }
}
