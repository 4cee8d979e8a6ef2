use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use rand::Rng;
use serde::Serialize;

use crate::error::{ModelError, SimulationError};
use crate::state::{StateTransition, TaskState};

use super::input::{TaskSpec, WorkAmountEntry};
use super::resource::ResourceId;
use super::stochastic::{progress_bucket, DelayTable, ReworkTable};

/// Remaining work at or below this counts as exhausted.
pub const WORK_EPSILON: f64 = 1e-9;

/// Index of a task in the project arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TaskId(pub usize);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// Live PERT fields, recomputed every tick from remaining work.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Pert {
    pub est: f64,
    pub eft: f64,
    pub lst: f64,
    pub lft: f64,
}

impl Pert {
    pub fn slack(&self) -> f64 {
        self.lst - self.est
    }
}

/// Minimum work amount per occurrence.
#[derive(Debug, Clone, Default)]
pub struct WorkAmountTable {
    amounts: BTreeMap<u32, f64>,
}

impl WorkAmountTable {
    pub fn build(task: &str, entries: &[WorkAmountEntry]) -> Result<Self, ModelError> {
        let mut amounts = BTreeMap::new();
        for entry in entries {
            if !entry.amount.is_finite() || entry.amount <= 0.0 {
                return Err(ModelError::InvalidWorkAmount {
                    task: task.to_string(),
                    occurrence: entry.occurrence,
                    amount: entry.amount,
                });
            }
            amounts.insert(entry.occurrence, entry.amount);
        }
        if !amounts.contains_key(&1) {
            return Err(ModelError::MissingInitialWorkAmount(task.to_string()));
        }
        Ok(Self { amounts })
    }

    pub fn exact(&self, occurrence: u32) -> Option<f64> {
        self.amounts.get(&occurrence).copied()
    }
}

/// One ready→start→finish pass of a task at a given occurrence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    pub occurrence: u32,
    pub ready: u32,
    pub start: Option<u32>,
    pub finish: Option<u32>,
    /// Summed skill of the resources holding the task when the segment closed.
    pub capacity: f64,
    pub resources: Vec<ResourceId>,
    /// Task whose rework draw closed or reopened this segment.
    pub reworked_by: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Task {
    pub id: TaskId,
    pub workflow: usize,
    pub name: String,
    pub node_id: Option<String>,
    pub predecessors: Vec<TaskId>,
    pub successors: Vec<TaskId>,
    pub pert: Pert,

    work: WorkAmountTable,
    rework: ReworkTable,
    delay: DelayTable,

    state: TaskState,
    occurrence: u32,
    required: f64,
    remaining: f64,
    actual: f64,
    assigned: Vec<ResourceId>,
    history: Vec<Segment>,
    rework_guard: BTreeSet<(u32, i64)>,
}

impl Task {
    pub fn new(
        id: TaskId,
        workflow: usize,
        spec: &TaskSpec,
        strict_probability_order: bool,
    ) -> Result<Self, ModelError> {
        let work = WorkAmountTable::build(&spec.name, &spec.minimum_work_amount)?;
        let rework = ReworkTable::build(&spec.name, &spec.rework, strict_probability_order)?;
        let delay = DelayTable::build(&spec.name, &spec.delay, strict_probability_order)?;
        let required = work.exact(1).unwrap_or_default();

        Ok(Self {
            id,
            workflow,
            name: spec.name.clone(),
            node_id: spec.node_id.clone(),
            predecessors: Vec::new(),
            successors: Vec::new(),
            pert: Pert::default(),
            work,
            rework,
            delay,
            state: TaskState::None,
            occurrence: 1,
            required,
            remaining: required,
            actual: 0.0,
            assigned: Vec::new(),
            history: Vec::new(),
            rework_guard: BTreeSet::new(),
        })
    }

    /// Reset all run state.
    pub fn initialize(&mut self) {
        self.state = TaskState::None;
        self.occurrence = 1;
        self.required = self.work.exact(1).unwrap_or_default();
        self.remaining = self.required;
        self.actual = 0.0;
        self.pert = Pert::default();
        self.assigned.clear();
        self.history.clear();
        self.rework_guard.clear();
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    pub fn occurrence(&self) -> u32 {
        self.occurrence
    }

    pub fn remaining(&self) -> f64 {
        self.remaining
    }

    pub fn actual(&self) -> f64 {
        self.actual
    }

    /// Minimum work amount of the current occurrence.
    pub fn required(&self) -> f64 {
        self.required
    }

    /// Actual over minimum work for the current occurrence.
    pub fn progress(&self) -> f64 {
        if self.required > 0.0 {
            self.actual / self.required
        } else {
            0.0
        }
    }

    pub fn assigned(&self) -> &[ResourceId] {
        &self.assigned
    }

    pub fn history(&self) -> &[Segment] {
        &self.history
    }

    pub fn rework_table(&self) -> &ReworkTable {
        &self.rework
    }

    pub fn is_work_exhausted(&self) -> bool {
        self.remaining <= WORK_EPSILON
    }

    pub fn ready_times(&self) -> Vec<u32> {
        self.history.iter().map(|s| s.ready).collect()
    }

    pub fn start_times(&self) -> Vec<u32> {
        self.history.iter().filter_map(|s| s.start).collect()
    }

    pub fn finish_times(&self) -> Vec<u32> {
        self.history.iter().filter_map(|s| s.finish).collect()
    }

    pub fn last_finish(&self) -> Option<u32> {
        self.history.iter().filter_map(|s| s.finish).max()
    }

    fn transition(&mut self, to: TaskState, time: u32) -> Result<(), SimulationError> {
        StateTransition::validate(self.state, to).map_err(|source| {
            SimulationError::Transition {
                task: self.name.clone(),
                source,
            }
        })?;
        tracing::debug!(
            task = %self.name,
            time,
            occurrence = self.occurrence,
            from = %self.state,
            to = %to,
            "task transition"
        );
        self.state = to;
        Ok(())
    }

    pub(crate) fn mark_ready(&mut self, time: u32) -> Result<(), SimulationError> {
        self.transition(TaskState::Ready, time)?;
        self.history.push(Segment {
            occurrence: self.occurrence,
            ready: time,
            start: None,
            finish: None,
            capacity: 0.0,
            resources: Vec::new(),
            reworked_by: None,
        });
        Ok(())
    }

    /// Attach a resource. A READY task starts working.
    pub(crate) fn assign(&mut self, resource: ResourceId, time: u32) -> Result<(), SimulationError> {
        if !self.assigned.contains(&resource) {
            self.assigned.push(resource);
        }
        if self.state == TaskState::Ready {
            self.transition(TaskState::Working, time)?;
            if let Some(segment) = self.history.last_mut() {
                segment.start = Some(time);
            }
        }
        if let Some(segment) = self.history.last_mut() {
            if !segment.resources.contains(&resource) {
                segment.resources.push(resource);
            }
        }
        Ok(())
    }

    pub(crate) fn apply_work(&mut self, amount: f64) {
        self.remaining -= amount;
        self.actual += amount;
    }

    /// Draw the rework table for the current (occurrence, progress) key.
    ///
    /// Each key is drawn at most once per run; returns the source task on a hit.
    pub(crate) fn sample_rework<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<String> {
        if !StateTransition::is_active(self.state) {
            return None;
        }
        let key = (self.occurrence, progress_bucket(self.progress()));
        if !self.rework.has_key(key.0, key.1) || !self.rework_guard.insert(key) {
            return None;
        }
        self.rework
            .sample(key.0, key.1, rng)
            .map(|source| source.to_string())
    }

    /// Extra work drawn from the delay table, if any.
    pub(crate) fn sample_delay<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<f64> {
        self.delay
            .sample(self.occurrence, rng)
            .filter(|extra| *extra > 0.0)
    }

    pub(crate) fn start_additional_work(
        &mut self,
        extra: f64,
        time: u32,
    ) -> Result<(), SimulationError> {
        self.transition(TaskState::WorkingAdditionally, time)?;
        self.remaining += extra;
        Ok(())
    }

    /// Close the current segment and hand back the resources to free.
    pub(crate) fn finish(
        &mut self,
        time: u32,
        capacity: f64,
    ) -> Result<Vec<ResourceId>, SimulationError> {
        self.transition(TaskState::Finished, time)?;
        self.remaining = 0.0;
        if let Some(segment) = self.history.last_mut() {
            segment.finish = Some(time);
            segment.capacity = capacity;
        }
        Ok(std::mem::take(&mut self.assigned))
    }

    /// Send a started task back to NONE at the next occurrence.
    ///
    /// Returns `None` (task untouched) when the task has not started or has
    /// no minimum work amount for the next occurrence.
    pub(crate) fn reset_for_rework(
        &mut self,
        time: u32,
        trigger: &str,
        capacity: f64,
    ) -> Result<Option<Vec<ResourceId>>, SimulationError> {
        if matches!(self.state, TaskState::None | TaskState::Ready) {
            return Ok(None);
        }
        let next = self.occurrence + 1;
        let Some(amount) = self.work.exact(next) else {
            tracing::debug!(
                task = %self.name,
                occurrence = next,
                "no minimum work amount for next occurrence, rework ignored"
            );
            return Ok(None);
        };

        self.transition(TaskState::None, time)?;
        if let Some(segment) = self.history.last_mut() {
            if segment.finish.is_none() {
                segment.finish = Some(time);
                segment.capacity = capacity;
            }
            segment.reworked_by = Some(trigger.to_string());
        }
        self.occurrence = next;
        self.required = amount;
        self.remaining = amount;
        self.actual = 0.0;
        Ok(Some(std::mem::take(&mut self.assigned)))
    }

    /// A predecessor was reworked before this task got a resource.
    pub(crate) fn revoke_ready(&mut self, time: u32) -> Result<(), SimulationError> {
        self.transition(TaskState::None, time)?;
        if self.history.last().is_some_and(|s| s.start.is_none()) {
            self.history.pop();
        }
        Ok(())
    }
}
