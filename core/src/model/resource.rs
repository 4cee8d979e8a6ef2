use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::error::ModelError;
use crate::state::ResourceState;

use super::input::ResourceSpec;
use super::task::TaskId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ResourceId(pub usize);

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// One occupied interval of a resource on a task. Ticks are inclusive.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Engagement {
    pub task: TaskId,
    pub start: u32,
    pub finish: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct Resource {
    pub id: ResourceId,
    pub name: String,
    pub node_id: Option<String>,
    pub cost_per_time: f64,
    work_amount_skill: BTreeMap<String, f64>,
    quality_skill: BTreeMap<String, f64>,
    total_skill: f64,

    state: ResourceState,
    engagements: Vec<Engagement>,
    assigned_tasks: Vec<TaskId>,
}

impl Resource {
    pub fn from_spec(id: ResourceId, spec: &ResourceSpec) -> Result<Self, ModelError> {
        let invalid = |message: String| ModelError::InvalidResource {
            resource: spec.name.clone(),
            message,
        };

        if !spec.cost_per_time.is_finite() || spec.cost_per_time < 0.0 {
            return Err(invalid(format!("cost per time {}", spec.cost_per_time)));
        }
        for (task, skill) in spec.work_amount_skill.iter().chain(&spec.quality_skill) {
            if !skill.is_finite() || *skill < 0.0 {
                return Err(invalid(format!("skill {} for task '{}'", skill, task)));
            }
        }

        Ok(Self {
            id,
            name: spec.name.clone(),
            node_id: spec.node_id.clone(),
            cost_per_time: spec.cost_per_time,
            total_skill: spec.work_amount_skill.values().sum(),
            work_amount_skill: spec.work_amount_skill.clone(),
            quality_skill: spec.quality_skill.clone(),
            state: ResourceState::Free,
            engagements: Vec::new(),
            assigned_tasks: Vec::new(),
        })
    }

    pub fn initialize(&mut self) {
        self.state = ResourceState::Free;
        self.engagements.clear();
        self.assigned_tasks.clear();
    }

    pub fn state(&self) -> ResourceState {
        self.state
    }

    pub fn is_free(&self) -> bool {
        self.state == ResourceState::Free
    }

    pub fn skill_for(&self, task: &str) -> f64 {
        self.work_amount_skill.get(task).copied().unwrap_or(0.0)
    }

    pub fn quality_for(&self, task: &str) -> f64 {
        self.quality_skill.get(task).copied().unwrap_or(0.0)
    }

    /// Eligible when the work amount skill for the task is positive.
    pub fn can_perform(&self, task: &str) -> bool {
        self.skill_for(task) > 0.0
    }

    /// Sum of work amount skill across all task names (SSP key).
    pub fn total_skill(&self) -> f64 {
        self.total_skill
    }

    pub fn active_count(&self) -> usize {
        self.engagements.iter().filter(|e| e.finish.is_none()).count()
    }

    pub fn is_engaged_on(&self, task: TaskId) -> bool {
        self.engagements
            .iter()
            .any(|e| e.task == task && e.finish.is_none())
    }

    /// Work applied to `task` this tick; skill is split across concurrent tasks.
    pub fn contribution(&self, task: &str) -> f64 {
        self.skill_for(task) / self.active_count().max(1) as f64
    }

    pub fn engagements(&self) -> &[Engagement] {
        &self.engagements
    }

    pub fn assigned_tasks(&self) -> &[TaskId] {
        &self.assigned_tasks
    }

    pub fn start_times(&self) -> Vec<u32> {
        self.engagements.iter().map(|e| e.start).collect()
    }

    pub fn finish_times(&self) -> Vec<u32> {
        self.engagements.iter().filter_map(|e| e.finish).collect()
    }

    pub(crate) fn engage(&mut self, task: TaskId, time: u32) {
        if self.is_engaged_on(task) {
            return;
        }
        self.engagements.push(Engagement {
            task,
            start: time,
            finish: None,
        });
        if !self.assigned_tasks.contains(&task) {
            self.assigned_tasks.push(task);
        }
        self.state = ResourceState::Working;
    }

    pub(crate) fn release(&mut self, task: TaskId, time: u32) {
        for engagement in self
            .engagements
            .iter_mut()
            .filter(|e| e.task == task && e.finish.is_none())
        {
            engagement.finish = Some(time);
        }
        if self.active_count() == 0 {
            self.state = ResourceState::Free;
        }
    }

    /// Summed length of closed engagements. Overlapping engagements under
    /// the multi-task policy each count in full.
    pub fn occupied_ticks(&self) -> u64 {
        self.engagements
            .iter()
            .filter_map(|e| e.finish.map(|f| u64::from(f.saturating_sub(e.start)) + 1))
            .sum()
    }

    pub fn cost(&self) -> f64 {
        self.occupied_ticks() as f64 * self.cost_per_time
    }
}
