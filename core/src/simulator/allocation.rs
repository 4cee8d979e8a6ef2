use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::{ProjectModel, ResourceId, TaskId};
use crate::state::TaskState;

/// How free resources are matched to ready/working tasks each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AllocationPolicy {
    /// Every eligible free resource joins the task (multi-resource).
    #[default]
    Collaborative,
    /// A READY task takes one eligible free resource.
    SingleResource,
    /// Resources may hold several tasks at once; skill is split among them.
    MultiTask,
}

impl AllocationPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            AllocationPolicy::Collaborative => "collaborative",
            AllocationPolicy::SingleResource => "single-resource",
            AllocationPolicy::MultiTask => "multi-task",
        }
    }
}

impl fmt::Display for AllocationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AllocationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "collaborative" => Ok(AllocationPolicy::Collaborative),
            "single-resource" | "single" => Ok(AllocationPolicy::SingleResource),
            "multi-task" | "multi" => Ok(AllocationPolicy::MultiTask),
            other => Err(format!("unknown allocation policy: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignment {
    pub task: TaskId,
    pub resource: ResourceId,
}

/// READY then WORKING tasks, least slack first. Ties keep READY ahead of
/// WORKING, then arena order.
pub fn prioritized_tasks(project: &ProjectModel) -> Vec<TaskId> {
    let mut tasks: Vec<TaskId> = [TaskState::Ready, TaskState::Working]
        .into_iter()
        .flat_map(|state| {
            project
                .tasks()
                .iter()
                .filter(move |t| t.state() == state)
                .map(|t| t.id)
        })
        .collect();
    tasks.sort_by(|a, b| {
        project
            .task(*a)
            .pert
            .slack()
            .total_cmp(&project.task(*b).pert.slack())
    });
    tasks
}

/// Resources by ascending total skill (SSP). Ties keep input order.
pub fn prioritized_resources(project: &ProjectModel, include_busy: bool) -> Vec<ResourceId> {
    let mut resources: Vec<ResourceId> = project
        .resources()
        .iter()
        .filter(|r| include_busy || r.is_free())
        .map(|r| r.id)
        .collect();
    resources.sort_by(|a, b| {
        project
            .resource(*a)
            .total_skill()
            .total_cmp(&project.resource(*b).total_skill())
    });
    resources
}

/// Single greedy pass matching resources to tasks under `policy`.
pub fn allocate(project: &ProjectModel, policy: AllocationPolicy) -> Vec<Assignment> {
    let tasks = prioritized_tasks(project);
    let mut out = Vec::new();

    match policy {
        AllocationPolicy::Collaborative => {
            let mut pool = prioritized_resources(project, false);
            for task in tasks {
                let name = &project.task(task).name;
                pool.retain(|r| {
                    if project.resource(*r).can_perform(name) {
                        out.push(Assignment { task, resource: *r });
                        false
                    } else {
                        true
                    }
                });
            }
        }
        AllocationPolicy::SingleResource => {
            let mut pool = prioritized_resources(project, false);
            for task in tasks {
                if project.task(task).state() != TaskState::Ready {
                    continue;
                }
                let name = &project.task(task).name;
                if let Some(pos) = pool
                    .iter()
                    .position(|r| project.resource(*r).can_perform(name))
                {
                    out.push(Assignment {
                        task,
                        resource: pool.remove(pos),
                    });
                }
            }
        }
        AllocationPolicy::MultiTask => {
            let pool = prioritized_resources(project, true);
            for task in tasks {
                let name = &project.task(task).name;
                for r in &pool {
                    let resource = project.resource(*r);
                    if resource.can_perform(name) && !resource.is_engaged_on(task) {
                        out.push(Assignment { task, resource: *r });
                    }
                }
            }
        }
    }

    out
}
