//! Project data model: input contract, stochastic tables, tasks, resources,
//! workflows and the aggregate [`ProjectModel`].

pub mod graph;
pub mod input;
pub mod project;
pub mod resource;
pub mod stochastic;
pub mod task;
pub mod workflow;

pub use graph::{TaskGraph, TaskLike};
pub use input::{
    load_project_spec, parse_project_spec, ProjectSpec, ResourceSpec, SpecFormat, TaskSpec,
    WorkAmountEntry, WorkflowSpec,
};
pub use project::{ModelOptions, ProjectModel};
pub use resource::{Engagement, Resource, ResourceId};
pub use stochastic::{progress_bucket, DelayEntry, DelayTable, ReworkEntry, ReworkTable};
pub use task::{Pert, Segment, Task, TaskId, WORK_EPSILON};
pub use workflow::Workflow;
