#![allow(dead_code)]

use std::collections::BTreeMap;

use pdes_core::model::{
    DelayEntry, ModelOptions, ProjectModel, ProjectSpec, ResourceSpec, ReworkEntry, TaskSpec,
    WorkAmountEntry, WorkflowSpec,
};
use pdes_core::simulator::{SimulationOpts, Simulator};

/// Task with a single occurrence-1 work amount.
pub fn task(name: &str, deps: &[&str], amount: f64) -> TaskSpec {
    task_with_amounts(name, deps, &[(1, amount)])
}

pub fn task_with_amounts(name: &str, deps: &[&str], amounts: &[(u32, f64)]) -> TaskSpec {
    TaskSpec {
        name: name.to_string(),
        node_id: None,
        predecessors: deps.iter().map(|d| d.to_string()).collect(),
        minimum_work_amount: amounts
            .iter()
            .map(|(occurrence, amount)| WorkAmountEntry {
                occurrence: *occurrence,
                amount: *amount,
            })
            .collect(),
        rework: vec![],
        delay: vec![],
    }
}

pub fn rework(occurrence: u32, progress: f64, probability: f64, source: &str) -> ReworkEntry {
    ReworkEntry {
        occurrence,
        progress,
        probability,
        source: source.to_string(),
    }
}

pub fn delay(occurrence: u32, probability: f64, extra_work: f64) -> DelayEntry {
    DelayEntry {
        occurrence,
        probability,
        extra_work,
    }
}

/// Resource with skill 1.0 for every task in `tasks`.
pub fn resource(name: &str, tasks: &[&str]) -> ResourceSpec {
    resource_with_skill(name, tasks, 1.0)
}

pub fn resource_with_skill(name: &str, tasks: &[&str], skill: f64) -> ResourceSpec {
    ResourceSpec {
        name: name.to_string(),
        node_id: None,
        cost_per_time: 1.0,
        work_amount_skill: tasks.iter().map(|t| (t.to_string(), skill)).collect(),
        quality_skill: BTreeMap::new(),
    }
}

pub fn project(tasks: Vec<TaskSpec>, resources: Vec<ResourceSpec>) -> ProjectSpec {
    ProjectSpec {
        name: "test".to_string(),
        workflows: vec![WorkflowSpec {
            id: "wf".to_string(),
            tasks,
        }],
        resources,
    }
}

pub fn build(spec: &ProjectSpec) -> ProjectModel {
    ProjectModel::from_spec(spec, ModelOptions::default()).expect("valid model")
}

/// Run one simulation and hand back the finished model.
pub fn simulate(spec: &ProjectSpec, opts: SimulationOpts) -> ProjectModel {
    let mut sim = Simulator::new(build(spec), opts);
    sim.execute().expect("simulation completes");
    sim.into_project()
}

/// A→B→C with work {A:2, B:3, C:1}, one resource able to do all three.
pub fn chain_spec() -> ProjectSpec {
    project(
        vec![task("A", &[], 2.0), task("B", &["A"], 3.0), task("C", &["B"], 1.0)],
        vec![resource("R", &["A", "B", "C"])],
    )
}

/// A → {B, C} → D with work {A:2, B:3, C:5, D:1}, one dedicated resource per task.
pub fn diamond_spec() -> ProjectSpec {
    project(
        vec![
            task("A", &[], 2.0),
            task("B", &["A"], 3.0),
            task("C", &["A"], 5.0),
            task("D", &["B", "C"], 1.0),
        ],
        vec![
            resource("ra", &["A"]),
            resource("rb", &["B"]),
            resource("rc", &["C"]),
            resource("rd", &["D"]),
        ],
    )
}
