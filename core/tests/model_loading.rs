mod common;

use std::path::PathBuf;

use common::*;
use pdes_core::error::ModelError;
use pdes_core::model::{load_project_spec, ModelOptions, ProjectModel};
use pdes_core::simulator::{SimulationOpts, Simulator};

fn demo_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("demos")
        .join("product_launch.toml")
}

#[test]
fn demo_model_loads_and_simulates() {
    let spec = load_project_spec(&demo_path()).unwrap();
    let model = ProjectModel::from_spec(&spec, ModelOptions::default()).unwrap();
    assert_eq!(model.name(), "product-launch");
    assert_eq!(model.tasks().len(), 4);
    assert_eq!(model.resources().len(), 3);

    let stages: Vec<usize> = model.workflows()[0].stages().iter().map(|s| s.len()).collect();
    assert_eq!(stages, vec![1, 2, 1]);

    for seed in 0..20 {
        let mut sim = Simulator::new(model.clone(), SimulationOpts::default().with_seed(seed));
        let summary = sim.execute().unwrap();
        assert!(summary.duration >= 10, "seed {seed}: {summary:?}");
        assert!(summary.cost > 0.0);
    }
}

#[test]
fn json_spec_round_trips_through_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chain.json");
    std::fs::write(&path, serde_json::to_string(&chain_spec()).unwrap()).unwrap();

    let spec = load_project_spec(&path).unwrap();
    let model = ProjectModel::from_spec(&spec, ModelOptions::default()).unwrap();
    let mut sim = Simulator::new(model, SimulationOpts::default());
    assert_eq!(sim.execute().unwrap().duration, 6);
}

#[test]
fn missing_file_is_io_error() {
    let err = load_project_spec(&PathBuf::from("/nonexistent/model.toml")).unwrap_err();
    assert!(matches!(err, ModelError::Io { .. }));
}

#[test]
fn malformed_toml_is_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "name = [").unwrap();
    assert!(matches!(
        load_project_spec(&path).unwrap_err(),
        ModelError::Parse { .. }
    ));
}

#[test]
fn cycle_is_rejected() {
    let spec = project(
        vec![task("A", &["C"], 1.0), task("B", &["A"], 1.0), task("C", &["B"], 1.0)],
        vec![resource("R", &["A", "B", "C"])],
    );
    let err = ProjectModel::from_spec(&spec, ModelOptions::default()).unwrap_err();
    assert!(matches!(err, ModelError::CircularDependency(_)), "{err}");
}

#[test]
fn unknown_predecessor_is_rejected() {
    let spec = project(vec![task("A", &["ghost"], 1.0)], vec![resource("R", &["A"])]);
    let err = ProjectModel::from_spec(&spec, ModelOptions::default()).unwrap_err();
    assert!(matches!(err, ModelError::DependencyNotFound { .. }), "{err}");
}

#[test]
fn unsorted_delay_table_is_strict_by_default() {
    let mut a = task("A", &[], 2.0);
    a.delay = vec![delay(1, 0.5, 1.0), delay(1, 0.2, 2.0)];
    let spec = project(vec![a], vec![resource("R", &["A"])]);

    let err = ProjectModel::from_spec(&spec, ModelOptions::default()).unwrap_err();
    assert!(matches!(err, ModelError::UnsortedProbabilities { .. }), "{err}");

    let lax = ModelOptions {
        strict_probability_order: false,
    };
    assert!(ProjectModel::from_spec(&spec, lax).is_ok());
}

#[test]
fn overfull_probabilities_are_rejected() {
    let mut a = task("A", &[], 2.0);
    a.delay = vec![delay(1, 0.6, 1.0), delay(1, 0.7, 2.0)];
    let spec = project(vec![a], vec![resource("R", &["A"])]);
    let err = ProjectModel::from_spec(&spec, ModelOptions::default()).unwrap_err();
    assert!(matches!(err, ModelError::ProbabilityOverflow { .. }), "{err}");
}

#[test]
fn missing_first_occurrence_is_rejected() {
    let a = task_with_amounts("A", &[], &[(2, 1.0)]);
    let spec = project(vec![a], vec![resource("R", &["A"])]);
    let err = ProjectModel::from_spec(&spec, ModelOptions::default()).unwrap_err();
    assert!(matches!(err, ModelError::MissingInitialWorkAmount(_)), "{err}");
}
