use std::fmt::Write as _;
use std::path::Path;

use crate::error::ReportError;
use crate::model::{ProjectModel, Segment, Task};

use super::{csv_field, fmt_num, write_text, ReportOptions};

const NO_REWORK: &str = "None";

/// One line per completed task occurrence, in completion order:
/// `run,sequence,workflow,task,start,finish,capacity,reworked_by`.
///
/// Sequence numbers start at 1. A segment whose completion was later undone
/// by rework names the triggering task in the last column.
pub fn render_event_log(project: &ProjectModel, run: usize, opts: &ReportOptions) -> String {
    let mut completed: Vec<(&Task, &Segment, u32, u32)> = project
        .tasks()
        .iter()
        .flat_map(|task| {
            task.history().iter().filter_map(move |segment| {
                let finish = segment.finish?;
                let start = segment.start.unwrap_or(segment.ready);
                Some((task, segment, start, finish))
            })
        })
        .collect();
    completed.sort_by_key(|(task, _, start, finish)| (*finish, *start, task.id));

    let mut out = String::new();
    for (seq, (task, segment, start, finish)) in completed.into_iter().enumerate() {
        let workflow = project
            .workflows()
            .get(task.workflow)
            .map(|w| w.id.as_str())
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "{},{},{},{},{},{},{},{}",
            run,
            seq + 1,
            csv_field(workflow),
            csv_field(&task.name),
            fmt_num(opts.time(start)),
            fmt_num(opts.time(finish)),
            fmt_num(segment.capacity),
            segment
                .reworked_by
                .as_deref()
                .map(csv_field)
                .unwrap_or_else(|| NO_REWORK.to_string()),
        );
    }
    out
}

pub async fn write_event_log(
    project: &ProjectModel,
    run: usize,
    path: &Path,
    opts: &ReportOptions,
) -> Result<(), ReportError> {
    write_text(path, &render_event_log(project, run, opts)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        ModelOptions, ProjectSpec, ResourceSpec, TaskSpec, WorkAmountEntry, WorkflowSpec,
    };
    use crate::simulator::{SimulationOpts, Simulator};
    use pretty_assertions::assert_eq;

    fn finished_fork() -> ProjectModel {
        let task = |name: &str, deps: &[&str], amount: f64| TaskSpec {
            name: name.to_string(),
            node_id: None,
            predecessors: deps.iter().map(|d| d.to_string()).collect(),
            minimum_work_amount: vec![WorkAmountEntry {
                occurrence: 1,
                amount,
            }],
            rework: vec![],
            delay: vec![],
        };
        let resource = |name: &str, task: &str| ResourceSpec {
            name: name.to_string(),
            node_id: None,
            cost_per_time: 1.0,
            work_amount_skill: [(task.to_string(), 1.0)].into_iter().collect(),
            quality_skill: Default::default(),
        };
        let spec = ProjectSpec {
            name: "fork".to_string(),
            workflows: vec![WorkflowSpec {
                id: "wf-1".to_string(),
                tasks: vec![task("A", &[], 1.0), task("B", &["A"], 2.0), task("C", &["A"], 1.0)],
            }],
            resources: vec![resource("ra", "A"), resource("rb", "B"), resource("rc", "C")],
        };
        let model = ProjectModel::from_spec(&spec, ModelOptions::default()).unwrap();
        let mut sim = Simulator::new(model, SimulationOpts::default());
        sim.execute().unwrap();
        sim.into_project()
    }

    #[test]
    fn test_event_log_in_completion_order() {
        let log = render_event_log(&finished_fork(), 7, &ReportOptions::default());
        let expected = "\
7,1,wf-1,A,1,1,1,None
7,2,wf-1,C,2,2,1,None
7,3,wf-1,B,2,3,1,None
";
        assert_eq!(log, expected);
    }

    #[test]
    fn test_event_log_scaled_times() {
        let opts = ReportOptions {
            time_scale: 2.0,
            utf8_bom: false,
        };
        let log = render_event_log(&finished_fork(), 0, &opts);
        assert!(log.starts_with("0,1,wf-1,A,0.5,0.5,1,None\n"));
    }

    #[tokio::test]
    async fn test_write_event_log() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run-3.log");
        write_event_log(&finished_fork(), 3, &path, &ReportOptions::default())
            .await
            .unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 3);
    }
}
