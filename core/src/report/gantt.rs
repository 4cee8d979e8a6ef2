use std::fmt::Write as _;
use std::path::Path;

use crate::error::ReportError;
use crate::model::ProjectModel;

use super::{csv_field, fmt_num, write_text, ReportOptions, UTF8_BOM};

/// Gantt table of one finished run.
///
/// ```text
/// Duration,6,Total Work Amount,6
/// Workflow,Task,Occurrence,Resources,Ready,Start,Finish
/// wf,A,1,R1+R2,1,1,2
///
/// Resource,Cost Per Time,Start,Finish,...
/// R1,1,1,2,3,5
/// ```
pub fn render_gantt_csv(project: &ProjectModel, opts: &ReportOptions) -> String {
    let mut out = String::new();
    if opts.utf8_bom {
        out.push_str(UTF8_BOM);
    }

    let duration = match project.duration() {
        0 => 0.0,
        d => opts.time(d - 1),
    };
    let _ = writeln!(
        out,
        "Duration,{},Total Work Amount,{}",
        fmt_num(duration),
        fmt_num(project.total_actual_work())
    );

    out.push_str("Workflow,Task,Occurrence,Resources,Ready,Start,Finish\n");
    for workflow in project.workflows() {
        for id in workflow.tasks() {
            let task = project.task(*id);
            for segment in task.history() {
                let resources = project.resource_names(&segment.resources).join("+");
                let _ = writeln!(
                    out,
                    "{},{},{},{},{},{},{}",
                    csv_field(&workflow.id),
                    csv_field(&task.name),
                    segment.occurrence,
                    csv_field(&resources),
                    fmt_num(opts.time(segment.ready)),
                    time_cell(segment.start, opts),
                    time_cell(segment.finish, opts),
                );
            }
        }
    }

    out.push('\n');
    out.push_str("Resource,Cost Per Time,Start,Finish,...\n");
    for resource in project.resources() {
        let _ = write!(
            out,
            "{},{}",
            csv_field(&resource.name),
            fmt_num(resource.cost_per_time)
        );
        for engagement in resource.engagements() {
            let _ = write!(
                out,
                ",{},{}",
                fmt_num(opts.time(engagement.start)),
                time_cell(engagement.finish, opts)
            );
        }
        out.push('\n');
    }

    out
}

pub async fn write_gantt_csv(
    project: &ProjectModel,
    path: &Path,
    opts: &ReportOptions,
) -> Result<(), ReportError> {
    write_text(path, &render_gantt_csv(project, opts)).await
}

fn time_cell(tick: Option<u32>, opts: &ReportOptions) -> String {
    tick.map(|t| fmt_num(opts.time(t))).unwrap_or_default()
}
