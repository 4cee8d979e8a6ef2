//! Command handlers: merge CLI overrides into the config, build the model,
//! and drive the simulator or the Monte Carlo driver.

use std::path::Path;

use pdes_core::config::AppConfig;
use pdes_core::error::CliError;
use pdes_core::model::{load_project_spec, ModelOptions, ProjectModel};
use pdes_core::montecarlo::{BatchOpts, CancellationFlag, MonteCarloDriver};
use pdes_core::report::{self, ReportOptions};
use pdes_core::simulator::{RunSummary, SimulationOpts, Simulator};

use crate::commands::cli::{BatchArgs, RunArgs, ValidateArgs};

pub fn load_model(path: &Path, cfg: &AppConfig) -> Result<ProjectModel, CliError> {
    let spec = load_project_spec(path)?;
    let opts = ModelOptions {
        strict_probability_order: cfg.simulation.strict_probability_order,
    };
    let model = ProjectModel::from_spec(&spec, opts)?;
    tracing::debug!(
        project = model.name(),
        tasks = model.tasks().len(),
        resources = model.resources().len(),
        "model loaded"
    );
    Ok(model)
}

fn summary_line(summary: &RunSummary) -> String {
    format!(
        "run {} (seed {}): duration {}, cost {:.2}, total work {:.2}, ticks {}",
        summary.run, summary.seed, summary.duration, summary.cost, summary.total_work, summary.ticks
    )
}

#[tracing::instrument(name = "cli.run", skip_all, fields(model = %args.model.display()))]
pub async fn run_single(args: RunArgs, cfg: &AppConfig) -> Result<i32, CliError> {
    let model = load_model(&args.model, cfg)?;

    let mut opts = SimulationOpts::from_config(&cfg.simulation);
    if let Some(seed) = args.seed {
        opts.seed = seed;
    }
    if let Some(policy) = args.policy {
        opts.policy = policy.into();
    }
    if args.max_ticks.is_some() {
        opts.max_ticks = args.max_ticks;
    }

    let (summary, project) = tokio::task::spawn_blocking(move || {
        let mut sim = Simulator::new(model, opts);
        let summary = sim.execute();
        (summary, sim.into_project())
    })
    .await
    .map_err(|e| CliError::Command(format!("simulation worker failed: {e}")))?;
    let summary = summary?;

    if let Some(dir) = &args.output_dir {
        let report_opts = ReportOptions::from_config(&cfg.report);
        report::write_run_artifacts(&project, dir, summary.run, &report_opts).await?;
        tracing::info!(dir = %dir.display(), "run artifacts written");
    }

    if args.json {
        println!("{}", serde_json::to_string(&summary).map_err(pdes_core::error::ReportError::from)?);
    } else {
        println!("{}", summary_line(&summary));
    }
    Ok(0)
}

/// Build batch options from config, then let explicit flags win.
pub fn batch_opts(args: &BatchArgs, cfg: &AppConfig) -> BatchOpts {
    let mut opts = BatchOpts::from_config(cfg);
    if let Some(runs) = args.runs {
        opts.runs = runs;
    }
    if let Some(seed) = args.base_seed {
        opts.base_seed = seed;
    }
    if args.max_parallel.is_some() {
        opts.max_parallel = args.max_parallel;
    }
    if let Some(policy) = args.policy {
        opts.simulation.policy = policy.into();
    }
    if args.max_ticks.is_some() {
        opts.simulation.max_ticks = args.max_ticks;
    }
    if let Some(dir) = &args.output_dir {
        opts.output_dir = Some(dir.clone());
    }
    if args.write_artifacts {
        opts.write_artifacts = true;
    }
    if args.no_progress || !atty::is(atty::Stream::Stderr) {
        opts.progress_bar = false;
    }
    opts
}

#[tracing::instrument(name = "cli.batch", skip_all, fields(model = %args.model.display()))]
pub async fn run_batch(
    args: BatchArgs,
    cfg: &AppConfig,
    cancel: CancellationFlag,
) -> Result<i32, CliError> {
    let opts = batch_opts(&args, cfg);

    if opts.runs == 0 {
        tracing::info!("runs = 0, falling back to a single deterministic run");
        let single = RunArgs {
            model: args.model,
            seed: Some(opts.base_seed),
            policy: args.policy,
            max_ticks: opts.simulation.max_ticks,
            output_dir: if opts.write_artifacts { opts.output_dir } else { None },
            json: matches!(args.format, Some(crate::commands::cli::OutputFormat::Jsonl)),
        };
        return run_single(single, cfg).await;
    }

    let model = load_model(&args.model, cfg)?;
    let project_name = model.name().to_string();
    let format = args
        .format
        .map(|f| f.as_str().to_string())
        .unwrap_or_else(|| cfg.report.output_format.clone());

    let renderer = pdes_plugins::factory::build_renderer(&format, !atty::is(atty::Stream::Stdout))
        .map_err(|e| CliError::Config(e.to_string()))?;
    let strategy =
        pdes_plugins::factory::build_concurrency_strategy(&cfg.concurrency, opts.max_parallel)
            .map_err(|e| CliError::Config(e.to_string()))?;

    let driver = MonteCarloDriver::new(model, opts)
        .with_renderer(renderer)
        .with_concurrency_strategy(strategy)
        .with_cancellation(cancel);
    let result = driver.run().await?;

    let batch_report = report::build_report(&result, &project_name);
    if format == "jsonl" {
        println!(
            "{}",
            serde_json::to_string(&batch_report).map_err(pdes_core::error::ReportError::from)?
        );
    } else {
        print!("{}", report::format_text(&batch_report));
    }

    Ok(if result.failed() > 0 { 30 } else { 0 })
}

pub fn validate(args: ValidateArgs, cfg: &AppConfig) -> Result<i32, CliError> {
    let mut model = load_model(&args.model, cfg)?;
    model.initialize()?;

    println!(
        "project {}: {} tasks, {} resources",
        model.name(),
        model.tasks().len(),
        model.resources().len()
    );
    for workflow in model.workflows() {
        println!(
            "workflow {}: critical path {}",
            workflow.id,
            workflow.critical_path_length()
        );
        for (i, stage) in workflow.stages().iter().enumerate() {
            let names: Vec<&str> = stage.iter().map(|id| model.task(*id).name.as_str()).collect();
            println!("  stage {}: {}", i, names.join(", "));
        }
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write_chain(dir: &Path) -> PathBuf {
        let path = dir.join("chain.toml");
        std::fs::write(
            &path,
            r#"
name = "chain"

[[workflows]]
id = "wf"

[[workflows.tasks]]
name = "A"
minimum_work_amount = [{ occurrence = 1, amount = 2.0 }]

[[workflows.tasks]]
name = "B"
predecessors = ["A"]
minimum_work_amount = [{ occurrence = 1, amount = 3.0 }]

[[resources]]
name = "R"
cost_per_time = 1.0
work_amount_skill = { A = 1.0, B = 1.0 }
"#,
        )
        .unwrap();
        path
    }

    fn batch_args(model: PathBuf) -> BatchArgs {
        BatchArgs {
            model,
            runs: Some(4),
            base_seed: Some(10),
            max_parallel: Some(2),
            policy: None,
            max_ticks: None,
            output_dir: None,
            write_artifacts: false,
            format: None,
            no_progress: true,
        }
    }

    #[test]
    fn test_load_model() {
        let dir = tempfile::tempdir().unwrap();
        let model = load_model(&write_chain(dir.path()), &AppConfig::default()).unwrap();
        assert_eq!(model.tasks().len(), 2);
    }

    #[test]
    fn test_load_model_missing_file() {
        let err = load_model(Path::new("/nonexistent.toml"), &AppConfig::default()).unwrap_err();
        assert!(matches!(err, CliError::Model(_)));
    }

    #[test]
    fn test_batch_opts_flags_override_config() {
        let mut cfg = AppConfig::default();
        cfg.monte_carlo.runs = 50;
        cfg.monte_carlo.base_seed = 1;
        let opts = batch_opts(&batch_args(PathBuf::from("m.toml")), &cfg);
        assert_eq!(opts.runs, 4);
        assert_eq!(opts.base_seed, 10);
        assert_eq!(opts.max_parallel, Some(2));
        assert!(!opts.progress_bar);
    }

    #[tokio::test]
    async fn test_run_single_writes_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let args = RunArgs {
            model: write_chain(dir.path()),
            seed: None,
            policy: None,
            max_ticks: None,
            output_dir: Some(out.clone()),
            json: true,
        };
        assert_eq!(run_single(args, &AppConfig::default()).await.unwrap(), 0);
        assert!(out.join("run-0.csv").exists());
        assert!(out.join("run-0.log").exists());
    }

    #[tokio::test]
    async fn test_run_batch_writes_summary() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("batch");
        let mut args = batch_args(write_chain(dir.path()));
        args.output_dir = Some(out.clone());

        let code = run_batch(args, &AppConfig::default(), CancellationFlag::new())
            .await
            .unwrap();
        assert_eq!(code, 0);
        let summary = std::fs::read_to_string(out.join("summary.csv")).unwrap();
        assert_eq!(summary.lines().count(), 5);
        assert!(!out.join("run-0.csv").exists());
    }

    #[test]
    fn test_validate() {
        let dir = tempfile::tempdir().unwrap();
        let args = ValidateArgs {
            model: write_chain(dir.path()),
        };
        assert_eq!(validate(args, &AppConfig::default()).unwrap(), 0);
    }
}
