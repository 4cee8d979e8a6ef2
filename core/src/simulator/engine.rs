use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::SimulationError;
use crate::model::ProjectModel;

use super::allocation::allocate;
use super::types::{RunSummary, SimulationOpts};

/// Drives one [`ProjectModel`] to completion with its own random stream.
pub struct Simulator {
    project: ProjectModel,
    opts: SimulationOpts,
    rng: StdRng,
    run: usize,
    time: u32,
}

impl Simulator {
    pub fn new(project: ProjectModel, opts: SimulationOpts) -> Self {
        Self {
            project,
            rng: StdRng::seed_from_u64(opts.seed),
            opts,
            run: 0,
            time: 0,
        }
    }

    pub fn with_run_index(mut self, run: usize) -> Self {
        self.run = run;
        self
    }

    pub fn project(&self) -> &ProjectModel {
        &self.project
    }

    pub fn into_project(self) -> ProjectModel {
        self.project
    }

    /// Current tick.
    pub fn time(&self) -> u32 {
        self.time
    }

    /// Reset the model and the random stream, then tick until every task
    /// is FINISHED or the tick budget runs out.
    #[tracing::instrument(name = "simulator.execute", skip(self), fields(run = self.run, seed = self.opts.seed))]
    pub fn execute(&mut self) -> Result<RunSummary, SimulationError> {
        self.rng = StdRng::seed_from_u64(self.opts.seed);
        self.time = 0;
        self.project.initialize()?;

        while !self.project.is_finished() {
            if let Some(max) = self.opts.max_ticks {
                if self.time >= max {
                    return Err(SimulationError::TickBudgetExceeded {
                        ticks: max,
                        unfinished: self.project.unfinished_count(),
                    });
                }
            }
            self.step()?;
        }

        let summary = self.summary();
        tracing::info!(
            duration = summary.duration,
            cost = summary.cost,
            total_work = summary.total_work,
            ticks = summary.ticks,
            "run complete"
        );
        Ok(summary)
    }

    /// Advance one tick.
    pub fn step(&mut self) -> Result<(), SimulationError> {
        let now = self.time;

        let assignments = allocate(&self.project, self.opts.policy);
        for a in assignments {
            self.project.assign(a.task, a.resource, now)?;
        }

        self.project.perform(now, &mut self.rng)?;
        self.project.check_finished(now, &mut self.rng)?;
        self.project.check_ready(now)?;
        self.project.update_pert(now);

        self.time += 1;
        Ok(())
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            run: self.run,
            seed: self.opts.seed,
            duration: self.project.duration(),
            cost: self.project.total_cost(),
            total_work: self.project.total_actual_work(),
            ticks: self.time,
        }
    }
}
