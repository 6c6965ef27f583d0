// src/protocol/mod.rs
//
// Single-player protocol: runs many independent trials of each learner
// against one environment and streams the records of every trial.
//
// Scheduling:
// - A rayon pool runs one job per trial. Each job clones the environment and
//   the learner's sweep variants, so workers share no mutable state.
// - Trial seeds are drawn by the orchestrating thread at submission.
// - At most `in_flight_window(workers)` trials are submitted ahead of the
//   collector; each collected trial lets one more in.
// - Jobs report over a channel; only the orchestrating thread touches the
//   sink, writing (and flushing) each trial's sweep-list as it arrives.
// - All trials of a learner are collected before the next learner starts.
// - The first failed trial (error or panic) aborts collection for that
//   learner and is returned.

pub mod output;
pub mod seed;
pub mod sweep;
pub mod trial;

use std::any::Any;
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::mpsc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info};

use crate::environment::Environment;
use crate::error::{HarnessError, Result};
use crate::learner::Learner;
use crate::metrics::OutcomeSummary;

pub use output::{read_results, FileSink, MemorySink, ResultSink, TrialResult};
pub use seed::{derive_seed, sweep_seed, time_seed};
pub use sweep::Sweep;
pub use trial::{run_sweep, run_trial};

type TrialOutcome = Result<Vec<TrialResult>>;

/// Summary of one learner (one sweep value) over a `play` call.
#[derive(Debug, Clone, Serialize)]
pub struct PlaySummary {
    pub learner: String,
    pub environment: String,
    pub goal: &'static str,
    /// Protocol parameter of the goal (horizon, budget or confidence).
    pub parameter: f64,
    pub trials: usize,
    /// Statistics of the final record value (regret or goal regret).
    pub outcome_mean: f64,
    pub outcome_std: f64,
    pub outcome_std_error: f64,
    pub outcome_median: f64,
    pub outcome_min: f64,
    pub outcome_max: f64,
    pub elapsed_secs: f64,
}

pub struct Protocol {
    environment: Box<dyn Environment>,
    learners: Vec<Sweep>,
}

impl Protocol {
    /// Fails with `IncompatibleEnvironment` if any learner requires a
    /// different environment kind, and with `Configuration` if two learners
    /// share a name (their records would be indistinguishable).
    pub fn new<L>(environment: Box<dyn Environment>, learners: Vec<L>) -> Result<Self>
    where
        L: Into<Sweep>,
    {
        let learners: Vec<Sweep> = learners.into_iter().map(Into::into).collect();
        if learners.is_empty() {
            return Err(HarnessError::config("no learners to play"));
        }
        let mut names = HashSet::new();
        for learner in &learners {
            if learner.running_environment() != environment.kind() {
                return Err(HarnessError::IncompatibleEnvironment {
                    learner: learner.name().to_string(),
                    environment: environment.name().to_string(),
                    required: learner.running_environment(),
                    found: environment.kind(),
                });
            }
            if !names.insert(learner.name().to_string()) {
                return Err(HarnessError::config(format!(
                    "two learners are named {:?}; give one a distinct `name`",
                    learner.name()
                )));
            }
        }
        Ok(Self {
            environment,
            learners,
        })
    }

    pub fn environment(&self) -> &dyn Environment {
        self.environment.as_ref()
    }

    pub fn learners(&self) -> &[Sweep] {
        &self.learners
    }

    /// Run `trials` trials per learner, appending records to `output`.
    ///
    /// `processes < 0` uses every available core. `debug` forces a single
    /// synchronous trial with per-step tracing. Returns one summary per
    /// learner and sweep value.
    pub fn play(
        &self,
        trials: usize,
        output: impl AsRef<Path>,
        processes: i64,
        debug: bool,
    ) -> Result<Vec<PlaySummary>> {
        let mut sink = FileSink::append(output)?;
        self.play_with_sink(trials, &mut sink, processes, debug)
    }

    pub fn play_with_sink(
        &self,
        trials: usize,
        sink: &mut dyn ResultSink,
        processes: i64,
        debug: bool,
    ) -> Result<Vec<PlaySummary>> {
        let mut summaries = Vec::new();
        if debug {
            for learner in &self.learners {
                summaries.extend(self.play_debug(learner, sink)?);
            }
            return Ok(summaries);
        }

        let workers = worker_count(processes)?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("banditlab-trial-{i}"))
            .build()
            .map_err(|e| HarnessError::config(format!("failed to build worker pool: {e}")))?;

        for learner in &self.learners {
            summaries.extend(self.play_learner(&pool, learner, trials, sink)?);
        }
        Ok(summaries)
    }

    fn play_learner(
        &self,
        pool: &rayon::ThreadPool,
        sweep: &Sweep,
        trials: usize,
        sink: &mut dyn ResultSink,
    ) -> Result<Vec<PlaySummary>> {
        let window = in_flight_window(pool.current_num_threads()).min(trials);
        info!(
            learner = sweep.name(),
            environment = self.environment.name(),
            sweep_values = sweep.len(),
            trials,
            workers = pool.current_num_threads(),
            window,
            "start playing"
        );
        let started = Instant::now();

        let (tx, rx) = mpsc::channel::<TrialOutcome>();
        let mut submitted = 0;
        while submitted < window {
            self.submit_trial(pool, sweep, tx.clone());
            submitted += 1;
        }

        let mut outcomes: Vec<Vec<f64>> = (0..sweep.len())
            .map(|_| Vec::with_capacity(trials))
            .collect();
        for done in 1..=trials {
            let records = rx.recv().map_err(|_| {
                HarnessError::TrialPanicked("worker pool stopped before all trials reported".into())
            })??;
            if submitted < trials {
                self.submit_trial(pool, sweep, tx.clone());
                submitted += 1;
            }
            sink.write_batch(&records)?;
            for (values, record) in outcomes.iter_mut().zip(&records) {
                if let Some(outcome) = record.outcome(sweep.name()) {
                    values.push(outcome);
                }
            }
            debug!(learner = sweep.name(), done, trials, "trial collected");
        }

        let summaries = self.summarize(sweep, trials, &outcomes, started);
        for summary in &summaries {
            info!(
                learner = %summary.learner,
                parameter = summary.parameter,
                elapsed_secs = summary.elapsed_secs,
                outcome_mean = summary.outcome_mean,
                outcome_std = summary.outcome_std,
                "finished playing"
            );
        }
        Ok(summaries)
    }

    /// Clone the prototypes and queue one trial on the pool.
    fn submit_trial(
        &self,
        pool: &rayon::ThreadPool,
        sweep: &Sweep,
        tx: mpsc::Sender<TrialOutcome>,
    ) {
        let seed = time_seed();
        let mut environment = self.environment.box_clone();
        let mut variants = sweep.clone_variants();
        pool.spawn(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                run_sweep(environment.as_mut(), &mut variants, seed, false)
            }))
            .unwrap_or_else(|payload| {
                Err(HarnessError::TrialPanicked(panic_message(payload.as_ref())))
            });
            // The receiver is gone only after an earlier trial failed.
            let _ = tx.send(outcome);
        });
    }

    fn play_debug(&self, sweep: &Sweep, sink: &mut dyn ResultSink) -> Result<Vec<PlaySummary>> {
        info!(learner = sweep.name(), "debug run: one synchronous trial");
        let started = Instant::now();
        let mut environment = self.environment.box_clone();
        let mut variants = sweep.clone_variants();
        let records = run_sweep(environment.as_mut(), &mut variants, time_seed(), true)?;
        sink.write_batch(&records)?;

        let outcomes: Vec<Vec<f64>> = records
            .iter()
            .map(|r| r.outcome(sweep.name()).into_iter().collect())
            .collect();
        Ok(self.summarize(sweep, 1, &outcomes, started))
    }

    fn summarize(
        &self,
        sweep: &Sweep,
        trials: usize,
        outcomes: &[Vec<f64>],
        started: Instant,
    ) -> Vec<PlaySummary> {
        let elapsed_secs = started.elapsed().as_secs_f64();
        sweep
            .variants()
            .iter()
            .zip(outcomes)
            .map(|(learner, values)| {
                let stats = OutcomeSummary::from_outcomes(values);
                let goal = learner.goal();
                PlaySummary {
                    learner: learner.name().to_string(),
                    environment: self.environment.name().to_string(),
                    goal: goal.label(),
                    parameter: goal.parameter(),
                    trials,
                    outcome_mean: stats.mean,
                    outcome_std: stats.std,
                    outcome_std_error: stats.std_error,
                    outcome_median: stats.median,
                    outcome_min: stats.min,
                    outcome_max: stats.max,
                    elapsed_secs,
                }
            })
            .collect()
    }
}

/// Worker count for a `processes` setting: negative means all cores.
pub fn worker_count(processes: i64) -> Result<usize> {
    match processes {
        0 => Err(HarnessError::config("processes must be non-zero")),
        p if p < 0 => Ok(std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)),
        p => Ok(p as usize),
    }
}

/// Trials submitted ahead of the collector: enough to keep every worker
/// busy while the collector writes.
pub(crate) fn in_flight_window(workers: usize) -> usize {
    workers.max(1) * 2
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
