// src/main.rs
//
// Thin harness around the banditlab library: load a YAML experiment, play
// it, and append one JSON record per trial to the output file.
//
// Precedence: CLI flags > BANDITLAB_* environment overrides > defaults.
// RUST_LOG, when set, replaces the resolved log filter.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use banditlab::protocol::output::atomic_write;
use banditlab::{init_logging, ExperimentSpec, LogFormat, Protocol, RunConfig};

/// Command-line arguments for the banditlab binary.
#[derive(Parser, Debug)]
#[command(name = "banditlab", version, about)]
struct Cli {
    /// YAML experiment file (environment + learners).
    #[arg(long)]
    experiment: PathBuf,

    /// Trials per learner.
    #[arg(long)]
    trials: Option<usize>,

    /// JSONL results file (opened in append mode).
    #[arg(long)]
    output: Option<PathBuf>,

    /// Worker threads; -1 uses every core.
    #[arg(long, allow_hyphen_values = true)]
    processes: Option<i64>,

    /// Run a single synchronous trial per learner with per-step tracing.
    #[arg(long)]
    debug: bool,

    /// Log filter (overrides BANDITLAB_LOG; a debug run defaults to
    /// `banditlab=debug`).
    #[arg(long)]
    log: Option<String>,

    /// Log output format: pretty, compact or json.
    #[arg(long, default_value = "compact")]
    log_format: LogFormat,

    /// Also write per-learner summaries as JSON to this file.
    #[arg(long)]
    summary: Option<PathBuf>,
}

/// Build the run configuration from env overrides, then apply CLI flags.
fn build_run_config(cli: &Cli) -> RunConfig {
    let mut run = RunConfig::from_env();
    if let Some(trials) = cli.trials {
        run.trials = trials;
    }
    if let Some(output) = &cli.output {
        run.output = output.clone();
    }
    if let Some(processes) = cli.processes {
        run.processes = processes;
    }
    if let Some(log) = &cli.log {
        run.log_level = Some(log.clone());
    }
    run.debug = cli.debug;
    run
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let run = build_run_config(&cli);
    init_logging(run.log_filter(), cli.log_format)?;
    run.log_ignored_overrides();
    run.validate().context("invalid run settings")?;

    let spec = ExperimentSpec::from_yaml_file(&cli.experiment)
        .with_context(|| format!("loading experiment {}", cli.experiment.display()))?;
    let (environment, learners) = spec.build().context("building experiment")?;
    let protocol = Protocol::new(environment, learners)?;

    info!(
        experiment = %spec.name,
        trials = run.effective_trials(),
        processes = run.processes,
        output = %run.output.display(),
        debug = run.debug,
        "playing"
    );
    let summaries = protocol
        .play(run.trials, &run.output, run.processes, run.debug)
        .with_context(|| format!("playing experiment {}", spec.name))?;

    for s in &summaries {
        println!(
            "{:<28} {:<22} param={:<8} trials={:<6} mean={:.4} std={:.4} median={:.4} elapsed={:.2}s",
            s.learner,
            s.goal,
            s.parameter,
            s.trials,
            s.outcome_mean,
            s.outcome_std,
            s.outcome_median,
            s.elapsed_secs
        );
    }

    if let Some(path) = &cli.summary {
        let json = serde_json::to_vec_pretty(&summaries)?;
        atomic_write(path, &json)
            .with_context(|| format!("writing summary {}", path.display()))?;
    }
    Ok(())
}
