// src/protocol/trial.rs
//
// One trial: reset both parties, alternate actions / step / update until
// the learner terminates, then score the learner under its goal.
//
// Records per goal:
//   RegretMinimization  [horizon, regret]
//   FixedBudgetBai      [budget, best_arm_regret]
//   FixedConfidenceBai  [confidence, tot_samples, best_arm_regret]
//   AllCorrect          [budget, all_correct_regret]

use tracing::debug;

use super::output::TrialResult;
use super::seed::{derive_seed, sweep_seed, ENVIRONMENT_STREAM, LEARNER_STREAM};
use crate::environment::Environment;
use crate::error::{HarnessError, Result};
use crate::learner::{Answer, Goal, Learner};
use crate::types::Batch;

/// Run one trial of `learner` against `environment` from `seed`.
pub fn run_trial(
    environment: &mut dyn Environment,
    learner: &mut dyn Learner,
    seed: u64,
    trace_steps: bool,
) -> Result<TrialResult> {
    environment.reset(Some(derive_seed(seed, ENVIRONMENT_STREAM)));
    learner.reset(Some(derive_seed(seed, LEARNER_STREAM)));

    let goal = learner.goal();
    let mut total_reward = 0.0;
    let mut step = 0u64;
    loop {
        let actions = {
            let context = environment.context();
            learner.actions(&context)?
        };
        let Some(actions) = actions else {
            break;
        };
        let feedback = environment.step(&actions)?;
        total_reward += feedback.iter().map(Batch::total_reward).sum::<f64>();
        if trace_steps {
            debug!(
                learner = learner.name(),
                step,
                ?actions,
                ?feedback,
                tot_samples = environment.tot_samples(),
                "step"
            );
        }
        learner.update(&feedback)?;
        step += 1;
    }

    if let Some(budget) = goal.budget() {
        if environment.tot_samples() > budget {
            return Err(HarnessError::invalid_action(format!(
                "{}: {} samples exceed the budget {budget}",
                learner.name(),
                environment.tot_samples()
            )));
        }
    }

    let answer = learner.answer()?;
    let values = match (goal, &answer) {
        (Goal::RegretMinimization { horizon }, _) => {
            vec![horizon as f64, environment.regret(total_reward)]
        }
        (Goal::FixedBudgetBai { budget }, Answer::BestArm(arm)) => {
            vec![budget as f64, environment.best_arm_regret(*arm)?]
        }
        (Goal::FixedConfidenceBai { confidence }, Answer::BestArm(arm)) => vec![
            confidence,
            environment.tot_samples() as f64,
            environment.best_arm_regret(*arm)?,
        ],
        (Goal::AllCorrect { budget, threshold }, Answer::Thresholds(flags)) => vec![
            budget as f64,
            environment.all_correct_regret(flags, threshold)?,
        ],
        (goal, answer) => {
            return Err(HarnessError::invalid_action(format!(
                "{}: answer {answer:?} does not fit goal {}",
                learner.name(),
                goal.label()
            )));
        }
    };

    if trace_steps {
        debug!(learner = learner.name(), steps = step, ?values, "trial done");
    }
    Ok(TrialResult::single(learner.name(), values))
}

/// Play every value of a sweep in one trial, in order, against the same
/// environment. Returns one record per value.
pub fn run_sweep(
    environment: &mut dyn Environment,
    variants: &mut [Box<dyn Learner>],
    seed: u64,
    trace_steps: bool,
) -> Result<Vec<TrialResult>> {
    let mut records = Vec::with_capacity(variants.len());
    for (index, learner) in variants.iter_mut().enumerate() {
        records.push(run_trial(
            environment,
            learner.as_mut(),
            sweep_seed(seed, index),
            trace_steps,
        )?);
    }
    Ok(records)
}
