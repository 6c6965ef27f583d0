// src/learner/mod.rs
//
// Learner trait and the shared turn bookkeeping.
//
// A learner interacts with an environment only through the action/feedback
// contract:
//
//   reset(seed) -> { actions(context) -> step -> update(feedback) }* -> None
//
// `actions` returning `None` is the termination signal; afterwards the
// learner's `answer` is available. Every learner declares the single
// environment kind it can run in and a goal fixed at construction.
//
// Implementations:
// - SuccessiveRejects: fixed-budget best-arm identification
// - Uniform: round-robin thresholding
// - EpsGreedy: episodic assortment selection for MNL bandits
// - ThompsonSampling: regret minimization with Beta/Gaussian priors
// - SuccessiveElimination: fixed-confidence best-arm identification

pub mod eps_greedy;
pub mod successive_elimination;
pub mod successive_rejects;
pub mod thompson;
pub mod uniform;

use serde::Serialize;

use crate::environment::EnvironmentKind;
use crate::error::{HarnessError, Result};
use crate::types::{ActionList, Batch, Context};

pub use eps_greedy::EpsGreedy;
pub use successive_elimination::SuccessiveElimination;
pub use successive_rejects::SuccessiveRejects;
pub use thompson::{Prior, ThompsonSampling};
pub use uniform::Uniform;

/// What a learner is evaluated on, with the protocol parameter it is
/// evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Goal {
    RegretMinimization { horizon: u64 },
    FixedBudgetBai { budget: u64 },
    FixedConfidenceBai { confidence: f64 },
    AllCorrect { budget: u64, threshold: f64 },
}

impl Goal {
    /// First field of every trial record for this goal.
    pub fn parameter(&self) -> f64 {
        match *self {
            Goal::RegretMinimization { horizon } => horizon as f64,
            Goal::FixedBudgetBai { budget } => budget as f64,
            Goal::FixedConfidenceBai { confidence } => confidence,
            Goal::AllCorrect { budget, .. } => budget as f64,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Goal::RegretMinimization { .. } => "regret_minimization",
            Goal::FixedBudgetBai { .. } => "fixed_budget_bai",
            Goal::FixedConfidenceBai { .. } => "fixed_confidence_bai",
            Goal::AllCorrect { .. } => "all_correct",
        }
    }

    /// Sample budget the learner must never exceed, if the goal has one.
    pub fn budget(&self) -> Option<u64> {
        match *self {
            Goal::FixedBudgetBai { budget } | Goal::AllCorrect { budget, .. } => Some(budget),
            _ => None,
        }
    }
}

/// Outcome of a terminated learner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Answer {
    /// Regret minimizers answer nothing; their outcome is the regret.
    None,
    BestArm(usize),
    /// One flag per arm: 1 if the arm is judged above the threshold.
    Thresholds(Vec<u8>),
}

impl Answer {
    pub fn best_arm(&self) -> Option<usize> {
        match *self {
            Answer::BestArm(arm) => Some(arm),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LearnerState {
    #[default]
    Uninitialized,
    Ready,
    Running,
    Terminated,
}

/// Learner contract.
///
/// `reset` must leave the learner indistinguishable from a freshly
/// constructed one (apart from its generator seed). `update` is the sole
/// mutator of per-arm estimates.
pub trait Learner: Send {
    fn name(&self) -> &str;

    /// Environment kind this learner can run in.
    fn running_environment(&self) -> EnvironmentKind;

    fn goal(&self) -> Goal;

    fn state(&self) -> LearnerState;

    fn reset(&mut self, seed: Option<u64>);

    /// Next action list, or `None` once the goal's termination condition is
    /// met. Fails with `NotReady` before `reset`.
    fn actions(&mut self, context: &Context<'_>) -> Result<Option<ActionList>>;

    /// Feed back the observations for the last action list.
    fn update(&mut self, feedback: &[Batch]) -> Result<()>;

    /// Goal outcome; `NotReady` until terminated.
    fn answer(&self) -> Result<Answer>;

    fn box_clone(&self) -> Box<dyn Learner>;
}

impl Clone for Box<dyn Learner> {
    fn clone(&self) -> Self {
        self.box_clone()
    }
}

/// Result of starting a turn.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Turn {
    /// The last action list has not been answered yet; hand it out again.
    Replay(ActionList),
    /// Already terminated.
    Done,
    /// The learner must decide.
    Decide,
}

/// State machine shared by every learner: readiness, termination and the
/// action list awaiting feedback.
#[derive(Debug, Clone, Default)]
pub(crate) struct Lifecycle {
    state: LearnerState,
    pending: Option<ActionList>,
}

impl Lifecycle {
    pub(crate) fn state(&self) -> LearnerState {
        self.state
    }

    pub(crate) fn reset(&mut self) {
        self.state = LearnerState::Ready;
        self.pending = None;
    }

    pub(crate) fn begin_turn(&self, name: &str) -> Result<Turn> {
        match self.state {
            LearnerState::Uninitialized => Err(HarnessError::NotReady(format!(
                "{name}: reset() must be called before actions()"
            ))),
            LearnerState::Terminated => Ok(Turn::Done),
            LearnerState::Ready | LearnerState::Running => Ok(match &self.pending {
                Some(actions) => Turn::Replay(actions.clone()),
                None => Turn::Decide,
            }),
        }
    }

    /// Record the decision of this turn. `None` terminates.
    pub(crate) fn commit(&mut self, actions: Option<ActionList>) -> Option<ActionList> {
        match actions {
            Some(actions) => {
                self.state = LearnerState::Running;
                self.pending = Some(actions.clone());
                Some(actions)
            }
            None => {
                self.state = LearnerState::Terminated;
                self.pending = None;
                None
            }
        }
    }

    /// Take the action list the feedback answers, checking that the
    /// feedback lines up with it.
    pub(crate) fn take_pending(&mut self, name: &str, feedback: &[Batch]) -> Result<ActionList> {
        if self.state == LearnerState::Uninitialized {
            return Err(HarnessError::NotReady(format!(
                "{name}: reset() must be called before update()"
            )));
        }
        let actions = self.pending.take().ok_or_else(|| {
            HarnessError::invalid_action(format!("{name}: update() without a pending action"))
        })?;
        if feedback.len() != actions.len() {
            return Err(HarnessError::invalid_action(format!(
                "{name}: {} feedback batches for {} actions",
                feedback.len(),
                actions.len()
            )));
        }
        for (i, (action, batch)) in actions.iter().zip(feedback).enumerate() {
            if batch.len() as u64 != action.count {
                return Err(HarnessError::invalid_action(format!(
                    "{name}: batch {i} holds {} observations, expected {}",
                    batch.len(),
                    action.count
                )));
            }
        }
        Ok(actions)
    }

    pub(crate) fn require_terminated(&self, name: &str) -> Result<()> {
        if self.state == LearnerState::Terminated {
            Ok(())
        } else {
            Err(HarnessError::NotReady(format!(
                "{name}: I don't have an answer yet"
            )))
        }
    }
}
