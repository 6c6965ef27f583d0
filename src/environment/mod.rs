// src/environment/mod.rs
//
// Stochastic bandit environments.
//
// An environment owns immutable ground truth (arm means, linear or MNL
// parameters), its own seeded generator, and the mutable run state of the
// current trial (samples consumed, best-case reward accumulated). It is
// driven by a learner only through `step`, and evaluated by the protocol
// through the regret functions once the learner terminates.
//
// Each variant declares a fixed `EnvironmentKind`; a learner runs only in
// the kind it declares.

pub mod arms;
pub mod linear;
pub mod mnl;
pub mod ordinary;

use serde::{Deserialize, Serialize};

use crate::error::{HarnessError, Result};
use crate::types::{Action, Context, Feedback};

pub use arms::Arm;
pub use linear::LinearBandit;
pub use mnl::MnlBandit;
pub use ordinary::OrdinaryBandit;

/// Closed set of environment capabilities a learner can require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvironmentKind {
    OrdinaryBandit,
    LinearBandit,
    MnlBandit,
}

impl EnvironmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvironmentKind::OrdinaryBandit => "ordinary_bandit",
            EnvironmentKind::LinearBandit => "linear_bandit",
            EnvironmentKind::MnlBandit => "mnl_bandit",
        }
    }
}

/// Environment contract.
///
/// `tot_samples` never decreases within a trial and is 0 after `reset`.
/// No state is shared between instances; cloning yields an independent
/// simulator with the same ground truth.
pub trait Environment: Send {
    fn name(&self) -> &str;

    fn kind(&self) -> EnvironmentKind;

    /// Clear the run state and reseed the generator. Without a seed, the
    /// next seed is drawn from the current generator.
    fn reset(&mut self, seed: Option<u64>);

    fn context(&self) -> Context<'_> {
        Context::Empty
    }

    /// Execute an action list; the returned feedback is aligned with it.
    fn step(&mut self, actions: &[Action]) -> Result<Feedback>;

    /// Total number of samples consumed since the last reset.
    fn tot_samples(&self) -> u64;

    /// Best-case accumulated reward minus `rewards`.
    fn regret(&self, rewards: f64) -> f64;

    /// 1 if `guess` is not the best arm, else 0.
    fn best_arm_regret(&self, _guess: usize) -> Result<f64> {
        Err(HarnessError::UnsupportedGoal {
            environment: self.name().to_string(),
            goal: "best-arm",
        })
    }

    /// 1 if any threshold flag disagrees with ground truth, else 0.
    fn all_correct_regret(&self, _answers: &[u8], _threshold: f64) -> Result<f64> {
        Err(HarnessError::UnsupportedGoal {
            environment: self.name().to_string(),
            goal: "thresholding",
        })
    }

    fn box_clone(&self) -> Box<dyn Environment>;
}

impl Clone for Box<dyn Environment> {
    fn clone(&self) -> Self {
        self.box_clone()
    }
}

/// Index of the first maximal value.
pub(crate) fn first_max_index<I: IntoIterator<Item = f64>>(values: I) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, v) in values.into_iter().enumerate() {
        match best {
            Some((_, best_v)) if v <= best_v => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_max_breaks_ties_by_lowest_index() {
        assert_eq!(first_max_index([0.1, 0.5, 0.5, 0.2]), Some(1));
        assert_eq!(first_max_index([0.3]), Some(0));
        assert_eq!(first_max_index(Vec::<f64>::new()), None);
    }

    #[test]
    fn kind_serializes_snake_case() {
        let s = serde_json::to_string(&EnvironmentKind::MnlBandit).unwrap();
        assert_eq!(s, "\"mnl_bandit\"");
        assert_eq!(EnvironmentKind::LinearBandit.as_str(), "linear_bandit");
    }
}
