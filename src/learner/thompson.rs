// src/learner/thompson.rs
//
// Thompson Sampling for ordinary bandits (regret minimization).
//
// Each step draws a virtual mean per arm from its posterior and pulls the
// arm with the largest draw once.
//   Beta prior:     Beta(1 + S, 1 + n - S), for Bernoulli rewards
//   Gaussian prior: N(S / (n + 1), (1 / (n + 1))^2)
// where n is the arm's pull count and S its total reward.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Beta, Distribution, Normal};
use serde::{Deserialize, Serialize};

use super::{Answer, Goal, Learner, LearnerState, Lifecycle, Turn};
use crate::environment::{first_max_index, EnvironmentKind};
use crate::error::{HarnessError, Result};
use crate::estimator::EmpiricalArm;
use crate::types::{Action, ActionList, Batch, Context};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Prior {
    #[default]
    Beta,
    Gaussian,
}

#[derive(Debug, Clone)]
pub struct ThompsonSampling {
    name: String,
    arm_num: usize,
    horizon: u64,
    prior: Prior,

    lifecycle: Lifecycle,
    rng: ChaCha8Rng,
    arms: Vec<EmpiricalArm>,
    time: u64,
}

impl ThompsonSampling {
    pub const DEFAULT_NAME: &'static str = "thompson_sampling";

    pub fn new(arm_num: usize, horizon: u64, prior: Prior) -> Result<Self> {
        if arm_num < 2 {
            return Err(HarnessError::config(format!(
                "thompson sampling needs at least two arms, got {arm_num}"
            )));
        }
        if horizon == 0 {
            return Err(HarnessError::config("horizon should be positive"));
        }
        Ok(Self {
            name: Self::DEFAULT_NAME.to_string(),
            arm_num,
            horizon,
            prior,
            lifecycle: Lifecycle::default(),
            rng: ChaCha8Rng::seed_from_u64(0),
            arms: vec![EmpiricalArm::new(); arm_num],
            time: 1,
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn prior(&self) -> Prior {
        self.prior
    }

    pub fn pulls(&self) -> Vec<u64> {
        self.arms.iter().map(EmpiricalArm::pulls).collect()
    }

    fn sample_mean(&mut self, arm: usize) -> Result<f64> {
        let pulls = self.arms[arm].pulls() as f64;
        let rewards = self.arms[arm].total_rewards();
        let draw = match self.prior {
            Prior::Beta => {
                let a = 1.0 + rewards;
                let b = 1.0 + pulls - rewards;
                Beta::new(a, b)
                    .map_err(|e| {
                        HarnessError::invalid_action(format!(
                            "{}: Beta({a}, {b}) posterior for arm {arm}: {e}",
                            self.name
                        ))
                    })?
                    .sample(&mut self.rng)
            }
            Prior::Gaussian => {
                let mu = rewards / (pulls + 1.0);
                let sigma = 1.0 / (pulls + 1.0);
                Normal::new(mu, sigma)
                    .map_err(|e| {
                        HarnessError::invalid_action(format!(
                            "{}: Normal({mu}, {sigma}) posterior for arm {arm}: {e}",
                            self.name
                        ))
                    })?
                    .sample(&mut self.rng)
            }
        };
        Ok(draw)
    }
}

impl Learner for ThompsonSampling {
    fn name(&self) -> &str {
        &self.name
    }

    fn running_environment(&self) -> EnvironmentKind {
        EnvironmentKind::OrdinaryBandit
    }

    fn goal(&self) -> Goal {
        Goal::RegretMinimization {
            horizon: self.horizon,
        }
    }

    fn state(&self) -> LearnerState {
        self.lifecycle.state()
    }

    fn reset(&mut self, seed: Option<u64>) {
        let seed = seed.unwrap_or_else(|| self.rng.gen());
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        self.lifecycle.reset();
        self.arms = vec![EmpiricalArm::new(); self.arm_num];
        self.time = 1;
    }

    fn actions(&mut self, _context: &Context<'_>) -> Result<Option<ActionList>> {
        match self.lifecycle.begin_turn(&self.name)? {
            Turn::Replay(actions) => return Ok(Some(actions)),
            Turn::Done => return Ok(None),
            Turn::Decide => {}
        }
        let actions = if self.time > self.horizon {
            None
        } else {
            let draws = (0..self.arm_num)
                .map(|arm| self.sample_mean(arm))
                .collect::<Result<Vec<_>>>()?;
            let arm = first_max_index(draws).unwrap_or(0);
            Some(vec![Action::pull(arm, 1)])
        };
        Ok(self.lifecycle.commit(actions))
    }

    fn update(&mut self, feedback: &[Batch]) -> Result<()> {
        let actions = self.lifecycle.take_pending(&self.name, feedback)?;
        for (action, batch) in actions.iter().zip(feedback) {
            if let Some(arm) = action.arm() {
                self.arms[arm].update(&batch.rewards);
            }
            self.time += action.count;
        }
        Ok(())
    }

    fn answer(&self) -> Result<Answer> {
        self.lifecycle.require_terminated(&self.name)?;
        Ok(Answer::None)
    }

    fn box_clone(&self) -> Box<dyn Learner> {
        Box::new(self.clone())
    }
}
