// src/environment/ordinary.rs
//
// Ordinary K-armed stochastic bandit.
//
// Arms are indexed from 0. The best arm is the first arm with maximal mean,
// fixed at construction. Each pull of `count` samples adds
// `best_mean * count` to the best-case reward used by `regret`.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::trace;

use super::arms::Arm;
use super::{first_max_index, Environment, EnvironmentKind};
use crate::error::{HarnessError, Result};
use crate::types::{Action, Batch, Choice, Feedback};

#[derive(Debug, Clone)]
pub struct OrdinaryBandit {
    name: String,
    arms: Vec<Arm>,
    /// Index of the first maximal-mean arm.
    best_arm: usize,
    /// Generator for reward sampling (reseeded on reset).
    rng: ChaCha8Rng,
    /// Seed of the current run.
    seed: u64,
    /// Samples consumed since reset.
    tot_samples: u64,
    /// Reward the best arm would have collected over the same samples.
    max_rewards: f64,
}

impl OrdinaryBandit {
    pub fn new(arms: Vec<Arm>) -> Result<Self> {
        if arms.len() < 2 {
            return Err(HarnessError::config(
                "the number of arms should be at least two",
            ));
        }
        for arm in &arms {
            arm.validate()?;
        }
        let best_arm = first_max_index(arms.iter().map(Arm::mean)).unwrap_or(0);

        Ok(Self {
            name: "ordinary_bandit".to_string(),
            arms,
            best_arm,
            rng: ChaCha8Rng::seed_from_u64(0),
            seed: 0,
            tot_samples: 0,
            max_rewards: 0.0,
        })
    }

    /// Bernoulli arms with the given means.
    pub fn bernoulli(means: &[f64]) -> Result<Self> {
        let arms = means
            .iter()
            .map(|&m| Arm::bernoulli(m))
            .collect::<Result<Vec<_>>>()?;
        Self::new(arms)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn arm_num(&self) -> usize {
        self.arms.len()
    }

    pub fn arms(&self) -> &[Arm] {
        &self.arms
    }

    pub fn means(&self) -> Vec<f64> {
        self.arms.iter().map(Arm::mean).collect()
    }

    pub fn best_arm(&self) -> usize {
        self.best_arm
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    fn validate_actions(&self, actions: &[Action]) -> Result<()> {
        if actions.is_empty() {
            return Err(HarnessError::invalid_action("empty action list"));
        }
        for action in actions {
            match action.choice {
                Choice::Arm(arm) if arm < self.arms.len() => {}
                Choice::Arm(arm) => {
                    return Err(HarnessError::invalid_action(format!(
                        "wrong arm index {arm} for {} arms",
                        self.arms.len()
                    )));
                }
                Choice::Assortment(_) => {
                    return Err(HarnessError::invalid_action(format!(
                        "{} expects arm indices, not assortments",
                        self.name
                    )));
                }
            }
            if action.count == 0 {
                return Err(HarnessError::invalid_action("action with zero pulls"));
            }
        }
        Ok(())
    }
}

impl Environment for OrdinaryBandit {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> EnvironmentKind {
        EnvironmentKind::OrdinaryBandit
    }

    fn reset(&mut self, seed: Option<u64>) {
        let seed = seed.unwrap_or_else(|| self.rng.gen());
        self.seed = seed;
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        self.tot_samples = 0;
        self.max_rewards = 0.0;
    }

    fn step(&mut self, actions: &[Action]) -> Result<Feedback> {
        // Validate everything first so a bad list consumes nothing.
        self.validate_actions(actions)?;

        let best_mean = self.arms[self.best_arm].mean();
        let mut feedback = Vec::with_capacity(actions.len());
        for action in actions {
            let Choice::Arm(arm) = action.choice else {
                continue;
            };
            let rewards = self.arms[arm].pull(&mut self.rng, action.count as usize);
            self.tot_samples += action.count;
            self.max_rewards += best_mean * action.count as f64;
            feedback.push(Batch::from_rewards(rewards));
        }
        trace!(
            bandit = %self.name,
            actions = actions.len(),
            tot_samples = self.tot_samples,
            "step"
        );
        Ok(feedback)
    }

    fn tot_samples(&self) -> u64 {
        self.tot_samples
    }

    fn regret(&self, rewards: f64) -> f64 {
        self.max_rewards - rewards
    }

    fn best_arm_regret(&self, guess: usize) -> Result<f64> {
        Ok(if guess == self.best_arm { 0.0 } else { 1.0 })
    }

    fn all_correct_regret(&self, answers: &[u8], threshold: f64) -> Result<f64> {
        if answers.len() != self.arms.len() {
            return Err(HarnessError::invalid_action(format!(
                "expected {} threshold answers, got {}",
                self.arms.len(),
                answers.len()
            )));
        }
        let all_correct = self
            .arms
            .iter()
            .zip(answers)
            .all(|(arm, &answer)| (arm.mean() >= threshold) == (answer == 1));
        Ok(if all_correct { 0.0 } else { 1.0 })
    }

    fn box_clone(&self) -> Box<dyn Environment> {
        Box::new(self.clone())
    }
}
