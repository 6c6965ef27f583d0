// src/learner/uniform.rs
//
// Uniform sampling for the thresholding bandit: pull arm (t - 1) mod K at
// step t, one sample per step, for `budget` steps. The answer flags every
// arm whose empirical mean reaches the threshold.

use tracing::debug;

use super::{Answer, Goal, Learner, LearnerState, Lifecycle, Turn};
use crate::environment::EnvironmentKind;
use crate::error::{HarnessError, Result};
use crate::estimator::EmpiricalArm;
use crate::types::{Action, ActionList, Batch, Context};

#[derive(Debug, Clone)]
pub struct Uniform {
    name: String,
    arm_num: usize,
    budget: u64,
    threshold: f64,
    /// Radius of the indifference zone around the threshold.
    eps: f64,

    lifecycle: Lifecycle,
    arms: Vec<EmpiricalArm>,
    /// Current time step, 1-based.
    time: u64,
}

impl Uniform {
    pub const DEFAULT_NAME: &'static str = "uniform_sampling";

    pub fn new(arm_num: usize, budget: u64, threshold: f64, eps: f64) -> Result<Self> {
        if arm_num < 2 {
            return Err(HarnessError::config(format!(
                "uniform sampling needs at least two arms, got {arm_num}"
            )));
        }
        if budget == 0 {
            return Err(HarnessError::config("budget should be positive"));
        }
        if !threshold.is_finite() || !eps.is_finite() || eps < 0.0 {
            return Err(HarnessError::config(format!(
                "invalid threshold {threshold} or eps {eps}"
            )));
        }
        Ok(Self {
            name: Self::DEFAULT_NAME.to_string(),
            arm_num,
            budget,
            threshold,
            eps,
            lifecycle: Lifecycle::default(),
            arms: vec![EmpiricalArm::new(); arm_num],
            time: 1,
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn arm_num(&self) -> usize {
        self.arm_num
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn eps(&self) -> f64 {
        self.eps
    }

    pub fn time(&self) -> u64 {
        self.time
    }

    /// Pull counts so far, per arm.
    pub fn pulls(&self) -> Vec<u64> {
        self.arms.iter().map(EmpiricalArm::pulls).collect()
    }
}

impl Learner for Uniform {
    fn name(&self) -> &str {
        &self.name
    }

    fn running_environment(&self) -> EnvironmentKind {
        EnvironmentKind::OrdinaryBandit
    }

    fn goal(&self) -> Goal {
        Goal::AllCorrect {
            budget: self.budget,
            threshold: self.threshold,
        }
    }

    fn state(&self) -> LearnerState {
        self.lifecycle.state()
    }

    fn reset(&mut self, _seed: Option<u64>) {
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
        let actions = if self.time > self.budget {
            None
        } else {
            let arm = ((self.time - 1) % self.arm_num as u64) as usize;
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
        }
        self.time += 1;
        Ok(())
    }

    fn answer(&self) -> Result<Answer> {
        self.lifecycle.require_terminated(&self.name)?;
        let flags: Vec<u8> = self
            .arms
            .iter()
            .map(|arm| u8::from(arm.em_mean() >= self.threshold))
            .collect();
        debug!(learner = %self.name, ?flags, "thresholds");
        Ok(Answer::Thresholds(flags))
    }

    fn box_clone(&self) -> Box<dyn Learner> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::{Environment, OrdinaryBandit};

    #[test]
    fn round_robin_order() {
        let mut u = Uniform::new(3, 7, 0.5, 0.1).unwrap();
        u.reset(None);
        for t in 1..=7u64 {
            let actions = u.actions(&Context::Empty).unwrap().unwrap();
            assert_eq!(actions, vec![Action::pull(((t - 1) % 3) as usize, 1)]);
            u.update(&[Batch::from_rewards(vec![1.0])]).unwrap();
        }
        assert!(u.actions(&Context::Empty).unwrap().is_none());
        assert_eq!(u.pulls(), vec![3, 2, 2]);
    }

    #[test]
    fn unpulled_arms_answer_zero() {
        let mut u = Uniform::new(4, 2, 0.0, 0.0).unwrap();
        u.reset(None);
        while u.actions(&Context::Empty).unwrap().is_some() {
            u.update(&[Batch::from_rewards(vec![1.0])]).unwrap();
        }
        // mean 0 >= threshold 0 for unpulled arms too
        assert_eq!(u.answer().unwrap(), Answer::Thresholds(vec![1, 1, 1, 1]));
    }

    #[test]
    fn thresholds_on_deterministic_arms() {
        let mut env = OrdinaryBandit::bernoulli(&[0.0, 1.0, 0.0, 1.0]).unwrap();
        env.reset(Some(2));
        let mut u = Uniform::new(4, 8, 0.5, 0.1).unwrap();
        u.reset(None);
        while let Some(actions) = u.actions(&Context::Empty).unwrap() {
            let fb = env.step(&actions).unwrap();
            u.update(&fb).unwrap();
        }
        let Answer::Thresholds(flags) = u.answer().unwrap() else {
            panic!("expected thresholds");
        };
        assert_eq!(flags, vec![0, 1, 0, 1]);
        assert_eq!(env.all_correct_regret(&flags, 0.5).unwrap(), 0.0);
    }

    #[test]
    fn answer_requires_termination() {
        let mut u = Uniform::new(2, 4, 0.5, 0.1).unwrap();
        u.reset(None);
        assert!(matches!(u.answer(), Err(HarnessError::NotReady(_))));
    }
}
