// src/learner/successive_rejects.rs
//
// Successive Rejects for fixed-budget best-arm identification
// (Audibert & Bubeck, 2010).
//
// With K arms and budget n, define bar_log(K) = 1/2 + Σ_{i=2..K} 1/i and
// n_k = ceil((n - K) / bar_log(K) / (K + 1 - k)) for k = 1..K-1, n_0 = 0.
// Round k pulls every active arm n_k - n_{k-1} times and then rejects the
// active arm with the lowest empirical mean. The last round (two arms left)
// splits the whole remaining budget between them instead, so the budget is
// used up exactly.

use std::collections::BTreeSet;

use tracing::debug;

use super::{Answer, Goal, Learner, LearnerState, Lifecycle, Turn};
use crate::environment::EnvironmentKind;
use crate::error::{HarnessError, Result};
use crate::estimator::EmpiricalArm;
use crate::types::{Action, ActionList, Batch, Context};

/// `1/2 + Σ_{i=2..K} 1/i`.
pub fn bar_log(arm_num: usize) -> f64 {
    0.5 + (2..=arm_num).map(|i| 1.0 / i as f64).sum::<f64>()
}

#[derive(Debug, Clone)]
pub struct SuccessiveRejects {
    name: String,
    arm_num: usize,
    budget: u64,
    bar_log_k: f64,

    lifecycle: Lifecycle,
    arms: Vec<EmpiricalArm>,
    /// Per-arm allocation of round k at index k (index 0 unused).
    pulls_per_round: Vec<u64>,
    active_arms: BTreeSet<usize>,
    budget_left: u64,
    best_arm: Option<usize>,
    /// Current round, 1-based.
    round: usize,
}

impl SuccessiveRejects {
    pub const DEFAULT_NAME: &'static str = "successive_rejects";

    pub fn new(arm_num: usize, budget: u64) -> Result<Self> {
        if arm_num < 2 {
            return Err(HarnessError::config(format!(
                "successive rejects needs at least two arms, got {arm_num}"
            )));
        }
        let bar_log_k = bar_log(arm_num);
        let spare = budget as f64 - arm_num as f64;
        if spare < arm_num as f64 * bar_log_k {
            return Err(HarnessError::config(format!(
                "budget {budget} is too small for {arm_num} arms (needs budget - K >= {:.3})",
                arm_num as f64 * bar_log_k
            )));
        }

        Ok(Self {
            name: Self::DEFAULT_NAME.to_string(),
            arm_num,
            budget,
            bar_log_k,
            lifecycle: Lifecycle::default(),
            arms: vec![EmpiricalArm::new(); arm_num],
            pulls_per_round: Vec::new(),
            active_arms: BTreeSet::new(),
            budget_left: budget,
            best_arm: None,
            round: 1,
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn arm_num(&self) -> usize {
        self.arm_num
    }

    pub fn budget(&self) -> u64 {
        self.budget
    }

    pub fn bar_log_k(&self) -> f64 {
        self.bar_log_k
    }

    pub fn active_arms(&self) -> &BTreeSet<usize> {
        &self.active_arms
    }

    pub fn pulls_per_round(&self) -> &[u64] {
        &self.pulls_per_round
    }

    pub fn budget_left(&self) -> u64 {
        self.budget_left
    }

    pub fn round(&self) -> usize {
        self.round
    }

    /// Identified best arm; `NotReady` until the learner terminates.
    pub fn best_arm(&self) -> Result<usize> {
        self.lifecycle.require_terminated(&self.name)?;
        self.best_arm
            .ok_or_else(|| HarnessError::NotReady(format!("{}: no arm survived", self.name)))
    }

    fn schedule(&self) -> Vec<u64> {
        let k_arms = self.arm_num as f64;
        let spare = (self.budget - self.arm_num as u64) as f64;
        let mut pulls = vec![0];
        let mut prev = 0u64;
        for k in 1..self.arm_num {
            let nk = (spare / self.bar_log_k / (k_arms + 1.0 - k as f64)).ceil() as u64;
            pulls.push(nk.saturating_sub(prev));
            prev = nk;
        }
        pulls
    }

    /// Reject the active arm with the smallest empirical mean (first in
    /// ascending order on ties) and advance the round.
    fn eliminate(&mut self) {
        let mut worst: Option<(usize, f64)> = None;
        for &arm in &self.active_arms {
            let mean = self.arms[arm].em_mean();
            match worst {
                Some((_, m)) if mean >= m => {}
                _ => worst = Some((arm, mean)),
            }
        }
        if let Some((arm, mean)) = worst {
            self.active_arms.remove(&arm);
            debug!(
                learner = %self.name,
                round = self.round,
                arm,
                em_mean = mean,
                "reject arm"
            );
        }
        if self.round == self.arm_num - 1 {
            self.best_arm = self.active_arms.iter().next().copied();
        }
        self.round += 1;
    }

    fn decide(&mut self) -> Option<ActionList> {
        loop {
            if self.round >= self.arm_num {
                return None;
            }
            let actions: ActionList = if self.round < self.arm_num - 1 {
                let pulls = self.pulls_per_round[self.round];
                if pulls == 0 {
                    Vec::new()
                } else {
                    self.active_arms
                        .iter()
                        .map(|&arm| Action::pull(arm, pulls))
                        .collect()
                }
            } else {
                let first = self.budget_left / 2;
                let split = [first, self.budget_left - first];
                self.active_arms
                    .iter()
                    .zip(split)
                    .filter(|(_, pulls)| *pulls > 0)
                    .map(|(&arm, pulls)| Action::pull(arm, pulls))
                    .collect()
            };
            if actions.is_empty() {
                // Nothing to sample this round; reject on current estimates.
                self.eliminate();
                continue;
            }
            return Some(actions);
        }
    }
}

impl Learner for SuccessiveRejects {
    fn name(&self) -> &str {
        &self.name
    }

    fn running_environment(&self) -> EnvironmentKind {
        EnvironmentKind::OrdinaryBandit
    }

    fn goal(&self) -> Goal {
        Goal::FixedBudgetBai {
            budget: self.budget,
        }
    }

    fn state(&self) -> LearnerState {
        self.lifecycle.state()
    }

    fn reset(&mut self, _seed: Option<u64>) {
        self.lifecycle.reset();
        self.arms = vec![EmpiricalArm::new(); self.arm_num];
        self.pulls_per_round = self.schedule();
        self.active_arms = (0..self.arm_num).collect();
        self.budget_left = self.budget;
        self.best_arm = None;
        self.round = 1;
    }

    fn actions(&mut self, _context: &Context<'_>) -> Result<Option<ActionList>> {
        match self.lifecycle.begin_turn(&self.name)? {
            Turn::Replay(actions) => return Ok(Some(actions)),
            Turn::Done => return Ok(None),
            Turn::Decide => {}
        }
        let actions = self.decide();
        Ok(self.lifecycle.commit(actions))
    }

    fn update(&mut self, feedback: &[Batch]) -> Result<()> {
        let actions = self.lifecycle.take_pending(&self.name, feedback)?;
        for (action, batch) in actions.iter().zip(feedback) {
            if let Some(arm) = action.arm() {
                self.arms[arm].update(&batch.rewards);
                self.budget_left = self.budget_left.saturating_sub(batch.len() as u64);
            }
        }
        self.eliminate();
        Ok(())
    }

    fn answer(&self) -> Result<Answer> {
        self.best_arm().map(Answer::BestArm)
    }

    fn box_clone(&self) -> Box<dyn Learner> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::{Environment, OrdinaryBandit};

    fn drive(learner: &mut SuccessiveRejects, env: &mut OrdinaryBandit) -> u64 {
        let mut pulled = 0;
        while let Some(actions) = learner.actions(&Context::Empty).unwrap() {
            pulled += actions.iter().map(|a| a.count).sum::<u64>();
            let fb = env.step(&actions).unwrap();
            learner.update(&fb).unwrap();
        }
        pulled
    }

    #[test]
    fn bar_log_of_four_arms() {
        let sr = SuccessiveRejects::new(4, 100).unwrap();
        assert!((sr.bar_log_k() - (0.5 + 0.5 + 1.0 / 3.0 + 0.25)).abs() < 1e-12);
    }

    #[test]
    fn infeasible_budget_rejected() {
        // bar_log(4) ≈ 1.5833 → needs budget - 4 >= 6.33
        assert!(SuccessiveRejects::new(4, 10).is_err());
        assert!(SuccessiveRejects::new(4, 11).is_ok());
        assert!(SuccessiveRejects::new(1, 100).is_err());
    }

    #[test]
    fn uses_whole_budget_and_keeps_one_arm() {
        let mut env = OrdinaryBandit::bernoulli(&[0.1, 0.2, 0.3, 0.9]).unwrap();
        env.reset(Some(17));
        let mut sr = SuccessiveRejects::new(4, 100).unwrap();
        sr.reset(Some(17));

        let pulled = drive(&mut sr, &mut env);

        assert_eq!(pulled, 100);
        assert_eq!(env.tot_samples(), 100);
        assert_eq!(sr.active_arms().len(), 1);
        assert_eq!(sr.state(), LearnerState::Terminated);
        let best = sr.best_arm().unwrap();
        assert!(sr.active_arms().contains(&best));
    }

    #[test]
    fn best_arm_not_ready_before_termination() {
        let mut sr = SuccessiveRejects::new(3, 50).unwrap();
        assert!(matches!(sr.best_arm(), Err(HarnessError::NotReady(_))));
        sr.reset(None);
        assert!(matches!(sr.answer(), Err(HarnessError::NotReady(_))));
    }

    #[test]
    fn actions_before_reset_is_not_ready() {
        let mut sr = SuccessiveRejects::new(3, 50).unwrap();
        assert!(matches!(
            sr.actions(&Context::Empty),
            Err(HarnessError::NotReady(_))
        ));
    }

    #[test]
    fn two_arms_split_budget_with_remainder_to_second() {
        let mut sr = SuccessiveRejects::new(2, 9).unwrap();
        sr.reset(None);
        let actions = sr.actions(&Context::Empty).unwrap().unwrap();
        assert_eq!(actions, vec![Action::pull(0, 4), Action::pull(1, 5)]);
    }

    #[test]
    fn easy_instance_is_identified() {
        let mut env = OrdinaryBandit::bernoulli(&[0.0, 0.0, 1.0]).unwrap();
        env.reset(Some(5));
        let mut sr = SuccessiveRejects::new(3, 30).unwrap();
        sr.reset(None);
        drive(&mut sr, &mut env);
        assert_eq!(sr.answer().unwrap(), Answer::BestArm(2));
        assert_eq!(env.best_arm_regret(2).unwrap(), 0.0);
    }

    #[test]
    fn reset_restores_fresh_state() {
        let mut env = OrdinaryBandit::bernoulli(&[0.2, 0.4, 0.6]).unwrap();
        env.reset(Some(1));
        let mut sr = SuccessiveRejects::new(3, 40).unwrap();
        sr.reset(None);
        drive(&mut sr, &mut env);

        sr.reset(None);
        assert_eq!(sr.state(), LearnerState::Ready);
        assert_eq!(sr.active_arms().len(), 3);
        assert_eq!(sr.budget_left(), 40);
        assert_eq!(sr.round(), 1);
    }
}
