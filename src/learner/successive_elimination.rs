// src/learner/successive_elimination.rs
//
// Successive Elimination for fixed-confidence best-arm identification
// (Even-Dar, Mannor & Mansour, 2006).
//
// Round r pulls every active arm once. With confidence radius
// c_r = sqrt(ln(4 K r^2 / δ) / (2 r)), every arm whose upper bound falls
// below the best lower bound is dropped. Stops when a single arm is left,
// or when the sample cap would be exceeded by another round.
//
// Tied arms are never separated, so a cap always applies. Without an
// explicit `max_samples` the cap is K times the number of rounds after which
// the radius drops below `DEFAULT_RESOLUTION`: past that point the surviving
// arms are within the resolution of each other with probability 1 - δ.

use std::collections::BTreeSet;

use tracing::debug;

use super::{Answer, Goal, Learner, LearnerState, Lifecycle, Turn};
use crate::environment::EnvironmentKind;
use crate::error::{HarnessError, Result};
use crate::estimator::EmpiricalArm;
use crate::types::{Action, ActionList, Batch, Context};

/// Mean gap below which surviving arms are treated as indistinguishable
/// when no explicit sample cap is given.
pub const DEFAULT_RESOLUTION: f64 = 0.02;

/// Radius `sqrt(ln(4 K r^2 / δ) / (2 r))` after `round` pulls per arm.
fn confidence_radius(arm_num: usize, confidence: f64, round: u64) -> f64 {
    let r = round.max(1) as f64;
    ((4.0 * arm_num as f64 * r * r / confidence).ln() / (2.0 * r)).sqrt()
}

/// Sample cap used when none is configured: K times the first round whose
/// radius is at most `DEFAULT_RESOLUTION`.
pub fn default_max_samples(arm_num: usize, confidence: f64) -> u64 {
    let within = |r: u64| confidence_radius(arm_num, confidence, r) <= DEFAULT_RESOLUTION;
    // The radius decreases for r >= 1, so double then bisect.
    let mut hi = 1u64;
    while !within(hi) {
        hi *= 2;
    }
    let mut lo = hi / 2;
    while lo + 1 < hi {
        let mid = lo + (hi - lo) / 2;
        if within(mid) {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    hi * arm_num as u64
}

#[derive(Debug, Clone)]
pub struct SuccessiveElimination {
    name: String,
    arm_num: usize,
    confidence: f64,
    max_samples: u64,

    lifecycle: Lifecycle,
    arms: Vec<EmpiricalArm>,
    active_arms: BTreeSet<usize>,
    /// Completed rounds.
    round: u64,
    samples: u64,
}

impl SuccessiveElimination {
    pub const DEFAULT_NAME: &'static str = "successive_elimination";

    /// `max_samples: None` applies `default_max_samples(arm_num, confidence)`.
    pub fn new(arm_num: usize, confidence: f64, max_samples: Option<u64>) -> Result<Self> {
        if arm_num < 2 {
            return Err(HarnessError::config(format!(
                "successive elimination needs at least two arms, got {arm_num}"
            )));
        }
        if !(confidence > 0.0 && confidence < 1.0) {
            return Err(HarnessError::config(format!(
                "confidence {confidence} is not in (0, 1)"
            )));
        }
        if let Some(cap) = max_samples {
            if cap < arm_num as u64 {
                return Err(HarnessError::config(format!(
                    "max_samples {cap} cannot cover one round of {arm_num} arms"
                )));
            }
        }
        let max_samples =
            max_samples.unwrap_or_else(|| default_max_samples(arm_num, confidence));
        Ok(Self {
            name: Self::DEFAULT_NAME.to_string(),
            arm_num,
            confidence,
            max_samples,
            lifecycle: Lifecycle::default(),
            arms: vec![EmpiricalArm::new(); arm_num],
            active_arms: BTreeSet::new(),
            round: 0,
            samples: 0,
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn active_arms(&self) -> &BTreeSet<usize> {
        &self.active_arms
    }

    pub fn samples(&self) -> u64 {
        self.samples
    }

    /// Effective sample cap (configured or default).
    pub fn max_samples(&self) -> u64 {
        self.max_samples
    }

    /// Confidence radius after `round` pulls per arm.
    pub fn radius(&self, round: u64) -> f64 {
        confidence_radius(self.arm_num, self.confidence, round)
    }

    /// Active arm with the highest empirical mean (first on ties).
    pub fn best_arm(&self) -> Result<usize> {
        self.lifecycle.require_terminated(&self.name)?;
        let mut best: Option<(usize, f64)> = None;
        for &arm in &self.active_arms {
            let mean = self.arms[arm].em_mean();
            match best {
                Some((_, m)) if mean <= m => {}
                _ => best = Some((arm, mean)),
            }
        }
        best.map(|(arm, _)| arm)
            .ok_or_else(|| HarnessError::NotReady(format!("{}: no active arm", self.name)))
    }

    fn eliminate(&mut self) {
        let radius = self.radius(self.round);
        let best_lcb = self
            .active_arms
            .iter()
            .map(|&arm| self.arms[arm].em_mean() - radius)
            .fold(f64::NEG_INFINITY, f64::max);
        let before = self.active_arms.len();
        let arms = &self.arms;
        self.active_arms
            .retain(|&arm| arms[arm].em_mean() + radius >= best_lcb);
        if self.active_arms.len() < before {
            debug!(
                learner = %self.name,
                round = self.round,
                radius,
                active = self.active_arms.len(),
                "eliminated arms"
            );
        }
    }
}

impl Learner for SuccessiveElimination {
    fn name(&self) -> &str {
        &self.name
    }

    fn running_environment(&self) -> EnvironmentKind {
        EnvironmentKind::OrdinaryBandit
    }

    fn goal(&self) -> Goal {
        Goal::FixedConfidenceBai {
            confidence: self.confidence,
        }
    }

    fn state(&self) -> LearnerState {
        self.lifecycle.state()
    }

    fn reset(&mut self, _seed: Option<u64>) {
        self.lifecycle.reset();
        self.arms = vec![EmpiricalArm::new(); self.arm_num];
        self.active_arms = (0..self.arm_num).collect();
        self.round = 0;
        self.samples = 0;
    }

    fn actions(&mut self, _context: &Context<'_>) -> Result<Option<ActionList>> {
        match self.lifecycle.begin_turn(&self.name)? {
            Turn::Replay(actions) => return Ok(Some(actions)),
            Turn::Done => return Ok(None),
            Turn::Decide => {}
        }
        let next = self.samples + self.active_arms.len() as u64;
        let actions = if self.active_arms.len() <= 1 || next > self.max_samples {
            None
        } else {
            Some(
                self.active_arms
                    .iter()
                    .map(|&arm| Action::pull(arm, 1))
                    .collect(),
            )
        };
        Ok(self.lifecycle.commit(actions))
    }

    fn update(&mut self, feedback: &[Batch]) -> Result<()> {
        let actions = self.lifecycle.take_pending(&self.name, feedback)?;
        for (action, batch) in actions.iter().zip(feedback) {
            if let Some(arm) = action.arm() {
                self.arms[arm].update(&batch.rewards);
            }
            self.samples += batch.len() as u64;
        }
        self.round += 1;
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

    fn drive(se: &mut SuccessiveElimination, env: &mut OrdinaryBandit) {
        while let Some(actions) = se.actions(&Context::Empty).unwrap() {
            let fb = env.step(&actions).unwrap();
            se.update(&fb).unwrap();
        }
    }

    #[test]
    fn separates_well_spaced_arms() {
        let mut env = OrdinaryBandit::bernoulli(&[0.1, 0.9, 0.2]).unwrap();
        env.reset(Some(13));
        let mut se = SuccessiveElimination::new(3, 0.05, None).unwrap();
        se.reset(None);
        drive(&mut se, &mut env);

        assert_eq!(se.active_arms().len(), 1);
        assert_eq!(se.answer().unwrap(), Answer::BestArm(1));
        assert_eq!(env.tot_samples(), se.samples());
    }

    #[test]
    fn sample_cap_stops_early() {
        let mut env = OrdinaryBandit::bernoulli(&[0.5, 0.5]).unwrap();
        env.reset(Some(1));
        let mut se = SuccessiveElimination::new(2, 0.1, Some(21)).unwrap();
        se.reset(None);
        drive(&mut se, &mut env);

        assert!(env.tot_samples() <= 21);
        assert!(se.best_arm().is_ok());
    }

    #[test]
    fn tied_arms_without_cap_terminate() {
        let mut env = OrdinaryBandit::bernoulli(&[1.0, 1.0]).unwrap();
        env.reset(Some(3));
        let mut se = SuccessiveElimination::new(2, 0.05, None).unwrap();
        assert_eq!(se.max_samples(), default_max_samples(2, 0.05));
        se.reset(None);
        drive(&mut se, &mut env);

        assert_eq!(se.state(), LearnerState::Terminated);
        assert_eq!(se.active_arms().len(), 2);
        assert!(env.tot_samples() <= se.max_samples());
        assert!(env.tot_samples() + 2 > se.max_samples());
        assert_eq!(se.answer().unwrap(), Answer::BestArm(0));
    }

    #[test]
    fn default_cap_reaches_the_resolution() {
        for (k, delta) in [(2, 0.05), (5, 0.1), (10, 0.01)] {
            let cap = default_max_samples(k, delta);
            let rounds = cap / k as u64;
            assert_eq!(cap % k as u64, 0);
            assert!(confidence_radius(k, delta, rounds) <= DEFAULT_RESOLUTION);
            assert!(confidence_radius(k, delta, rounds - 1) > DEFAULT_RESOLUTION);
        }
        assert!(default_max_samples(2, 0.01) > default_max_samples(2, 0.1));
    }

    #[test]
    fn radius_shrinks_with_rounds() {
        let se = SuccessiveElimination::new(4, 0.1, None).unwrap();
        assert!(se.radius(10) < se.radius(1));
        assert!(se.radius(1000) < se.radius(10));
    }

    #[test]
    fn invalid_confidence_rejected() {
        assert!(SuccessiveElimination::new(3, 0.0, None).is_err());
        assert!(SuccessiveElimination::new(3, 1.0, None).is_err());
        assert!(SuccessiveElimination::new(3, 0.1, Some(2)).is_err());
    }
}
