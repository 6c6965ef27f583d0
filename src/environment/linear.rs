// src/environment/linear.rs
//
// Linear bandit: arm `i` has mean `<features[i], theta>` and Gaussian noise
// with variance `var`. Sampling and regret bookkeeping are those of an
// ordinary bandit over the derived Gaussian arms; the feature vectors are
// exposed as context.

use tracing::warn;

use super::arms::Arm;
use super::ordinary::OrdinaryBandit;
use super::{Environment, EnvironmentKind};
use crate::error::{HarnessError, Result};
use crate::types::{Action, Context, Feedback};

/// None of the built-in learners run on a linear bandit; every one of them
/// is rejected against it when the protocol is built. The environment is
/// here for experiments with custom `Learner` implementations that declare
/// `EnvironmentKind::LinearBandit`.
#[derive(Debug, Clone)]
pub struct LinearBandit {
    inner: OrdinaryBandit,
    features: Vec<Vec<f64>>,
    theta: Vec<f64>,
    var: f64,
}

impl LinearBandit {
    /// `var` defaults to 1 when not given.
    pub fn new(features: Vec<Vec<f64>>, theta: Vec<f64>, var: Option<f64>) -> Result<Self> {
        if features.len() < 2 {
            return Err(HarnessError::config(
                "the number of arms should be at least two",
            ));
        }
        if features.iter().any(|f| f.len() != theta.len()) {
            return Err(HarnessError::config(
                "the feature and theta dimensions are unequal",
            ));
        }
        let var = match var {
            Some(v) if v.is_finite() && v >= 0.0 => v,
            Some(v) => {
                return Err(HarnessError::config(format!("invalid noise variance {v}")));
            }
            None => {
                warn!("linear_bandit: variance of noise is assumed to be 1");
                1.0
            }
        };

        let arms = features
            .iter()
            .map(|f| Arm::gaussian(dot(f, &theta), var.sqrt()))
            .collect::<Result<Vec<_>>>()?;
        let inner = OrdinaryBandit::new(arms)?.with_name("linear_bandit");

        Ok(Self {
            inner,
            features,
            theta,
            var,
        })
    }

    pub fn arm_num(&self) -> usize {
        self.features.len()
    }

    pub fn features(&self) -> &[Vec<f64>] {
        &self.features
    }

    pub fn theta(&self) -> &[f64] {
        &self.theta
    }

    pub fn var(&self) -> f64 {
        self.var
    }

    pub fn best_arm(&self) -> usize {
        self.inner.best_arm()
    }

    pub fn means(&self) -> Vec<f64> {
        self.inner.means()
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

impl Environment for LinearBandit {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn kind(&self) -> EnvironmentKind {
        EnvironmentKind::LinearBandit
    }

    fn reset(&mut self, seed: Option<u64>) {
        self.inner.reset(seed);
    }

    fn context(&self) -> Context<'_> {
        Context::Features(&self.features)
    }

    fn step(&mut self, actions: &[Action]) -> Result<Feedback> {
        self.inner.step(actions)
    }

    fn tot_samples(&self) -> u64 {
        self.inner.tot_samples()
    }

    fn regret(&self, rewards: f64) -> f64 {
        self.inner.regret(rewards)
    }

    fn best_arm_regret(&self, guess: usize) -> Result<f64> {
        self.inner.best_arm_regret(guess)
    }

    fn box_clone(&self) -> Box<dyn Environment> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn means_are_dot_products() {
        let b = LinearBandit::new(
            vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.5, 0.5]],
            vec![0.2, 0.8],
            Some(0.0),
        )
        .unwrap();
        let means = b.means();
        assert!((means[0] - 0.2).abs() < 1e-12);
        assert!((means[1] - 0.8).abs() < 1e-12);
        assert!((means[2] - 0.5).abs() < 1e-12);
        assert_eq!(b.best_arm(), 1);
        assert_eq!(b.kind(), EnvironmentKind::LinearBandit);
    }

    #[test]
    fn context_exposes_features() {
        let b = LinearBandit::new(vec![vec![1.0], vec![2.0]], vec![1.0], None).unwrap();
        assert_eq!(b.var(), 1.0);
        match b.context() {
            Context::Features(f) => assert_eq!(f.len(), 2),
            Context::Empty => panic!("expected features"),
        }
    }

    #[test]
    fn dimension_mismatch_is_configuration_error() {
        assert!(matches!(
            LinearBandit::new(vec![vec![1.0, 2.0], vec![1.0]], vec![1.0, 1.0], None),
            Err(HarnessError::Configuration(_))
        ));
        assert!(LinearBandit::new(vec![vec![1.0]], vec![1.0], None).is_err());
        assert!(LinearBandit::new(vec![vec![1.0], vec![0.0]], vec![1.0], Some(-1.0)).is_err());
    }

    #[test]
    fn zero_noise_pulls_return_means() {
        let mut b =
            LinearBandit::new(vec![vec![1.0], vec![3.0]], vec![0.5], Some(0.0)).unwrap();
        b.reset(Some(1));
        let fb = b.step(&[Action::pull(1, 3)]).unwrap();
        assert!(fb[0].rewards.iter().all(|&r| (r - 1.5).abs() < 1e-12));
        assert_eq!(b.tot_samples(), 3);
        assert!(b.regret(4.5).abs() < 1e-12);
    }
}
