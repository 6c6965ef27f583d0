// src/estimator.rs
//
// Running empirical estimates per decision point (arm / product).
//
// Every learner keeps one `EmpiricalArm` per arm and feeds it the reward
// batches returned by the environment. `update` is only ever called from a
// learner's `update`, never while deciding. Each observed reward is one
// pull, so `pulls()` always agrees with the samples the environment counted.

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EmpiricalArm {
    pulls: u64,
    total_rewards: f64,
    mean: f64,
    /// Sum of squared deviations from the running mean.
    sq_dev: f64,
}

impl EmpiricalArm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a batch of observed rewards into the estimate.
    pub fn update(&mut self, rewards: &[f64]) {
        for &r in rewards {
            self.pulls += 1;
            self.total_rewards += r;
            let delta = r - self.mean;
            self.mean += delta / self.pulls as f64;
            self.sq_dev += delta * (r - self.mean);
        }
    }

    pub fn pulls(&self) -> u64 {
        self.pulls
    }

    pub fn total_rewards(&self) -> f64 {
        self.total_rewards
    }

    /// Empirical mean; 0 for an arm that was never pulled.
    pub fn em_mean(&self) -> f64 {
        self.mean
    }

    /// Empirical (population) variance; 0 for an arm that was never pulled.
    pub fn em_var(&self) -> f64 {
        if self.pulls == 0 {
            0.0
        } else {
            self.sq_dev / self.pulls as f64
        }
    }
}
