// src/environment/arms.rs
//
// Reward-generating arms.

use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use crate::error::{HarnessError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Arm {
    /// Rewards in {0, 1} with success probability `mean`.
    Bernoulli { mean: f64 },
    /// Rewards `N(mean, std^2)`.
    Gaussian {
        mean: f64,
        #[serde(default = "default_std")]
        std: f64,
    },
}

fn default_std() -> f64 {
    1.0
}

impl Arm {
    pub fn bernoulli(mean: f64) -> Result<Self> {
        let arm = Arm::Bernoulli { mean };
        arm.validate()?;
        Ok(arm)
    }

    pub fn gaussian(mean: f64, std: f64) -> Result<Self> {
        let arm = Arm::Gaussian { mean, std };
        arm.validate()?;
        Ok(arm)
    }

    pub fn validate(&self) -> Result<()> {
        match *self {
            Arm::Bernoulli { mean } => {
                if !(0.0..=1.0).contains(&mean) {
                    return Err(HarnessError::config(format!(
                        "Bernoulli mean {mean} is not in [0, 1]"
                    )));
                }
            }
            Arm::Gaussian { mean, std } => {
                if !mean.is_finite() || !std.is_finite() || std < 0.0 {
                    return Err(HarnessError::config(format!(
                        "invalid Gaussian arm (mean {mean}, std {std})"
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn mean(&self) -> f64 {
        match *self {
            Arm::Bernoulli { mean } => mean,
            Arm::Gaussian { mean, .. } => mean,
        }
    }

    /// Draw `pulls` independent rewards.
    pub fn pull<R: Rng + ?Sized>(&self, rng: &mut R, pulls: usize) -> Vec<f64> {
        match *self {
            Arm::Bernoulli { mean } => (0..pulls)
                .map(|_| if rng.gen::<f64>() < mean { 1.0 } else { 0.0 })
                .collect(),
            Arm::Gaussian { mean, std } => (0..pulls)
                .map(|_| {
                    let z: f64 = rng.sample(StandardNormal);
                    mean + std * z
                })
                .collect(),
        }
    }
}
