// src/types.rs
//
// Shared types for the learner <-> environment turn contract.
//
// An action list is an ordered list of (choice, count) pairs. The feedback
// returned by `Environment::step` is positionally aligned with it: batch `i`
// holds exactly `actions[i].count` observations.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A set of products offered together. Products are numbered from 1;
/// product 0 is reserved for "no purchase".
pub type Assortment = BTreeSet<usize>;

/// Product id observed when the customer leaves without buying.
pub const NO_PURCHASE: usize = 0;

/// What a learner asks the environment to sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Choice {
    /// Pull an arm of an ordinary (or linear) bandit.
    Arm(usize),
    /// Serve an assortment to an MNL bandit.
    Assortment(Assortment),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub choice: Choice,
    /// Number of repeated samples of `choice`.
    pub count: u64,
}

impl Action {
    pub fn pull(arm: usize, count: u64) -> Self {
        Self {
            choice: Choice::Arm(arm),
            count,
        }
    }

    pub fn serve(assortment: Assortment, count: u64) -> Self {
        Self {
            choice: Choice::Assortment(assortment),
            count,
        }
    }

    /// Arm index if this is an arm pull.
    pub fn arm(&self) -> Option<usize> {
        match self.choice {
            Choice::Arm(arm) => Some(arm),
            Choice::Assortment(_) => None,
        }
    }

    /// Assortment if this is an assortment serve.
    pub fn assortment(&self) -> Option<&Assortment> {
        match &self.choice {
            Choice::Arm(_) => None,
            Choice::Assortment(a) => Some(a),
        }
    }
}

pub type ActionList = Vec<Action>;

/// Observations produced by one action.
///
/// `rewards` always has one entry per sample. `choices` is only filled by
/// environments with a choice model (MNL), one product id per sample.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    pub rewards: Vec<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<usize>,
}

impl Batch {
    pub fn from_rewards(rewards: Vec<f64>) -> Self {
        Self {
            rewards,
            choices: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }

    pub fn total_reward(&self) -> f64 {
        self.rewards.iter().sum()
    }

    /// True if any customer in this batch left without purchasing.
    pub fn has_no_purchase(&self) -> bool {
        self.choices.contains(&NO_PURCHASE)
    }
}

pub type Feedback = Vec<Batch>;

/// Side information an environment exposes before each decision.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum Context<'a> {
    #[default]
    Empty,
    /// Per-arm feature vectors (linear bandits).
    Features(&'a [Vec<f64>]),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_accessors() {
        let pull = Action::pull(3, 2);
        assert_eq!(pull.arm(), Some(3));
        assert!(pull.assortment().is_none());

        let serve = Action::serve([1, 2].into_iter().collect(), 1);
        assert_eq!(serve.arm(), None);
        assert_eq!(serve.assortment().map(|a| a.len()), Some(2));
    }

    #[test]
    fn batch_no_purchase_detection() {
        let batch = Batch {
            rewards: vec![1.0, 0.0],
            choices: vec![2, NO_PURCHASE],
        };
        assert!(batch.has_no_purchase());
        assert_eq!(batch.total_reward(), 1.0);

        let plain = Batch::from_rewards(vec![0.5, 0.5]);
        assert!(!plain.has_no_purchase());
        assert_eq!(plain.len(), 2);
    }
}
