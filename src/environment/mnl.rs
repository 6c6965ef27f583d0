// src/environment/mnl.rs
//
// Multinomial-logit (MNL) bandit.
//
// Products are numbered 1..=N; index 0 of both parameter vectors is the
// no-purchase option with preference weight 1 and revenue 0. Serving an
// assortment S to one customer yields product i in S with probability
// v_i / (1 + Σ_{j∈S} v_j), and no purchase otherwise. The reward of a
// sample is the revenue of the chosen product.
//
// The revenue-optimal assortment is found once, by exhaustive search, at
// construction; each served customer adds its expected revenue to the
// best-case reward used by `regret`.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::trace;

use super::{Environment, EnvironmentKind};
use crate::error::{HarnessError, Result};
use crate::oracle::{search_best_assortment, MeanReward};
use crate::types::{Action, Assortment, Batch, Choice, Feedback, NO_PURCHASE};

#[derive(Debug, Clone)]
pub struct MnlBandit {
    name: String,
    reward: MeanReward,
    card_limit: Option<usize>,
    best_assortment: Assortment,
    best_revenue: f64,
    rng: ChaCha8Rng,
    tot_samples: u64,
    max_rewards: f64,
}

impl MnlBandit {
    pub fn new(
        preference_params: Vec<f64>,
        revenues: Vec<f64>,
        card_limit: Option<usize>,
    ) -> Result<Self> {
        if preference_params.len() != revenues.len() {
            return Err(HarnessError::config(format!(
                "{} preference parameters but {} revenues",
                preference_params.len(),
                revenues.len()
            )));
        }
        if preference_params.len() < 2 {
            return Err(HarnessError::config(
                "the number of products should be at least one",
            ));
        }
        if preference_params[0] != 1.0 {
            return Err(HarnessError::config(format!(
                "preference parameter of no-purchase is {}, expected 1",
                preference_params[0]
            )));
        }
        if revenues[0] != 0.0 {
            return Err(HarnessError::config(format!(
                "revenue of no-purchase is {}, expected 0",
                revenues[0]
            )));
        }
        if let Some(v) = preference_params[1..]
            .iter()
            .find(|v| !v.is_finite() || **v <= 0.0)
        {
            return Err(HarnessError::config(format!(
                "preference parameters should be positive, got {v}"
            )));
        }
        if let Some(r) = revenues[1..].iter().find(|r| !r.is_finite() || **r < 0.0) {
            return Err(HarnessError::config(format!(
                "revenues should be non-negative, got {r}"
            )));
        }
        if card_limit == Some(0) {
            return Err(HarnessError::config("cardinality limit should be positive"));
        }

        let reward = MeanReward::new(revenues, preference_params)?;
        let (best_revenue, best_assortment) = search_best_assortment(&reward, card_limit);

        Ok(Self {
            name: "mnl_bandit".to_string(),
            reward,
            card_limit,
            best_assortment,
            best_revenue,
            rng: ChaCha8Rng::seed_from_u64(0),
            tot_samples: 0,
            max_rewards: 0.0,
        })
    }

    /// Number of real products (excludes no-purchase).
    pub fn product_num(&self) -> usize {
        self.reward.product_num()
    }

    pub fn card_limit(&self) -> Option<usize> {
        self.card_limit
    }

    pub fn revenues(&self) -> &[f64] {
        self.reward.revenues()
    }

    pub fn preference_params(&self) -> &[f64] {
        self.reward.preference_params()
    }

    pub fn best_assortment(&self) -> &Assortment {
        &self.best_assortment
    }

    /// Expected revenue of the best assortment.
    pub fn best_revenue(&self) -> f64 {
        self.best_revenue
    }

    fn validate_actions(&self, actions: &[Action]) -> Result<()> {
        if actions.is_empty() {
            return Err(HarnessError::invalid_action("empty action list"));
        }
        let n = self.product_num();
        for action in actions {
            let assortment = match &action.choice {
                Choice::Assortment(a) => a,
                Choice::Arm(_) => {
                    return Err(HarnessError::invalid_action(format!(
                        "{} expects assortments, not arm indices",
                        self.name
                    )));
                }
            };
            if assortment.is_empty() {
                return Err(HarnessError::invalid_action("empty assortment"));
            }
            if let Some(p) = assortment.iter().find(|&&p| p == NO_PURCHASE || p > n) {
                return Err(HarnessError::invalid_action(format!(
                    "product {p} is not in 1..={n}"
                )));
            }
            if let Some(limit) = self.card_limit {
                if assortment.len() > limit {
                    return Err(HarnessError::invalid_action(format!(
                        "assortment of {} products exceeds cardinality limit {limit}",
                        assortment.len()
                    )));
                }
            }
            if action.count == 0 {
                return Err(HarnessError::invalid_action("action with zero customers"));
            }
        }
        Ok(())
    }

    /// Draw one customer's choice from the MNL model.
    fn sample_choice(&mut self, assortment: &Assortment) -> usize {
        let params = self.reward.preference_params();
        let total: f64 = 1.0 + assortment.iter().map(|&p| params[p]).sum::<f64>();
        let mut u = self.rng.gen::<f64>() * total;
        for &p in assortment {
            u -= params[p];
            if u < 0.0 {
                return p;
            }
        }
        NO_PURCHASE
    }
}

impl Environment for MnlBandit {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> EnvironmentKind {
        EnvironmentKind::MnlBandit
    }

    fn reset(&mut self, seed: Option<u64>) {
        let seed = seed.unwrap_or_else(|| self.rng.gen());
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        self.tot_samples = 0;
        self.max_rewards = 0.0;
    }

    fn step(&mut self, actions: &[Action]) -> Result<Feedback> {
        self.validate_actions(actions)?;

        let mut feedback = Vec::with_capacity(actions.len());
        for action in actions {
            let Choice::Assortment(assortment) = &action.choice else {
                continue;
            };
            let mut batch = Batch::default();
            for _ in 0..action.count {
                let choice = self.sample_choice(assortment);
                batch.choices.push(choice);
                batch.rewards.push(self.reward.revenues()[choice]);
            }
            self.tot_samples += action.count;
            self.max_rewards += self.best_revenue * action.count as f64;
            feedback.push(batch);
        }
        trace!(tot_samples = self.tot_samples, "mnl step");
        Ok(feedback)
    }

    fn tot_samples(&self) -> u64 {
        self.tot_samples
    }

    fn regret(&self, rewards: f64) -> f64 {
        self.max_rewards - rewards
    }

    fn box_clone(&self) -> Box<dyn Environment> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ids: &[usize]) -> Assortment {
        ids.iter().copied().collect()
    }

    fn bandit(card_limit: Option<usize>) -> MnlBandit {
        MnlBandit::new(
            vec![1.0, 1.0, 0.5, 0.3, 0.1],
            vec![0.0, 0.7, 0.8, 0.7, 0.7],
            card_limit,
        )
        .unwrap()
    }

    #[test]
    fn choices_come_from_the_served_assortment() {
        let mut b = bandit(None);
        b.reset(Some(11));
        let served = set(&[2, 4]);
        let fb = b.step(&[Action::serve(served.clone(), 200)]).unwrap();

        assert_eq!(fb.len(), 1);
        assert_eq!(fb[0].choices.len(), 200);
        assert_eq!(fb[0].rewards.len(), 200);
        for (&c, &r) in fb[0].choices.iter().zip(&fb[0].rewards) {
            assert!(c == NO_PURCHASE || served.contains(&c));
            assert_eq!(r, b.revenues()[c]);
        }
        assert!(fb[0].has_no_purchase());
        assert_eq!(b.tot_samples(), 200);
    }

    #[test]
    fn choice_frequencies_follow_mnl_probabilities() {
        let mut b = bandit(None);
        b.reset(Some(3));
        let fb = b.step(&[Action::serve(set(&[1]), 4000)]).unwrap();
        // P(choose 1) = 1 / (1 + 1) = 0.5
        let bought = fb[0].choices.iter().filter(|&&c| c == 1).count() as f64;
        assert!((bought / 4000.0 - 0.5).abs() < 0.05);
    }

    #[test]
    fn best_assortment_respects_card_limit() {
        let b = bandit(Some(1));
        assert_eq!(b.best_assortment().len(), 1);
        let unbounded = bandit(None);
        assert!(unbounded.best_revenue() >= b.best_revenue());
    }

    #[test]
    fn invalid_assortments_rejected() {
        let mut b = bandit(Some(2));
        b.reset(Some(1));
        assert!(b.step(&[Action::serve(set(&[1, 2, 3]), 1)]).is_err());
        assert!(b.step(&[Action::serve(set(&[0, 1]), 1)]).is_err());
        assert!(b.step(&[Action::serve(set(&[5]), 1)]).is_err());
        assert!(b.step(&[Action::serve(Assortment::new(), 1)]).is_err());
        assert!(b.step(&[Action::pull(1, 1)]).is_err());
        assert_eq!(b.tot_samples(), 0);
    }

    #[test]
    fn regret_accumulates_best_expected_revenue() {
        let mut b = bandit(None);
        b.reset(Some(8));
        b.step(&[Action::serve(set(&[1]), 10)]).unwrap();
        assert!((b.regret(0.0) - 10.0 * b.best_revenue()).abs() < 1e-9);
        b.reset(Some(9));
        assert_eq!(b.tot_samples(), 0);
        assert_eq!(b.regret(0.0), 0.0);
    }

    #[test]
    fn construction_checks_parameters() {
        assert!(MnlBandit::new(vec![1.0, 1.0], vec![0.0], None).is_err());
        assert!(MnlBandit::new(vec![2.0, 1.0], vec![0.0, 1.0], None).is_err());
        assert!(MnlBandit::new(vec![1.0, 1.0], vec![0.5, 1.0], None).is_err());
        assert!(MnlBandit::new(vec![1.0, -1.0], vec![0.0, 1.0], None).is_err());
        assert!(MnlBandit::new(vec![1.0, 1.0], vec![0.0, 1.0], Some(0)).is_err());
        assert!(MnlBandit::new(vec![1.0], vec![0.0], None).is_err());
    }

    #[test]
    fn best_arm_goal_unsupported() {
        let b = bandit(None);
        assert!(matches!(
            b.best_arm_regret(1),
            Err(HarnessError::UnsupportedGoal { .. })
        ));
    }
}
