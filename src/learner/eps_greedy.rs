// src/learner/eps_greedy.rs
//
// Epsilon-greedy assortment selection for MNL bandits (regret minimization).
//
// Time runs in episodes; an episode ends when a customer leaves without
// purchasing. The assortment chosen at the start of an episode is served
// until that happens. At each episode start, with probability eps/t a
// uniformly random feasible assortment is served; otherwise the preference
// parameters are estimated as (times chosen) / (episodes served), with
// unknown ratios taken as 1 and every estimate clipped to 1, and the
// revenue-maximizing assortment under those estimates is served.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use super::{Answer, Goal, Learner, LearnerState, Lifecycle, Turn};
use crate::environment::EnvironmentKind;
use crate::error::{HarnessError, Result};
use crate::oracle::{local_search_best_assortment, search, search_best_assortment, MeanReward};
use crate::types::{Action, ActionList, Assortment, Batch, Context};

#[derive(Debug, Clone)]
pub struct EpsGreedy {
    name: String,
    horizon: u64,
    card_limit: Option<usize>,
    eps: f64,
    /// Number of random neighbours per local-search step; `None` uses
    /// exhaustive search.
    local_search: Option<usize>,
    /// Revenues with the estimated preference parameters plugged in.
    reward: MeanReward,

    lifecycle: Lifecycle,
    rng: ChaCha8Rng,
    /// Current time step, 1-based.
    time: u64,
    /// Current episode, 1-based.
    episode: u64,
    /// Episodes each product was served in, up to the current episode.
    serving_episodes: Vec<f64>,
    /// Times each product (0 = no purchase) was chosen.
    customer_choices: Vec<f64>,
    /// Action of the episode in progress; cleared on no-purchase.
    episode_action: Option<ActionList>,
    last_assortment: Option<Assortment>,
}

impl EpsGreedy {
    pub const DEFAULT_NAME: &'static str = "epsilon_greedy";

    /// `revenues[0]` is the no-purchase revenue and must be 0.
    pub fn new(revenues: Vec<f64>, horizon: u64, card_limit: Option<usize>, eps: f64) -> Result<Self> {
        if revenues.len() < 2 {
            return Err(HarnessError::config(
                "revenues should cover no-purchase and at least one product",
            ));
        }
        if revenues[0] != 0.0 {
            return Err(HarnessError::config(format!(
                "revenue of no-purchase is {}, expected 0",
                revenues[0]
            )));
        }
        if horizon == 0 {
            return Err(HarnessError::config("horizon should be positive"));
        }
        if card_limit == Some(0) {
            return Err(HarnessError::config("cardinality limit should be positive"));
        }
        if eps.is_nan() || eps <= 0.0 {
            return Err(HarnessError::config(format!(
                "epsilon {eps} is no greater than 0"
            )));
        }

        let len = revenues.len();
        let reward = MeanReward::new(revenues, vec![1.0; len])?;
        Ok(Self {
            name: Self::DEFAULT_NAME.to_string(),
            horizon,
            card_limit,
            eps,
            local_search: None,
            reward,
            lifecycle: Lifecycle::default(),
            rng: ChaCha8Rng::seed_from_u64(0),
            time: 1,
            episode: 1,
            serving_episodes: vec![0.0; len],
            customer_choices: vec![0.0; len],
            episode_action: None,
            last_assortment: None,
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Use local search with `random_neighbors` sampled neighbours per step
    /// instead of exhaustive search.
    pub fn with_local_search(mut self, random_neighbors: usize) -> Self {
        self.local_search = Some(random_neighbors);
        self
    }

    pub fn product_num(&self) -> usize {
        self.reward.product_num()
    }

    pub fn card_limit(&self) -> Option<usize> {
        self.card_limit
    }

    pub fn time(&self) -> u64 {
        self.time
    }

    pub fn episode(&self) -> u64 {
        self.episode
    }

    /// True while an episode is in progress (no no-purchase seen since its
    /// assortment was chosen).
    pub fn in_episode(&self) -> bool {
        self.episode_action.is_some()
    }

    /// Optimistic estimate of the preference parameters, index 0 included.
    pub fn em_preference_params(&self) -> Vec<f64> {
        self.customer_choices
            .iter()
            .zip(&self.serving_episodes)
            .map(|(&chosen, &served)| {
                if served == 0.0 {
                    1.0
                } else {
                    (chosen / served).min(1.0)
                }
            })
            .collect()
    }

    fn random_assortment(&mut self) -> Assortment {
        let candidates = search(self.product_num(), self.card_limit);
        candidates
            .choose(&mut self.rng)
            .cloned()
            .unwrap_or_default()
    }

    fn greedy_assortment(&mut self) -> Result<Assortment> {
        let estimate = self.em_preference_params();
        self.reward.set_preference_params(estimate)?;
        let (_, assortment) = match self.local_search {
            Some(random_neighbors) => local_search_best_assortment(
                &self.reward,
                random_neighbors,
                self.card_limit,
                self.last_assortment.as_ref(),
                &mut self.rng,
            ),
            None => search_best_assortment(&self.reward, self.card_limit),
        };
        Ok(assortment)
    }

    fn decide(&mut self) -> Result<Option<ActionList>> {
        if self.time > self.horizon {
            return Ok(None);
        }
        if let Some(actions) = &self.episode_action {
            return Ok(Some(actions.clone()));
        }

        let explore = self.rng.gen::<f64>() <= self.eps / self.time as f64;
        let assortment = if explore {
            self.random_assortment()
        } else {
            self.greedy_assortment()?
        };
        debug!(
            learner = %self.name,
            time = self.time,
            episode = self.episode,
            explore,
            ?assortment,
            "new episode"
        );
        let actions = vec![Action::serve(assortment.clone(), 1)];
        self.last_assortment = Some(assortment);
        self.episode_action = Some(actions.clone());
        Ok(Some(actions))
    }
}

impl Learner for EpsGreedy {
    fn name(&self) -> &str {
        &self.name
    }

    fn running_environment(&self) -> EnvironmentKind {
        EnvironmentKind::MnlBandit
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
        self.time = 1;
        self.episode = 1;
        let len = self.serving_episodes.len();
        self.serving_episodes = vec![0.0; len];
        self.customer_choices = vec![0.0; len];
        self.episode_action = None;
        self.last_assortment = None;
    }

    fn actions(&mut self, _context: &Context<'_>) -> Result<Option<ActionList>> {
        match self.lifecycle.begin_turn(&self.name)? {
            Turn::Replay(actions) => return Ok(Some(actions)),
            Turn::Done => return Ok(None),
            Turn::Decide => {}
        }
        let actions = self.decide()?;
        Ok(self.lifecycle.commit(actions))
    }

    fn update(&mut self, feedback: &[Batch]) -> Result<()> {
        let actions = self.lifecycle.take_pending(&self.name, feedback)?;
        let mut episode_over = false;
        for (action, batch) in actions.iter().zip(feedback) {
            if batch.choices.len() != batch.len() {
                return Err(HarnessError::invalid_action(format!(
                    "{}: feedback carries no customer choices",
                    self.name
                )));
            }
            for &choice in &batch.choices {
                match self.customer_choices.get_mut(choice) {
                    Some(count) => *count += 1.0,
                    None => {
                        return Err(HarnessError::invalid_action(format!(
                            "{}: unknown product {choice} in feedback",
                            self.name
                        )));
                    }
                }
            }
            self.time += action.count;
            if batch.has_no_purchase() {
                episode_over = true;
            }
        }

        if episode_over {
            if let Some(assortment) = &self.last_assortment {
                for &product in assortment {
                    self.serving_episodes[product] += 1.0;
                }
            }
            self.episode += 1;
            self.episode_action = None;
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::{Environment, MnlBandit};
    use crate::types::NO_PURCHASE;

    fn learner() -> EpsGreedy {
        EpsGreedy::new(vec![0.0, 0.7, 0.8, 0.7, 0.7], 100, Some(2), 1.0).unwrap()
    }

    fn purchase(product: usize) -> Vec<Batch> {
        vec![Batch {
            rewards: vec![1.0],
            choices: vec![product],
        }]
    }

    fn leave() -> Vec<Batch> {
        vec![Batch {
            rewards: vec![0.0],
            choices: vec![NO_PURCHASE],
        }]
    }

    #[test]
    fn assortment_replayed_within_episode() {
        let mut l = learner();
        l.reset(Some(4));

        let first = l.actions(&Context::Empty).unwrap().unwrap();
        let product = *first[0].assortment().unwrap().iter().next().unwrap();
        for _ in 0..5 {
            l.update(&purchase(product)).unwrap();
            assert!(l.in_episode());
            assert_eq!(l.actions(&Context::Empty).unwrap().unwrap(), first);
        }
        assert_eq!(l.episode(), 1);
        assert_eq!(l.time(), 6);
    }

    #[test]
    fn no_purchase_starts_new_episode() {
        let mut l = learner();
        l.reset(Some(4));
        let first = l.actions(&Context::Empty).unwrap().unwrap();
        let served = first[0].assortment().unwrap().clone();

        l.update(&leave()).unwrap();
        assert!(!l.in_episode());
        assert_eq!(l.episode(), 2);
        let est = l.em_preference_params();
        for p in served {
            // served once, never chosen
            assert_eq!(est[p], 0.0);
        }
    }

    #[test]
    fn estimates_are_optimistic_and_clipped() {
        let mut l = learner();
        l.reset(Some(1));
        assert!(l.em_preference_params().iter().all(|&v| v == 1.0));

        let served = l.actions(&Context::Empty).unwrap().unwrap()[0]
            .assortment()
            .unwrap()
            .clone();
        let product = *served.iter().next().unwrap();
        for _ in 0..3 {
            l.update(&purchase(product)).unwrap();
            l.actions(&Context::Empty).unwrap();
        }
        l.update(&leave()).unwrap();
        // chosen 3 times in 1 episode → clipped to 1
        assert_eq!(l.em_preference_params()[product], 1.0);
    }

    #[test]
    fn runs_for_horizon_against_mnl_bandit() {
        let mut env = MnlBandit::new(
            vec![1.0, 1.0, 0.5, 0.3, 0.1],
            vec![0.0, 0.7, 0.8, 0.7, 0.7],
            Some(2),
        )
        .unwrap();
        env.reset(Some(21));
        let mut l = learner().with_local_search(3);
        l.reset(Some(21));

        while let Some(actions) = l.actions(&Context::Empty).unwrap() {
            assert!(actions[0].assortment().unwrap().len() <= 2);
            let fb = env.step(&actions).unwrap();
            l.update(&fb).unwrap();
        }
        assert_eq!(env.tot_samples(), 100);
        assert_eq!(l.answer().unwrap(), Answer::None);
    }

    #[test]
    fn construction_checks() {
        assert!(EpsGreedy::new(vec![0.0, 1.0], 10, None, 0.0).is_err());
        assert!(EpsGreedy::new(vec![0.0, 1.0], 0, None, 1.0).is_err());
        assert!(EpsGreedy::new(vec![0.0], 10, None, 1.0).is_err());
        assert!(EpsGreedy::new(vec![0.0, 1.0], 10, Some(0), 1.0).is_err());
    }

    #[test]
    fn feedback_without_choices_rejected() {
        let mut l = learner();
        l.reset(Some(2));
        l.actions(&Context::Empty).unwrap();
        assert!(matches!(
            l.update(&[Batch::from_rewards(vec![1.0])]),
            Err(HarnessError::InvalidAction(_))
        ));
    }
}
