// tests/successive_rejects_props.rs
//
// Property tests for the successive-rejects schedule over random arm counts,
// budgets and arm means.

use banditlab::learner::successive_rejects::bar_log;
use banditlab::types::Context;
use banditlab::{Environment, Learner, OrdinaryBandit, SuccessiveRejects};
use proptest::prelude::*;

fn min_budget(arm_num: usize) -> u64 {
    arm_num as u64 + (arm_num as f64 * bar_log(arm_num)).ceil() as u64
}

fn instance() -> impl Strategy<Value = (Vec<f64>, u64, u64)> {
    (2usize..8)
        .prop_flat_map(|k| {
            (
                prop::collection::vec(0.0f64..=1.0, k),
                0u64..400,
                any::<u64>(),
            )
        })
        .prop_map(|(means, extra, seed)| {
            let budget = min_budget(means.len()) + extra;
            (means, budget, seed)
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn spends_at_most_budget_and_keeps_one_arm((means, budget, seed) in instance()) {
        let k = means.len();
        let mut env = OrdinaryBandit::bernoulli(&means).unwrap();
        env.reset(Some(seed));
        let mut sr = SuccessiveRejects::new(k, budget).unwrap();
        sr.reset(Some(seed));

        let mut active = sr.active_arms().len();
        while let Some(actions) = sr.actions(&Context::Empty).unwrap() {
            for action in &actions {
                let arm = action.arm().unwrap();
                prop_assert!(sr.active_arms().contains(&arm));
                prop_assert!(action.count > 0);
            }
            let feedback = env.step(&actions).unwrap();
            sr.update(&feedback).unwrap();

            let now = sr.active_arms().len();
            prop_assert!(now < active, "each round rejects an arm");
            active = now;
        }

        prop_assert!(env.tot_samples() <= budget);
        prop_assert_eq!(sr.active_arms().len(), 1);
        let best = sr.best_arm().unwrap();
        prop_assert!(sr.active_arms().contains(&best));
    }

    #[test]
    fn minimum_budget_is_feasible(k in 2usize..8) {
        let budget = min_budget(k);
        prop_assert!(SuccessiveRejects::new(k, budget).is_ok());
        prop_assert!(SuccessiveRejects::new(k, k as u64).is_err());
    }
}
