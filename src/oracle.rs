// src/oracle.rs
//
// Assortment-optimization oracles for multinomial-logit (MNL) choice models.
//
// - MeanReward: expected revenue of an assortment under given preference
//   parameters.
// - search: enumerate all feasible (non-empty, cardinality-bounded)
//   assortments.
// - search_best_assortment: exhaustive maximisation.
// - local_search_best_assortment: hill climbing over add/remove/swap
//   neighbours, sampling a bounded number of neighbours per iteration.
//
// Index 0 of both parameter vectors is the no-purchase option; its weight
// is fixed to 1 and its revenue to 0.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::{HarnessError, Result};
use crate::types::Assortment;

/// Expected revenue of an assortment under an MNL model.
#[derive(Debug, Clone, PartialEq)]
pub struct MeanReward {
    revenues: Vec<f64>,
    preference_params: Vec<f64>,
}

impl MeanReward {
    pub fn new(revenues: Vec<f64>, preference_params: Vec<f64>) -> Result<Self> {
        if revenues.len() < 2 {
            return Err(HarnessError::config(
                "MNL model needs at least one product besides no-purchase",
            ));
        }
        if revenues.len() != preference_params.len() {
            return Err(HarnessError::config(format!(
                "revenues ({}) and preference parameters ({}) have different lengths",
                revenues.len(),
                preference_params.len()
            )));
        }
        Ok(Self {
            revenues,
            preference_params,
        })
    }

    /// Number of real products (excludes no-purchase).
    pub fn product_num(&self) -> usize {
        self.revenues.len() - 1
    }

    pub fn revenues(&self) -> &[f64] {
        &self.revenues
    }

    pub fn preference_params(&self) -> &[f64] {
        &self.preference_params
    }

    pub fn set_preference_params(&mut self, params: Vec<f64>) -> Result<()> {
        if params.len() != self.revenues.len() {
            return Err(HarnessError::config(format!(
                "expected {} preference parameters, got {}",
                self.revenues.len(),
                params.len()
            )));
        }
        self.preference_params = params;
        Ok(())
    }

    /// Expected revenue `Σ r_i v_i / (1 + Σ v_i)` over `assortment`.
    pub fn calc(&self, assortment: &Assortment) -> f64 {
        let mut weight = 1.0;
        let mut revenue = 0.0;
        for &p in assortment {
            if let (Some(&v), Some(&r)) = (self.preference_params.get(p), self.revenues.get(p)) {
                weight += v;
                revenue += r * v;
            }
        }
        revenue / weight
    }
}

/// Effective cardinality bound for `product_num` products.
pub fn effective_card_limit(product_num: usize, card_limit: Option<usize>) -> usize {
    card_limit.unwrap_or(product_num).min(product_num)
}

/// Enumerate every non-empty assortment of products `1..=product_num` with
/// at most `card_limit` products, in depth-first order (lower ids first).
pub fn search(product_num: usize, card_limit: Option<usize>) -> Vec<Assortment> {
    let limit = effective_card_limit(product_num, card_limit);
    let mut out = Vec::new();
    let mut current = Assortment::new();
    search_from(1, product_num, limit, &mut current, &mut out);
    out
}

fn search_from(
    next: usize,
    product_num: usize,
    limit: usize,
    current: &mut Assortment,
    out: &mut Vec<Assortment>,
) {
    if next > product_num {
        if !current.is_empty() {
            out.push(current.clone());
        }
        return;
    }
    if current.len() < limit {
        current.insert(next);
        search_from(next + 1, product_num, limit, current, out);
        current.remove(&next);
    }
    search_from(next + 1, product_num, limit, current, out);
}

/// Exhaustive search for the revenue-maximising feasible assortment.
///
/// Ties keep the first assortment in enumeration order.
pub fn search_best_assortment(
    reward: &MeanReward,
    card_limit: Option<usize>,
) -> (f64, Assortment) {
    let mut best: Option<(f64, Assortment)> = None;
    for assortment in search(reward.product_num(), card_limit) {
        let value = reward.calc(&assortment);
        match &best {
            Some((best_value, _)) if value <= *best_value => {}
            _ => best = Some((value, assortment)),
        }
    }
    best.unwrap_or_else(|| (0.0, Assortment::new()))
}

/// Hill-climbing search starting from `init_assortment` (or a random single
/// product). Each iteration evaluates at most `random_neighbors` randomly
/// chosen neighbours and moves to the best strictly improving one.
pub fn local_search_best_assortment<R: Rng + ?Sized>(
    reward: &MeanReward,
    random_neighbors: usize,
    card_limit: Option<usize>,
    init_assortment: Option<&Assortment>,
    rng: &mut R,
) -> (f64, Assortment) {
    let product_num = reward.product_num();
    let limit = effective_card_limit(product_num, card_limit);
    if product_num == 0 || limit == 0 {
        return (0.0, Assortment::new());
    }

    let feasible = |a: &Assortment| {
        !a.is_empty() && a.len() <= limit && a.iter().all(|&p| p >= 1 && p <= product_num)
    };
    let mut current = match init_assortment {
        Some(a) if feasible(a) => a.clone(),
        _ => std::iter::once(rng.gen_range(1..=product_num)).collect(),
    };
    let mut current_value = reward.calc(&current);

    loop {
        let mut neighbors = neighbors_of(&current, product_num, limit);
        if neighbors.is_empty() {
            break;
        }
        neighbors.shuffle(rng);
        neighbors.truncate(random_neighbors.max(1));

        let mut improved: Option<(f64, Assortment)> = None;
        for candidate in neighbors {
            let value = reward.calc(&candidate);
            let best_so_far = improved.as_ref().map(|(v, _)| *v).unwrap_or(current_value);
            if value > best_so_far {
                improved = Some((value, candidate));
            }
        }

        match improved {
            Some((value, assortment)) => {
                current = assortment;
                current_value = value;
            }
            None => break,
        }
    }

    (current_value, current)
}

/// Assortments reachable from `current` by removing, adding or swapping a
/// single product.
fn neighbors_of(current: &Assortment, product_num: usize, limit: usize) -> Vec<Assortment> {
    let mut out = Vec::new();
    for p in 1..=product_num {
        if current.contains(&p) {
            if current.len() > 1 {
                let mut n = current.clone();
                n.remove(&p);
                out.push(n);
            }
        } else {
            if current.len() < limit {
                let mut n = current.clone();
                n.insert(p);
                out.push(n);
            }
            for &q in current {
                let mut n = current.clone();
                n.remove(&q);
                n.insert(p);
                out.push(n);
            }
        }
    }
    out
}
