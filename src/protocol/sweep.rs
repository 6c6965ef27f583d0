// src/protocol/sweep.rs
//
// A learner played under one or more protocol parameters (budgets for
// fixed-budget goals, confidences for fixed-confidence goals). Every trial
// plays all values in order against the same environment and produces one
// record per value, written together.

use std::collections::HashSet;

use crate::environment::EnvironmentKind;
use crate::error::{HarnessError, Result};
use crate::learner::Learner;

#[derive(Clone)]
pub struct Sweep {
    variants: Vec<Box<dyn Learner>>,
}

impl Sweep {
    /// All variants must share name, environment kind and goal type, and
    /// differ in their goal parameter.
    pub fn new(variants: Vec<Box<dyn Learner>>) -> Result<Self> {
        let Some(first) = variants.first() else {
            return Err(HarnessError::config("a sweep needs at least one learner"));
        };
        let mut parameters = HashSet::new();
        for v in &variants {
            if v.name() != first.name()
                || v.running_environment() != first.running_environment()
                || v.goal().label() != first.goal().label()
            {
                return Err(HarnessError::config(format!(
                    "sweep mixes learner {} ({}) with {} ({})",
                    first.name(),
                    first.goal().label(),
                    v.name(),
                    v.goal().label()
                )));
            }
            if !parameters.insert(v.goal().parameter().to_bits()) {
                return Err(HarnessError::config(format!(
                    "{}: sweep repeats the value {}",
                    v.name(),
                    v.goal().parameter()
                )));
            }
        }
        Ok(Self { variants })
    }

    pub fn name(&self) -> &str {
        self.variants[0].name()
    }

    pub fn running_environment(&self) -> EnvironmentKind {
        self.variants[0].running_environment()
    }

    pub fn variants(&self) -> &[Box<dyn Learner>] {
        &self.variants
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    /// Fresh copies of every variant for one trial.
    pub fn clone_variants(&self) -> Vec<Box<dyn Learner>> {
        self.variants.clone()
    }
}

impl From<Box<dyn Learner>> for Sweep {
    fn from(learner: Box<dyn Learner>) -> Self {
        Self {
            variants: vec![learner],
        }
    }
}
