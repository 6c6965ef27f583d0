// src/config.rs
//
// Experiment and run configuration.
//
// - ExperimentSpec: YAML description of one environment and the learners to
//   play against it, validated and built into trait objects. A learner's
//   `budget` (or `confidence`) may be a list, which plays the learner once
//   per value in every trial (a sweep).
// - RunConfig: how to play (trials, output file, workers, debug, log level),
//   with defaults overridable from the environment:
//
//     BANDITLAB_TRIALS     (usize)
//     BANDITLAB_PROCESSES  (i64, negative = all cores)
//     BANDITLAB_OUTPUT     (path)
//     BANDITLAB_LOG        (tracing filter, e.g. "info" or "banditlab=debug")
//
//   Any variable that fails to parse is ignored with a warning. The merged
//   settings (environment plus CLI flags) are checked by `validate`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::environment::{
    Arm, Environment, EnvironmentKind, LinearBandit, MnlBandit, OrdinaryBandit,
};
use crate::error::{HarnessError, Result};
use crate::learner::{
    EpsGreedy, Learner, Prior, SuccessiveElimination, SuccessiveRejects, ThompsonSampling, Uniform,
};
use crate::protocol::Sweep;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EnvironmentSpec {
    /// Ordinary bandit, given either explicit arms or Bernoulli means.
    Ordinary {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        arms: Vec<Arm>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        means: Vec<f64>,
    },
    Linear {
        features: Vec<Vec<f64>>,
        theta: Vec<f64>,
        #[serde(default)]
        var: Option<f64>,
    },
    /// MNL bandit; index 0 of both vectors is the no-purchase option.
    Mnl {
        preference_params: Vec<f64>,
        revenues: Vec<f64>,
        #[serde(default)]
        card_limit: Option<usize>,
    },
}

impl EnvironmentSpec {
    pub fn kind(&self) -> EnvironmentKind {
        match self {
            EnvironmentSpec::Ordinary { .. } => EnvironmentKind::OrdinaryBandit,
            EnvironmentSpec::Linear { .. } => EnvironmentKind::LinearBandit,
            EnvironmentSpec::Mnl { .. } => EnvironmentKind::MnlBandit,
        }
    }

    fn label(&self) -> &'static str {
        self.kind().as_str()
    }

    /// Number of arms of arm-indexed environments.
    fn arm_num(&self) -> Option<usize> {
        match self {
            EnvironmentSpec::Ordinary { arms, means } => Some(arms.len().max(means.len())),
            EnvironmentSpec::Linear { features, .. } => Some(features.len()),
            EnvironmentSpec::Mnl { .. } => None,
        }
    }

    fn validate(&self) -> Result<()> {
        if let EnvironmentSpec::Ordinary { arms, means } = self {
            if arms.is_empty() == means.is_empty() {
                return Err(HarnessError::config(
                    "environment: give exactly one of `arms` or `means`",
                ));
            }
        }
        Ok(())
    }

    pub fn build(&self) -> Result<Box<dyn Environment>> {
        let environment: Box<dyn Environment> = match self {
            EnvironmentSpec::Ordinary { arms, means } => {
                if means.is_empty() {
                    Box::new(OrdinaryBandit::new(arms.clone())?)
                } else {
                    Box::new(OrdinaryBandit::bernoulli(means)?)
                }
            }
            EnvironmentSpec::Linear {
                features,
                theta,
                var,
            } => Box::new(LinearBandit::new(features.clone(), theta.clone(), *var)?),
            EnvironmentSpec::Mnl {
                preference_params,
                revenues,
                card_limit,
            } => Box::new(MnlBandit::new(
                preference_params.clone(),
                revenues.clone(),
                *card_limit,
            )?),
        };
        Ok(environment)
    }
}

fn default_eps() -> f64 {
    1.0
}

/// A single protocol parameter or a list of them to sweep over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T: Copy> OneOrMany<T> {
    pub fn values(&self) -> Vec<T> {
        match self {
            OneOrMany::One(v) => vec![*v],
            OneOrMany::Many(vs) => vs.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LearnerSpec {
    SuccessiveRejects {
        budget: OneOrMany<u64>,
        #[serde(default)]
        name: Option<String>,
    },
    Uniform {
        budget: OneOrMany<u64>,
        threshold: f64,
        #[serde(default)]
        eps: f64,
        #[serde(default)]
        name: Option<String>,
    },
    EpsGreedy {
        horizon: u64,
        #[serde(default = "default_eps")]
        eps: f64,
        /// Defaults to the environment's cardinality limit.
        #[serde(default)]
        card_limit: Option<usize>,
        /// Random neighbours per local-search step; exhaustive search when
        /// absent.
        #[serde(default)]
        local_search: Option<usize>,
        #[serde(default)]
        name: Option<String>,
    },
    ThompsonSampling {
        horizon: u64,
        #[serde(default)]
        prior: Prior,
        #[serde(default)]
        name: Option<String>,
    },
    SuccessiveElimination {
        confidence: OneOrMany<f64>,
        /// Defaults to a cap derived from the arm count and confidence.
        #[serde(default)]
        max_samples: Option<u64>,
        #[serde(default)]
        name: Option<String>,
    },
}

impl LearnerSpec {
    fn label(&self) -> &'static str {
        match self {
            LearnerSpec::SuccessiveRejects { .. } => "successive_rejects",
            LearnerSpec::Uniform { .. } => "uniform",
            LearnerSpec::EpsGreedy { .. } => "eps_greedy",
            LearnerSpec::ThompsonSampling { .. } => "thompson_sampling",
            LearnerSpec::SuccessiveElimination { .. } => "successive_elimination",
        }
    }

    pub fn running_environment(&self) -> EnvironmentKind {
        match self {
            LearnerSpec::EpsGreedy { .. } => EnvironmentKind::MnlBandit,
            _ => EnvironmentKind::OrdinaryBandit,
        }
    }

    /// Name the built learner will carry.
    fn resolved_name(&self) -> &str {
        self.custom_name().unwrap_or(match self {
            LearnerSpec::SuccessiveRejects { .. } => SuccessiveRejects::DEFAULT_NAME,
            LearnerSpec::Uniform { .. } => Uniform::DEFAULT_NAME,
            LearnerSpec::EpsGreedy { .. } => EpsGreedy::DEFAULT_NAME,
            LearnerSpec::ThompsonSampling { .. } => ThompsonSampling::DEFAULT_NAME,
            LearnerSpec::SuccessiveElimination { .. } => SuccessiveElimination::DEFAULT_NAME,
        })
    }

    /// Number of swept values; 0 means an empty list.
    fn sweep_len(&self) -> usize {
        match self {
            LearnerSpec::SuccessiveRejects { budget, .. } | LearnerSpec::Uniform { budget, .. } => {
                budget.values().len()
            }
            LearnerSpec::SuccessiveElimination { confidence, .. } => confidence.values().len(),
            LearnerSpec::EpsGreedy { .. } | LearnerSpec::ThompsonSampling { .. } => 1,
        }
    }

    fn custom_name(&self) -> Option<&str> {
        match self {
            LearnerSpec::SuccessiveRejects { name, .. }
            | LearnerSpec::Uniform { name, .. }
            | LearnerSpec::EpsGreedy { name, .. }
            | LearnerSpec::ThompsonSampling { name, .. }
            | LearnerSpec::SuccessiveElimination { name, .. } => name.as_deref(),
        }
    }

    /// Build the learner (one variant per swept value) for `environment`.
    pub fn build(&self, environment: &EnvironmentSpec) -> Result<Sweep> {
        let incompatible = || HarnessError::IncompatibleEnvironment {
            learner: self.label().to_string(),
            environment: environment.label().to_string(),
            required: self.running_environment(),
            found: environment.kind(),
        };

        let variants: Vec<Box<dyn Learner>> = match self {
            LearnerSpec::EpsGreedy {
                horizon,
                eps,
                card_limit,
                local_search,
                ..
            } => {
                let EnvironmentSpec::Mnl {
                    revenues,
                    card_limit: env_card_limit,
                    ..
                } = environment
                else {
                    return Err(incompatible());
                };
                let mut learner = EpsGreedy::new(
                    revenues.clone(),
                    *horizon,
                    card_limit.or(*env_card_limit),
                    *eps,
                )?;
                if let Some(random_neighbors) = local_search {
                    learner = learner.with_local_search(*random_neighbors);
                }
                let learner: Box<dyn Learner> = match self.custom_name() {
                    Some(name) => Box::new(learner.with_name(name)),
                    None => Box::new(learner),
                };
                vec![learner]
            }
            _ => {
                let arm_num = environment.arm_num().ok_or_else(incompatible)?;
                self.build_ordinary(arm_num)?
            }
        };
        Sweep::new(variants)
    }

    fn build_ordinary(&self, arm_num: usize) -> Result<Vec<Box<dyn Learner>>> {
        let name = self.custom_name();
        let mut variants: Vec<Box<dyn Learner>> = Vec::new();
        match self {
            LearnerSpec::SuccessiveRejects { budget, .. } => {
                for b in budget.values() {
                    let l = SuccessiveRejects::new(arm_num, b)?;
                    variants.push(match name {
                        Some(n) => Box::new(l.with_name(n)),
                        None => Box::new(l),
                    });
                }
            }
            LearnerSpec::Uniform {
                budget,
                threshold,
                eps,
                ..
            } => {
                for b in budget.values() {
                    let l = Uniform::new(arm_num, b, *threshold, *eps)?;
                    variants.push(match name {
                        Some(n) => Box::new(l.with_name(n)),
                        None => Box::new(l),
                    });
                }
            }
            LearnerSpec::ThompsonSampling { horizon, prior, .. } => {
                let l = ThompsonSampling::new(arm_num, *horizon, *prior)?;
                variants.push(match name {
                    Some(n) => Box::new(l.with_name(n)),
                    None => Box::new(l),
                });
            }
            LearnerSpec::SuccessiveElimination {
                confidence,
                max_samples,
                ..
            } => {
                for c in confidence.values() {
                    let l = SuccessiveElimination::new(arm_num, c, *max_samples)?;
                    variants.push(match name {
                        Some(n) => Box::new(l.with_name(n)),
                        None => Box::new(l),
                    });
                }
            }
            LearnerSpec::EpsGreedy { .. } => {
                return Err(HarnessError::config(
                    "eps_greedy runs on MNL bandits, not arm-indexed ones",
                ));
            }
        }
        Ok(variants)
    }
}

/// One environment and the learners to play against it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentSpec {
    pub name: String,
    pub environment: EnvironmentSpec,
    pub learners: Vec<LearnerSpec>,
}

impl ExperimentSpec {
    /// Load an experiment from a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref()).map_err(|e| {
            HarnessError::config(format!(
                "cannot read experiment {}: {e}",
                path.as_ref().display()
            ))
        })?;
        Self::from_yaml_str(&contents)
    }

    /// Parse an experiment from a YAML string.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let spec: ExperimentSpec = serde_yaml::from_str(yaml)?;
        spec.validate()?;
        Ok(spec)
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(HarnessError::config("experiment name cannot be empty"));
        }
        if self.learners.is_empty() {
            return Err(HarnessError::config("learners list cannot be empty"));
        }
        self.environment.validate()?;

        let mut names: Vec<&str> = Vec::new();
        for learner in &self.learners {
            let name = learner.resolved_name();
            if names.contains(&name) {
                return Err(HarnessError::config(format!(
                    "duplicate learner name {name:?}; set `name` to tell the learners apart"
                )));
            }
            names.push(name);
            if learner.sweep_len() == 0 {
                return Err(HarnessError::config(format!(
                    "learner {name:?}: empty parameter list"
                )));
            }
        }
        Ok(())
    }

    /// Construct the environment prototype and learner prototypes.
    pub fn build(&self) -> Result<(Box<dyn Environment>, Vec<Sweep>)> {
        let environment = self.environment.build()?;
        let learners = self
            .learners
            .iter()
            .map(|spec| spec.build(&self.environment))
            .collect::<Result<Vec<_>>>()?;
        info!(
            experiment = %self.name,
            environment = environment.name(),
            learners = learners.len(),
            "experiment built"
        );
        Ok((environment, learners))
    }
}

/// Log filter when nothing else is configured.
pub const DEFAULT_LOG_FILTER: &str = "info";
/// Log filter of a debug run without an explicit level; enables the
/// per-step trace.
pub const DEBUG_LOG_FILTER: &str = "banditlab=debug";

/// How to play an experiment.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub trials: usize,
    pub output: PathBuf,
    /// Worker threads; negative means all cores.
    pub processes: i64,
    pub debug: bool,
    /// Explicit tracing filter (`--log` or `BANDITLAB_LOG`).
    pub log_level: Option<String>,
    /// Environment overrides that failed to parse, kept until logging is up.
    ignored: Vec<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            trials: 100,
            output: PathBuf::from("results.jsonl"),
            processes: -1,
            debug: false,
            log_level: None,
            ignored: Vec::new(),
        }
    }
}

impl RunConfig {
    /// Defaults with `BANDITLAB_*` overrides from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults with overrides from `lookup` (the process environment in
    /// production, a map in tests). Unparseable values are skipped and
    /// reported by `log_ignored_overrides`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = RunConfig::default();

        if let Some(raw) = lookup("BANDITLAB_TRIALS") {
            match raw.trim().parse::<usize>() {
                Ok(v) => cfg.trials = v,
                Err(_) => cfg.ignored.push(format!("BANDITLAB_TRIALS={raw:?} is not an integer")),
            }
        }

        if let Some(raw) = lookup("BANDITLAB_PROCESSES") {
            match raw.trim().parse::<i64>() {
                Ok(v) => cfg.processes = v,
                Err(_) => cfg
                    .ignored
                    .push(format!("BANDITLAB_PROCESSES={raw:?} is not an integer")),
            }
        }

        if let Some(raw) = lookup("BANDITLAB_OUTPUT") {
            if raw.trim().is_empty() {
                cfg.ignored.push("BANDITLAB_OUTPUT is empty".to_string());
            } else {
                cfg.output = PathBuf::from(raw);
            }
        }

        if let Some(raw) = lookup("BANDITLAB_LOG") {
            if !raw.trim().is_empty() {
                cfg.log_level = Some(raw);
            }
        }

        cfg
    }

    /// Overrides skipped by `from_lookup`.
    pub fn ignored_overrides(&self) -> &[String] {
        &self.ignored
    }

    /// Warn about every skipped override. Call once logging is initialized.
    pub fn log_ignored_overrides(&self) {
        for reason in &self.ignored {
            warn!(reason = %reason, "ignoring environment override; using default");
        }
    }

    /// Tracing filter: the explicit level if any, else the per-step debug
    /// filter for a debug run, else `info`.
    pub fn log_filter(&self) -> &str {
        match &self.log_level {
            Some(level) => level,
            None if self.debug => DEBUG_LOG_FILTER,
            None => DEFAULT_LOG_FILTER,
        }
    }

    /// Trials actually played per learner.
    pub fn effective_trials(&self) -> usize {
        if self.debug {
            1
        } else {
            self.trials
        }
    }

    /// Check the final settings, whichever source they came from.
    pub fn validate(&self) -> Result<()> {
        if self.trials == 0 {
            return Err(HarnessError::config("trials must be positive"));
        }
        if self.processes == 0 {
            return Err(HarnessError::config(
                "processes must be non-zero (negative uses every core)",
            ));
        }
        if self.output.as_os_str().is_empty() {
            return Err(HarnessError::config("output path is empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SR_YAML: &str = r#"
name: sr_demo
environment:
  type: ordinary
  means: [0.1, 0.2, 0.3, 0.4, 0.5]
learners:
  - type: successive_rejects
    budget: 100
  - type: uniform
    budget: 50
    threshold: 0.3
    eps: 0.05
    name: uniform_50
"#;

    #[test]
    fn parses_and_builds_ordinary_experiment() {
        let spec = ExperimentSpec::from_yaml_str(SR_YAML).unwrap();
        assert_eq!(spec.learners.len(), 2);
        let (env, learners) = spec.build().unwrap();
        assert_eq!(env.kind(), EnvironmentKind::OrdinaryBandit);
        assert_eq!(learners[0].name(), "successive_rejects");
        assert_eq!(learners[1].name(), "uniform_50");
    }

    #[test]
    fn parses_and_builds_mnl_experiment() {
        let yaml = r#"
name: mnl
environment:
  type: mnl
  preference_params: [1.0, 1.0, 0.5, 0.3]
  revenues: [0.0, 0.7, 0.8, 0.7]
  card_limit: 2
learners:
  - type: eps_greedy
    horizon: 200
    local_search: 5
"#;
        let spec = ExperimentSpec::from_yaml_str(yaml).unwrap();
        let (env, learners) = spec.build().unwrap();
        assert_eq!(env.kind(), EnvironmentKind::MnlBandit);
        assert_eq!(learners[0].running_environment(), EnvironmentKind::MnlBandit);
    }

    #[test]
    fn gaussian_arms_parse() {
        let yaml = r#"
name: gauss
environment:
  type: ordinary
  arms:
    - {type: gaussian, mean: 0.0, std: 0.5}
    - {type: gaussian, mean: 1.0}
learners:
  - type: thompson_sampling
    horizon: 100
    prior: gaussian
"#;
        let spec = ExperimentSpec::from_yaml_str(yaml).unwrap();
        assert!(spec.build().is_ok());
    }

    #[test]
    fn mismatched_learner_is_incompatible() {
        let yaml = r#"
name: bad
environment:
  type: mnl
  preference_params: [1.0, 1.0]
  revenues: [0.0, 1.0]
learners:
  - type: successive_rejects
    budget: 100
"#;
        let spec = ExperimentSpec::from_yaml_str(yaml).unwrap();
        assert!(matches!(
            spec.build(),
            Err(HarnessError::IncompatibleEnvironment { .. })
        ));
    }

    #[test]
    fn validation_errors() {
        let no_learners = "name: x\nenvironment: {type: ordinary, means: [0.1, 0.2]}\nlearners: []\n";
        assert!(ExperimentSpec::from_yaml_str(no_learners).is_err());

        let both = "name: x\nenvironment:\n  type: ordinary\n  means: [0.1, 0.2]\n  arms: [{type: bernoulli, mean: 0.1}]\nlearners:\n  - {type: successive_rejects, budget: 100}\n";
        assert!(ExperimentSpec::from_yaml_str(both).is_err());

        let dup = "name: x\nenvironment: {type: ordinary, means: [0.1, 0.2]}\nlearners:\n  - {type: successive_rejects, budget: 100, name: a}\n  - {type: successive_rejects, budget: 200, name: a}\n";
        assert!(ExperimentSpec::from_yaml_str(dup).is_err());

        assert!(matches!(
            ExperimentSpec::from_yaml_str("name: [unclosed"),
            Err(HarnessError::Yaml(_))
        ));
    }

    #[test]
    fn same_default_names_rejected() {
        let yaml = "name: x\nenvironment: {type: ordinary, means: [0.1, 0.2]}\nlearners:\n  - {type: successive_rejects, budget: 100}\n  - {type: successive_rejects, budget: 200}\n";
        let err = ExperimentSpec::from_yaml_str(yaml).unwrap_err();
        assert!(err.to_string().contains("successive_rejects"));

        let named = "name: x\nenvironment: {type: ordinary, means: [0.1, 0.2]}\nlearners:\n  - {type: successive_rejects, budget: 100}\n  - {type: successive_rejects, budget: 200, name: sr_200}\n";
        assert!(ExperimentSpec::from_yaml_str(named).is_ok());
    }

    #[test]
    fn budget_and_confidence_lists_build_sweeps() {
        let yaml = r#"
name: sweep
environment:
  type: ordinary
  means: [0.1, 0.5, 0.9]
learners:
  - type: successive_rejects
    budget: [50, 100, 200]
  - type: successive_elimination
    confidence: [0.1, 0.01]
  - type: uniform
    budget: 30
    threshold: 0.5
"#;
        let spec = ExperimentSpec::from_yaml_str(yaml).unwrap();
        let (_, learners) = spec.build().unwrap();
        let budgets: Vec<f64> = learners[0]
            .variants()
            .iter()
            .map(|l| l.goal().parameter())
            .collect();
        assert_eq!(budgets, vec![50.0, 100.0, 200.0]);
        assert_eq!(learners[1].len(), 2);
        assert_eq!(learners[2].len(), 1);
        assert!(learners[0]
            .variants()
            .iter()
            .all(|l| l.name() == "successive_rejects"));
    }

    #[test]
    fn empty_or_repeated_sweeps_rejected() {
        let empty = "name: x\nenvironment: {type: ordinary, means: [0.1, 0.2]}\nlearners:\n  - {type: successive_rejects, budget: []}\n";
        assert!(ExperimentSpec::from_yaml_str(empty).is_err());

        let repeated = "name: x\nenvironment: {type: ordinary, means: [0.1, 0.2]}\nlearners:\n  - {type: successive_rejects, budget: [100, 100]}\n";
        let spec = ExperimentSpec::from_yaml_str(repeated).unwrap();
        assert!(matches!(spec.build(), Err(HarnessError::Configuration(_))));
    }

    #[test]
    fn shipped_experiments_build() {
        for yaml in [
            include_str!("../demos/bai_ordinary.yaml"),
            include_str!("../demos/budget_sweep.yaml"),
            include_str!("../demos/mnl_assortment.yaml"),
            include_str!("../demos/regret_ordinary.yaml"),
        ] {
            let spec = ExperimentSpec::from_yaml_str(yaml).unwrap();
            let (_, learners) = spec.build().unwrap();
            assert!(!learners.is_empty(), "{}", spec.name);
        }
    }

    #[test]
    fn run_config_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("BANDITLAB_TRIALS", "12"),
            ("BANDITLAB_PROCESSES", "not-a-number"),
            ("BANDITLAB_OUTPUT", "out.jsonl"),
            ("BANDITLAB_LOG", "debug"),
        ]
        .into_iter()
        .collect();
        let cfg = RunConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(cfg.trials, 12);
        assert_eq!(cfg.processes, -1);
        assert_eq!(cfg.output, PathBuf::from("out.jsonl"));
        assert_eq!(cfg.log_filter(), "debug");
        assert_eq!(cfg.ignored_overrides().len(), 1);
        assert!(cfg.ignored_overrides()[0].contains("BANDITLAB_PROCESSES"));
    }

    #[test]
    fn debug_run_logs_steps_unless_level_given() {
        let mut cfg = RunConfig {
            debug: true,
            ..RunConfig::default()
        };
        assert_eq!(cfg.log_filter(), DEBUG_LOG_FILTER);
        assert_eq!(cfg.effective_trials(), 1);

        cfg.log_level = Some("warn".to_string());
        assert_eq!(cfg.log_filter(), "warn");
        assert_eq!(RunConfig::default().log_filter(), DEFAULT_LOG_FILTER);
    }

    #[test]
    fn zero_trials_rejected_from_any_source() {
        let from_env = RunConfig::from_lookup(|k| (k == "BANDITLAB_TRIALS").then(|| "0".to_string()));
        assert!(from_env.validate().is_err());

        let from_flag = RunConfig {
            trials: 0,
            ..RunConfig::default()
        };
        assert!(from_flag.validate().is_err());

        let zero_workers = RunConfig {
            processes: 0,
            ..RunConfig::default()
        };
        assert!(zero_workers.validate().is_err());
        assert!(RunConfig::default().validate().is_ok());
    }

    #[test]
    fn run_config_defaults() {
        let cfg = RunConfig::from_lookup(|_| None);
        assert_eq!(cfg, RunConfig::default());
    }
}
