// src/error.rs
//
// Error taxonomy for the harness.
//
// Every failure is a configuration or logic defect: nothing here is retried.
// Construction-time problems surface as `Configuration`, tag mismatches as
// `IncompatibleEnvironment`, protocol violations during a trial as
// `InvalidAction`, and premature result queries as `NotReady`.

use thiserror::Error;

use crate::environment::EnvironmentKind;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, HarnessError>;

#[derive(Error, Debug)]
pub enum HarnessError {
    /// Bad constructor arguments or an invalid experiment file.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A learner requires a different environment than the one supplied.
    #[error(
        "learner {learner} can not recognize environment {environment} \
         (requires {required:?}, found {found:?})"
    )]
    IncompatibleEnvironment {
        learner: String,
        environment: String,
        required: EnvironmentKind,
        found: EnvironmentKind,
    },

    /// The environment cannot evaluate the requested goal.
    #[error("environment {environment} does not support {goal} evaluation")]
    UnsupportedGoal {
        environment: String,
        goal: &'static str,
    },

    /// Out-of-range index, cardinality violation, budget overrun or
    /// feedback that does not line up with the last action.
    #[error("invalid action: {0}")]
    InvalidAction(String),

    /// A result was queried before the learner terminated, or a learner
    /// was driven before `reset()`.
    #[error("{0}")]
    NotReady(String),

    /// A worker job panicked while running a trial.
    #[error("trial panicked: {0}")]
    TrialPanicked(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl HarnessError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        HarnessError::Configuration(msg.into())
    }

    pub(crate) fn invalid_action(msg: impl Into<String>) -> Self {
        HarnessError::InvalidAction(msg.into())
    }
}
