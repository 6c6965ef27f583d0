//! banditlab core library.
//!
//! This crate exposes bandit environments, learners, and the protocol that
//! plays many independent trials of each learner in parallel and streams one
//! JSON record per trial and swept parameter value. The binary
//! (`src/main.rs`) is a thin harness that loads a YAML experiment and calls
//! `Protocol::play`.

pub mod config;
pub mod environment;
pub mod error;
pub mod estimator;
pub mod learner;
pub mod logging;
pub mod metrics;
pub mod oracle;
pub mod protocol;
pub mod types;

// --- Re-exports for ergonomic external use ---------------------------------

pub use config::{EnvironmentSpec, ExperimentSpec, LearnerSpec, OneOrMany, RunConfig};

pub use environment::{
    Arm, Environment, EnvironmentKind, LinearBandit, MnlBandit, OrdinaryBandit,
};

pub use error::{HarnessError, Result};

pub use estimator::EmpiricalArm;

pub use learner::{
    Answer, EpsGreedy, Goal, Learner, LearnerState, Prior, SuccessiveElimination,
    SuccessiveRejects, ThompsonSampling, Uniform,
};

pub use logging::{init_logging, LogFormat};

pub use metrics::OutcomeSummary;

pub use oracle::{local_search_best_assortment, search, search_best_assortment, MeanReward};

pub use protocol::{
    read_results, FileSink, MemorySink, PlaySummary, Protocol, ResultSink, Sweep, TrialResult,
};

pub use types::{Action, ActionList, Assortment, Batch, Choice, Context, Feedback, NO_PURCHASE};
