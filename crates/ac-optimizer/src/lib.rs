//! # ac-optimizer
//!
//! Time-budgeted model search for ACAML.
//!
//! Provides hyper-parameter spaces and sampling strategies (random,
//! adaptive), trial tracking, the reference learners, and
//! [`LocalSearchOracle`], the in-process implementation of the search
//! oracle contract.

pub mod learners;
mod oracle;
mod search;
mod trial;

pub use learners::LearnerTask;
pub use oracle::{LocalSearchOracle, OracleConfig, StrategyKind};
pub use search::{
    AdaptiveSearch, ParameterDef, ParameterKind, ParameterSet, ParameterSpace, ParameterValue,
    RandomSearch, SearchStrategy,
};
pub use trial::{SearchId, SearchState, SearchStatus, Trial, TrialResult, TrialStatus};
