//! Task types, user constraints and the search request handed to an oracle.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::dataset::{FeatureMatrix, TargetValue};
use crate::errors::{AcError, AcResult};

/// Whether the target is a discrete label or a continuous quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Classification,
    Regression,
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Classification => write!(f, "classification"),
            Self::Regression => write!(f, "regression"),
        }
    }
}

/// User constraints for one run. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    time_budget: Duration,
    interpretable: bool,
}

impl Constraint {
    pub fn new(time_budget: Duration, interpretable: bool) -> AcResult<Self> {
        if time_budget.is_zero() {
            return Err(AcError::Validation(
                "time budget must be a positive duration".to_string(),
            ));
        }
        Ok(Self {
            time_budget,
            interpretable,
        })
    }

    pub fn from_secs(seconds: u64, interpretable: bool) -> AcResult<Self> {
        Self::new(Duration::from_secs(seconds), interpretable)
    }

    pub fn time_budget(&self) -> Duration {
        self.time_budget
    }

    /// Whether the user prefers inherently interpretable models.
    pub fn interpretable(&self) -> bool {
        self.interpretable
    }
}

/// Allowed range for a user-supplied time budget, in whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintBounds {
    pub min_secs: u64,
    pub max_secs: u64,
    pub default_secs: u64,
}

impl Default for ConstraintBounds {
    fn default() -> Self {
        Self {
            min_secs: 10,
            max_secs: 300,
            default_secs: 60,
        }
    }
}

impl ConstraintBounds {
    pub fn clamp(&self, seconds: u64) -> Duration {
        Duration::from_secs(seconds.clamp(self.min_secs, self.max_secs))
    }

    pub fn default_budget(&self) -> Duration {
        self.clamp(self.default_secs)
    }
}

/// A learner family the search oracle may select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Algorithm {
    /// L1-regularized linear / logistic model.
    #[serde(rename = "lrl1")]
    LinearL1,
    /// L2-regularized linear / logistic model.
    #[serde(rename = "lrl2")]
    LinearL2,
    #[serde(rename = "knn")]
    NearestNeighbors,
    #[serde(rename = "tree")]
    DecisionTree,
}

impl Algorithm {
    pub const ALL: [Algorithm; 4] = [
        Algorithm::LinearL1,
        Algorithm::LinearL2,
        Algorithm::NearestNeighbors,
        Algorithm::DecisionTree,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Self::LinearL1 => "lrl1",
            Self::LinearL2 => "lrl2",
            Self::NearestNeighbors => "knn",
            Self::DecisionTree => "tree",
        }
    }

    /// Linear models expose their decision logic directly.
    pub fn is_interpretable(&self) -> bool {
        matches!(self, Self::LinearL1 | Self::LinearL2)
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Algorithm {
    type Err = AcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.id() == s)
            .ok_or_else(|| AcError::Validation(format!("unknown algorithm: {s}")))
    }
}

/// Candidate algorithms for a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSet {
    Restricted(Vec<Algorithm>),
    /// Let the oracle use its full default catalog.
    Unrestricted,
}

impl CandidateSet {
    pub fn is_restricted(&self) -> bool {
        matches!(self, Self::Restricted(_))
    }
}

/// Scoring metric. Both variants are higher-is-better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Accuracy,
    R2,
}

impl Metric {
    pub fn id(&self) -> &'static str {
        match self {
            Self::Accuracy => "accuracy",
            Self::R2 => "r2",
        }
    }

    /// Human-readable label used when reporting a score.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Accuracy => "Accuracy",
            Self::R2 => "R2 Score",
        }
    }

    pub fn task_type(&self) -> TaskType {
        match self {
            Self::Accuracy => TaskType::Classification,
            Self::R2 => TaskType::Regression,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Candidate set and metric for a search; fully determined by task type
/// and constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSpace {
    pub candidates: CandidateSet,
    pub metric: Metric,
}

/// Everything an oracle needs for one time-budgeted search.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub features: FeatureMatrix,
    pub target: Vec<TargetValue>,
    pub time_budget: Duration,
    pub metric: Metric,
    pub task_type: TaskType,
    pub candidates: CandidateSet,
}
