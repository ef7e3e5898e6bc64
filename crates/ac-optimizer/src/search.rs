//! Hyper-parameter space definitions and sampling strategies.

use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single parameter dimension in the search space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDef {
    /// Human-readable parameter name (e.g. "max_depth").
    pub name: String,
    /// The kind of search range.
    pub kind: ParameterKind,
}

/// Describes how a parameter is sampled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParameterKind {
    /// Continuous uniform range [low, high].
    FloatRange { low: f64, high: f64 },
    /// Integer range [low, high] inclusive.
    IntRange { low: i64, high: i64 },
    /// Log-uniform range (sampled in log-space then exponentiated).
    LogUniform { low: f64, high: f64 },
    /// Categorical choices.
    Choice { values: Vec<serde_json::Value> },
}

/// A concrete parameter value produced by a search strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Float(f64),
    Int(i64),
    Json(serde_json::Value),
}

impl ParameterValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            Self::Json(v) => v.as_f64(),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Float(_) => None,
            Self::Json(v) => v.as_i64(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Json(v) => v.as_str(),
            _ => None,
        }
    }
}

impl std::fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Float(v) => write!(f, "{v:.4}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Json(serde_json::Value::String(s)) => write!(f, "{s}"),
            Self::Json(v) => write!(f, "{v}"),
        }
    }
}

/// A sampled configuration: parameter name to value.
pub type ParameterSet = HashMap<String, ParameterValue>;

/// The parameter space of one learner: an ordered list of parameter definitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpace {
    pub parameters: Vec<ParameterDef>,
}

impl ParameterSpace {
    pub fn new() -> Self {
        Self {
            parameters: Vec::new(),
        }
    }

    pub fn add_float(mut self, name: impl Into<String>, low: f64, high: f64) -> Self {
        self.parameters.push(ParameterDef {
            name: name.into(),
            kind: ParameterKind::FloatRange { low, high },
        });
        self
    }

    pub fn add_int(mut self, name: impl Into<String>, low: i64, high: i64) -> Self {
        self.parameters.push(ParameterDef {
            name: name.into(),
            kind: ParameterKind::IntRange { low, high },
        });
        self
    }

    pub fn add_log_uniform(mut self, name: impl Into<String>, low: f64, high: f64) -> Self {
        self.parameters.push(ParameterDef {
            name: name.into(),
            kind: ParameterKind::LogUniform { low, high },
        });
        self
    }

    pub fn add_choice(mut self, name: impl Into<String>, values: Vec<serde_json::Value>) -> Self {
        self.parameters.push(ParameterDef {
            name: name.into(),
            kind: ParameterKind::Choice { values },
        });
        self
    }
}

impl Default for ParameterSpace {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Search strategies
// ---------------------------------------------------------------------------

/// Common trait for all search strategies.
pub trait SearchStrategy: Send + Sync {
    /// Generate the next batch of parameter combinations to evaluate.
    fn suggest(&mut self, count: usize) -> Vec<ParameterSet>;

    /// Report completed trial results so adaptive strategies can learn.
    fn report(&mut self, _params: &ParameterSet, _objective: f64) {}

    /// Human-readable strategy name.
    fn name(&self) -> &str;
}

fn sample_parameter<R: Rng>(kind: &ParameterKind, rng: &mut R) -> Option<ParameterValue> {
    let value = match kind {
        ParameterKind::FloatRange { low, high } => ParameterValue::Float(rng.random_range(*low..=*high)),
        ParameterKind::IntRange { low, high } => ParameterValue::Int(rng.random_range(*low..=*high)),
        ParameterKind::LogUniform { low, high } => {
            let log_val: f64 = rng.random_range(low.ln()..=high.ln());
            ParameterValue::Float(log_val.exp())
        }
        ParameterKind::Choice { values } => ParameterValue::Json(values.choose(rng)?.clone()),
    };
    Some(value)
}

fn sample_space<R: Rng>(space: &ParameterSpace, rng: &mut R) -> ParameterSet {
    space
        .parameters
        .iter()
        .filter_map(|param| sample_parameter(&param.kind, rng).map(|v| (param.name.clone(), v)))
        .collect()
}

// ---- Random search ----

/// Independent, seeded random sampling across the parameter space.
#[derive(Debug, Clone)]
pub struct RandomSearch {
    space: ParameterSpace,
    rng: ChaCha8Rng,
}

impl RandomSearch {
    pub fn new(space: ParameterSpace, seed: u64) -> Self {
        Self {
            space,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl SearchStrategy for RandomSearch {
    fn suggest(&mut self, count: usize) -> Vec<ParameterSet> {
        (0..count)
            .map(|_| sample_space(&self.space, &mut self.rng))
            .collect()
    }

    fn name(&self) -> &str {
        "random"
    }
}

// ---- Adaptive search ----

/// Explore/exploit search: with probability `exploration_weight` (or while
/// nothing has been observed) sample the space at random, otherwise perturb
/// the best configuration seen so far.
#[derive(Debug, Clone)]
pub struct AdaptiveSearch {
    space: ParameterSpace,
    rng: ChaCha8Rng,
    observations: Vec<(ParameterSet, f64)>,
    exploration_weight: f64,
}

impl AdaptiveSearch {
    pub fn new(space: ParameterSpace, exploration_weight: f64, seed: u64) -> Self {
        Self {
            space,
            rng: ChaCha8Rng::seed_from_u64(seed),
            observations: Vec::new(),
            exploration_weight,
        }
    }

    pub fn observations(&self) -> usize {
        self.observations.len()
    }

    /// Pure exploration sample (same as random).
    fn explore(&mut self) -> ParameterSet {
        sample_space(&self.space, &mut self.rng)
    }

    /// Exploitation: perturb the best-known point.
    fn exploit(&mut self) -> ParameterSet {
        let best = self
            .observations
            .iter()
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(params, _)| params.clone());

        let base = match best {
            Some(params) => params,
            None => return self.explore(),
        };

        let mut perturbed = HashMap::new();
        for param in &self.space.parameters {
            let rng = &mut self.rng;
            let value = match (&param.kind, base.get(&param.name)) {
                (ParameterKind::FloatRange { low, high }, Some(ParameterValue::Float(v))) => {
                    let noise = rng.random_range(-0.1..0.1) * (high - low);
                    Some(ParameterValue::Float((v + noise).clamp(*low, *high)))
                }
                (ParameterKind::IntRange { low, high }, Some(ParameterValue::Int(v))) => {
                    let delta: i64 = rng.random_range(-2..=2);
                    Some(ParameterValue::Int((v + delta).clamp(*low, *high)))
                }
                (ParameterKind::LogUniform { low, high }, Some(ParameterValue::Float(v))) => {
                    let log_range = high.ln() - low.ln();
                    let noise = rng.random_range(-0.1..0.1) * log_range;
                    Some(ParameterValue::Float((v.ln() + noise).exp().clamp(*low, *high)))
                }
                // Fall back to random for choices or missing base
                (kind, _) => sample_parameter(kind, rng),
            };
            if let Some(value) = value {
                perturbed.insert(param.name.clone(), value);
            }
        }

        perturbed
    }
}

impl SearchStrategy for AdaptiveSearch {
    fn suggest(&mut self, count: usize) -> Vec<ParameterSet> {
        (0..count)
            .map(|_| {
                if self.observations.is_empty()
                    || self.rng.random::<f64>() < self.exploration_weight
                {
                    self.explore()
                } else {
                    self.exploit()
                }
            })
            .collect()
    }

    fn report(&mut self, params: &ParameterSet, objective: f64) {
        self.observations.push((params.clone(), objective));
    }

    fn name(&self) -> &str {
        "adaptive"
    }
}
