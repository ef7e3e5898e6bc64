//! Feature-attribution explanations and the soft "unavailable" outcome.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Attribution values of one feature across the explained rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureAttribution {
    pub feature: String,
    pub values: Vec<f64>,
}

impl FeatureAttribution {
    pub fn mean_abs(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.values.iter().map(|v| v.abs()).sum::<f64>() / self.values.len() as f64
    }
}

/// Per-feature attribution distributions over the evaluation rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    /// Expected model output over the background data, per explained row.
    pub base_values: Vec<f64>,
    /// One entry per feature, in feature order.
    pub attributions: Vec<FeatureAttribution>,
}

impl Explanation {
    pub fn n_rows(&self) -> usize {
        self.base_values.len()
    }

    pub fn get(&self, feature: &str) -> Option<&[f64]> {
        self.attributions
            .iter()
            .find(|a| a.feature == feature)
            .map(|a| a.values.as_slice())
    }

    /// Features ordered by mean absolute attribution, largest first.
    pub fn ranked(&self) -> Vec<(&str, f64)> {
        let mut ranked: Vec<(&str, f64)> = self
            .attributions
            .iter()
            .map(|a| (a.feature.as_str(), a.mean_abs()))
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        ranked
    }
}

/// Why an explanation was withheld. Never fails the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplanationUnavailable {
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExplanationOutcome {
    Available(Explanation),
    Unavailable(ExplanationUnavailable),
}

impl ExplanationOutcome {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable(ExplanationUnavailable {
            reason: reason.into(),
        })
    }

    pub fn explanation(&self) -> Option<&Explanation> {
        match self {
            Self::Available(explanation) => Some(explanation),
            Self::Unavailable(_) => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }
}
