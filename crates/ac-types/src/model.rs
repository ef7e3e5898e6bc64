//! Estimator contract and the fitted-model shapes an oracle can return.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::dataset::{FeatureMatrix, TargetValue};
use crate::errors::ModelError;

/// What an estimator can currently do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub fit: bool,
    pub predict: bool,
}

impl Capabilities {
    pub const FULL: Capabilities = Capabilities {
        fit: true,
        predict: true,
    };

    pub fn supports_fit_and_predict(&self) -> bool {
        self.fit && self.predict
    }
}

/// A learner operating on numeric features and numeric targets.
///
/// Classifiers are trained on class indices (`0.0, 1.0, ...`); `predict`
/// returns a class index and `predict_scores` one probability per class.
/// Regressors return a single score per row.
pub trait Estimator: Send + Sync + fmt::Debug {
    /// Human-readable identifier, including the chosen hyper-parameters.
    fn name(&self) -> String;

    fn capabilities(&self) -> Capabilities {
        Capabilities::FULL
    }

    fn fit(&mut self, features: &FeatureMatrix, target: &[f64]) -> Result<(), ModelError>;

    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<f64>, ModelError>;

    fn predict_scores(&self, features: &FeatureMatrix) -> Result<Vec<Vec<f64>>, ModelError> {
        Ok(self
            .predict(features)?
            .into_iter()
            .map(|v| vec![v])
            .collect())
    }
}

/// Maps native class labels to contiguous indices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<TargetValue>,
}

impl LabelEncoder {
    /// Collect the sorted distinct non-missing labels.
    pub fn fit(values: &[TargetValue]) -> Self {
        let mut classes: Vec<TargetValue> = Vec::new();
        for value in values.iter().filter(|v| !v.is_missing()) {
            if !classes.contains(value) {
                classes.push(value.clone());
            }
        }
        classes.sort_by(|a, b| a.total_cmp(b));
        Self { classes }
    }

    pub fn classes(&self) -> &[TargetValue] {
        &self.classes
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    pub fn encode(&self, value: &TargetValue) -> Option<usize> {
        self.classes.iter().position(|c| c == value)
    }

    pub fn decode(&self, index: usize) -> Option<&TargetValue> {
        self.classes.get(index)
    }
}

/// A model returned by a search oracle.
///
/// Classification models are wrapped so the inner estimator can work on
/// class indices while callers see labels in their native form.
#[derive(Debug)]
pub enum FittedModel {
    Direct(Box<dyn Estimator>),
    Wrapped {
        encoder: LabelEncoder,
        estimator: Box<dyn Estimator>,
    },
}

impl FittedModel {
    /// The base estimator, unwrapped if necessary.
    pub fn estimator(&self) -> &dyn Estimator {
        match self {
            Self::Direct(estimator) => estimator.as_ref(),
            Self::Wrapped { estimator, .. } => estimator.as_ref(),
        }
    }

    pub fn is_wrapped(&self) -> bool {
        matches!(self, Self::Wrapped { .. })
    }

    /// Best-model identifier shown to the user.
    pub fn name(&self) -> String {
        self.estimator().name()
    }

    /// Predict target values in their native form.
    pub fn predict(&self, features: &FeatureMatrix) -> Result<Vec<TargetValue>, ModelError> {
        let raw = self.estimator().predict(features)?;
        match self {
            Self::Direct(_) => Ok(raw.into_iter().map(TargetValue::Number).collect()),
            Self::Wrapped { encoder, .. } => raw
                .into_iter()
                .map(|v| {
                    let index = v.max(0.0).round() as usize;
                    encoder
                        .decode(index)
                        .cloned()
                        .ok_or(ModelError::UnknownClass { index })
                })
                .collect(),
        }
    }
}

/// Outcome of a successful search.
#[derive(Debug)]
pub struct SearchResult {
    pub model: FittedModel,
    /// Score the oracle measured internally; not the reported score.
    pub internal_score: f64,
    pub trials: usize,
}
