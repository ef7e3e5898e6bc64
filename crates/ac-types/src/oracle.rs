//! Contracts for the two external collaborators: the search oracle and the
//! attribution capability.

use crate::dataset::{FeatureMatrix, TargetValue};
use crate::errors::{AttributionError, OracleError};
use crate::explanation::Explanation;
use crate::metrics;
use crate::model::{Estimator, FittedModel, SearchResult};
use crate::task::SearchRequest;

/// Explores candidate algorithms within a time budget and returns the best
/// fitted model found.
///
/// The budget is advisory: implementations should return close to it but
/// callers do not preempt them.
pub trait SearchOracle: Send + Sync {
    fn name(&self) -> &str;

    fn search(&self, request: &SearchRequest) -> Result<SearchResult, OracleError>;

    /// The oracle's own scoring routine for regression models (R²).
    fn score(
        &self,
        model: &FittedModel,
        features: &FeatureMatrix,
        target: &[TargetValue],
    ) -> Result<f64, OracleError> {
        let predicted = model.predict(features)?;
        let actual = numeric_values(target)?;
        let predicted = numeric_values(&predicted)?;
        Ok(metrics::r2(&actual, &predicted))
    }
}

fn numeric_values(values: &[TargetValue]) -> Result<Vec<f64>, OracleError> {
    values
        .iter()
        .map(|v| {
            v.as_f64().ok_or_else(|| OracleError::Scoring {
                message: format!("non-numeric value {v} in regression scoring"),
            })
        })
        .collect()
}

/// Model-agnostic feature attribution.
pub trait Attributor: Send + Sync {
    fn name(&self) -> &str;

    /// Attribute the model's output on `rows` against `background` data.
    fn explain(
        &self,
        model: &dyn Estimator,
        background: &FeatureMatrix,
        rows: &FeatureMatrix,
    ) -> Result<Explanation, AttributionError>;
}
