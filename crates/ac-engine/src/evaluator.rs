use ac_types::metrics;
use ac_types::{
    AcError, AcResult, FeatureMatrix, FittedModel, Metric, SearchOracle, TargetValue, TaskType,
};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Independent score of the returned model on the evaluation partition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub metric: Metric,
    pub score: f64,
}

/// Read-only scoring of a fitted model: exact-match accuracy for
/// classification, the oracle's own scoring routine for regression.
/// Either failing is reported as the oracle's failure, since the model
/// is the oracle's output.
pub struct Evaluator<'a> {
    oracle: &'a dyn SearchOracle,
}

impl<'a> Evaluator<'a> {
    pub fn new(oracle: &'a dyn SearchOracle) -> Self {
        Self { oracle }
    }

    pub fn evaluate(
        &self,
        model: &FittedModel,
        task_type: TaskType,
        features: &FeatureMatrix,
        target: &[TargetValue],
    ) -> AcResult<Evaluation> {
        let evaluation = match task_type {
            TaskType::Classification => {
                let predicted = model
                    .predict(features)
                    .map_err(|e| AcError::search_failed(self.oracle.name(), e.into()))?;
                Evaluation {
                    metric: Metric::Accuracy,
                    score: metrics::accuracy(target, &predicted),
                }
            }
            TaskType::Regression => Evaluation {
                metric: Metric::R2,
                score: self
                    .oracle
                    .score(model, features, target)
                    .map_err(|e| AcError::search_failed(self.oracle.name(), e))?,
            },
        };
        info!(
            "Held-out {} on {} rows: {:.4}",
            evaluation.metric,
            features.n_rows(),
            evaluation.score
        );
        Ok(evaluation)
    }
}
