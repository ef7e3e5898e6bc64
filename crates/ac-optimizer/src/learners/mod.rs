//! Reference learners available to the local search oracle.

mod imputation;
mod knn;
mod linear;
mod scaling;
mod tree;

pub use imputation::{Imputed, MeanImputer};
pub use knn::{NearestNeighbors, Weighting};
pub use linear::{LinearModel, Penalty};
pub use scaling::Standardizer;
pub use tree::DecisionTree;

use ac_types::{Algorithm, Estimator, FeatureMatrix, ModelError};

use crate::search::{ParameterSet, ParameterSpace};

/// What a learner is asked to predict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LearnerTask {
    Regression,
    /// Targets are class indices in `0..n_classes`.
    Classification { n_classes: usize },
}

impl LearnerTask {
    /// Width of `predict_scores` rows.
    pub fn outputs(&self) -> usize {
        match self {
            Self::Regression => 1,
            Self::Classification { n_classes } => *n_classes,
        }
    }
}

/// Hyper-parameter space of `algorithm` for a training set of `n_rows` rows.
pub fn parameter_space(algorithm: Algorithm, n_rows: usize) -> ParameterSpace {
    match algorithm {
        Algorithm::LinearL1 | Algorithm::LinearL2 => {
            ParameterSpace::new().add_log_uniform("alpha", 1e-4, 1.0)
        }
        Algorithm::NearestNeighbors => ParameterSpace::new()
            .add_int("k", 1, n_rows.clamp(1, 15) as i64)
            .add_choice(
                "weights",
                vec![
                    serde_json::json!("uniform"),
                    serde_json::json!("distance"),
                ],
            ),
        Algorithm::DecisionTree => ParameterSpace::new()
            .add_int("max_depth", 1, 12)
            .add_int("min_samples_leaf", 1, (n_rows / 4).clamp(1, 10) as i64),
    }
}

/// Build an unfitted estimator from a sampled configuration. Missing
/// feature values are mean-imputed ahead of every learner.
pub fn build(
    algorithm: Algorithm,
    task: LearnerTask,
    params: &ParameterSet,
) -> Result<Box<dyn Estimator>, ModelError> {
    let estimator: Box<dyn Estimator> = match algorithm {
        Algorithm::LinearL1 => Box::new(LinearModel::new(
            Penalty::L1,
            float_param(params, "alpha", 1e-2)?,
            task,
        )),
        Algorithm::LinearL2 => Box::new(LinearModel::new(
            Penalty::L2,
            float_param(params, "alpha", 1e-2)?,
            task,
        )),
        Algorithm::NearestNeighbors => {
            let weighting = match params.get("weights").and_then(|v| v.as_str()) {
                Some("distance") => Weighting::Distance,
                _ => Weighting::Uniform,
            };
            Box::new(NearestNeighbors::new(
                usize_param(params, "k", 5)?,
                weighting,
                task,
            ))
        }
        Algorithm::DecisionTree => Box::new(DecisionTree::new(
            usize_param(params, "max_depth", 6)?,
            usize_param(params, "min_samples_leaf", 1)?,
            task,
        )),
    };
    Ok(Box::new(Imputed::new(estimator)))
}

fn float_param(params: &ParameterSet, name: &str, default: f64) -> Result<f64, ModelError> {
    match params.get(name) {
        None => Ok(default),
        Some(value) => value
            .as_f64()
            .filter(|v| v.is_finite() && *v >= 0.0)
            .ok_or_else(|| ModelError::InvalidParameter {
                name: name.to_string(),
                message: format!("expected a non-negative number, got {value}"),
            }),
    }
}

fn usize_param(params: &ParameterSet, name: &str, default: usize) -> Result<usize, ModelError> {
    match params.get(name) {
        None => Ok(default),
        Some(value) => value
            .as_i64()
            .filter(|v| *v >= 1)
            .map(|v| v as usize)
            .ok_or_else(|| ModelError::InvalidParameter {
                name: name.to_string(),
                message: format!("expected a positive integer, got {value}"),
            }),
    }
}

/// Shared precondition for `fit`.
pub(crate) fn check_training(
    model: &str,
    features: &FeatureMatrix,
    target: &[f64],
) -> Result<(), ModelError> {
    if features.is_empty() {
        return Err(ModelError::EmptyTrainingSet {
            model: model.to_string(),
        });
    }
    if target.len() != features.n_rows() {
        return Err(ModelError::TargetLengthMismatch {
            expected: features.n_rows(),
            actual: target.len(),
        });
    }
    Ok(())
}

/// Shared precondition for `predict`.
pub(crate) fn check_features(expected: usize, features: &FeatureMatrix) -> Result<(), ModelError> {
    if features.n_features() != expected {
        return Err(ModelError::FeatureCountMismatch {
            expected,
            actual: features.n_features(),
        });
    }
    Ok(())
}

/// Convert a class-index target value, rejecting out-of-range labels.
pub(crate) fn class_index(value: f64, n_classes: usize) -> Result<usize, ModelError> {
    let index = value.round();
    if index < 0.0 || index as usize >= n_classes {
        return Err(ModelError::UnknownClass {
            index: index.max(0.0) as usize,
        });
    }
    Ok(index as usize)
}

/// Index of the largest score; the first one wins ties.
pub fn argmax(scores: &[f64]) -> usize {
    let mut best = 0;
    for (i, s) in scores.iter().enumerate() {
        if *s > scores[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{ParameterValue, RandomSearch, SearchStrategy};
    use std::collections::HashMap;

    #[test]
    fn every_algorithm_builds_from_sampled_parameters() {
        let task = LearnerTask::Classification { n_classes: 3 };
        for algorithm in Algorithm::ALL {
            let mut search = RandomSearch::new(parameter_space(algorithm, 100), 9);
            for params in search.suggest(5) {
                let estimator = build(algorithm, task, &params).unwrap();
                assert!(estimator.name().starts_with(algorithm.id()));
            }
        }
    }

    #[test]
    fn small_training_sets_shrink_ranges() {
        let space = parameter_space(Algorithm::NearestNeighbors, 3);
        let mut search = RandomSearch::new(space, 1);
        for params in search.suggest(20) {
            let k = params.get("k").and_then(ParameterValue::as_i64).unwrap();
            assert!((1..=3).contains(&k));
        }
    }

    #[test]
    fn rejects_invalid_parameters() {
        let mut params = HashMap::new();
        params.insert("k".to_string(), ParameterValue::Int(0));
        let err = build(Algorithm::NearestNeighbors, LearnerTask::Regression, &params).unwrap_err();
        assert!(matches!(err, ModelError::InvalidParameter { .. }));
    }

    #[test]
    fn argmax_prefers_first_on_ties() {
        assert_eq!(argmax(&[0.2, 0.4, 0.4]), 1);
        assert_eq!(argmax(&[1.0]), 0);
    }

    #[test]
    fn class_index_bounds() {
        assert_eq!(class_index(2.0, 3).unwrap(), 2);
        assert!(class_index(3.0, 3).is_err());
        assert!(class_index(-1.0, 3).is_err());
    }
}
