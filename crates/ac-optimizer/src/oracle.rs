//! In-process search oracle: round-robin hyper-parameter search over the
//! reference learners, bounded by the request's time budget.

use std::time::Instant;

use ac_types::metrics;
use ac_types::{
    Algorithm, CandidateSet, FeatureMatrix, FittedModel, LabelEncoder, ModelError, OracleError,
    SearchOracle, SearchRequest, SearchResult, TaskType,
};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::learners::{self, LearnerTask};
use crate::search::{AdaptiveSearch, RandomSearch, SearchStrategy};
use crate::trial::{SearchStatus, Trial};

/// How each candidate's parameter space is sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Random,
    Adaptive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// Hard cap on trials regardless of remaining budget.
    pub max_trials: usize,
    /// Trials run even when the budget is already spent.
    pub min_trials: usize,
    /// Fraction of the training partition held out to score trials.
    pub holdout_ratio: f64,
    pub seed: u64,
    pub strategy: StrategyKind,
    pub exploration_weight: f64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            max_trials: 200,
            min_trials: 1,
            holdout_ratio: 0.2,
            seed: 42,
            strategy: StrategyKind::Adaptive,
            exploration_weight: 0.3,
        }
    }
}

/// Training data after validation, in the learners' numeric encoding.
struct Prepared {
    task: LearnerTask,
    encoder: Option<LabelEncoder>,
    target: Vec<f64>,
}

/// Fit and holdout partitions of the training data.
struct Holdout {
    fit_x: FeatureMatrix,
    fit_y: Vec<f64>,
    eval_x: FeatureMatrix,
    eval_y: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct LocalSearchOracle {
    config: OracleConfig,
    catalog: Vec<Algorithm>,
}

impl LocalSearchOracle {
    pub fn new(config: OracleConfig) -> Self {
        Self {
            config,
            catalog: Algorithm::ALL.to_vec(),
        }
    }

    /// Replace the catalog used for unrestricted searches.
    pub fn with_catalog(mut self, catalog: Vec<Algorithm>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    fn prepare(&self, request: &SearchRequest) -> Result<Prepared, OracleError> {
        let features = &request.features;
        if features.is_empty() || request.target.is_empty() {
            return Err(OracleError::EmptyTrainingSet);
        }
        if features.n_rows() != request.target.len() {
            return Err(OracleError::ShapeMismatch {
                features: features.n_rows(),
                targets: request.target.len(),
            });
        }
        if features.has_infinite() {
            return Err(OracleError::MalformedData {
                message: "features contain infinite values".to_string(),
            });
        }
        if request.metric.task_type() != request.task_type {
            return Err(OracleError::Infeasible {
                message: format!(
                    "metric {} does not apply to {} tasks",
                    request.metric, request.task_type
                ),
            });
        }
        if let Some(row) = request.target.iter().position(|v| v.is_missing()) {
            return Err(OracleError::MalformedData {
                message: format!("target value missing at row {row}"),
            });
        }

        match request.task_type {
            TaskType::Classification => {
                let encoder = LabelEncoder::fit(&request.target);
                if encoder.n_classes() < 2 {
                    return Err(OracleError::Infeasible {
                        message: format!(
                            "classification needs at least 2 classes, found {}",
                            encoder.n_classes()
                        ),
                    });
                }
                let target = request
                    .target
                    .iter()
                    .map(|v| {
                        encoder.encode(v).map(|i| i as f64).ok_or_else(|| {
                            OracleError::MalformedData {
                                message: format!("label {v} is not encodable"),
                            }
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Prepared {
                    task: LearnerTask::Classification {
                        n_classes: encoder.n_classes(),
                    },
                    encoder: Some(encoder),
                    target,
                })
            }
            TaskType::Regression => {
                let target = request
                    .target
                    .iter()
                    .map(|v| {
                        v.as_f64().filter(|y| y.is_finite()).ok_or_else(|| {
                            OracleError::MalformedData {
                                message: format!("regression target {v} is not numeric"),
                            }
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Prepared {
                    task: LearnerTask::Regression,
                    encoder: None,
                    target,
                })
            }
        }
    }

    fn candidates(&self, candidates: &CandidateSet) -> Result<Vec<Algorithm>, OracleError> {
        let algorithms = match candidates {
            CandidateSet::Restricted(list) => list.clone(),
            CandidateSet::Unrestricted => self.catalog.clone(),
        };
        if algorithms.is_empty() {
            return Err(OracleError::Infeasible {
                message: "candidate set is empty".to_string(),
            });
        }
        Ok(algorithms)
    }

    /// Seeded holdout split. Falls back to scoring on the training data when
    /// either side would be empty.
    fn holdout(&self, features: &FeatureMatrix, target: &[f64]) -> Holdout {
        let n = features.n_rows();
        let n_eval = (n as f64 * self.config.holdout_ratio).ceil() as usize;
        if n_eval == 0 || n_eval >= n {
            return Holdout {
                fit_x: features.clone(),
                fit_y: target.to_vec(),
                eval_x: features.clone(),
                eval_y: target.to_vec(),
            };
        }

        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(&mut ChaCha8Rng::seed_from_u64(self.config.seed));
        let (eval, fit) = order.split_at(n_eval);
        Holdout {
            fit_x: features.select_rows(fit),
            fit_y: fit.iter().map(|&i| target[i]).collect(),
            eval_x: features.select_rows(eval),
            eval_y: eval.iter().map(|&i| target[i]).collect(),
        }
    }

    fn strategy(&self, algorithm: Algorithm, n_rows: usize, index: usize) -> Box<dyn SearchStrategy> {
        let space = learners::parameter_space(algorithm, n_rows);
        let seed = self.config.seed.wrapping_add(index as u64);
        match self.config.strategy {
            StrategyKind::Random => Box::new(RandomSearch::new(space, seed)),
            StrategyKind::Adaptive => Box::new(AdaptiveSearch::new(
                space,
                self.config.exploration_weight,
                seed,
            )),
        }
    }
}

impl Default for LocalSearchOracle {
    fn default() -> Self {
        Self::new(OracleConfig::default())
    }
}

/// Fit on the fit partition and score on the holdout.
fn run_trial(
    algorithm: Algorithm,
    task: LearnerTask,
    trial: &Trial,
    holdout: &Holdout,
) -> Result<f64, ModelError> {
    let mut estimator = learners::build(algorithm, task, &trial.parameters)?;
    estimator.fit(&holdout.fit_x, &holdout.fit_y)?;
    let predicted = estimator.predict(&holdout.eval_x)?;

    let objective = match task {
        LearnerTask::Classification { .. } => metrics::accuracy(&holdout.eval_y, &predicted),
        LearnerTask::Regression => metrics::r2(&holdout.eval_y, &predicted),
    };
    if !objective.is_finite() {
        return Err(ModelError::Diverged {
            model: estimator.name(),
        });
    }
    Ok(objective)
}

impl SearchOracle for LocalSearchOracle {
    fn name(&self) -> &str {
        "local"
    }

    fn search(&self, request: &SearchRequest) -> Result<SearchResult, OracleError> {
        let prepared = self.prepare(request)?;
        let algorithms = self.candidates(&request.candidates)?;
        let holdout = self.holdout(&request.features, &prepared.target);

        let deadline = Instant::now().checked_add(request.time_budget);
        let mut status = SearchStatus::new(request.metric);
        status.mark_running();
        info!(
            "Searching {} candidates for up to {:?} ({} rows, metric {})",
            algorithms.len(),
            request.time_budget,
            request.features.n_rows(),
            request.metric
        );

        let mut strategies: Vec<(Algorithm, Box<dyn SearchStrategy>)> = algorithms
            .iter()
            .enumerate()
            .map(|(i, &a)| (a, self.strategy(a, holdout.fit_x.n_rows(), i)))
            .collect();

        let mut trial_number = 0;
        while trial_number < self.config.max_trials
            && (trial_number < self.config.min_trials
                || deadline.map_or(true, |d| Instant::now() < d))
        {
            let slot = trial_number % strategies.len();
            let (algorithm, strategy) = &mut strategies[slot];
            let params = strategy.suggest(1).into_iter().next().unwrap_or_default();

            let mut trial = Trial::new(status.id, trial_number, *algorithm, params);
            trial.mark_running();
            match run_trial(*algorithm, prepared.task, &trial, &holdout) {
                Ok(objective) => {
                    strategy.report(&trial.parameters, objective);
                    trial.mark_completed(objective);
                    debug!("Trial {} {}: {:.4}", trial_number, algorithm, objective);
                }
                Err(e) => {
                    debug!("Trial {} {} failed: {}", trial_number, algorithm, e);
                    trial.mark_failed(e.to_string());
                }
            }
            status.record(&trial);
            trial_number += 1;
        }

        let Some(best) = status.best_trial.clone() else {
            let last_error = status
                .last_error
                .clone()
                .unwrap_or_else(|| "no trial ran".to_string());
            status.mark_failed(last_error.clone());
            warn!("Search failed after {} trials", status.trials_attempted());
            return Err(OracleError::NoCandidateConverged {
                attempted: status.trials_attempted(),
                last_error,
            });
        };

        let mut estimator = learners::build(best.algorithm, prepared.task, &best.parameters)?;
        estimator.fit(&request.features, &prepared.target)?;
        status.mark_completed();
        info!(
            "Best model {} scored {:.4} on the internal holdout ({} trials, {} failed)",
            estimator.name(),
            best.objective,
            status.trials_attempted(),
            status.trials_failed
        );

        let model = match prepared.encoder {
            Some(encoder) => FittedModel::Wrapped { encoder, estimator },
            None => FittedModel::Direct(estimator),
        };
        Ok(SearchResult {
            model,
            internal_score: best.objective,
            trials: status.trials_attempted(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ac_types::{Metric, TargetValue};
    use std::time::Duration;

    fn quick() -> LocalSearchOracle {
        LocalSearchOracle::new(OracleConfig {
            max_trials: 12,
            ..OracleConfig::default()
        })
    }

    fn request(
        rows: Vec<Vec<f64>>,
        target: Vec<TargetValue>,
        task_type: TaskType,
        candidates: CandidateSet,
    ) -> SearchRequest {
        let names = (0..rows.first().map_or(1, Vec::len))
            .map(|j| format!("f{j}"))
            .collect();
        SearchRequest {
            features: FeatureMatrix::new(names, rows).unwrap(),
            target,
            time_budget: Duration::from_secs(10),
            metric: match task_type {
                TaskType::Classification => Metric::Accuracy,
                TaskType::Regression => Metric::R2,
            },
            task_type,
            candidates,
        }
    }

    fn labelled(n: usize) -> (Vec<Vec<f64>>, Vec<TargetValue>) {
        let rows = (0..n).map(|i| vec![i as f64, (i % 2) as f64]).collect();
        let labels = (0..n)
            .map(|i| TargetValue::Label(if i < n / 2 { "low" } else { "high" }.to_string()))
            .collect();
        (rows, labels)
    }

    #[test]
    fn classification_returns_wrapped_model_with_native_labels() {
        let (rows, labels) = labelled(40);
        let req = request(rows, labels, TaskType::Classification, CandidateSet::Unrestricted);

        let result = quick().search(&req).unwrap();
        assert!(result.model.is_wrapped());
        assert_eq!(result.trials, 12);

        let predicted = result.model.predict(&req.features).unwrap();
        assert!(predicted
            .iter()
            .all(|v| matches!(v, TargetValue::Label(l) if l == "low" || l == "high")));
        assert!(metrics::accuracy(&req.target, &predicted) > 0.9);
    }

    #[test]
    fn missing_feature_values_are_imputed() {
        let (mut rows, labels) = labelled(40);
        rows[3][0] = f64::NAN;
        rows[30][1] = f64::NAN;
        let req = request(rows, labels, TaskType::Classification, CandidateSet::Unrestricted);

        let result = quick().search(&req).unwrap();
        let gaps = FeatureMatrix::new(
            vec!["f0".into(), "f1".into()],
            vec![vec![f64::NAN, 0.0], vec![2.0, f64::NAN]],
        )
        .unwrap();
        let predicted = result.model.predict(&gaps).unwrap();
        assert_eq!(predicted.len(), 2);
        assert!(predicted.iter().all(|v| !v.is_missing()));
    }

    #[test]
    fn regression_returns_direct_model() {
        let rows: Vec<Vec<f64>> = (0..50).map(|i| vec![i as f64]).collect();
        let target = (0..50).map(|i| TargetValue::Number(3.0 * i as f64 + 1.0)).collect();
        let req = request(rows, target, TaskType::Regression, CandidateSet::Unrestricted);

        let oracle = quick();
        let result = oracle.search(&req).unwrap();
        assert!(!result.model.is_wrapped());
        let score = oracle.score(&result.model, &req.features, &req.target).unwrap();
        assert!(score > 0.9, "score = {score}");
    }

    #[test]
    fn restricted_search_only_uses_listed_algorithms() {
        let (rows, labels) = labelled(30);
        let req = request(
            rows,
            labels,
            TaskType::Classification,
            CandidateSet::Restricted(vec![Algorithm::LinearL1, Algorithm::LinearL2]),
        );
        let result = quick().search(&req).unwrap();
        let name = result.model.name();
        assert!(name.starts_with("lrl1") || name.starts_with("lrl2"), "{name}");
    }

    #[test]
    fn empty_training_set_is_rejected() {
        let req = request(vec![], vec![], TaskType::Regression, CandidateSet::Unrestricted);
        assert_eq!(quick().search(&req).unwrap_err(), OracleError::EmptyTrainingSet);
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        let req = request(
            vec![vec![1.0], vec![2.0]],
            vec![TargetValue::Number(1.0)],
            TaskType::Regression,
            CandidateSet::Unrestricted,
        );
        assert_eq!(
            quick().search(&req).unwrap_err(),
            OracleError::ShapeMismatch {
                features: 2,
                targets: 1
            }
        );
    }

    #[test]
    fn single_class_is_infeasible() {
        let rows = vec![vec![1.0], vec![2.0], vec![3.0]];
        let target = vec![TargetValue::Number(1.0); 3];
        let req = request(rows, target, TaskType::Classification, CandidateSet::Unrestricted);
        assert!(matches!(
            quick().search(&req),
            Err(OracleError::Infeasible { .. })
        ));
    }

    #[test]
    fn malformed_inputs_are_rejected() {
        let req = request(
            vec![vec![f64::INFINITY], vec![1.0]],
            vec![TargetValue::Number(1.0), TargetValue::Number(2.0)],
            TaskType::Regression,
            CandidateSet::Unrestricted,
        );
        assert!(matches!(
            quick().search(&req),
            Err(OracleError::MalformedData { .. })
        ));

        let req = request(
            vec![vec![0.0], vec![1.0]],
            vec![TargetValue::Number(1.0), TargetValue::Label("x".into())],
            TaskType::Regression,
            CandidateSet::Unrestricted,
        );
        assert!(matches!(
            quick().search(&req),
            Err(OracleError::MalformedData { .. })
        ));

        let req = request(
            vec![vec![0.0], vec![1.0]],
            vec![TargetValue::Number(1.0), TargetValue::Missing],
            TaskType::Classification,
            CandidateSet::Unrestricted,
        );
        assert!(matches!(
            quick().search(&req),
            Err(OracleError::MalformedData { .. })
        ));
    }

    #[test]
    fn metric_must_match_task() {
        let mut req = request(
            vec![vec![0.0], vec![1.0]],
            vec![TargetValue::Number(0.0), TargetValue::Number(1.0)],
            TaskType::Regression,
            CandidateSet::Unrestricted,
        );
        req.metric = Metric::Accuracy;
        assert!(matches!(
            quick().search(&req),
            Err(OracleError::Infeasible { .. })
        ));
    }

    #[test]
    fn empty_candidate_list_is_infeasible() {
        let (rows, labels) = labelled(10);
        let req = request(
            rows,
            labels,
            TaskType::Classification,
            CandidateSet::Restricted(vec![]),
        );
        assert!(matches!(
            quick().search(&req),
            Err(OracleError::Infeasible { .. })
        ));
    }

    #[test]
    fn min_trials_run_even_without_budget() {
        let (rows, labels) = labelled(20);
        let mut req = request(rows, labels, TaskType::Classification, CandidateSet::Unrestricted);
        req.time_budget = Duration::ZERO;

        let oracle = LocalSearchOracle::new(OracleConfig {
            min_trials: 4,
            ..OracleConfig::default()
        });
        assert_eq!(oracle.search(&req).unwrap().trials, 4);
    }

    #[test]
    fn identical_requests_give_identical_models() {
        let (rows, labels) = labelled(30);
        let req = request(rows, labels, TaskType::Classification, CandidateSet::Unrestricted);
        let a = quick().search(&req).unwrap();
        let b = quick().search(&req).unwrap();
        assert_eq!(a.model.name(), b.model.name());
        assert_eq!(a.internal_score, b.internal_score);
    }

    #[test]
    fn tiny_training_sets_score_on_themselves() {
        let req = request(
            vec![vec![0.0], vec![1.0]],
            vec![TargetValue::Label("a".into()), TargetValue::Label("b".into())],
            TaskType::Classification,
            CandidateSet::Restricted(vec![Algorithm::NearestNeighbors]),
        );
        let oracle = LocalSearchOracle::new(OracleConfig {
            max_trials: 3,
            holdout_ratio: 0.0,
            ..OracleConfig::default()
        });
        let result = oracle.search(&req).unwrap();
        assert_eq!(result.trials, 3);
    }
}
