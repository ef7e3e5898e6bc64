//! Train/test split and delegation to the search oracle.

use ac_types::{
    AcError, AcResult, Column, Constraint, Dataset, FeatureMatrix, SearchOracle, SearchRequest,
    SearchResult, SearchSpace, TargetValue, TaskType,
};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{info, warn};

/// Training and evaluation partitions of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Partitions {
    pub train_features: FeatureMatrix,
    pub train_target: Vec<TargetValue>,
    pub test_features: FeatureMatrix,
    pub test_target: Vec<TargetValue>,
}

impl Partitions {
    /// Shuffle row indices with `seed` and hold out `ceil(n * test_ratio)`
    /// of them for evaluation.
    pub fn split(
        features: &FeatureMatrix,
        target: &[TargetValue],
        test_ratio: f64,
        seed: u64,
    ) -> Self {
        let n = features.n_rows().min(target.len());
        let n_test = ((n as f64) * test_ratio).ceil() as usize;

        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(&mut ChaCha8Rng::seed_from_u64(seed));
        let (test, train) = order.split_at(n_test.min(n));

        let pick = |indices: &[usize]| -> Vec<TargetValue> {
            indices.iter().map(|&i| target[i].clone()).collect()
        };
        Self {
            train_features: features.select_rows(train),
            train_target: pick(train),
            test_features: features.select_rows(test),
            test_target: pick(test),
        }
    }
}

/// Outcome of a successful orchestration.
#[derive(Debug)]
pub struct Orchestrated {
    pub result: SearchResult,
    pub partitions: Partitions,
}

pub struct SearchOrchestrator<'a> {
    oracle: &'a dyn SearchOracle,
    test_ratio: f64,
    seed: u64,
}

impl<'a> SearchOrchestrator<'a> {
    pub fn new(oracle: &'a dyn SearchOracle, test_ratio: f64, seed: u64) -> Self {
        Self {
            oracle,
            test_ratio,
            seed,
        }
    }

    /// Split `dataset`, build the request and run the oracle once. Any
    /// oracle failure becomes [`AcError::SearchFailed`]; there is no retry.
    pub fn orchestrate(
        &self,
        dataset: &Dataset,
        target: &Column,
        task_type: TaskType,
        constraint: &Constraint,
        space: &SearchSpace,
    ) -> AcResult<Orchestrated> {
        let (features, _) = dataset.split_target(&target.name)?;
        let partitions = Partitions::split(
            &features,
            &target.target_values(),
            self.test_ratio,
            self.seed,
        );
        info!(
            "Split {} rows into {} train / {} test",
            features.n_rows(),
            partitions.train_features.n_rows(),
            partitions.test_features.n_rows()
        );

        let request = SearchRequest {
            features: partitions.train_features.clone(),
            target: partitions.train_target.clone(),
            time_budget: constraint.time_budget(),
            metric: space.metric,
            task_type,
            candidates: space.candidates.clone(),
        };

        match self.oracle.search(&request) {
            Ok(result) => {
                info!(
                    "Oracle '{}' returned {} (internal {} {:.4}, {} trials)",
                    self.oracle.name(),
                    result.model.name(),
                    space.metric,
                    result.internal_score,
                    result.trials
                );
                Ok(Orchestrated { result, partitions })
            }
            Err(e) => {
                warn!("Oracle '{}' failed: {}", self.oracle.name(), e);
                Err(AcError::search_failed(self.oracle.name(), e))
            }
        }
    }
}
