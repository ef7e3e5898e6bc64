use std::path::Path;

use ac_optimizer::OracleConfig;
use ac_types::{config_error, AcResult};
use serde::{Deserialize, Serialize};

use crate::shapley::ShapleyConfig;

/// Tunable constants of the pipeline and its reference collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// A numeric target with more distinct values than this is regression.
    pub cardinality_threshold: usize,
    /// Share of rows held out for evaluation and explanation.
    pub test_ratio: f64,
    /// Seed of the train/test shuffle.
    pub seed: u64,
    pub oracle: OracleConfig,
    pub shapley: ShapleyConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            cardinality_threshold: 10,
            test_ratio: 0.2,
            seed: 42,
            oracle: OracleConfig::default(),
            shapley: ShapleyConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> AcResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_cardinality_threshold(mut self, threshold: usize) -> Self {
        self.cardinality_threshold = threshold;
        self
    }

    pub fn with_test_ratio(mut self, ratio: f64) -> Self {
        self.test_ratio = ratio;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_oracle(mut self, oracle: OracleConfig) -> Self {
        self.oracle = oracle;
        self
    }

    pub fn with_shapley(mut self, shapley: ShapleyConfig) -> Self {
        self.shapley = shapley;
        self
    }

    pub fn validate(&self) -> AcResult<()> {
        if !(self.test_ratio > 0.0 && self.test_ratio < 1.0) {
            return Err(config_error!(
                "test_ratio must be in (0, 1), got {}",
                self.test_ratio
            ));
        }
        if !(0.0..1.0).contains(&self.oracle.holdout_ratio) {
            return Err(config_error!(
                "oracle.holdout_ratio must be in [0, 1), got {}",
                self.oracle.holdout_ratio
            ));
        }
        if self.oracle.max_trials == 0 {
            return Err(config_error!("oracle.max_trials must be at least 1"));
        }
        if self.shapley.permutations == 0 || self.shapley.background_samples == 0 {
            return Err(config_error!(
                "shapley.permutations and shapley.background_samples must be at least 1"
            ));
        }
        Ok(())
    }
}
