//! The constraint-aware model-selection pipeline:
//! encode → infer task → resolve constraint → search → evaluate → explain.

use ac_data::{ColumnEncoder, EncodingReport};
use ac_optimizer::LocalSearchOracle;
use ac_types::{
    validation_error, AcResult, Attributor, Constraint, Dataset, ExplanationOutcome, FittedModel,
    Metric, SearchOracle, TaskType,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::PipelineConfig;
use crate::evaluator::Evaluator;
use crate::explainer::Explainer;
use crate::inference::{TargetCoercion, TaskTypeInferrer};
use crate::orchestrator::{Partitions, SearchOrchestrator};
use crate::resolver::ConstraintResolver;
use crate::shapley::ShapleySampler;

/// Everything a successful run produces, kept for later explanation.
#[derive(Debug)]
pub struct RunArtifacts {
    pub task_type: TaskType,
    pub metric: Metric,
    /// Held-out score; the value reported to the user.
    pub score: f64,
    /// Score the oracle measured on its own split.
    pub internal_score: f64,
    pub model: FittedModel,
    pub partitions: Partitions,
    pub trials: usize,
    pub coercion: TargetCoercion,
    pub encoding: EncodingReport,
}

impl RunArtifacts {
    pub fn best_model(&self) -> String {
        self.model.name()
    }
}

/// Presentation-ready summary of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub task_type: TaskType,
    pub metric: Metric,
    pub score: f64,
    pub best_model: String,
    pub explanation: Option<ExplanationOutcome>,
}

impl RunReport {
    pub fn new(artifacts: &RunArtifacts, explanation: Option<ExplanationOutcome>) -> Self {
        Self {
            task_type: artifacts.task_type,
            metric: artifacts.metric,
            score: artifacts.score,
            best_model: artifacts.best_model(),
            explanation,
        }
    }
}

pub struct Pipeline {
    config: PipelineConfig,
    oracle: Box<dyn SearchOracle>,
    attributor: Box<dyn Attributor>,
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig,
        oracle: Box<dyn SearchOracle>,
        attributor: Box<dyn Attributor>,
    ) -> AcResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            oracle,
            attributor,
        })
    }

    /// Pipeline backed by the in-process oracle and permutation Shapley
    /// attribution.
    pub fn with_defaults(config: PipelineConfig) -> AcResult<Self> {
        let oracle = Box::new(LocalSearchOracle::new(config.oracle.clone()));
        let attributor = Box::new(ShapleySampler::new(config.shapley.clone()));
        Self::new(config, oracle, attributor)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage up to and including evaluation. Fails only when the
    /// target column is absent or the oracle fails.
    pub fn run(
        &self,
        dataset: &Dataset,
        target: &str,
        constraint: &Constraint,
    ) -> AcResult<RunArtifacts> {
        if dataset.column(target).is_none() {
            return Err(validation_error!("target column '{}' not found", target));
        }
        info!(
            "Running pipeline on {} rows x {} columns, target '{}'",
            dataset.len(),
            dataset.columns().len(),
            target
        );

        let (encoded, encoding) = ColumnEncoder::new().encode(dataset, target);
        let inference =
            TaskTypeInferrer::new(self.config.cardinality_threshold).infer(encoded.require_column(target)?);
        let space = ConstraintResolver.resolve(inference.task_type, constraint.interpretable());

        let orchestrated = SearchOrchestrator::new(
            self.oracle.as_ref(),
            self.config.test_ratio,
            self.config.seed,
        )
        .orchestrate(
            &encoded,
            &inference.target,
            inference.task_type,
            constraint,
            &space,
        )?;

        let result = orchestrated.result;
        let partitions = orchestrated.partitions;
        let evaluation = Evaluator::new(self.oracle.as_ref()).evaluate(
            &result.model,
            inference.task_type,
            &partitions.test_features,
            &partitions.test_target,
        )?;

        Ok(RunArtifacts {
            task_type: inference.task_type,
            metric: evaluation.metric,
            score: evaluation.score,
            internal_score: result.internal_score,
            model: result.model,
            partitions,
            trials: result.trials,
            coercion: inference.coercion,
            encoding,
        })
    }

    /// Explain a run's model over its evaluation partition, using the
    /// training partition as background data.
    pub fn explain(&self, artifacts: &RunArtifacts) -> ExplanationOutcome {
        Explainer::new(self.attributor.as_ref()).explain(
            &artifacts.model,
            &artifacts.partitions.train_features,
            &artifacts.partitions.test_features,
        )
    }

    /// Run, optionally explain, and summarize.
    pub fn execute(
        &self,
        dataset: &Dataset,
        target: &str,
        constraint: &Constraint,
        explain: bool,
    ) -> AcResult<RunReport> {
        let artifacts = self.run(dataset, target, constraint)?;
        let explanation = explain.then(|| self.explain(&artifacts));
        Ok(RunReport::new(&artifacts, explanation))
    }
}
