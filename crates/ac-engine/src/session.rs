use ac_types::{validation_error, AcResult, Constraint, Dataset, ExplanationOutcome};
use tracing::debug;

use crate::pipeline::{Pipeline, RunArtifacts};

/// Results of the latest run for one interactive user.
///
/// A successful run replaces whatever was stored; a failed run leaves the
/// previous results in place. The explanation is computed on first request and kept
/// until the next run.
#[derive(Debug, Default)]
pub struct Session {
    artifacts: Option<RunArtifacts>,
    explanation: Option<ExplanationOutcome>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn run(
        &mut self,
        pipeline: &Pipeline,
        dataset: &Dataset,
        target: &str,
        constraint: &Constraint,
    ) -> AcResult<&RunArtifacts> {
        let artifacts = pipeline.run(dataset, target, constraint)?;
        debug!("Session stored run of {}", artifacts.best_model());
        self.explanation = None;
        Ok(self.artifacts.insert(artifacts))
    }

    pub fn artifacts(&self) -> Option<&RunArtifacts> {
        self.artifacts.as_ref()
    }

    pub fn explain(&mut self, pipeline: &Pipeline) -> AcResult<&ExplanationOutcome> {
        let Some(artifacts) = self.artifacts.as_ref() else {
            return Err(validation_error!("run a model first"));
        };
        if self.explanation.is_none() {
            self.explanation = Some(pipeline.explain(artifacts));
        }
        self.explanation
            .as_ref()
            .ok_or_else(|| validation_error!("run a model first"))
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_none()
    }

    pub fn clear(&mut self) {
        self.artifacts = None;
        self.explanation = None;
    }
}
