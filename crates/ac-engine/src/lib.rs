//! # ac-engine
//!
//! The constraint-aware model-selection pipeline: task type inference,
//! constraint resolution, search orchestration, held-out evaluation and
//! feature attribution, plus the session object used by interactive
//! front ends.

pub mod config;
pub mod evaluator;
pub mod explainer;
pub mod inference;
pub mod orchestrator;
pub mod pipeline;
pub mod resolver;
pub mod session;
pub mod shapley;

pub use config::PipelineConfig;
pub use evaluator::{Evaluation, Evaluator};
pub use explainer::Explainer;
pub use inference::{TargetCoercion, TargetInference, TaskTypeInferrer};
pub use orchestrator::{Orchestrated, Partitions, SearchOrchestrator};
pub use pipeline::{Pipeline, RunArtifacts, RunReport};
pub use resolver::{ConstraintResolver, INTERPRETABLE_ALGORITHMS};
pub use session::Session;
pub use shapley::{ShapleyConfig, ShapleySampler};
