use ac_types::{Algorithm, CandidateSet, Metric, SearchSpace, TaskType};

/// Linear models whose coefficients can be read directly.
pub const INTERPRETABLE_ALGORITHMS: [Algorithm; 2] = [Algorithm::LinearL1, Algorithm::LinearL2];

/// Maps task type and interpretability preference to a search space.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstraintResolver;

impl ConstraintResolver {
    pub fn resolve(&self, task_type: TaskType, interpretable: bool) -> SearchSpace {
        let metric = match task_type {
            TaskType::Classification => Metric::Accuracy,
            TaskType::Regression => Metric::R2,
        };
        let candidates = if interpretable {
            CandidateSet::Restricted(INTERPRETABLE_ALGORITHMS.to_vec())
        } else {
            CandidateSet::Unrestricted
        };
        tracing::info!(
            "Search space: metric {}, {}",
            metric,
            match &candidates {
                CandidateSet::Restricted(list) => format!("{} interpretable candidates", list.len()),
                CandidateSet::Unrestricted => "full catalog".to_string(),
            }
        );
        SearchSpace { candidates, metric }
    }
}
