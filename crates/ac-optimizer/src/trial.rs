//! Trial tracking for a single search run.

use ac_types::{Algorithm, Metric};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::search::ParameterSet;

/// Unique search run identifier.
pub type SearchId = Uuid;

/// Lifecycle state for a search run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchState {
    Pending,
    Running,
    Completed,
    Failed,
}

/// Aggregate status of a search run. Every supported metric is maximized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchStatus {
    pub id: SearchId,
    pub metric: Metric,
    pub state: SearchState,
    pub trials_completed: usize,
    pub trials_failed: usize,
    pub best_trial: Option<TrialResult>,
    pub last_error: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl SearchStatus {
    pub fn new(metric: Metric) -> Self {
        Self {
            id: Uuid::new_v4(),
            metric,
            state: SearchState::Pending,
            trials_completed: 0,
            trials_failed: 0,
            best_trial: None,
            last_error: None,
            started_at: None,
            finished_at: None,
        }
    }

    pub fn mark_running(&mut self) {
        self.state = SearchState::Running;
        self.started_at = Some(Utc::now());
    }

    pub fn mark_completed(&mut self) {
        self.state = SearchState::Completed;
        self.finished_at = Some(Utc::now());
    }

    pub fn mark_failed(&mut self, error: String) {
        self.state = SearchState::Failed;
        self.finished_at = Some(Utc::now());
        self.last_error = Some(error);
    }

    pub fn trials_attempted(&self) -> usize {
        self.trials_completed + self.trials_failed
    }

    /// Fold a finished trial into the counters and the best-so-far.
    pub fn record(&mut self, trial: &Trial) {
        match (&trial.status, &trial.result) {
            (TrialStatus::Completed, Some(result)) => {
                self.trials_completed += 1;
                self.update_best(result);
            }
            _ => {
                self.trials_failed += 1;
                if let Some(error) = &trial.error {
                    self.last_error = Some(error.clone());
                }
            }
        }
    }

    /// Update the best trial if `result` improves on the current best.
    /// Ties keep the earlier trial.
    pub fn update_best(&mut self, result: &TrialResult) {
        let improves = match &self.best_trial {
            None => true,
            Some(current_best) => result.objective > current_best.objective,
        };
        if improves {
            self.best_trial = Some(result.clone());
        }
    }
}

// ---------------------------------------------------------------------------
// Individual trial
// ---------------------------------------------------------------------------

/// A single trial: one algorithm with one parameter configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trial {
    pub id: Uuid,
    pub search_id: SearchId,
    pub trial_number: usize,
    pub algorithm: Algorithm,
    pub parameters: ParameterSet,
    pub status: TrialStatus,
    pub result: Option<TrialResult>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl Trial {
    pub fn new(
        search_id: SearchId,
        trial_number: usize,
        algorithm: Algorithm,
        parameters: ParameterSet,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            search_id,
            trial_number,
            algorithm,
            parameters,
            status: TrialStatus::Pending,
            result: None,
            started_at: None,
            finished_at: None,
            error: None,
        }
    }

    pub fn mark_running(&mut self) {
        self.status = TrialStatus::Running;
        self.started_at = Some(Utc::now());
    }

    pub fn mark_completed(&mut self, objective: f64) {
        let finished_at = Utc::now();
        let duration_ms = self
            .started_at
            .map(|start| (finished_at - start).num_milliseconds().max(0) as u64);

        self.status = TrialStatus::Completed;
        self.finished_at = Some(finished_at);
        self.result = Some(TrialResult {
            trial_id: self.id,
            algorithm: self.algorithm,
            objective,
            parameters: self.parameters.clone(),
            duration_ms,
        });
    }

    pub fn mark_failed(&mut self, error: String) {
        self.status = TrialStatus::Failed;
        self.finished_at = Some(Utc::now());
        self.error = Some(error);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrialStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// Result of a single trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialResult {
    pub trial_id: Uuid,
    pub algorithm: Algorithm,
    pub objective: f64,
    pub parameters: ParameterSet,
    pub duration_ms: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::ParameterValue;
    use std::collections::HashMap;

    fn result(objective: f64) -> TrialResult {
        TrialResult {
            trial_id: Uuid::new_v4(),
            algorithm: Algorithm::LinearL2,
            objective,
            parameters: HashMap::new(),
            duration_ms: Some(10),
        }
    }

    #[test]
    fn search_status_lifecycle() {
        let mut status = SearchStatus::new(Metric::Accuracy);

        assert_eq!(status.state, SearchState::Pending);
        assert!(status.started_at.is_none());

        status.mark_running();
        assert_eq!(status.state, SearchState::Running);
        assert!(status.started_at.is_some());

        status.mark_completed();
        assert_eq!(status.state, SearchState::Completed);
        assert!(status.finished_at.is_some());
    }

    #[test]
    fn best_trial_tracking() {
        let mut status = SearchStatus::new(Metric::R2);

        status.update_best(&result(0.5));
        assert_eq!(status.best_trial.as_ref().unwrap().objective, 0.5);

        status.update_best(&result(0.8));
        assert_eq!(status.best_trial.as_ref().unwrap().objective, 0.8);

        // Worse result should not replace
        status.update_best(&result(0.1));
        assert_eq!(status.best_trial.as_ref().unwrap().objective, 0.8);
    }

    #[test]
    fn ties_keep_earlier_trial() {
        let mut status = SearchStatus::new(Metric::Accuracy);
        let first = result(0.9);
        status.update_best(&first);
        status.update_best(&result(0.9));
        assert_eq!(status.best_trial.as_ref().unwrap().trial_id, first.trial_id);
    }

    #[test]
    fn trial_lifecycle() {
        let mut params = HashMap::new();
        params.insert("k".into(), ParameterValue::Int(5));

        let mut trial = Trial::new(Uuid::new_v4(), 1, Algorithm::NearestNeighbors, params);
        assert_eq!(trial.status, TrialStatus::Pending);

        trial.mark_running();
        assert_eq!(trial.status, TrialStatus::Running);

        trial.mark_completed(0.93);
        assert_eq!(trial.status, TrialStatus::Completed);
        assert!(trial.finished_at.is_some());
        let result = trial.result.as_ref().unwrap();
        assert_eq!(result.objective, 0.93);
        assert_eq!(result.algorithm, Algorithm::NearestNeighbors);
        assert!(result.duration_ms.is_some());
    }

    #[test]
    fn record_counts_failures() {
        let mut status = SearchStatus::new(Metric::Accuracy);

        let mut failed = Trial::new(status.id, 0, Algorithm::DecisionTree, HashMap::new());
        failed.mark_running();
        failed.mark_failed("diverged".into());
        status.record(&failed);

        let mut ok = Trial::new(status.id, 1, Algorithm::DecisionTree, HashMap::new());
        ok.mark_running();
        ok.mark_completed(0.7);
        status.record(&ok);

        assert_eq!(status.trials_failed, 1);
        assert_eq!(status.trials_completed, 1);
        assert_eq!(status.trials_attempted(), 2);
        assert_eq!(status.last_error.as_deref(), Some("diverged"));
        assert_eq!(status.best_trial.as_ref().unwrap().objective, 0.7);
    }
}
