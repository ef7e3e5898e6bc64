//! Classification vs. regression from the target column's values.
//!
//! This is a heuristic, applied literally: a numeric target with more than
//! `threshold` distinct values is regression, anything else is
//! classification.

use ac_types::{Column, ColumnValues, TaskType};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// What happened when the target was coerced to numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TargetCoercion {
    AlreadyNumeric,
    /// Text values parsed after removing thousands separators.
    Coerced,
    /// The column was kept as-is.
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TargetInference {
    pub task_type: TaskType,
    /// The target after coercion; the original column when coercion failed.
    pub target: Column,
    pub coercion: TargetCoercion,
    pub distinct: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct TaskTypeInferrer {
    threshold: usize,
}

impl TaskTypeInferrer {
    pub fn new(threshold: usize) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn infer(&self, target: &Column) -> TargetInference {
        let (target, coercion) = match &target.values {
            ColumnValues::Numeric(_) => (target.clone(), TargetCoercion::AlreadyNumeric),
            ColumnValues::Categorical(values) | ColumnValues::Text(values) => {
                match coerce(values) {
                    Ok(numbers) => (
                        Column::numeric(target.name.clone(), numbers),
                        TargetCoercion::Coerced,
                    ),
                    Err(reason) => {
                        debug!(column = %target.name, %reason, "target kept as labels");
                        (target.clone(), TargetCoercion::Failed { reason })
                    }
                }
            }
        };

        let distinct = target.distinct_count();
        let task_type = if target.is_numeric() && distinct > self.threshold {
            TaskType::Regression
        } else {
            TaskType::Classification
        };

        info!(
            "Target '{}' has {} distinct values: {}",
            target.name, distinct, task_type
        );

        TargetInference {
            task_type,
            target,
            coercion,
            distinct,
        }
    }
}

impl Default for TaskTypeInferrer {
    fn default() -> Self {
        Self::new(10)
    }
}

/// Parse every present value as a number, ignoring commas. Missing values
/// become NaN.
fn coerce(values: &[Option<String>]) -> Result<Vec<f64>, String> {
    values
        .iter()
        .map(|value| match value {
            None => Ok(f64::NAN),
            Some(raw) => {
                let cleaned: String = raw.chars().filter(|c| *c != ',').collect();
                cleaned
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| format!("'{raw}' is not a number"))
            }
        })
        .collect()
}
