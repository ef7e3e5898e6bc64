use ac_types::{Estimator, FeatureMatrix, ModelError};

use super::{argmax, check_features, check_training, class_index, LearnerTask, Standardizer};

const EPOCHS: usize = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Penalty {
    L1,
    L2,
}

/// Regularized linear regression, or multinomial logistic regression for
/// classification, fitted by full-batch proximal gradient descent on
/// standardized features.
#[derive(Debug, Clone)]
pub struct LinearModel {
    penalty: Penalty,
    alpha: f64,
    task: LearnerTask,
    state: Option<LinearState>,
}

#[derive(Debug, Clone)]
struct LinearState {
    scaler: Standardizer,
    /// One weight row per output.
    weights: Vec<Vec<f64>>,
    bias: Vec<f64>,
    target_mean: f64,
    target_scale: f64,
}

impl LinearModel {
    pub fn new(penalty: Penalty, alpha: f64, task: LearnerTask) -> Self {
        Self {
            penalty,
            alpha,
            task,
            state: None,
        }
    }

    pub fn coefficients(&self) -> Option<&[Vec<f64>]> {
        self.state.as_ref().map(|s| s.weights.as_slice())
    }

    fn id(&self) -> &'static str {
        match self.penalty {
            Penalty::L1 => "lrl1",
            Penalty::L2 => "lrl2",
        }
    }

    fn state(&self) -> Result<&LinearState, ModelError> {
        self.state.as_ref().ok_or_else(|| ModelError::NotFitted {
            model: self.name(),
        })
    }

    fn step(&self, weights: &mut [Vec<f64>], grad: &[Vec<f64>], lr: f64) {
        for (w_row, g_row) in weights.iter_mut().zip(grad) {
            for (w, g) in w_row.iter_mut().zip(g_row) {
                match self.penalty {
                    Penalty::L2 => *w -= lr * (g + self.alpha * *w),
                    Penalty::L1 => {
                        let moved = *w - lr * g;
                        let shrink = lr * self.alpha;
                        *w = moved.signum() * (moved.abs() - shrink).max(0.0);
                    }
                }
            }
        }
    }

    fn raw_outputs(state: &LinearState, row: &[f64]) -> Vec<f64> {
        let x = state.scaler.transform_row(row);
        state
            .weights
            .iter()
            .zip(&state.bias)
            .map(|(w, b)| b + w.iter().zip(&x).map(|(wi, xi)| wi * xi).sum::<f64>())
            .collect()
    }
}

fn softmax(logits: &[f64]) -> Vec<f64> {
    let max = logits.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|z| (z - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

impl Estimator for LinearModel {
    fn name(&self) -> String {
        format!("{}(alpha={:.4})", self.id(), self.alpha)
    }

    fn fit(&mut self, features: &FeatureMatrix, target: &[f64]) -> Result<(), ModelError> {
        check_training(&self.name(), features, target)?;

        let scaler = Standardizer::fit(features);
        let x = scaler.transform(features);
        let n = x.len() as f64;
        let d = features.n_features();
        let k = self.task.outputs();

        let (labels, target_mean, target_scale) = match self.task {
            LearnerTask::Regression => {
                let mean = target.iter().sum::<f64>() / n;
                let var = target.iter().map(|y| (y - mean).powi(2)).sum::<f64>() / n;
                let scale = if var > 1e-24 { var.sqrt() } else { 1.0 };
                let scaled: Vec<f64> = target.iter().map(|y| (y - mean) / scale).collect();
                (scaled, mean, scale)
            }
            LearnerTask::Classification { n_classes } => {
                let labels = target
                    .iter()
                    .map(|y| class_index(*y, n_classes).map(|c| c as f64))
                    .collect::<Result<Vec<_>, _>>()?;
                (labels, 0.0, 1.0)
            }
        };

        let lr = 1.0 / (1.0 + d as f64);
        let mut weights = vec![vec![0.0; d]; k];
        let mut bias = vec![0.0; k];

        for _ in 0..EPOCHS {
            let mut grad_w = vec![vec![0.0; d]; k];
            let mut grad_b = vec![0.0; k];

            for (row, label) in x.iter().zip(&labels) {
                let logits: Vec<f64> = weights
                    .iter()
                    .zip(&bias)
                    .map(|(w, b)| b + w.iter().zip(row).map(|(wi, xi)| wi * xi).sum::<f64>())
                    .collect();

                let residuals: Vec<f64> = match self.task {
                    LearnerTask::Regression => vec![logits[0] - label],
                    LearnerTask::Classification { .. } => softmax(&logits)
                        .into_iter()
                        .enumerate()
                        .map(|(c, p)| p - if c == *label as usize { 1.0 } else { 0.0 })
                        .collect(),
                };

                for (c, r) in residuals.iter().enumerate() {
                    grad_b[c] += r / n;
                    for (g, xi) in grad_w[c].iter_mut().zip(row) {
                        *g += r * xi / n;
                    }
                }
            }

            self.step(&mut weights, &grad_w, lr);
            for (b, g) in bias.iter_mut().zip(&grad_b) {
                *b -= lr * g;
            }

            if weights.iter().flatten().chain(&bias).any(|v| !v.is_finite()) {
                return Err(ModelError::Diverged { model: self.name() });
            }
        }

        self.state = Some(LinearState {
            scaler,
            weights,
            bias,
            target_mean,
            target_scale,
        });
        Ok(())
    }

    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<f64>, ModelError> {
        let scores = self.predict_scores(features)?;
        Ok(match self.task {
            LearnerTask::Regression => scores.into_iter().map(|s| s[0]).collect(),
            LearnerTask::Classification { .. } => {
                scores.iter().map(|s| argmax(s) as f64).collect()
            }
        })
    }

    fn predict_scores(&self, features: &FeatureMatrix) -> Result<Vec<Vec<f64>>, ModelError> {
        let state = self.state()?;
        check_features(state.scaler.n_features(), features)?;

        Ok(features
            .rows()
            .iter()
            .map(|row| {
                let outputs = Self::raw_outputs(state, row);
                match self.task {
                    LearnerTask::Regression => {
                        vec![outputs[0] * state.target_scale + state.target_mean]
                    }
                    LearnerTask::Classification { .. } => softmax(&outputs),
                }
            })
            .collect())
    }
}
