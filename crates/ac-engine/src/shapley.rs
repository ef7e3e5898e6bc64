//! Model-agnostic attribution by Monte-Carlo permutation Shapley values.

use ac_optimizer::learners::argmax;
use ac_types::{
    AttributionError, Attributor, Estimator, Explanation, FeatureAttribution, FeatureMatrix,
};
use rand::seq::{index, SliceRandom};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapleyConfig {
    /// Feature orderings sampled per explained row.
    pub permutations: usize,
    /// Background rows kept from the reference data.
    pub background_samples: usize,
    pub seed: u64,
}

impl Default for ShapleyConfig {
    fn default() -> Self {
        Self {
            permutations: 16,
            background_samples: 32,
            seed: 42,
        }
    }
}

/// Estimates each feature's contribution to a row's output as the average
/// marginal change when the feature is switched from background values to
/// the row's value, over random feature orderings.
///
/// Classifiers are explained through the probability of the class they
/// predict for the row; regressors through the raw prediction. For every
/// row the attributions sum to `output(row) - base_value`.
#[derive(Debug, Clone, Default)]
pub struct ShapleySampler {
    config: ShapleyConfig,
}

impl ShapleySampler {
    pub fn new(config: ShapleyConfig) -> Self {
        Self { config }
    }

    fn background(&self, background: &FeatureMatrix, rng: &mut ChaCha8Rng) -> Vec<Vec<f64>> {
        let n = background.n_rows();
        let keep = self.config.background_samples.max(1);
        if n <= keep {
            return background.rows().to_vec();
        }
        let mut picked = index::sample(rng, n, keep).into_vec();
        picked.sort_unstable();
        picked
            .into_iter()
            .map(|i| background.rows()[i].clone())
            .collect()
    }
}

/// Mean explained output over a batch of hybrid rows.
fn mean_output(
    model: &dyn Estimator,
    template: &FeatureMatrix,
    rows: Vec<Vec<f64>>,
    output: usize,
) -> Result<f64, AttributionError> {
    let n = rows.len() as f64;
    let batch = template
        .with_rows(rows)
        .map_err(|_| AttributionError::FeatureMismatch {
            background: template.n_features(),
            rows: template.n_features(),
        })?;
    let scores = model.predict_scores(&batch)?;
    let mut total = 0.0;
    for row in &scores {
        let value = row.get(output).copied().unwrap_or(f64::NAN);
        if !value.is_finite() {
            return Err(AttributionError::NonFiniteOutput);
        }
        total += value;
    }
    Ok(total / n)
}

impl Attributor for ShapleySampler {
    fn name(&self) -> &str {
        "permutation-shapley"
    }

    fn explain(
        &self,
        model: &dyn Estimator,
        background: &FeatureMatrix,
        rows: &FeatureMatrix,
    ) -> Result<Explanation, AttributionError> {
        if background.is_empty() {
            return Err(AttributionError::EmptyBackground);
        }
        if rows.is_empty() {
            return Err(AttributionError::EmptyRows);
        }
        if background.n_features() != rows.n_features() {
            return Err(AttributionError::FeatureMismatch {
                background: background.n_features(),
                rows: rows.n_features(),
            });
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        let reference = self.background(background, &mut rng);
        let n_features = rows.n_features();
        let permutations = self.config.permutations.max(1);

        let outputs: Vec<usize> = model
            .predict_scores(rows)?
            .iter()
            .map(|scores| if scores.len() > 1 { argmax(scores) } else { 0 })
            .collect();

        let mut values = vec![Vec::with_capacity(rows.n_rows()); n_features];
        let mut base_values = Vec::with_capacity(rows.n_rows());
        let mut order: Vec<usize> = (0..n_features).collect();

        for (row, &output) in rows.rows().iter().zip(&outputs) {
            let base = mean_output(model, rows, reference.clone(), output)?;
            let mut phi = vec![0.0; n_features];

            for _ in 0..permutations {
                order.shuffle(&mut rng);
                let mut hybrid = reference.clone();
                let mut previous = base;
                for &feature in &order {
                    for h in hybrid.iter_mut() {
                        h[feature] = row[feature];
                    }
                    let current = mean_output(model, rows, hybrid.clone(), output)?;
                    phi[feature] += current - previous;
                    previous = current;
                }
            }

            for (feature, total) in phi.into_iter().enumerate() {
                values[feature].push(total / permutations as f64);
            }
            base_values.push(base);
        }

        debug!(
            "Attributed {} rows over {} features against {} background rows",
            rows.n_rows(),
            n_features,
            reference.len()
        );

        Ok(Explanation {
            base_values,
            attributions: rows
                .names()
                .iter()
                .cloned()
                .zip(values)
                .map(|(feature, values)| FeatureAttribution { feature, values })
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ac_types::ModelError;

    /// y = 2 * x0 + 0 * x1
    #[derive(Debug)]
    struct Linear;

    impl Estimator for Linear {
        fn name(&self) -> String {
            "linear".into()
        }

        fn fit(&mut self, _: &FeatureMatrix, _: &[f64]) -> Result<(), ModelError> {
            Ok(())
        }

        fn predict(&self, features: &FeatureMatrix) -> Result<Vec<f64>, ModelError> {
            Ok(features.rows().iter().map(|r| 2.0 * r[0]).collect())
        }
    }

    /// Two-class probabilities driven by the sign of x1.
    #[derive(Debug)]
    struct Threshold;

    impl Estimator for Threshold {
        fn name(&self) -> String {
            "threshold".into()
        }

        fn fit(&mut self, _: &FeatureMatrix, _: &[f64]) -> Result<(), ModelError> {
            Ok(())
        }

        fn predict(&self, features: &FeatureMatrix) -> Result<Vec<f64>, ModelError> {
            Ok(features
                .rows()
                .iter()
                .map(|r| if r[1] > 0.0 { 1.0 } else { 0.0 })
                .collect())
        }

        fn predict_scores(&self, features: &FeatureMatrix) -> Result<Vec<Vec<f64>>, ModelError> {
            Ok(self
                .predict(features)?
                .into_iter()
                .map(|c| if c > 0.5 { vec![0.1, 0.9] } else { vec![0.8, 0.2] })
                .collect())
        }
    }

    fn matrix(rows: Vec<Vec<f64>>) -> FeatureMatrix {
        FeatureMatrix::new(vec!["a".into(), "b".into()], rows).unwrap()
    }

    #[test]
    fn linear_model_attributions_match_closed_form() {
        let background = matrix(vec![vec![0.0, 5.0], vec![2.0, -5.0]]);
        let rows = matrix(vec![vec![3.0, 1.0], vec![-1.0, 0.0]]);

        let explanation = ShapleySampler::default()
            .explain(&Linear, &background, &rows)
            .unwrap();

        // Background mean output is 2.0; attribution of `a` is 2 * (x0 - 1).
        assert_eq!(explanation.base_values, vec![2.0, 2.0]);
        let a = explanation.get("a").unwrap();
        assert!((a[0] - 4.0).abs() < 1e-12);
        assert!((a[1] + 4.0).abs() < 1e-12);
        assert!(explanation.get("b").unwrap().iter().all(|v| v.abs() < 1e-12));
        assert_eq!(explanation.ranked()[0].0, "a");
    }

    #[test]
    fn attributions_sum_to_output_minus_base() {
        let background = matrix(vec![vec![0.0, -1.0], vec![1.0, 1.0], vec![2.0, -2.0]]);
        let rows = matrix(vec![vec![0.5, 3.0], vec![0.5, -3.0]]);

        let explanation = ShapleySampler::new(ShapleyConfig {
            permutations: 3,
            ..ShapleyConfig::default()
        })
        .explain(&Threshold, &background, &rows)
        .unwrap();

        let expected = [0.9, 0.8];
        for (r, want) in expected.iter().enumerate() {
            let total: f64 = explanation
                .attributions
                .iter()
                .map(|a| a.values[r])
                .sum::<f64>()
                + explanation.base_values[r];
            assert!((total - want).abs() < 1e-12, "row {r}: {total}");
        }
        assert!(explanation.get("a").unwrap().iter().all(|v| v.abs() < 1e-12));
    }

    #[test]
    fn background_is_subsampled() {
        let background = matrix((0..100).map(|i| vec![i as f64, 0.0]).collect());
        let rows = matrix(vec![vec![1.0, 0.0]]);
        let sampler = ShapleySampler::new(ShapleyConfig {
            background_samples: 10,
            ..ShapleyConfig::default()
        });

        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(sampler.background(&background, &mut rng).len(), 10);
        assert!(sampler.explain(&Linear, &background, &rows).is_ok());
    }

    #[test]
    fn rejects_degenerate_inputs() {
        let sampler = ShapleySampler::default();
        let rows = matrix(vec![vec![1.0, 1.0]]);

        assert_eq!(
            sampler.explain(&Linear, &rows.empty_like(), &rows).unwrap_err(),
            AttributionError::EmptyBackground
        );
        assert_eq!(
            sampler.explain(&Linear, &rows, &rows.empty_like()).unwrap_err(),
            AttributionError::EmptyRows
        );

        let narrow = FeatureMatrix::new(vec!["a".into()], vec![vec![1.0]]).unwrap();
        assert_eq!(
            sampler.explain(&Linear, &narrow, &rows).unwrap_err(),
            AttributionError::FeatureMismatch {
                background: 1,
                rows: 2
            }
        );
    }
}
