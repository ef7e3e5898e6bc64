use ac_types::{Capabilities, Estimator, FeatureMatrix, ModelError};

use super::check_features;

/// Per-feature means of the observed (non-NaN) training values.
#[derive(Debug, Clone, PartialEq)]
pub struct MeanImputer {
    means: Vec<f64>,
}

impl MeanImputer {
    /// A feature with no observed values imputes to zero.
    pub fn fit(features: &FeatureMatrix) -> Self {
        let d = features.n_features();
        let mut sums = vec![0.0f64; d];
        let mut counts = vec![0usize; d];
        for row in features.rows() {
            for ((s, c), v) in sums.iter_mut().zip(counts.iter_mut()).zip(row) {
                if !v.is_nan() {
                    *s += v;
                    *c += 1;
                }
            }
        }
        let means = sums
            .into_iter()
            .zip(counts)
            .map(|(s, c)| if c == 0 { 0.0 } else { s / c as f64 })
            .collect();
        Self { means }
    }

    pub fn means(&self) -> &[f64] {
        &self.means
    }

    pub fn transform_row(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(&self.means)
            .map(|(v, m)| if v.is_nan() { *m } else { *v })
            .collect()
    }

    /// `None` when no value is missing.
    fn transform(&self, features: &FeatureMatrix) -> Result<Option<FeatureMatrix>, ModelError> {
        check_features(self.means.len(), features)?;
        if !features.rows().iter().flatten().any(|v| v.is_nan()) {
            return Ok(None);
        }
        let rows = features
            .rows()
            .iter()
            .map(|r| self.transform_row(r))
            .collect();
        features
            .with_rows(rows)
            .map(Some)
            .map_err(|e| ModelError::Unsupported {
                message: e.to_string(),
            })
    }
}

/// Fills missing feature values with training means before delegating to
/// the wrapped learner.
#[derive(Debug)]
pub struct Imputed {
    inner: Box<dyn Estimator>,
    imputer: Option<MeanImputer>,
}

impl Imputed {
    pub fn new(inner: Box<dyn Estimator>) -> Self {
        Self {
            inner,
            imputer: None,
        }
    }

    fn imputer(&self) -> Result<&MeanImputer, ModelError> {
        self.imputer.as_ref().ok_or_else(|| ModelError::NotFitted {
            model: self.inner.name(),
        })
    }
}

impl Estimator for Imputed {
    fn name(&self) -> String {
        self.inner.name()
    }

    fn capabilities(&self) -> Capabilities {
        self.inner.capabilities()
    }

    fn fit(&mut self, features: &FeatureMatrix, target: &[f64]) -> Result<(), ModelError> {
        let imputer = MeanImputer::fit(features);
        match imputer.transform(features)? {
            Some(filled) => self.inner.fit(&filled, target)?,
            None => self.inner.fit(features, target)?,
        }
        self.imputer = Some(imputer);
        Ok(())
    }

    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<f64>, ModelError> {
        match self.imputer()?.transform(features)? {
            Some(filled) => self.inner.predict(&filled),
            None => self.inner.predict(features),
        }
    }

    fn predict_scores(&self, features: &FeatureMatrix) -> Result<Vec<Vec<f64>>, ModelError> {
        match self.imputer()?.transform(features)? {
            Some(filled) => self.inner.predict_scores(&filled),
            None => self.inner.predict_scores(features),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::learners::{DecisionTree, LearnerTask};

    fn matrix(rows: Vec<Vec<f64>>) -> FeatureMatrix {
        let names = (0..rows[0].len()).map(|i| format!("f{i}")).collect();
        FeatureMatrix::new(names, rows).unwrap()
    }

    #[test]
    fn means_skip_missing_values() {
        let imputer = MeanImputer::fit(&matrix(vec![
            vec![1.0, f64::NAN],
            vec![f64::NAN, f64::NAN],
            vec![3.0, f64::NAN],
        ]));
        assert_eq!(imputer.means(), &[2.0, 0.0]);
        assert_eq!(imputer.transform_row(&[f64::NAN, 7.0]), vec![2.0, 7.0]);
    }

    #[test]
    fn wrapped_learner_fits_and_predicts_with_gaps() {
        let train = matrix(vec![
            vec![0.0],
            vec![1.0],
            vec![f64::NAN],
            vec![10.0],
            vec![11.0],
            vec![12.0],
        ]);
        let target = vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        let mut model = Imputed::new(Box::new(DecisionTree::new(
            3,
            1,
            LearnerTask::Classification { n_classes: 2 },
        )));
        model.fit(&train, &target).unwrap();

        let predicted = model
            .predict(&matrix(vec![vec![0.5], vec![11.5], vec![f64::NAN]]))
            .unwrap();
        assert_eq!(predicted.len(), 3);
        assert_eq!(&predicted[..2], &[0.0, 1.0]);
        assert!(predicted[2].is_finite());
        assert!(model.name().starts_with("tree"));
    }

    #[test]
    fn predict_before_fit_fails() {
        let model = Imputed::new(Box::new(DecisionTree::new(
            2,
            1,
            LearnerTask::Regression,
        )));
        assert!(matches!(
            model.predict(&matrix(vec![vec![1.0]])),
            Err(ModelError::NotFitted { .. })
        ));
    }
}
