use ac_types::FeatureMatrix;

/// Per-feature standardization fitted on training data.
#[derive(Debug, Clone, PartialEq)]
pub struct Standardizer {
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl Standardizer {
    /// Constant features get a unit scale so they map to zero.
    pub fn fit(features: &FeatureMatrix) -> Self {
        let n = features.n_rows().max(1) as f64;
        let d = features.n_features();
        let mut means = vec![0.0; d];
        let mut scales = vec![0.0; d];

        for row in features.rows() {
            for (m, v) in means.iter_mut().zip(row) {
                *m += v / n;
            }
        }
        for row in features.rows() {
            for ((s, v), m) in scales.iter_mut().zip(row).zip(&means) {
                *s += (v - m).powi(2) / n;
            }
        }
        for s in scales.iter_mut() {
            *s = if *s > 1e-24 { s.sqrt() } else { 1.0 };
        }

        Self { means, scales }
    }

    pub fn n_features(&self) -> usize {
        self.means.len()
    }

    pub fn transform_row(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.means.iter().zip(&self.scales))
            .map(|(v, (m, s))| (v - m) / s)
            .collect()
    }

    pub fn transform(&self, features: &FeatureMatrix) -> Vec<Vec<f64>> {
        features.rows().iter().map(|r| self.transform_row(r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standardizes_to_zero_mean_unit_variance() {
        let features = FeatureMatrix::new(
            vec!["a".into(), "constant".into()],
            vec![vec![1.0, 5.0], vec![3.0, 5.0]],
        )
        .unwrap();
        let scaler = Standardizer::fit(&features);
        let rows = scaler.transform(&features);
        assert_eq!(rows, vec![vec![-1.0, 0.0], vec![1.0, 0.0]]);
        assert_eq!(scaler.n_features(), 2);
    }
}
