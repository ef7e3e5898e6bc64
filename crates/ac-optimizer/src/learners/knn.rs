use ac_types::{Estimator, FeatureMatrix, ModelError};

use super::{argmax, check_features, check_training, class_index, LearnerTask, Standardizer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weighting {
    Uniform,
    /// Inverse-distance weights.
    Distance,
}

/// k-nearest-neighbours on standardized features.
#[derive(Debug, Clone)]
pub struct NearestNeighbors {
    k: usize,
    weighting: Weighting,
    task: LearnerTask,
    state: Option<KnnState>,
}

#[derive(Debug, Clone)]
struct KnnState {
    scaler: Standardizer,
    rows: Vec<Vec<f64>>,
    target: Vec<f64>,
}

impl NearestNeighbors {
    pub fn new(k: usize, weighting: Weighting, task: LearnerTask) -> Self {
        Self {
            k: k.max(1),
            weighting,
            task,
            state: None,
        }
    }

    fn neighbours(&self, state: &KnnState, query: &[f64]) -> Vec<(f64, usize)> {
        let mut distances: Vec<(f64, usize)> = state
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let d2: f64 = row.iter().zip(query).map(|(a, b)| (a - b).powi(2)).sum();
                (d2.sqrt(), i)
            })
            .collect();
        distances.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        distances.truncate(self.k);
        distances
    }

    fn weight(&self, distance: f64) -> f64 {
        match self.weighting {
            Weighting::Uniform => 1.0,
            Weighting::Distance => 1.0 / (distance + 1e-12),
        }
    }
}

impl Estimator for NearestNeighbors {
    fn name(&self) -> String {
        match self.weighting {
            Weighting::Uniform => format!("knn(k={})", self.k),
            Weighting::Distance => format!("knn(k={}, weights=distance)", self.k),
        }
    }

    fn fit(&mut self, features: &FeatureMatrix, target: &[f64]) -> Result<(), ModelError> {
        check_training(&self.name(), features, target)?;
        if let LearnerTask::Classification { n_classes } = self.task {
            for y in target {
                class_index(*y, n_classes)?;
            }
        }

        let scaler = Standardizer::fit(features);
        let rows = scaler.transform(features);
        self.state = Some(KnnState {
            scaler,
            rows,
            target: target.to_vec(),
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
        let state = self.state.as_ref().ok_or_else(|| ModelError::NotFitted {
            model: self.name(),
        })?;
        check_features(state.scaler.n_features(), features)?;

        Ok(features
            .rows()
            .iter()
            .map(|row| {
                let query = state.scaler.transform_row(row);
                let neighbours = self.neighbours(state, &query);
                let total: f64 = neighbours.iter().map(|(d, _)| self.weight(*d)).sum();

                match self.task {
                    LearnerTask::Regression => {
                        let weighted: f64 = neighbours
                            .iter()
                            .map(|(d, i)| self.weight(*d) * state.target[*i])
                            .sum();
                        vec![weighted / total]
                    }
                    LearnerTask::Classification { n_classes } => {
                        let mut votes = vec![0.0; n_classes];
                        for (d, i) in &neighbours {
                            votes[state.target[*i].round() as usize] += self.weight(*d);
                        }
                        votes.iter().map(|v| v / total).collect()
                    }
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(values: &[f64]) -> FeatureMatrix {
        FeatureMatrix::new(
            vec!["x".into()],
            values.iter().map(|v| vec![*v]).collect(),
        )
        .unwrap()
    }

    #[test]
    fn one_neighbour_memorizes_training_data() {
        let train = features(&[0.0, 1.0, 2.0, 3.0]);
        let target = [1.0, 0.0, 1.0, 0.0];
        let mut model = NearestNeighbors::new(
            1,
            Weighting::Uniform,
            LearnerTask::Classification { n_classes: 2 },
        );
        model.fit(&train, &target).unwrap();
        assert_eq!(model.predict(&train).unwrap(), target.to_vec());
    }

    #[test]
    fn regression_averages_neighbours() {
        let train = features(&[0.0, 1.0, 10.0]);
        let mut model = NearestNeighbors::new(2, Weighting::Uniform, LearnerTask::Regression);
        model.fit(&train, &[2.0, 4.0, 100.0]).unwrap();
        let predicted = model.predict(&features(&[0.4])).unwrap();
        assert!((predicted[0] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn k_larger_than_training_set_uses_all_rows() {
        let train = features(&[0.0, 1.0]);
        let mut model = NearestNeighbors::new(10, Weighting::Uniform, LearnerTask::Regression);
        model.fit(&train, &[1.0, 3.0]).unwrap();
        assert_eq!(model.predict(&features(&[5.0])).unwrap(), vec![2.0]);
    }

    #[test]
    fn class_scores_are_vote_fractions() {
        let train = features(&[0.0, 0.1, 0.2, 5.0]);
        let mut model = NearestNeighbors::new(
            3,
            Weighting::Uniform,
            LearnerTask::Classification { n_classes: 2 },
        );
        model.fit(&train, &[0.0, 0.0, 1.0, 1.0]).unwrap();
        let scores = model.predict_scores(&features(&[0.0])).unwrap();
        assert!((scores[0][0] - 2.0 / 3.0).abs() < 1e-12);
        assert!((scores[0][1] - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(model.name(), "knn(k=3)");
    }

    #[test]
    fn rejects_out_of_range_labels() {
        let mut model = NearestNeighbors::new(
            1,
            Weighting::Distance,
            LearnerTask::Classification { n_classes: 2 },
        );
        let err = model.fit(&features(&[0.0]), &[4.0]).unwrap_err();
        assert_eq!(err, ModelError::UnknownClass { index: 4 });
    }
}
