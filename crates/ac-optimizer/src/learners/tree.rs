use ac_types::{Estimator, FeatureMatrix, ModelError};

use super::{argmax, check_features, check_training, class_index, LearnerTask};

#[derive(Debug, Clone)]
enum Node {
    /// Class frequencies, or the mean target for regression.
    Leaf(Vec<f64>),
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

/// CART decision tree: gini impurity for classification, squared error for
/// regression. Rows with `x[feature] <= threshold` go left.
#[derive(Debug, Clone)]
pub struct DecisionTree {
    max_depth: usize,
    min_samples_leaf: usize,
    task: LearnerTask,
    root: Option<(Node, usize)>,
}

struct Candidate {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

impl DecisionTree {
    pub fn new(max_depth: usize, min_samples_leaf: usize, task: LearnerTask) -> Self {
        Self {
            max_depth,
            min_samples_leaf: min_samples_leaf.max(1),
            task,
            root: None,
        }
    }

    /// Number of leaves in the fitted tree.
    pub fn leaf_count(&self) -> usize {
        fn count(node: &Node) -> usize {
            match node {
                Node::Leaf(_) => 1,
                Node::Split { left, right, .. } => count(left) + count(right),
            }
        }
        self.root.as_ref().map_or(0, |(node, _)| count(node))
    }

    fn leaf_value(&self, target: &[f64], indices: &[usize]) -> Vec<f64> {
        let n = indices.len() as f64;
        match self.task {
            LearnerTask::Regression => {
                vec![indices.iter().map(|&i| target[i]).sum::<f64>() / n]
            }
            LearnerTask::Classification { n_classes } => {
                let mut counts = vec![0.0; n_classes];
                for &i in indices {
                    counts[target[i] as usize] += 1.0;
                }
                counts.iter().map(|c| c / n).collect()
            }
        }
    }

    /// Weighted impurity of a set of target values: n * gini or SSE.
    fn impurity(&self, values: impl Iterator<Item = f64> + Clone) -> f64 {
        match self.task {
            LearnerTask::Regression => {
                let (n, sum) = values
                    .clone()
                    .fold((0.0f64, 0.0f64), |(n, s), v| (n + 1.0, s + v));
                if n == 0.0 {
                    return 0.0;
                }
                let mean = sum / n;
                values.map(|v| (v - mean).powi(2)).sum()
            }
            LearnerTask::Classification { n_classes } => {
                let mut counts = vec![0.0f64; n_classes];
                let mut n = 0.0f64;
                for v in values {
                    counts[v as usize] += 1.0;
                    n += 1.0;
                }
                if n == 0.0 {
                    return 0.0;
                }
                n * (1.0 - counts.iter().map(|c| (c / n).powi(2)).sum::<f64>())
            }
        }
    }

    fn best_split(
        &self,
        rows: &[Vec<f64>],
        target: &[f64],
        indices: &[usize],
    ) -> Option<Candidate> {
        let n_features = rows.first().map_or(0, Vec::len);
        let mut best: Option<Candidate> = None;

        for feature in 0..n_features {
            let mut sorted = indices.to_vec();
            sorted.sort_by(|&a, &b| rows[a][feature].total_cmp(&rows[b][feature]).then(a.cmp(&b)));

            for cut in self.min_samples_leaf..=sorted.len().saturating_sub(self.min_samples_leaf) {
                if cut == 0 || cut == sorted.len() {
                    continue;
                }
                let lo = rows[sorted[cut - 1]][feature];
                let hi = rows[sorted[cut]][feature];
                if lo == hi {
                    continue;
                }

                let (left, right) = sorted.split_at(cut);
                let impurity = self.impurity(left.iter().map(|&i| target[i]))
                    + self.impurity(right.iter().map(|&i| target[i]));

                if best.as_ref().map_or(true, |b| impurity < b.impurity) {
                    best = Some(Candidate {
                        feature,
                        threshold: (lo + hi) / 2.0,
                        impurity,
                    });
                }
            }
        }
        best
    }

    fn grow(&self, rows: &[Vec<f64>], target: &[f64], indices: &[usize], depth: usize) -> Node {
        let leaf = || Node::Leaf(self.leaf_value(target, indices));
        if depth >= self.max_depth || indices.len() < 2 * self.min_samples_leaf {
            return leaf();
        }

        let current = self.impurity(indices.iter().map(|&i| target[i]));
        if current <= 1e-12 {
            return leaf();
        }

        match self.best_split(rows, target, indices) {
            Some(split) if split.impurity < current - 1e-12 => {
                let (left, right): (Vec<usize>, Vec<usize>) = indices
                    .iter()
                    .copied()
                    .partition(|&i| rows[i][split.feature] <= split.threshold);
                Node::Split {
                    feature: split.feature,
                    threshold: split.threshold,
                    left: Box::new(self.grow(rows, target, &left, depth + 1)),
                    right: Box::new(self.grow(rows, target, &right, depth + 1)),
                }
            }
            _ => leaf(),
        }
    }
}

impl Estimator for DecisionTree {
    fn name(&self) -> String {
        format!(
            "tree(max_depth={}, min_samples_leaf={})",
            self.max_depth, self.min_samples_leaf
        )
    }

    fn fit(&mut self, features: &FeatureMatrix, target: &[f64]) -> Result<(), ModelError> {
        check_training(&self.name(), features, target)?;
        let target = match self.task {
            LearnerTask::Regression => target.to_vec(),
            LearnerTask::Classification { n_classes } => target
                .iter()
                .map(|y| class_index(*y, n_classes).map(|c| c as f64))
                .collect::<Result<Vec<_>, _>>()?,
        };

        let indices: Vec<usize> = (0..features.n_rows()).collect();
        let root = self.grow(features.rows(), &target, &indices, 0);
        self.root = Some((root, features.n_features()));
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
        let (root, n_features) = self.root.as_ref().ok_or_else(|| ModelError::NotFitted {
            model: self.name(),
        })?;
        check_features(*n_features, features)?;

        Ok(features
            .rows()
            .iter()
            .map(|row| {
                let mut node = root;
                loop {
                    match node {
                        Node::Leaf(value) => break value.clone(),
                        Node::Split {
                            feature,
                            threshold,
                            left,
                            right,
                        } => {
                            node = if row[*feature] <= *threshold { &**left } else { &**right };
                        }
                    }
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(rows: Vec<Vec<f64>>) -> FeatureMatrix {
        let names = (0..rows[0].len()).map(|j| format!("f{j}")).collect();
        FeatureMatrix::new(names, rows).unwrap()
    }

    #[test]
    fn learns_a_threshold() {
        let features = matrix((0..20).map(|i| vec![i as f64, 0.0]).collect());
        let target: Vec<f64> = (0..20).map(|i| if i < 8 { 0.0 } else { 1.0 }).collect();

        let mut tree = DecisionTree::new(3, 1, LearnerTask::Classification { n_classes: 2 });
        tree.fit(&features, &target).unwrap();

        assert_eq!(tree.predict(&features).unwrap(), target);
        assert_eq!(tree.leaf_count(), 2);
        let scores = tree.predict_scores(&matrix(vec![vec![7.4, 0.0]])).unwrap();
        assert_eq!(scores[0], vec![1.0, 0.0]);
    }

    #[test]
    fn depth_zero_predicts_the_mean() {
        let features = matrix(vec![vec![1.0], vec![2.0], vec![3.0]]);
        let mut tree = DecisionTree::new(0, 1, LearnerTask::Regression);
        tree.fit(&features, &[1.0, 2.0, 6.0]).unwrap();
        assert_eq!(tree.predict(&features).unwrap(), vec![3.0, 3.0, 3.0]);
    }

    #[test]
    fn min_samples_leaf_limits_growth() {
        let features = matrix((0..6).map(|i| vec![i as f64]).collect());
        let target = [0.0, 10.0, 0.0, 10.0, 0.0, 10.0];

        let mut deep = DecisionTree::new(10, 1, LearnerTask::Regression);
        deep.fit(&features, &target).unwrap();
        assert_eq!(deep.predict(&features).unwrap(), target.to_vec());

        let mut coarse = DecisionTree::new(10, 3, LearnerTask::Regression);
        coarse.fit(&features, &target).unwrap();
        assert!(coarse.leaf_count() <= 2);
    }

    #[test]
    fn constant_features_yield_a_single_leaf() {
        let features = matrix(vec![vec![1.0]; 4]);
        let mut tree = DecisionTree::new(5, 1, LearnerTask::Classification { n_classes: 2 });
        tree.fit(&features, &[0.0, 1.0, 1.0, 1.0]).unwrap();
        assert_eq!(tree.leaf_count(), 1);
        assert_eq!(tree.predict(&features).unwrap(), vec![1.0; 4]);
    }

    #[test]
    fn impurity_is_weighted_gini_or_sse() {
        let classifier = DecisionTree::new(3, 1, LearnerTask::Classification { n_classes: 3 });
        let gini = classifier.impurity([0.0, 0.0, 1.0, 2.0].into_iter());
        assert!((gini - 2.5).abs() < 1e-12);
        assert_eq!(classifier.impurity(std::iter::empty::<f64>()), 0.0);

        let regressor = DecisionTree::new(3, 1, LearnerTask::Regression);
        assert!((regressor.impurity([1.0, 2.0, 3.0].into_iter()) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn name_reports_hyper_parameters() {
        let tree = DecisionTree::new(4, 2, LearnerTask::Regression);
        assert_eq!(tree.name(), "tree(max_depth=4, min_samples_leaf=2)");
    }
}
