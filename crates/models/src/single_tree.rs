use crate::classifier::{check_features, check_training_input, Classifier};
use crate::error::ModelError;
use crate::tree::{grow, GrowthParams, Tree};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// A single CART classification tree. Leaves hold the class-1 frequency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    max_depth: Option<usize>,
    seed: u64,
    tree: Option<Tree>,
    n_features: Option<usize>,
}

impl DecisionTree {
    #[must_use]
    pub fn new(max_depth: Option<usize>, seed: u64) -> Self {
        Self {
            max_depth,
            seed,
            tree: None,
            n_features: None,
        }
    }

    #[must_use]
    pub fn tree(&self) -> Option<&Tree> {
        self.tree.as_ref()
    }
}

/// Gradient and hessian that make [`grow`] a CART fit on 0/1 labels.
pub(crate) fn cart_targets(y: &[u8]) -> (Vec<f64>, Vec<f64>) {
    (y.iter().map(|&v| -f64::from(v)).collect(), vec![1.0; y.len()])
}

impl Classifier for DecisionTree {
    fn fit(&mut self, x: &[Vec<f64>], y: &[u8]) -> Result<(), ModelError> {
        let n_features = check_training_input(x, y)?;
        let (grad, hess) = cart_targets(y);
        let samples: Vec<usize> = (0..x.len()).collect();
        let params = GrowthParams {
            max_depth: self.max_depth,
            ..GrowthParams::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        self.tree = Some(grow(x, &grad, &hess, &samples, &params, &mut rng));
        self.n_features = Some(n_features);
        Ok(())
    }

    fn predict_proba(&self, features: &[f64]) -> Result<f64, ModelError> {
        check_features(self.n_features, features)?;
        let tree = self.tree.as_ref().ok_or(ModelError::NotFitted)?;
        Ok(tree.predict(features).clamp(0.0, 1.0))
    }

    fn n_features(&self) -> Option<usize> {
        self.n_features
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_tree_classification() {
        let x: Vec<Vec<f64>> = (0..100).map(|i| vec![f64::from(i) / 10.0]).collect();
        let y: Vec<u8> = (0..100).map(|i| u8::from(i > 50)).collect();

        let mut tree = DecisionTree::new(Some(3), 42);
        tree.fit(&x, &y).unwrap();

        let proba = tree.predict_proba_batch(&x).unwrap();
        let correct = proba
            .iter()
            .zip(&y)
            .filter(|(p, &label)| u8::from(**p > 0.5) == label)
            .count();
        assert!(correct > 90);
    }

    #[test]
    fn unfitted_tree_errors() {
        let tree = DecisionTree::new(Some(3), 42);
        assert!(matches!(tree.predict_proba(&[1.0]), Err(ModelError::NotFitted)));
    }

    #[test]
    fn dimension_mismatch() {
        let mut tree = DecisionTree::new(None, 42);
        tree.fit(&[vec![0.0, 1.0], vec![1.0, 0.0]], &[0, 1]).unwrap();
        assert!(matches!(
            tree.predict_proba(&[1.0]),
            Err(ModelError::DimensionMismatch { expected: 2, got: 1 })
        ));
    }

    #[test]
    fn empty_training_set() {
        let mut tree = DecisionTree::new(None, 42);
        assert!(matches!(tree.fit(&[], &[]), Err(ModelError::EmptyTrainingSet)));
    }
}
