use crate::classifier::{check_features, check_training_input, Classifier};
use crate::error::ModelError;
use crate::single_tree::cart_targets;
use crate::tree::{grow, GrowthParams, Tree};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Bagged CART trees; the probability is the mean of the trees' leaf
/// frequencies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    n_estimators: usize,
    max_depth: Option<usize>,
    seed: u64,
    trees: Vec<Tree>,
    n_features: Option<usize>,
}

impl RandomForest {
    #[must_use]
    pub fn new(n_estimators: usize, max_depth: Option<usize>, seed: u64) -> Self {
        Self {
            n_estimators,
            max_depth,
            seed,
            trees: Vec::new(),
            n_features: None,
        }
    }

    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

/// Features tried per split: `floor(sqrt(F))`, at least one.
fn features_per_split(n_features: usize) -> usize {
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let k = (n_features as f64).sqrt().floor() as usize;
    k.max(1)
}

impl Classifier for RandomForest {
    fn fit(&mut self, x: &[Vec<f64>], y: &[u8]) -> Result<(), ModelError> {
        let n_features = check_training_input(x, y)?;
        let (grad, hess) = cart_targets(y);
        let params = GrowthParams {
            max_depth: self.max_depth,
            max_features: Some(features_per_split(n_features)),
            ..GrowthParams::default()
        };

        let n = x.len();
        self.trees = (0..self.n_estimators)
            .map(|i| {
                let mut rng = ChaCha8Rng::seed_from_u64(self.seed.wrapping_add(i as u64));
                let sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                grow(x, &grad, &hess, &sample, &params, &mut rng)
            })
            .collect();
        self.n_features = Some(n_features);
        Ok(())
    }

    fn predict_proba(&self, features: &[f64]) -> Result<f64, ModelError> {
        check_features(self.n_features, features)?;
        if self.trees.is_empty() {
            return Err(ModelError::NotFitted);
        }
        #[allow(clippy::cast_precision_loss)]
        let mean = self.trees.iter().map(|t| t.predict(features)).sum::<f64>()
            / self.trees.len() as f64;
        Ok(mean.clamp(0.0, 1.0))
    }

    fn n_features(&self) -> Option<usize> {
        self.n_features
    }
}
