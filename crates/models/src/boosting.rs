//! Logistic-loss gradient boosting.
//!
//! Each round fits a [`Tree`] to the gradient `p - y` and hessian
//! `p (1 - p)` of the log loss at the current raw score, so leaf values are
//! Newton steps. The three boosting families share this loop and differ only
//! in [`BoostingParams`].

use crate::classifier::{check_features, check_training_input, Classifier};
use crate::error::ModelError;
use crate::tree::{grow, GrowthParams, Tree};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

const PROBA_CLAMP: f64 = 1e-6;
const MIN_HESSIAN: f64 = 1e-16;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoostingParams {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub growth: GrowthParams,
    pub seed: u64,
}

impl BoostingParams {
    /// Depth-limited trees with no regularisation.
    #[must_use]
    pub fn gradient_boosting(n_estimators: usize, learning_rate: f64, max_depth: usize) -> Self {
        Self {
            n_estimators,
            learning_rate,
            growth: GrowthParams {
                max_depth: Some(max_depth),
                ..GrowthParams::default()
            },
            seed: 0,
        }
    }

    /// Depth-limited trees with `lambda = 1` and a unit minimum child weight.
    #[must_use]
    pub fn xgboost(n_estimators: usize, learning_rate: f64, max_depth: usize) -> Self {
        Self {
            n_estimators,
            learning_rate,
            growth: GrowthParams {
                max_depth: Some(max_depth),
                min_child_weight: 1.0,
                lambda: 1.0,
                ..GrowthParams::default()
            },
            seed: 0,
        }
    }

    /// Leaf-wise trees capped at `num_leaves`, at least 20 samples per leaf.
    #[must_use]
    pub fn lightgbm(
        n_estimators: usize,
        learning_rate: f64,
        num_leaves: usize,
        max_depth: Option<usize>,
    ) -> Self {
        Self {
            n_estimators,
            learning_rate,
            growth: GrowthParams {
                max_depth,
                max_leaves: Some(num_leaves),
                min_samples_leaf: 20,
                min_child_weight: 1e-3,
                ..GrowthParams::default()
            },
            seed: 0,
        }
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoostedTrees {
    params: BoostingParams,
    base_score: f64,
    trees: Vec<Tree>,
    n_features: Option<usize>,
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

impl BoostedTrees {
    #[must_use]
    pub fn new(params: BoostingParams) -> Self {
        Self {
            params,
            base_score: 0.0,
            trees: Vec::new(),
            n_features: None,
        }
    }

    #[must_use]
    pub fn params(&self) -> &BoostingParams {
        &self.params
    }

    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    fn raw_score(&self, features: &[f64]) -> f64 {
        self.base_score
            + self.params.learning_rate * self.trees.iter().map(|t| t.predict(features)).sum::<f64>()
    }
}

impl Classifier for BoostedTrees {
    fn fit(&mut self, x: &[Vec<f64>], y: &[u8]) -> Result<(), ModelError> {
        let n_features = check_training_input(x, y)?;
        let labels: Vec<f64> = y.iter().map(|&v| f64::from(v)).collect();

        #[allow(clippy::cast_precision_loss)]
        let prior = (labels.iter().sum::<f64>() / labels.len() as f64)
            .clamp(PROBA_CLAMP, 1.0 - PROBA_CLAMP);
        self.base_score = (prior / (1.0 - prior)).ln();
        self.trees.clear();

        let samples: Vec<usize> = (0..x.len()).collect();
        let mut raw = vec![self.base_score; x.len()];
        let mut rng = ChaCha8Rng::seed_from_u64(self.params.seed);

        for _ in 0..self.params.n_estimators {
            let proba: Vec<f64> = raw.iter().map(|&z| sigmoid(z)).collect();
            let grad: Vec<f64> = proba.iter().zip(&labels).map(|(p, y)| p - y).collect();
            let hess: Vec<f64> = proba.iter().map(|p| (p * (1.0 - p)).max(MIN_HESSIAN)).collect();

            let tree = grow(x, &grad, &hess, &samples, &self.params.growth, &mut rng);
            for (score, row) in raw.iter_mut().zip(x) {
                *score += self.params.learning_rate * tree.predict(row);
            }
            self.trees.push(tree);
        }

        self.n_features = Some(n_features);
        Ok(())
    }

    fn predict_proba(&self, features: &[f64]) -> Result<f64, ModelError> {
        check_features(self.n_features, features)?;
        Ok(sigmoid(self.raw_score(features)))
    }

    fn n_features(&self) -> Option<usize> {
        self.n_features
    }
}
