use crate::boosting::{BoostedTrees, BoostingParams};
use crate::classifier::Classifier;
use crate::error::ModelError;
use crate::forest::RandomForest;
use crate::single_tree::DecisionTree;
use sentistock_core::{ModelKind, ModelParams};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SEED: u64 = 42;

/// A classifier of any supported family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Model {
    LightGbm(BoostedTrees),
    XgBoost(BoostedTrees),
    RandomForest(RandomForest),
    DecisionTree(DecisionTree),
    GradientBoosting(BoostedTrees),
}

impl Model {
    /// Builds an unfitted model of `kind`. Unset parameters take the family
    /// defaults and parameters the family does not use are ignored.
    ///
    /// # Errors
    /// Returns [`ModelError::InvalidParams`] for zero counts or a learning
    /// rate outside `(0, 1]`.
    pub fn new(kind: ModelKind, params: &ModelParams) -> Result<Self, ModelError> {
        validate(kind, params)?;
        let seed = params.seed.unwrap_or(DEFAULT_SEED);

        let model = match kind {
            ModelKind::LightGbm => Model::LightGbm(BoostedTrees::new(
                BoostingParams::lightgbm(
                    params.n_estimators.unwrap_or(100),
                    params.learning_rate.unwrap_or(0.1),
                    params.num_leaves.unwrap_or(31),
                    params.max_depth,
                )
                .with_seed(seed),
            )),
            ModelKind::XgBoost => Model::XgBoost(BoostedTrees::new(
                BoostingParams::xgboost(
                    params.n_estimators.unwrap_or(100),
                    params.learning_rate.unwrap_or(0.3),
                    params.max_depth.unwrap_or(6),
                )
                .with_seed(seed),
            )),
            ModelKind::RandomForest => Model::RandomForest(RandomForest::new(
                params.n_estimators.unwrap_or(100),
                params.max_depth,
                seed,
            )),
            ModelKind::DecisionTree => Model::DecisionTree(DecisionTree::new(params.max_depth, seed)),
            ModelKind::GradientBoosting => Model::GradientBoosting(BoostedTrees::new(
                BoostingParams::gradient_boosting(
                    params.n_estimators.unwrap_or(100),
                    params.learning_rate.unwrap_or(0.1),
                    params.max_depth.unwrap_or(3),
                )
                .with_seed(seed),
            )),
        };
        Ok(model)
    }

    #[must_use]
    pub fn kind(&self) -> ModelKind {
        match self {
            Model::LightGbm(_) => ModelKind::LightGbm,
            Model::XgBoost(_) => ModelKind::XgBoost,
            Model::RandomForest(_) => ModelKind::RandomForest,
            Model::DecisionTree(_) => ModelKind::DecisionTree,
            Model::GradientBoosting(_) => ModelKind::GradientBoosting,
        }
    }

    fn inner(&self) -> &dyn Classifier {
        match self {
            Model::LightGbm(m) | Model::XgBoost(m) | Model::GradientBoosting(m) => m,
            Model::RandomForest(m) => m,
            Model::DecisionTree(m) => m,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Classifier {
        match self {
            Model::LightGbm(m) | Model::XgBoost(m) | Model::GradientBoosting(m) => m,
            Model::RandomForest(m) => m,
            Model::DecisionTree(m) => m,
        }
    }
}

fn validate(kind: ModelKind, params: &ModelParams) -> Result<(), ModelError> {
    let invalid = |reason: &str| ModelError::InvalidParams {
        model: kind.to_string(),
        reason: reason.to_string(),
    };

    if params.n_estimators == Some(0) {
        return Err(invalid("n_estimators must be positive"));
    }
    if params.max_depth == Some(0) {
        return Err(invalid("max_depth must be positive"));
    }
    if params.num_leaves.is_some_and(|n| n < 2) {
        return Err(invalid("num_leaves must be at least 2"));
    }
    if let Some(rate) = params.learning_rate {
        if !(rate > 0.0 && rate <= 1.0) {
            return Err(invalid("learning_rate must be in (0, 1]"));
        }
    }
    Ok(())
}

impl Classifier for Model {
    fn fit(&mut self, x: &[Vec<f64>], y: &[u8]) -> Result<(), ModelError> {
        self.inner_mut().fit(x, y)
    }

    fn predict_proba(&self, features: &[f64]) -> Result<f64, ModelError> {
        self.inner().predict_proba(features)
    }

    fn n_features(&self) -> Option<usize> {
        self.inner().n_features()
    }
}
