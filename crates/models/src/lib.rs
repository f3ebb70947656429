//! Binary classifiers over flattened window features.
//!
//! Every family is a tree model grown by [`tree::grow`]:
//! - `decisiontree`: a single CART tree (Gini-equivalent variance reduction)
//! - `randomforest`: bagged CART trees with `sqrt(F)` features per split
//! - `gradientboosting`, `xgboost`, `lightgbm`: logistic-loss boosting with
//!   Newton leaf values, differing in regularisation and growth limits
//!
//! Fitted models are persisted as JSON [`ModelArtifact`]s keyed by
//! (model kind, window width).

pub mod artifact;
pub mod boosting;
pub mod classifier;
pub mod error;
pub mod forest;
pub mod metrics;
pub mod registry;
pub mod single_tree;
pub mod tree;

pub use artifact::{artifact_path, remove_artifact, ModelArtifact};
pub use boosting::{BoostedTrees, BoostingParams};
pub use classifier::Classifier;
pub use error::ModelError;
pub use forest::RandomForest;
pub use metrics::{accuracy, f1_score, roc_auc, ClassificationMetrics};
pub use registry::Model;
pub use single_tree::DecisionTree;
pub use tree::{GrowthParams, Tree};
