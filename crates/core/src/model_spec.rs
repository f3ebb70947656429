//! Model families and their hyperparameters.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Classifier family, keyed by the tag used in config files and artifact names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    LightGbm,
    XgBoost,
    RandomForest,
    DecisionTree,
    GradientBoosting,
}

impl ModelKind {
    pub const ALL: [ModelKind; 5] = [
        ModelKind::LightGbm,
        ModelKind::XgBoost,
        ModelKind::RandomForest,
        ModelKind::DecisionTree,
        ModelKind::GradientBoosting,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::LightGbm => "lightgbm",
            ModelKind::XgBoost => "xgboost",
            ModelKind::RandomForest => "randomforest",
            ModelKind::DecisionTree => "decisiontree",
            ModelKind::GradientBoosting => "gradientboosting",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_ascii_lowercase();
        ModelKind::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == tag)
            .ok_or_else(|| anyhow::anyhow!("Unsupported model: {s}"))
    }
}

/// Hyperparameters for one grid entry.
///
/// Fields a family does not use are ignored; unset fields fall back to the
/// family defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_estimators: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learning_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_leaves: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl ModelParams {
    #[must_use]
    pub fn with_estimators(mut self, n: usize) -> Self {
        self.n_estimators = Some(n);
        self
    }

    #[must_use]
    pub fn with_learning_rate(mut self, rate: f64) -> Self {
        self.learning_rate = Some(rate);
        self
    }

    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    #[must_use]
    pub fn with_num_leaves(mut self, leaves: usize) -> Self {
        self.num_leaves = Some(leaves);
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

impl fmt::Display for ModelParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(n) = self.n_estimators {
            parts.push(format!("n_estimators={n}"));
        }
        if let Some(rate) = self.learning_rate {
            parts.push(format!("learning_rate={rate}"));
        }
        if let Some(depth) = self.max_depth {
            parts.push(format!("max_depth={depth}"));
        }
        if let Some(leaves) = self.num_leaves {
            parts.push(format!("num_leaves={leaves}"));
        }
        if let Some(seed) = self.seed {
            parts.push(format!("seed={seed}"));
        }
        if parts.is_empty() {
            f.write_str("defaults")
        } else {
            f.write_str(&parts.join(", "))
        }
    }
}

/// One row of the hyperparameter grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridEntry {
    pub model: ModelKind,
    #[serde(default)]
    pub params: ModelParams,
}

impl GridEntry {
    #[must_use]
    pub fn new(model: ModelKind, params: ModelParams) -> Self {
        Self { model, params }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_kind_parses_tags_case_insensitively() {
        assert_eq!("lightgbm".parse::<ModelKind>().unwrap(), ModelKind::LightGbm);
        assert_eq!("XGBoost".parse::<ModelKind>().unwrap(), ModelKind::XgBoost);
        assert_eq!(
            " randomforest ".parse::<ModelKind>().unwrap(),
            ModelKind::RandomForest
        );
        assert!("svm".parse::<ModelKind>().is_err());
    }

    #[test]
    fn model_kind_serde_uses_tags() {
        let json = serde_json::to_string(&ModelKind::GradientBoosting).unwrap();
        assert_eq!(json, "\"gradientboosting\"");
        let kind: ModelKind = serde_json::from_str("\"decisiontree\"").unwrap();
        assert_eq!(kind, ModelKind::DecisionTree);
    }

    #[test]
    fn params_display_lists_set_fields_in_order() {
        let params = ModelParams::default()
            .with_estimators(100)
            .with_learning_rate(0.1)
            .with_max_depth(3);
        assert_eq!(
            params.to_string(),
            "n_estimators=100, learning_rate=0.1, max_depth=3"
        );
        assert_eq!(ModelParams::default().to_string(), "defaults");
    }

    #[test]
    fn params_reject_unknown_fields() {
        let result: Result<ModelParams, _> = serde_json::from_str(r#"{"gamma": 0.5}"#);
        assert!(result.is_err());
    }
}
