use sentistock_core::{ExperimentConfig, ModelKind, ModelParams};
use std::fmt;

/// One (model, window, parameter set) experiment.
#[derive(Debug, Clone, PartialEq)]
pub struct Combination {
    pub model: ModelKind,
    pub window: usize,
    pub params: ModelParams,
    /// Position of the parameter set in the configured grid.
    pub grid_index: usize,
}

impl fmt::Display for Combination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} window={} [{}]", self.model, self.window, self.params)
    }
}

/// Enumerates combinations model-major, then window, then grid order.
#[must_use]
pub fn enumerate_combinations(config: &ExperimentConfig) -> Vec<Combination> {
    let mut combinations = Vec::new();
    for model in config.model_kinds() {
        for &window in &config.windows {
            for (grid_index, entry) in config.grid.iter().enumerate() {
                if entry.model == model {
                    combinations.push(Combination {
                        model,
                        window,
                        params: entry.params.clone(),
                        grid_index,
                    });
                }
            }
        }
    }
    combinations
}
