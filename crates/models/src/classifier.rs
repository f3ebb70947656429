use crate::error::ModelError;

/// A binary classifier producing the probability of the positive class.
pub trait Classifier: Send + Sync {
    /// Fits on row-major samples `x` with 0/1 labels `y`.
    ///
    /// # Errors
    /// [`ModelError::EmptyTrainingSet`] for no samples, and
    /// [`ModelError::LabelMismatch`] / [`ModelError::DimensionMismatch`] for
    /// malformed input.
    fn fit(&mut self, x: &[Vec<f64>], y: &[u8]) -> Result<(), ModelError>;

    /// Probability that `features` belongs to class 1.
    ///
    /// # Errors
    /// [`ModelError::NotFitted`] before `fit`, or
    /// [`ModelError::DimensionMismatch`] for a vector of the wrong length.
    fn predict_proba(&self, features: &[f64]) -> Result<f64, ModelError>;

    /// Number of features seen during `fit`.
    fn n_features(&self) -> Option<usize>;

    /// Class decision: 1 when the probability is strictly above `threshold`.
    fn predict(&self, features: &[f64], threshold: f64) -> Result<u8, ModelError> {
        Ok(u8::from(self.predict_proba(features)? > threshold))
    }

    fn predict_proba_batch(&self, x: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
        x.iter().map(|row| self.predict_proba(row)).collect()
    }
}

/// Shared input validation for `fit`. Returns the feature count.
pub(crate) fn check_training_input(x: &[Vec<f64>], y: &[u8]) -> Result<usize, ModelError> {
    if x.is_empty() {
        return Err(ModelError::EmptyTrainingSet);
    }
    if x.len() != y.len() {
        return Err(ModelError::LabelMismatch {
            samples: x.len(),
            labels: y.len(),
        });
    }
    let n_features = x[0].len();
    if let Some(bad) = x.iter().find(|row| row.len() != n_features) {
        return Err(ModelError::DimensionMismatch {
            expected: n_features,
            got: bad.len(),
        });
    }
    Ok(n_features)
}

pub(crate) fn check_features(expected: Option<usize>, features: &[f64]) -> Result<(), ModelError> {
    let expected = expected.ok_or(ModelError::NotFitted)?;
    if features.len() != expected {
        return Err(ModelError::DimensionMismatch {
            expected,
            got: features.len(),
        });
    }
    Ok(())
}
