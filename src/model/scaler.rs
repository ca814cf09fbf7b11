use serde::{Deserialize, Serialize};

use crate::utils::error::{RelayError, Result};

/// Fitted standardization transform: `z = (x - mean) / scale`.
///
/// Exported by the offline training pipeline together with the network;
/// one instance normalizes the input position, the other de-normalizes
/// the predicted angles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Result<Self> {
        Self { mean, scale }.validated()
    }

    /// Check invariants after construction or deserialization.
    pub fn validated(self) -> Result<Self> {
        if self.mean.is_empty() || self.mean.len() != self.scale.len() {
            return Err(RelayError::ModelError {
                message: format!(
                    "scaler dimension mismatch: {} mean values vs {} scale values",
                    self.mean.len(),
                    self.scale.len()
                ),
            });
        }
        if self.scale.iter().any(|s| *s == 0.0 || !s.is_finite()) {
            return Err(RelayError::ModelError {
                message: "scaler contains a zero or non-finite scale value".to_string(),
            });
        }
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.mean.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }

    pub fn transform(&self, input: &[f64]) -> Result<Vec<f64>> {
        self.check_arity(input.len())?;
        Ok(input
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (mean, scale))| (x - mean) / scale)
            .collect())
    }

    pub fn inverse_transform(&self, input: &[f64]) -> Result<Vec<f64>> {
        self.check_arity(input.len())?;
        Ok(input
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(z, (mean, scale))| z * scale + mean)
            .collect())
    }

    fn check_arity(&self, got: usize) -> Result<()> {
        if got != self.mean.len() {
            return Err(RelayError::ModelError {
                message: format!(
                    "scaler expects {} values, got {}",
                    self.mean.len(),
                    got
                ),
            });
        }
        Ok(())
    }
}
