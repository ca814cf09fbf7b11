use std::fs;
use std::path::Path;

use crate::domain::model::{JointAngles, JOINT_COUNT};
use crate::domain::ports::AnglePredictor;
use crate::model::network::{FeedForward, NetworkSpec};
use crate::model::scaler::StandardScaler;
use crate::utils::error::{RelayError, Result};

pub const NETWORK_FILE: &str = "network.json";
pub const X_SCALER_FILE: &str = "x_scaler.json";
pub const Y_SCALER_FILE: &str = "y_scaler.json";

/// Pretrained regression model plus its two fitted scalers.
///
/// Artifacts are loaded once at process start; after that `predict` is a
/// pure function shared by every connection.
pub struct ModelAdapter {
    network: FeedForward,
    x_scaler: StandardScaler,
    y_scaler: StandardScaler,
}

impl ModelAdapter {
    pub fn load(model_dir: &Path) -> Result<Self> {
        let spec: NetworkSpec = read_json(&model_dir.join(NETWORK_FILE))?;
        let network = FeedForward::from_spec(spec)?;
        let x_scaler: StandardScaler = read_json(&model_dir.join(X_SCALER_FILE))?;
        let x_scaler = x_scaler.validated()?;
        let y_scaler: StandardScaler = read_json(&model_dir.join(Y_SCALER_FILE))?;
        let y_scaler = y_scaler.validated()?;

        // 三個檔案必須彼此一致,啟動時就擋下來
        if x_scaler.len() != network.input_dim() {
            return Err(RelayError::ModelError {
                message: format!(
                    "input scaler covers {} features but the network takes {}",
                    x_scaler.len(),
                    network.input_dim()
                ),
            });
        }
        if y_scaler.len() != network.output_dim() {
            return Err(RelayError::ModelError {
                message: format!(
                    "output scaler covers {} features but the network produces {}",
                    y_scaler.len(),
                    network.output_dim()
                ),
            });
        }
        if network.output_dim() != JOINT_COUNT {
            return Err(RelayError::ModelError {
                message: format!(
                    "network produces {} outputs, the arm has {} joints",
                    network.output_dim(),
                    JOINT_COUNT
                ),
            });
        }

        Ok(Self {
            network,
            x_scaler,
            y_scaler,
        })
    }
}

impl AnglePredictor for ModelAdapter {
    fn predict(&self, target: &[f64]) -> Result<JointAngles> {
        let normalized = self.x_scaler.transform(target)?;
        let raw = self.network.forward(&normalized)?;
        let angles = self.y_scaler.inverse_transform(&raw)?;
        angles
            .try_into()
            .map_err(|angles: Vec<f64>| RelayError::ModelError {
                message: format!(
                    "model produced {} angles, expected {}",
                    angles.len(),
                    JOINT_COUNT
                ),
            })
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path).map_err(|e| RelayError::ModelError {
        message: format!("cannot read {}: {}", path.display(), e),
    })?;
    Ok(serde_json::from_str(&raw)?)
}
