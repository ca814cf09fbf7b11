use crate::domain::model::{JointAngles, ServoCommand};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Maps a captured target position to joint angles.
///
/// Implementations are expected to be pure: same input, same output, no
/// retries and no caching.
pub trait AnglePredictor: Send + Sync {
    fn predict(&self, target: &[f64]) -> Result<JointAngles>;
}

/// Delivery channel to the physical arm controller.
#[async_trait]
pub trait ActuatorLink: Send + Sync {
    async fn push_angles(&self, command: &ServoCommand) -> Result<()>;
}
