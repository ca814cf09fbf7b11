pub mod control;
pub mod relay;
pub mod server;
pub mod servo;

pub use crate::domain::model::{AngleBroadcast, ServoCommand, TargetMessage};
pub use crate::domain::ports::{ActuatorLink, AnglePredictor};
pub use crate::utils::error::Result;
