pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod model;
pub mod utils;

pub use crate::adapters::actuator::HttpActuator;
pub use crate::config::RelayConfig;
pub use crate::core::relay::{RelayService, RelayStats};
pub use crate::core::server::RelayServer;
pub use crate::core::servo::ServoMap;
pub use crate::model::adapter::ModelAdapter;
pub use crate::utils::error::{RelayError, Result};
