pub mod servo_map;

use std::path::PathBuf;

use clap::Parser;

use crate::utils::error::{RelayError, Result};
use crate::utils::validation::{self, Validate};

/// Runtime configuration.
///
/// Every default reproduces the constants of the deployed installation,
/// so a bare `arm-relay` invocation behaves like the original setup.
#[derive(Debug, Clone, Parser)]
#[command(name = "arm-relay")]
#[command(about = "Relays mocap target positions to robotic arm joint angles")]
pub struct RelayConfig {
    /// Port for the WebSocket data channel
    #[arg(long, default_value = "8765")]
    pub ws_port: u16,

    /// Port for the administrative HTTP endpoint
    #[arg(long, default_value = "5000")]
    pub control_port: u16,

    /// Arm controller host
    #[arg(long, default_value = "192.168.1.33")]
    pub actuator_host: String,

    /// Arm controller port
    #[arg(long, default_value = "8080")]
    pub actuator_port: u16,

    /// Timeout for one actuator POST, in milliseconds
    #[arg(long, default_value = "1000")]
    pub actuator_timeout_ms: u64,

    /// Directory holding network.json, x_scaler.json and y_scaler.json
    #[arg(long, default_value = "./model")]
    pub model_dir: PathBuf,

    /// Optional TOML file overriding the built-in servo calibration
    #[arg(long)]
    pub servo_map: Option<PathBuf>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl RelayConfig {
    pub fn actuator_url(&self) -> String {
        format!("http://{}:{}/", self.actuator_host, self.actuator_port)
    }
}

impl Validate for RelayConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_port("ws_port", self.ws_port)?;
        validation::validate_port("control_port", self.control_port)?;
        validation::validate_port("actuator_port", self.actuator_port)?;
        if self.ws_port == self.control_port {
            return Err(RelayError::InvalidConfigValueError {
                field: "control_port".to_string(),
                value: self.control_port.to_string(),
                reason: "data and control ports must differ".to_string(),
            });
        }
        validation::validate_non_empty_string("actuator_host", &self.actuator_host)?;
        validation::validate_endpoint_url("actuator_host", &self.actuator_url())?;
        validation::validate_positive_number("actuator_timeout_ms", self.actuator_timeout_ms, 1)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> RelayConfig {
        RelayConfig {
            ws_port: 8765,
            control_port: 5000,
            actuator_host: "192.168.1.33".to_string(),
            actuator_port: 8080,
            actuator_timeout_ms: 1000,
            model_dir: PathBuf::from("./model"),
            servo_map: None,
            verbose: false,
        }
    }

    #[test]
    fn test_defaults_validate() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn test_actuator_url_shape() {
        assert_eq!(base_config().actuator_url(), "http://192.168.1.33:8080/");
    }

    #[test]
    fn test_port_collision_is_rejected() {
        let mut config = base_config();
        config.control_port = config.ws_port;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_blank_actuator_host_is_rejected() {
        let mut config = base_config();
        config.actuator_host = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let mut config = base_config();
        config.actuator_timeout_ms = 0;
        assert!(config.validate().is_err());
    }
}
