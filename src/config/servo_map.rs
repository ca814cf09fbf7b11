use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::servo::{ServoChannel, ServoMap};
use crate::domain::model::JOINT_COUNT;
use crate::utils::error::{RelayError, Result};
use crate::utils::validation::Validate;

/// TOML override for the built-in servo calibration:
///
/// ```toml
/// [[channels]]
/// offset = 550.0
/// gain = 15.0
/// min = 550
/// max = 2400
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServoMapConfig {
    pub channels: Vec<ServoChannel>,
}

impl Validate for ServoMapConfig {
    fn validate(&self) -> Result<()> {
        if self.channels.len() != JOINT_COUNT {
            return Err(RelayError::InvalidConfigValueError {
                field: "channels".to_string(),
                value: self.channels.len().to_string(),
                reason: format!("servo map needs exactly {} channels", JOINT_COUNT),
            });
        }
        for (index, channel) in self.channels.iter().enumerate() {
            if channel.min > channel.max {
                return Err(RelayError::InvalidConfigValueError {
                    field: format!("channels[{}]", index),
                    value: format!("min={} max={}", channel.min, channel.max),
                    reason: "min must not exceed max".to_string(),
                });
            }
            if !channel.offset.is_finite() || !channel.gain.is_finite() {
                return Err(RelayError::InvalidConfigValueError {
                    field: format!("channels[{}]", index),
                    value: format!("offset={} gain={}", channel.offset, channel.gain),
                    reason: "offset and gain must be finite".to_string(),
                });
            }
        }
        Ok(())
    }
}

pub fn load_servo_map(path: &Path) -> Result<ServoMap> {
    let raw = std::fs::read_to_string(path)?;
    let config: ServoMapConfig = toml::from_str(&raw)?;
    config.validate()?;

    let channels: [ServoChannel; JOINT_COUNT] =
        config
            .channels
            .try_into()
            .map_err(|channels: Vec<ServoChannel>| RelayError::InvalidConfigValueError {
                field: "channels".to_string(),
                value: channels.len().to_string(),
                reason: format!("servo map needs exactly {} channels", JOINT_COUNT),
            })?;
    Ok(ServoMap::new(channels))
}
