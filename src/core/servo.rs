use serde::{Deserialize, Serialize};

use crate::domain::model::{JointAngles, ServoCommand, JOINT_COUNT};

/// One joint's conversion from a model angle to a servo pulse width:
/// affine rescale, clamp into `[min, max]`, truncate to an integer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ServoChannel {
    pub offset: f64,
    pub gain: f64,
    pub min: i64,
    pub max: i64,
}

impl ServoChannel {
    pub fn rescale(&self, angle: f64) -> f64 {
        self.offset + self.gain * angle
    }

    /// Clamp a pulse width into this channel's bounds. Idempotent.
    pub fn clamp(&self, pulse: f64) -> f64 {
        pulse.clamp(self.min as f64, self.max as f64)
    }

    pub fn apply(&self, angle: f64) -> i64 {
        self.clamp(self.rescale(angle)) as i64
    }
}

/// Per-joint conversion table, one channel per actuator joint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServoMap {
    channels: [ServoChannel; JOINT_COUNT],
}

impl ServoMap {
    pub fn new(channels: [ServoChannel; JOINT_COUNT]) -> Self {
        Self { channels }
    }

    pub fn channels(&self) -> &[ServoChannel; JOINT_COUNT] {
        &self.channels
    }

    pub fn apply(&self, angles: &JointAngles) -> ServoCommand {
        let mut pulses = [0i64; JOINT_COUNT];
        for (pulse, (channel, angle)) in pulses
            .iter_mut()
            .zip(self.channels.iter().zip(angles.iter()))
        {
            *pulse = channel.apply(*angle);
        }
        ServoCommand { angles: pulses }
    }
}

impl Default for ServoMap {
    // Calibration measured on the deployed arm controller.
    fn default() -> Self {
        Self::new([
            ServoChannel {
                offset: 550.0,
                gain: 15.0,
                min: 550,
                max: 2400,
            },
            ServoChannel {
                offset: 1233.0,
                gain: 8.66,
                min: 800,
                max: 2100,
            },
            ServoChannel {
                offset: 2065.0,
                gain: 9.65,
                min: 1100,
                max: 2500,
            },
            ServoChannel {
                offset: 2000.0,
                gain: -10.0,
                min: 700,
                max: 2400,
            },
        ])
    }
}
