use serde::{Deserialize, Serialize};

/// Number of actuated joints on the arm.
pub const JOINT_COUNT: usize = 4;

/// Joint angles as produced by the regression model, one per joint.
pub type JointAngles = [f64; JOINT_COUNT];

/// Inbound frame from the capture client.
///
/// The position is kept optional so a frame without it can be logged and
/// dropped instead of failing deserialization.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetMessage {
    #[serde(rename = "Target_position")]
    pub target_position: Option<Vec<f64>>,
}

/// Outbound frame fanned out to every connected listener.
///
/// The original wire protocol reuses the inbound key on the outbound leg;
/// existing clients depend on it.
#[derive(Debug, Clone, Serialize)]
pub struct AngleBroadcast {
    #[serde(rename = "Target_position")]
    pub target_position: JointAngles,
}

/// Integer pulse widths POSTed to the arm controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServoCommand {
    pub angles: [i64; JOINT_COUNT],
}
