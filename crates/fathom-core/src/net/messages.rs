use serde::{Deserialize, Serialize};

use crate::math::{WireQuat, WireVec3};

/// Network message type discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum MessageType {
    // Owner -> Authority
    SetTransform = 0x01,
    StartShooting = 0x02,
    StopShooting = 0x03,

    // Authority -> Observers
    MovementUpdate = 0x10,
    ShootingState = 0x11,
    JuggernautState = 0x12,
}

impl MessageType {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0x01 => Some(Self::SetTransform),
            0x02 => Some(Self::StartShooting),
            0x03 => Some(Self::StopShooting),
            0x10 => Some(Self::MovementUpdate),
            0x11 => Some(Self::ShootingState),
            0x12 => Some(Self::JuggernautState),
            _ => None,
        }
    }
}

/// Delivery guarantee a message requires from the transport. Continuous
/// state tolerates drops (the next update supersedes); discrete transitions
/// must not be lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Unreliable,
    Reliable,
}

/// Versioned canonical movement state replicated authority -> observers.
/// `timestamp` is server clock seconds and is monotonically non-decreasing
/// per actor as seen by any single consumer; a freshly received snapshot may
/// still sit in the past relative to the local clock (network latency), which
/// is expected and clamped, never rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovementSnapshot {
    pub timestamp: f32,
    pub position: WireVec3,
    pub orientation: WireQuat,
    pub velocity: WireVec3,
}

impl Default for MovementSnapshot {
    fn default() -> Self {
        Self {
            timestamp: 0.0,
            position: WireVec3::ZERO,
            orientation: WireQuat::IDENTITY,
            velocity: WireVec3::ZERO,
        }
    }
}

/// Owner -> authority transform report (unreliable, high frequency).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SetTransformMsg {
    pub timestamp: f32,
    pub position: WireVec3,
    pub orientation: WireQuat,
    pub velocity: WireVec3,
}

/// Owner -> authority trigger press carrying the predicted first shot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StartShootingMsg {
    pub timestamp: f32,
    pub position: WireVec3,
    pub orientation: WireQuat,
    pub velocity: WireVec3,
}

/// Owner -> authority trigger release.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StopShootingMsg {
    pub timestamp: f32,
}

/// Authority -> observers firing-state flag (last-write-wins).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShootingStateMsg {
    pub is_shooting: bool,
}

/// Authority -> observers juggernaut promotion flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JuggernautStateMsg {
    pub is_juggernaut: bool,
}

/// Messages sent by the owning client to the authority.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClientMessage {
    SetTransform(SetTransformMsg),
    StartShooting(StartShootingMsg),
    StopShooting(StopShootingMsg),
}

impl ClientMessage {
    pub fn channel(&self) -> Channel {
        match self {
            Self::SetTransform(_) => Channel::Unreliable,
            Self::StartShooting(_) | Self::StopShooting(_) => Channel::Reliable,
        }
    }
}

/// Messages pushed by the authority to observers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ServerMessage {
    MovementUpdate(MovementSnapshot),
    ShootingState(ShootingStateMsg),
    JuggernautState(JuggernautStateMsg),
}

impl ServerMessage {
    pub fn channel(&self) -> Channel {
        match self {
            Self::MovementUpdate(_) => Channel::Unreliable,
            Self::ShootingState(_) | Self::JuggernautState(_) => Channel::Reliable,
        }
    }
}
