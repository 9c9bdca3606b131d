use serde::{Deserialize, Serialize};

/// Dash and charged-dash tuning.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct DashConfig {
    /// Impulse magnitude for a standard dash (units/s).
    pub dash_speed: f32,
    /// Deceleration applied for the duration of a standard dash.
    pub dash_slowdown: f32,
    /// Standard dash duration (seconds).
    pub dash_duration: f32,
    /// Cooldown after a standard dash finishes (seconds).
    pub dash_cooldown: f32,
    /// Velocity set by a fully charged juggernaut dash (units/s).
    pub juggernaut_dash_speed: f32,
    /// Time to reach a full charge (seconds).
    pub juggernaut_dash_charge_duration: f32,
    /// Duration of a fully charged juggernaut dash (seconds).
    pub juggernaut_dash_duration: f32,
    /// Cooldown between juggernaut dashes (seconds).
    pub juggernaut_dash_cooldown: f32,
}

impl Default for DashConfig {
    fn default() -> Self {
        Self {
            dash_speed: 3000.0,
            dash_slowdown: 4000.0,
            dash_duration: 0.75,
            dash_cooldown: 2.0,
            juggernaut_dash_speed: 6000.0,
            juggernaut_dash_charge_duration: 2.0,
            juggernaut_dash_duration: 1.5,
            juggernaut_dash_cooldown: 4.0,
        }
    }
}

/// Pawn movement and replication configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct PawnConfig {
    /// Scale applied to strafe input.
    pub move_sensitivity: f32,
    /// Rotation rate at full input (degrees/s).
    pub rotate_sensitivity: f32,
    /// How long after a roll input the auto roll correction stays off (seconds).
    pub roll_cooldown: f32,
    /// Exponential smoothing rate for snapping roll to the nearest 90 degrees.
    pub corrective_speed: f32,
    /// Maximum snapshot staleness still extrapolated (seconds).
    pub extrapolation_limit: f32,
    pub dash: DashConfig,
}

impl Default for PawnConfig {
    fn default() -> Self {
        Self {
            move_sensitivity: 1.0,
            rotate_sensitivity: 50.0,
            roll_cooldown: 0.2,
            corrective_speed: 5.0,
            extrapolation_limit: 0.1,
            dash: DashConfig::default(),
        }
    }
}

impl PawnConfig {
    /// Load config from environment or TOML file, falling back to defaults.
    pub fn load() -> Self {
        if let Ok(path) = std::env::var("FATHOM_PAWN_CONFIG")
            && let Ok(contents) = std::fs::read_to_string(&path)
            && let Ok(config) = toml::from_str::<Self>(&contents)
        {
            return config;
        }
        if let Ok(contents) = std::fs::read_to_string("config/pawn.toml")
            && let Ok(config) = toml::from_str::<Self>(&contents)
        {
            return config;
        }
        Self::default()
    }
}
