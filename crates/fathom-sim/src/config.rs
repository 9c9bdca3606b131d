use std::collections::HashMap;

use serde::Deserialize;

/// Harness-level settings. `custom` carries variant flags that do not
/// warrant a dedicated field; the juggernaut game mode is gated there.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Seed for the unreliable links' packet-loss RNG.
    pub seed: u64,
    /// Fraction of unreliable frames dropped, 0.0..=1.0.
    pub unreliable_loss: f32,
    /// Default simulation step in seconds.
    pub tick_interval: f32,
    pub custom: HashMap<String, serde_json::Value>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            seed: 7,
            unreliable_loss: 0.0,
            tick_interval: 1.0 / 30.0,
            custom: HashMap::new(),
        }
    }
}

impl SessionConfig {
    pub fn juggernaut_enabled(&self) -> bool {
        self.custom
            .get("juggernaut")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false)
    }

    /// Load config from environment or TOML file, falling back to defaults.
    pub fn load() -> Self {
        if let Ok(path) = std::env::var("FATHOM_SESSION_CONFIG")
            && let Ok(contents) = std::fs::read_to_string(&path)
            && let Ok(config) = toml::from_str::<Self>(&contents)
        {
            return config;
        }
        if let Ok(contents) = std::fs::read_to_string("config/session.toml")
            && let Ok(config) = toml::from_str::<Self>(&contents)
        {
            return config;
        }
        Self::default()
    }
}
