use serde::{Deserialize, Serialize};

/// Weapon configuration. The fire rate is fixed at activation: the firing
/// period is derived once and never re-read during play.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponConfig {
    /// Fire rate in shots/second.
    pub base_fire_rate: f32,
    /// Lifespan of the owner's cosmetic (visual-only) projectiles (seconds).
    pub dummy_projectile_lifespan: f32,
    /// Re-anchor an eligible trigger press to fire at the half-period mark
    /// instead of immediately (offsets paired weapons against each other).
    pub shoot_out_of_phase: bool,
    /// Muzzle speed of spawned projectiles (units/s).
    pub initial_projectile_speed: f32,
}

impl Default for WeaponConfig {
    fn default() -> Self {
        Self {
            base_fire_rate: 10.0,
            dummy_projectile_lifespan: 0.2,
            shoot_out_of_phase: false,
            initial_projectile_speed: 1000.0,
        }
    }
}

impl WeaponConfig {
    /// Load config from environment or TOML file, falling back to defaults.
    pub fn load() -> Self {
        if let Ok(path) = std::env::var("FATHOM_WEAPON_CONFIG")
            && let Ok(contents) = std::fs::read_to_string(&path)
            && let Ok(config) = toml::from_str::<Self>(&contents)
        {
            return config;
        }
        if let Ok(contents) = std::fs::read_to_string("config/weapon.toml")
            && let Ok(config) = toml::from_str::<Self>(&contents)
        {
            return config;
        }
        Self::default()
    }
}
