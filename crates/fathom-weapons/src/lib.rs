pub mod cadence;
pub mod config;
pub mod projectile;

pub use cadence::{FireTransform, WeaponCadence, WeaponEffect, WeaponEvent};
pub use config::WeaponConfig;
pub use projectile::{ProjectileId, ProjectileKind, ProjectileSink, RecordingSink, SpawnRecord};
