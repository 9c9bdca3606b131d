pub mod body;
pub mod config;
pub mod dash;
pub mod movement;
pub mod pawn;

pub use body::{Body, FloatingBody, MoveTuning};
pub use config::{DashConfig, PawnConfig};
pub use dash::{DashEngine, DashPhase};
pub use movement::{MovementEffect, PawnChannel};
pub use pawn::{Pawn, PawnEvent, Rotator};
