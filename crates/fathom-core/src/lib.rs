pub mod clock;
pub mod error;
pub mod math;
pub mod net;
pub mod role;
pub mod scheduler;

/// Unique identifier for a replicated actor.
pub type ActorId = u64;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use glam::{Quat, Vec3};

    use crate::math::{WireQuat, WireVec3};
    use crate::net::messages::MovementSnapshot;
    use crate::role::ReplicationContext;

    /// Context for a dedicated-server authority instance.
    pub fn server_context() -> ReplicationContext {
        ReplicationContext::authority(false)
    }

    /// Context for the locally-controlled owning client.
    pub fn owner_context() -> ReplicationContext {
        ReplicationContext::autonomous()
    }

    /// Context for a remote observer.
    pub fn observer_context() -> ReplicationContext {
        ReplicationContext::simulated()
    }

    /// Build a movement snapshot from plain math types.
    pub fn snapshot_at(timestamp: f32, position: Vec3, velocity: Vec3) -> MovementSnapshot {
        MovementSnapshot {
            timestamp,
            position: WireVec3::quantize(position),
            orientation: WireQuat::from_quat(Quat::IDENTITY),
            velocity: WireVec3::quantize(velocity),
        }
    }
}
