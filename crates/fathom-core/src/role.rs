use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Replication role of an actor instance on one machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetRole {
    /// Final say over the actor's true state (the server's instance).
    Authority,
    /// The instance driven by local player input (the owning client).
    AutonomousProxy,
    /// A remote view relying solely on replicated state.
    SimulatedProxy,
}

impl NetRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Authority => "Authority",
            Self::AutonomousProxy => "AutonomousProxy",
            Self::SimulatedProxy => "SimulatedProxy",
        }
    }
}

/// Role plus local-control flag for one actor instance. The two are distinct:
/// a listen server's own player is Authority *and* locally controlled, while a
/// dedicated server's Authority instances are not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplicationContext {
    pub role: NetRole,
    pub locally_controlled: bool,
}

impl ReplicationContext {
    /// A SimulatedProxy can never be locally controlled.
    pub fn new(role: NetRole, locally_controlled: bool) -> Result<Self, SimError> {
        if role == NetRole::SimulatedProxy && locally_controlled {
            let err = SimError::RoleViolation {
                operation: "ReplicationContext::new",
                detail: "a SimulatedProxy cannot be locally controlled",
            };
            tracing::error!("{err}");
            return Err(err);
        }
        Ok(Self {
            role,
            locally_controlled,
        })
    }

    pub fn authority(locally_controlled: bool) -> Self {
        Self {
            role: NetRole::Authority,
            locally_controlled,
        }
    }

    pub fn autonomous() -> Self {
        Self {
            role: NetRole::AutonomousProxy,
            locally_controlled: true,
        }
    }

    pub fn simulated() -> Self {
        Self {
            role: NetRole::SimulatedProxy,
            locally_controlled: false,
        }
    }

    pub fn is_authority(&self) -> bool {
        self.role == NetRole::Authority
    }

    pub fn is_locally_controlled(&self) -> bool {
        self.locally_controlled
    }

    pub fn is_simulated(&self) -> bool {
        self.role == NetRole::SimulatedProxy
    }
}
