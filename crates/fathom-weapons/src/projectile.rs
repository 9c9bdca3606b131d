use glam::{Quat, Vec3};

pub type ProjectileId = u64;

/// Which replication flavor a spawned projectile carries.
///
/// Canonical projectiles exist only on the authority and are handed to
/// observers by tear-off: the engine replicates the spawn once, then the
/// projectile simulates independently on every instance. Cosmetic
/// projectiles are the owner's immediate visual feedback and never
/// replicate; they are short-lived and carry no gameplay effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectileKind {
    Canonical,
    Cosmetic,
}

/// Boundary between the cadence engine and whatever actually owns
/// projectile entities. The engine decides when and where to spawn;
/// the sink decides what a projectile is.
pub trait ProjectileSink {
    /// Spawn a projectile with an initial world transform and velocity.
    fn spawn(
        &mut self,
        kind: ProjectileKind,
        position: Vec3,
        orientation: Quat,
        velocity: Vec3,
    ) -> ProjectileId;

    /// Limit the projectile's lifetime. Used for cosmetic projectiles,
    /// which only need to cover the round-trip until the canonical one
    /// arrives.
    fn set_lifespan(&mut self, id: ProjectileId, seconds: f32);

    /// Detach the projectile from further replication. Called one firing
    /// tick after the canonical spawn so the initial state has gone out.
    fn tear_off(&mut self, id: ProjectileId);
}

/// Records every sink call for assertions.
#[derive(Debug, Default)]
pub struct RecordingSink {
    next_id: ProjectileId,
    pub spawned: Vec<SpawnRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnRecord {
    pub id: ProjectileId,
    pub kind: ProjectileKind,
    pub position: Vec3,
    pub orientation: Quat,
    pub velocity: Vec3,
    pub lifespan: Option<f32>,
    pub torn_off: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProjectileSink for RecordingSink {
    fn spawn(
        &mut self,
        kind: ProjectileKind,
        position: Vec3,
        orientation: Quat,
        velocity: Vec3,
    ) -> ProjectileId {
        let id = self.next_id;
        self.next_id += 1;
        self.spawned.push(SpawnRecord {
            id,
            kind,
            position,
            orientation,
            velocity,
            lifespan: None,
            torn_off: false,
        });
        id
    }

    fn set_lifespan(&mut self, id: ProjectileId, seconds: f32) {
        if let Some(record) = self.spawned.iter_mut().find(|r| r.id == id) {
            record.lifespan = Some(seconds);
        }
    }

    fn tear_off(&mut self, id: ProjectileId) {
        if let Some(record) = self.spawned.iter_mut().find(|r| r.id == id) {
            record.torn_off = true;
        }
    }
}
