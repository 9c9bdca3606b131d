use glam::{Quat, Vec3};
use smallvec::SmallVec;

use fathom_core::error::SimError;
use fathom_core::net::messages::{StartShootingMsg, StopShootingMsg};
use fathom_core::role::ReplicationContext;

use crate::config::WeaponConfig;
use crate::projectile::{ProjectileId, ProjectileKind, ProjectileSink};

/// World transform and velocity of the muzzle at some instant. The cadence
/// engine interpolates between the last fired transform and the current one
/// to place shots that fall between simulation ticks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FireTransform {
    pub position: Vec3,
    pub orientation: Quat,
    pub velocity: Vec3,
}

impl Default for FireTransform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            velocity: Vec3::ZERO,
        }
    }
}

impl FireTransform {
    pub fn new(position: Vec3, orientation: Quat, velocity: Vec3) -> Self {
        Self {
            position,
            orientation,
            velocity,
        }
    }

    pub fn forward(&self) -> Vec3 {
        self.orientation * Vec3::NEG_Z
    }

    fn lerp(&self, other: &Self, t: f32) -> Self {
        Self {
            position: self.position.lerp(other.position, t),
            orientation: self.orientation.lerp(other.orientation, t).normalize(),
            velocity: self.velocity.lerp(other.velocity, t),
        }
    }
}

impl From<&StartShootingMsg> for FireTransform {
    fn from(msg: &StartShootingMsg) -> Self {
        Self {
            position: msg.position.to_vec3(),
            orientation: msg.orientation.to_quat(),
            velocity: msg.velocity.to_vec3(),
        }
    }
}

/// Messages the weapon wants sent to the authority. Empty on the authority
/// itself (including a listen server's own pawn).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WeaponEffect {
    StartShooting(StartShootingMsg),
    StopShooting(StopShootingMsg),
}

/// Local notifications for the presentation layer (muzzle flash, audio).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeaponEvent {
    StartedShooting,
    ShotFired,
    StoppedShooting,
}

/// Rate-limited trigger state machine. While the trigger is held, shots are
/// emitted exactly one firing period apart regardless of tick rate: each
/// simulation tick back-fills the shots that came due since the last one,
/// interpolating the muzzle transform to where it was at the shot's
/// timestamp.
pub struct WeaponCadence {
    ctx: ReplicationContext,
    enabled: bool,
    is_shooting: bool,
    time_last_fired: f32,
    time_last_stopped_shooting: f32,
    period_between_shots: f32,
    last_fired: FireTransform,
    // Canonical projectile awaiting tear-off at the next shot.
    pending_tear_off: SmallVec<[ProjectileId; 4]>,
    shoot_out_of_phase: bool,
    dummy_projectile_lifespan: f32,
    initial_projectile_speed: f32,
}

impl WeaponCadence {
    pub fn new(ctx: ReplicationContext, cfg: &WeaponConfig, now: f32) -> Self {
        let period = 1.0 / cfg.base_fire_rate;
        // Seeded so the first press is always eligible.
        let stopped = now - period;
        Self {
            ctx,
            enabled: true,
            is_shooting: false,
            time_last_fired: stopped - period,
            time_last_stopped_shooting: stopped,
            period_between_shots: period,
            last_fired: FireTransform::default(),
            pending_tear_off: SmallVec::new(),
            shoot_out_of_phase: cfg.shoot_out_of_phase,
            dummy_projectile_lifespan: cfg.dummy_projectile_lifespan,
            initial_projectile_speed: cfg.initial_projectile_speed,
        }
    }

    pub fn is_shooting(&self) -> bool {
        self.is_shooting
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn time_last_fired(&self) -> f32 {
        self.time_last_fired
    }

    pub fn period_between_shots(&self) -> f32 {
        self.period_between_shots
    }

    /// Strictly more than one full period must have elapsed since the last
    /// shot. Exactly one period is not enough.
    pub fn can_shoot(&self, now: f32) -> bool {
        now - self.time_last_fired > self.period_between_shots
    }

    /// Disabling mid-burst also releases the trigger.
    pub fn set_enabled(&mut self, now: f32, enabled: bool) {
        self.enabled = enabled;
        if !enabled && self.is_shooting {
            self.is_shooting = false;
            self.time_last_stopped_shooting = now;
        }
    }

    /// Trigger edge from the local input layer. Only meaningful on the
    /// locally controlled instance; `current` is the muzzle transform at
    /// `now`.
    pub fn handle_trigger(
        &mut self,
        now: f32,
        pressed: bool,
        current: &FireTransform,
        sink: &mut dyn ProjectileSink,
    ) -> (SmallVec<[WeaponEffect; 1]>, SmallVec<[WeaponEvent; 2]>) {
        let mut effects = SmallVec::new();
        let mut events = SmallVec::new();
        if !self.ctx.is_locally_controlled() {
            tracing::warn!(
                role = self.ctx.role.as_str(),
                "trigger input on an instance that is not locally controlled; ignoring"
            );
            return (effects, events);
        }
        if !self.enabled {
            return (effects, events);
        }

        if pressed {
            if self.is_shooting {
                return (effects, events);
            }
            if !self.ctx.is_authority() {
                effects.push(WeaponEffect::StartShooting(StartShootingMsg {
                    timestamp: now,
                    position: current.position.into(),
                    orientation: current.orientation.into(),
                    velocity: current.velocity.into(),
                }));
            }
            self.is_shooting = true;
            events.push(WeaponEvent::StartedShooting);
            if self.can_shoot(now) {
                if self.shoot_out_of_phase {
                    self.re_anchor(now, current);
                } else {
                    events.extend(self.shoot_projectile(now, now, current, sink));
                }
            }
        } else {
            // A release always restamps the stop time and re-reports it;
            // only a true falling edge surfaces an event.
            let was_shooting = self.is_shooting;
            self.is_shooting = false;
            self.time_last_stopped_shooting = now;
            if was_shooting {
                events.push(WeaponEvent::StoppedShooting);
            }
            if !self.ctx.is_authority() {
                effects.push(WeaponEffect::StopShooting(StopShootingMsg { timestamp: now }));
            }
        }
        (effects, events)
    }

    /// Authority handler for the owner's trigger press. Repeated starts are
    /// harmless; the flag is last-write-wins.
    pub fn server_start_shooting(
        &mut self,
        now: f32,
        msg: &StartShootingMsg,
        sink: &mut dyn ProjectileSink,
    ) -> Result<SmallVec<[WeaponEvent; 2]>, SimError> {
        if !self.ctx.is_authority() {
            return Err(SimError::RoleViolation {
                operation: "server_start_shooting",
                detail: "only the authority accepts trigger reports",
            });
        }
        let mut events = SmallVec::new();
        if !self.enabled {
            return Ok(events);
        }
        if self.is_shooting {
            tracing::warn!("start-shooting received while already shooting");
            return Ok(events);
        }
        self.is_shooting = true;
        events.push(WeaponEvent::StartedShooting);
        let current = FireTransform::from(msg);
        if self.can_shoot(now) {
            if self.shoot_out_of_phase {
                self.re_anchor(now, &current);
            } else {
                events.extend(self.shoot_projectile(now, msg.timestamp, &current, sink));
            }
        }
        Ok(events)
    }

    /// Authority handler for the owner's trigger release. The last-fired
    /// time is left untouched so the cooldown still gates the next press.
    pub fn server_stop_shooting(
        &mut self,
        msg: &StopShootingMsg,
    ) -> Result<SmallVec<[WeaponEvent; 2]>, SimError> {
        if !self.ctx.is_authority() {
            return Err(SimError::RoleViolation {
                operation: "server_stop_shooting",
                detail: "only the authority accepts trigger reports",
            });
        }
        let mut events = SmallVec::new();
        if !self.is_shooting {
            // Duplicate stop: refresh the stop time, nothing else.
            tracing::warn!("stop-shooting received while not shooting");
            self.time_last_stopped_shooting = msg.timestamp;
            return Ok(events);
        }
        self.is_shooting = false;
        self.time_last_stopped_shooting = msg.timestamp;
        events.push(WeaponEvent::StoppedShooting);
        Ok(events)
    }

    /// Apply the replicated firing flag on an observer. Observers never
    /// spawn projectiles; they derive their own cadence purely for
    /// presentation.
    pub fn apply_shooting_flag(
        &mut self,
        now: f32,
        is_shooting: bool,
    ) -> Result<SmallVec<[WeaponEvent; 2]>, SimError> {
        if !self.ctx.is_simulated() {
            return Err(SimError::RoleViolation {
                operation: "apply_shooting_flag",
                detail: "firing flag only replicates to simulated proxies",
            });
        }
        let mut events = SmallVec::new();
        if is_shooting && !self.is_shooting {
            self.is_shooting = true;
            self.time_last_fired = now;
            events.push(WeaponEvent::StartedShooting);
            events.push(WeaponEvent::ShotFired);
        } else if !is_shooting && self.is_shooting {
            self.is_shooting = false;
            self.time_last_stopped_shooting = now;
            events.push(WeaponEvent::StoppedShooting);
        }
        Ok(events)
    }

    /// Per-tick cadence. Fires the shots that came due since the previous
    /// tick; a no-op unless the trigger is held and a full period has
    /// elapsed.
    pub fn tick(
        &mut self,
        now: f32,
        current: &FireTransform,
        sink: &mut dyn ProjectileSink,
    ) -> SmallVec<[WeaponEvent; 2]> {
        let mut events = SmallVec::new();
        if !self.enabled || !self.is_shooting || !self.can_shoot(now) {
            return events;
        }
        if self.ctx.is_locally_controlled() || self.ctx.is_authority() {
            if self.time_last_stopped_shooting > self.time_last_fired {
                // The burst chain broke during cooldown; fire fresh rather
                // than interpolating from a stale transform.
                events.extend(self.shoot_projectile(now, now, current, sink));
            } else {
                events.extend(self.interpolate_and_shoot(now, current, sink));
            }
        } else {
            // Simulated proxy: advance the derived cadence, no projectile.
            self.time_last_fired += self.period_between_shots;
            events.push(WeaponEvent::ShotFired);
        }
        events
    }

    /// Shift the phase so the first shot lands half a period after the
    /// press. Lets a paired weapon alternate with one firing in phase.
    fn re_anchor(&mut self, now: f32, current: &FireTransform) {
        self.time_last_stopped_shooting = now;
        self.time_last_fired = now - self.period_between_shots / 2.0;
        self.last_fired = *current;
    }

    fn interpolate_and_shoot(
        &mut self,
        now: f32,
        current: &FireTransform,
        sink: &mut dyn ProjectileSink,
    ) -> SmallVec<[WeaponEvent; 2]> {
        let mut events = SmallVec::new();
        let overshoot = now - self.time_last_fired;
        if overshoot > 2.0 * self.period_between_shots
            && self.time_last_stopped_shooting < self.time_last_fired
        {
            // One catch-up shot, one period back. If the tick fell further
            // behind than that, the remaining shots are dropped.
            events.extend(self.fire_interpolated(
                now - self.period_between_shots,
                current,
                sink,
            ));
            let remaining = now - self.time_last_fired;
            if remaining > 2.0 * self.period_between_shots {
                tracing::error!(
                    overshoot = remaining,
                    period = self.period_between_shots,
                    "cadence fell more than one shot behind; dropping missed shots"
                );
            }
        }
        events.extend(self.fire_interpolated(now, current, sink));
        events
    }

    fn fire_interpolated(
        &mut self,
        now: f32,
        current: &FireTransform,
        sink: &mut dyn ProjectileSink,
    ) -> SmallVec<[WeaponEvent; 2]> {
        let overshoot = now - self.time_last_fired;
        if overshoot < self.period_between_shots - f32::EPSILON {
            tracing::error!(
                overshoot,
                period = self.period_between_shots,
                "shot attempted before the firing period elapsed"
            );
            return SmallVec::new();
        }
        let t = self.period_between_shots / overshoot;
        let at = self.last_fired.lerp(current, t);
        self.shoot_projectile(now, self.time_last_fired + self.period_between_shots, &at, sink)
    }

    /// Spawn one shot. `timestamp` is when the shot logically happened;
    /// the projectile is advanced along the muzzle direction to cover the
    /// time already elapsed since then.
    fn shoot_projectile(
        &mut self,
        now: f32,
        timestamp: f32,
        at: &FireTransform,
        sink: &mut dyn ProjectileSink,
    ) -> SmallVec<[WeaponEvent; 2]> {
        let mut delta = now - timestamp;
        if delta < 0.0 {
            tracing::warn!(delta, "shot timestamp ahead of the local clock; clamping");
            delta = 0.0;
        }
        let forward = at.forward();
        let spawn_position = at.position + forward * (delta * self.initial_projectile_speed);
        let velocity = forward * self.initial_projectile_speed + at.velocity;

        if self.ctx.is_authority() {
            for id in std::mem::take(&mut self.pending_tear_off) {
                sink.tear_off(id);
            }
            let id = sink.spawn(ProjectileKind::Canonical, spawn_position, at.orientation, velocity);
            self.pending_tear_off.push(id);
        } else if self.ctx.is_locally_controlled() {
            let id = sink.spawn(ProjectileKind::Cosmetic, spawn_position, at.orientation, velocity);
            sink.set_lifespan(id, self.dummy_projectile_lifespan);
        }

        self.time_last_fired = timestamp;
        self.last_fired = *at;
        smallvec::smallvec![WeaponEvent::ShotFired]
    }
}
