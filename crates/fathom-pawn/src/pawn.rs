use glam::{EulerRot, Quat, Vec3};
use smallvec::SmallVec;

use fathom_core::role::ReplicationContext;
use fathom_core::scheduler::Scheduler;

use crate::body::{Body, FloatingBody};
use crate::config::PawnConfig;
use crate::dash::DashEngine;
use crate::movement::{MovementEffect, PawnChannel};

/// Notifications surfaced to the presentation layer. Broadcast locally on
/// the instance where the transition ran; observers derive their own from
/// replicated state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PawnEvent {
    DashStarted,
    ChargeCancelled,
    ChargeLockedIn,
    BecameJuggernaut,
}

/// Rotation input for one tick, normalized axis values.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rotator {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

/// One actor instance: a body, its movement replication channel, and the
/// dash ability. Input methods are only meaningful on the locally
/// controlled instance; replication handlers enforce their own role
/// preconditions.
pub struct Pawn {
    ctx: ReplicationContext,
    cfg: PawnConfig,
    pub body: FloatingBody,
    pub channel: PawnChannel,
    dash: DashEngine,
    scheduler: Scheduler,
    last_strafe_input: Vec3,
    is_juggernaut: bool,
}

impl Pawn {
    pub fn new(ctx: ReplicationContext, cfg: PawnConfig, now: f32) -> Self {
        Self {
            ctx,
            body: FloatingBody::default(),
            channel: PawnChannel::new(ctx, &cfg),
            dash: DashEngine::new(cfg.dash, now),
            scheduler: Scheduler::new(),
            last_strafe_input: Vec3::ZERO,
            is_juggernaut: false,
            cfg,
        }
    }

    pub fn context(&self) -> ReplicationContext {
        self.ctx
    }

    pub fn is_juggernaut(&self) -> bool {
        self.is_juggernaut
    }

    pub fn dash(&self) -> &DashEngine {
        &self.dash
    }

    /// Strafe input in actor-local space. Suppressed while charging the
    /// special dash or while a juggernaut dash is running.
    pub fn move_input(&mut self, direction: Vec3) {
        if self.dash.is_charging() || (self.is_juggernaut && self.dash.is_dashing()) {
            return;
        }
        self.last_strafe_input = direction;
        let world = self.body.orientation() * direction;
        self.body.add_movement_input(world, self.cfg.move_sensitivity);
    }

    /// Rotation input. Ignored mid-juggernaut-dash; sensitivity is quartered
    /// while charging so aiming the charged dash stays controllable.
    pub fn rotate_input(&mut self, now: f32, dt: f32, input: Rotator) {
        if self.is_juggernaut && self.dash.is_dashing() {
            return;
        }
        let sensitivity = if self.dash.is_charging() {
            self.cfg.rotate_sensitivity / 4.0
        } else {
            self.cfg.rotate_sensitivity
        };
        let scale = dt * sensitivity;
        let local = Quat::from_euler(
            EulerRot::YXZ,
            (input.yaw * scale).to_radians(),
            (input.pitch * scale).to_radians(),
            (input.roll * scale).to_radians(),
        );
        self.body.set_orientation(self.body.orientation() * local);

        if input.roll.abs() > 1e-6 {
            self.channel.note_roll_input(now);
        }
    }

    /// Dash trigger edge from the input layer.
    pub fn dash_input(&mut self, now: f32, pressed: bool) -> SmallVec<[PawnEvent; 1]> {
        self.dash.handle_input(
            now,
            pressed,
            self.last_strafe_input,
            &mut self.body,
            &mut self.scheduler,
        )
    }

    /// Promote this pawn to juggernaut. Runs on the authority or the owner;
    /// the derived flag replicates to observers, which apply it with
    /// [`Pawn::apply_juggernaut_flag`].
    pub fn set_juggernaut(&mut self) -> SmallVec<[PawnEvent; 1]> {
        self.is_juggernaut = true;
        self.apply_juggernaut_flag(true)
    }

    /// Apply the replicated juggernaut flag. A false arrival is spurious:
    /// warn and ignore.
    pub fn apply_juggernaut_flag(&mut self, is_juggernaut: bool) -> SmallVec<[PawnEvent; 1]> {
        if !is_juggernaut {
            tracing::warn!("juggernaut flag applied while not juggernaut; ignoring");
            return SmallVec::new();
        }
        self.is_juggernaut = true;
        self.dash.set_juggernaut();
        smallvec::smallvec![PawnEvent::BecameJuggernaut]
    }

    /// One simulation step: drain due one-shot timers, integrate local
    /// prediction when controlling, then run the replication channel.
    pub fn tick(
        &mut self,
        now: f32,
        dt: f32,
    ) -> (SmallVec<[MovementEffect; 1]>, SmallVec<[PawnEvent; 1]>) {
        let mut events = SmallVec::new();
        for purpose in self.scheduler.poll(now) {
            events.extend(self.dash.on_timer(purpose, now, &mut self.body, &mut self.scheduler));
        }
        if self.ctx.is_locally_controlled() {
            self.body.step(dt);
        }
        let effects = self.channel.tick(now, dt, &mut self.body);
        (effects, events)
    }
}
