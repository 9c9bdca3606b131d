use glam::{EulerRot, Quat};
use smallvec::SmallVec;

use fathom_core::error::SimError;
use fathom_core::math::{WireQuat, WireVec3};
use fathom_core::net::messages::{MovementSnapshot, SetTransformMsg};
use fathom_core::role::ReplicationContext;

use crate::body::Body;
use crate::config::PawnConfig;

/// Outbound side effect of a movement tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MovementEffect {
    /// Unreliable owner -> authority transform report.
    SendTransform(SetTransformMsg),
}

/// Per-actor movement replication engine, polymorphic over the three roles:
/// the owner predicts locally and reports upward, the authority writes the
/// canonical snapshot, and everyone not locally controlled extrapolates the
/// last snapshot within a bounded staleness window.
#[derive(Debug)]
pub struct PawnChannel {
    ctx: ReplicationContext,
    snapshot: MovementSnapshot,
    last_timestamp_applied: f32,
    extrapolation_limit: f32,
    corrective_speed: f32,
    roll_cooldown: f32,
    time_last_rolled: f32,
}

impl PawnChannel {
    pub fn new(ctx: ReplicationContext, cfg: &PawnConfig) -> Self {
        // Timestamp starts one extrapolation window in the past so a fresh
        // actor freezes instead of extrapolating from a zero snapshot.
        let snapshot = MovementSnapshot {
            timestamp: -cfg.extrapolation_limit,
            ..MovementSnapshot::default()
        };
        Self {
            ctx,
            snapshot,
            last_timestamp_applied: -1.0,
            extrapolation_limit: cfg.extrapolation_limit,
            corrective_speed: cfg.corrective_speed,
            roll_cooldown: cfg.roll_cooldown,
            time_last_rolled: -cfg.roll_cooldown,
        }
    }

    /// Canonical snapshot as last written on this instance.
    pub fn snapshot(&self) -> &MovementSnapshot {
        &self.snapshot
    }

    /// Timestamp of the last snapshot applied to the body, if any.
    pub fn last_timestamp_applied(&self) -> f32 {
        self.last_timestamp_applied
    }

    /// Record that a roll input arrived, holding off auto roll correction.
    pub fn note_roll_input(&mut self, now: f32) {
        self.time_last_rolled = now;
    }

    fn is_rolling(&self, now: f32) -> bool {
        now - self.time_last_rolled < self.roll_cooldown
    }

    /// One simulation step. Owners roll-correct and report their transform;
    /// everyone else extrapolates the last snapshot while it is fresh and
    /// freezes once it goes stale.
    pub fn tick(&mut self, now: f32, dt: f32, body: &mut dyn Body) -> SmallVec<[MovementEffect; 1]> {
        let mut effects = SmallVec::new();
        if self.ctx.is_locally_controlled() {
            if !self.is_rolling(now) {
                self.correct_roll(dt, body);
            }
            effects.push(MovementEffect::SendTransform(SetTransformMsg {
                timestamp: now,
                position: WireVec3::quantize(body.position()),
                orientation: WireQuat::from_quat(body.orientation()),
                velocity: WireVec3::quantize(body.velocity()),
            }));
        } else if now - self.snapshot.timestamp < self.extrapolation_limit {
            self.apply_last_update(now, body);
        }
        // Stale snapshot: hold position until a fresh update arrives.
        effects
    }

    /// Authority handler for the owner's unreliable transform report.
    /// Negative delta (clock skew, out-of-order arrival) clamps to zero and
    /// is never treated as an error; the snapshot keeps the sender's
    /// timestamp uncorrected.
    pub fn receive_set_transform(
        &mut self,
        now: f32,
        msg: &SetTransformMsg,
        body: &mut dyn Body,
    ) -> Result<(), SimError> {
        if !self.ctx.is_authority() {
            let err = SimError::RoleViolation {
                operation: "receive_set_transform",
                detail: "only the authority accepts transform reports",
            };
            tracing::error!(role = self.ctx.role.as_str(), "{err}");
            return Err(err);
        }
        let delta = now - msg.timestamp;
        if delta < 0.0 {
            // Common right after a client connects, while clocks settle.
            tracing::debug!(delta, "transform report from the future; clamping to 0");
        }

        // A listen server's own pawn already moved itself; don't double-apply.
        if !self.ctx.is_locally_controlled() {
            body.set_position(msg.position.to_vec3());
            body.set_orientation(msg.orientation.to_quat());
            body.set_velocity(msg.velocity.to_vec3());
        }

        self.snapshot = MovementSnapshot {
            timestamp: msg.timestamp,
            position: msg.position,
            orientation: msg.orientation,
            velocity: msg.velocity,
        };
        Ok(())
    }

    /// Direct apply of a freshly replicated snapshot (invoked by the
    /// transport immediately after acceptance). Locally controlled instances
    /// must never simulate from replicated movement.
    pub fn apply_snapshot(
        &mut self,
        snapshot: MovementSnapshot,
        body: &mut dyn Body,
    ) -> Result<(), SimError> {
        if self.ctx.is_locally_controlled() {
            let err = SimError::RoleViolation {
                operation: "apply_snapshot",
                detail: "locally controlled instances must not simulate replicated movement",
            };
            tracing::error!(role = self.ctx.role.as_str(), "{err}");
            return Err(err);
        }
        self.snapshot = snapshot;
        self.last_timestamp_applied = snapshot.timestamp;
        body.set_position(snapshot.position.to_vec3());
        body.set_orientation(snapshot.orientation.to_quat());
        body.set_velocity(snapshot.velocity.to_vec3());
        Ok(())
    }

    /// Extrapolate the last snapshot forward by its age: position moves with
    /// the recorded velocity, orientation and velocity are taken as-is.
    fn apply_last_update(&mut self, now: f32, body: &mut dyn Body) {
        let mut age = now - self.snapshot.timestamp;
        if age < 0.0 {
            age = 0.0;
        }
        let displacement = self.snapshot.velocity.to_vec3() * age;
        self.last_timestamp_applied = self.snapshot.timestamp;
        body.set_position(self.snapshot.position.to_vec3() + displacement);
        body.set_orientation(self.snapshot.orientation.to_quat());
        body.set_velocity(self.snapshot.velocity.to_vec3());
    }

    /// Exponentially snap roll toward the nearest 90-degree increment.
    fn correct_roll(&self, dt: f32, body: &mut dyn Body) {
        let (yaw, pitch, roll) = body.orientation().to_euler(EulerRot::YXZ);
        let target = (roll / std::f32::consts::FRAC_PI_2).round() * std::f32::consts::FRAC_PI_2;
        let alpha = (dt * self.corrective_speed).clamp(0.0, 1.0);
        let new_roll = roll + (target - roll) * alpha;
        body.set_orientation(Quat::from_euler(EulerRot::YXZ, yaw, pitch, new_roll));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::FloatingBody;
    use fathom_core::test_helpers::{observer_context, owner_context, server_context, snapshot_at};
    use glam::Vec3;
    use proptest::prelude::*;

    fn channel(ctx: ReplicationContext) -> PawnChannel {
        PawnChannel::new(ctx, &PawnConfig::default())
    }

    fn transform_msg(timestamp: f32, position: Vec3, velocity: Vec3) -> SetTransformMsg {
        SetTransformMsg {
            timestamp,
            position: WireVec3::quantize(position),
            orientation: WireQuat::IDENTITY,
            velocity: WireVec3::quantize(velocity),
        }
    }

    #[test]
    fn owner_tick_reports_current_transform() {
        let mut chan = channel(owner_context());
        let mut body = FloatingBody::default();
        body.set_position(Vec3::new(1.0, 2.0, 3.0));
        body.set_velocity(Vec3::new(0.0, 0.0, -5.0));

        let effects = chan.tick(7.5, 0.016, &mut body);
        assert_eq!(effects.len(), 1);
        let MovementEffect::SendTransform(msg) = effects[0];
        assert_eq!(msg.timestamp, 7.5);
        assert_eq!(msg.position.to_vec3(), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn authority_clamps_future_timestamp_and_applies_directly() {
        let mut chan = channel(server_context());
        let mut body = FloatingBody::default();
        let msg = transform_msg(5.2, Vec3::new(1.0, 2.0, 3.0), Vec3::new(10.0, 0.0, 0.0));

        chan.receive_set_transform(5.0, &msg, &mut body).unwrap();

        // Timestamp stored uncorrected, position applied with no velocity term
        assert_eq!(chan.snapshot().timestamp, 5.2);
        assert_eq!(body.position(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(body.velocity(), Vec3::new(10.0, 0.0, 0.0));
    }

    #[test]
    fn listen_server_does_not_double_apply_own_prediction() {
        let mut chan = channel(ReplicationContext::authority(true));
        let mut body = FloatingBody::default();
        body.set_position(Vec3::new(50.0, 0.0, 0.0));
        let msg = transform_msg(1.0, Vec3::new(1.0, 2.0, 3.0), Vec3::ZERO);

        chan.receive_set_transform(1.0, &msg, &mut body).unwrap();

        assert_eq!(body.position(), Vec3::new(50.0, 0.0, 0.0));
        assert_eq!(chan.snapshot().timestamp, 1.0);
    }

    #[test]
    fn non_authority_rejects_transform_report() {
        let mut chan = channel(observer_context());
        let mut body = FloatingBody::default();
        let msg = transform_msg(1.0, Vec3::ONE, Vec3::ZERO);
        assert!(chan.receive_set_transform(1.0, &msg, &mut body).is_err());
        assert_eq!(body.position(), Vec3::ZERO, "no state mutation on violation");
    }

    #[test]
    fn observer_extrapolates_fresh_snapshot() {
        let mut chan = channel(observer_context());
        let mut body = FloatingBody::default();
        let snap = snapshot_at(10.0, Vec3::new(1.0, 0.0, 0.0), Vec3::new(100.0, 0.0, 0.0));
        chan.apply_snapshot(snap, &mut body).unwrap();
        assert_eq!(body.position(), Vec3::new(1.0, 0.0, 0.0), "direct apply has no velocity term");

        chan.tick(10.05, 0.016, &mut body);
        let expected = Vec3::new(1.0 + 100.0 * 0.05, 0.0, 0.0);
        assert!((body.position() - expected).length() < 1e-3);
    }

    #[test]
    fn observer_freezes_past_extrapolation_limit() {
        let mut chan = channel(observer_context());
        let mut body = FloatingBody::default();
        let snap = snapshot_at(10.0, Vec3::new(1.0, 0.0, 0.0), Vec3::new(100.0, 0.0, 0.0));
        chan.apply_snapshot(snap, &mut body).unwrap();

        chan.tick(10.05, 0.016, &mut body);
        let at_limit = body.position();

        // Past the 0.1s limit: position must not advance further
        chan.tick(10.15, 0.016, &mut body);
        assert_eq!(body.position(), at_limit);
        chan.tick(11.0, 0.016, &mut body);
        assert_eq!(body.position(), at_limit);
    }

    #[test]
    fn owner_rejects_replicated_snapshot() {
        let mut chan = channel(owner_context());
        let mut body = FloatingBody::default();
        let snap = snapshot_at(1.0, Vec3::ONE, Vec3::ZERO);
        assert!(chan.apply_snapshot(snap, &mut body).is_err());
        assert_eq!(body.position(), Vec3::ZERO);
    }

    #[test]
    fn fresh_channel_does_not_extrapolate_default_snapshot() {
        let mut chan = channel(observer_context());
        let mut body = FloatingBody::default();
        body.set_position(Vec3::new(9.0, 9.0, 9.0));
        chan.tick(0.0, 0.016, &mut body);
        assert_eq!(body.position(), Vec3::new(9.0, 9.0, 9.0), "no snapshot yet; hold still");
    }

    #[test]
    fn roll_correction_snaps_toward_nearest_quarter_turn() {
        let mut chan = channel(owner_context());
        let mut body = FloatingBody::default();
        // 100 degrees of roll; nearest increment is 90
        body.set_orientation(Quat::from_euler(
            EulerRot::YXZ,
            0.0,
            0.0,
            100.0f32.to_radians(),
        ));
        for _ in 0..400 {
            chan.tick(0.0, 0.016, &mut body);
        }
        let (_, _, roll) = body.orientation().to_euler(EulerRot::YXZ);
        assert!(
            (roll - std::f32::consts::FRAC_PI_2).abs() < 0.01,
            "roll {roll} should settle at 90 degrees"
        );
    }

    #[test]
    fn roll_correction_pauses_while_rolling() {
        let mut chan = channel(owner_context());
        let mut body = FloatingBody::default();
        let initial = Quat::from_euler(EulerRot::YXZ, 0.0, 0.0, 1.0);
        body.set_orientation(initial);
        chan.note_roll_input(5.0);
        chan.tick(5.1, 0.016, &mut body); // within the 0.2s roll cooldown
        assert_eq!(body.orientation(), initial);
    }

    proptest! {
        #[test]
        fn extrapolation_is_linear_in_age(
            px in -1000.0f32..1000.0,
            vx in -500.0f32..500.0,
            age in 0.0f32..0.099,
        ) {
            let mut chan = channel(observer_context());
            let mut body = FloatingBody::default();
            let snap = snapshot_at(100.0, Vec3::new(px, 0.0, 0.0), Vec3::new(vx, 0.0, 0.0));
            chan.apply_snapshot(snap, &mut body).unwrap();
            chan.tick(100.0 + age, 0.016, &mut body);

            let expected = snap.position.to_vec3() + snap.velocity.to_vec3() * age;
            prop_assert!((body.position() - expected).length() < 1e-2);
        }
    }
}
