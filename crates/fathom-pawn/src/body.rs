use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Movement tuning parameters a dash temporarily overrides.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoveTuning {
    /// Speed ceiling in units/s.
    pub max_speed: f32,
    /// Acceleration toward the input direction in units/s^2.
    pub acceleration: f32,
    /// Deceleration applied with no input in units/s^2.
    pub deceleration: f32,
}

impl Default for MoveTuning {
    fn default() -> Self {
        Self {
            max_speed: 1200.0,
            acceleration: 4000.0,
            deceleration: 8000.0,
        }
    }
}

/// Opaque physical-state sink/source for a controlled entity. The
/// replication and ability engines treat the hosting engine's transform
/// through this seam only.
pub trait Body {
    fn position(&self) -> Vec3;
    fn set_position(&mut self, position: Vec3);
    fn orientation(&self) -> Quat;
    fn set_orientation(&mut self, orientation: Quat);
    fn velocity(&self) -> Vec3;
    fn set_velocity(&mut self, velocity: Vec3);
    fn tuning(&self) -> MoveTuning;
    fn set_tuning(&mut self, tuning: MoveTuning);

    /// Forward axis of the current orientation.
    fn forward(&self) -> Vec3 {
        self.orientation() * Vec3::NEG_Z
    }
}

/// Minimal floating-movement kinematics: accelerate toward the accumulated
/// input direction, decelerate with no input, clamp to max speed, integrate.
/// Stands in for the hosting engine's movement component in the harness and
/// in tests.
#[derive(Debug, Clone)]
pub struct FloatingBody {
    position: Vec3,
    orientation: Quat,
    velocity: Vec3,
    tuning: MoveTuning,
    pending_input: Vec3,
}

impl FloatingBody {
    pub fn new(tuning: MoveTuning) -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            velocity: Vec3::ZERO,
            tuning,
            pending_input: Vec3::ZERO,
        }
    }

    /// Accumulate a world-space movement input for the next step.
    pub fn add_movement_input(&mut self, world_direction: Vec3, scale: f32) {
        self.pending_input += world_direction * scale;
    }

    /// Advance the kinematics by one step, consuming accumulated input.
    pub fn step(&mut self, dt: f32) {
        let input = std::mem::take(&mut self.pending_input);
        if input.length_squared() > 1e-8 {
            self.velocity += input.normalize() * self.tuning.acceleration * dt;
        } else if self.velocity.length_squared() > 1e-8 {
            let speed = self.velocity.length();
            let drop = (self.tuning.deceleration * dt).min(speed);
            self.velocity -= self.velocity / speed * drop;
        }
        let speed = self.velocity.length();
        if speed > self.tuning.max_speed {
            self.velocity *= self.tuning.max_speed / speed;
        }
        self.position += self.velocity * dt;
    }
}

impl Default for FloatingBody {
    fn default() -> Self {
        Self::new(MoveTuning::default())
    }
}

impl Body for FloatingBody {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    fn orientation(&self) -> Quat {
        self.orientation
    }

    fn set_orientation(&mut self, orientation: Quat) {
        self.orientation = orientation;
    }

    fn velocity(&self) -> Vec3 {
        self.velocity
    }

    fn set_velocity(&mut self, velocity: Vec3) {
        self.velocity = velocity;
    }

    fn tuning(&self) -> MoveTuning {
        self.tuning
    }

    fn set_tuning(&mut self, tuning: MoveTuning) {
        self.tuning = tuning;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn accelerates_toward_input() {
        let mut body = FloatingBody::default();
        body.add_movement_input(Vec3::X, 1.0);
        body.step(0.1);
        assert!(body.velocity().x > 0.0);
        assert!(body.position().x > 0.0);
    }

    #[test]
    fn decelerates_to_rest_without_input() {
        let mut body = FloatingBody::default();
        body.set_velocity(Vec3::new(100.0, 0.0, 0.0));
        for _ in 0..100 {
            body.step(0.05);
        }
        assert!(body.velocity().length() < 1e-3);
    }

    #[test]
    fn deceleration_does_not_overshoot_through_zero() {
        let mut body = FloatingBody::default();
        body.set_velocity(Vec3::new(10.0, 0.0, 0.0));
        body.step(1.0);
        assert!(body.velocity().x >= 0.0);
    }

    proptest! {
        #[test]
        fn speed_never_exceeds_max(
            vx in -5000.0f32..5000.0,
            vz in -5000.0f32..5000.0,
            dt in 0.001f32..0.1,
        ) {
            let mut body = FloatingBody::default();
            body.set_velocity(Vec3::new(vx, 0.0, vz));
            body.add_movement_input(Vec3::X, 1.0);
            body.step(dt);
            prop_assert!(body.velocity().length() <= body.tuning().max_speed + 1e-3);
        }
    }
}
