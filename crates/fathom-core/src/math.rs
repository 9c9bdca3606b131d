use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Wire resolution for positions and velocities: tenths of a world unit.
const QUANT_SCALE: f32 = 10.0;

/// Fixed-precision 3D vector as it travels on the wire. The exact
/// quantization grade is a transport decision; engine logic works in
/// `glam::Vec3` and converts at the boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireVec3 {
    x: i32,
    y: i32,
    z: i32,
}

impl WireVec3 {
    pub const ZERO: Self = Self { x: 0, y: 0, z: 0 };

    pub fn quantize(v: Vec3) -> Self {
        Self {
            x: (v.x * QUANT_SCALE).round() as i32,
            y: (v.y * QUANT_SCALE).round() as i32,
            z: (v.z * QUANT_SCALE).round() as i32,
        }
    }

    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(
            self.x as f32 / QUANT_SCALE,
            self.y as f32 / QUANT_SCALE,
            self.z as f32 / QUANT_SCALE,
        )
    }
}

impl From<Vec3> for WireVec3 {
    fn from(v: Vec3) -> Self {
        Self::quantize(v)
    }
}

impl From<WireVec3> for Vec3 {
    fn from(v: WireVec3) -> Self {
        v.to_vec3()
    }
}

/// Unit quaternion as it travels on the wire. Re-normalized on decode so a
/// lossy or hand-built payload cannot inject a non-unit rotation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WireQuat {
    x: f32,
    y: f32,
    z: f32,
    w: f32,
}

impl WireQuat {
    pub const IDENTITY: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    pub fn from_quat(q: Quat) -> Self {
        Self {
            x: q.x,
            y: q.y,
            z: q.z,
            w: q.w,
        }
    }

    pub fn to_quat(self) -> Quat {
        let q = Quat::from_xyzw(self.x, self.y, self.z, self.w);
        if q.length_squared() < 1e-8 {
            tracing::warn!("degenerate quaternion on the wire; substituting identity");
            return Quat::IDENTITY;
        }
        q.normalize()
    }
}

impl Default for WireQuat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<Quat> for WireQuat {
    fn from(q: Quat) -> Self {
        Self::from_quat(q)
    }
}

impl From<WireQuat> for Quat {
    fn from(q: WireQuat) -> Self {
        q.to_quat()
    }
}
