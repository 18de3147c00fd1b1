mod ellipse;

pub use ellipse::Ellipse;

use nalgebra as na;

/// 3D vector used for positions, axes, velocities and impulses
pub type Vector3 = na::Vector3<f32>;

/// 3x3 matrix used for inertia tensors and effective masses
pub type Matrix3 = na::Matrix3<f32>;

/// Unit quaternion used for all orientations
pub type Quaternion = na::UnitQuaternion<f32>;

/// Rigid transform (rotation + translation)
pub type Isometry3 = na::Isometry3<f32>;

/// Constant for a very small number, used for comparisons
pub const EPSILON: f32 = 1.0e-6;

/// Returns true if the value is approximately zero
#[inline]
pub fn approx_zero(a: f32) -> bool {
    a.abs() < EPSILON
}

/// Clamps a value between a minimum and maximum value.
///
/// Unlike `f32::clamp` this never panics when `min > max`; `max` wins.
#[inline]
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    value.max(min).min(max)
}

/// Builds a quaternion from raw components without normalizing.
///
/// The caller guarantees that `(x, y, z, w)` has unit length.
#[inline]
pub fn quat_from_xyzw(x: f32, y: f32, z: f32, w: f32) -> Quaternion {
    Quaternion::new_unchecked(na::Quaternion::new(w, x, y, z))
}

/// Imaginary part of a quaternion
#[inline]
pub fn quat_xyz(q: &Quaternion) -> Vector3 {
    Vector3::new(q.i, q.j, q.k)
}

/// Returns `-q`, which represents the same rotation
#[inline]
pub fn quat_negate(q: &Quaternion) -> Quaternion {
    Quaternion::new_unchecked(-q.into_inner())
}

/// Flips the sign of `q` so that its real part is non-negative
#[inline]
pub fn ensure_w_positive(q: &Quaternion) -> Quaternion {
    if q.w < 0.0 {
        quat_negate(q)
    } else {
        *q
    }
}

/// 4D dot product of two quaternions
#[inline]
pub fn quat_dot(a: &Quaternion, b: &Quaternion) -> f32 {
    a.coords.dot(&b.coords)
}

/// Builds the rotation whose X and Y columns are `axis_x` and `axis_y`.
///
/// The Z column is `axis_x × axis_y`; both inputs must be normalized and perpendicular.
pub fn quat_from_axes(axis_x: &Vector3, axis_y: &Vector3) -> Quaternion {
    let axis_z = axis_x.cross(axis_y);
    let m = Matrix3::from_columns(&[*axis_x, *axis_y, axis_z]);
    Quaternion::from_rotation_matrix(&na::Rotation3::from_matrix_unchecked(m))
}

/// Decomposes `q` into `(swing, twist)` so that `q = swing * twist`.
///
/// Twist is a rotation around the X axis, swing has no X component.
pub fn swing_twist(q: &Quaternion) -> (Quaternion, Quaternion) {
    let (x, y, z, w) = (q.i, q.j, q.k, q.w);
    let s = (w * w + x * x).sqrt();
    if s != 0.0 {
        let twist = quat_from_xyzw(x / s, 0.0, 0.0, w / s);
        let swing = quat_from_xyzw(0.0, (w * y - x * z) / s, (w * z + x * y) / s, s);
        (swing, twist)
    } else {
        // 180 degree rotation around an axis in the YZ plane
        (*q, Quaternion::identity())
    }
}

/// Rotates `rotation` by the world space rotation vector `delta` (axis * angle)
///
/// Any non-zero step is applied, however small.
pub fn rotation_step(rotation: &Quaternion, delta: &Vector3) -> Quaternion {
    if delta.iter().all(|&c| c == 0.0) {
        return *rotation;
    }
    let mut result = Quaternion::from_scaled_axis(*delta) * rotation;
    result.renormalize();
    result
}
