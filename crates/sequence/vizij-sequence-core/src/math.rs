//! Small array math used by the interpolation routine and the reference host.
//!
//! Vectors are `[f32; 3]`, quaternions `[f32; 4]` as (x, y, z, w), colors
//! `[f32; 4]` as RGBA. Every lerp here is unclamped unless its name says so.

pub type Vec3 = [f32; 3];
pub type Quat = [f32; 4];
pub type Rgba = [f32; 4];

pub const ZERO: Vec3 = [0.0, 0.0, 0.0];
pub const ONE: Vec3 = [1.0, 1.0, 1.0];
pub const IDENTITY: Quat = [0.0, 0.0, 0.0, 1.0];
/// Fallback for material colors that cannot be read.
pub const WHITE: Rgba = [1.0, 1.0, 1.0, 1.0];

#[inline]
pub fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[inline]
pub fn lerp_clamped(a: f32, b: f32, t: f32) -> f32 {
    lerp_f32(a, b, t.clamp(0.0, 1.0))
}

#[inline]
pub fn lerp_vec3(a: Vec3, b: Vec3, t: f32) -> Vec3 {
    [
        lerp_f32(a[0], b[0], t),
        lerp_f32(a[1], b[1], t),
        lerp_f32(a[2], b[2], t),
    ]
}

#[inline]
pub fn lerp_vec4(a: [f32; 4], b: [f32; 4], t: f32) -> [f32; 4] {
    [
        lerp_f32(a[0], b[0], t),
        lerp_f32(a[1], b[1], t),
        lerp_f32(a[2], b[2], t),
        lerp_f32(a[3], b[3], t),
    ]
}

#[inline]
pub fn add3(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

#[inline]
pub fn sub3(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline]
pub fn mul3(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] * b[0], a[1] * b[1], a[2] * b[2]]
}

/// Component-wise division; zero divisors yield zero instead of infinities.
#[inline]
pub fn div3(a: Vec3, b: Vec3) -> Vec3 {
    let d = |n: f32, m: f32| if m == 0.0 { 0.0 } else { n / m };
    [d(a[0], b[0]), d(a[1], b[1]), d(a[2], b[2])]
}

#[inline]
fn dot4(a: [f32; 4], b: [f32; 4]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2] + a[3] * b[3]
}

#[inline]
pub fn normalize4(mut q: [f32; 4]) -> [f32; 4] {
    let len2 = dot4(q, q);
    if len2 > 0.0 {
        let inv_len = len2.sqrt().recip();
        q[0] *= inv_len;
        q[1] *= inv_len;
        q[2] *= inv_len;
        q[3] *= inv_len;
    }
    q
}

/// Quaternion NLERP with shortest-arc correction. `t` is not clamped, so
/// overshooting eases carry past the target orientation.
#[inline]
pub fn nlerp_quat(a: Quat, mut b: Quat, t: f32) -> Quat {
    if dot4(a, b) < 0.0 {
        b = [-b[0], -b[1], -b[2], -b[3]];
    }
    normalize4(lerp_vec4(a, b, t))
}

/// Hamilton product `a * b` (apply `b` first, then `a`).
#[inline]
pub fn quat_mul(a: Quat, b: Quat) -> Quat {
    let [ax, ay, az, aw] = a;
    let [bx, by, bz, bw] = b;
    [
        aw * bx + ax * bw + ay * bz - az * by,
        aw * by - ax * bz + ay * bw + az * bx,
        aw * bz + ax * by - ay * bx + az * bw,
        aw * bw - ax * bx - ay * by - az * bz,
    ]
}

/// Inverse of a unit quaternion.
#[inline]
pub fn quat_conjugate(q: Quat) -> Quat {
    [-q[0], -q[1], -q[2], q[3]]
}

/// Rotation of `degrees` about `axis` (expected unit length).
pub fn quat_from_axis_angle(axis: Vec3, degrees: f32) -> Quat {
    let half = degrees.to_radians() * 0.5;
    let (s, c) = half.sin_cos();
    [axis[0] * s, axis[1] * s, axis[2] * s, c]
}

/// Euler angles in degrees applied X, then Y, then Z about the local axes.
pub fn quat_from_euler_degrees(euler: Vec3) -> Quat {
    let qx = quat_from_axis_angle([1.0, 0.0, 0.0], euler[0]);
    let qy = quat_from_axis_angle([0.0, 1.0, 0.0], euler[1]);
    let qz = quat_from_axis_angle([0.0, 0.0, 1.0], euler[2]);
    quat_mul(quat_mul(qx, qy), qz)
}

pub fn quat_rotate(q: Quat, v: Vec3) -> Vec3 {
    let p = [v[0], v[1], v[2], 0.0];
    let r = quat_mul(quat_mul(q, p), quat_conjugate(q));
    [r[0], r[1], r[2]]
}
