use std::f32::consts::{PI, TAU};

use crate::{
    YAW_EPS,
    collision::types::{Vec2, Vec3},
};

/// Yaw (about +Y) facing the planar direction `xz`.
///
/// Convention: yaw 0 faces -Z, positive yaw turns toward -X.
pub fn yaw_from_xz(xz: Vec2) -> Option<f32> {
    if xz.norm_squared() > YAW_EPS {
        return Some((-xz[0]).atan2(-xz[1]));
    }

    None
}

/// Unit planar forward vector for a yaw (inverse of [`yaw_from_xz`]).
#[inline]
pub fn forward_from_yaw(yaw: f32) -> Vec2 {
    Vec2::new(-yaw.sin(), -yaw.cos())
}

/// Unit planar right vector for a yaw.
#[inline]
pub fn right_from_yaw(yaw: f32) -> Vec2 {
    Vec2::new(yaw.cos(), -yaw.sin())
}

/// Wrap an angle into `[-π, π)`.
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    let wrapped = angle - TAU * ((angle + PI) / TAU).floor();
    // Rounding can land exactly on +π for inputs like -π - ε.
    if wrapped >= PI { wrapped - TAU } else { wrapped }
}

/// Turn `current` toward `target` by at most `max_step` radians along the shorter arc.
pub fn rotate_toward(current: f32, target: f32, max_step: f32) -> f32 {
    let diff = normalize_angle(target - current);
    if diff.abs() <= max_step {
        normalize_angle(target)
    } else {
        normalize_angle(current + max_step.copysign(diff))
    }
}

/// Project a world position onto the horizontal (XZ) plane.
#[inline]
pub fn to_planar(v: Vec3) -> Vec2 {
    Vec2::new(v.x, v.z)
}

/// Planar (XZ) distance squared between two world positions (meters^2).
pub fn planar_distance_sq(a: Vec2, b: Vec2) -> f32 {
    (b - a).norm_squared()
}

/// Returns true if two world positions are within the planar acceptance radius.
pub fn is_at_target_planar(current: Vec2, target: Vec2, acceptance: f32) -> bool {
    planar_distance_sq(current, target) <= acceptance * acceptance
}

/// Move `current` toward `target` by at most `max_delta` (vector length).
pub fn move_toward(current: Vec2, target: Vec2, max_delta: f32) -> Vec2 {
    let delta = target - current;
    let dist = delta.norm();
    if dist <= max_delta || dist <= f32::EPSILON {
        target
    } else {
        current + delta * (max_delta / dist)
    }
}

/// Clamp a planar vector to a maximum magnitude.
pub fn clamp_planar(v: Vec2, max_len: f32) -> Vec2 {
    let len_sq = v.norm_squared();
    if len_sq <= max_len * max_len || len_sq <= 1.0e-12 {
        return v;
    }
    v * (max_len / len_sq.sqrt())
}

#[inline]
pub fn is_finite_vec3(v: &Vec3) -> bool {
    v.x.is_finite() && v.y.is_finite() && v.z.is_finite()
}
