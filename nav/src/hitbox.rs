//! Planar hitbox geometry.
//!
//! Every hitbox lives in the horizontal (x, z) plane. The set of shapes is closed:
//! all queries match exhaustively on [`Hitbox`], so adding a shape is a
//! compile-checked change in this file only.
//!
//! Hitboxes are validated on construction ([`Hitbox::circle`],
//! [`Hitbox::oriented_box`]) and again when registered in the spatial hash grid
//! ([`Hitbox::validated`]), so the engine never holds a degenerate shape.

use crate::{
    collision::types::{Aabb2, Vec2},
    error::{NavError, Result},
    utils::normalize_angle,
};

const DIST_EPS_SQ: f32 = 1.0e-12;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Hitbox {
    Circle {
        center: Vec2,
        radius: f32,
    },
    /// Oriented box. `rotation` (radians) turns local +X toward world +Z.
    Box {
        center: Vec2,
        half_extents: Vec2,
        rotation: f32,
    },
}

/// Minimal translation that separates a circle from a hitbox.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PushVector {
    /// Unit direction in which the circle must move.
    pub normal: Vec2,
    /// Distance along `normal` (meters, > 0).
    pub depth: f32,
}

impl PushVector {
    #[inline]
    pub fn vector(&self) -> Vec2 {
        self.normal * self.depth
    }
}

impl Hitbox {
    pub fn circle(center: Vec2, radius: f32) -> Result<Self> {
        Hitbox::Circle { center, radius }.validated()
    }

    pub fn oriented_box(center: Vec2, half_extents: Vec2, rotation: f32) -> Result<Self> {
        Hitbox::Box {
            center,
            half_extents,
            rotation,
        }
        .validated()
    }

    /// Check size invariants and normalise rotation into `[-π, π)`.
    pub fn validated(self) -> Result<Self> {
        match self {
            Hitbox::Circle { center, radius } => {
                if !(center.x.is_finite() && center.y.is_finite()) {
                    return Err(NavError::DegenerateHitbox("circle center is not finite"));
                }
                if !(radius.is_finite() && radius > 0.0) {
                    return Err(NavError::DegenerateHitbox("circle radius must be > 0"));
                }
                Ok(self)
            }
            Hitbox::Box {
                center,
                half_extents,
                rotation,
            } => {
                if !(center.x.is_finite() && center.y.is_finite() && rotation.is_finite()) {
                    return Err(NavError::DegenerateHitbox("box pose is not finite"));
                }
                if !(half_extents.x.is_finite()
                    && half_extents.y.is_finite()
                    && half_extents.x > 0.0
                    && half_extents.y > 0.0)
                {
                    return Err(NavError::DegenerateHitbox("box half-extents must be > 0"));
                }
                Ok(Hitbox::Box {
                    center,
                    half_extents,
                    rotation: normalize_angle(rotation),
                })
            }
        }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        match *self {
            Hitbox::Circle { center, .. } | Hitbox::Box { center, .. } => center,
        }
    }

    /// Same shape, moved to `center`.
    #[inline]
    pub fn with_center(self, center: Vec2) -> Self {
        match self {
            Hitbox::Circle { radius, .. } => Hitbox::Circle { center, radius },
            Hitbox::Box {
                half_extents,
                rotation,
                ..
            } => Hitbox::Box {
                center,
                half_extents,
                rotation,
            },
        }
    }

    /// Same shape, grown by `margin` on every side (used to bake the agent radius in).
    pub fn inflated(self, margin: f32) -> Self {
        match self {
            Hitbox::Circle { center, radius } => Hitbox::Circle {
                center,
                radius: radius + margin,
            },
            Hitbox::Box {
                center,
                half_extents,
                rotation,
            } => Hitbox::Box {
                center,
                half_extents: half_extents.add_scalar(margin),
                rotation,
            },
        }
    }

    pub fn aabb(&self) -> Aabb2 {
        match *self {
            Hitbox::Circle { center, radius } => Aabb2::from_circle(center, radius),
            Hitbox::Box {
                center,
                half_extents,
                rotation,
            } => {
                let (s, c) = rotation.sin_cos();
                let ex = half_extents.x * c.abs() + half_extents.y * s.abs();
                let ez = half_extents.x * s.abs() + half_extents.y * c.abs();
                Aabb2::from_center_half_extents(center, Vec2::new(ex, ez))
            }
        }
    }

    pub fn contains_point(&self, p: Vec2) -> bool {
        match *self {
            Hitbox::Circle { center, radius } => (p - center).norm_squared() <= radius * radius,
            Hitbox::Box {
                center,
                half_extents,
                rotation,
            } => {
                let local = to_local(p - center, rotation);
                local.x.abs() <= half_extents.x && local.y.abs() <= half_extents.y
            }
        }
    }

    /// Signed distance from `p` to the shape boundary; negative inside.
    pub fn distance_to_point(&self, p: Vec2) -> f32 {
        match *self {
            Hitbox::Circle { center, radius } => (p - center).norm() - radius,
            Hitbox::Box {
                center,
                half_extents,
                rotation,
            } => box_signed_distance(to_local(p - center, rotation), half_extents),
        }
    }

    /// Push-out for a circle of `radius` centred at `center`, or `None` if they don't overlap.
    ///
    /// A zero radius tests a point against the shape (used with pre-inflated hitboxes).
    pub fn intersects_circle(&self, center: Vec2, radius: f32) -> Option<PushVector> {
        let radius = radius.max(0.0);
        match *self {
            Hitbox::Circle {
                center: own,
                radius: own_radius,
            } => {
                let d = center - own;
                let dist_sq = d.norm_squared();
                let reach = own_radius + radius;
                if dist_sq >= reach * reach {
                    return None;
                }
                let dist = dist_sq.sqrt();
                // Coincident centres: any direction is minimal; pick +X for determinism.
                let normal = if dist_sq > DIST_EPS_SQ {
                    d / dist
                } else {
                    Vec2::new(1.0, 0.0)
                };
                push(normal, reach - dist)
            }
            Hitbox::Box {
                center: own,
                half_extents,
                rotation,
            } => {
                // Separating axes: the two box axes (local frame) plus the axis from the
                // closest point on the box to the circle centre.
                let local = to_local(center - own, rotation);
                let closest = Vec2::new(
                    local.x.clamp(-half_extents.x, half_extents.x),
                    local.y.clamp(-half_extents.y, half_extents.y),
                );
                let diff = local - closest;
                let dist_sq = diff.norm_squared();

                let (normal_local, depth) = if dist_sq > DIST_EPS_SQ {
                    if dist_sq >= radius * radius {
                        return None;
                    }
                    let dist = dist_sq.sqrt();
                    (diff / dist, radius - dist)
                } else {
                    // Centre inside the box: leave through the nearest face.
                    let pen_x = half_extents.x - local.x.abs();
                    let pen_z = half_extents.y - local.y.abs();
                    if pen_x <= pen_z {
                        (Vec2::new(sign(local.x), 0.0), pen_x + radius)
                    } else {
                        (Vec2::new(0.0, sign(local.y)), pen_z + radius)
                    }
                };
                push(to_world(normal_local, rotation), depth)
            }
        }
    }

    /// Unsigned distance between the segment `a..b` and the shape (0 when they touch).
    pub fn distance_to_segment(&self, a: Vec2, b: Vec2) -> f32 {
        match *self {
            Hitbox::Circle { center, radius } => {
                (point_segment_distance(center, a, b) - radius).max(0.0)
            }
            Hitbox::Box {
                center,
                half_extents,
                rotation,
            } => {
                let la = to_local(a - center, rotation);
                let lb = to_local(b - center, rotation);
                if segment_hits_box(la, lb, half_extents) {
                    return 0.0;
                }
                // Disjoint convex shapes: the closest pair involves a segment endpoint
                // or a box corner.
                let mut best = box_signed_distance(la, half_extents)
                    .min(box_signed_distance(lb, half_extents));
                for corner in [
                    Vec2::new(half_extents.x, half_extents.y),
                    Vec2::new(-half_extents.x, half_extents.y),
                    Vec2::new(half_extents.x, -half_extents.y),
                    Vec2::new(-half_extents.x, -half_extents.y),
                ] {
                    best = best.min(point_segment_distance(corner, la, lb));
                }
                best.max(0.0)
            }
        }
    }
}

#[inline]
fn push(normal: Vec2, depth: f32) -> Option<PushVector> {
    (depth > 0.0).then_some(PushVector { normal, depth })
}

#[inline]
fn sign(v: f32) -> f32 {
    if v < 0.0 { -1.0 } else { 1.0 }
}

/// World offset → box-local frame (rotate by -rotation).
#[inline]
fn to_local(d: Vec2, rotation: f32) -> Vec2 {
    let (s, c) = rotation.sin_cos();
    Vec2::new(c * d.x + s * d.y, -s * d.x + c * d.y)
}

/// Box-local direction → world frame (rotate by +rotation).
#[inline]
fn to_world(d: Vec2, rotation: f32) -> Vec2 {
    let (s, c) = rotation.sin_cos();
    Vec2::new(c * d.x - s * d.y, s * d.x + c * d.y)
}

fn box_signed_distance(local: Vec2, half: Vec2) -> f32 {
    let q = local.abs() - half;
    let outside = Vec2::new(q.x.max(0.0), q.y.max(0.0)).norm();
    let inside = q.x.max(q.y).min(0.0);
    outside + inside
}

pub(crate) fn point_segment_distance(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    let t = if len_sq > DIST_EPS_SQ {
        ((p - a).dot(&ab) / len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    (p - (a + ab * t)).norm()
}

/// Slab test of segment `a..b` against the box `[-half, half]`.
fn segment_hits_box(a: Vec2, b: Vec2, half: Vec2) -> bool {
    let d = b - a;
    let mut t0 = 0.0f32;
    let mut t1 = 1.0f32;
    for axis in 0..2 {
        if d[axis].abs() < 1.0e-12 {
            if a[axis] < -half[axis] || a[axis] > half[axis] {
                return false;
            }
            continue;
        }
        let inv = 1.0 / d[axis];
        let mut ta = (-half[axis] - a[axis]) * inv;
        let mut tb = (half[axis] - a[axis]) * inv;
        if ta > tb {
            std::mem::swap(&mut ta, &mut tb);
        }
        t0 = t0.max(ta);
        t1 = t1.min(tb);
        if t0 > t1 {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use std::f32::consts::{FRAC_PI_4, PI};

    use super::*;

    fn unit_box_at(x: f32, z: f32) -> Hitbox {
        Hitbox::oriented_box(Vec2::new(x, z), Vec2::new(1.0, 1.0), 0.0).unwrap()
    }

    #[test]
    fn degenerate_sizes_are_rejected() {
        assert!(Hitbox::circle(Vec2::zeros(), 0.0).is_err());
        assert!(Hitbox::circle(Vec2::zeros(), -1.0).is_err());
        assert!(Hitbox::circle(Vec2::zeros(), f32::NAN).is_err());
        assert!(Hitbox::oriented_box(Vec2::zeros(), Vec2::new(1.0, 0.0), 0.0).is_err());
        assert!(Hitbox::oriented_box(Vec2::zeros(), Vec2::new(-1.0, 1.0), 0.0).is_err());
        assert!(Hitbox::oriented_box(Vec2::new(f32::INFINITY, 0.0), Vec2::new(1.0, 1.0), 0.0).is_err());
    }

    #[test]
    fn rotation_is_normalized_on_construction() {
        let hb = Hitbox::oriented_box(Vec2::zeros(), Vec2::new(1.0, 2.0), 3.0 * PI).unwrap();
        let Hitbox::Box { rotation, .. } = hb else {
            panic!("expected a box");
        };
        assert!((-PI..PI).contains(&rotation));
    }

    #[test]
    fn signed_distance_is_negative_inside() {
        let c = Hitbox::circle(Vec2::zeros(), 2.0).unwrap();
        assert!((c.distance_to_point(Vec2::new(3.0, 0.0)) - 1.0).abs() < 1.0e-6);
        assert!((c.distance_to_point(Vec2::zeros()) + 2.0).abs() < 1.0e-6);

        let b = unit_box_at(0.0, 0.0);
        assert!((b.distance_to_point(Vec2::new(0.5, 0.0)) + 0.5).abs() < 1.0e-6);
        assert!((b.distance_to_point(Vec2::new(2.0, 2.0)) - 2f32.sqrt()).abs() < 1.0e-6);
        assert!(b.contains_point(Vec2::new(1.0, -1.0)));
        assert!(!b.contains_point(Vec2::new(1.01, 0.0)));
    }

    #[test]
    fn circle_vs_circle_pushes_along_center_line() {
        let c = Hitbox::circle(Vec2::zeros(), 1.0).unwrap();
        let p = c.intersects_circle(Vec2::new(1.2, 0.0), 0.5).unwrap();
        assert!((p.normal - Vec2::new(1.0, 0.0)).norm() < 1.0e-6);
        assert!((p.depth - 0.3).abs() < 1.0e-6);
        assert!(c.intersects_circle(Vec2::new(1.5, 0.0), 0.5).is_none());
    }

    #[test]
    fn box_push_from_inside_uses_nearest_face() {
        // Agent centre at x=2.4 inside a box spanning x in [2, 4]: leave through x=2.
        let b = unit_box_at(3.0, 0.0);
        let p = b.intersects_circle(Vec2::new(2.4, 0.0), 0.5).unwrap();
        let resolved = Vec2::new(2.4, 0.0) + p.vector();
        assert!((resolved.x - 1.5).abs() < 1.0e-5);
        assert!(resolved.y.abs() < 1.0e-6);
    }

    #[test]
    fn box_push_from_outside_near_corner() {
        let b = unit_box_at(0.0, 0.0);
        let p = b.intersects_circle(Vec2::new(1.2, 1.2), 0.5).unwrap();
        let diag = Vec2::new(1.0, 1.0).normalize();
        assert!((p.normal - diag).norm() < 1.0e-5);
        assert!((p.depth - (0.5 - 0.2 * 2f32.sqrt())).abs() < 1.0e-5);
        assert!(b.intersects_circle(Vec2::new(1.4, 1.4), 0.5).is_none());
    }

    #[test]
    fn rotated_box_uses_its_own_axes() {
        // A 45deg-rotated square: its corner points along +X at distance sqrt(2).
        let b = Hitbox::oriented_box(Vec2::zeros(), Vec2::new(1.0, 1.0), FRAC_PI_4).unwrap();
        assert!(b.contains_point(Vec2::new(1.3, 0.0)));
        assert!(!b.contains_point(Vec2::new(1.0, 1.0)));
        let aabb = b.aabb();
        assert!((aabb.max.x - 2f32.sqrt()).abs() < 1.0e-5);
        let p = b.intersects_circle(Vec2::new(1.6, 0.0), 0.5).unwrap();
        assert!(p.normal.x > 0.0);
    }

    #[test]
    fn zero_radius_agent_is_a_point_test() {
        let b = unit_box_at(0.0, 0.0);
        assert!(b.intersects_circle(Vec2::new(1.5, 0.0), 0.0).is_none());
        let p = b.intersects_circle(Vec2::new(0.8, 0.0), 0.0).unwrap();
        assert!((p.depth - 0.2).abs() < 1.0e-5);
    }

    #[test]
    fn segment_distance_handles_crossing_and_clear_segments() {
        let b = unit_box_at(0.0, 0.0);
        assert_eq!(b.distance_to_segment(Vec2::new(-5.0, 0.0), Vec2::new(5.0, 0.0)), 0.0);
        let d = b.distance_to_segment(Vec2::new(-5.0, 3.0), Vec2::new(5.0, 3.0));
        assert!((d - 2.0).abs() < 1.0e-5);

        let c = Hitbox::circle(Vec2::new(0.0, 2.0), 1.0).unwrap();
        let d = c.distance_to_segment(Vec2::new(-5.0, 0.0), Vec2::new(5.0, 0.0));
        assert!((d - 1.0).abs() < 1.0e-5);
    }

    #[test]
    fn inflation_grows_every_side() {
        let b = unit_box_at(0.0, 0.0).inflated(0.5);
        assert!(b.contains_point(Vec2::new(1.4, 0.0)));
        let c = Hitbox::circle(Vec2::zeros(), 1.0).unwrap().inflated(0.5);
        assert!(c.contains_point(Vec2::new(0.0, 1.4)));
    }
}
