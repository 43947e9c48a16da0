/*!
Core collision types and math aliases shared by the collision submodules.

This module intentionally contains no algorithms. It defines the data types
exchanged between:
- broad (the spatial hash grid and its candidate queries)
- narrow_phase (exact hitbox tests and push-out accumulation)
- ground (terrain height and normal probes)
- the character controller and pathfinding layers

All obstacle geometry lives in the horizontal (x, z) plane. `Vec2` therefore
stores world x in `.x` and world z in `.y`; vertical extent is carried
separately (`Obstacle::top`, ground probes).
*/

use std::{fmt, sync::Arc};

use nalgebra as na;
use serde::{Deserialize, Serialize};

use crate::hitbox::{Hitbox, PushVector};

/// Common math aliases for clarity and consistency.
pub type Vec2 = na::Vector2<f32>;
pub type Vec3 = na::Vector3<f32>;

/// Unique, cheaply clonable obstacle identifier.
///
/// Ids are copied into every grid bucket an obstacle overlaps, so the string is
/// shared rather than duplicated.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObstacleId(Arc<str>);

impl ObstacleId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObstacleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ObstacleId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ObstacleId {
    fn from(value: String) -> Self {
        Self(Arc::from(value))
    }
}

/// Whether an obstacle may move after registration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObstacleKind {
    /// Never moves after registration; immovable on contact.
    #[default]
    Static,
    /// May be repositioned through `SpatialHashGrid::update`; receives push events.
    Dynamic,
}

/// A collider registered in the spatial hash grid.
#[derive(Clone, Debug)]
pub struct Obstacle {
    pub id: ObstacleId,
    pub hitbox: Hitbox,
    pub kind: ObstacleKind,
    /// Human-readable label (usually the authored zone name).
    pub label: String,
    /// World-space height of the obstacle's upper surface.
    ///
    /// `None` means the obstacle is treated as infinitely tall and always blocks.
    /// Obstacles whose top is within the controller's step height are walked over.
    pub top: Option<f32>,
}

impl Obstacle {
    pub fn new(id: impl Into<ObstacleId>, hitbox: Hitbox, kind: ObstacleKind) -> Self {
        let id = id.into();
        Self {
            label: id.to_string(),
            id,
            hitbox,
            kind,
            top: None,
        }
    }

    #[inline]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    #[inline]
    pub fn with_top(mut self, top: f32) -> Self {
        self.top = Some(top);
        self
    }

    /// True if this obstacle rises above `height` (meters, world space).
    #[inline]
    pub fn blocks_at(&self, height: f32) -> bool {
        self.top.is_none_or(|top| top > height)
    }
}

/// Axis-aligned bounding box in the XZ plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb2 {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb2 {
    #[inline]
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn from_center_half_extents(center: Vec2, half: Vec2) -> Self {
        Self {
            min: center - half,
            max: center + half,
        }
    }

    #[inline]
    pub fn from_circle(center: Vec2, radius: f32) -> Self {
        Self::from_center_half_extents(center, Vec2::new(radius, radius))
    }

    /// Smallest box containing both segment endpoints.
    #[inline]
    pub fn from_segment(a: Vec2, b: Vec2) -> Self {
        Self {
            min: Vec2::new(a.x.min(b.x), a.y.min(b.y)),
            max: Vec2::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    #[inline]
    pub fn union(&self, other: &Aabb2) -> Aabb2 {
        Aabb2 {
            min: Vec2::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Vec2::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }

    /// Inflate on all sides by `margin`.
    #[inline]
    pub fn inflate(&self, margin: f32) -> Aabb2 {
        let delta = Vec2::new(margin, margin);
        Aabb2 {
            min: self.min - delta,
            max: self.max + delta,
        }
    }

    /// Closed-interval overlap test (touching boxes intersect).
    #[inline]
    pub fn intersects(&self, other: &Aabb2) -> bool {
        !(self.max.x < other.min.x
            || self.min.x > other.max.x
            || self.max.y < other.min.y
            || self.min.y > other.max.y)
    }

    #[inline]
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

/// One narrow-phase overlap between the agent and an obstacle.
#[derive(Clone, Debug)]
pub struct Contact {
    pub id: ObstacleId,
    pub kind: ObstacleKind,
    /// Separation for this obstacle alone.
    pub push: PushVector,
}

/// Result of a narrow-phase check at one agent position.
#[derive(Clone, Debug, Default)]
pub struct CollisionResult {
    /// True if any blocking obstacle overlaps the agent.
    pub collided: bool,
    /// Accumulated planar displacement that resolves every blocking overlap.
    pub push_out: Vec2,
    /// Ids of the blocking obstacles, in ascending id order.
    pub obstacle_ids: Vec<ObstacleId>,
    /// Per-obstacle details, same order as `obstacle_ids`.
    pub contacts: Vec<Contact>,
    /// True if two pushes opposed each other and the displacement was capped.
    pub wedged: bool,
    /// Highest top among overlapped obstacles low enough to step onto.
    pub step_surface: Option<f32>,
}
