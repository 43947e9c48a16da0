//! Ground height and slope probes.
//!
//! Obstacle hitboxes are flat 2D footprints; the vertical shape of the world (floor,
//! ramps, raised platforms) comes from a [`GroundQuery`]. Two implementations are
//! provided:
//! - [`FlatGround`]: an infinite horizontal floor, the common case for a showroom scene.
//! - [`TerrainWorld`]: immutable Rapier colliders probed with downward ray casts.
//!
//! Design notes
//! - `TerrainWorld` is query-only: it never steps a simulation, it just prepares the
//!   broad/narrow phase structures needed for scene queries.
//! - Determinism: definitions are sorted by `id` before insertion.

use rapier3d::{
    na::{Point3, Translation3, UnitQuaternion, Vector3},
    prelude::*,
};

use crate::collision::types::Vec3;

/// A walkable surface found under the agent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GroundHit {
    /// World-space height of the surface.
    pub height: f32,
    /// Unit surface normal. Zero when the probe started inside solid geometry.
    pub normal: Vec3,
}

impl GroundHit {
    #[inline]
    pub fn flat(height: f32) -> Self {
        Self {
            height,
            normal: Vec3::new(0.0, 1.0, 0.0),
        }
    }

    /// Angle between the surface normal and +Y, in degrees.
    #[inline]
    pub fn slope_degrees(&self) -> f32 {
        if self.normal.norm_squared() <= 1.0e-12 {
            return 90.0;
        }
        self.normal.normalize().y.clamp(-1.0, 1.0).acos().to_degrees()
    }
}

/// Vertical world queries used by the character controller.
pub trait GroundQuery {
    /// Highest surface at `(x, z)` whose height is at most `from_y`, searching down
    /// at most `max_drop` meters.
    fn probe(&self, x: f32, z: f32, from_y: f32, max_drop: f32) -> Option<GroundHit>;
}

/// Infinite horizontal floor at `height`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlatGround {
    pub height: f32,
}

impl Default for FlatGround {
    fn default() -> Self {
        Self { height: 0.0 }
    }
}

impl GroundQuery for FlatGround {
    fn probe(&self, _x: f32, _z: f32, from_y: f32, max_drop: f32) -> Option<GroundHit> {
        let drop = from_y - self.height;
        (drop >= 0.0 && drop <= max_drop.max(0.0)).then(|| GroundHit::flat(self.height))
    }
}

/// Schema-agnostic definition of an immutable terrain collider.
#[derive(Clone, Debug)]
pub struct TerrainDef {
    /// Stable unique identifier used to ensure deterministic insertion order.
    pub id: u32,
    /// World-space translation.
    pub translation: Vector3<f32>,
    /// World-space rotation (unit quaternion).
    pub rotation: UnitQuaternion<f32>,
    pub shape: TerrainShape,
}

/// Supported terrain shapes.
#[derive(Clone, Debug)]
pub enum TerrainShape {
    /// Infinite plane (half-space) with normal `rotation * +Y`, offset along it.
    Plane { offset_along_normal: f32 },
    /// Oriented cuboid; a rotated cuboid makes a ramp.
    Cuboid { half_extents: Vector3<f32> },
    /// Y-aligned cylinder (round platforms, stages).
    CylinderY { radius: f32, half_height: f32 },
}

/// In-memory Rapier structures for ray queries against static terrain.
pub struct TerrainWorld {
    bodies: RigidBodySet,
    colliders: ColliderSet,
    broad_phase: BroadPhaseBvh,
    narrow_phase: NarrowPhase,
}

impl TerrainWorld {
    /// Build a query world from terrain definitions.
    ///
    /// Any NaN/invalid values should be filtered by the caller.
    pub fn build(mut defs: Vec<TerrainDef>) -> Self {
        defs.sort_by_key(|d| d.id);

        let mut bodies = RigidBodySet::new();
        let mut colliders = ColliderSet::new();

        for def in defs.into_iter() {
            let iso = Isometry::from_parts(Translation3::from(def.translation), def.rotation);
            let rb = RigidBodyBuilder::fixed().pose(iso).build();
            let rb_handle = bodies.insert(rb);
            colliders.insert_with_parent(collider_from_def(&def), rb_handle, &mut bodies);
        }

        // Collision-detection only (no dynamics): updates the broad-phase BVH and the
        // narrow-phase state so scene queries can run.
        let mut broad_phase = BroadPhaseBvh::new();
        let mut narrow_phase = NarrowPhase::new();
        let mut collision_pipeline = CollisionPipeline::new();
        collision_pipeline.step(
            0.0,
            &mut broad_phase,
            &mut narrow_phase,
            &mut bodies,
            &mut colliders,
            &(),
            &(),
        );

        Self {
            bodies,
            colliders,
            broad_phase,
            narrow_phase,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }

    fn query_pipeline<'a>(&'a self, filter: QueryFilter<'a>) -> QueryPipeline<'a> {
        self.broad_phase.as_query_pipeline(
            self.narrow_phase.query_dispatcher(),
            &self.bodies,
            &self.colliders,
            filter,
        )
    }
}

impl GroundQuery for TerrainWorld {
    fn probe(&self, x: f32, z: f32, from_y: f32, max_drop: f32) -> Option<GroundHit> {
        if !(x.is_finite() && z.is_finite() && from_y.is_finite()) || max_drop <= 0.0 {
            return None;
        }
        let ray = Ray::new(Point3::new(x, from_y, z), Vector3::new(0.0, -1.0, 0.0));
        let pipeline = self.query_pipeline(QueryFilter::default());
        let (_handle, hit) = pipeline.cast_ray_and_get_normal(&ray, max_drop, true)?;
        Some(GroundHit {
            height: from_y - hit.time_of_impact,
            normal: Vec3::new(hit.normal.x, hit.normal.y, hit.normal.z),
        })
    }
}

fn collider_from_def(def: &TerrainDef) -> Collider {
    match &def.shape {
        TerrainShape::Plane {
            offset_along_normal,
        } => {
            // The collider is parented to a body posed at the def's isometry, so the
            // half-space is expressed in local space: normal +Y, shifted by the offset.
            ColliderBuilder::halfspace(Vector::y_axis())
                .translation(Vector::y() * *offset_along_normal)
                .build()
        }
        TerrainShape::Cuboid { half_extents } => {
            ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z).build()
        }
        TerrainShape::CylinderY {
            radius,
            half_height,
        } => ColliderBuilder::cylinder(*half_height, *radius).build(),
    }
}
