use log::trace;

use super::{
    broad::SpatialHashGrid,
    settings::{ANTI_PARALLEL_DOT, MAX_RESOLVE_ITERATIONS, MIN_MOVE_SQ, QUERY_SKIN, SKIN},
    types::{CollisionResult, Contact, ObstacleId, Vec2, Vec3},
};
use crate::utils::{is_finite_vec3, to_planar};

/// Narrow-phase resolver for one circular agent against the obstacles in a grid.
///
/// The detector borrows the grid for as long as it lives, so obstacles cannot be
/// added, moved or removed while a tick is using it. Build one per tick.
///
/// `baked_margin` is the amount by which the registered hitboxes were already
/// inflated to account for the agent's footprint (see `scene`); it is subtracted
/// from every agent radius passed in, down to a point test.
#[derive(Clone, Copy, Debug)]
pub struct CollisionDetector<'a> {
    grid: &'a SpatialHashGrid,
    baked_margin: f32,
}

/// Outcome of [`CollisionDetector::resolve`].
#[derive(Clone, Debug, Default)]
pub struct Resolution {
    /// Separated position (Y untouched).
    pub position: Vec3,
    /// Total planar displacement applied.
    pub displacement: Vec2,
    /// True if any blocking overlap was found on the way.
    pub collided: bool,
    /// Every blocking obstacle touched during resolution, one entry per id.
    pub contacts: Vec<Contact>,
    /// True if the agent was wedged and resolution stopped early.
    pub wedged: bool,
    /// Highest step-over surface under the agent at the final position.
    pub step_surface: Option<f32>,
}

impl<'a> CollisionDetector<'a> {
    #[inline]
    pub fn new(grid: &'a SpatialHashGrid) -> Self {
        Self {
            grid,
            baked_margin: 0.0,
        }
    }

    #[inline]
    pub fn with_baked_margin(mut self, margin: f32) -> Self {
        self.baked_margin = margin.max(0.0);
        self
    }

    #[inline]
    pub fn grid(&self) -> &'a SpatialHashGrid {
        self.grid
    }

    #[inline]
    pub fn baked_margin(&self) -> f32 {
        self.baked_margin
    }

    /// Radius actually tested against the (possibly pre-inflated) hitboxes.
    #[inline]
    pub fn effective_radius(&self, radius: f32) -> f32 {
        (radius - self.baked_margin).max(0.0)
    }

    /// Check an agent circle against every obstacle, treating all of them as walls.
    pub fn check_collision(&self, position: Vec3, radius: f32) -> CollisionResult {
        self.check_collision_stepping(position, radius, 0.0)
    }

    /// Check an agent circle whose feet are at `position.y`.
    ///
    /// Obstacles whose top is at or below `position.y + step_height` do not block;
    /// the highest of them is reported as `step_surface`.
    ///
    /// Push-outs of all blocking overlaps are summed so the agent leaves every
    /// obstacle in one pass. When two pushes oppose each other the agent is wedged;
    /// the combined displacement along that axis is capped at the smaller of the two
    /// depths instead of ejecting it through either obstacle.
    pub fn check_collision_stepping(
        &self,
        position: Vec3,
        radius: f32,
        step_height: f32,
    ) -> CollisionResult {
        let mut result = CollisionResult::default();
        if !is_finite_vec3(&position) || !radius.is_finite() {
            return result;
        }

        let p = to_planar(position);
        let r = self.effective_radius(radius);
        let walk_over = position.y + step_height.max(0.0);

        // BTreeSet iteration keeps contacts in ascending id order.
        for id in self.grid.query_region(p, r + QUERY_SKIN) {
            let Some(obstacle) = self.grid.get(&id) else {
                continue;
            };
            let Some(push) = obstacle.hitbox.intersects_circle(p, r) else {
                continue;
            };
            if obstacle.blocks_at(walk_over) {
                result.contacts.push(Contact {
                    id,
                    kind: obstacle.kind,
                    push,
                });
            } else if let Some(top) = obstacle.top {
                result.step_surface = Some(result.step_surface.map_or(top, |s| s.max(top)));
            }
        }

        if result.contacts.is_empty() {
            return result;
        }

        let mut sum = Vec2::zeros();
        for c in &result.contacts {
            sum += c.push.normal * (c.push.depth + SKIN);
        }

        for (i, a) in result.contacts.iter().enumerate() {
            for b in &result.contacts[i + 1..] {
                if a.push.normal.dot(&b.push.normal) >= ANTI_PARALLEL_DOT {
                    continue;
                }
                result.wedged = true;
                let axis = a.push.normal;
                let cap = a.push.depth.min(b.push.depth);
                let along = sum.dot(&axis);
                if along.abs() > cap {
                    sum -= axis * (along - cap.copysign(along));
                }
            }
        }

        result.collided = true;
        result.push_out = sum;
        result.obstacle_ids = result.contacts.iter().map(|c| c.id.clone()).collect();
        result
    }

    /// Repeatedly apply push-outs until the agent is free, wedged, or out of passes.
    pub fn resolve(&self, position: Vec3, radius: f32, step_height: f32) -> Resolution {
        let mut out = Resolution {
            position,
            ..Resolution::default()
        };

        for pass in 0..MAX_RESOLVE_ITERATIONS {
            let res = self.check_collision_stepping(out.position, radius, step_height);
            out.step_surface = res.step_surface;
            if !res.collided {
                break;
            }

            out.collided = true;
            out.wedged |= res.wedged;
            for c in res.contacts {
                if !out.contacts.iter().any(|known| known.id == c.id) {
                    out.contacts.push(c);
                }
            }

            out.position.x += res.push_out.x;
            out.position.z += res.push_out.y;
            out.displacement += res.push_out;
            trace!(
                "resolve pass {pass}: pushed by ({:.4}, {:.4})",
                res.push_out.x, res.push_out.y
            );

            if res.wedged || res.push_out.norm_squared() <= MIN_MOVE_SQ {
                break;
            }
        }

        out
    }

    /// True if an agent of `radius` can travel the straight segment `a..b` without
    /// touching any obstacle. Obstacle heights are ignored.
    pub fn segment_clear(&self, a: Vec2, b: Vec2, radius: f32) -> bool {
        let r = self.effective_radius(radius);
        self.grid
            .query_segment(a, b, r + QUERY_SKIN)
            .iter()
            .filter_map(|id| self.grid.get(id))
            .all(|o| o.hitbox.distance_to_segment(a, b) > r)
    }

    /// Obstacles crossing the planar line of sight from `camera` to `target`,
    /// nearest to the camera first. Obstacles that contain the target are skipped.
    pub fn occluders(&self, camera: Vec3, target: Vec3) -> Vec<ObstacleId> {
        if !is_finite_vec3(&camera) || !is_finite_vec3(&target) {
            return Vec::new();
        }
        let (a, b) = (to_planar(camera), to_planar(target));

        let mut hits: Vec<(f32, ObstacleId)> = self
            .grid
            .query_segment(a, b, QUERY_SKIN)
            .into_iter()
            .filter_map(|id| {
                let o = self.grid.get(&id)?;
                let crosses = o.hitbox.distance_to_segment(a, b) <= 0.0;
                (crosses && !o.hitbox.contains_point(b))
                    .then(|| ((o.hitbox.center() - a).norm_squared(), id))
            })
            .collect();
        hits.sort_by(|x, y| x.0.total_cmp(&y.0).then_with(|| x.1.cmp(&y.1)));
        hits.into_iter().map(|(_, id)| id).collect()
    }
}
