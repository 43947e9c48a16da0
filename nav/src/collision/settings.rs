/*!
Collision and controller tolerances.

These constants centralize the parameters used by the narrow phase, the
character controller's collide-and-slide loop, ground probing and pathfinding.
Keeping them together makes tuning easier.

Notes
- Distances are in meters, time in seconds.
- Favor practical world-space tolerances over machine epsilon for robust behavior.
- Per-character tuning lives in `PhysicsProfile`; these are engine-wide.
*/

/// Maximum number of push-out passes per resolution.
/// Higher values help with tight corners at the cost of more queries.
pub const MAX_RESOLVE_ITERATIONS: u32 = 4;

/// Minimum squared movement threshold to consider a step meaningful (m^2).
/// Movements below this are treated as zero to avoid tiny oscillations.
pub const MIN_MOVE_SQ: f32 = 1.0e-8;

/// Practical small distance for comparisons (meters).
pub const DIST_EPS: f32 = 1.0e-5;

/// Residual overlap tolerated after resolution (meters).
pub const PENETRATION_EPS: f32 = 1.0e-3;

/// Extra separation added to each push so the agent ends just outside a surface
/// instead of exactly on it (meters).
pub const SKIN: f32 = 1.0e-4;

/// Extra radius added to broad-phase queries (meters).
pub const QUERY_SKIN: f32 = 0.05;

/// Two push normals whose dot product is below this are treated as opposing
/// (agent wedged between obstacles).
pub const ANTI_PARALLEL_DOT: f32 = -0.95;

/// Largest horizontal sub-step, as a fraction of the agent radius.
/// Keeping sub-steps under the radius prevents tunnelling through thin obstacles.
pub const SUBSTEP_RADIUS_FRACTION: f32 = 0.5;

/// Upper bound on horizontal sub-steps per tick. Travel needing more steps than
/// this is shortened, never stretched across fewer steps.
pub const MAX_SUBSTEPS: u32 = 64;

/// Upper bound on cells a single obstacle may occupy.
/// Guards against a mis-authored giant hitbox allocating millions of buckets.
pub const MAX_CELLS_PER_OBSTACLE: usize = 1 << 16;

/// Max downward distance searched for ground below the feet (meters).
pub const GROUND_PROBE_DISTANCE: f32 = 50.0;

/// Height below which a grounded character stays glued to descending ground
/// instead of becoming airborne (meters). Keeps walking down ramps smooth.
pub const GROUND_SNAP_DISTANCE: f32 = 0.1;
