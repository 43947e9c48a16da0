/*!
Collision root module.

This module re-exports the submodules that keep characters out of obstacles.
Obstacles are 2D footprints on the XZ plane; the vertical dimension is handled by
ground probes. The code is split for clarity:

- types:        shared data types (ObstacleId, Obstacle, Aabb2, CollisionResult)
- settings:     resolution and tolerance constants
- broad:        sparse spatial hash grid (candidate queries)
- narrow_phase: exact hitbox tests, push-out accumulation and resolution
- ground:       ground height/slope probes (flat floor or Rapier terrain)
*/

pub mod broad;
pub mod ground;
pub mod narrow_phase;
pub mod settings;
pub mod types;

// Re-export commonly used types.
pub use broad::{GridStats, SpatialHashGrid};
pub use ground::{FlatGround, GroundHit, GroundQuery, TerrainDef, TerrainShape, TerrainWorld};
pub use narrow_phase::{CollisionDetector, Resolution};
pub use types::{Aabb2, CollisionResult, Contact, Obstacle, ObstacleId, ObstacleKind, Vec2, Vec3};
