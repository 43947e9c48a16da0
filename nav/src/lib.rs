pub mod cell;
pub mod collision;
pub mod constants;
pub mod error;
pub mod hitbox;
pub mod intent;
pub mod motion;
pub mod movement;
pub mod pathfinding;
pub mod profile;
pub mod proximity;
pub mod scene;
pub mod utils;

pub use cell::{CellKey, CellRange, encode_cell};
pub use collision::{
    Aabb2, CollisionDetector, CollisionResult, FlatGround, GridStats, GroundQuery, Obstacle,
    ObstacleId, ObstacleKind, SpatialHashGrid, TerrainWorld, Vec2, Vec3,
};
pub use constants::{AGENT_MARGIN, CELL_SIZE, MAX_TICK_DT_S, YAW_EPS};
pub use error::{NavError, Result};
pub use hitbox::{Hitbox, PushVector};
pub use intent::{BitmaskFlags, FlagBitmask, MoveInput, MoveIntent};
pub use motion::PathFollower;
pub use movement::{CharacterController, CharacterState, DynamicContact, MovementMode, TickReport};
pub use pathfinding::{Path, PathResult, PathfindingAdapter, PathfindingConfig};
pub use profile::{PhysicsProfile, ProfileName};
pub use proximity::{InteractionZone, ProximityEvent, ProximityTracker};
pub use scene::{CollisionZone, LoadedScene, SceneConfig, ZoneShape, load_scene};
pub use utils::{is_at_target_planar, planar_distance_sq, to_planar, yaw_from_xz};
