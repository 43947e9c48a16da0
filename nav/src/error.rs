//! Crate-wide error type.
//!
//! Only construction and configuration paths return errors. Per-tick operations
//! (collision checks, controller ticks, path queries) never fail: they degrade to a
//! no-op tick, a capped resolution or an explicit `Unreachable` result instead.

use crate::collision::types::ObstacleId;

pub type Result<T> = std::result::Result<T, NavError>;

#[derive(Debug, thiserror::Error)]
pub enum NavError {
    #[error("degenerate hitbox: {0}")]
    DegenerateHitbox(&'static str),
    #[error("invalid cell size {0}: must be finite and > 0")]
    InvalidCellSize(f32),
    #[error("obstacle `{0}` is already registered")]
    DuplicateObstacle(ObstacleId),
    #[error("obstacle `{0}` is not registered")]
    UnknownObstacle(ObstacleId),
    #[error("obstacle `{0}` is static and cannot be moved")]
    ImmovableObstacle(ObstacleId),
    #[error("invalid physics profile `{name}`: {reason}")]
    InvalidProfile { name: String, reason: &'static str },
    #[error("unknown physics profile `{0}`")]
    UnknownProfile(String),
    #[error("scene configuration error: {0}")]
    SceneParse(#[from] serde_json::Error),
}
