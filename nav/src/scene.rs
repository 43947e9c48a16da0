//! Scene configuration: authored collision zones → grid obstacles.
//!
//! Zones are authored as `{ id, position, radius, name }`. Unless a zone declares an
//! explicit `shape`, its footprint is guessed from the name:
//!
//! | name contains | footprint |
//! |---|---|
//! | `pillar`   | circle, `radius * PILLAR_RADIUS_SCALE` |
//! | `wall`     | box, `radius` long and `radius * WALL_THICKNESS_SCALE` thick |
//! | `terminal` | square box, `radius * TERMINAL_HALF_EXTENT_SCALE` |
//! | `pedestal` | circle, `radius * PEDESTAL_RADIUS_SCALE` |
//! | otherwise  | circle, `radius` |
//!
//! Every footprint is then inflated by the agent margin, which the returned scene
//! hands to its [`CollisionDetector`] as the baked margin.

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::{
    collision::{
        CollisionDetector, SpatialHashGrid,
        types::{Obstacle, ObstacleId, ObstacleKind, Vec2, Vec3},
    },
    constants::{
        AGENT_MARGIN, CELL_SIZE, INTERACTION_MARGIN, PEDESTAL_RADIUS_SCALE, PILLAR_RADIUS_SCALE,
        TERMINAL_HALF_EXTENT_SCALE, WALL_LENGTH_SCALE, WALL_THICKNESS_SCALE,
    },
    error::{NavError, Result},
    hitbox::Hitbox,
    proximity::InteractionZone,
};

/// Explicit footprint for a zone, overriding the name heuristic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ZoneShape {
    Circle {
        radius: f32,
    },
    Box {
        half_extents: [f32; 2],
        #[serde(default)]
        rotation: f32,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollisionZone {
    pub id: String,
    /// World position `[x, y, z]`; `y` is the zone's base height.
    pub position: [f32; 3],
    pub radius: f32,
    pub name: String,
    #[serde(default)]
    pub shape: Option<ZoneShape>,
    /// Yaw of box-shaped heuristic footprints (radians).
    #[serde(default)]
    pub rotation: f32,
    /// Height of the zone's upper surface above its base; absent means always blocking.
    #[serde(default)]
    pub height: Option<f32>,
    #[serde(default)]
    pub dynamic: bool,
    /// Distance from the centre at which the zone offers interaction.
    #[serde(default)]
    pub interaction_radius: Option<f32>,
}

impl CollisionZone {
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.position[0], self.position[2])
    }

    /// Footprint before agent-margin inflation.
    pub fn footprint(&self) -> Result<Hitbox> {
        let c = self.center();
        let r = self.radius;
        match &self.shape {
            Some(ZoneShape::Circle { radius }) => Hitbox::circle(c, *radius),
            Some(ZoneShape::Box {
                half_extents,
                rotation,
            }) => Hitbox::oriented_box(c, Vec2::new(half_extents[0], half_extents[1]), *rotation),
            None => {
                let name = self.name.to_ascii_lowercase();
                if name.contains("pillar") {
                    Hitbox::circle(c, r * PILLAR_RADIUS_SCALE)
                } else if name.contains("wall") {
                    let half = Vec2::new(r * WALL_LENGTH_SCALE, r * WALL_THICKNESS_SCALE);
                    Hitbox::oriented_box(c, half, self.rotation)
                } else if name.contains("terminal") {
                    let half = Vec2::repeat(r * TERMINAL_HALF_EXTENT_SCALE);
                    Hitbox::oriented_box(c, half, self.rotation)
                } else if name.contains("pedestal") {
                    Hitbox::circle(c, r * PEDESTAL_RADIUS_SCALE)
                } else {
                    Hitbox::circle(c, r)
                }
            }
        }
    }

    /// Zones the player can walk up to and use.
    pub fn is_interactive(&self) -> bool {
        if self.interaction_radius.is_some() {
            return true;
        }
        let name = self.name.to_ascii_lowercase();
        name.contains("terminal") || name.contains("pedestal")
    }

    fn to_obstacle(&self, margin: f32) -> Result<Obstacle> {
        if !self.position.iter().all(|v| v.is_finite()) {
            return Err(NavError::DegenerateHitbox("zone position must be finite"));
        }
        let hitbox = self.footprint()?.inflated(margin);
        let kind = if self.dynamic {
            ObstacleKind::Dynamic
        } else {
            ObstacleKind::Static
        };
        let mut obstacle = Obstacle::new(self.id.as_str(), hitbox, kind).with_label(&self.name);
        if let Some(h) = self.height.filter(|h| h.is_finite()) {
            obstacle = obstacle.with_top(self.position[1] + h);
        }
        Ok(obstacle)
    }

    fn to_interaction(&self) -> InteractionZone {
        InteractionZone {
            id: ObstacleId::new(&self.id),
            label: self.name.clone(),
            center: self.center(),
            radius: self
                .interaction_radius
                .unwrap_or(self.radius + INTERACTION_MARGIN),
        }
    }
}

fn default_cell_size() -> f32 {
    CELL_SIZE
}

fn default_agent_margin() -> f32 {
    AGENT_MARGIN
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneConfig {
    #[serde(default = "default_cell_size")]
    pub cell_size: f32,
    #[serde(default = "default_agent_margin")]
    pub agent_margin: f32,
    #[serde(default)]
    pub spawn: [f32; 3],
    #[serde(default)]
    pub zones: Vec<CollisionZone>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            cell_size: CELL_SIZE,
            agent_margin: AGENT_MARGIN,
            spawn: [0.0; 3],
            zones: Vec::new(),
        }
    }
}

impl SceneConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Build the grid. Zones that fail validation or reuse an id are skipped with a
    /// warning; only an invalid cell size fails the whole load.
    pub fn load(&self) -> Result<LoadedScene> {
        let mut grid = SpatialHashGrid::new(self.cell_size)?;
        let margin = if self.agent_margin.is_finite() {
            self.agent_margin.max(0.0)
        } else {
            AGENT_MARGIN
        };

        let mut interactions = Vec::new();
        let mut skipped = 0usize;
        for zone in &self.zones {
            let inserted = zone
                .to_obstacle(margin)
                .and_then(|obstacle| grid.insert(obstacle));
            if let Err(err) = inserted {
                warn!("skipping collision zone `{}` ({}): {err}", zone.id, zone.name);
                skipped += 1;
                continue;
            }
            if zone.is_interactive() {
                interactions.push(zone.to_interaction());
            }
        }

        let stats = grid.stats();
        info!(
            "scene loaded: {} obstacles in {} cells ({} m), {} interaction zones, {} skipped",
            stats.obstacle_count,
            stats.cell_count,
            stats.cell_size,
            interactions.len(),
            skipped
        );

        let spawn = Vec3::from(self.spawn);
        Ok(LoadedScene {
            grid,
            baked_margin: margin,
            spawn: if spawn.iter().all(|v| v.is_finite()) {
                spawn
            } else {
                Vec3::zeros()
            },
            interactions,
            skipped,
        })
    }
}

/// Result of loading a [`SceneConfig`].
#[derive(Debug)]
pub struct LoadedScene {
    pub grid: SpatialHashGrid,
    /// Margin already added to every obstacle footprint.
    pub baked_margin: f32,
    pub spawn: Vec3,
    pub interactions: Vec<InteractionZone>,
    /// Zones rejected during load.
    pub skipped: usize,
}

impl LoadedScene {
    /// Detector over this scene's grid with the baked margin applied.
    pub fn detector(&self) -> CollisionDetector<'_> {
        CollisionDetector::new(&self.grid).with_baked_margin(self.baked_margin)
    }
}

/// Parse and load a scene in one go.
pub fn load_scene(json: &str) -> Result<LoadedScene> {
    SceneConfig::from_json(json)?.load()
}
