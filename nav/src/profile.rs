//! Character physics profiles.
//!
//! A profile is immutable once built and shared by reference (`Arc`) between the
//! controller and anything that needs the agent's footprint (pathfinding, proximity).
//! Swapping a profile swaps the reference; nothing is copied per tick.

use std::{fmt, str::FromStr, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::error::{NavError, Result};

/// Movement and collision tuning for one kind of character.
///
/// All values use metric units (meters, seconds, radians) unless noted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicsProfile {
    pub name: String,

    /// Collision radius (meters).
    pub radius: f32,
    /// Standing height (meters).
    pub height: f32,
    /// Mass (kg). Scales impulses handed to dynamic obstacles.
    pub mass: f32,

    /// Walking speed cap (m/s).
    pub walk_speed: f32,
    /// Sprinting speed cap (m/s).
    pub run_speed: f32,
    /// How fast velocity approaches the wished velocity (m/s²).
    pub acceleration: f32,
    /// Linear slow-down applied with no input (m/s²).
    pub deceleration: f32,
    /// Max turn rate of `facing` (rad/s).
    pub rotation_speed: f32,
    /// Exponential decay rate of ground velocity with no input (1/s).
    pub friction: f32,

    /// Downward acceleration magnitude (m/s²).
    pub gravity: f32,
    /// Upward velocity set on jump (m/s).
    pub jump_force: f32,
    /// Fraction of ground acceleration available while airborne, in `[0, 1]`.
    pub air_control: f32,
    /// Impulse multiplier for pushes against dynamic obstacles.
    pub push_force: f32,

    /// Steepest standable ground (degrees).
    pub max_slope_deg: f32,
    /// Tallest rise the character walks onto without jumping (meters).
    pub step_height: f32,
}

impl Default for PhysicsProfile {
    fn default() -> Self {
        Self {
            name: "default".to_owned(),
            radius: 0.35,
            height: 1.8,
            mass: 70.0,
            walk_speed: 3.0,
            run_speed: 6.0,
            acceleration: 20.0,
            deceleration: 15.0,
            rotation_speed: 10.0,
            friction: 8.0,
            gravity: 9.81,
            jump_force: 5.0,
            air_control: 0.3,
            push_force: 1.0,
            max_slope_deg: 45.0,
            step_height: 0.3,
        }
    }
}

impl PhysicsProfile {
    /// Slow, wide and hard to push around.
    pub fn heavy() -> Self {
        Self {
            name: "heavy".to_owned(),
            radius: 0.45,
            height: 1.9,
            mass: 120.0,
            walk_speed: 2.2,
            run_speed: 4.5,
            acceleration: 12.0,
            deceleration: 10.0,
            rotation_speed: 6.0,
            friction: 10.0,
            gravity: 12.0,
            jump_force: 4.0,
            air_control: 0.15,
            push_force: 2.0,
            max_slope_deg: 35.0,
            step_height: 0.25,
        }
    }

    /// Quick and floaty.
    pub fn light() -> Self {
        Self {
            name: "light".to_owned(),
            radius: 0.3,
            height: 1.6,
            mass: 50.0,
            walk_speed: 3.6,
            run_speed: 7.5,
            acceleration: 28.0,
            deceleration: 20.0,
            rotation_speed: 14.0,
            friction: 6.0,
            gravity: 8.5,
            jump_force: 6.0,
            air_control: 0.5,
            push_force: 0.5,
            max_slope_deg: 50.0,
            step_height: 0.35,
        }
    }

    pub fn preset(name: ProfileName) -> Self {
        match name {
            ProfileName::Default => Self::default(),
            ProfileName::Heavy => Self::heavy(),
            ProfileName::Light => Self::light(),
        }
    }

    /// Look up a built-in preset by name.
    pub fn from_name(name: &str) -> Result<Self> {
        Ok(Self::preset(name.parse()?))
    }

    /// Validate and wrap for sharing.
    pub fn into_shared(self) -> Result<Arc<Self>> {
        self.validate()?;
        Ok(Arc::new(self))
    }

    pub fn validate(&self) -> Result<()> {
        let positive = [
            (self.radius, "radius must be > 0"),
            (self.height, "height must be > 0"),
            (self.mass, "mass must be > 0"),
            (self.walk_speed, "walk_speed must be > 0"),
            (self.run_speed, "run_speed must be > 0"),
            (self.acceleration, "acceleration must be > 0"),
            (self.rotation_speed, "rotation_speed must be > 0"),
        ];
        let non_negative = [
            (self.deceleration, "deceleration must be >= 0"),
            (self.friction, "friction must be >= 0"),
            (self.gravity, "gravity must be >= 0"),
            (self.jump_force, "jump_force must be >= 0"),
            (self.push_force, "push_force must be >= 0"),
            (self.step_height, "step_height must be >= 0"),
        ];

        for (value, reason) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(self.invalid(reason));
            }
        }
        for (value, reason) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(self.invalid(reason));
            }
        }
        if !(0.0..=1.0).contains(&self.air_control) {
            return Err(self.invalid("air_control must be within [0, 1]"));
        }
        if !(0.0..90.0).contains(&self.max_slope_deg) {
            return Err(self.invalid("max_slope_deg must be within [0, 90)"));
        }
        if self.run_speed < self.walk_speed {
            return Err(self.invalid("run_speed must be >= walk_speed"));
        }
        if self.step_height >= self.height {
            return Err(self.invalid("step_height must be below height"));
        }
        Ok(())
    }

    /// Speed cap for the current sprint state.
    #[inline]
    pub fn speed_cap(&self, sprint: bool) -> f32 {
        if sprint { self.run_speed } else { self.walk_speed }
    }

    /// Cosine of the steepest standable slope; ground normals with a smaller Y are
    /// too steep.
    #[inline]
    pub fn max_slope_cos(&self) -> f32 {
        self.max_slope_deg.to_radians().cos()
    }

    fn invalid(&self, reason: &'static str) -> NavError {
        NavError::InvalidProfile {
            name: self.name.clone(),
            reason,
        }
    }
}

/// Built-in profile presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileName {
    #[default]
    Default,
    Heavy,
    Light,
}

impl ProfileName {
    pub const ALL: [ProfileName; 3] = [Self::Default, Self::Heavy, Self::Light];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Heavy => "heavy",
            Self::Light => "light",
        }
    }
}

impl fmt::Display for ProfileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProfileName {
    type Err = NavError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| NavError::UnknownProfile(s.to_owned()))
    }
}
