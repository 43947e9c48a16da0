//! Turning a path into per-tick movement input.
//!
//! The follower does not move anything itself: it produces a [`MoveInput`] that the
//! character controller consumes like player input, so collisions, slopes and speed
//! caps apply identically to click-to-move and keyboard movement.

use crate::{
    collision::types::{Vec2, Vec3},
    intent::{MoveInput, MoveIntent},
    movement::CharacterState,
    pathfinding::Path,
    utils::{is_at_target_planar, to_planar, yaw_from_xz},
};

/// Smallest acceptance radius used when deriving one from an agent radius (meters).
pub const MIN_ACCEPTANCE: f32 = 0.1;

/// Acceptance radius for an agent of `radius`: half the radius, with a floor.
#[inline]
pub fn acceptance_for_radius(radius: f32) -> f32 {
    (radius * 0.5).max(MIN_ACCEPTANCE)
}

/// Result of one [`PathFollower::step`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FollowStep {
    /// Input to feed the controller this tick; `None` once the path is done.
    pub input: Option<MoveInput>,
    /// True once the final waypoint is within acceptance.
    pub finished: bool,
    /// Remaining planar distance along the path from the current position (meters).
    pub remaining: f32,
}

/// Walks an agent along a [`Path`], one waypoint at a time.
#[derive(Clone, Debug)]
pub struct PathFollower {
    waypoints: Vec<Vec2>,
    index: usize,
    acceptance: f32,
    sprint: bool,
}

impl PathFollower {
    pub fn new(path: &Path, acceptance: f32) -> Self {
        Self {
            waypoints: path.waypoints().iter().copied().map(to_planar).collect(),
            index: 0,
            acceptance: acceptance.max(0.0),
            sprint: false,
        }
    }

    pub fn for_radius(path: &Path, agent_radius: f32) -> Self {
        Self::new(path, acceptance_for_radius(agent_radius))
    }

    pub fn with_sprint(mut self, sprint: bool) -> Self {
        self.sprint = sprint;
        self
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.index >= self.waypoints.len()
    }

    /// The waypoint currently being approached.
    #[inline]
    pub fn current_waypoint(&self) -> Option<Vec2> {
        self.waypoints.get(self.index).copied()
    }

    /// Advance past every waypoint already within acceptance, then steer toward the
    /// next one.
    pub fn step(&mut self, state: &CharacterState) -> FollowStep {
        let here = to_planar(state.position);
        while let Some(&wp) = self.waypoints.get(self.index) {
            if !is_at_target_planar(here, wp, self.acceptance) {
                break;
            }
            self.index += 1;
        }

        let remaining = self.remaining_from(here);
        let Some(wp) = self.current_waypoint() else {
            return FollowStep {
                input: None,
                finished: true,
                remaining,
            };
        };

        let input = yaw_from_xz(wp - here).map(|heading| {
            let mut input = MoveInput::new(heading).with(MoveIntent::Forward);
            input.intent.set(MoveIntent::Sprint, self.sprint);
            input
        });
        FollowStep {
            input,
            finished: false,
            remaining,
        }
    }

    /// Shorthand for `step(state).input`.
    pub fn next_input(&mut self, state: &CharacterState) -> Option<MoveInput> {
        self.step(state).input
    }

    fn remaining_from(&self, here: Vec2) -> f32 {
        let Some(&first) = self.waypoints.get(self.index) else {
            return 0.0;
        };
        let tail: f32 = self.waypoints[self.index..]
            .windows(2)
            .map(|w| (w[1] - w[0]).norm())
            .sum();
        (first - here).norm() + tail
    }
}

/// Convenience for callers that only want a target point.
pub fn heading_to(from: Vec3, to: Vec3) -> Option<f32> {
    yaw_from_xz(to_planar(to) - to_planar(from))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(points: &[(f32, f32)]) -> Path {
        Path::new(points.iter().map(|&(x, z)| Vec3::new(x, 0.0, z)).collect(), 0)
    }

    fn at(x: f32, z: f32) -> CharacterState {
        CharacterState::at(Vec3::new(x, 0.0, z))
    }

    #[test]
    fn skips_start_waypoint_and_heads_to_next() {
        let mut f = PathFollower::new(&path(&[(0.0, 0.0), (0.0, -4.0)]), 0.2);
        let step = f.step(&at(0.0, 0.0));
        assert!(!step.finished);
        assert_eq!(f.current_waypoint(), Some(Vec2::new(0.0, -4.0)));
        let input = step.input.unwrap();
        assert!(input.has(MoveIntent::Forward));
        // -Z is heading 0.
        assert!(input.heading.abs() < 1.0e-6);
        assert!((step.remaining - 4.0).abs() < 1.0e-5);
    }

    #[test]
    fn finishes_inside_acceptance_of_last_waypoint() {
        let mut f = PathFollower::new(&path(&[(0.0, 0.0), (2.0, 0.0), (2.0, 2.0)]), 0.25);
        assert_eq!(f.step(&at(0.0, 0.0)).remaining, 4.0);
        assert!(f.step(&at(1.9, 0.1)).input.is_some());
        assert_eq!(f.current_waypoint(), Some(Vec2::new(2.0, 2.0)));

        let done = f.step(&at(2.1, 1.9));
        assert!(done.finished);
        assert_eq!(done.input, None);
        assert_eq!(done.remaining, 0.0);
        assert!(f.is_finished());
    }

    #[test]
    fn sprint_flag_is_forwarded() {
        let mut f = PathFollower::for_radius(&path(&[(0.0, 0.0), (5.0, 0.0)]), 0.35).with_sprint(true);
        assert!(f.next_input(&at(0.0, 0.0)).unwrap().sprint());
        assert!((acceptance_for_radius(0.35) - 0.175).abs() < 1.0e-6);
        assert_eq!(acceptance_for_radius(0.0), MIN_ACCEPTANCE);
    }

    #[test]
    fn heading_points_at_target() {
        let h = heading_to(Vec3::zeros(), Vec3::new(1.0, 3.0, 0.0)).unwrap();
        assert!((h + std::f32::consts::FRAC_PI_2).abs() < 1.0e-6);
        assert_eq!(heading_to(Vec3::zeros(), Vec3::new(0.0, 2.0, 0.0)), None);
    }
}
