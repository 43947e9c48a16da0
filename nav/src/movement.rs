use std::sync::Arc;

use log::{debug, warn};

use crate::{
    collision::{
        CollisionDetector, GroundHit, GroundQuery, ObstacleId, ObstacleKind, Vec2, Vec3,
        settings::{
            DIST_EPS, GROUND_PROBE_DISTANCE, GROUND_SNAP_DISTANCE, MAX_SUBSTEPS, MIN_MOVE_SQ,
            SUBSTEP_RADIUS_FRACTION,
        },
    },
    constants::{IDLE_SPEED_EPS, MAX_TICK_DT_S, TERMINAL_FALL_SPEED_MPS},
    error::Result,
    intent::MoveInput,
    profile::PhysicsProfile,
    utils::{clamp_planar, is_finite_vec3, move_toward, rotate_toward, to_planar, yaw_from_xz},
};

/// Kinematic state of the avatar. Feet position, not centre.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CharacterState {
    pub position: Vec3,
    pub velocity: Vec3,
    pub is_grounded: bool,
    /// Yaw in radians, `[-π, π)`; 0 faces -Z.
    pub facing: f32,
}

impl CharacterState {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            velocity: Vec3::zeros(),
            is_grounded: true,
            facing: 0.0,
        }
    }

    #[inline]
    pub fn planar_speed(&self) -> f32 {
        to_planar(self.velocity).norm()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum MovementMode {
    #[default]
    Idle,
    Walking,
    Running,
    Airborne,
}

/// The agent pushed into a dynamic obstacle this tick.
#[derive(Clone, Debug, PartialEq)]
pub struct DynamicContact {
    pub id: ObstacleId,
    /// Contact normal, pointing from the obstacle toward the agent.
    pub normal: Vec2,
    /// Planar impulse to apply to the obstacle (kg·m/s).
    pub impulse: Vec2,
}

/// What happened during one [`CharacterController::tick`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickReport {
    pub mode: MovementMode,
    /// The tick was skipped because of non-finite input or state.
    pub rejected: bool,
    pub collided: bool,
    pub wedged: bool,
    /// Every blocking obstacle touched, in first-contact order.
    pub contacts: Vec<ObstacleId>,
    pub dynamic_contacts: Vec<DynamicContact>,
}

/// Tick-based controller for a single circular avatar.
///
/// The controller owns its [`CharacterState`]; everything else reads snapshots.
/// World access is passed in per tick so the grid cannot change under it.
#[derive(Clone, Debug)]
pub struct CharacterController {
    profile: Arc<PhysicsProfile>,
    state: CharacterState,
    mode: MovementMode,
    wedge_reported: bool,
}

impl CharacterController {
    /// Fails with [`crate::NavError::InvalidProfile`] when `profile` does not validate.
    pub fn new(profile: Arc<PhysicsProfile>, spawn: Vec3) -> Result<Self> {
        profile.validate()?;
        Ok(Self {
            profile,
            state: CharacterState::at(spawn),
            mode: MovementMode::Idle,
            wedge_reported: false,
        })
    }

    #[inline]
    pub fn profile(&self) -> &Arc<PhysicsProfile> {
        &self.profile
    }

    /// Swap the active profile. Takes effect on the next tick; an invalid profile
    /// leaves the current one in place.
    pub fn set_profile(&mut self, profile: Arc<PhysicsProfile>) -> Result<()> {
        profile.validate()?;
        self.profile = profile;
        Ok(())
    }

    #[inline]
    pub fn state(&self) -> &CharacterState {
        &self.state
    }

    #[inline]
    pub fn snapshot(&self) -> CharacterState {
        self.state
    }

    #[inline]
    pub fn mode(&self) -> MovementMode {
        self.mode
    }

    /// Place the character at `position`, at rest.
    pub fn teleport(&mut self, position: Vec3) {
        if !is_finite_vec3(&position) {
            debug!("ignored teleport to non-finite position {position:?}");
            return;
        }
        self.state = CharacterState {
            facing: self.state.facing,
            ..CharacterState::at(position)
        };
        self.mode = MovementMode::Idle;
        self.wedge_reported = false;
    }

    /// Advance the character by `dt` seconds.
    ///
    /// Steps
    /// 1. Horizontal velocity toward the wished direction (or friction with no input).
    /// 2. Vertical velocity: jump when grounded, gravity when airborne.
    /// 3. Sub-stepped collide-and-slide against the grid; obstacles low enough to
    ///    step onto do not block.
    /// 4. Terrain/step support: land, step up, or slide off steep ground.
    /// 5. Facing, mode and commit.
    ///
    /// Non-finite input or a non-finite result leaves the state untouched and
    /// returns a report with `rejected` set.
    pub fn tick(
        &mut self,
        input: &MoveInput,
        dt: f32,
        detector: &CollisionDetector<'_>,
        ground: &dyn GroundQuery,
    ) -> TickReport {
        if !dt.is_finite() || dt < 0.0 || !input.is_finite() {
            debug!("rejected tick: dt={dt}, heading={}", input.heading);
            return self.rejected();
        }
        let dt = dt.min(MAX_TICK_DT_S);
        if dt <= 0.0 {
            return TickReport {
                mode: self.mode,
                ..TickReport::default()
            };
        }

        let profile = Arc::clone(&self.profile);
        let p = profile.as_ref();
        let start = self.state;
        let mut report = TickReport::default();
        let mut grounded = start.is_grounded;

        // 1) Horizontal velocity.
        let cap = p.speed_cap(input.sprint());
        let wish = input.wish_direction();
        let mut v = to_planar(start.velocity);
        match wish {
            Some(dir) => {
                let control = if grounded { 1.0 } else { p.air_control };
                v = move_toward(v, dir * cap, p.acceleration * control * dt);
            }
            None if grounded => {
                v *= (-p.friction * dt).exp();
                v = move_toward(v, Vec2::zeros(), p.deceleration * dt);
                if v.norm() < IDLE_SPEED_EPS {
                    v = Vec2::zeros();
                }
            }
            None => {}
        }
        v = clamp_planar(v, cap);

        // 2) Vertical velocity.
        let mut vy = start.velocity.y;
        if grounded {
            vy = 0.0;
            if input.jump() && p.jump_force > 0.0 {
                vy = p.jump_force;
                grounded = false;
            }
        } else {
            vy = (vy - p.gravity * dt).max(TERMINAL_FALL_SPEED_MPS);
        }

        let tentative = start.position + Vec3::new(v.x, vy, v.y) * dt;
        if !is_finite_vec3(&tentative) {
            debug!("rejected tick: non-finite tentative position {tentative:?}");
            return self.rejected();
        }

        // 3) Collide and slide, sub-stepped so one step never exceeds a fraction of
        //    the radius.
        let feet_y = start.position.y;
        let mut pos = to_planar(start.position);
        let (substeps, travel) = plan_substeps(v * dt, p.radius);
        if travel != v * dt {
            debug!(
                "horizontal travel clamped from {:.2} to {:.2} m",
                (v * dt).norm(),
                travel.norm()
            );
        }
        let mut step_delta = travel / substeps as f32;

        for i in 0..substeps {
            if i > 0 && step_delta.norm_squared() <= MIN_MOVE_SQ {
                break;
            }
            let candidate = pos + step_delta;
            let res = detector.resolve(
                Vec3::new(candidate.x, feet_y, candidate.y),
                p.radius,
                p.step_height,
            );
            let resolved = to_planar(res.position);

            for contact in &res.contacts {
                let n = contact.push.normal;
                let into = v.dot(&n);
                if into < 0.0 {
                    v -= n * into;
                }
                let step_into = step_delta.dot(&n);
                if step_into < 0.0 {
                    step_delta -= n * step_into;
                }

                if report.contacts.contains(&contact.id) {
                    continue;
                }
                report.contacts.push(contact.id.clone());
                if contact.kind == ObstacleKind::Dynamic && into < 0.0 {
                    report.dynamic_contacts.push(DynamicContact {
                        id: contact.id.clone(),
                        normal: n,
                        impulse: -n * (-into * p.mass * p.push_force),
                    });
                }
            }
            report.collided |= res.collided;
            report.wedged |= res.wedged;

            // Terrain rising too steeply (or higher than a step) stops horizontal
            // progress in that direction.
            let support = support_at(ground, resolved, feet_y, p.step_height, res.step_surface);
            if let Some(hit) = support
                && hit.height > feet_y + DIST_EPS
                && !is_standable(&hit, p)
            {
                let travel = resolved - pos;
                let len = travel.norm();
                if len > DIST_EPS {
                    let dir = travel / len;
                    let along = v.dot(&dir);
                    if along > 0.0 {
                        v -= dir * along;
                    }
                }
                break;
            }
            pos = resolved;
        }

        // 4) Vertical resolution against terrain and step surfaces.
        let step_surface = detector
            .check_collision_stepping(Vec3::new(pos.x, feet_y, pos.y), p.radius, p.step_height)
            .step_surface;
        let support = support_at(ground, pos, feet_y, p.step_height, step_surface);
        let snap = if start.is_grounded {
            GROUND_SNAP_DISTANCE
        } else {
            0.0
        };
        let mut y = feet_y + vy * dt;
        match support {
            Some(hit) if vy <= 0.0 && y <= hit.height + snap => {
                y = hit.height;
                vy = 0.0;
                if is_standable(&hit, p) {
                    grounded = true;
                } else {
                    grounded = false;
                    let downhill = Vec2::new(hit.normal.x, hit.normal.z);
                    if downhill.norm_squared() > MIN_MOVE_SQ {
                        v += downhill.normalize() * (p.gravity * dt);
                    }
                }
            }
            _ => grounded = false,
        }
        v = clamp_planar(v, cap);

        // 5) Facing follows the intended direction, not the slide direction.
        let mut facing = start.facing;
        if let Some(target) = wish.and_then(yaw_from_xz) {
            facing = rotate_toward(facing, target, p.rotation_speed * dt);
        }

        let next = CharacterState {
            position: Vec3::new(pos.x, y, pos.y),
            velocity: Vec3::new(v.x, vy, v.y),
            is_grounded: grounded,
            facing,
        };
        if !is_finite_vec3(&next.position) || !is_finite_vec3(&next.velocity) {
            debug!("rejected tick: non-finite result {:?}", next.position);
            return self.rejected();
        }

        if report.wedged {
            if !self.wedge_reported {
                warn!(
                    "character wedged at ({:.2}, {:.2}) between {:?}",
                    pos.x, pos.y, report.contacts
                );
                self.wedge_reported = true;
            }
        } else {
            self.wedge_reported = false;
        }

        self.state = next;
        self.mode = classify(&next, p, input.sprint());
        report.mode = self.mode;
        report
    }

    fn rejected(&self) -> TickReport {
        TickReport {
            mode: self.mode,
            rejected: true,
            ..TickReport::default()
        }
    }
}

fn classify(state: &CharacterState, profile: &PhysicsProfile, sprint: bool) -> MovementMode {
    if !state.is_grounded {
        return MovementMode::Airborne;
    }
    let speed = state.planar_speed();
    if speed < IDLE_SPEED_EPS {
        MovementMode::Idle
    } else if sprint && speed > profile.walk_speed + DIST_EPS {
        MovementMode::Running
    } else {
        MovementMode::Walking
    }
}

/// Sub-step count and the horizontal displacement actually travelled this tick.
///
/// Every sub-step stays within `SUBSTEP_RADIUS_FRACTION` of the radius. When that
/// needs more than `MAX_SUBSTEPS`, the travel is shortened instead.
fn plan_substeps(delta: Vec2, radius: f32) -> (u32, Vec2) {
    let max_step = radius * SUBSTEP_RADIUS_FRACTION;
    let distance = delta.norm();
    if !distance.is_finite() || max_step <= 0.0 || distance <= max_step {
        return (1, delta);
    }
    let n = (distance / max_step).ceil();
    if n <= MAX_SUBSTEPS as f32 {
        return (n as u32, delta);
    }
    let reach = max_step * MAX_SUBSTEPS as f32;
    (MAX_SUBSTEPS, delta * (reach / distance))
}

#[inline]
fn is_standable(hit: &GroundHit, profile: &PhysicsProfile) -> bool {
    let n = hit.normal;
    n.norm_squared() > MIN_MOVE_SQ && n.normalize().y >= profile.max_slope_cos() - DIST_EPS
}

/// Highest surface under `xz` reachable from `feet_y`: terrain or a step-over prop.
fn support_at(
    ground: &dyn GroundQuery,
    xz: Vec2,
    feet_y: f32,
    step_height: f32,
    step_surface: Option<f32>,
) -> Option<GroundHit> {
    let terrain = ground.probe(
        xz.x,
        xz.y,
        feet_y + step_height,
        GROUND_PROBE_DISTANCE + step_height,
    );
    let prop = step_surface.map(GroundHit::flat);
    match (terrain, prop) {
        (Some(t), Some(s)) => Some(if s.height > t.height { s } else { t }),
        (t, s) => t.or(s),
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use super::*;
    use crate::{
        collision::{FlatGround, Obstacle, SpatialHashGrid},
        error::NavError,
        hitbox::Hitbox,
        intent::MoveIntent,
    };

    const DT: f32 = 1.0 / 60.0;

    fn grid_with(obstacles: Vec<Obstacle>) -> SpatialHashGrid {
        let mut grid = SpatialHashGrid::new(2.0).unwrap();
        for o in obstacles {
            grid.insert(o).unwrap();
        }
        grid
    }

    fn block(id: &str, x: f32, z: f32, hx: f32, hz: f32, kind: ObstacleKind) -> Obstacle {
        let hitbox = Hitbox::oriented_box(Vec2::new(x, z), Vec2::new(hx, hz), 0.0).unwrap();
        Obstacle::new(id, hitbox, kind)
    }

    fn controller_at(x: f32, z: f32) -> CharacterController {
        CharacterController::new(Arc::new(PhysicsProfile::default()), Vec3::new(x, 0.0, z))
            .unwrap()
    }

    fn run(
        ctrl: &mut CharacterController,
        input: MoveInput,
        ticks: usize,
        grid: &SpatialHashGrid,
        ground: &dyn GroundQuery,
    ) -> Vec<TickReport> {
        let detector = CollisionDetector::new(grid);
        (0..ticks)
            .map(|_| ctrl.tick(&input, DT, &detector, ground))
            .collect()
    }

    /// Ramp rising along +X from `start_x` at `angle` radians.
    struct Ramp {
        start_x: f32,
        angle: f32,
    }

    impl GroundQuery for Ramp {
        fn probe(&self, x: f32, _z: f32, from_y: f32, max_drop: f32) -> Option<GroundHit> {
            let (height, normal) = if x > self.start_x {
                (
                    (x - self.start_x) * self.angle.tan(),
                    Vec3::new(-self.angle.sin(), self.angle.cos(), 0.0),
                )
            } else {
                (0.0, Vec3::new(0.0, 1.0, 0.0))
            };
            if height > from_y {
                return Some(GroundHit {
                    height: from_y,
                    normal: Vec3::zeros(),
                });
            }
            (from_y - height <= max_drop).then_some(GroundHit { height, normal })
        }
    }

    #[test]
    fn spawns_grounded_and_idle() {
        let ctrl = controller_at(1.0, 2.0);
        let s = ctrl.snapshot();
        assert!(s.is_grounded);
        assert_eq!(s.velocity, Vec3::zeros());
        assert_eq!(ctrl.mode(), MovementMode::Idle);
    }

    #[test]
    fn sprinting_diagonally_never_exceeds_run_speed() {
        let grid = grid_with(vec![]);
        let mut ctrl = controller_at(0.0, 0.0);
        let input = MoveInput::new(0.3)
            .with(MoveIntent::Forward)
            .with(MoveIntent::Right)
            .with(MoveIntent::Sprint);
        let reports = run(&mut ctrl, input, 90, &grid, &FlatGround::default());

        assert!(ctrl.state().planar_speed() <= PhysicsProfile::default().run_speed + 1.0e-4);
        assert!((ctrl.state().planar_speed() - 6.0).abs() < 1.0e-3);
        assert_eq!(reports.last().unwrap().mode, MovementMode::Running);
    }

    #[test]
    fn releasing_input_comes_to_rest() {
        let grid = grid_with(vec![]);
        let mut ctrl = controller_at(0.0, 0.0);
        run(
            &mut ctrl,
            MoveInput::new(0.0).with(MoveIntent::Forward),
            30,
            &grid,
            &FlatGround::default(),
        );
        assert_eq!(ctrl.mode(), MovementMode::Walking);

        run(&mut ctrl, MoveInput::idle(), 60, &grid, &FlatGround::default());
        assert_eq!(ctrl.state().planar_speed(), 0.0);
        assert_eq!(ctrl.mode(), MovementMode::Idle);
    }

    #[test]
    fn agent_inside_box_is_pushed_out() {
        let grid = grid_with(vec![block("crate", 3.0, 0.0, 1.0, 1.0, ObstacleKind::Static)]);
        let profile = PhysicsProfile {
            radius: 0.5,
            ..PhysicsProfile::default()
        };
        let mut ctrl =
            CharacterController::new(Arc::new(profile), Vec3::new(2.4, 0.0, 0.0)).unwrap();
        let report = run(&mut ctrl, MoveInput::idle(), 1, &grid, &FlatGround::default()).remove(0);

        assert!(report.collided);
        assert_eq!(report.contacts, vec![ObstacleId::from("crate")]);
        let x = ctrl.state().position.x;
        assert!(x <= 1.5 + 1.0e-3 && x > 1.4, "x = {x}");
    }

    #[test]
    fn slides_along_wall() {
        let grid = grid_with(vec![block("wall", 0.0, -3.0, 10.0, 0.5, ObstacleKind::Static)]);
        let mut ctrl = controller_at(0.0, 0.0);
        let input = MoveInput::new(0.0)
            .with(MoveIntent::Forward)
            .with(MoveIntent::Right);
        run(&mut ctrl, input, 120, &grid, &FlatGround::default());

        let p = ctrl.state().position;
        assert!(p.z >= -2.5 + 0.35 - 1.0e-3, "z = {}", p.z);
        assert!(p.x > 2.0, "x = {}", p.x);
    }

    #[test]
    fn jump_rises_and_lands() {
        let grid = grid_with(vec![]);
        let ground = FlatGround::default();
        let detector = CollisionDetector::new(&grid);
        let mut ctrl = controller_at(0.0, 0.0);

        let r = ctrl.tick(&MoveInput::new(0.0).with(MoveIntent::Jump), DT, &detector, &ground);
        assert_eq!(r.mode, MovementMode::Airborne);

        let mut peak = 0.0f32;
        for _ in 0..120 {
            ctrl.tick(&MoveInput::idle(), DT, &detector, &ground);
            peak = peak.max(ctrl.state().position.y);
        }
        assert!(peak > 1.0, "peak = {peak}");
        assert!(ctrl.state().is_grounded);
        assert_eq!(ctrl.state().position.y, 0.0);
        assert_eq!(ctrl.mode(), MovementMode::Idle);
    }

    #[test]
    fn non_finite_input_is_a_no_op() {
        let grid = grid_with(vec![]);
        let detector = CollisionDetector::new(&grid);
        let mut ctrl = controller_at(1.0, 1.0);
        let before = ctrl.snapshot();

        let r = ctrl.tick(&MoveInput::idle(), f32::NAN, &detector, &FlatGround::default());
        assert!(r.rejected);
        let r = ctrl.tick(
            &MoveInput::new(f32::INFINITY).with(MoveIntent::Forward),
            DT,
            &detector,
            &FlatGround::default(),
        );
        assert!(r.rejected);
        assert_eq!(ctrl.snapshot(), before);
    }

    #[test]
    fn steps_onto_low_obstacle() {
        let curb = block("curb", 0.0, -2.0, 2.0, 0.5, ObstacleKind::Static).with_top(0.2);
        let grid = grid_with(vec![curb]);
        let mut ctrl = controller_at(0.0, 0.0);
        run(
            &mut ctrl,
            MoveInput::new(0.0).with(MoveIntent::Forward),
            40,
            &grid,
            &FlatGround::default(),
        );

        let p = ctrl.state().position;
        assert!(p.z < -1.5, "z = {}", p.z);
        assert!((p.y - 0.2).abs() < 1.0e-4, "y = {}", p.y);
        assert!(ctrl.state().is_grounded);
    }

    #[test]
    fn tall_obstacle_blocks() {
        let ledge = block("ledge", 0.0, -2.0, 2.0, 0.5, ObstacleKind::Static).with_top(1.0);
        let grid = grid_with(vec![ledge]);
        let mut ctrl = controller_at(0.0, 0.0);
        run(
            &mut ctrl,
            MoveInput::new(0.0).with(MoveIntent::Forward),
            60,
            &grid,
            &FlatGround::default(),
        );

        let p = ctrl.state().position;
        assert!(p.z >= -1.5 + 0.35 - 1.0e-3, "z = {}", p.z);
        assert_eq!(p.y, 0.0);
    }

    #[test]
    fn steep_ramp_cannot_be_climbed() {
        let grid = grid_with(vec![]);
        let ramp = Ramp {
            start_x: 1.0,
            angle: 60f32.to_radians(),
        };
        let mut ctrl = controller_at(0.0, 0.0);
        // Heading -π/2 faces +X.
        run(
            &mut ctrl,
            MoveInput::new(-FRAC_PI_2).with(MoveIntent::Forward),
            120,
            &grid,
            &ramp,
        );

        let p = ctrl.state().position;
        assert!(p.x < 1.2, "x = {}", p.x);
        assert!(p.y < 0.35, "y = {}", p.y);
    }

    #[test]
    fn gentle_ramp_is_climbed() {
        let grid = grid_with(vec![]);
        let ramp = Ramp {
            start_x: 1.0,
            angle: 20f32.to_radians(),
        };
        let mut ctrl = controller_at(0.0, 0.0);
        run(
            &mut ctrl,
            MoveInput::new(-FRAC_PI_2).with(MoveIntent::Forward),
            120,
            &grid,
            &ramp,
        );

        let p = ctrl.state().position;
        assert!(p.x > 3.0, "x = {}", p.x);
        assert!(p.y > 0.5, "y = {}", p.y);
        assert!(ctrl.state().is_grounded);
    }

    #[test]
    fn facing_turns_at_bounded_rate() {
        let grid = grid_with(vec![]);
        let detector = CollisionDetector::new(&grid);
        let mut ctrl = controller_at(0.0, 0.0);
        // Backward at heading 0 wishes +Z, which is yaw ±π.
        ctrl.tick(
            &MoveInput::new(0.0).with(MoveIntent::Backward),
            DT,
            &detector,
            &FlatGround::default(),
        );
        let turned = ctrl.state().facing.abs();
        assert!((turned - 10.0 * DT).abs() < 1.0e-4, "facing = {turned}");
    }

    #[test]
    fn pushing_dynamic_obstacle_emits_contact() {
        let cart = Obstacle::new(
            "cart",
            Hitbox::circle(Vec2::new(0.0, -1.0), 0.5).unwrap(),
            ObstacleKind::Dynamic,
        );
        let grid = grid_with(vec![cart]);
        let mut ctrl = controller_at(0.0, 0.0);
        let reports = run(
            &mut ctrl,
            MoveInput::new(0.0).with(MoveIntent::Forward),
            30,
            &grid,
            &FlatGround::default(),
        );

        let contact = reports
            .iter()
            .flat_map(|r| r.dynamic_contacts.iter())
            .next()
            .expect("no dynamic contact");
        assert_eq!(contact.id.as_str(), "cart");
        assert!(contact.impulse.y < 0.0);
        assert!(ctrl.state().position.z >= -1.0 + 0.85 - 1.0e-3);
    }

    #[test]
    fn swapping_profile_changes_speed_cap() {
        let grid = grid_with(vec![]);
        let mut ctrl = controller_at(0.0, 0.0);
        ctrl.set_profile(Arc::new(PhysicsProfile::heavy())).unwrap();
        run(
            &mut ctrl,
            MoveInput::new(0.0).with(MoveIntent::Forward),
            120,
            &grid,
            &FlatGround::default(),
        );
        assert!((ctrl.state().planar_speed() - 2.2).abs() < 1.0e-3);
    }

    #[test]
    fn invalid_profile_is_refused() {
        let nan_radius = PhysicsProfile {
            radius: f32::NAN,
            ..PhysicsProfile::default()
        };
        assert!(matches!(
            CharacterController::new(Arc::new(nan_radius.clone()), Vec3::zeros()),
            Err(NavError::InvalidProfile { .. })
        ));

        let mut ctrl = controller_at(0.0, 0.0);
        assert!(ctrl.set_profile(Arc::new(nan_radius)).is_err());
        assert_eq!(ctrl.profile().radius, PhysicsProfile::default().radius);
    }

    #[test]
    fn small_agent_cannot_sprint_through_a_thin_wall() {
        let grid = grid_with(vec![block("pane", 0.0, 0.0, 5.0, 0.01, ObstacleKind::Static)]);
        let profile = Arc::new(PhysicsProfile {
            radius: 0.01,
            ..PhysicsProfile::default()
        });
        let sprint = MoveInput::new(0.0)
            .with(MoveIntent::Forward)
            .with(MoveIntent::Sprint);

        for i in 0..50 {
            let start_z = 0.5 + i as f32 * 0.001;
            let mut ctrl =
                CharacterController::new(Arc::clone(&profile), Vec3::new(0.0, 0.0, start_z))
                    .unwrap();
            run(&mut ctrl, sprint, 120, &grid, &FlatGround::default());
            let z = ctrl.state().position.z;
            assert!(z >= 0.02 - 1.0e-3, "tunnelled from z={start_z} to z={z}");
        }
    }

    #[test]
    fn fast_profile_is_slowed_rather_than_tunnelling() {
        let grid = grid_with(vec![block("wall", 0.0, 0.0, 5.0, 0.1, ObstacleKind::Static)]);
        let profile = PhysicsProfile {
            walk_speed: 400.0,
            run_speed: 400.0,
            acceleration: 1.0e5,
            ..PhysicsProfile::default()
        };
        let radius = profile.radius;
        let mut ctrl =
            CharacterController::new(Arc::new(profile), Vec3::new(0.0, 0.0, 2.0)).unwrap();
        let detector = CollisionDetector::new(&grid);
        let forward = MoveInput::new(0.0).with(MoveIntent::Forward);

        for _ in 0..10 {
            ctrl.tick(&forward, 0.1, &detector, &FlatGround::default());
        }
        assert!(ctrl.state().position.z >= 0.1 + radius - 0.01);
    }

    #[test]
    fn long_travel_is_shortened_not_stretched() {
        let (n, travel) = plan_substeps(Vec2::new(0.0, -40.0), 0.35);
        assert_eq!(n, MAX_SUBSTEPS);
        assert!(travel.norm() / n as f32 <= 0.35 * SUBSTEP_RADIUS_FRACTION + 1.0e-5);
        assert!(travel.y < 0.0);

        let (n, travel) = plan_substeps(Vec2::new(0.5, 0.0), 0.25);
        assert_eq!(n, 4);
        assert_eq!(travel, Vec2::new(0.5, 0.0));
    }
}
