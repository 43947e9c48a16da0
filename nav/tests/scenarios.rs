//! End-to-end scenarios through the public API: scene load, collision, controller,
//! pathfinding and path following together.

use std::sync::Arc;

use nav::{
    CharacterController, CollisionDetector, FlatGround, Hitbox, MoveInput, MovementMode, Obstacle,
    ObstacleKind, PathFollower, PathResult, PathfindingAdapter, PhysicsProfile, ProximityEvent,
    ProximityTracker, SpatialHashGrid, Vec2, Vec3, load_scene,
};

const DT: f32 = 1.0 / 60.0;

fn boxed(id: &str, x: f32, z: f32, hx: f32, hz: f32) -> Obstacle {
    Obstacle::new(
        id,
        Hitbox::oriented_box(Vec2::new(x, z), Vec2::new(hx, hz), 0.0).unwrap(),
        ObstacleKind::Static,
    )
}

fn round(id: &str, x: f32, z: f32, r: f32) -> Obstacle {
    Obstacle::new(
        id,
        Hitbox::circle(Vec2::new(x, z), r).unwrap(),
        ObstacleKind::Static,
    )
}

fn grid_with(obstacles: Vec<Obstacle>) -> SpatialHashGrid {
    let mut grid = SpatialHashGrid::new(2.0).unwrap();
    for o in obstacles {
        grid.insert(o).unwrap();
    }
    grid
}

#[test]
fn agent_overlapping_box_is_pushed_to_its_face() {
    let grid = grid_with(vec![boxed("box", 3.0, 0.0, 1.0, 1.0)]);
    let detector = CollisionDetector::new(&grid);

    let res = detector.check_collision(Vec3::new(2.4, 0.0, 0.0), 0.5);
    assert!(res.collided);
    assert_eq!(res.obstacle_ids.len(), 1);
    assert!((res.push_out.x + 0.9).abs() < 1.0e-3);
    assert!(res.push_out.y.abs() < 1.0e-5);

    let out = detector.resolve(Vec3::new(2.4, 0.0, 0.0), 0.5, 0.0);
    assert!(out.position.x <= 1.5 + 1.0e-3);
    assert!(!detector.check_collision(out.position, 0.499).collided);
}

#[test]
fn wedged_agent_is_not_ejected_through_either_side() {
    let grid = grid_with(vec![
        round("left", -1.1, 0.0, 1.0),
        round("right", 1.1, 0.0, 1.0),
    ]);
    let detector = CollisionDetector::new(&grid);

    let res = detector.check_collision(Vec3::zeros(), 0.5);
    assert!(res.collided);
    assert!(res.wedged);
    assert!(res.push_out.norm() <= 0.2 + 1.0e-4);
}

#[test]
fn enclosed_destination_is_unreachable() {
    let grid = grid_with(vec![
        boxed("n", 0.0, -3.0, 3.25, 0.25),
        boxed("s", 0.0, 3.0, 3.25, 0.25),
        boxed("w", -3.0, 0.0, 0.25, 3.25),
        boxed("e", 3.0, 0.0, 0.25, 3.25),
    ]);
    let finder = PathfindingAdapter::new(CollisionDetector::new(&grid), 0.35);
    assert_eq!(
        finder.find_path(Vec3::new(10.0, 0.0, 10.0), Vec3::zeros()),
        PathResult::Unreachable
    );
}

#[test]
fn clear_line_of_sight_returns_two_waypoints() {
    let grid = grid_with(vec![round("far", 50.0, 50.0, 1.0)]);
    let finder = PathfindingAdapter::new(CollisionDetector::new(&grid), 0.35);
    let from = Vec3::new(-3.0, 0.0, 2.0);
    let to = Vec3::new(4.0, 0.0, -5.0);
    let path = finder.find_path(from, to).into_path().unwrap();
    assert_eq!(path.waypoints(), &[from, to]);
}

#[test]
fn click_to_move_walks_around_a_wall() {
    let scene = load_scene(
        r#"{
            "spawn": [0.0, 0.0, 0.0],
            "zones": [
                { "id": "back", "position": [0.0, 0.0, -4.0], "radius": 3.0, "name": "Back Wall" },
                { "id": "col", "position": [6.0, 0.0, -4.0], "radius": 0.5, "name": "pillar" }
            ]
        }"#,
    )
    .unwrap();
    let detector = scene.detector();
    let ground = FlatGround::default();
    let profile = Arc::new(PhysicsProfile::default());
    let mut ctrl = CharacterController::new(Arc::clone(&profile), scene.spawn).unwrap();

    let target = Vec3::new(0.0, 0.0, -8.0);
    let path = PathfindingAdapter::new(detector, profile.radius)
        .find_path(scene.spawn, target)
        .into_path()
        .expect("route around the wall");
    assert!(path.len() > 2);
    assert!(!path.is_stale(&scene.grid));

    let mut follower = PathFollower::new(&path, 0.5);
    let mut ticks = 0;
    while let Some(input) = follower.next_input(&ctrl.snapshot()) {
        let report = ctrl.tick(&input, DT, &detector, &ground);
        assert!(!report.rejected);
        assert!(!report.wedged);
        ticks += 1;
        assert!(ticks < 1200, "follower never arrived: {:?}", ctrl.snapshot());
    }

    let end = ctrl.snapshot().position;
    assert!((Vec2::new(end.x, end.z) - Vec2::new(target.x, target.z)).norm() <= 0.6);
    assert!(!detector.check_collision(end, profile.radius).collided);

    for _ in 0..60 {
        ctrl.tick(&MoveInput::idle(), DT, &detector, &ground);
    }
    assert_eq!(ctrl.mode(), MovementMode::Idle);
}

#[test]
fn walking_up_to_a_terminal_raises_a_prompt() {
    let scene = load_scene(
        r#"{
            "spawn": [0.0, 0.0, 0.0],
            "zones": [
                { "id": "kiosk", "position": [0.0, 0.0, -5.0], "radius": 0.5, "name": "Info Terminal" }
            ]
        }"#,
    )
    .unwrap();
    let detector = scene.detector();
    let mut ctrl =
        CharacterController::new(Arc::new(PhysicsProfile::default()), scene.spawn).unwrap();
    let mut tracker = ProximityTracker::new(scene.interactions.clone());

    let forward = MoveInput::new(0.0).with(nav::MoveIntent::Forward);
    let mut events = Vec::new();
    for _ in 0..120 {
        ctrl.tick(&forward, DT, &detector, &FlatGround::default());
        events.extend(tracker.update(&ctrl.snapshot()));
    }

    assert_eq!(events, vec![ProximityEvent::Entered("kiosk".into())]);
    // The terminal itself still blocks.
    assert!(ctrl.snapshot().position.z > -5.0 + 0.3);
}

#[test]
fn moving_a_dynamic_obstacle_invalidates_paths() {
    let mut grid = grid_with(vec![boxed("wall", 0.0, -3.0, 3.0, 0.25)]);
    grid.insert(Obstacle::new(
        "cart",
        Hitbox::circle(Vec2::new(8.0, 8.0), 0.5).unwrap(),
        ObstacleKind::Dynamic,
    ))
    .unwrap();

    let path = PathfindingAdapter::new(CollisionDetector::new(&grid), 0.35)
        .find_path(Vec3::zeros(), Vec3::new(0.0, 0.0, -6.0))
        .into_path()
        .unwrap();

    grid.move_to(&"cart".into(), Vec2::new(9.0, 8.0)).unwrap();
    assert!(path.is_stale(&grid));
    assert!(grid.move_to(&"wall".into(), Vec2::zeros()).is_err());
}
