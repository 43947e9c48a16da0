//! Click-to-move pathfinding over the spatial hash grid.
//!
//! # Model
//! - A straight segment with enough clearance for the agent is returned as-is.
//! - Otherwise A* runs over navigation cells obtained by subdividing each grid cell
//!   until a nav cell is no larger than the agent radius. A nav cell is passable
//!   when the clearance at its centre exceeds the agent radius.
//! - The cell path is straightened by dropping waypoints that have line of sight
//!   to a later waypoint.
//!
//! Obstacle heights are ignored here: a prop the character could step onto is still
//! routed around.

use std::{cmp::Ordering, collections::BinaryHeap};

use log::{debug, trace};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::{
    cell::{CellKey, CellRange, cell_center, encode_cell},
    collision::{
        CollisionDetector, SpatialHashGrid,
        settings::QUERY_SKIN,
        types::{Aabb2, Vec2, Vec3},
    },
    constants::{MAX_PATH_EXPANSIONS, PATH_SEARCH_MARGIN_CELLS},
    utils::{is_finite_vec3, to_planar},
};

/// Upper bound on nav cells per grid cell along one axis.
const MAX_SUBDIVISIONS: f32 = 16.0;

/// Search limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathfindingConfig {
    /// Nodes expanded before giving up.
    pub max_expansions: usize,
    /// Extra grid cells searched around the obstacle extent and the endpoints.
    pub search_margin_cells: i32,
    /// Straighten the cell path.
    pub smooth: bool,
}

impl Default for PathfindingConfig {
    fn default() -> Self {
        Self {
            max_expansions: MAX_PATH_EXPANSIONS,
            search_margin_cells: PATH_SEARCH_MARGIN_CELLS,
            smooth: true,
        }
    }
}

/// Waypoints from start to destination, both included.
#[derive(Clone, Debug, PartialEq)]
pub struct Path {
    waypoints: Vec<Vec3>,
    revision: u64,
}

impl Path {
    /// `revision` is the [`SpatialHashGrid::revision`] the path was planned against.
    pub fn new(waypoints: Vec<Vec3>, revision: u64) -> Self {
        Self {
            waypoints,
            revision,
        }
    }

    #[inline]
    pub fn waypoints(&self) -> &[Vec3] {
        &self.waypoints
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Planar length of the polyline (meters).
    pub fn length(&self) -> f32 {
        self.waypoints
            .windows(2)
            .map(|w| (to_planar(w[1]) - to_planar(w[0])).norm())
            .sum()
    }

    /// True if obstacles were added, moved or removed since planning.
    #[inline]
    pub fn is_stale(&self, grid: &SpatialHashGrid) -> bool {
        grid.revision() != self.revision
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum PathResult {
    Found(Path),
    Unreachable,
}

impl PathResult {
    #[inline]
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Found(p) => Some(p),
            Self::Unreachable => None,
        }
    }

    pub fn into_path(self) -> Option<Path> {
        match self {
            Self::Found(p) => Some(p),
            Self::Unreachable => None,
        }
    }
}

/// Plans routes for an agent of a fixed radius. Cheap to build; borrows the grid
/// through the detector.
#[derive(Clone, Debug)]
pub struct PathfindingAdapter<'a> {
    detector: CollisionDetector<'a>,
    agent_radius: f32,
    config: PathfindingConfig,
}

#[derive(Clone, Copy, Debug)]
struct OpenNode {
    f: f32,
    g: f32,
    key: CellKey,
}

impl PartialEq for OpenNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenNode {}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenNode {
    // Reversed so `BinaryHeap` pops the lowest f first; ties prefer the deeper node.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| self.g.total_cmp(&other.g))
            .then_with(|| other.key.cmp(&self.key))
    }
}

const NEIGHBOURS: [(i32, i32); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];

impl<'a> PathfindingAdapter<'a> {
    pub fn new(detector: CollisionDetector<'a>, agent_radius: f32) -> Self {
        Self {
            detector,
            agent_radius: agent_radius.max(0.0),
            config: PathfindingConfig::default(),
        }
    }

    pub fn with_config(mut self, config: PathfindingConfig) -> Self {
        self.config = config;
        self
    }

    #[inline]
    pub fn config(&self) -> &PathfindingConfig {
        &self.config
    }

    /// Side length of a navigation cell (meters).
    pub fn nav_cell_size(&self) -> f32 {
        let cell = self.detector.grid().cell_size();
        if self.agent_radius <= 0.0 {
            return cell;
        }
        let div = (cell / self.agent_radius).ceil().clamp(1.0, MAX_SUBDIVISIONS);
        cell / div
    }

    /// True if an agent standing at `p` touches nothing.
    pub fn is_free(&self, p: Vec2) -> bool {
        let grid = self.detector.grid();
        let r = self.detector.effective_radius(self.agent_radius);
        grid.query_region(p, r + QUERY_SKIN)
            .iter()
            .filter_map(|id| grid.get(id))
            .all(|o| o.hitbox.distance_to_point(p) > r)
    }

    pub fn find_path(&self, from: Vec3, to: Vec3) -> PathResult {
        if !is_finite_vec3(&from) || !is_finite_vec3(&to) {
            debug!("path request with non-finite endpoints {from:?} -> {to:?}");
            return PathResult::Unreachable;
        }
        let (a, b) = (to_planar(from), to_planar(to));
        if !self.is_free(b) {
            debug!("path goal ({:.2}, {:.2}) is blocked", b.x, b.y);
            return PathResult::Unreachable;
        }

        let revision = self.detector.grid().revision();
        if self.detector.segment_clear(a, b, self.agent_radius) {
            return PathResult::Found(Path::new(vec![from, to], revision));
        }

        let Some(cells) = self.search(a, b) else {
            return PathResult::Unreachable;
        };

        // Endpoint cell centres stay in as fallbacks for when the exact endpoints
        // cannot see the neighbouring cells.
        let size = self.nav_cell_size();
        let mut points = Vec::with_capacity(cells.len() + 2);
        points.push(a);
        points.extend(cells.iter().map(|&k| cell_center(k, size)));
        points.push(b);
        if self.config.smooth {
            points = self.straighten(&points);
        }

        let last = points.len() - 1;
        let waypoints = points
            .into_iter()
            .enumerate()
            .map(|(i, p)| match i {
                0 => from,
                i if i == last => to,
                _ => Vec3::new(p.x, from.y, p.y),
            })
            .collect();
        PathResult::Found(Path::new(waypoints, revision))
    }

    /// A* from the cell containing `a` to the cell containing `b`. Returns the cell
    /// sequence, both ends included.
    fn search(&self, a: Vec2, b: Vec2) -> Option<Vec<CellKey>> {
        let size = self.nav_cell_size();
        let inv = 1.0 / size;
        let start = encode_cell(a, inv);
        let goal = encode_cell(b, inv);
        let bounds = self.search_bounds(a, b, inv);

        let mut passable: FxHashMap<CellKey, bool> = FxHashMap::default();
        let mut is_passable = |key: CellKey| -> bool {
            if key == start || key == goal {
                return true;
            }
            if !bounds.contains(key) {
                return false;
            }
            *passable
                .entry(key)
                .or_insert_with(|| self.is_free(cell_center(key, size)))
        };

        let h = |key: CellKey| (cell_center(key, size) - cell_center(goal, size)).norm();

        let mut open = BinaryHeap::new();
        let mut g_score: FxHashMap<CellKey, f32> = FxHashMap::default();
        let mut came_from: FxHashMap<CellKey, CellKey> = FxHashMap::default();
        g_score.insert(start, 0.0);
        open.push(OpenNode {
            f: h(start),
            g: 0.0,
            key: start,
        });

        let mut expansions = 0usize;
        while let Some(node) = open.pop() {
            if node.key == goal {
                return Some(reconstruct(&came_from, goal));
            }
            if g_score.get(&node.key).is_some_and(|&g| node.g > g) {
                continue;
            }
            expansions += 1;
            if expansions > self.config.max_expansions {
                debug!(
                    "path search gave up after {} expansions",
                    self.config.max_expansions
                );
                return None;
            }

            for (dc, dr) in NEIGHBOURS {
                let next = node.key.offset(dc, dr);
                if !is_passable(next) {
                    continue;
                }
                // No corner cutting: both orthogonal neighbours must be open.
                if dc != 0
                    && dr != 0
                    && !(is_passable(node.key.offset(dc, 0)) && is_passable(node.key.offset(0, dr)))
                {
                    continue;
                }
                let step = if dc != 0 && dr != 0 {
                    std::f32::consts::SQRT_2
                } else {
                    1.0
                };
                let g = node.g + step * size;
                if g_score.get(&next).is_some_and(|&known| known <= g) {
                    continue;
                }
                g_score.insert(next, g);
                came_from.insert(next, node.key);
                open.push(OpenNode {
                    f: g + h(next),
                    g,
                    key: next,
                });
            }
        }

        debug!(
            "no route from ({:.2}, {:.2}) to ({:.2}, {:.2})",
            a.x, a.y, b.x, b.y
        );
        None
    }

    fn search_bounds(&self, a: Vec2, b: Vec2, inv: f32) -> CellRange {
        let grid = self.detector.grid();
        let ends = Aabb2::from_segment(a, b);
        let area = match grid.stats().extent {
            Some(extent) => extent.union(&ends),
            None => ends,
        };
        let margin = self.config.search_margin_cells.max(1) as f32 * grid.cell_size();
        CellRange::covering(&area.inflate(margin), inv)
    }

    /// Greedy string pulling: from each kept point jump to the farthest point still
    /// in line of sight. With nothing in sight the next point is kept as is.
    fn straighten(&self, points: &[Vec2]) -> Vec<Vec2> {
        let Some(&first) = points.first() else {
            return Vec::new();
        };
        let mut out = vec![first];
        let mut i = 0;
        while i + 1 < points.len() {
            let j = (i + 1..points.len())
                .rev()
                .find(|&j| self.detector.segment_clear(points[i], points[j], self.agent_radius))
                .unwrap_or_else(|| {
                    trace!(
                        "no clear segment from ({:.2}, {:.2})",
                        points[i].x, points[i].y
                    );
                    i + 1
                });
            out.push(points[j]);
            i = j;
        }
        out
    }
}

fn reconstruct(came_from: &FxHashMap<CellKey, CellKey>, goal: CellKey) -> Vec<CellKey> {
    let mut cells = vec![goal];
    let mut cur = goal;
    while let Some(&prev) = came_from.get(&cur) {
        cells.push(prev);
        cur = prev;
    }
    cells.reverse();
    cells
}
