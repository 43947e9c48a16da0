use std::collections::BTreeSet;

use rustc_hash::FxHashMap;

use crate::{
    cell::{CellKey, CellRange, cell_min_corner},
    collision::{
        settings::MAX_CELLS_PER_OBSTACLE,
        types::{Aabb2, Obstacle, ObstacleId, ObstacleKind, Vec2},
    },
    error::{NavError, Result},
    hitbox::Hitbox,
};

/// Broad-phase index over the scene's obstacles.
///
/// Notes:
/// - Each obstacle id is stored in the bucket of every cell its AABB overlaps, so a
///   region query only has to visit the cells overlapped by the query itself.
/// - Order within a bucket is insertion order and carries no meaning.
/// - The grid owns the obstacles; the narrow phase reads hitboxes back through [`get`].
/// - Mutations take `&mut self` and queries take `&self`, so a query can never observe a
///   half-applied update.
///
/// [`get`]: SpatialHashGrid::get
#[derive(Debug)]
pub struct SpatialHashGrid {
    cell_size: f32,
    inv_cell_size: f32,
    cells: FxHashMap<CellKey, Vec<ObstacleId>>,
    entries: FxHashMap<ObstacleId, Entry>,
    /// Bumped on every structural change; paths remember the revision they were built at.
    revision: u64,
}

#[derive(Debug)]
struct Entry {
    obstacle: Obstacle,
    cells: CellRange,
}

/// Diagnostic snapshot for overlays and logs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridStats {
    pub cell_size: f32,
    /// World-space bounds of all occupied cells, `None` for an empty grid.
    pub extent: Option<Aabb2>,
    /// Number of non-empty buckets.
    pub cell_count: usize,
    pub obstacle_count: usize,
}

impl SpatialHashGrid {
    pub fn new(cell_size: f32) -> Result<Self> {
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(NavError::InvalidCellSize(cell_size));
        }
        Ok(Self {
            cell_size,
            inv_cell_size: 1.0 / cell_size,
            cells: FxHashMap::default(),
            entries: FxHashMap::default(),
            revision: 0,
        })
    }

    #[inline]
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn get(&self, id: &ObstacleId) -> Option<&Obstacle> {
        self.entries.get(id).map(|e| &e.obstacle)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Obstacle> {
        self.entries.values().map(|e| &e.obstacle)
    }

    /// Register an obstacle in every cell its AABB overlaps.
    pub fn insert(&mut self, mut obstacle: Obstacle) -> Result<()> {
        if self.entries.contains_key(&obstacle.id) {
            return Err(NavError::DuplicateObstacle(obstacle.id));
        }
        obstacle.hitbox = obstacle.hitbox.validated()?;
        let cells = self.cells_for(&obstacle.hitbox)?;

        self.link(&obstacle.id, cells);
        self.entries
            .insert(obstacle.id.clone(), Entry { obstacle, cells });
        self.revision += 1;
        Ok(())
    }

    /// Replace a dynamic obstacle's hitbox and re-bucket it.
    ///
    /// Everything that can fail is checked before the grid is touched, so on error
    /// the previous placement is kept intact.
    pub fn update(&mut self, id: &ObstacleId, hitbox: Hitbox) -> Result<()> {
        let Some(entry) = self.entries.get(id) else {
            return Err(NavError::UnknownObstacle(id.clone()));
        };
        if entry.obstacle.kind == ObstacleKind::Static {
            return Err(NavError::ImmovableObstacle(id.clone()));
        }
        let hitbox = hitbox.validated()?;
        let new_cells = self.cells_for(&hitbox)?;
        let old_cells = entry.cells;

        if new_cells != old_cells {
            self.unlink(id, old_cells);
            self.link(id, new_cells);
        }
        if let Some(entry) = self.entries.get_mut(id) {
            entry.obstacle.hitbox = hitbox;
            entry.cells = new_cells;
        }
        self.revision += 1;
        Ok(())
    }

    /// Move a dynamic obstacle without changing its shape.
    pub fn move_to(&mut self, id: &ObstacleId, center: Vec2) -> Result<()> {
        let hitbox = self
            .get(id)
            .map(|o| o.hitbox.with_center(center))
            .ok_or_else(|| NavError::UnknownObstacle(id.clone()))?;
        self.update(id, hitbox)
    }

    /// Remove an obstacle from every bucket that references it.
    pub fn remove(&mut self, id: &ObstacleId) -> Option<Obstacle> {
        let entry = self.entries.remove(id)?;
        self.unlink(id, entry.cells);
        self.revision += 1;
        Some(entry.obstacle)
    }

    /// Drop every obstacle (world unload).
    pub fn clear(&mut self) {
        self.cells.clear();
        self.entries.clear();
        self.revision += 1;
    }

    /// Ids of all obstacles whose cells overlap the query circle's AABB.
    ///
    /// May over-report (cell granularity); never under-reports.
    pub fn query_region(&self, center: Vec2, radius: f32) -> BTreeSet<ObstacleId> {
        self.query_aabb(&Aabb2::from_circle(center, radius.max(0.0)))
    }

    /// Ids of all obstacles whose cells overlap the segment's AABB grown by `margin`.
    pub fn query_segment(&self, a: Vec2, b: Vec2, margin: f32) -> BTreeSet<ObstacleId> {
        self.query_aabb(&Aabb2::from_segment(a, b).inflate(margin.max(0.0)))
    }

    pub fn query_aabb(&self, aabb: &Aabb2) -> BTreeSet<ObstacleId> {
        let mut out = BTreeSet::new();
        if !(aabb.min.x.is_finite()
            && aabb.min.y.is_finite()
            && aabb.max.x.is_finite()
            && aabb.max.y.is_finite())
        {
            return out;
        }

        let range = CellRange::covering(aabb, self.inv_cell_size);
        if range.len() > self.cells.len() {
            // Huge query relative to the populated grid: scanning buckets is cheaper.
            for (key, bucket) in &self.cells {
                if range.contains(*key) {
                    out.extend(bucket.iter().cloned());
                }
            }
        } else {
            for key in range.iter() {
                if let Some(bucket) = self.cells.get(&key) {
                    out.extend(bucket.iter().cloned());
                }
            }
        }
        out
    }

    pub fn stats(&self) -> GridStats {
        let extent = self
            .entries
            .values()
            .map(|e| {
                Aabb2::new(
                    cell_min_corner(e.cells.min, self.cell_size),
                    cell_min_corner(e.cells.max.offset(1, 1), self.cell_size),
                )
            })
            .reduce(|a, b| a.union(&b));

        GridStats {
            cell_size: self.cell_size,
            extent,
            cell_count: self.cells.len(),
            obstacle_count: self.entries.len(),
        }
    }

    fn cells_for(&self, hitbox: &Hitbox) -> Result<CellRange> {
        let range = CellRange::covering(&hitbox.aabb(), self.inv_cell_size);
        if range.len() > MAX_CELLS_PER_OBSTACLE {
            return Err(NavError::DegenerateHitbox(
                "hitbox spans too many grid cells for the configured cell size",
            ));
        }
        Ok(range)
    }

    fn link(&mut self, id: &ObstacleId, range: CellRange) {
        for key in range.iter() {
            self.cells.entry(key).or_default().push(id.clone());
        }
    }

    fn unlink(&mut self, id: &ObstacleId, range: CellRange) {
        for key in range.iter() {
            if let Some(bucket) = self.cells.get_mut(&key) {
                bucket.retain(|other| other != id);
                if bucket.is_empty() {
                    self.cells.remove(&key);
                }
            }
        }
    }
}
