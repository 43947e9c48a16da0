//! Cell grid encoding helpers.
//!
//! This module centralizes the "cell key" scheme shared by the spatial hash grid and
//! the pathfinding layer so it's easy to reason about and to test.
//!
//! # Model
//! - A [`CellKey`] is an unbounded integer pair `(col, row)`; the grid is sparse, so
//!   there is no world offset and no clamping.
//! - World units are meters. `col` follows world X, `row` follows world Z.
//!
//! # Encoding
//! - `col = floor(x / cell_size)`
//! - `row = floor(z / cell_size)`
//!
//! Cell `(col, row)` covers `[col * cell_size, (col + 1) * cell_size)` on X, and the
//! same on Z.

use crate::collision::types::{Aabb2, Vec2};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellKey {
    pub col: i32,
    pub row: i32,
}

impl CellKey {
    #[inline]
    pub const fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    /// Neighbouring key; saturates at the edge of the `i32` range.
    #[inline]
    pub fn offset(self, d_col: i32, d_row: i32) -> Self {
        Self::new(
            self.col.saturating_add(d_col),
            self.row.saturating_add(d_row),
        )
    }
}

/// Encodes world position (x, z) into a [`CellKey`].
#[inline]
pub fn encode_cell(p: Vec2, inv_cell_size: f32) -> CellKey {
    CellKey::new(
        floor_to_i32(p.x * inv_cell_size),
        floor_to_i32(p.y * inv_cell_size),
    )
}

/// Decodes a [`CellKey`] into the world position of the cell's minimum corner.
#[inline]
pub fn cell_min_corner(key: CellKey, cell_size: f32) -> Vec2 {
    Vec2::new(key.col as f32 * cell_size, key.row as f32 * cell_size)
}

/// World position of the cell's centre.
#[inline]
pub fn cell_center(key: CellKey, cell_size: f32) -> Vec2 {
    cell_min_corner(key, cell_size).add_scalar(cell_size * 0.5)
}

/// Inclusive range of cells overlapped by `aabb`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellRange {
    pub min: CellKey,
    pub max: CellKey,
}

impl CellRange {
    pub fn covering(aabb: &Aabb2, inv_cell_size: f32) -> Self {
        Self {
            min: encode_cell(aabb.min, inv_cell_size),
            max: encode_cell(aabb.max, inv_cell_size),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        let cols = (self.max.col as i64 - self.min.col as i64 + 1).max(0) as usize;
        let rows = (self.max.row as i64 - self.min.row as i64 + 1).max(0) as usize;
        cols.saturating_mul(rows)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn contains(&self, key: CellKey) -> bool {
        key.col >= self.min.col
            && key.col <= self.max.col
            && key.row >= self.min.row
            && key.row <= self.max.row
    }

    /// Iterate keys in column-major order.
    pub fn iter(&self) -> impl Iterator<Item = CellKey> + use<> {
        let (min, max) = (self.min, self.max);
        (min.col..=max.col)
            .flat_map(move |col| (min.row..=max.row).map(move |row| CellKey::new(col, row)))
    }
}

/// `floor` into `i32`, saturating far-away (or non-finite) coordinates instead of
/// wrapping.
#[inline]
fn floor_to_i32(v: f32) -> i32 {
    // `as` saturates for out-of-range floats and maps NaN to 0.
    v.floor() as i32
}
