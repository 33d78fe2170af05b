//! Sparse accumulative position -> value map

use ahash::AHashMap;
use std::ops::AddAssign;

use crate::core::types::GridPos;

/// Sparse scalar field keyed by grid position.
///
/// Absent cells read as `T::default()`. Writes accumulate, so several
/// emitters painting the same cell sum up. `clear` keeps the allocation so a
/// layer can repaint every round without reallocating.
#[derive(Debug, Clone, Default)]
pub struct SpatialField<T> {
    cells: AHashMap<GridPos, T>,
}

impl<T: Copy + Default + AddAssign> SpatialField<T> {
    pub fn new() -> Self {
        Self {
            cells: AHashMap::new(),
        }
    }

    #[inline]
    pub fn get(&self, pos: GridPos) -> T {
        self.cells.get(&pos).copied().unwrap_or_default()
    }

    #[inline]
    pub fn add(&mut self, pos: GridPos, value: T) {
        *self.cells.entry(pos).or_default() += value;
    }

    #[inline]
    pub fn set(&mut self, pos: GridPos, value: T) {
        self.cells.insert(pos, value);
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    /// Number of cells that have been written this round
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (GridPos, T)> + '_ {
        self.cells.iter().map(|(pos, value)| (*pos, *value))
    }
}

/// Float fields compare approximately when checking recompute stability
impl SpatialField<f64> {
    pub fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        self.cells.len() == other.cells.len()
            && self
                .cells
                .iter()
                .all(|(pos, v)| other.cells.get(pos).is_some_and(|o| (v - o).abs() <= epsilon))
    }
}
