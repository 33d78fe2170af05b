//! Map bounds for per-cell passes

use serde::{Deserialize, Serialize};

use crate::core::types::GridPos;

/// Playable rectangle `[0, width) x [0, height)`
///
/// Radius painting is not clipped to these bounds; they only define which
/// cells the whole-map passes (isolation, pressure, retreat) visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridBounds {
    pub width: i32,
    pub height: i32,
}

impl GridBounds {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width: width.max(0),
            height: height.max(0),
        }
    }

    #[inline]
    pub fn contains(&self, pos: GridPos) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }

    pub fn area(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Linearized `y * width + x` index, if in bounds
    #[inline]
    pub fn index_of(&self, pos: GridPos) -> Option<usize> {
        if self.contains(pos) {
            Some(pos.y as usize * self.width as usize + pos.x as usize)
        } else {
            None
        }
    }

    /// Every cell in row-major order
    pub fn cells(&self) -> impl Iterator<Item = GridPos> + '_ {
        let width = self.width;
        (0..self.height).flat_map(move |y| (0..width).map(move |x| GridPos::new(x, y)))
    }
}
