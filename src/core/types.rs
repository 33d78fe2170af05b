//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};

/// Unique identifier for squads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SquadId(pub u32);

impl SquadId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }
}

/// Unique identifier for factions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FactionId(pub u32);

impl FactionId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }
}

/// Combat round counter (one AI turn)
pub type Round = i64;

/// Integer grid coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// King-move distance: `max(|dx|, |dy|)`
    #[inline]
    pub fn chebyshev_distance(&self, other: &Self) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }

    /// Taxicab distance: `|dx| + |dy|`
    #[inline]
    pub fn manhattan_distance(&self, other: &Self) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    #[inline]
    pub fn offset(&self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// The 8 surrounding cells, in row-major order
    pub fn neighbors(&self) -> [GridPos; 8] {
        [
            self.offset(-1, -1),
            self.offset(-1, 0),
            self.offset(-1, 1),
            self.offset(0, -1),
            self.offset(0, 1),
            self.offset(1, -1),
            self.offset(1, 0),
            self.offset(1, 1),
        ]
    }
}
