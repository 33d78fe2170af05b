//! Spatial primitives: map bounds, sparse scalar fields, radius painting

pub mod field;
pub mod grid;
pub mod paint;

pub use field::SpatialField;
pub use grid::GridBounds;
pub use paint::{cells_in_radius, clamp_radius, paint_radius, paint_radius_tracked, Falloff, MAX_PAINT_RADIUS};
