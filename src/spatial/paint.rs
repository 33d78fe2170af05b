//! Radius painting with distance falloff
//!
//! All painting uses Chebyshev distance and skips the emitter's own cell.

use crate::core::types::GridPos;
use crate::spatial::field::SpatialField;

/// Attenuation strategy applied to a painted value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Falloff {
    /// `1 - d / (r + 1)`: strictly positive out to the edge of the radius
    Linear,
    /// Full value everywhere inside the radius
    None,
}

impl Falloff {
    /// Multiplier at distance `d` for radius `r`. Zero outside `1..=r`.
    #[inline]
    pub fn factor(self, distance: i32, radius: i32) -> f64 {
        if distance <= 0 || distance > radius {
            return 0.0;
        }
        match self {
            Falloff::Linear => 1.0 - distance as f64 / (radius as f64 + 1.0),
            Falloff::None => 1.0,
        }
    }
}

/// Largest radius any emitter can paint
pub const MAX_PAINT_RADIUS: i32 = 128;

/// Radius actually painted for a requested one: `0..=MAX_PAINT_RADIUS`
#[inline]
pub fn clamp_radius(radius: i32) -> i32 {
    radius.clamp(0, MAX_PAINT_RADIUS)
}

/// Cells at Chebyshev distance `1..=radius` from `center`, with their distance
pub fn cells_in_radius(center: GridPos, radius: i32) -> impl Iterator<Item = (GridPos, i32)> {
    let radius = clamp_radius(radius);
    (-radius..=radius).flat_map(move |dx| {
        (-radius..=radius).filter_map(move |dy| {
            let pos = center.offset(dx, dy);
            let distance = center.chebyshev_distance(&pos);
            (distance > 0).then_some((pos, distance))
        })
    })
}

/// Add `value * falloff(d, radius)` to every cell in the radius.
///
/// Returns the number of cells touched.
pub fn paint_radius(
    field: &mut SpatialField<f64>,
    center: GridPos,
    radius: i32,
    value: f64,
    falloff: Falloff,
) -> usize {
    let radius = clamp_radius(radius);
    let mut painted = 0;
    for (pos, distance) in cells_in_radius(center, radius) {
        field.add(pos, value * falloff.factor(distance, radius));
        painted += 1;
    }
    painted
}

/// Like [`paint_radius`], also recording each painted cell into `cells`
pub fn paint_radius_tracked(
    field: &mut SpatialField<f64>,
    center: GridPos,
    radius: i32,
    value: f64,
    falloff: Falloff,
    cells: &mut Vec<GridPos>,
) {
    let radius = clamp_radius(radius);
    for (pos, distance) in cells_in_radius(center, radius) {
        field.add(pos, value * falloff.factor(distance, radius));
        cells.push(pos);
    }
}
