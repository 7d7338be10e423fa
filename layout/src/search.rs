//! Expanding-ring search for free cells.

use iso_garden_core::GridCoord;

/// Finds the first cell accepted by `is_free`, scanning outward from `center`.
///
/// The centre is checked first, followed by the Chebyshev rings of radius
/// `1..=max_radius`. Within a ring, columns run from `-r` to `r` and rows from
/// `-r` to `r`, skipping interior cells. At most `(2R + 1)^2` cells are
/// inspected.
pub(crate) fn nearest_free(
    center: GridCoord,
    max_radius: u32,
    is_free: impl Fn(GridCoord) -> bool,
) -> Option<GridCoord> {
    if is_free(center) {
        return Some(center);
    }
    let max_radius = i32::try_from(max_radius).unwrap_or(i32::MAX);
    for radius in 1..=max_radius {
        for dx in -radius..=radius {
            for dy in -radius..=radius {
                if dx.abs() != radius && dy.abs() != radius {
                    continue;
                }
                let cell = center.offset(dx, dy);
                if is_free(cell) {
                    return Some(cell);
                }
            }
        }
    }
    None
}
