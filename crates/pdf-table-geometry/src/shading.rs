use crate::grid::ResolvedGrid;
use crate::model::{BBox, FilledRect};
use crate::tolerance::Tolerance;

/// Open interval of fill intensities that count as row shading. The
/// defaults skip pure black rule fills and the white page background.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadingBounds {
    pub lower: f64,
    pub upper: f64,
}

impl Default for ShadingBounds {
    fn default() -> Self {
        Self {
            lower: 0.7,
            upper: 1.0,
        }
    }
}

impl ShadingBounds {
    #[must_use]
    pub fn admits(&self, intensity: f64) -> bool {
        self.lower < intensity && intensity < self.upper
    }
}

fn rect_contains(rect: &FilledRect, cell: &BBox, slack: f64) -> bool {
    rect.x0 <= cell.left + slack
        && rect.x1 >= cell.right - slack
        && rect.y0 <= cell.top + slack
        && rect.y1 >= cell.bottom - slack
}

/// True when any admissible filled rectangle contains `cell` within the
/// shading tolerance.
#[must_use]
pub fn is_shaded(
    cell: &BBox,
    rects: &[FilledRect],
    bounds: &ShadingBounds,
    tolerance: &Tolerance,
) -> bool {
    rects
        .iter()
        .filter(|rect| bounds.admits(rect.fill_intensity))
        .any(|rect| rect_contains(rect, cell, tolerance.shading))
}

/// One flag per grid row, decided by the cell covering column 0 of that row.
/// Rows without a leading cell are reported unshaded.
#[must_use]
pub fn detect_row_shading(
    cells: &[BBox],
    grid: &ResolvedGrid,
    rects: &[FilledRect],
    bounds: &ShadingBounds,
    tolerance: &Tolerance,
) -> Vec<bool> {
    let placed = cells
        .iter()
        .filter_map(|cell| grid.place(cell).map(|placement| (placement, cell)))
        .collect::<Vec<_>>();

    (0..grid.row_count())
        .map(|row| {
            placed
                .iter()
                .find(|(placement, _)| placement.covers(row, 0))
                .is_some_and(|(_, cell)| is_shaded(cell, rects, bounds, tolerance))
        })
        .collect()
}
