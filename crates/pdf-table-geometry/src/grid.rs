use std::collections::BTreeSet;

use crate::model::{BBox, MergeSpan};
use crate::tolerance::Tolerance;

/// Address of a cell on the resolved grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridPlacement {
    pub row: usize,
    pub col: usize,
    pub row_span: usize,
    pub col_span: usize,
}

impl GridPlacement {
    #[must_use]
    pub fn is_merged(&self) -> bool {
        self.row_span > 1 || self.col_span > 1
    }

    #[must_use]
    pub fn covers(&self, row: usize, col: usize) -> bool {
        (self.row..self.row + self.row_span).contains(&row)
            && (self.col..self.col + self.col_span).contains(&col)
    }
}

/// Sorted, quantised edge indices for one table.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedGrid {
    col_edges: Vec<i64>,
    row_edges: Vec<i64>,
    tolerance: Tolerance,
}

impl ResolvedGrid {
    /// Collapses every cell's left/right and top/bottom coordinates into the
    /// column and row edge indices. Returns `None` when either axis has fewer
    /// than two distinct edges.
    #[must_use]
    pub fn resolve(cells: &[BBox], tolerance: &Tolerance) -> Option<Self> {
        let mut col_edges = BTreeSet::new();
        let mut row_edges = BTreeSet::new();
        for cell in cells {
            col_edges.insert(tolerance.quantize(cell.left));
            col_edges.insert(tolerance.quantize(cell.right));
            row_edges.insert(tolerance.quantize(cell.top));
            row_edges.insert(tolerance.quantize(cell.bottom));
        }

        if col_edges.len() < 2 || row_edges.len() < 2 {
            return None;
        }

        Some(Self {
            col_edges: col_edges.into_iter().collect(),
            row_edges: row_edges.into_iter().collect(),
            tolerance: *tolerance,
        })
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.row_edges.len() - 1
    }

    #[must_use]
    pub fn col_count(&self) -> usize {
        self.col_edges.len() - 1
    }

    /// Places a cell on the grid by the index of its top-left edges; spans
    /// are the index distance to the bottom-right edges.
    #[must_use]
    pub fn place(&self, cell: &BBox) -> Option<GridPlacement> {
        let index = |edges: &[i64], value: f64| {
            edges.binary_search(&self.tolerance.quantize(value)).ok()
        };

        let col = index(&self.col_edges, cell.left)?;
        let end_col = index(&self.col_edges, cell.right)?;
        let row = index(&self.row_edges, cell.top)?;
        let end_row = index(&self.row_edges, cell.bottom)?;
        if end_col <= col || end_row <= row {
            return None;
        }

        Some(GridPlacement {
            row,
            col,
            row_span: end_row - row,
            col_span: end_col - col,
        })
    }
}

/// Computes the merge spans of a table from its cell quads. Only cells
/// spanning more than one grid row or column are reported.
#[must_use]
pub fn infer_merges(cells: &[BBox], tolerance: &Tolerance) -> Vec<MergeSpan> {
    let Some(grid) = ResolvedGrid::resolve(cells, tolerance) else {
        return Vec::new();
    };

    cells
        .iter()
        .filter_map(|cell| grid.place(cell))
        .filter(GridPlacement::is_merged)
        .map(|placement| MergeSpan {
            row: placement.row,
            col: placement.col,
            col_span: placement.col_span,
            row_span: placement.row_span,
        })
        .collect()
}
