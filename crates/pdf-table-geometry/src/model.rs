use serde::Serialize;
use tracing::warn;

/// Axis-aligned box in top-left page coordinates (y grows downwards).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BBox {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl BBox {
    #[must_use]
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left: left.min(right),
            top: top.min(bottom),
            right: left.max(right),
            bottom: top.max(bottom),
        }
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    #[must_use]
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.left && x <= self.right && y >= self.top && y <= self.bottom
    }
}

/// Filled rectangle painted on a page. `y0` is the top edge, `y1` the bottom.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FilledRect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
    /// Non-stroking colour reduced to a grey level: 0.0 black, 1.0 white.
    pub fill_intensity: f64,
}

/// One detected cell quad with the text that falls inside it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextCell {
    pub bbox: BBox,
    pub text: String,
}

impl TextCell {
    #[must_use]
    pub fn new(bbox: BBox, text: impl Into<String>) -> Self {
        Self {
            bbox,
            text: text.into(),
        }
    }
}

/// Geometry of one page as handed to the table builder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageGeometry {
    /// 1-based page number.
    pub page_number: u32,
    pub text: String,
    pub filled_rects: Vec<FilledRect>,
    /// Cell quads grouped per physical table, in reading order.
    pub tables: Vec<Vec<TextCell>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawTable {
    pub page: u32,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub(crate) fn col_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct MergeSpan {
    pub row: usize,
    pub col: usize,
    pub col_span: usize,
    pub row_span: usize,
}

impl MergeSpan {
    #[must_use]
    pub fn covers(&self, row: usize, col: usize) -> bool {
        (self.row..self.row + self.row_span).contains(&row)
            && (self.col..self.col + self.col_span).contains(&col)
    }

    #[must_use]
    pub fn is_origin(&self, row: usize, col: usize) -> bool {
        self.row == row && self.col == col
    }

    fn overlaps(&self, other: &MergeSpan) -> bool {
        self.row < other.row + other.row_span
            && other.row < self.row + self.row_span
            && self.col < other.col + other.col_span
            && other.col < self.col + self.col_span
    }
}

/// Splits spans into those consistent with a `row_count` x `col_count` grid
/// and those that must be dropped: out of bounds, not actually merged, or
/// overlapping a span accepted earlier.
#[must_use]
pub fn partition_merges(
    merges: &[MergeSpan],
    row_count: usize,
    col_count: usize,
) -> (Vec<MergeSpan>, Vec<MergeSpan>) {
    let mut kept: Vec<MergeSpan> = Vec::new();
    let mut dropped = Vec::new();

    for span in merges {
        let merged = span.col_span > 1 || span.row_span > 1;
        let non_empty = span.col_span >= 1 && span.row_span >= 1;
        let in_bounds = span
            .row
            .checked_add(span.row_span)
            .is_some_and(|end| end <= row_count)
            && span
                .col
                .checked_add(span.col_span)
                .is_some_and(|end| end <= col_count);
        if merged && non_empty && in_bounds && !kept.iter().any(|other| other.overlaps(span)) {
            kept.push(*span);
        } else {
            dropped.push(*span);
        }
    }

    (kept, dropped)
}

/// Canonical table: rows of text, grid width, merge spans and per-row shading.
///
/// Text can be substituted through [`TableModel::with_cell_texts`], which
/// returns a new model with the same shape and merge set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableModel {
    page_number: u32,
    rows: Vec<Vec<String>>,
    col_count: usize,
    merges: Vec<MergeSpan>,
    row_shaded: Vec<bool>,
}

impl TableModel {
    /// Builds a model, padding ragged rows to the widest row and dropping
    /// merges that do not fit the grid.
    #[must_use]
    pub fn new(
        page_number: u32,
        rows: Vec<Vec<String>>,
        merges: &[MergeSpan],
        mut row_shaded: Vec<bool>,
    ) -> Self {
        let col_count = rows.iter().map(Vec::len).max().unwrap_or(0);
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(col_count, String::new());
                row
            })
            .collect::<Vec<_>>();
        row_shaded.resize(rows.len(), false);

        let (merges, dropped) = partition_merges(merges, rows.len(), col_count);
        for span in dropped {
            warn!(page = page_number, ?span, "dropping merge span inconsistent with table grid");
        }

        Self {
            page_number,
            rows,
            col_count,
            merges,
            row_shaded,
        }
    }

    #[must_use]
    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn col_count(&self) -> usize {
        self.col_count
    }

    #[must_use]
    pub fn merges(&self) -> &[MergeSpan] {
        &self.merges
    }

    #[must_use]
    pub fn row_shaded(&self) -> &[bool] {
        &self.row_shaded
    }

    #[must_use]
    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.get(col).map(String::as_str)
    }

    /// True when `(row, col)` is covered by a span without being its origin.
    #[must_use]
    pub fn is_shadow(&self, row: usize, col: usize) -> bool {
        self.merges
            .iter()
            .any(|span| span.covers(row, col) && !span.is_origin(row, col))
    }

    /// Returns a copy with the given cells replaced. Addresses outside the
    /// grid are ignored so the shape never changes.
    #[must_use]
    pub fn with_cell_texts<I>(&self, updates: I) -> Self
    where
        I: IntoIterator<Item = (usize, usize, String)>,
    {
        let mut next = self.clone();
        for (row, col, text) in updates {
            if let Some(cell) = next.rows.get_mut(row).and_then(|cells| cells.get_mut(col)) {
                *cell = text;
            }
        }
        next
    }
}
