use tracing::debug;

use crate::grid::{ResolvedGrid, infer_merges};
use crate::header::is_page_furniture;
use crate::model::{BBox, PageGeometry, RawTable, TableModel, TextCell, partition_merges};
use crate::options::ExtractOptions;
use crate::shading::detect_row_shading;
use crate::warning::{ExtractWarning, WarningCode};

/// Tables kept from a run of pages plus how many were dropped as furniture.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct DetectedTables {
    pub tables: Vec<TableModel>,
    pub discarded_furniture: usize,
}

/// Lays the cell texts out on the resolved grid. Each cell's text lands at
/// its origin; later cells never overwrite text already placed.
fn raw_table(page: u32, cells: &[TextCell], grid: &ResolvedGrid) -> RawTable {
    let mut rows = vec![vec![String::new(); grid.col_count()]; grid.row_count()];
    for cell in cells {
        let Some(placement) = grid.place(&cell.bbox) else {
            continue;
        };
        let slot = &mut rows[placement.row][placement.col];
        if slot.is_empty() {
            slot.clone_from(&cell.text);
        }
    }
    RawTable { page, rows }
}

fn build_table(
    page: &PageGeometry,
    cells: &[TextCell],
    table_id: usize,
    options: &ExtractOptions,
    warnings: &mut Vec<ExtractWarning>,
) -> Option<Result<TableModel, RawTable>> {
    let bboxes = cells.iter().map(|cell| cell.bbox).collect::<Vec<BBox>>();
    let Some(grid) = ResolvedGrid::resolve(&bboxes, &options.tolerance) else {
        warnings.push(
            ExtractWarning::new(
                WarningCode::DegenerateGrid,
                "table has fewer than two distinct row or column edges",
            )
            .with_page(page.page_number)
            .with_table_id(table_id),
        );
        return None;
    };

    let raw = raw_table(page.page_number, cells, &grid);
    if is_page_furniture(&raw.rows, &options.header_signatures, options.furniture_max_rows) {
        return Some(Err(raw));
    }

    let (merges, dropped) = partition_merges(
        &infer_merges(&bboxes, &options.tolerance),
        grid.row_count(),
        raw.col_count(),
    );
    for span in dropped {
        warnings.push(
            ExtractWarning::new(
                WarningCode::MergeDropped,
                format!(
                    "dropped {}x{} merge at row {} col {}",
                    span.col_span, span.row_span, span.row, span.col
                ),
            )
            .with_page(page.page_number)
            .with_table_id(table_id),
        );
    }

    let row_shaded = detect_row_shading(
        &bboxes,
        &grid,
        &page.filled_rects,
        &options.shading,
        &options.tolerance,
    );

    Some(Ok(TableModel::new(
        raw.page,
        raw.rows,
        &merges,
        row_shaded,
    )))
}

/// Builds table models for every ruled table on the given pages, numbering
/// tables across the whole run starting at 1.
pub(crate) fn detect_tables(
    pages: &[PageGeometry],
    options: &ExtractOptions,
    warnings: &mut Vec<ExtractWarning>,
) -> DetectedTables {
    let mut detected = DetectedTables::default();
    let mut table_id = 0_usize;

    for page in pages {
        for cells in &page.tables {
            table_id += 1;
            match build_table(page, cells, table_id, options, warnings) {
                Some(Ok(model)) => {
                    debug!(
                        page = page.page_number,
                        table_id,
                        rows = model.row_count(),
                        cols = model.col_count(),
                        merges = model.merges().len(),
                        "built table model"
                    );
                    detected.tables.push(model);
                }
                Some(Err(furniture)) => {
                    detected.discarded_furniture += 1;
                    warnings.push(
                        ExtractWarning::new(
                            WarningCode::PageFurnitureDiscarded,
                            format!(
                                "discarded {}-row header table",
                                furniture.rows.len()
                            ),
                        )
                        .with_page(furniture.page)
                        .with_table_id(table_id),
                    );
                }
                None => {}
            }
        }
    }

    detected
}
