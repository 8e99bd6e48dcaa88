mod cells;
mod csv_out;
mod error;
mod grid;
mod header;
mod model;
mod options;
mod pdf_reader;
mod range;
mod shading;
mod table_detect;
mod table_parse;
mod tolerance;
mod warning;

use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use crate::cells::detect_cells;
use crate::csv_out::{write_csv, write_csv_to_string};
use crate::pdf_reader::{PageContent, PdfSource};
use crate::table_detect::detect_tables;

pub use error::ExtractError;
pub use grid::{GridPlacement, ResolvedGrid, infer_merges};
pub use header::{HeaderSignature, default_header_signatures};
pub use model::{
    BBox, FilledRect, MergeSpan, PageGeometry, TableModel, TextCell, partition_merges,
};
pub use options::{ExtractOptions, PageSelection};
pub use range::{DEFAULT_END_MARKERS, DEFAULT_START_MARKER, PageRange, RangeMarkers, detect_range};
pub use shading::{ShadingBounds, detect_row_shading, is_shaded};
pub use table_parse::is_cjk;
pub use tolerance::Tolerance;
pub use warning::{ExtractWarning, WarningCode as ExtractWarningCode};

use crate::warning::WarningCode;

/// Every page of a document with its text and fills, plus warnings for
/// pages whose geometry could not be read. Such pages keep their text but
/// carry no tables.
///
/// Ruled cells are detected later, and only for the pages a run selects.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageScan {
    pub pages: Vec<PageGeometry>,
    pub warnings: Vec<ExtractWarning>,
    contents: Vec<Option<PageContent>>,
}

impl PageScan {
    #[must_use]
    pub fn from_pages(pages: Vec<PageGeometry>) -> Self {
        Self {
            pages,
            ..Self::default()
        }
    }

    /// Page `index` with its cell quads detected from the stored content.
    /// Pages that already carry cells are returned as they are.
    fn page_with_cells(&self, index: usize, tolerance: &Tolerance) -> PageGeometry {
        let mut page = self.pages[index].clone();
        if page.tables.is_empty()
            && let Some(Some(content)) = self.contents.get(index)
        {
            page.tables = detect_cells(&content.edges, &content.fragments, tolerance);
        }
        page
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionReport {
    pub page_count: usize,
    pub range: PageRange,
    /// 1-based numbers of the pages whose tables were read.
    pub pages_processed: Vec<u32>,
    pub table_count: usize,
    pub discarded_furniture: usize,
    pub warnings: Vec<ExtractWarning>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub tables: Vec<TableModel>,
    pub report: ExtractionReport,
}

fn scan_source(source: &PdfSource) -> PageScan {
    let mut scan = PageScan::default();
    for raw in source.read_pages() {
        let mut page = PageGeometry {
            page_number: raw.page_number,
            text: raw.text,
            ..PageGeometry::default()
        };
        match raw.content {
            Ok(content) => {
                page.filled_rects.clone_from(&content.filled_rects);
                scan.contents.push(Some(content));
            }
            Err(reason) => {
                warn!(page = raw.page_number, %reason, "skipping page geometry");
                scan.warnings.push(
                    ExtractWarning::new(WarningCode::PageGeometryFailed, reason)
                        .with_page(raw.page_number),
                );
                scan.contents.push(None);
            }
        }
        scan.pages.push(page);
    }
    scan
}

/// Reads text, filled rectangles and ruling content for every page.
///
/// # Errors
/// Fails only when the file cannot be loaded as a PDF; per-page failures
/// become warnings.
pub fn read_page_geometry(input_pdf: &Path) -> Result<PageScan, ExtractError> {
    let source = PdfSource::load(input_pdf)?;
    Ok(scan_source(&source))
}

/// In-memory variant of [`read_page_geometry`].
///
/// # Errors
/// Fails only when the bytes cannot be loaded as a PDF.
pub fn read_page_geometry_from_bytes(input_pdf: &[u8]) -> Result<PageScan, ExtractError> {
    let source = PdfSource::load_mem(input_pdf)?;
    Ok(scan_source(&source))
}

/// Marker-based page range over already-read pages.
#[must_use]
pub fn detect_page_range(pages: &[PageGeometry], markers: &RangeMarkers) -> PageRange {
    let texts = pages.iter().map(|page| page.text.as_str()).collect::<Vec<_>>();
    detect_range(&texts, markers)
}

/// Bounds the pages, then turns every ruled table on them into a
/// [`TableModel`]. An explicit page selection replaces the marker range.
///
/// # Errors
/// Returns an error for invalid options or when an explicit page selection
/// matches no page.
pub fn tables_from_pages(
    scan: &PageScan,
    options: &ExtractOptions,
) -> Result<Extraction, ExtractError> {
    options.validate().map_err(ExtractError::InvalidOption)?;

    let mut warnings = scan.warnings.clone();
    let range = detect_page_range(&scan.pages, &options.markers);

    let indices: Vec<usize> = match &options.pages {
        Some(selection) => {
            let selected = scan
                .pages
                .iter()
                .enumerate()
                .filter(|(_, page)| selection.contains(page.page_number))
                .map(|(index, _)| index)
                .collect::<Vec<_>>();
            if selected.is_empty() {
                return Err(ExtractError::NoPagesSelected);
            }
            selected
        }
        None => {
            if !range.start_found {
                warnings.push(ExtractWarning::new(
                    WarningCode::StartMarkerMissing,
                    format!(
                        "start marker '{}' not found; processing from the first page",
                        options.markers.start
                    ),
                ));
            }
            (0..scan.pages.len())
                .filter(|index| range.contains(*index))
                .collect()
        }
    };
    let selected = indices
        .into_iter()
        .map(|index| scan.page_with_cells(index, &options.tolerance))
        .collect::<Vec<_>>();

    info!(
        pages = selected.len(),
        start = range.start,
        end = range.end,
        "detecting tables"
    );
    let detected = detect_tables(&selected, options, &mut warnings);
    if detected.tables.is_empty() {
        warnings.push(ExtractWarning::new(
            WarningCode::NoTablesDetected,
            "no ruled tables were detected in the selected pages",
        ));
    }

    Ok(Extraction {
        report: ExtractionReport {
            page_count: scan.pages.len(),
            range,
            pages_processed: selected.iter().map(|page| page.page_number).collect(),
            table_count: detected.tables.len(),
            discarded_furniture: detected.discarded_furniture,
            warnings,
        },
        tables: detected.tables,
    })
}

/// Reads a PDF and extracts its in-range tables.
///
/// # Errors
/// See [`read_page_geometry`] and [`tables_from_pages`].
pub fn extract_tables(input_pdf: &Path, options: &ExtractOptions) -> Result<Extraction, ExtractError> {
    let scan = read_page_geometry(input_pdf)?;
    tables_from_pages(&scan, options)
}

/// In-memory variant of [`extract_tables`].
///
/// # Errors
/// See [`read_page_geometry_from_bytes`] and [`tables_from_pages`].
pub fn extract_tables_from_bytes(
    input_pdf: &[u8],
    options: &ExtractOptions,
) -> Result<Extraction, ExtractError> {
    let scan = read_page_geometry_from_bytes(input_pdf)?;
    tables_from_pages(&scan, options)
}

/// Writes tables as `page,table_id,row,shaded,col_1..col_n`.
///
/// # Errors
/// Returns an error when the file cannot be written.
pub fn write_tables_csv(
    output_csv: &Path,
    tables: &[TableModel],
    delimiter: u8,
) -> Result<(), ExtractError> {
    write_csv(output_csv, tables, delimiter)
}

/// # Errors
/// Returns an error when CSV serialization fails.
pub fn tables_to_csv_string(tables: &[TableModel], delimiter: u8) -> Result<String, ExtractError> {
    write_csv_to_string(tables, delimiter)
}
