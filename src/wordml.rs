use std::fmt::Write as _;

use quick_xml::escape::escape;

use crate::materialize::{CellMerge, TableSink, VerticalMerge};
use crate::models::{SHADING_FILL, TABLE_EAST_ASIA_FONT, TABLE_FONT_HALF_POINTS, TABLE_WIDTH_TWIPS};

pub const PAGE_BREAK_PARAGRAPH: &str = r#"<w:p><w:r><w:br w:type="page"/></w:r></w:p>"#;
pub const EMPTY_PARAGRAPH: &str = "<w:p/>";

const BORDER_EDGES: [&str; 6] = ["top", "left", "bottom", "right", "insideH", "insideV"];

#[derive(Debug, Clone, Default, PartialEq)]
struct CellState {
    text: String,
    shaded: bool,
    merge: CellMerge,
}

#[derive(Debug, Clone, PartialEq)]
struct TableGrid {
    cols: usize,
    cells: Vec<Vec<CellState>>,
}

impl TableGrid {
    fn cell_mut(&mut self, row: usize, col: usize) -> Option<&mut CellState> {
        self.cells.get_mut(row)?.get_mut(col)
    }
}

/// Collects tables through [`TableSink`] and renders them as
/// WordprocessingML `w:tbl` elements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WordTableWriter {
    tables: Vec<TableGrid>,
}

impl TableSink for WordTableWriter {
    fn create_table(&mut self, rows: usize, cols: usize) {
        self.tables.push(TableGrid {
            cols,
            cells: vec![vec![CellState::default(); cols]; rows],
        });
    }

    fn set_cell_text(&mut self, row: usize, col: usize, text: &str) {
        if let Some(cell) = self.current().and_then(|table| table.cell_mut(row, col)) {
            text.clone_into(&mut cell.text);
        }
    }

    fn shade_row(&mut self, row: usize) {
        if let Some(cells) = self.current().and_then(|table| table.cells.get_mut(row)) {
            for cell in cells {
                cell.shaded = true;
            }
        }
    }

    fn set_merge(&mut self, row: usize, col: usize, merge: CellMerge) {
        if let Some(cell) = self.current().and_then(|table| table.cell_mut(row, col)) {
            cell.merge = merge;
        }
    }
}

fn column_width(cols: usize) -> u32 {
    u32::try_from(cols.max(1))
        .map(|cols| TABLE_WIDTH_TWIPS / cols)
        .unwrap_or(TABLE_WIDTH_TWIPS)
}

fn render_paragraphs(out: &mut String, text: &str) {
    if text.is_empty() {
        out.push_str(EMPTY_PARAGRAPH);
        return;
    }
    for line in text.split('\n') {
        let _ = write!(
            out,
            r#"<w:p><w:r><w:rPr><w:rFonts w:eastAsia="{TABLE_EAST_ASIA_FONT}"/><w:sz w:val="{TABLE_FONT_HALF_POINTS}"/><w:szCs w:val="{TABLE_FONT_HALF_POINTS}"/></w:rPr><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
            escape(line)
        );
    }
}

fn render_table(table: &TableGrid) -> String {
    let width = column_width(table.cols);
    let mut out = String::from("<w:tbl><w:tblPr><w:tblW w:w=\"0\" w:type=\"auto\"/><w:tblBorders>");
    for edge in BORDER_EDGES {
        let _ = write!(
            out,
            r#"<w:{edge} w:val="single" w:sz="4" w:space="0" w:color="000000"/>"#
        );
    }
    out.push_str("</w:tblBorders><w:tblLayout w:type=\"fixed\"/></w:tblPr><w:tblGrid>");
    for _ in 0..table.cols {
        let _ = write!(out, r#"<w:gridCol w:w="{width}"/>"#);
    }
    out.push_str("</w:tblGrid>");

    for row in &table.cells {
        out.push_str("<w:tr>");
        let mut col = 0;
        while col < row.len() {
            let cell = &row[col];
            let span = cell.merge.grid_span.unwrap_or(1).clamp(1, row.len() - col);
            let span_width = width * u32::try_from(span).unwrap_or(1);

            out.push_str("<w:tc><w:tcPr>");
            let _ = write!(out, r#"<w:tcW w:w="{span_width}" w:type="dxa"/>"#);
            if span > 1 {
                let _ = write!(out, r#"<w:gridSpan w:val="{span}"/>"#);
            }
            match cell.merge.v_merge {
                Some(VerticalMerge::Restart) => out.push_str(r#"<w:vMerge w:val="restart"/>"#),
                Some(VerticalMerge::Continue) => out.push_str("<w:vMerge/>"),
                None => {}
            }
            if cell.shaded {
                let _ = write!(out, r#"<w:shd w:val="clear" w:color="auto" w:fill="{SHADING_FILL}"/>"#);
            }
            out.push_str("</w:tcPr>");
            render_paragraphs(&mut out, &cell.text);
            out.push_str("</w:tc>");

            // Columns covered by the span are not emitted.
            col += span;
        }
        out.push_str("</w:tr>");
    }

    out.push_str("</w:tbl>");
    out
}

impl WordTableWriter {
    pub fn new() -> Self {
        Self::default()
    }

    fn current(&mut self) -> Option<&mut TableGrid> {
        self.tables.last_mut()
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// One `w:tbl` element per collected table.
    pub fn render_tables(&self) -> Vec<String> {
        self.tables.iter().map(render_table).collect()
    }

    /// All tables, each followed by an empty paragraph so adjacent tables
    /// stay separate.
    pub fn render_body(&self) -> String {
        let mut body = String::new();
        for table in self.render_tables() {
            body.push_str(&table);
            body.push_str(EMPTY_PARAGRAPH);
        }
        body
    }
}
