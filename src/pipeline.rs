use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

use chrono::Utc;
use pdf_table_geometry::{ExtractOptions, TableModel, extract_tables};
use tracing::{debug, info};

use crate::docx_out::save_docx;
use crate::eligibility::needs_translation;
use crate::engine::TranslationEngine;
use crate::error::PipelineError;
use crate::materialize::materialize;
use crate::models::{DEFAULT_TEMPLATE_TABLE_INDEX, RunReport};
use crate::wordml::WordTableWriter;

/// Position of one cell across all extracted tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellAddress {
    pub table: usize,
    pub row: usize,
    pub col: usize,
}

impl CellAddress {
    /// Key used for the review field set, e.g. `t0:r2:c1`.
    pub fn field_name(&self) -> String {
        self.to_string()
    }
}

impl Display for CellAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "t{}:r{}:c{}", self.table, self.row, self.col)
    }
}

/// Cells worth sending upstream, in table/row/column order. Shadow cells,
/// blank cells and text that is already Chinese are skipped.
pub fn collect_cell_texts(tables: &[TableModel]) -> (Vec<CellAddress>, Vec<String>) {
    let mut addresses = Vec::new();
    let mut texts = Vec::new();
    for (table_index, table) in tables.iter().enumerate() {
        for (row, cells) in table.rows().iter().enumerate() {
            for (col, text) in cells.iter().enumerate() {
                if table.is_shadow(row, col) || text.trim().is_empty() || !needs_translation(text) {
                    continue;
                }
                addresses.push(CellAddress {
                    table: table_index,
                    row,
                    col,
                });
                texts.push(text.clone());
            }
        }
    }
    (addresses, texts)
}

/// Substitutes translated texts by address. Tables keep their shape, merges
/// and shading; unaddressed cells are untouched.
pub fn apply_translations(
    tables: &[TableModel],
    addresses: &[CellAddress],
    texts: &[String],
) -> Vec<TableModel> {
    let mut updates: Vec<Vec<(usize, usize, String)>> = vec![Vec::new(); tables.len()];
    for (address, text) in addresses.iter().zip(texts) {
        if let Some(table_updates) = updates.get_mut(address.table) {
            table_updates.push((address.row, address.col, text.clone()));
        }
    }
    tables
        .iter()
        .zip(updates)
        .map(|(table, table_updates)| table.with_cell_texts(table_updates))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct TranslationOutcome {
    pub tables: Vec<TableModel>,
    pub cells_sent: usize,
    pub cells_changed: usize,
    pub review_fixes: usize,
}

/// Translates every eligible cell of `tables`, then optionally re-sends
/// cells whose result is still untranslated.
pub async fn translate_tables(
    engine: &TranslationEngine,
    tables: &[TableModel],
    final_review: bool,
) -> TranslationOutcome {
    let (addresses, sources) = collect_cell_texts(tables);
    if !engine.is_enabled() || sources.is_empty() {
        return TranslationOutcome {
            tables: tables.to_vec(),
            cells_sent: 0,
            cells_changed: 0,
            review_fixes: 0,
        };
    }

    info!(cells = sources.len(), tables = tables.len(), "translating table cells");
    let mut translated = engine.translate_batch(&sources).await;

    let mut review_fixes = 0;
    if final_review {
        let fields = addresses
            .iter()
            .zip(&translated)
            .map(|(address, text)| (address.field_name(), text.clone()))
            .collect::<BTreeMap<_, _>>();
        let reviewed = engine.final_review(&fields).await;
        for (address, text) in addresses.iter().zip(translated.iter_mut()) {
            if let Some(fixed) = reviewed.get(&address.field_name())
                && fixed != text
            {
                debug!(cell = %address, "final review replaced cell text");
                fixed.clone_into(text);
                review_fixes += 1;
            }
        }
    }

    let cells_changed = sources
        .iter()
        .zip(&translated)
        .filter(|(source, result)| source != result)
        .count();

    TranslationOutcome {
        tables: apply_translations(tables, &addresses, &translated),
        cells_sent: sources.len(),
        cells_changed,
        review_fixes,
    }
}

/// Renders tables into a Word table writer in order.
pub fn render_tables(tables: &[TableModel]) -> WordTableWriter {
    let mut writer = WordTableWriter::new();
    for table in tables {
        materialize(table, &mut writer);
    }
    writer
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    pub template: Option<PathBuf>,
    /// 0-based index of the template table the output follows.
    pub insert_after: usize,
    pub extract: ExtractOptions,
    pub final_review: bool,
}

impl RunOptions {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            template: None,
            insert_after: DEFAULT_TEMPLATE_TABLE_INDEX,
            extract: ExtractOptions::default(),
            final_review: true,
        }
    }
}

/// Extracts, translates and writes one document.
///
/// # Errors
/// Returns extraction and document-writing failures. Translation failures
/// never abort a run; affected cells keep their source text.
pub async fn run(options: &RunOptions, engine: &TranslationEngine) -> Result<RunReport, PipelineError> {
    let extraction = extract_tables(&options.input, &options.extract)?;
    info!(
        input = %options.input.display(),
        tables = extraction.tables.len(),
        "extraction finished"
    );

    let outcome = translate_tables(engine, &extraction.tables, options.final_review).await;
    let writer = render_tables(&outcome.tables);
    save_docx(
        &options.output,
        &writer,
        options.template.as_deref(),
        options.insert_after,
    )?;

    let report = extraction.report;
    Ok(RunReport {
        input: options.input.display().to_string(),
        output: options.output.display().to_string(),
        range: report.range,
        pages_processed: report.pages_processed,
        table_count: report.table_count,
        discarded_furniture: report.discarded_furniture,
        cells_sent: outcome.cells_sent,
        cells_changed: outcome.cells_changed,
        review_fixes: outcome.review_fixes,
        translation_enabled: engine.is_enabled(),
        warnings: report.warnings,
        finished_at: Utc::now(),
    })
}
