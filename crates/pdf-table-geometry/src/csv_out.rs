use std::io::Write;
use std::path::Path;

use csv::WriterBuilder;

use crate::error::ExtractError;
use crate::model::TableModel;

fn headers(col_count: usize) -> Vec<String> {
    let mut headers = vec![
        "page".to_string(),
        "table_id".to_string(),
        "row".to_string(),
        "shaded".to_string(),
    ];
    headers.extend((1..=col_count).map(|index| format!("col_{index}")));
    headers
}

fn write_tables<W: Write>(
    writer: &mut csv::Writer<W>,
    tables: &[TableModel],
) -> Result<(), ExtractError> {
    let col_count = tables.iter().map(TableModel::col_count).max().unwrap_or(0);
    writer.write_record(headers(col_count))?;

    for (index, table) in tables.iter().enumerate() {
        for (row_index, row) in table.rows().iter().enumerate() {
            let mut record = vec![
                table.page_number().to_string(),
                (index + 1).to_string(),
                (row_index + 1).to_string(),
                table
                    .row_shaded()
                    .get(row_index)
                    .copied()
                    .unwrap_or(false)
                    .to_string(),
            ];
            record.extend(row.iter().cloned());
            record.resize(4 + col_count, String::new());
            writer.write_record(&record)?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Flattens tables into one CSV, one record per table row. Narrower tables
/// are padded to the widest table's column count.
pub(crate) fn write_csv(
    path: &Path,
    tables: &[TableModel],
    delimiter: u8,
) -> Result<(), ExtractError> {
    let mut writer = WriterBuilder::new().delimiter(delimiter).from_path(path)?;
    write_tables(&mut writer, tables)
}

pub(crate) fn write_csv_to_string(
    tables: &[TableModel],
    delimiter: u8,
) -> Result<String, ExtractError> {
    let mut writer = WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::<u8>::new());
    write_tables(&mut writer, tables)?;

    let bytes = writer
        .into_inner()
        .map_err(|error| ExtractError::Csv(error.into_error().into()))?;
    String::from_utf8(bytes)
        .map_err(|error| ExtractError::InvalidOption(format!("invalid utf-8 csv output: {error}")))
}
