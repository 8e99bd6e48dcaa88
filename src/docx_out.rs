use std::fs::File;
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::{debug, info, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::PipelineError;
use crate::wordml::{PAGE_BREAK_PARAGRAPH, WordTableWriter};

pub const DOCUMENT_PART: &str = "word/document.xml";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

// A4 with 2 cm margins.
const SECTION_PROPERTIES: &str = r#"<w:sectPr><w:pgSz w:w="11906" w:h="16838"/><w:pgMar w:top="1134" w:right="1134" w:bottom="1134" w:left="1134" w:header="708" w:footer="708" w:gutter="0"/></w:sectPr>"#;

/// Where generated tables were placed inside a template body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertionPoint {
    /// After the top-level table with this 0-based index.
    AfterTable(usize),
    BeforeSectionProperties,
    BeforeBodyEnd,
}

fn deflated() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
}

/// Complete `word/document.xml` for a package without a template.
pub fn minimal_document(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}{SECTION_PROPERTIES}</w:body></w:document>"#
    )
}

/// Writes a minimal three-part package holding `body`.
///
/// # Errors
/// Returns zip or I/O failures from the underlying writer.
pub fn write_minimal_package<W: Write + Seek>(out: W, body: &str) -> Result<W, PipelineError> {
    let mut zip = ZipWriter::new(out);
    for (name, content) in [
        ("[Content_Types].xml", CONTENT_TYPES.to_string()),
        ("_rels/.rels", PACKAGE_RELS.to_string()),
        (DOCUMENT_PART, minimal_document(body)),
    ] {
        zip.start_file(name, deflated())?;
        zip.write_all(content.as_bytes())?;
    }
    Ok(zip.finish()?)
}

/// Byte offset in `document_xml` where tables are spliced in.
///
/// The offset follows the closing tag of the `insert_after`-th top-level
/// body table. With fewer tables it falls before the body's final
/// `w:sectPr`, or before `</w:body>` when there is none.
///
/// # Errors
/// Returns [`PipelineError::Xml`] for malformed markup and
/// [`PipelineError::Template`] when the document has no body.
pub fn find_insertion_point(
    document_xml: &str,
    insert_after: usize,
) -> Result<(usize, InsertionPoint), PipelineError> {
    let mut reader = Reader::from_str(document_xml);
    let mut depth = 0usize;
    let mut body_depth: Option<usize> = None;
    let mut tables_seen = 0usize;
    let mut section_start: Option<usize> = None;

    loop {
        match reader.read_event()? {
            Event::Start(element) => {
                let name = element.name();
                if body_depth.is_none() && name.as_ref() == b"w:body" {
                    body_depth = Some(depth + 1);
                } else if body_depth == Some(depth) && name.as_ref() == b"w:sectPr" {
                    let end = reader.buffer_position();
                    section_start = document_xml[..end].rfind("<w:sectPr");
                }
                depth += 1;
            }
            Event::Empty(element) => {
                if body_depth == Some(depth) && element.name().as_ref() == b"w:sectPr" {
                    let end = reader.buffer_position();
                    section_start = document_xml[..end].rfind("<w:sectPr");
                }
            }
            Event::End(element) => {
                let name = element.name();
                if body_depth.is_some() && depth.checked_sub(1) == body_depth && name.as_ref() == b"w:tbl" {
                    if tables_seen == insert_after {
                        return Ok((reader.buffer_position(), InsertionPoint::AfterTable(insert_after)));
                    }
                    tables_seen += 1;
                } else if body_depth == Some(depth) && name.as_ref() == b"w:body" {
                    debug!(tables_seen, insert_after, "template has too few tables");
                    if let Some(offset) = section_start {
                        return Ok((offset, InsertionPoint::BeforeSectionProperties));
                    }
                    let end = reader.buffer_position();
                    let offset = document_xml[..end].rfind("</w:body").ok_or_else(|| {
                        PipelineError::Xml("unterminated document body".to_string())
                    })?;
                    return Ok((offset, InsertionPoint::BeforeBodyEnd));
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Err(PipelineError::Template("document has no w:body element".to_string()))
}

/// Inserts `tables_xml` into a template document. A page break precedes
/// the tables only when they follow an anchor table.
///
/// # Errors
/// See [`find_insertion_point`].
pub fn splice_tables(
    document_xml: &str,
    tables_xml: &str,
    insert_after: usize,
) -> Result<(String, InsertionPoint), PipelineError> {
    let (offset, point) = find_insertion_point(document_xml, insert_after)?;
    let mut spliced =
        String::with_capacity(document_xml.len() + PAGE_BREAK_PARAGRAPH.len() + tables_xml.len());
    spliced.push_str(&document_xml[..offset]);
    if matches!(point, InsertionPoint::AfterTable(_)) {
        spliced.push_str(PAGE_BREAK_PARAGRAPH);
    }
    spliced.push_str(tables_xml);
    spliced.push_str(&document_xml[offset..]);
    Ok((spliced, point))
}

/// Copies every template part unchanged except the main document, which
/// receives the tables.
///
/// # Errors
/// Returns [`PipelineError::Template`] when the template has no main
/// document part, plus any zip, XML or I/O failure.
pub fn write_from_template<R, W>(
    template: R,
    out: W,
    tables_xml: &str,
    insert_after: usize,
) -> Result<(W, InsertionPoint), PipelineError>
where
    R: Read + Seek,
    W: Write + Seek,
{
    let mut archive = ZipArchive::new(template)?;

    let document_xml = {
        let mut part = archive.by_name(DOCUMENT_PART).map_err(|_| {
            PipelineError::Template(format!("template has no {DOCUMENT_PART} part"))
        })?;
        let mut bytes = Vec::new();
        part.read_to_end(&mut bytes)?;
        String::from_utf8(bytes)?
    };
    let (document_xml, point) = splice_tables(&document_xml, tables_xml, insert_after)?;

    let mut zip = ZipWriter::new(out);
    for index in 0..archive.len() {
        let part = archive.by_index_raw(index)?;
        if part.name() == DOCUMENT_PART {
            continue;
        }
        zip.raw_copy_file(part)?;
    }
    zip.start_file(DOCUMENT_PART, deflated())?;
    zip.write_all(document_xml.as_bytes())?;

    Ok((zip.finish()?, point))
}

/// Writes the collected tables to `output`, into `template` when one is
/// given. Returns the insertion point used for a template.
///
/// # Errors
/// Returns I/O failures opening either file, plus the package errors of
/// [`write_minimal_package`] and [`write_from_template`].
pub fn save_docx(
    output: &Path,
    tables: &WordTableWriter,
    template: Option<&Path>,
    insert_after: usize,
) -> Result<Option<InsertionPoint>, PipelineError> {
    let body = tables.render_body();
    if tables.table_count() == 0 {
        warn!(output = %output.display(), "writing document without tables");
    }

    // Build in memory so a failed template leaves no partial output.
    let buffer = Cursor::new(Vec::new());
    let (buffer, point) = match template {
        Some(template_path) => {
            let template = File::open(template_path).map_err(|error| {
                PipelineError::Io(format!("cannot open template {}: {error}", template_path.display()))
            })?;
            let (buffer, point) = write_from_template(template, buffer, &body, insert_after)?;
            info!(template = %template_path.display(), ?point, "tables inserted into template");
            (buffer, Some(point))
        }
        None => (write_minimal_package(buffer, &body)?, None),
    };

    std::fs::write(output, buffer.into_inner())?;
    info!(output = %output.display(), tables = tables.table_count(), "document written");
    Ok(point)
}

#[cfg(test)]
mod tests {
    use super::{InsertionPoint, find_insertion_point, splice_tables};

    fn document(body: &str) -> String {
        format!(
            r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
        )
    }

    const TABLE: &str = "<w:tbl><w:tr><w:tc><w:p/></w:tc></w:tr></w:tbl>";

    #[test]
    fn inserts_after_the_requested_top_level_table() {
        let xml = document(&format!("<w:p/>{TABLE}<w:p/>{TABLE}<w:p/>"));
        let (spliced, point) = splice_tables(&xml, "<w:tbl>NEW</w:tbl>", 1).expect("splice");
        assert_eq!(point, InsertionPoint::AfterTable(1));
        assert!(spliced.contains("</w:tbl><w:p><w:r><w:br w:type=\"page\"/></w:r></w:p><w:tbl>NEW</w:tbl><w:p/></w:body>"));
    }

    #[test]
    fn nested_tables_are_not_counted() {
        let nested = format!("<w:tbl><w:tr><w:tc>{TABLE}<w:p/></w:tc></w:tr></w:tbl>");
        let xml = document(&format!("{nested}{TABLE}"));
        let (offset, point) = find_insertion_point(&xml, 1).expect("point");
        assert_eq!(point, InsertionPoint::AfterTable(1));
        assert_eq!(offset, xml.len() - "</w:body></w:document>".len());
    }

    #[test]
    fn falls_back_to_section_properties_then_body_end() {
        let with_section = document(&format!("{TABLE}<w:sectPr><w:pgSz w:w=\"1\"/></w:sectPr>"));
        let (offset, point) = find_insertion_point(&with_section, 3).expect("point");
        assert_eq!(point, InsertionPoint::BeforeSectionProperties);
        assert!(with_section[offset..].starts_with("<w:sectPr>"));

        let bare = document("<w:p/>");
        let (offset, point) = find_insertion_point(&bare, 0).expect("point");
        assert_eq!(point, InsertionPoint::BeforeBodyEnd);
        assert!(bare[offset..].starts_with("</w:body>"));
    }

    #[test]
    fn fallback_insertions_add_no_page_break() {
        let with_section = document(&format!("{TABLE}<w:sectPr/>"));
        let (spliced, point) = splice_tables(&with_section, "<w:tbl>NEW</w:tbl>", 5).expect("splice");
        assert_eq!(point, InsertionPoint::BeforeSectionProperties);
        assert!(spliced.contains("</w:tbl><w:tbl>NEW</w:tbl><w:sectPr/>"));
        assert!(!spliced.contains("w:br"));

        let bare = document("<w:p/>");
        let (spliced, point) = splice_tables(&bare, "<w:tbl>NEW</w:tbl>", 0).expect("splice");
        assert_eq!(point, InsertionPoint::BeforeBodyEnd);
        assert!(spliced.contains("<w:p/><w:tbl>NEW</w:tbl></w:body>"));
        assert!(!spliced.contains("w:br"));
    }

    #[test]
    fn document_without_body_is_rejected() {
        let error = find_insertion_point("<w:document/>", 0).expect_err("no body");
        assert_eq!(error.code(), "template_error");
    }
}
