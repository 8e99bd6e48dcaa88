use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

const PAGE_HEIGHT: f64 = 842.0;

/// A ruled table drawn cell by cell. Every origin cell is stroked over its
/// full span, so merged regions carry no inner rules.
pub struct RuledTable<'a> {
    pub left: f64,
    pub top: f64,
    pub col_widths: Vec<f64>,
    pub row_height: f64,
    pub cells: Vec<Vec<&'a str>>,
    /// `(row, col, col_span, row_span)`
    pub merges: Vec<(usize, usize, usize, usize)>,
    pub shaded_rows: Vec<usize>,
}

impl RuledTable<'_> {
    fn col_left(&self, col: usize) -> f64 {
        self.left + self.col_widths[..col].iter().sum::<f64>()
    }

    fn width(&self) -> f64 {
        self.col_widths.iter().sum()
    }

    fn span_at(&self, row: usize, col: usize) -> Option<(usize, usize, usize, usize)> {
        self.merges.iter().copied().find(|(r, c, col_span, row_span)| {
            (*r..r + row_span).contains(&row) && (*c..c + col_span).contains(&col)
        })
    }

    fn operations(&self) -> Vec<Operation> {
        let mut operations = Vec::new();
        let pdf_y = |top: f64| PAGE_HEIGHT - top;

        for row in &self.shaded_rows {
            #[allow(clippy::cast_precision_loss)]
            let top = self.top + *row as f64 * self.row_height;
            operations.push(Operation::new("g", vec![0.85.into()]));
            operations.push(Operation::new(
                "re",
                vec![
                    self.left.into(),
                    pdf_y(top + self.row_height).into(),
                    self.width().into(),
                    self.row_height.into(),
                ],
            ));
            operations.push(Operation::new("f", vec![]));
        }
        operations.push(Operation::new("g", vec![0.into()]));

        for (row, cells) in self.cells.iter().enumerate() {
            for (col, text) in cells.iter().enumerate() {
                let (col_span, row_span) = match self.span_at(row, col) {
                    Some((r, c, col_span, row_span)) if (r, c) == (row, col) => (col_span, row_span),
                    Some(_) => continue,
                    None => (1, 1),
                };
                let left = self.col_left(col);
                let width = self.col_left(col + col_span) - left;
                #[allow(clippy::cast_precision_loss)]
                let top = self.top + row as f64 * self.row_height;
                #[allow(clippy::cast_precision_loss)]
                let height = row_span as f64 * self.row_height;

                operations.push(Operation::new(
                    "re",
                    vec![left.into(), pdf_y(top + height).into(), width.into(), height.into()],
                ));
                operations.push(Operation::new("S", vec![]));

                if !text.is_empty() {
                    operations.extend([
                        Operation::new("BT", vec![]),
                        Operation::new("Tf", vec!["F1".into(), 9.into()]),
                        Operation::new("Td", vec![(left + 4.0).into(), pdf_y(top + 14.0).into()]),
                        Operation::new("Tj", vec![Object::string_literal(*text)]),
                        Operation::new("ET", vec![]),
                    ]);
                }
            }
        }

        operations
    }
}

pub struct FixturePage<'a> {
    pub lines: Vec<&'a str>,
    pub tables: Vec<RuledTable<'a>>,
}

pub fn text_page(lines: Vec<&str>) -> FixturePage<'_> {
    FixturePage {
        lines,
        tables: Vec::new(),
    }
}

pub fn create_test_pdf(path: &Path, pages: &[FixturePage<'_>]) -> Result<(), Box<dyn std::error::Error>> {
    let mut doc = Document::with_version("1.5");

    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut page_ids = Vec::new();

    for page in pages {
        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("TL", vec![16.into()]),
            Operation::new("Td", vec![50.into(), 800.into()]),
        ];

        for (index, line) in page.lines.iter().enumerate() {
            operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
            if index + 1 < page.lines.len() {
                operations.push(Operation::new("T*", vec![]));
            }
        }
        operations.push(Operation::new("ET", vec![]));
        for table in &page.tables {
            operations.extend(table.operations());
        }

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        page_ids.push(page_id);
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids.iter().map(|id| (*id).into()).collect::<Vec<_>>(),
            "Count" => i64::try_from(page_ids.len())?,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    doc.save(path)?;
    Ok(())
}
