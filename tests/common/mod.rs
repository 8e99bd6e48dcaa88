#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use pdf_table_translate::{TranslateError, TranslationBackend};

/// Deterministic stand-in for the upstream model. Output is mostly CJK so
/// a translated text is never eligible again.
pub fn fake_translation(text: &str) -> String {
    format!("譯文{}", text.trim().chars().count())
}

#[derive(Debug, Default)]
pub struct StubBackend {
    pub delay: Option<Duration>,
    /// Texts whose call fails with a 503.
    pub failing: Vec<String>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    per_key: Mutex<HashMap<String, usize>>,
}

impl StubBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_delay(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay: Some(delay),
            ..Self::default()
        })
    }

    pub fn failing_on(texts: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            failing: texts.iter().map(ToString::to_string).collect(),
            ..Self::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn calls_for(&self, text: &str) -> usize {
        self.per_key
            .lock()
            .expect("call counter lock")
            .get(text)
            .copied()
            .unwrap_or(0)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TranslationBackend for StubBackend {
    async fn translate(&self, text: &str) -> Result<String, TranslateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self
            .per_key
            .lock()
            .expect("call counter lock")
            .entry(text.to_string())
            .or_default() += 1;

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.iter().any(|failing| failing == text) {
            return Err(TranslateError::Status {
                status: 503,
                message: "service unavailable".to_string(),
            });
        }
        Ok(fake_translation(text))
    }

    fn name(&self) -> &str {
        "stub"
    }
}

/// Never answers; used to exercise the per-call timeout.
#[derive(Debug, Default)]
pub struct HangingBackend;

#[async_trait]
impl TranslationBackend for HangingBackend {
    async fn translate(&self, _text: &str) -> Result<String, TranslateError> {
        std::future::pending::<()>().await;
        Err(TranslateError::Timeout("unreachable".to_string()))
    }

    fn name(&self) -> &str {
        "hanging"
    }
}

const PAGE_HEIGHT: f64 = 842.0;

/// A fully ruled grid with equal column widths and one header row shaded.
pub struct GridTable<'a> {
    pub top: f64,
    pub cells: Vec<Vec<&'a str>>,
}

impl GridTable<'_> {
    const LEFT: f64 = 50.0;
    const COL_WIDTH: f64 = 150.0;
    const ROW_HEIGHT: f64 = 20.0;

    #[allow(clippy::cast_precision_loss)]
    fn operations(&self) -> Vec<Operation> {
        let cols = self.cells.first().map_or(0, Vec::len);
        let width = cols as f64 * Self::COL_WIDTH;
        let mut operations = vec![
            Operation::new("g", vec![0.85.into()]),
            Operation::new(
                "re",
                vec![
                    Self::LEFT.into(),
                    (PAGE_HEIGHT - self.top - Self::ROW_HEIGHT).into(),
                    width.into(),
                    Self::ROW_HEIGHT.into(),
                ],
            ),
            Operation::new("f", vec![]),
            Operation::new("g", vec![0.into()]),
        ];

        for (row, cells) in self.cells.iter().enumerate() {
            let top = self.top + row as f64 * Self::ROW_HEIGHT;
            for (col, text) in cells.iter().enumerate() {
                let left = Self::LEFT + col as f64 * Self::COL_WIDTH;
                operations.push(Operation::new(
                    "re",
                    vec![
                        left.into(),
                        (PAGE_HEIGHT - top - Self::ROW_HEIGHT).into(),
                        Self::COL_WIDTH.into(),
                        Self::ROW_HEIGHT.into(),
                    ],
                ));
                operations.push(Operation::new("S", vec![]));
                if !text.is_empty() {
                    operations.extend([
                        Operation::new("BT", vec![]),
                        Operation::new("Tf", vec!["F1".into(), 9.into()]),
                        Operation::new("Td", vec![(left + 4.0).into(), (PAGE_HEIGHT - top - 14.0).into()]),
                        Operation::new("Tj", vec![Object::string_literal(*text)]),
                        Operation::new("ET", vec![]),
                    ]);
                }
            }
        }
        operations
    }
}

/// Writes a PDF with one page per entry: the heading line, then the tables.
pub fn create_report_pdf(
    path: &Path,
    pages: &[(&str, Vec<GridTable<'_>>)],
) -> Result<(), Box<dyn std::error::Error>> {
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
    for (heading, tables) in pages {
        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![50.into(), 800.into()]),
            Operation::new("Tj", vec![Object::string_literal(*heading)]),
            Operation::new("ET", vec![]),
        ];
        for table in tables {
            operations.extend(table.operations());
        }
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        page_ids.push(doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        }));
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
