use std::collections::BTreeMap;
use std::path::Path;

use encoding_rs::{BIG5, UTF_16BE};
use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId};
use tracing::debug;

use crate::cells::{Edge, TextFragment};
use crate::error::ExtractError;
use crate::model::{BBox, FilledRect};
use crate::table_parse::is_cjk;

const DEFAULT_PAGE_TOP: f64 = 842.0;
/// Filled rectangles thinner than this are rule lines as well as fills.
const RULE_THICKNESS: f64 = 2.0;
/// Average glyph advance as a share of the font size.
const GLYPH_WIDTH_RATIO: f64 = 0.5;

fn split_text_into_pages(raw_text: &str) -> Vec<String> {
    let mut pages = raw_text
        .split('\u{000C}')
        .map(str::to_string)
        .collect::<Vec<_>>();
    if pages.last().is_some_and(String::is_empty) {
        pages.pop();
    }
    pages
}

fn looks_decoding_broken(text: &str) -> bool {
    if text.is_empty() {
        return false;
    }

    if text.contains("?Identity-H Unimplemented?") {
        return true;
    }

    let total = text.chars().count();
    let replacement = text.matches('\u{FFFD}').count();
    let control = text
        .chars()
        .filter(|ch| ch.is_control() && !matches!(ch, '\n' | '\r' | '\t'))
        .count();
    let cjk_count = text.chars().filter(|ch| is_cjk(*ch)).count();
    let ext_a_count = text
        .chars()
        .filter(|ch| ('\u{3400}'..='\u{4DBF}').contains(ch))
        .count();

    replacement * 8 > total
        || control * 5 > total
        || (cjk_count > 20 && ext_a_count * 4 > cjk_count)
}

fn decode_pdf_bytes(encoding: Option<&str>, bytes: &[u8]) -> String {
    let decoded = Document::decode_text(encoding, bytes);
    if !looks_decoding_broken(&decoded) {
        return decoded;
    }

    if bytes.starts_with(&[0xFE, 0xFF]) || bytes.starts_with(&[0xFF, 0xFE]) {
        let bytes = if bytes.len() > 2 { &bytes[2..] } else { bytes };
        let (utf16, had_errors) = UTF_16BE.decode_without_bom_handling(bytes);
        if !had_errors && !utf16.is_empty() {
            return utf16.into_owned();
        }
    }

    if let Some(name) = encoding {
        let lower = name.to_ascii_lowercase();

        if lower.contains("utf16")
            || lower.contains("ucs2")
            || lower.contains("identity-h")
            || lower.contains("unicode")
        {
            let (utf16, had_errors) = UTF_16BE.decode_without_bom_handling(bytes);
            if !had_errors && !utf16.is_empty() {
                return utf16.into_owned();
            }
        }

        if lower.contains("big5") || lower.contains("b5") || lower.contains("eten") {
            let (big5, _, had_errors) = BIG5.decode(bytes);
            if !had_errors && !big5.is_empty() {
                return big5.into_owned();
            }
        }
    }

    String::from_utf8_lossy(bytes).to_string()
}

fn extraction_quality_score(text: &str) -> i64 {
    if text.trim().is_empty() {
        return i64::MIN / 4;
    }

    let non_empty_lines = text.lines().filter(|line| !line.trim().is_empty()).count();
    let alphanumeric = text.chars().filter(|ch| ch.is_alphanumeric()).count();
    let broken_penalty = if looks_decoding_broken(text) { 800 } else { 0 };

    i64::try_from(non_empty_lines * 10 + alphanumeric / 20).unwrap_or(i64::MAX / 4) - broken_penalty
}

fn choose_best_text(candidates: &[String]) -> String {
    candidates
        .iter()
        .max_by_key(|text| extraction_quality_score(text))
        .cloned()
        .unwrap_or_default()
}

fn number(object: &Object) -> Option<f64> {
    match object {
        #[allow(clippy::cast_precision_loss)]
        Object::Integer(value) => Some(*value as f64),
        Object::Real(value) => Some(f64::from(*value)),
        _ => None,
    }
}

fn numbers(operands: &[Object]) -> Vec<f64> {
    operands.iter().filter_map(number).collect()
}

/// Affine matrix `[a b c d e f]` applied to row vectors, as in PDF.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    e: f64,
    f: f64,
}

impl Matrix {
    const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    fn translation(tx: f64, ty: f64) -> Self {
        Self {
            e: tx,
            f: ty,
            ..Self::IDENTITY
        }
    }

    fn from_operands(operands: &[Object]) -> Option<Self> {
        let values = numbers(operands);
        let [a, b, c, d, e, f] = values.as_slice() else {
            return None;
        };
        Some(Self {
            a: *a,
            b: *b,
            c: *c,
            d: *d,
            e: *e,
            f: *f,
        })
    }

    /// `self` applied first, then `other`.
    fn then(&self, other: &Self) -> Self {
        Self {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    fn vertical_scale(&self) -> f64 {
        self.c.hypot(self.d)
    }
}

#[derive(Debug, Clone, Copy)]
struct GraphicsState {
    ctm: Matrix,
    fill_intensity: f64,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            ctm: Matrix::IDENTITY,
            fill_intensity: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
enum Subpath {
    Rect { x0: f64, y0: f64, x1: f64, y1: f64 },
    Polyline(Vec<(f64, f64)>),
}

#[derive(Debug, Clone, Copy)]
struct TextState {
    tm: Matrix,
    tlm: Matrix,
    leading: f64,
    font_size: f64,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            tm: Matrix::IDENTITY,
            tlm: Matrix::IDENTITY,
            leading: 0.0,
            font_size: 12.0,
        }
    }
}

impl TextState {
    fn move_line(&mut self, tx: f64, ty: f64) {
        self.tlm = Matrix::translation(tx, ty).then(&self.tlm);
        self.tm = self.tlm;
    }

    fn next_line(&mut self) {
        self.move_line(0.0, -self.leading);
    }
}

fn gray_from_rgb(r: f64, g: f64, b: f64) -> f64 {
    (0.299 * r + 0.587 * g + 0.114 * b).clamp(0.0, 1.0)
}

fn gray_from_cmyk(c: f64, m: f64, y: f64, k: f64) -> f64 {
    gray_from_rgb((1.0 - c) * (1.0 - k), (1.0 - m) * (1.0 - k), (1.0 - y) * (1.0 - k))
}

/// Reduces a colour operand list to one grey intensity by component count.
fn intensity_from_components(components: &[f64]) -> Option<f64> {
    match components {
        [gray] => Some(gray.clamp(0.0, 1.0)),
        [r, g, b] => Some(gray_from_rgb(*r, *g, *b)),
        [c, m, y, k] => Some(gray_from_cmyk(*c, *m, *y, *k)),
        _ => None,
    }
}

/// Filled rectangles, ruling edges and positioned text of one page, in
/// top-left coordinates.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct PageContent {
    pub filled_rects: Vec<FilledRect>,
    pub edges: Vec<Edge>,
    pub fragments: Vec<TextFragment>,
}

struct Interpreter<'a> {
    page_top: f64,
    encodings: BTreeMap<Vec<u8>, &'a str>,
    state: GraphicsState,
    stack: Vec<GraphicsState>,
    path: Vec<Subpath>,
    text: TextState,
    encoding: Option<&'a str>,
    out: PageContent,
}

impl<'a> Interpreter<'a> {
    fn new(page_top: f64, encodings: BTreeMap<Vec<u8>, &'a str>) -> Self {
        Self {
            page_top,
            encodings,
            state: GraphicsState::default(),
            stack: Vec::new(),
            path: Vec::new(),
            text: TextState::default(),
            encoding: None,
            out: PageContent::default(),
        }
    }

    fn device_box(&self, x0: f64, y0: f64, x1: f64, y1: f64) -> BBox {
        BBox::new(x0, self.page_top - y0, x1, self.page_top - y1)
    }

    fn execute(&mut self, operator: &str, operands: &[Object]) {
        match operator {
            "q" => self.stack.push(self.state),
            "Q" => {
                if let Some(state) = self.stack.pop() {
                    self.state = state;
                }
            }
            "cm" => {
                if let Some(matrix) = Matrix::from_operands(operands) {
                    self.state.ctm = matrix.then(&self.state.ctm);
                }
            }
            "g" | "rg" | "k" | "sc" | "scn" => {
                if let Some(intensity) = intensity_from_components(&numbers(operands)) {
                    self.state.fill_intensity = intensity;
                }
            }
            "re" => self.rectangle(operands),
            "m" => {
                if let [x, y] = numbers(operands).as_slice() {
                    let point = self.state.ctm.apply(*x, *y);
                    self.path.push(Subpath::Polyline(vec![point]));
                }
            }
            "l" => {
                if let [x, y] = numbers(operands).as_slice() {
                    let point = self.state.ctm.apply(*x, *y);
                    if let Some(Subpath::Polyline(points)) = self.path.last_mut() {
                        points.push(point);
                    }
                }
            }
            "h" => {
                if let Some(Subpath::Polyline(points)) = self.path.last_mut()
                    && let Some(first) = points.first().copied()
                {
                    points.push(first);
                }
            }
            "f" | "F" | "f*" => self.paint(true, false),
            "S" | "s" => self.paint(false, true),
            "B" | "B*" | "b" | "b*" => self.paint(true, true),
            "n" => self.path.clear(),
            "BT" => {
                self.text.tm = Matrix::IDENTITY;
                self.text.tlm = Matrix::IDENTITY;
            }
            "Tf" => {
                if let Some(font_name) = operands.first().and_then(|operand| operand.as_name().ok())
                {
                    self.encoding = self.encodings.get(font_name).copied();
                }
                if let Some(size) = operands.get(1).and_then(number) {
                    self.text.font_size = size;
                }
            }
            "TL" => {
                if let Some(leading) = operands.first().and_then(number) {
                    self.text.leading = leading;
                }
            }
            "Td" => {
                if let [tx, ty] = numbers(operands).as_slice() {
                    self.text.move_line(*tx, *ty);
                }
            }
            "TD" => {
                if let [tx, ty] = numbers(operands).as_slice() {
                    self.text.leading = -ty;
                    self.text.move_line(*tx, *ty);
                }
            }
            "Tm" => {
                if let Some(matrix) = Matrix::from_operands(operands) {
                    self.text.tm = matrix;
                    self.text.tlm = matrix;
                }
            }
            "T*" => self.text.next_line(),
            "Tj" | "TJ" => self.show_text(operands),
            "'" => {
                self.text.next_line();
                self.show_text(operands);
            }
            "\"" => {
                self.text.next_line();
                self.show_text(operands.get(2..).unwrap_or_default());
            }
            _ => {}
        }
    }

    fn rectangle(&mut self, operands: &[Object]) {
        let values = numbers(operands);
        let [x, y, width, height] = values.as_slice() else {
            return;
        };
        let corners = [
            self.state.ctm.apply(*x, *y),
            self.state.ctm.apply(x + width, *y),
            self.state.ctm.apply(*x, y + height),
            self.state.ctm.apply(x + width, y + height),
        ];
        let (mut x0, mut y0, mut x1, mut y1) = (f64::MAX, f64::MAX, f64::MIN, f64::MIN);
        for (cx, cy) in corners {
            x0 = x0.min(cx);
            y0 = y0.min(cy);
            x1 = x1.max(cx);
            y1 = y1.max(cy);
        }
        self.path.push(Subpath::Rect { x0, y0, x1, y1 });
    }

    fn paint(&mut self, fill: bool, stroke: bool) {
        for subpath in std::mem::take(&mut self.path) {
            match subpath {
                Subpath::Rect { x0, y0, x1, y1 } => {
                    let bbox = self.device_box(x0, y0, x1, y1);
                    if fill {
                        self.out.filled_rects.push(FilledRect {
                            x0: bbox.left,
                            y0: bbox.top,
                            x1: bbox.right,
                            y1: bbox.bottom,
                            fill_intensity: self.state.fill_intensity,
                        });
                        if bbox.height() <= RULE_THICKNESS {
                            self.out.edges.push(Edge::horizontal(
                                (bbox.top + bbox.bottom) / 2.0,
                                bbox.left,
                                bbox.right,
                            ));
                        } else if bbox.width() <= RULE_THICKNESS {
                            self.out.edges.push(Edge::vertical(
                                (bbox.left + bbox.right) / 2.0,
                                bbox.top,
                                bbox.bottom,
                            ));
                        }
                    }
                    if stroke {
                        self.out.edges.extend([
                            Edge::horizontal(bbox.top, bbox.left, bbox.right),
                            Edge::horizontal(bbox.bottom, bbox.left, bbox.right),
                            Edge::vertical(bbox.left, bbox.top, bbox.bottom),
                            Edge::vertical(bbox.right, bbox.top, bbox.bottom),
                        ]);
                    }
                }
                Subpath::Polyline(points) if stroke => {
                    for pair in points.windows(2) {
                        let ((ax, ay), (bx, by)) = (pair[0], pair[1]);
                        let (top_a, top_b) = (self.page_top - ay, self.page_top - by);
                        if (top_a - top_b).abs() < 0.5 && (ax - bx).abs() > 0.0 {
                            self.out.edges.push(Edge::horizontal(
                                (top_a + top_b) / 2.0,
                                ax,
                                bx,
                            ));
                        } else if (ax - bx).abs() < 0.5 && (top_a - top_b).abs() > 0.0 {
                            self.out.edges.push(Edge::vertical((ax + bx) / 2.0, top_a, top_b));
                        }
                    }
                }
                Subpath::Polyline(_) => {}
            }
        }
    }

    fn show_text(&mut self, operands: &[Object]) {
        fn collect_text(text: &mut String, encoding: Option<&str>, operands: &[Object]) {
            for operand in operands {
                match operand {
                    Object::String(bytes, _) => {
                        text.push_str(&decode_pdf_bytes(encoding, bytes));
                    }
                    Object::Array(items) => {
                        collect_text(text, encoding, items);
                    }
                    Object::Integer(value) => {
                        if *value < -100 {
                            text.push(' ');
                        }
                    }
                    Object::Real(value) => {
                        if *value < -100.0 {
                            text.push(' ');
                        }
                    }
                    _ => {}
                }
            }
        }

        let mut shown = String::new();
        collect_text(&mut shown, self.encoding, operands);
        if shown.is_empty() {
            return;
        }

        let rendering = self.text.tm.then(&self.state.ctm);
        let (x, y) = rendering.apply(0.0, 0.0);
        let size = (self.text.font_size * rendering.vertical_scale()).abs();
        #[allow(clippy::cast_precision_loss)]
        let advance = shown.chars().count() as f64 * self.text.font_size * GLYPH_WIDTH_RATIO;
        self.text.tm = Matrix::translation(advance, 0.0).then(&self.text.tm);

        if shown.trim().is_empty() {
            return;
        }
        self.out.fragments.push(TextFragment {
            x,
            baseline: self.page_top - y,
            size: if size > 0.0 { size } else { self.text.font_size },
            text: shown,
        });
    }
}

fn resolve<'a>(document: &'a Document, object: &'a Object) -> Option<&'a Object> {
    match object {
        Object::Reference(id) => document.get_object(*id).ok(),
        other => Some(other),
    }
}

/// Top edge (upper-right y of the media box) of a page, following the
/// inherited `/MediaBox` through the page tree.
fn page_top(document: &Document, page_id: ObjectId) -> f64 {
    let mut current = document.get_dictionary(page_id).ok();
    for _ in 0..16 {
        let Some(dict) = current else {
            break;
        };
        if let Some(values) = dict
            .get(b"MediaBox")
            .ok()
            .and_then(|object| resolve(document, object))
            .and_then(|object| object.as_array().ok())
            .map(|array| numbers(array))
            && let [_, lly, _, ury] = values.as_slice()
        {
            return lly.max(*ury);
        }
        current = dict
            .get(b"Parent")
            .ok()
            .and_then(|object| object.as_reference().ok())
            .and_then(|id| document.get_dictionary(id).ok());
    }
    DEFAULT_PAGE_TOP
}

fn interpret_page(document: &Document, page_id: ObjectId) -> Result<PageContent, String> {
    let raw_content = document
        .get_page_content(page_id)
        .map_err(|error| format!("failed to read content stream: {error}"))?;
    let content = Content::decode(&raw_content)
        .map_err(|error| format!("failed to decode content stream: {error}"))?;
    let encodings = document
        .get_page_fonts(page_id)
        .into_iter()
        .map(|(name, font)| (name, font.get_font_encoding()))
        .collect::<BTreeMap<Vec<u8>, &str>>();

    let mut interpreter = Interpreter::new(page_top(document, page_id), encodings);
    for operation in &content.operations {
        interpreter.execute(operation.operator.as_str(), &operation.operands);
    }
    Ok(interpreter.out)
}

/// Joins fragments into lines, breaking wherever the baseline moves by
/// more than half a glyph.
fn fragments_text(fragments: &[TextFragment]) -> String {
    let mut out = String::new();
    let mut last_baseline: Option<f64> = None;
    for fragment in fragments {
        if let Some(baseline) = last_baseline {
            if (fragment.baseline - baseline).abs() > fragment.size / 2.0 {
                out.push('\n');
            } else if !out.ends_with(' ') && !fragment.text.starts_with(' ') {
                out.push(' ');
            }
        }
        out.push_str(&fragment.text);
        last_baseline = Some(fragment.baseline);
    }
    out
}

/// One page as read from the PDF: its best-effort text and its geometry, or
/// the reason the geometry could not be read.
#[derive(Debug, Clone)]
pub(crate) struct RawPage {
    pub page_number: u32,
    pub text: String,
    pub content: Result<PageContent, String>,
}

pub(crate) struct PdfSource {
    document: Document,
    extracted_pages: Option<Vec<String>>,
}

impl PdfSource {
    pub(crate) fn load(input_pdf: &Path) -> Result<Self, ExtractError> {
        let document = Document::load(input_pdf)?;
        Self::check(&document)?;
        let extracted = pdf_extract::extract_text(input_pdf).ok();
        Ok(Self::with_extracted_text(document, extracted.as_deref()))
    }

    pub(crate) fn load_mem(input_pdf: &[u8]) -> Result<Self, ExtractError> {
        let document = Document::load_mem(input_pdf)?;
        Self::check(&document)?;
        let extracted = pdf_extract::extract_text_from_mem(input_pdf).ok();
        Ok(Self::with_extracted_text(document, extracted.as_deref()))
    }

    fn check(document: &Document) -> Result<(), ExtractError> {
        if document.is_encrypted() {
            return Err(ExtractError::Encrypted);
        }
        if document.get_pages().is_empty() {
            return Err(ExtractError::EmptyDocument);
        }
        Ok(())
    }

    fn with_extracted_text(document: Document, extracted: Option<&str>) -> Self {
        let page_count = document.get_pages().len();
        let extracted_pages = extracted
            .map(split_text_into_pages)
            .filter(|pages| pages.len() == page_count);
        Self {
            document,
            extracted_pages,
        }
    }

    pub(crate) fn read_pages(&self) -> Vec<RawPage> {
        let pages_map = self.document.get_pages();
        let mut pages = Vec::with_capacity(pages_map.len());

        for (index, (page_no, page_id)) in pages_map.iter().enumerate() {
            let content = interpret_page(&self.document, *page_id);

            let mut candidates = Vec::new();
            if let Some(text) = self
                .extracted_pages
                .as_ref()
                .and_then(|extracted| extracted.get(index).cloned())
                .filter(|text| !text.trim().is_empty())
            {
                candidates.push(text);
            }
            if let Ok(content) = &content {
                let text = fragments_text(&content.fragments);
                if !text.trim().is_empty() {
                    candidates.push(text);
                }
            }
            if let Some(text) = self
                .document
                .extract_text(&[*page_no])
                .ok()
                .filter(|text| !text.trim().is_empty())
            {
                candidates.push(text);
            }

            debug!(page = page_no, candidates = candidates.len(), "read page");
            pages.push(RawPage {
                page_number: *page_no,
                text: choose_best_text(&candidates),
                content,
            });
        }

        pages
    }
}

#[cfg(test)]
mod tests {
    use lopdf::Object;

    use super::{
        Interpreter, Matrix, decode_pdf_bytes, fragments_text, intensity_from_components,
        split_text_into_pages,
    };
    use crate::cells::{Orientation, TextFragment};

    fn ops(values: &[f64]) -> Vec<Object> {
        #[allow(clippy::cast_possible_truncation)]
        values.iter().map(|value| Object::Real(*value as f32)).collect()
    }

    #[test]
    fn splits_form_feed_delimited_pages() {
        let pages = split_text_into_pages("p1\u{000C}p2\u{000C}");
        assert_eq!(pages, vec!["p1", "p2"]);
    }

    #[test]
    fn decodes_big5_when_encoding_hint_is_present() {
        let (bytes, _, had_errors) = encoding_rs::BIG5.encode("測試");
        assert!(!had_errors);
        let decoded = decode_pdf_bytes(Some("ETen-B5-H"), &bytes);
        assert_eq!(decoded, "測試");
    }

    #[test]
    fn colour_components_reduce_to_grey() {
        assert_eq!(intensity_from_components(&[0.9]), Some(0.9));
        let white = intensity_from_components(&[1.0, 1.0, 1.0]).expect("rgb");
        assert!((white - 1.0).abs() < 1e-9);
        let black = intensity_from_components(&[0.0, 0.0, 0.0, 1.0]).expect("cmyk");
        assert!(black.abs() < 1e-9);
        assert_eq!(intensity_from_components(&[0.1, 0.2]), None);
    }

    #[test]
    fn matrices_compose_in_pdf_order() {
        let scale = Matrix {
            a: 2.0,
            d: 2.0,
            ..Matrix::IDENTITY
        };
        let shifted = Matrix::translation(10.0, 5.0).then(&scale);
        assert_eq!(shifted.apply(1.0, 1.0), (22.0, 12.0));
    }

    #[test]
    fn grey_fill_becomes_filled_rect_in_top_left_coordinates() {
        let mut interpreter = Interpreter::new(800.0, Default::default());
        interpreter.execute("g", &ops(&[0.85]));
        interpreter.execute("re", &ops(&[50.0, 680.0, 200.0, 20.0]));
        interpreter.execute("f", &[]);

        let rect = interpreter.out.filled_rects[0];
        assert_eq!((rect.x0, rect.y0, rect.x1, rect.y1), (50.0, 100.0, 250.0, 120.0));
        assert!((rect.fill_intensity - 0.85).abs() < 1e-6);
        assert!(interpreter.out.edges.is_empty());
    }

    #[test]
    fn stroked_rect_yields_four_edges_and_lines_yield_one() {
        let mut interpreter = Interpreter::new(800.0, Default::default());
        interpreter.execute("re", &ops(&[50.0, 680.0, 200.0, 20.0]));
        interpreter.execute("S", &[]);
        interpreter.execute("m", &ops(&[50.0, 600.0]));
        interpreter.execute("l", &ops(&[250.0, 600.0]));
        interpreter.execute("S", &[]);

        let edges = &interpreter.out.edges;
        assert_eq!(edges.len(), 5);
        let last = edges[4];
        assert_eq!(last.orientation, Orientation::Horizontal);
        assert!((last.position - 200.0).abs() < 1e-9);
        assert!(interpreter.out.filled_rects.is_empty());
    }

    #[test]
    fn text_position_follows_td_and_leading() {
        let mut interpreter = Interpreter::new(800.0, Default::default());
        interpreter.execute("BT", &[]);
        interpreter.execute("Tf", &[Object::Name(b"F1".to_vec()), Object::Integer(10)]);
        interpreter.execute("TL", &ops(&[12.0]));
        interpreter.execute("Td", &ops(&[60.0, 700.0]));
        interpreter.execute("Tj", &[Object::string_literal("Rated")]);
        interpreter.execute("T*", &[]);
        interpreter.execute("Tj", &[Object::string_literal("input")]);
        interpreter.execute("ET", &[]);

        let fragments = &interpreter.out.fragments;
        assert_eq!(fragments.len(), 2);
        assert!((fragments[0].x - 60.0).abs() < 1e-6);
        assert!((fragments[0].baseline - 100.0).abs() < 1e-6);
        assert!((fragments[1].baseline - 112.0).abs() < 1e-6);
    }

    #[test]
    fn fragment_text_breaks_lines_on_baseline_change() {
        let fragment = |x: f64, baseline: f64, text: &str| TextFragment {
            x,
            baseline,
            size: 10.0,
            text: text.to_string(),
        };
        let text = fragments_text(&[
            fragment(10.0, 100.0, "OVERVIEW"),
            fragment(60.0, 100.0, "OF"),
            fragment(10.0, 120.0, "next"),
        ]);
        assert_eq!(text, "OVERVIEW OF\nnext");
    }
}
