use serde::Serialize;

pub const DEFAULT_START_MARKER: &str = "OVERVIEW OF ENERGY SOURCES AND SAFEGUARDS";
pub const DEFAULT_END_MARKERS: [&str; 2] = ["ATTACHMENT TO TEST REPORT", "ATTACHMENTS TO TEST REPORT"];

/// Exact, case-sensitive substrings bounding the pages to process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeMarkers {
    pub start: String,
    pub end: Vec<String>,
}

impl Default for RangeMarkers {
    fn default() -> Self {
        Self {
            start: DEFAULT_START_MARKER.to_string(),
            end: DEFAULT_END_MARKERS.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Half-open, 0-based page index range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRange {
    pub start: usize,
    pub end: usize,
    pub start_found: bool,
    pub end_found: bool,
}

impl PageRange {
    #[must_use]
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        (self.start..self.end).contains(&index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    StartSearch,
    InRange(usize),
}

/// Scans page texts once, in order. The first page containing the start
/// marker opens the range; the first later page containing any end marker
/// closes it (exclusive). A missing start falls back to the first page and
/// a missing end to one past the last page.
#[must_use]
pub fn detect_range<S: AsRef<str>>(pages: &[S], markers: &RangeMarkers) -> PageRange {
    let mut state = ScanState::StartSearch;

    for (index, page) in pages.iter().enumerate() {
        let text = page.as_ref();
        match state {
            ScanState::StartSearch => {
                if text.contains(markers.start.as_str()) {
                    state = ScanState::InRange(index);
                }
            }
            ScanState::InRange(start) => {
                if markers.end.iter().any(|marker| text.contains(marker.as_str())) {
                    return PageRange {
                        start,
                        end: index,
                        start_found: true,
                        end_found: true,
                    };
                }
            }
        }
    }

    match state {
        ScanState::StartSearch => PageRange {
            start: 0,
            end: pages.len(),
            start_found: false,
            end_found: false,
        },
        ScanState::InRange(start) => PageRange {
            start,
            end: pages.len(),
            start_found: true,
            end_found: false,
        },
    }
}
