use std::collections::BTreeSet;
use std::str::FromStr;

use crate::header::{HeaderSignature, default_header_signatures};
use crate::range::RangeMarkers;
use crate::shading::ShadingBounds;
use crate::tolerance::Tolerance;

/// Explicit 1-based page list that replaces marker-based range detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSelection {
    pages: BTreeSet<u32>,
}

impl PageSelection {
    #[must_use]
    pub fn contains(&self, page: u32) -> bool {
        self.pages.contains(&page)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

impl FromStr for PageSelection {
    type Err = String;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let mut pages = BTreeSet::new();
        for token in spec.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            if let Some((start, end)) = token.split_once('-') {
                let start: u32 = start
                    .trim()
                    .parse()
                    .map_err(|_| format!("invalid page range start: '{start}'"))?;
                let end: u32 = end
                    .trim()
                    .parse()
                    .map_err(|_| format!("invalid page range end: '{end}'"))?;
                if start == 0 || end == 0 {
                    return Err("pages are 1-based".to_string());
                }
                if end < start {
                    return Err(format!(
                        "invalid range '{token}': end is smaller than start"
                    ));
                }
                pages.extend(start..=end);
            } else {
                let page: u32 = token
                    .parse()
                    .map_err(|_| format!("invalid page number: '{token}'"))?;
                if page == 0 {
                    return Err("pages are 1-based".to_string());
                }
                pages.insert(page);
            }
        }

        if pages.is_empty() {
            return Err("page selection cannot be empty".to_string());
        }

        Ok(Self { pages })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractOptions {
    /// When set, these pages are processed and the markers are ignored.
    pub pages: Option<PageSelection>,
    pub markers: RangeMarkers,
    pub tolerance: Tolerance,
    pub shading: ShadingBounds,
    pub header_signatures: Vec<HeaderSignature>,
    /// Tables with more rows than this are never treated as page furniture.
    pub furniture_max_rows: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            pages: None,
            markers: RangeMarkers::default(),
            tolerance: Tolerance::default(),
            shading: ShadingBounds::default(),
            header_signatures: default_header_signatures(),
            furniture_max_rows: 2,
        }
    }
}

impl ExtractOptions {
    /// Rejects option combinations the extractor cannot honour.
    ///
    /// # Errors
    /// Returns a message naming the offending option.
    pub fn validate(&self) -> Result<(), String> {
        if self.shading.lower >= self.shading.upper {
            return Err("shading lower bound must be below the upper bound".to_string());
        }
        if self.markers.start.is_empty() {
            return Err("start marker cannot be empty".to_string());
        }
        if self.markers.end.iter().any(String::is_empty) {
            return Err("end markers cannot be empty".to_string());
        }
        let tolerance = &self.tolerance;
        if [
            tolerance.shading,
            tolerance.snap,
            tolerance.join,
            tolerance.intersection,
            tolerance.min_edge_length,
        ]
        .iter()
        .any(|value| *value < 0.0 || !value.is_finite())
        {
            return Err("tolerances must be finite and non-negative".to_string());
        }
        Ok(())
    }
}
