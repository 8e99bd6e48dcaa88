use once_cell::sync::Lazy;
use pdf_table_geometry::is_cjk;
use regex::Regex;

const UNIT: &str = r"(?:%|°C|℃|°|[kM]?Ω|[kMmµu]?(?:VA|Wh|Hz|V|A|W|J|s|m|g|N|Pa)|mm|cm|dB|K)";

/// One whitespace-separated token of a measurement: an optionally signed
/// number or range with an optional unit, a bare unit, or a symbol run.
static MEASUREMENT_TOKEN: Lazy<Regex> = Lazy::new(|| {
    let number = r"[±+\-~]?\d+(?:[.,]\d+)*(?:[-~/]\d+(?:[.,]\d+)*)?";
    Regex::new(&format!(
        r"^(?:{number}{UNIT}?|{UNIT}|[±%°℃Ω/\-+().,:;~×]+)$"
    ))
    .unwrap_or_else(|error| panic!("measurement pattern is invalid: {error}"))
});

/// Upper-case standard or clause identifiers such as `IEC 62368-1`.
static STANDARD_CODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Z]+(?:[ /][A-Z]+)*[\s.]*\d+(?:[-.:/]\d+)*$")
        .unwrap_or_else(|error| panic!("standard code pattern is invalid: {error}"))
});

/// Thresholds deciding whether a text still needs translating.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EligibilityPolicy {
    /// Trimmed texts with fewer characters are skipped.
    pub min_chars: usize,
    /// Texts whose share of CJK characters among non-whitespace characters
    /// exceeds this are treated as already translated.
    pub script_ratio_threshold: f64,
}

impl Default for EligibilityPolicy {
    fn default() -> Self {
        Self {
            min_chars: 3,
            script_ratio_threshold: 0.3,
        }
    }
}

/// Pure numbers, units and symbols. Texts with letters only count when
/// they also carry a digit.
fn is_measurement(text: &str) -> bool {
    let has_digit = text.chars().any(|ch| ch.is_ascii_digit());
    let has_letter = text.chars().any(char::is_alphabetic);
    (has_digit || !has_letter)
        && text
            .split_whitespace()
            .all(|token| MEASUREMENT_TOKEN.is_match(token))
}

#[allow(clippy::cast_precision_loss)]
fn script_ratio(text: &str) -> f64 {
    let non_whitespace = text.chars().filter(|ch| !ch.is_whitespace()).count();
    if non_whitespace == 0 {
        return 0.0;
    }
    let cjk = text.chars().filter(|ch| is_cjk(*ch)).count();
    cjk as f64 / non_whitespace as f64
}

impl EligibilityPolicy {
    pub fn admits(&self, text: &str) -> bool {
        let text = text.trim();
        if text.chars().count() < self.min_chars {
            return false;
        }
        if script_ratio(text) > self.script_ratio_threshold {
            return false;
        }
        !(is_measurement(text) || STANDARD_CODE.is_match(text))
    }
}

pub fn should_translate(text: &str) -> bool {
    EligibilityPolicy::default().admits(text)
}

/// Cheap cell-level prefilter: the text has Latin letters and CJK makes up
/// at most 90% of its letters.
#[allow(clippy::cast_precision_loss)]
pub fn needs_translation(text: &str) -> bool {
    if !text.chars().any(|ch| ch.is_ascii_alphabetic()) {
        return false;
    }
    let letters = text.chars().filter(|ch| ch.is_alphabetic()).count();
    let cjk = text.chars().filter(|ch| is_cjk(*ch)).count();
    cjk as f64 <= letters as f64 * 0.9
}
