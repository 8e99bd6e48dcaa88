/// Boilerplate phrases that mark a small table as page furniture. A
/// signature matches when every phrase appears in the table's first row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderSignature {
    pub phrases: Vec<String>,
}

impl HeaderSignature {
    #[must_use]
    pub fn new<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            phrases: phrases.into_iter().map(Into::into).collect(),
        }
    }

    fn matches(&self, text: &str) -> bool {
        !self.phrases.is_empty() && self.phrases.iter().all(|phrase| text.contains(phrase.as_str()))
    }
}

#[must_use]
pub fn default_header_signatures() -> Vec<HeaderSignature> {
    vec![
        HeaderSignature::new(["IEC 62368-1"]),
        HeaderSignature::new(["Requirement + Test"]),
        HeaderSignature::new(["Result - Remark"]),
        HeaderSignature::new(["Clause", "Verdict"]),
    ]
}

/// True for tables of at most `max_rows` rows whose first row carries one of
/// the recurring header signatures.
pub(crate) fn is_page_furniture(
    rows: &[Vec<String>],
    signatures: &[HeaderSignature],
    max_rows: usize,
) -> bool {
    if rows.is_empty() || rows.len() > max_rows {
        return false;
    }

    let first_row = rows[0].join(" ");
    signatures.iter().any(|signature| signature.matches(&first_row))
}
