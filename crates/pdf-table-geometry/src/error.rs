use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("not a readable PDF: {0}")]
    PdfLoad(#[from] lopdf::Error),

    #[error("PDF is encrypted; decrypt it before extracting tables")]
    Encrypted,

    #[error("PDF has no pages")]
    EmptyDocument,

    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error("page selection matches no page of the document")]
    NoPagesSelected,
}
