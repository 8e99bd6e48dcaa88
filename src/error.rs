use std::fmt::{Display, Formatter};

use pdf_table_geometry::ExtractError;

/// Failure of a single upstream translation call. None of these abort a
/// batch; the caller falls back to the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslateError {
    Unconfigured(String),
    Http(String),
    Status { status: u16, message: String },
    Malformed(String),
    Timeout(String),
}

impl TranslateError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unconfigured(_) => "unconfigured",
            Self::Http(_) => "http_error",
            Self::Status { .. } => "upstream_status",
            Self::Malformed(_) => "malformed_response",
            Self::Timeout(_) => "timeout",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Unconfigured(message)
            | Self::Http(message)
            | Self::Malformed(message)
            | Self::Timeout(message)
            | Self::Status { message, .. } => message,
        }
    }

    /// Transient failures that a later run may succeed on.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) | Self::Timeout(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Unconfigured(_) | Self::Malformed(_) => false,
        }
    }
}

impl Display for TranslateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Status { status, message } => {
                write!(f, "{}: {status} {message}", self.code())
            }
            _ => write!(f, "{}: {}", self.code(), self.message()),
        }
    }
}

impl std::error::Error for TranslateError {}

impl From<reqwest::Error> for TranslateError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout(error.to_string())
        } else if error.is_decode() {
            Self::Malformed(error.to_string())
        } else {
            Self::Http(error.to_string())
        }
    }
}

impl From<url::ParseError> for TranslateError {
    fn from(error: url::ParseError) -> Self {
        Self::Unconfigured(error.to_string())
    }
}

#[derive(Debug)]
pub enum PipelineError {
    Extract(String),
    Io(String),
    Zip(String),
    Xml(String),
    Template(String),
    Json(String),
}

impl PipelineError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Extract(_) => "extract_error",
            Self::Io(_) => "io_error",
            Self::Zip(_) => "zip_error",
            Self::Xml(_) => "xml_error",
            Self::Template(_) => "template_error",
            Self::Json(_) => "json_error",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Extract(message)
            | Self::Io(message)
            | Self::Zip(message)
            | Self::Xml(message)
            | Self::Template(message)
            | Self::Json(message) => message,
        }
    }
}

impl Display for PipelineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

impl std::error::Error for PipelineError {}

impl From<ExtractError> for PipelineError {
    fn from(error: ExtractError) -> Self {
        Self::Extract(error.to_string())
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<zip::result::ZipError> for PipelineError {
    fn from(error: zip::result::ZipError) -> Self {
        Self::Zip(error.to_string())
    }
}

impl From<quick_xml::Error> for PipelineError {
    fn from(error: quick_xml::Error) -> Self {
        Self::Xml(error.to_string())
    }
}

impl From<std::string::FromUtf8Error> for PipelineError {
    fn from(error: std::string::FromUtf8Error) -> Self {
        Self::Template(error.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(error: serde_json::Error) -> Self {
        Self::Json(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::TranslateError;

    #[test]
    fn retryable_covers_transport_and_server_failures() {
        assert!(TranslateError::Timeout("slow".to_string()).is_retryable());
        assert!(TranslateError::Http("reset".to_string()).is_retryable());
        assert!(
            TranslateError::Status {
                status: 503,
                message: "busy".to_string()
            }
            .is_retryable()
        );
        assert!(
            !TranslateError::Status {
                status: 401,
                message: "denied".to_string()
            }
            .is_retryable()
        );
        assert!(!TranslateError::Malformed("empty".to_string()).is_retryable());
    }

    #[test]
    fn display_includes_code() {
        let error = TranslateError::Status {
            status: 429,
            message: "slow down".to_string(),
        };
        assert_eq!(error.to_string(), "upstream_status: 429 slow down");
    }
}
