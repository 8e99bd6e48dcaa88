use chrono::{DateTime, Utc};
use pdf_table_geometry::{ExtractWarning, PageRange};
use serde::{Deserialize, Serialize};

pub const DEFAULT_DEPLOYMENT: &str = "gpt-4o";
pub const DEFAULT_API_VERSION: &str = "2024-12-01-preview";
pub const DEFAULT_MAX_CONCURRENCY: usize = 5;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const MAX_COMPLETION_TOKENS: u32 = 500;
pub const TEMPERATURE: f32 = 0.1;

/// 0-based index of the template table after which tables are inserted.
pub const DEFAULT_TEMPLATE_TABLE_INDEX: usize = 3;
pub const SHADING_FILL: &str = "D9D9D9";
pub const TABLE_EAST_ASIA_FONT: &str = "標楷體";
/// Run size in half-points (10 pt).
pub const TABLE_FONT_HALF_POINTS: u32 = 20;
/// Usable page width in twentieths of a point for an A4 page with 2 cm margins.
pub const TABLE_WIDTH_TWIPS: u32 = 9638;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub max_completion_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatResponse {
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatChoice {
    pub message: ChatResponseMessage,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatResponseMessage {
    pub content: Option<String>,
}

/// Summary of one `translate` run.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RunReport {
    pub input: String,
    pub output: String,
    pub range: PageRange,
    pub pages_processed: Vec<u32>,
    pub table_count: usize,
    pub discarded_furniture: usize,
    pub cells_sent: usize,
    pub cells_changed: usize,
    pub review_fixes: usize,
    pub translation_enabled: bool,
    pub warnings: Vec<ExtractWarning>,
    pub finished_at: DateTime<Utc>,
}
