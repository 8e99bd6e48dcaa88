pub mod backend;
pub mod cache;
pub mod config;
pub mod docx_out;
pub mod eligibility;
pub mod engine;
pub mod error;
pub mod materialize;
pub mod models;
pub mod pipeline;
pub mod prompt;
pub mod wordml;

pub use backend::{AzureOpenAiBackend, TranslationBackend};
pub use config::TranslatorConfig;
pub use engine::TranslationEngine;
pub use error::{PipelineError, TranslateError};
pub use materialize::{TableSink, materialize};
pub use pipeline::{RunOptions, run};
