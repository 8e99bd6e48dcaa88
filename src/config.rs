use std::time::Duration;

use crate::eligibility::EligibilityPolicy;
use crate::error::TranslateError;
use crate::models::{
    DEFAULT_API_VERSION, DEFAULT_DEPLOYMENT, DEFAULT_MAX_CONCURRENCY, DEFAULT_TIMEOUT_SECS,
};

pub const ENV_ENDPOINT: &str = "AZURE_OPENAI_ENDPOINT";
pub const ENV_API_KEY: &str = "AZURE_OPENAI_API_KEY";
pub const ENV_DEPLOYMENT: &str = "AZURE_OPENAI_DEPLOYMENT";
pub const ENV_API_VERSION: &str = "AZURE_OPENAI_API_VERSION";
pub const ENV_MAX_CONCURRENCY: &str = "TRANSLATE_MAX_CONCURRENCY";
pub const ENV_TIMEOUT_SECS: &str = "TRANSLATE_TIMEOUT_SECS";

/// Upstream endpoint plus the engine's tuning knobs.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslatorConfig {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub deployment: String,
    pub api_version: String,
    pub max_concurrency: usize,
    /// `None` disables the per-call timeout.
    pub call_timeout: Option<Duration>,
    pub policy: EligibilityPolicy,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            deployment: DEFAULT_DEPLOYMENT.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            call_timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            policy: EligibilityPolicy::default(),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

impl TranslatorConfig {
    /// Builds a config from a variable lookup. Malformed numeric values fall
    /// back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let max_concurrency = non_empty(lookup(ENV_MAX_CONCURRENCY))
            .and_then(|value| value.parse::<usize>().ok())
            .filter(|value| *value > 0)
            .unwrap_or(defaults.max_concurrency);
        let call_timeout = match non_empty(lookup(ENV_TIMEOUT_SECS))
            .and_then(|value| value.parse::<u64>().ok())
        {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => defaults.call_timeout,
        };

        Self {
            endpoint: non_empty(lookup(ENV_ENDPOINT)),
            api_key: non_empty(lookup(ENV_API_KEY)),
            deployment: non_empty(lookup(ENV_DEPLOYMENT)).unwrap_or(defaults.deployment),
            api_version: non_empty(lookup(ENV_API_VERSION)).unwrap_or(defaults.api_version),
            max_concurrency,
            call_timeout,
            policy: defaults.policy,
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Endpoint and key, or why the backend cannot be built.
    pub fn credentials(&self) -> Result<(&str, &str), TranslateError> {
        let endpoint = self
            .endpoint
            .as_deref()
            .ok_or_else(|| TranslateError::Unconfigured(format!("{ENV_ENDPOINT} is not set")))?;
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| TranslateError::Unconfigured(format!("{ENV_API_KEY} is not set")))?;
        Ok((endpoint, api_key))
    }
}
