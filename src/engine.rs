use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::backend::{AzureOpenAiBackend, TranslationBackend};
use crate::cache::{TranslationCache, cache_key};
use crate::config::TranslatorConfig;
use crate::eligibility::EligibilityPolicy;
use crate::error::TranslateError;
use crate::models::{DEFAULT_MAX_CONCURRENCY, DEFAULT_TIMEOUT_SECS};

/// Cached, bounded-concurrency translation service.
///
/// An engine without a backend is disabled: every call returns its input
/// unchanged and [`TranslationEngine::is_enabled`] reports `false`.
#[derive(Clone)]
pub struct TranslationEngine {
    backend: Option<Arc<dyn TranslationBackend>>,
    cache: Arc<TranslationCache>,
    policy: EligibilityPolicy,
    max_concurrency: usize,
    call_timeout: Option<Duration>,
}

impl std::fmt::Debug for TranslationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslationEngine")
            .field("backend", &self.backend.as_ref().map(|backend| backend.name().to_string()))
            .field("cached", &self.cache.len())
            .field("policy", &self.policy)
            .field("max_concurrency", &self.max_concurrency)
            .field("call_timeout", &self.call_timeout)
            .finish()
    }
}

impl TranslationEngine {
    pub fn new(backend: Arc<dyn TranslationBackend>) -> Self {
        Self {
            backend: Some(backend),
            ..Self::disabled()
        }
    }

    pub fn disabled() -> Self {
        Self {
            backend: None,
            cache: Arc::new(TranslationCache::new()),
            policy: EligibilityPolicy::default(),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            call_timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
        }
    }

    /// Builds the Azure OpenAI backed engine, or a disabled engine when the
    /// backend cannot be configured.
    pub fn from_config(config: &TranslatorConfig) -> Self {
        let engine = match AzureOpenAiBackend::new(config) {
            Ok(backend) => {
                info!(deployment = %config.deployment, "translation enabled");
                Self::new(Arc::new(backend))
            }
            Err(error) => {
                warn!(%error, "translation disabled; cell text passes through unchanged");
                Self::disabled()
            }
        };
        engine
            .with_policy(config.policy)
            .with_max_concurrency(config.max_concurrency)
            .with_call_timeout(config.call_timeout)
    }

    #[must_use]
    pub fn with_policy(mut self, policy: EligibilityPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Zero is treated as one.
    #[must_use]
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    #[must_use]
    pub fn with_call_timeout(mut self, call_timeout: Option<Duration>) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    #[must_use]
    pub fn with_cache(mut self, cache: Arc<TranslationCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    pub fn policy(&self) -> &EligibilityPolicy {
        &self.policy
    }

    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    async fn call(
        &self,
        backend: &dyn TranslationBackend,
        text: &str,
    ) -> Result<String, TranslateError> {
        match self.call_timeout {
            Some(limit) => tokio::time::timeout(limit, backend.translate(text))
                .await
                .map_err(|_| {
                    TranslateError::Timeout(format!("no response within {} ms", limit.as_millis()))
                })?,
            None => backend.translate(text).await,
        }
    }

    /// Resolves one eligible text through its cache slot. Failures drop
    /// the empty slot and fall back to the source text.
    async fn dispatch(&self, backend: &dyn TranslationBackend, text: &str) -> String {
        let slot = self.cache.slot(text);
        let key = cache_key(text);
        let outcome = slot.get_or_try_init(|| self.call(backend, key)).await.cloned();
        drop(slot);
        match outcome {
            Ok(translated) => translated,
            Err(error) => {
                self.cache.evict_pending(text);
                warn!(
                    code = error.code(),
                    retryable = error.is_retryable(),
                    %error,
                    "translation failed; keeping source text"
                );
                text.to_string()
            }
        }
    }

    /// Translates one text, or returns it unchanged when the engine is
    /// disabled, the text is ineligible or the upstream call fails.
    pub async fn translate(&self, text: &str) -> String {
        let Some(backend) = &self.backend else {
            return text.to_string();
        };
        if !self.policy.admits(text) {
            return text.to_string();
        }
        if let Some(hit) = self.cache.get(text) {
            return hit;
        }
        self.dispatch(backend.as_ref(), text).await
    }

    /// Translates a list of texts. Output slot `i` always holds the result
    /// for input slot `i`. Cache hits and ineligible texts are resolved
    /// before dispatch; each distinct remaining key is sent once, with at
    /// most `max_concurrency` calls in flight.
    pub async fn translate_batch(&self, texts: &[String]) -> Vec<String> {
        let Some(backend) = &self.backend else {
            return texts.to_vec();
        };

        let mut results: Vec<Option<String>> = vec![None; texts.len()];
        let mut pending: Vec<(usize, String)> = Vec::new();
        let mut first_by_key: HashMap<&str, usize> = HashMap::new();
        let mut duplicates: Vec<(usize, usize)> = Vec::new();

        for (index, text) in texts.iter().enumerate() {
            if !self.policy.admits(text) {
                results[index] = Some(text.clone());
            } else if let Some(hit) = self.cache.get(text) {
                results[index] = Some(hit);
            } else if let Some(&first) = first_by_key.get(cache_key(text)) {
                duplicates.push((index, first));
            } else {
                first_by_key.insert(cache_key(text), index);
                pending.push((index, text.clone()));
            }
        }

        debug!(
            total = texts.len(),
            dispatched = pending.len(),
            duplicates = duplicates.len(),
            "translating batch"
        );

        let translated = stream::iter(pending)
            .map(|(index, text)| async move { (index, self.dispatch(backend.as_ref(), &text).await) })
            .buffer_unordered(self.max_concurrency)
            .collect::<Vec<_>>()
            .await;
        for (index, text) in translated {
            results[index] = Some(text);
        }

        for (index, first) in duplicates {
            let text = &texts[index];
            results[index] = Some(self.cache.get(text).unwrap_or_else(|| {
                debug!(index, first, "duplicate of a failed item keeps source text");
                text.clone()
            }));
        }

        results
            .into_iter()
            .zip(texts)
            .map(|(result, text)| result.unwrap_or_else(|| text.clone()))
            .collect()
    }

    /// Re-sends only fields whose value is still eligible and returns the
    /// updated field set. A clean field set comes back unchanged.
    pub async fn final_review(&self, fields: &BTreeMap<String, String>) -> BTreeMap<String, String> {
        if !self.is_enabled() {
            return fields.clone();
        }

        let residual = fields
            .iter()
            .filter(|(_, value)| self.policy.admits(value))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect::<Vec<_>>();
        if residual.is_empty() {
            return fields.clone();
        }

        info!(fields = residual.len(), "final review re-translating residual fields");
        let texts = residual.iter().map(|(_, value)| value.clone()).collect::<Vec<_>>();
        let translated = self.translate_batch(&texts).await;

        let mut reviewed = fields.clone();
        for ((name, _), value) in residual.into_iter().zip(translated) {
            reviewed.insert(name, value);
        }
        reviewed
    }
}
