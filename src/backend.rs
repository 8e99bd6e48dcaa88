use async_trait::async_trait;
use tracing::debug;
use url::Url;

use crate::config::TranslatorConfig;
use crate::error::TranslateError;
use crate::models::{ChatMessage, ChatRequest, ChatResponse, MAX_COMPLETION_TOKENS, TEMPERATURE};
use crate::prompt::{SYSTEM_PROMPT, clean_completion, user_message};

/// One upstream text-completion call per source text.
#[async_trait]
pub trait TranslationBackend: Send + Sync {
    async fn translate(&self, text: &str) -> Result<String, TranslateError>;

    fn name(&self) -> &str;
}

/// Azure OpenAI chat-completions deployment.
#[derive(Debug, Clone)]
pub struct AzureOpenAiBackend {
    client: reqwest::Client,
    url: Url,
    api_key: String,
    deployment: String,
}

fn completions_url(endpoint: &str, deployment: &str, api_version: &str) -> Result<Url, TranslateError> {
    let mut url = Url::parse(&format!(
        "{}/openai/deployments/{}/chat/completions",
        endpoint.trim_end_matches('/'),
        urlencoding::encode(deployment)
    ))?;
    url.query_pairs_mut().append_pair("api-version", api_version);
    Ok(url)
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

impl AzureOpenAiBackend {
    /// # Errors
    /// Returns [`TranslateError::Unconfigured`] when the endpoint or key is
    /// missing or the endpoint is not a valid URL.
    pub fn new(config: &TranslatorConfig) -> Result<Self, TranslateError> {
        let (endpoint, api_key) = config.credentials()?;
        let url = completions_url(endpoint, &config.deployment, &config.api_version)?;
        let client = reqwest::Client::builder()
            .build()
            .map_err(|error| TranslateError::Unconfigured(error.to_string()))?;

        Ok(Self {
            client,
            url,
            api_key: api_key.to_string(),
            deployment: config.deployment.clone(),
        })
    }
}

#[async_trait]
impl TranslationBackend for AzureOpenAiBackend {
    async fn translate(&self, text: &str) -> Result<String, TranslateError> {
        let request = ChatRequest {
            messages: vec![
                ChatMessage::system(SYSTEM_PROMPT.as_str()),
                ChatMessage::user(user_message(text)),
            ],
            max_completion_tokens: MAX_COMPLETION_TOKENS,
            temperature: TEMPERATURE,
        };

        let response = self
            .client
            .post(self.url.clone())
            .header("api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TranslateError::Status {
                status: status.as_u16(),
                message: truncate(&body, 200),
            });
        }

        let body = response
            .json::<ChatResponse>()
            .await
            .map_err(|error| TranslateError::Malformed(error.to_string()))?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| TranslateError::Malformed("response has no message content".to_string()))?;

        debug!(deployment = %self.deployment, chars = content.chars().count(), "completion received");
        clean_completion(&content)
    }

    fn name(&self) -> &str {
        &self.deployment
    }
}

#[cfg(test)]
mod tests {
    use super::completions_url;

    #[test]
    fn builds_deployment_url_with_api_version() {
        let url = completions_url("https://example.openai.azure.com/", "gpt 4o", "2024-12-01-preview")
            .expect("url should parse");
        assert_eq!(
            url.as_str(),
            "https://example.openai.azure.com/openai/deployments/gpt%204o/chat/completions?api-version=2024-12-01-preview"
        );
    }

    #[test]
    fn rejects_relative_endpoint() {
        assert!(completions_url("not a url", "gpt-4o", "v").is_err());
    }
}
