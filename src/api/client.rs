//! HTTP client for the chat completion API

use async_trait::async_trait;

use crate::api::error::ApiError;
use crate::api::stream::DeltaStream;
use crate::api::{ChatMessage, ChatRequest, ChatResponse, ModelInfo, ModelsResponse};
use crate::core::constants::{
    BASE_URL_ENV, DEFAULT_BASE_URL, DEFAULT_TEMPERATURE, MAX_COMPLETION_TOKENS,
};

/// Chat-completion seam consumed by the conversation workflow.
///
/// Implementors encapsulate transport and provider details; the workflow
/// stays decoupled from any particular HTTP stack.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Send the ordered history and return the assistant's full reply text.
    async fn send_message(
        &self,
        model_id: &str,
        history: Vec<ChatMessage>,
    ) -> Result<String, ApiError>;
}

/// Client bound to one API key for its lifetime.
///
/// A changed key requires a new instance; the key is never mutated in place.
pub struct ProviderClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl ProviderClient {
    /// Build a client against the default endpoint, honoring the
    /// `MISTRAL_BASE_URL` override.
    pub fn new(api_key: impl Into<String>) -> Self {
        let base_url =
            std::env::var(BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::with_base_url(api_key, &base_url)
    }

    pub fn with_base_url(api_key: impl Into<String>, base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: normalize_base_url(base_url),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// List the models the key can access, in provider order.
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, ApiError> {
        let response = self
            .http
            .get(endpoint_url(&self.base_url, "models"))
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await?;

        let response = check_status(response).await?;
        let models = response.json::<ModelsResponse>().await?;
        Ok(models.data)
    }

    /// One-shot completion: a single request, a single parsed choice.
    pub async fn send_unary(
        &self,
        model_id: &str,
        history: Vec<ChatMessage>,
    ) -> Result<String, ApiError> {
        let response = self.post_completion(model_id, history, false).await?;
        let status = response.status();
        let completion = response.json::<ChatResponse>().await?;
        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(ApiError::Provider {
                status,
                message: "completion response contained no choices".to_string(),
            })
    }

    /// Request incremental delivery; frames decode into a forward-only
    /// sequence of content deltas.
    pub async fn open_stream(
        &self,
        model_id: &str,
        history: Vec<ChatMessage>,
    ) -> Result<DeltaStream, ApiError> {
        let response = self.post_completion(model_id, history, true).await?;
        Ok(DeltaStream::new(response))
    }

    async fn post_completion(
        &self,
        model_id: &str,
        history: Vec<ChatMessage>,
        stream: bool,
    ) -> Result<reqwest::Response, ApiError> {
        let request = ChatRequest {
            model: model_id.to_string(),
            messages: history,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: MAX_COMPLETION_TOKENS,
            stream,
        };

        let response = self
            .http
            .post(endpoint_url(&self.base_url, "chat/completions"))
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        check_status(response).await
    }
}

#[async_trait]
impl ChatClient for ProviderClient {
    async fn send_message(
        &self,
        model_id: &str,
        history: Vec<ChatMessage>,
    ) -> Result<String, ApiError> {
        self.send_unary(model_id, history).await
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::from_failure(status, &body))
}

/// Trailing slashes are stripped so endpoint joins never produce `//`.
fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

fn endpoint_url(base_url: &str, endpoint: &str) -> String {
    format!(
        "{}/{}",
        normalize_base_url(base_url),
        endpoint.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized_on_construction() {
        let client = ProviderClient::with_base_url("sk-test", "https://api.example.com/v1///");
        assert_eq!(client.base_url(), "https://api.example.com/v1");
    }

    #[test]
    fn endpoint_url_joins_without_double_slashes() {
        assert_eq!(
            endpoint_url("https://api.example.com/v1/", "chat/completions"),
            "https://api.example.com/v1/chat/completions"
        );
        assert_eq!(
            endpoint_url("https://api.example.com/v1", "/models"),
            "https://api.example.com/v1/models"
        );
    }

    #[test]
    fn normalize_base_url_strips_trailing_slashes() {
        assert_eq!(
            normalize_base_url("https://api.example.com/v1"),
            "https://api.example.com/v1"
        );
        assert_eq!(
            normalize_base_url("https://api.example.com/v1/"),
            "https://api.example.com/v1"
        );
        assert_eq!(normalize_base_url(""), "");
    }
}
