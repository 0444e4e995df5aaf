//! OpenAI-compatible chat-completions grader.

use crate::client::GraderClient;
use crate::error::{GraderError, GraderResult};
use crate::retry::{with_retry, RetryConfig};
use async_trait::async_trait;
use gavel_core::ChatMessage;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Immutable grader configuration.
///
/// Credentials and model identity are threaded through this object rather
/// than read from the environment inside the core; `from_env` exists only as
/// a convenience at the construction edge.
#[derive(Debug, Clone)]
pub struct GraderConfig {
    /// Bearer token for the service.
    pub api_key: String,
    /// Model identifier, e.g. `gpt-4-turbo-preview`.
    pub model: String,
    /// API root; defaults to the OpenAI endpoint.
    pub base_url: String,
    /// Sampling temperature.
    pub temperature: f64,
    /// Optional completion length cap.
    pub max_tokens: Option<u32>,
    /// Request timeout.
    pub timeout: Duration,
    /// Retry ceiling and backoff curve.
    pub retry: RetryConfig,
}

impl GraderConfig {
    /// Create a config with an explicit key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: 0.7,
            max_tokens: None,
            timeout: Duration::from_secs(60),
            retry: RetryConfig::default(),
        }
    }

    /// Read the key from `OPENAI_API_KEY`.
    pub fn from_env(model: impl Into<String>) -> GraderResult<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| GraderError::auth("OPENAI_API_KEY is not set"))?;
        Ok(Self::new(api_key, model))
    }

    /// Override the API root (self-hosted or compatible gateways).
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the sampling temperature.
    #[must_use]
    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// Cap the completion length.
    #[must_use]
    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry configuration.
    #[must_use]
    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

/// Grader speaking the `/chat/completions` wire format.
#[derive(Debug)]
pub struct ChatGrader {
    config: GraderConfig,
    client: Client,
}

impl ChatGrader {
    /// Build a grader from configuration.
    pub fn new(config: GraderConfig) -> GraderResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(GraderError::auth("API key must not be empty"));
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GraderError::Other(e.into()))?;
        Ok(Self { config, client })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    fn headers(&self) -> GraderResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", self.config.api_key);
        let value = HeaderValue::from_str(&auth)
            .map_err(|_| GraderError::auth("API key contains invalid header characters"))?;
        headers.insert(AUTHORIZATION, value);
        Ok(headers)
    }

    async fn send_once(&self, body: &serde_json::Value) -> GraderResult<String> {
        debug!(model = %self.config.model, "sending grader request");

        let response = self
            .client
            .post(self.endpoint())
            .headers(self.headers()?)
            .json(body)
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        let response = check_status(response).await?;
        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| GraderError::transient(format!("malformed response body: {e}")))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(GraderError::Empty);
        }
        Ok(text)
    }
}

#[async_trait]
impl GraderClient for ChatGrader {
    async fn complete(&self, messages: &[ChatMessage]) -> GraderResult<String> {
        if messages.is_empty() {
            return Err(GraderError::invalid_input("no messages to send"));
        }

        let body = serde_json::json!({
            "model": self.config.model,
            "messages": messages,
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
        });

        with_retry(&self.config.retry, || self.send_once(&body)).await
    }

    fn name(&self) -> &str {
        &self.config.model
    }
}

/// Map connection-level failures onto the taxonomy.
fn classify_reqwest_error(err: reqwest::Error) -> GraderError {
    if err.is_timeout() {
        GraderError::transient("request timed out")
    } else if err.is_connect() {
        GraderError::transient(format!("connection failed: {err}"))
    } else {
        GraderError::Other(err.into())
    }
}

/// Map HTTP statuses onto the taxonomy.
async fn check_status(response: Response) -> GraderResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = parse_retry_after(&response);
    let body = response.text().await.unwrap_or_default();

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(GraderError::auth(body)),
        StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND | StatusCode::UNPROCESSABLE_ENTITY => {
            Err(GraderError::invalid_input(body))
        }
        StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => {
            Err(GraderError::Transient {
                status: Some(status.as_u16()),
                message: body,
                retry_after,
            })
        }
        s if s.is_server_error() => Err(GraderError::Transient {
            status: Some(s.as_u16()),
            message: body,
            retry_after,
        }),
        s => Err(GraderError::invalid_input(format!("HTTP {s}: {body}"))),
    }
}

fn parse_retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}
