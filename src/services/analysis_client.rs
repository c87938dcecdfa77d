// src/services/analysis_client.rs
use crate::errors::FigyError;
use crate::models::AnalysisResult;
use crate::services::backoff::BackoffPolicy;
use crate::services::response_parser;
use log::{debug, warn};
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

const OPENAI_API_BASE: &str = "https://api.openai.com/v1/chat/completions";
const PROJECT_API_BASE: &str = "https://api.codeium.com/v1/chat/completions";
const MODEL: &str = "gpt-4-vision-preview";
const MAX_TOKENS: u32 = 4096;
const DEFAULT_RETRY_AFTER_SECS: u64 = 3600;

const ANALYSIS_PROMPT: &str = r#"
Analyze this UI design image and generate a comprehensive JSON representation.
Include a layout object with grid specifications and an array of UI elements.
Each element should have type, position, dimensions, and styling properties.

JSON Schema:
{
  "layout": {
    "columns": number,
    "rows": number,
    "gridSpacing": number,
    "margin": number
  },
  "elements": [
    {
      "type": "rectangle|text|button|image|frame",
      "x": number,
      "y": number,
      "width": number,
      "height": number,
      "text": string,
      "style": {
        "color": string (hex),
        "fontSize": number
      }
    }
  ]
}

Respond with the JSON object only, no surrounding prose.
"#;

/// Configuration for the analysis client. Resolved by the caller
/// (environment, plugin settings) and injected at construction; the
/// client itself never reads ambient process state.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_key: String,
    pub max_retries: u32,
    pub base_retry_delay_ms: u64,
    pub max_retry_delay_ms: u64,
    pub request_timeout_secs: u64,
    /// Substring allow-list for status-less transport failures that are
    /// worth retrying (connection/timeout class). Matched
    /// case-insensitively against the transport error message.
    pub retryable_network_errors: Vec<String>,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            max_retries: 3,
            base_retry_delay_ms: 1000,
            max_retry_delay_ms: 5000,
            request_timeout_secs: 30,
            retryable_network_errors: vec![
                "connection".to_string(),
                "timeout".to_string(),
                "timed out".to_string(),
                "reset".to_string(),
            ],
        }
    }
}

/// Client for the vision completion endpoint: builds the multimodal
/// request, classifies failures, retries server errors with backoff and
/// hands successful responses to the parser.
#[derive(Debug)]
pub struct AnalysisClient {
    config: ClientConfig,
    base_url: String,
    http: Client,
    backoff: BackoffPolicy,
}

impl AnalysisClient {
    /// Fails fast on a missing or malformed credential. The key prefix
    /// selects the upstream vendor: project-scoped keys (`sk-proj-`)
    /// route to the alternate provider, all other `sk-` keys to OpenAI.
    pub fn new(config: ClientConfig) -> Result<Self, FigyError> {
        let key = config.api_key.trim();
        if key.is_empty() {
            return Err(FigyError::Configuration("API key is required".to_string()));
        }
        if !key.starts_with("sk-") {
            return Err(FigyError::Configuration(
                "Invalid API key format, must start with sk-".to_string(),
            ));
        }

        let base_url = if key.starts_with("sk-proj-") {
            PROJECT_API_BASE.to_string()
        } else {
            OPENAI_API_BASE.to_string()
        };

        Self::with_base_url(config, base_url)
    }

    /// Same as [`AnalysisClient::new`] but with an explicit endpoint,
    /// bypassing vendor routing. Used by tests against a mock server.
    pub fn with_base_url(config: ClientConfig, base_url: String) -> Result<Self, FigyError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| FigyError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        let backoff = BackoffPolicy::new(config.base_retry_delay_ms, config.max_retry_delay_ms);

        Ok(Self {
            config,
            base_url,
            http,
            backoff,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// One logical analysis call: validate, POST, classify, retry
    /// server errors up to `max_retries`, parse on success. Retries are
    /// strictly sequential; each awaits the computed backoff delay.
    pub async fn analyze(&self, image: &str) -> Result<AnalysisResult, FigyError> {
        if image.trim().is_empty() {
            return Err(FigyError::InvalidInput("Image payload is empty".to_string()));
        }

        let body = json!({
            "model": MODEL,
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": ANALYSIS_PROMPT },
                    { "type": "image_url", "image_url": { "url": image_url_for(image) } }
                ]
            }],
            "max_tokens": MAX_TOKENS
        });

        let mut attempt: u32 = 0;
        loop {
            let response = self
                .http
                .post(&self.base_url)
                .header("Authorization", format!("Bearer {}", self.config.api_key.trim()))
                .json(&body)
                .send()
                .await;

            let response = match response {
                Ok(response) => response,
                Err(e) => {
                    let message = e.to_string();
                    if !self.is_retryable_network_error(&message) {
                        return Err(FigyError::Network(message));
                    }
                    if attempt >= self.config.max_retries {
                        return Err(FigyError::RetryExhausted {
                            attempts: attempt + 1,
                            message,
                        });
                    }
                    self.wait_before_retry(attempt, &message).await;
                    attempt += 1;
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 401 {
                return Err(FigyError::Unauthorized(
                    "Invalid API key or unauthorized access".to_string(),
                ));
            }

            if status.as_u16() == 404 {
                return Err(FigyError::NotFound(
                    "API endpoint not found, check that the model is available for this account"
                        .to_string(),
                ));
            }

            if status.as_u16() == 429 {
                // Terminal per call: surface the server-suggested wait
                // to the caller instead of auto-retrying.
                let retry_after_secs = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
                return Err(FigyError::RateLimited { retry_after_secs });
            }

            if status.is_server_error() {
                let message = format!("Upstream returned {}", status);
                if attempt >= self.config.max_retries {
                    return Err(FigyError::RetryExhausted {
                        attempts: attempt + 1,
                        message,
                    });
                }
                self.wait_before_retry(attempt, &message).await;
                attempt += 1;
                continue;
            }

            if !status.is_success() {
                return Err(FigyError::Network(format!(
                    "Unexpected upstream status {}",
                    status
                )));
            }

            let payload: serde_json::Value = response.json().await.map_err(|e| {
                FigyError::MalformedResponse(format!("Failed to read upstream response: {}", e))
            })?;

            let content = payload["choices"][0]["message"]["content"]
                .as_str()
                .unwrap_or("");
            if content.trim().is_empty() {
                return Err(FigyError::MalformedResponse(
                    "No content in model response".to_string(),
                ));
            }

            debug!("Model returned {} bytes of content", content.len());
            return response_parser::parse(content);
        }
    }

    async fn wait_before_retry(&self, attempt: u32, reason: &str) {
        let delay = self.backoff.delay(attempt);
        warn!(
            "Attempt {} failed ({}), retrying in {}ms",
            attempt + 1,
            reason,
            delay.as_millis()
        );
        tokio::time::sleep(delay).await;
    }

    fn is_retryable_network_error(&self, message: &str) -> bool {
        let message = message.to_lowercase();
        self.config
            .retryable_network_errors
            .iter()
            .any(|needle| message.contains(&needle.to_lowercase()))
    }
}

/// Data URLs pass through untouched; a raw base64 payload gets wrapped
/// the way the completion endpoint expects.
fn image_url_for(image: &str) -> String {
    if image.starts_with("data:") {
        image.to_string()
    } else {
        format!("data:image/jpeg;base64,{}", image)
    }
}
