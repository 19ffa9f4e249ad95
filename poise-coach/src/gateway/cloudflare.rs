/// Cloudflare Workers AI client
///
/// Every model is invoked with `POST {api_base}/accounts/{account_id}/ai/run/{model}`
/// and answers with the standard Cloudflare envelope:
///
/// ```json
/// { "success": true, "result": { ... }, "errors": [], "messages": [] }
/// ```
///
/// | Model kind    | Request body                          | Result field  |
/// |---------------|---------------------------------------|---------------|
/// | Vision        | `{"prompt": "...", "image": [u8, ..]}` | `description` |
/// | Transcription | raw audio bytes                       | `text`        |
/// | Completion    | `{"prompt": "..."}`                    | `response`    |

use super::{CompletionModel, GatewayError, GatewayResult, TranscriptionModel, VisionModel};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Default Cloudflare API base URL
pub const DEFAULT_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default image captioning model
pub const DEFAULT_VISION_MODEL: &str = "@cf/llava-hf/llava-1.5-7b-hf";

/// Default speech-to-text model
pub const DEFAULT_TRANSCRIPTION_MODEL: &str = "@cf/openai/whisper";

/// Default text completion model
pub const DEFAULT_COMPLETION_MODEL: &str = "@cf/meta/llama-3-8b-instruct";

/// Default per-request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Error bodies longer than this are cut before they reach logs or errors
const MAX_ERROR_BODY: usize = 512;

/// Connection settings for Workers AI
#[derive(Debug, Clone)]
pub struct CloudflareConfig {
    /// API base URL, without trailing slash
    pub api_base: String,

    /// Cloudflare account ID
    pub account_id: String,

    /// API token sent as a bearer credential
    pub api_token: String,

    /// Model used by [`VisionModel`]
    pub vision_model: String,

    /// Model used by [`TranscriptionModel`]
    pub transcription_model: String,

    /// Model used by [`CompletionModel`]
    pub completion_model: String,

    /// Upper bound for a single HTTP exchange
    pub request_timeout: Duration,
}

impl CloudflareConfig {
    /// Creates a configuration with the default endpoint and models
    pub fn new(account_id: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            account_id: account_id.into(),
            api_token: api_token.into(),
            vision_model: DEFAULT_VISION_MODEL.to_string(),
            transcription_model: DEFAULT_TRANSCRIPTION_MODEL.to_string(),
            completion_model: DEFAULT_COMPLETION_MODEL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Returns the run URL for `model`
    pub fn model_url(&self, model: &str) -> String {
        format!(
            "{}/accounts/{}/ai/run/{}",
            self.api_base.trim_end_matches('/'),
            self.account_id,
            model
        )
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    result: Option<T>,
    #[serde(default)]
    errors: Vec<EnvelopeMessage>,
}

#[derive(Debug, Deserialize)]
struct EnvelopeMessage {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Serialize)]
struct VisionRequest<'a> {
    prompt: &'a str,
    image: &'a [u8],
}

#[derive(Debug, Deserialize)]
struct VisionResult {
    description: String,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResult {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResult {
    response: String,
}

/// Workers AI client
///
/// Holds one pooled `reqwest::Client`; clone the surrounding `Arc` rather
/// than building a client per request.
#[derive(Debug, Clone)]
pub struct CloudflareClient {
    http_client: reqwest::Client,
    config: CloudflareConfig,
}

impl CloudflareClient {
    /// Creates a client
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Network` if the TLS backend cannot be initialized.
    pub fn new(config: CloudflareConfig) -> GatewayResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            config,
        })
    }

    /// Returns the active configuration
    pub fn config(&self) -> &CloudflareConfig {
        &self.config
    }

    async fn run<T: DeserializeOwned>(
        &self,
        model: &str,
        request: reqwest::RequestBuilder,
    ) -> GatewayResult<T> {
        debug!(model = %model, "Invoking Workers AI model");

        let response = request
            .bearer_auth(&self.config.api_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let mut error_text = response.text().await.unwrap_or_default();
            truncate(&mut error_text, MAX_ERROR_BODY);
            warn!(model = %model, status = status.as_u16(), "Workers AI returned an error status");
            return Err(GatewayError::Status(status.as_u16(), error_text));
        }

        let body = response.bytes().await?;
        let envelope: Envelope<T> = serde_json::from_slice(&body)
            .map_err(|e| GatewayError::Malformed(e.to_string()))?;

        if !envelope.success {
            let reasons = envelope
                .errors
                .iter()
                .map(|e| format!("{} ({})", e.message, e.code))
                .collect::<Vec<_>>()
                .join("; ");
            return Err(GatewayError::Malformed(format!(
                "request was not successful: {}",
                reasons
            )));
        }

        envelope
            .result
            .ok_or_else(|| GatewayError::Malformed("response has no result".to_string()))
    }
}

#[async_trait]
impl VisionModel for CloudflareClient {
    async fn describe_image(&self, prompt: &str, image: &[u8]) -> GatewayResult<String> {
        let model = &self.config.vision_model;
        let request = self
            .http_client
            .post(self.config.model_url(model))
            .json(&VisionRequest { prompt, image });

        let result: VisionResult = self.run(model, request).await?;
        Ok(result.description)
    }
}

#[async_trait]
impl TranscriptionModel for CloudflareClient {
    async fn transcribe(&self, audio: &[u8], content_type: &str) -> GatewayResult<String> {
        let model = &self.config.transcription_model;
        let request = self
            .http_client
            .post(self.config.model_url(model))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(audio.to_vec());

        let result: TranscriptionResult = self.run(model, request).await?;
        Ok(result.text.unwrap_or_default())
    }
}

#[async_trait]
impl CompletionModel for CloudflareClient {
    async fn complete(&self, prompt: &str) -> GatewayResult<String> {
        let model = &self.config.completion_model;
        let request = self
            .http_client
            .post(self.config.model_url(model))
            .json(&CompletionRequest { prompt });

        let result: CompletionResult = self.run(model, request).await?;
        Ok(result.response)
    }
}

fn truncate(text: &mut String, max: usize) {
    if text.len() > max {
        let mut end = max;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        text.truncate(end);
    }
}
