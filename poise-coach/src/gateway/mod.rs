/// Inference gateway traits
///
/// The orchestrator talks to three hosted models through these traits. Each
/// call makes exactly one attempt; retry and fallback policy belong to the
/// caller.
///
/// # Implementations
///
/// - [`CloudflareClient`]: Cloudflare Workers AI, implements all three traits
///
/// # Example
///
/// ```no_run
/// use poise_coach::gateway::{CloudflareClient, CloudflareConfig, CompletionModel};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = CloudflareClient::new(CloudflareConfig::new("account-id", "api-token"))?;
/// let reply = client.complete("Say hello").await?;
/// println!("{}", reply);
/// # Ok(())
/// # }
/// ```

pub mod cloudflare;

pub use cloudflare::{CloudflareClient, CloudflareConfig};

use async_trait::async_trait;

/// Gateway error types
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The request never produced an HTTP response
    #[error("Network error: {0}")]
    Network(String),

    /// Upstream answered with a non-success status
    #[error("Upstream returned status {0}: {1}")]
    Status(u16, String),

    /// The response body did not have the expected shape
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// The call did not finish within its time budget
    #[error("Inference request timed out")]
    Timeout,
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GatewayError::Timeout
        } else if err.is_decode() {
            GatewayError::Malformed(err.to_string())
        } else {
            GatewayError::Network(err.to_string())
        }
    }
}

/// Gateway result type alias
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Image captioning model
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Describes `image` following the instructions in `prompt`
    async fn describe_image(&self, prompt: &str, image: &[u8]) -> GatewayResult<String>;
}

/// Speech-to-text model
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranscriptionModel: Send + Sync {
    /// Transcribes `audio`; the result may be empty when nothing was said
    async fn transcribe(&self, audio: &[u8], content_type: &str) -> GatewayResult<String>;
}

/// Text completion model
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> GatewayResult<String>;
}
