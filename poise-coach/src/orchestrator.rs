/// Analysis orchestrator
///
/// Turns one photo and one voice recording into interview feedback and
/// records the result.
///
/// # Architecture
///
/// ```text
/// AnalysisOrchestrator::analyze()
///   ├─> visual sub-flow: VisionModel ─> parse_suggestions
///   ├─> voice sub-flow:  TranscriptionModel ─> CompletionModel ─> parse_suggestions
///   └─> AnalysisStore::create (after both sub-flows finish)
/// ```
///
/// The two sub-flows run concurrently and never affect each other. Any
/// gateway failure, timeout included, is replaced by a fixed fallback
/// suggestion, so both feedback lists are always non-empty. Only a storage
/// failure fails the run.
///
/// # Example
///
/// ```no_run
/// use poise_coach::gateway::{CloudflareClient, CloudflareConfig};
/// use poise_coach::orchestrator::{AnalysisOrchestrator, MediaUpload, OrchestratorConfig};
/// use poise_shared::store::AnalysisStore;
/// use std::sync::Arc;
/// use uuid::Uuid;
///
/// # async fn example(store: Arc<dyn AnalysisStore>, owner: Uuid, photo: Vec<u8>, clip: Vec<u8>) -> Result<(), Box<dyn std::error::Error>> {
/// let client = Arc::new(CloudflareClient::new(CloudflareConfig::new("account", "token"))?);
/// let orchestrator = AnalysisOrchestrator::new(
///     client.clone(),
///     client.clone(),
///     client,
///     store,
///     OrchestratorConfig::default(),
/// );
///
/// let outcome = orchestrator
///     .analyze(owner, &MediaUpload::new(photo, "image/jpeg"), &MediaUpload::new(clip, "audio/webm"))
///     .await?;
/// println!("{:?}", outcome.visual_feedback);
/// # Ok(())
/// # }
/// ```

use crate::feedback::parse_suggestions;
use crate::gateway::{
    CompletionModel, GatewayError, GatewayResult, TranscriptionModel, VisionModel,
};
use crate::prompts::{
    is_no_speech, voice_prompt, NO_SPEECH_FEEDBACK, VISION_PROMPT, VISUAL_FALLBACK,
    VOICE_FALLBACK,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use poise_shared::models::analysis::NewAnalysis;
use poise_shared::store::{AnalysisStore, StoreError};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Default budget for a single inference call
pub const DEFAULT_INFERENCE_TIMEOUT: Duration = Duration::from_secs(30);

/// Orchestrator errors
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    /// The analysis could not be persisted
    #[error("Failed to store analysis: {0}")]
    Store(#[from] StoreError),
}

/// Orchestrator configuration
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Upper bound for each gateway call
    pub inference_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        OrchestratorConfig {
            inference_timeout: DEFAULT_INFERENCE_TIMEOUT,
        }
    }
}

/// An uploaded media file
#[derive(Debug, Clone)]
pub struct MediaUpload {
    /// Raw file contents
    pub bytes: Bytes,

    /// Declared media type, e.g. `audio/webm`
    pub content_type: String,
}

impl MediaUpload {
    pub fn new(bytes: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: content_type.into(),
        }
    }
}

/// Feedback produced by one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisOutcome {
    /// ID of the stored analysis
    #[serde(skip)]
    pub analysis_id: Uuid,

    pub visual_feedback: Vec<String>,

    pub voice_feedback: Vec<String>,
}

/// Analysis orchestrator
///
/// Holds no per-request state; share it behind an `Arc`.
pub struct AnalysisOrchestrator {
    vision: Arc<dyn VisionModel>,
    transcription: Arc<dyn TranscriptionModel>,
    completion: Arc<dyn CompletionModel>,
    store: Arc<dyn AnalysisStore>,
    config: OrchestratorConfig,
}

impl AnalysisOrchestrator {
    /// Creates a new orchestrator
    pub fn new(
        vision: Arc<dyn VisionModel>,
        transcription: Arc<dyn TranscriptionModel>,
        completion: Arc<dyn CompletionModel>,
        store: Arc<dyn AnalysisStore>,
        config: OrchestratorConfig,
    ) -> Self {
        AnalysisOrchestrator {
            vision,
            transcription,
            completion,
            store,
            config,
        }
    }

    /// Runs both sub-flows and stores the result for `owner`
    ///
    /// # Errors
    ///
    /// Returns `OrchestratorError::Store` if the analysis cannot be written.
    /// Gateway failures never surface here.
    pub async fn analyze(
        &self,
        owner: Uuid,
        image: &MediaUpload,
        audio: &MediaUpload,
    ) -> Result<AnalysisOutcome, OrchestratorError> {
        debug!(
            owner = %owner,
            image_bytes = image.bytes.len(),
            audio_bytes = audio.bytes.len(),
            audio_type = %audio.content_type,
            "Starting analysis"
        );

        let (visual_feedback, voice_feedback) = tokio::join!(
            self.visual_feedback(&image.bytes),
            self.voice_feedback(&audio.bytes, &audio.content_type),
        );

        let analysis = self
            .store
            .create(NewAnalysis {
                owner,
                image: STANDARD.encode(&image.bytes),
                visual_feedback,
                voice_feedback,
            })
            .await?;

        info!(
            owner = %owner,
            analysis_id = %analysis.id,
            visual = analysis.visual_feedback.len(),
            voice = analysis.voice_feedback.len(),
            "Analysis stored"
        );

        Ok(AnalysisOutcome {
            analysis_id: analysis.id,
            visual_feedback: analysis.visual_feedback,
            voice_feedback: analysis.voice_feedback,
        })
    }

    /// Produces visual suggestions for an image, or the visual fallback
    pub async fn visual_feedback(&self, image: &[u8]) -> Vec<String> {
        let result = self
            .bounded(self.vision.describe_image(VISION_PROMPT, image))
            .await
            .and_then(|description| non_empty(parse_suggestions(&description)));

        match result {
            Ok(suggestions) => suggestions,
            Err(e) => {
                warn!(error = %e, "Visual analysis failed, using fallback");
                vec![VISUAL_FALLBACK.to_string()]
            }
        }
    }

    /// Produces voice suggestions for a recording
    ///
    /// Silent recordings get the no-speech message without a completion call;
    /// any failure gets the voice fallback.
    pub async fn voice_feedback(&self, audio: &[u8], content_type: &str) -> Vec<String> {
        match self.try_voice_feedback(audio, content_type).await {
            Ok(suggestions) => suggestions,
            Err(e) => {
                warn!(error = %e, "Voice analysis failed, using fallback");
                vec![VOICE_FALLBACK.to_string()]
            }
        }
    }

    async fn try_voice_feedback(
        &self,
        audio: &[u8],
        content_type: &str,
    ) -> GatewayResult<Vec<String>> {
        let transcript = self
            .bounded(self.transcription.transcribe(audio, content_type))
            .await?;

        if is_no_speech(&transcript) {
            debug!("No speech in recording");
            return Ok(vec![NO_SPEECH_FEEDBACK.to_string()]);
        }

        let response = self
            .bounded(self.completion.complete(&voice_prompt(&transcript)))
            .await?;

        non_empty(parse_suggestions(&response))
    }

    async fn bounded<F>(&self, call: F) -> GatewayResult<String>
    where
        F: Future<Output = GatewayResult<String>>,
    {
        tokio::time::timeout(self.config.inference_timeout, call)
            .await
            .map_err(|_| GatewayError::Timeout)?
    }
}

fn non_empty(suggestions: Vec<String>) -> GatewayResult<Vec<String>> {
    if suggestions.is_empty() {
        Err(GatewayError::Malformed(
            "model output contained no suggestions".to_string(),
        ))
    } else {
        Ok(suggestions)
    }
}
