//! Common test utilities for integration tests
//!
//! Provides the real router wired to in-memory storage and scripted model
//! stubs, so the HTTP surface can be exercised without PostgreSQL or
//! network access:
//! - `MemoryStore`: users and analyses kept in memory, with call counters
//! - `StubModel`: scripted replies for the three model traits
//! - `TestContext`: router plus helpers for tokens and multipart bodies

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Utc;
use poise_api::app::{build_router, AppState};
use poise_api::config::{ApiConfig, Config, DatabaseConfig, InferenceConfig, JwtConfig};
use poise_coach::gateway::{
    CompletionModel, GatewayError, GatewayResult, TranscriptionModel, VisionModel,
};
use poise_coach::orchestrator::{AnalysisOrchestrator, OrchestratorConfig};
use poise_shared::auth::jwt::{create_token, Claims};
use poise_shared::models::analysis::{Analysis, NewAnalysis};
use poise_shared::models::user::{normalize_email, CreateUser, User};
use poise_shared::store::{AnalysisStore, StoreError, UserDirectory};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;
use uuid::Uuid;

pub const JWT_SECRET: &str = "integration-test-secret-at-least-32-bytes";

const BOUNDARY: &str = "poise-test-boundary";

/// In-memory users and analyses
#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<Vec<User>>,
    analyses: Mutex<Vec<Analysis>>,

    /// Calls to any `AnalysisStore` method
    pub analysis_calls: AtomicUsize,

    /// Makes every analysis write fail
    pub fail_writes: AtomicBool,

    /// Makes every user lookup fail
    pub fail_lookups: AtomicBool,
}

impl MemoryStore {
    pub fn analyses(&self) -> Vec<Analysis> {
        self.analyses.lock().unwrap().clone()
    }

    pub fn analysis_calls(&self) -> usize {
        self.analysis_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn create_user(&self, data: CreateUser) -> Result<User, StoreError> {
        let mut users = self.users.lock().unwrap();
        let email = normalize_email(&data.email);
        if users.iter().any(|u| u.email == email) {
            return Err(StoreError::Conflict("users_email_key".to_string()));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: data.name.trim().to_string(),
            email,
            password_hash: data.password_hash,
            created_at: now,
            updated_at: now,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("lookup disabled".to_string()));
        }
        let email = normalize_email(email);
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("lookup disabled".to_string()));
        }
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .cloned())
    }
}

#[async_trait]
impl AnalysisStore for MemoryStore {
    async fn create(&self, data: NewAnalysis) -> Result<Analysis, StoreError> {
        self.analysis_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes disabled".to_string()));
        }
        data.validate().map_err(StoreError::Invalid)?;

        let now = Utc::now();
        let analysis = Analysis {
            id: Uuid::new_v4(),
            owner: data.owner,
            image: data.image,
            visual_feedback: data.visual_feedback,
            voice_feedback: data.voice_feedback,
            created_at: now,
            updated_at: now,
        };
        self.analyses.lock().unwrap().push(analysis.clone());
        Ok(analysis)
    }

    // Insertion order stands in for creation time.
    async fn list_by_owner(&self, owner: Uuid) -> Result<Vec<Analysis>, StoreError> {
        self.analysis_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .analyses
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|a| a.owner == owner)
            .cloned()
            .collect())
    }
}

/// Scripted model reply
#[derive(Clone)]
pub enum Reply {
    Text(String),
    Fail,
}

/// Model stub usable for any of the three model traits
pub struct StubModel {
    reply: Reply,
    calls: AtomicUsize,
}

impl StubModel {
    pub fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Reply::Text(text.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            reply: Reply::Fail,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn respond(&self) -> GatewayResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Reply::Text(text) => Ok(text.clone()),
            Reply::Fail => Err(GatewayError::Status(503, "model overloaded".to_string())),
        }
    }
}

#[async_trait]
impl VisionModel for StubModel {
    async fn describe_image(&self, _prompt: &str, _image: &[u8]) -> GatewayResult<String> {
        self.respond()
    }
}

#[async_trait]
impl TranscriptionModel for StubModel {
    async fn transcribe(&self, _audio: &[u8], _content_type: &str) -> GatewayResult<String> {
        self.respond()
    }
}

#[async_trait]
impl CompletionModel for StubModel {
    async fn complete(&self, _prompt: &str) -> GatewayResult<String> {
        self.respond()
    }
}

/// Configuration used by every test
pub fn test_config() -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
            production: false,
            max_upload_bytes: 1024 * 1024,
        },
        database: DatabaseConfig {
            url: "postgresql://unused".to_string(),
            max_connections: 1,
        },
        jwt: JwtConfig {
            secret: JWT_SECRET.to_string(),
            expiration_days: 30,
        },
        inference: InferenceConfig {
            api_base: "http://127.0.0.1:1".to_string(),
            account_id: "test".to_string(),
            api_token: "test".to_string(),
            vision_model: "vision".to_string(),
            transcription_model: "transcription".to_string(),
            completion_model: "completion".to_string(),
            timeout_secs: 5,
        },
    }
}

/// A file part of a multipart request
pub struct Part<'a> {
    pub name: &'a str,
    pub file_name: &'a str,
    pub content_type: &'a str,
    pub data: &'a [u8],
}

impl<'a> Part<'a> {
    pub fn image(data: &'a [u8]) -> Self {
        Part {
            name: "image",
            file_name: "photo.jpg",
            content_type: "image/jpeg",
            data,
        }
    }

    pub fn audio(data: &'a [u8]) -> Self {
        Part {
            name: "audio",
            file_name: "answer.webm",
            content_type: "audio/webm",
            data,
        }
    }
}

/// Encodes parts as a `multipart/form-data` body
pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, part.name, part.file_name, part.content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

/// Test context: router, storage and model stubs
pub struct TestContext {
    pub app: axum::Router,
    pub store: Arc<MemoryStore>,
    pub vision: Arc<StubModel>,
    pub transcription: Arc<StubModel>,
    pub completion: Arc<StubModel>,
}

impl TestContext {
    /// Context whose models all succeed
    pub fn new() -> Self {
        Self::with_models(
            StubModel::replying("Overall a good setup.\n- Wear a collared shirt.\n- Sit up straight."),
            StubModel::replying("Hi, um, I'm a backend developer."),
            StubModel::replying("1. Avoid filler words like um.\n2. Speak a little slower."),
        )
    }

    pub fn with_models(
        vision: Arc<StubModel>,
        transcription: Arc<StubModel>,
        completion: Arc<StubModel>,
    ) -> Self {
        Self::build(vision, transcription, completion, test_config())
    }

    pub fn build(
        vision: Arc<StubModel>,
        transcription: Arc<StubModel>,
        completion: Arc<StubModel>,
        config: Config,
    ) -> Self {
        let store = Arc::new(MemoryStore::default());
        let orchestrator = AnalysisOrchestrator::new(
            vision.clone(),
            transcription.clone(),
            completion.clone(),
            store.clone(),
            OrchestratorConfig {
                inference_timeout: Duration::from_secs(5),
            },
        );
        let state = AppState::new(config, store.clone(), store.clone(), Arc::new(orchestrator));

        Self {
            app: build_router(state),
            store,
            vision,
            transcription,
            completion,
        }
    }

    /// Total number of model calls
    pub fn model_calls(&self) -> usize {
        self.vision.calls() + self.transcription.calls() + self.completion.calls()
    }

    /// Creates a user directly in the store and returns it with a valid token
    pub async fn seed_user(&self, email: &str) -> (User, String) {
        let user = self
            .store
            .create_user(CreateUser {
                name: "Seeded User".to_string(),
                email: email.to_string(),
                password_hash: "unused".to_string(),
            })
            .await
            .unwrap();
        let token = create_token(&Claims::new(user.id), JWT_SECRET).unwrap();
        (user, token)
    }

    /// Sends a request through the router and decodes the JSON body
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, body)
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    /// Posts files to `/api/analyze/all`
    pub async fn analyze(&self, authorization: Option<&str>, parts: &[Part<'_>]) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/api/analyze/all")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            );
        if let Some(value) = authorization {
            builder = builder.header("authorization", value);
        }
        self.send(builder.body(Body::from(multipart_body(parts))).unwrap())
            .await
    }
}
