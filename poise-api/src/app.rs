/// Application state and router builder
///
/// This module defines the shared application state and builds the Axum
/// router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use poise_api::{app::{build_router, AppState}, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::with_postgres(pool, config)?;
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::{header, HeaderValue, Method},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use poise_coach::gateway::{CloudflareClient, CloudflareConfig, GatewayError};
use poise_coach::orchestrator::{AnalysisOrchestrator, OrchestratorConfig};
use poise_shared::auth::middleware::authenticate;
use poise_shared::store::{AnalysisStore, PgStore, UserDirectory};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor; every
/// field is reference counted.
#[derive(Clone)]
pub struct AppState {
    /// Credential store
    pub users: Arc<dyn UserDirectory>,

    /// Analysis history
    pub analyses: Arc<dyn AnalysisStore>,

    /// Analysis flow
    pub orchestrator: Arc<AnalysisOrchestrator>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates application state from its parts
    pub fn new(
        config: Config,
        users: Arc<dyn UserDirectory>,
        analyses: Arc<dyn AnalysisStore>,
        orchestrator: Arc<AnalysisOrchestrator>,
    ) -> Self {
        Self {
            users,
            analyses,
            orchestrator,
            config: Arc::new(config),
        }
    }

    /// Wires PostgreSQL storage and the Workers AI client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_postgres(pool: PgPool, config: Config) -> Result<Self, GatewayError> {
        let store = Arc::new(PgStore::new(pool));
        let client = Arc::new(CloudflareClient::new(CloudflareConfig::from(
            &config.inference,
        ))?);

        let orchestrator = AnalysisOrchestrator::new(
            client.clone(),
            client.clone(),
            client,
            store.clone(),
            OrchestratorConfig {
                inference_timeout: config.inference.timeout(),
            },
        );

        Ok(Self::new(
            config,
            store.clone(),
            store,
            Arc::new(orchestrator),
        ))
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET  /health                  # Health check (public)
/// └── /api/
///     ├── /users/
///     │   ├── POST /register        # public
///     │   ├── POST /login           # public
///     │   └── GET  /profile         # authenticated
///     ├── POST /analyze/all         # authenticated, multipart
///     └── GET  /analyses/history    # authenticated
/// ```
///
/// # Middleware Stack
///
/// Applied in order (outermost first):
/// 1. Security headers
/// 2. CORS (tower-http CorsLayer)
/// 3. Logging (tower-http TraceLayer)
/// 4. Authentication (protected routes only)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Registration and login (public)
    let public_user_routes = Router::new()
        .route("/register", post(routes::users::register))
        .route("/login", post(routes::users::login));

    // Everything below requires a bearer token
    let protected_routes = Router::new()
        .route("/users/profile", get(routes::users::profile))
        .route(
            "/analyze/all",
            post(routes::analyze::analyze_all)
                .layer(DefaultBodyLimit::max(state.config.api.max_upload_bytes)),
        )
        .route("/analyses/history", get(routes::history::list_history))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let api_routes = Router::new()
        .nest("/users", public_user_routes)
        .merge(protected_routes);

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// Authentication guard
///
/// Resolves the bearer token to a user and stores the resulting
/// `AuthContext` in request extensions. Rejected requests never reach the
/// handler, so no body is read and no store or model is touched.
async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let context = authenticate(req.headers(), state.jwt_secret(), state.users.as_ref()).await?;

    req.extensions_mut().insert(context);

    Ok(next.run(req).await)
}
