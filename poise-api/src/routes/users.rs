/// User endpoints
///
/// # Endpoints
///
/// - `POST /api/users/register` - Register and receive a token
/// - `POST /api/users/login` - Login and receive a token
/// - `GET /api/users/profile` - Current user (authenticated)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use poise_shared::{
    auth::{
        jwt::{create_token, Claims},
        middleware::AuthContext,
        password,
    },
    models::user::{normalize_email, CreateUser, User},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Display name
    #[validate(length(min = 1, max = 100, message = "Name must be 1 to 100 characters"))]
    pub name: String,

    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password (also checked for strength)
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Register and login response
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,

    /// Bearer token for subsequent requests
    pub token: String,
}

/// Profile response
#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /api/users/register
/// Content-Type: application/json
///
/// { "name": "Sam Doe", "email": "sam@example.com", "password": "hunter22" }
/// ```
///
/// # Response
///
/// `201 Created` with `{ "id", "name", "email", "token" }`
///
/// # Errors
///
/// - `409 Conflict`: Email already registered
/// - `422 Unprocessable Entity`: Validation failed
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    req.validate().map_err(validation_error)?;

    if req.name.trim().is_empty() {
        return Err(ApiError::ValidationError(vec![ValidationErrorDetail {
            field: "name".to_string(),
            message: "Name must not be blank".to_string(),
        }]));
    }

    password::validate_password_strength(&req.password).map_err(|e| {
        ApiError::ValidationError(vec![ValidationErrorDetail {
            field: "password".to_string(),
            message: e,
        }])
    })?;

    let password_hash = password::hash_password(&req.password)?;

    let user = state
        .users
        .create_user(CreateUser {
            name: req.name,
            email: req.email,
            password_hash,
        })
        .await?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok((StatusCode::CREATED, Json(issue_token(&state, &user)?)))
}

/// Login with email and password
///
/// # Endpoint
///
/// ```text
/// POST /api/users/login
/// Content-Type: application/json
///
/// { "email": "sam@example.com", "password": "hunter22" }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: Unknown email or wrong password
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let invalid = || ApiError::Unauthorized("Invalid email or password".to_string());

    let user = state
        .users
        .find_user_by_email(&normalize_email(&req.email))
        .await?
        .ok_or_else(invalid)?;

    if !password::verify_password(&req.password, &user.password_hash)? {
        tracing::debug!(user_id = %user.id, "Login rejected");
        return Err(invalid());
    }

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(issue_token(&state, &user)?))
}

/// Returns the authenticated user
pub async fn profile(Extension(auth): Extension<AuthContext>) -> Json<ProfileResponse> {
    Json(ProfileResponse {
        id: auth.user_id,
        name: auth.name,
        email: auth.email,
    })
}

fn issue_token(state: &AppState, user: &User) -> ApiResult<AuthResponse> {
    let claims = Claims::with_expiration(
        user.id,
        chrono::Duration::days(state.config.jwt.expiration_days),
    );
    let token = create_token(&claims, state.jwt_secret())?;

    Ok(AuthResponse {
        id: user.id,
        name: user.name.clone(),
        email: user.email.clone(),
        token,
    })
}

fn validation_error(errors: ValidationErrors) -> ApiError {
    let details = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| ValidationErrorDetail {
                field: field.to_string(),
                message: error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "Validation failed".to_string()),
            })
        })
        .collect();

    ApiError::ValidationError(details)
}
