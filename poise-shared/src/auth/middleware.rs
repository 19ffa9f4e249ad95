/// Request authentication for Axum
///
/// This module turns an `Authorization: Bearer <token>` header into an
/// [`AuthContext`] for the authenticated user. The API server wires
/// [`authenticate`] into a `from_fn_with_state` layer, so a rejected request
/// never reaches its handler.
///
/// # Outcomes
///
/// ```text
/// header missing / not "Bearer <token>"   -> AuthError::MissingCredentials / InvalidFormat
/// bad signature / issuer / expired token  -> AuthError::InvalidToken
/// subject does not resolve to a user      -> AuthError::UnknownUser
/// user lookup fails                       -> AuthError::StoreError
/// otherwise                               -> AuthContext
/// ```
///
/// # Example
///
/// ```
/// use axum::Extension;
/// use poise_shared::auth::middleware::AuthContext;
///
/// async fn handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("Hello, {}!", auth.name)
/// }
/// ```

use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::{validate_token, JwtError};
use crate::models::user::User;
use crate::store::UserDirectory;

/// Authentication context added to request extensions
///
/// Handlers extract it with Axum's `Extension` extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// Display name of the user
    pub name: String,

    /// Email of the user
    pub email: String,
}

impl AuthContext {
    /// Creates an auth context for a resolved user
    pub fn from_user(user: &User) -> Self {
        Self {
            user_id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

/// Error type for request authentication
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Missing authorization header
    #[error("Not authorized, no token")]
    MissingCredentials,

    /// Authorization header is not a bearer token
    #[error("Not authorized, {0}")]
    InvalidFormat(String),

    /// Token validation failed
    #[error("Not authorized, {0}")]
    InvalidToken(String),

    /// Token is valid but its subject no longer exists
    #[error("Not authorized, user not found")]
    UnknownUser,

    /// User lookup failed
    #[error("User lookup failed: {0}")]
    StoreError(String),
}

/// Extracts the bearer token from request headers
///
/// # Errors
///
/// - `AuthError::MissingCredentials` when there is no Authorization header
/// - `AuthError::InvalidFormat` when the header is not `Bearer <token>`
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingCredentials)?
        .to_str()
        .map_err(|_| AuthError::InvalidFormat("malformed authorization header".to_string()))?;

    // The scheme name is case-insensitive (RFC 7235)
    let token = auth_header
        .split_once(' ')
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("Bearer"))
        .map(|(_, token)| token.trim())
        .ok_or_else(|| AuthError::InvalidFormat("expected Bearer token".to_string()))?;

    if token.is_empty() {
        return Err(AuthError::MissingCredentials);
    }

    Ok(token)
}

/// Authenticates a request from its headers
///
/// Validates the bearer token against `secret` and resolves its subject
/// through `users`.
pub async fn authenticate(
    headers: &HeaderMap,
    secret: &str,
    users: &dyn UserDirectory,
) -> Result<AuthContext, AuthError> {
    let token = bearer_token(headers)?;

    let claims = validate_token(token, secret).map_err(|e| match e {
        JwtError::Expired => AuthError::InvalidToken("token expired".to_string()),
        JwtError::InvalidIssuer { .. } => AuthError::InvalidToken("invalid issuer".to_string()),
        _ => AuthError::InvalidToken("token failed".to_string()),
    })?;

    let user = users
        .find_user_by_id(claims.sub)
        .await
        .map_err(|e| AuthError::StoreError(e.to_string()))?
        .ok_or(AuthError::UnknownUser)?;

    tracing::debug!(user_id = %user.id, "Request authenticated");

    Ok(AuthContext::from_user(&user))
}
