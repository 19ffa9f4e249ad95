/// Configuration management for the API server
///
/// This module loads configuration from environment variables and provides
/// a type-safe configuration struct. A `.env` file is loaded when present.
///
/// # Environment Variables
///
/// Required:
/// - `CLOUDFLARE_ACCOUNT_ID`: Workers AI account
/// - `CLOUDFLARE_API_TOKEN`: Workers AI token
/// - `DATABASE_URL`: PostgreSQL connection string
/// - `JWT_SECRET`: Token signing key, at least 32 characters
///
/// Optional:
/// - `API_HOST` (default: 0.0.0.0), `PORT` (default: 5000)
/// - `CORS_ORIGINS` (default: `*`, comma separated)
/// - `PRODUCTION` (default: false, enables HSTS)
/// - `MAX_UPLOAD_BYTES` (default: 10485760, at least 1)
/// - `DATABASE_MAX_CONNECTIONS` (default: 10, at least 1)
/// - `JWT_EXPIRATION_DAYS` (default: 30, 1 to 3650)
/// - `INFERENCE_TIMEOUT_SECS` (default: 30, 1 to 600)
/// - `CLOUDFLARE_API_BASE`, `VISION_MODEL`, `TRANSCRIPTION_MODEL`, `COMPLETION_MODEL`
///
/// # Example
///
/// ```no_run
/// use poise_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use anyhow::Context;
use poise_coach::gateway::cloudflare::{
    CloudflareConfig, DEFAULT_API_BASE, DEFAULT_COMPLETION_MODEL, DEFAULT_TRANSCRIPTION_MODEL,
    DEFAULT_VISION_MODEL,
};
use poise_shared::db::pool;
use std::env;
use std::fmt::Display;
use std::ops::RangeInclusive;
use std::str::FromStr;
use std::time::Duration;

/// Minimum accepted length of `JWT_SECRET`
pub const MIN_JWT_SECRET_LENGTH: usize = 32;

/// Upper bound for `JWT_EXPIRATION_DAYS` (ten years)
pub const MAX_JWT_EXPIRATION_DAYS: i64 = 3650;

/// Upper bound for `INFERENCE_TIMEOUT_SECS`
pub const MAX_INFERENCE_TIMEOUT_SECS: u64 = 600;

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT configuration
    pub jwt: JwtConfig,

    /// Hosted model configuration
    pub inference: InferenceConfig,
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,

    /// Production mode (enables HSTS)
    pub production: bool,

    /// Maximum accepted request body for uploads
    pub max_upload_bytes: usize,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret key for JWT signing
    ///
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,

    /// Token lifetime in days
    pub expiration_days: i64,
}

/// Workers AI configuration
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    pub api_base: String,
    pub account_id: String,
    pub api_token: String,
    pub vision_model: String,
    pub transcription_model: String,
    pub completion_model: String,

    /// Budget for each model call, in seconds
    pub timeout_secs: u64,
}

impl InferenceConfig {
    /// Per-call inference timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl From<&InferenceConfig> for CloudflareConfig {
    fn from(config: &InferenceConfig) -> Self {
        CloudflareConfig {
            api_base: config.api_base.clone(),
            account_id: config.account_id.clone(),
            api_token: config.api_token.clone(),
            vision_model: config.vision_model.clone(),
            transcription_model: config.transcription_model.clone(),
            completion_model: config.completion_model.clone(),
            request_timeout: config.timeout(),
        }
    }
}

impl From<&DatabaseConfig> for pool::DatabaseConfig {
    fn from(config: &DatabaseConfig) -> Self {
        pool::DatabaseConfig {
            url: config.url.clone(),
            max_connections: config.max_connections,
            ..Default::default()
        }
    }
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing
    /// - Environment variables have invalid or out-of-range values
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| anyhow::anyhow!("{} environment variable is required", key))
        };

        let jwt_secret = required("JWT_SECRET")?;
        if jwt_secret.len() < MIN_JWT_SECRET_LENGTH {
            anyhow::bail!(
                "JWT_SECRET must be at least {} characters long",
                MIN_JWT_SECRET_LENGTH
            );
        }

        let cors_origins = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let production = lookup("PRODUCTION")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            api: ApiConfig {
                host: lookup("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_or(&lookup, "PORT", 5000)?,
                cors_origins,
                production,
                max_upload_bytes: parse_in(
                    &lookup,
                    "MAX_UPLOAD_BYTES",
                    10 * 1024 * 1024,
                    1..=usize::MAX,
                )?,
            },
            database: DatabaseConfig {
                url: required("DATABASE_URL")?,
                max_connections: parse_in(
                    &lookup,
                    "DATABASE_MAX_CONNECTIONS",
                    10,
                    1..=u32::MAX,
                )?,
            },
            jwt: JwtConfig {
                secret: jwt_secret,
                expiration_days: parse_in(
                    &lookup,
                    "JWT_EXPIRATION_DAYS",
                    30,
                    1..=MAX_JWT_EXPIRATION_DAYS,
                )?,
            },
            inference: InferenceConfig {
                api_base: lookup("CLOUDFLARE_API_BASE")
                    .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
                account_id: required("CLOUDFLARE_ACCOUNT_ID")?,
                api_token: required("CLOUDFLARE_API_TOKEN")?,
                vision_model: lookup("VISION_MODEL")
                    .unwrap_or_else(|| DEFAULT_VISION_MODEL.to_string()),
                transcription_model: lookup("TRANSCRIPTION_MODEL")
                    .unwrap_or_else(|| DEFAULT_TRANSCRIPTION_MODEL.to_string()),
                completion_model: lookup("COMPLETION_MODEL")
                    .unwrap_or_else(|| DEFAULT_COMPLETION_MODEL.to_string()),
                timeout_secs: parse_in(
                    &lookup,
                    "INFERENCE_TIMEOUT_SECS",
                    30,
                    1..=MAX_INFERENCE_TIMEOUT_SECS,
                )?,
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .with_context(|| format!("{} has an invalid value: {}", key, value)),
        None => Ok(default),
    }
}

fn parse_in<F, T>(
    lookup: &F,
    key: &str,
    default: T,
    range: RangeInclusive<T>,
) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + PartialOrd + Display,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value = parse_or(lookup, key, default)?;
    if !range.contains(&value) {
        anyhow::bail!(
            "{} must be between {} and {}, got {}",
            key,
            range.start(),
            range.end(),
            value
        );
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_vars() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("CLOUDFLARE_ACCOUNT_ID", "account"),
            ("CLOUDFLARE_API_TOKEN", "token"),
            ("DATABASE_URL", "postgresql://localhost/poise"),
            ("JWT_SECRET", "test-secret-key-at-least-32-bytes-long"),
        ])
    }

    fn load(vars: &HashMap<&'static str, &'static str>) -> anyhow::Result<Config> {
        Config::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn test_defaults() {
        let config = load(&base_vars()).unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:5000");
        assert_eq!(config.api.cors_origins, vec!["*"]);
        assert!(!config.api.production);
        assert_eq!(config.api.max_upload_bytes, 10_485_760);
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.jwt.expiration_days, 30);
        assert_eq!(config.inference.timeout(), Duration::from_secs(30));
        assert_eq!(config.inference.vision_model, DEFAULT_VISION_MODEL);
    }

    #[test]
    fn test_overrides() {
        let mut vars = base_vars();
        vars.insert("PORT", "8080");
        vars.insert("CORS_ORIGINS", "https://a.example, https://b.example");
        vars.insert("PRODUCTION", "true");
        vars.insert("INFERENCE_TIMEOUT_SECS", "5");
        vars.insert("COMPLETION_MODEL", "@cf/custom/model");

        let config = load(&vars).unwrap();
        assert_eq!(config.api.port, 8080);
        assert_eq!(
            config.api.cors_origins,
            vec!["https://a.example", "https://b.example"]
        );
        assert!(config.api.production);

        let cloudflare = CloudflareConfig::from(&config.inference);
        assert_eq!(cloudflare.completion_model, "@cf/custom/model");
        assert_eq!(cloudflare.request_timeout, Duration::from_secs(5));
        assert_eq!(cloudflare.account_id, "account");
    }

    #[test]
    fn test_missing_required_variable() {
        for key in [
            "CLOUDFLARE_ACCOUNT_ID",
            "CLOUDFLARE_API_TOKEN",
            "DATABASE_URL",
            "JWT_SECRET",
        ] {
            let mut vars = base_vars();
            vars.remove(key);
            let err = load(&vars).unwrap_err();
            assert!(err.to_string().contains(key), "{}", err);
        }
    }

    #[test]
    fn test_short_jwt_secret_rejected() {
        let mut vars = base_vars();
        vars.insert("JWT_SECRET", "too-short");
        assert!(load(&vars).is_err());
    }

    #[test]
    fn test_invalid_number_rejected() {
        let mut vars = base_vars();
        vars.insert("PORT", "not-a-port");
        let err = load(&vars).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        for (key, value) in [
            ("JWT_EXPIRATION_DAYS", "100000000"),
            ("JWT_EXPIRATION_DAYS", "0"),
            ("JWT_EXPIRATION_DAYS", "-5"),
            ("INFERENCE_TIMEOUT_SECS", "0"),
            ("MAX_UPLOAD_BYTES", "0"),
            ("DATABASE_MAX_CONNECTIONS", "0"),
        ] {
            let mut vars = base_vars();
            vars.insert(key, value);
            let err = load(&vars).unwrap_err();
            assert!(err.to_string().contains(key), "{}={}: {}", key, value, err);
        }
    }

    #[test]
    fn test_longest_token_lifetime_is_issuable() {
        let mut vars = base_vars();
        vars.insert("JWT_EXPIRATION_DAYS", "3650");
        let config = load(&vars).unwrap();

        let claims = poise_shared::auth::jwt::Claims::with_expiration(
            uuid::Uuid::new_v4(),
            chrono::Duration::days(config.jwt.expiration_days),
        );
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_database_pool_config() {
        let config = load(&base_vars()).unwrap();
        let pool_config = pool::DatabaseConfig::from(&config.database);
        assert_eq!(pool_config.url, "postgresql://localhost/poise");
        assert_eq!(pool_config.max_connections, 10);
    }
}
