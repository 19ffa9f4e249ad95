//! # Poise Shared Library
//!
//! This crate contains the types and persistence code shared by the Poise
//! API server and the analysis coach.
//!
//! ## Module Organization
//!
//! - `auth`: Password hashing, token issuing/verification, auth context
//! - `db`: Connection pool and migrations
//! - `models`: Database models (users, analyses)
//! - `store`: Storage traits used by the HTTP layer and the orchestrator

pub mod auth;
pub mod db;
pub mod models;
pub mod store;

/// Current version of the Poise shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
