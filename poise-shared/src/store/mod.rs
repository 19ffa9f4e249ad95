/// Storage traits
///
/// The API server and the analysis orchestrator depend on these traits
/// rather than on a concrete database. [`PgStore`] implements both on top of
/// a PostgreSQL pool.
///
/// # Traits
///
/// - [`UserDirectory`]: credential store used by registration, login and the
///   authentication guard
/// - [`AnalysisStore`]: append-only analysis history
///
/// # Example
///
/// ```no_run
/// use poise_shared::store::{AnalysisStore, PgStore};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, owner: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let store = PgStore::new(pool);
/// let history = store.list_by_owner(owner).await?;
/// println!("{} analyses", history.len());
/// # Ok(())
/// # }
/// ```

mod postgres;

pub use postgres::PgStore;

use crate::models::{
    analysis::{Analysis, NewAnalysis},
    user::{CreateUser, User},
};
use async_trait::async_trait;
use uuid::Uuid;

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique constraint rejected the write
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The record violates a data invariant and was not written
    #[error("Invalid record: {0}")]
    Invalid(String),

    /// The backing store could not be reached
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Any other database failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// Maps a sqlx error, turning unique violations into `Conflict`
    pub fn from_sqlx(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                let constraint = db_err.constraint().unwrap_or("unique").to_string();
                return StoreError::Conflict(constraint);
            }
        }
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::Unavailable(err.to_string())
            }
            other => StoreError::Database(other),
        }
    }
}

/// Credential store
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Creates a user; a duplicate email yields `StoreError::Conflict`
    async fn create_user(&self, data: CreateUser) -> Result<User, StoreError>;

    /// Looks a user up by email, case-insensitively
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Looks a user up by ID
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
}

/// Append-only analysis history
#[async_trait]
pub trait AnalysisStore: Send + Sync {
    /// Persists a new analysis and returns it with ID and timestamps
    async fn create(&self, data: NewAnalysis) -> Result<Analysis, StoreError>;

    /// Returns every analysis owned by `owner`, newest first
    async fn list_by_owner(&self, owner: Uuid) -> Result<Vec<Analysis>, StoreError>;

    /// Checks that the store is reachable
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_errors_are_unavailable() {
        assert!(matches!(
            StoreError::from_sqlx(sqlx::Error::PoolTimedOut),
            StoreError::Unavailable(_)
        ));
        assert!(matches!(
            StoreError::from_sqlx(sqlx::Error::RowNotFound),
            StoreError::Database(_)
        ));
    }
}
