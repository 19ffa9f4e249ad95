/// PostgreSQL implementation of the storage traits

use super::{AnalysisStore, StoreError, UserDirectory};
use crate::db::pool::health_check;
use crate::models::{
    analysis::{Analysis, NewAnalysis},
    user::{CreateUser, User},
};
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

/// Store backed by a PostgreSQL connection pool
///
/// Cloning is cheap; the pool is reference counted.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wraps an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns the underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UserDirectory for PgStore {
    async fn create_user(&self, data: CreateUser) -> Result<User, StoreError> {
        User::create(&self.pool, data)
            .await
            .map_err(StoreError::from_sqlx)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        User::find_by_email(&self.pool, email)
            .await
            .map_err(StoreError::from_sqlx)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        User::find_by_id(&self.pool, id)
            .await
            .map_err(StoreError::from_sqlx)
    }
}

#[async_trait]
impl AnalysisStore for PgStore {
    async fn create(&self, data: NewAnalysis) -> Result<Analysis, StoreError> {
        data.validate().map_err(StoreError::Invalid)?;

        let analysis = Analysis::create(&self.pool, data)
            .await
            .map_err(StoreError::from_sqlx)?;

        debug!(analysis_id = %analysis.id, owner = %analysis.owner, "Analysis stored");
        Ok(analysis)
    }

    async fn list_by_owner(&self, owner: Uuid) -> Result<Vec<Analysis>, StoreError> {
        Analysis::list_by_owner(&self.pool, owner)
            .await
            .map_err(StoreError::from_sqlx)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        health_check(&self.pool).await.map_err(StoreError::from_sqlx)
    }
}
