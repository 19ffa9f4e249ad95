/// Analysis model and database operations
///
/// An analysis is the persisted outcome of one coaching run: the captured
/// photo (base64) plus the visual and voice suggestions produced for it.
/// Rows are append-only; there is no update path.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE analyses (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     owner_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     image TEXT NOT NULL,
///     visual_feedback TEXT[] NOT NULL CHECK (cardinality(visual_feedback) > 0),
///     voice_feedback TEXT[] NOT NULL CHECK (cardinality(voice_feedback) > 0),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # JSON
///
/// Records serialize in camelCase for the browser client:
///
/// ```json
/// {
///   "id": "uuid",
///   "owner": "uuid",
///   "image": "/9j/4AAQ...",
///   "visualFeedback": ["Sit up straight."],
///   "voiceFeedback": ["Slow down a little."],
///   "createdAt": "2025-01-01T10:00:00Z",
///   "updatedAt": "2025-01-01T10:00:00Z"
/// }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// A persisted analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    /// Unique analysis ID
    pub id: Uuid,

    /// Owning user; set once at creation
    #[sqlx(rename = "owner_id")]
    pub owner: Uuid,

    /// Captured photo, base64 encoded
    pub image: String,

    /// Suggestions about appearance and framing
    pub visual_feedback: Vec<String>,

    /// Suggestions about speech delivery
    pub voice_feedback: Vec<String>,

    /// Creation time; history is ordered by this, newest first
    pub created_at: DateTime<Utc>,

    /// Equal to `created_at`, since analyses are never modified
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new analysis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAnalysis {
    /// Owning user
    pub owner: Uuid,

    /// Captured photo, base64 encoded
    pub image: String,

    /// Visual suggestions (non-empty, non-blank)
    pub visual_feedback: Vec<String>,

    /// Voice suggestions (non-empty, non-blank)
    pub voice_feedback: Vec<String>,
}

impl NewAnalysis {
    /// Checks the feedback invariants before anything is written
    ///
    /// Both feedback lists must be non-empty and must not contain blank
    /// entries; the image must not be empty.
    pub fn validate(&self) -> Result<(), String> {
        if self.image.is_empty() {
            return Err("image must not be empty".to_string());
        }
        check_feedback("visual_feedback", &self.visual_feedback)?;
        check_feedback("voice_feedback", &self.voice_feedback)
    }
}

fn check_feedback(field: &str, items: &[String]) -> Result<(), String> {
    if items.is_empty() {
        return Err(format!("{} must contain at least one suggestion", field));
    }
    if items.iter().any(|s| s.trim().is_empty()) {
        return Err(format!("{} must not contain blank suggestions", field));
    }
    Ok(())
}

impl Analysis {
    /// Inserts a new analysis
    ///
    /// Timestamps are assigned by the database.
    pub async fn create(pool: &PgPool, data: NewAnalysis) -> Result<Self, sqlx::Error> {
        let analysis = sqlx::query_as::<_, Analysis>(
            r#"
            INSERT INTO analyses (owner_id, image, visual_feedback, voice_feedback)
            VALUES ($1, $2, $3, $4)
            RETURNING id, owner_id, image, visual_feedback, voice_feedback,
                      created_at, updated_at
            "#,
        )
        .bind(data.owner)
        .bind(data.image)
        .bind(data.visual_feedback)
        .bind(data.voice_feedback)
        .fetch_one(pool)
        .await?;

        Ok(analysis)
    }

    /// Lists every analysis owned by `owner`, newest first
    ///
    /// Ties on `created_at` are broken by ID so the order is stable.
    pub async fn list_by_owner(pool: &PgPool, owner: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let analyses = sqlx::query_as::<_, Analysis>(
            r#"
            SELECT id, owner_id, image, visual_feedback, voice_feedback,
                   created_at, updated_at
            FROM analyses
            WHERE owner_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(owner)
        .fetch_all(pool)
        .await?;

        Ok(analyses)
    }

    /// Counts analyses owned by `owner`
    pub async fn count_by_owner(pool: &PgPool, owner: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM analyses WHERE owner_id = $1")
            .bind(owner)
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}
