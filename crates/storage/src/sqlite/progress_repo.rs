use async_trait::async_trait;
use chrono::Utc;
use practice_core::progress::ProgressState;
use sqlx::Row;

use crate::repository::{ProgressRepository, StorageError};

use super::SqliteRepository;

#[async_trait]
impl ProgressRepository for SqliteRepository {
    async fn load_progress(&self, name: &str) -> Result<Option<ProgressState>, StorageError> {
        let row = sqlx::query("SELECT payload FROM progress_records WHERE name = ?1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let payload: String = row
            .try_get("payload")
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        let state = serde_json::from_str(&payload)?;
        Ok(Some(state))
    }

    async fn save_progress(&self, name: &str, state: &ProgressState) -> Result<(), StorageError> {
        let payload = serde_json::to_string(state)?;
        sqlx::query(
            r"
            INSERT INTO progress_records (name, payload, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(name) DO UPDATE SET
                payload = excluded.payload,
                updated_at = excluded.updated_at
            ",
        )
        .bind(name)
        .bind(payload)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        Ok(())
    }
}
