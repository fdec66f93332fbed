// crates/db/src/queries/records.rs
// Forum-partitioned record storage.

use async_trait::async_trait;
use chrono::Utc;
use forum_harvest_core::{ForumId, Record, RecordStore, StoreError, STORE_ID_FIELD};
use serde_json::Value;

use crate::{Database, DbResult};

impl Database {
    /// Delete every record in the forum's partition. Returns rows removed.
    pub async fn clear_records(&self, forum: ForumId) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM records WHERE forum = ?1")
            .bind(forum.as_str())
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected())
    }

    /// Append records to the forum's partition in a single transaction.
    pub async fn insert_records(&self, forum: ForumId, records: &[Record]) -> DbResult<u64> {
        if records.is_empty() {
            return Ok(0);
        }

        let scraped_at = Utc::now().timestamp();
        let mut tx = self.pool().begin().await?;
        for record in records {
            let payload = serde_json::to_string(record)?;
            sqlx::query("INSERT INTO records (forum, payload, scraped_at) VALUES (?1, ?2, ?3)")
                .bind(forum.as_str())
                .bind(payload)
                .bind(scraped_at)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        Ok(records.len() as u64)
    }

    /// All records of the partition in insertion order, with the row id
    /// injected as [`STORE_ID_FIELD`].
    pub async fn read_records(&self, forum: ForumId) -> DbResult<Vec<Record>> {
        let rows: Vec<(i64, String)> =
            sqlx::query_as("SELECT id, payload FROM records WHERE forum = ?1 ORDER BY id")
                .bind(forum.as_str())
                .fetch_all(self.pool())
                .await?;

        rows.into_iter()
            .map(|(id, payload)| {
                let mut record: Record = serde_json::from_str(&payload)?;
                record.insert(STORE_ID_FIELD.to_string(), Value::from(id));
                Ok(record)
            })
            .collect()
    }

    /// Number of records in the forum's partition.
    pub async fn count_records(&self, forum: ForumId) -> DbResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM records WHERE forum = ?1")
            .bind(forum.as_str())
            .fetch_one(self.pool())
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl RecordStore for Database {
    async fn clear(&self, forum: ForumId) -> Result<u64, StoreError> {
        Ok(self.clear_records(forum).await?)
    }

    async fn insert_many(&self, forum: ForumId, records: &[Record]) -> Result<u64, StoreError> {
        Ok(self.insert_records(forum, records).await?)
    }

    async fn read_all(&self, forum: ForumId) -> Result<Vec<Record>, StoreError> {
        Ok(self.read_records(forum).await?)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(self.check_connection().await?)
    }
}
