use chrono::{DateTime, SecondsFormat, Utc};
use fundigest_core::{DigestRecord, DigestRoot};
use sqlx::SqlitePool;
use uuid::Uuid;

/// Stores digest runs, one row per run id.
#[derive(Clone)]
pub struct DigestRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct DigestRunRow {
    run_id: String,
    created_at: String,
    data: String,
}

impl DigestRunRow {
    fn into_record(self) -> Result<DigestRecord, sqlx::Error> {
        let data: DigestRoot =
            serde_json::from_str(&self.data).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;

        Ok(DigestRecord {
            run_id: Some(self.run_id),
            created_at: Some(created_at),
            data,
        })
    }
}

impl DigestRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// The most recently stored run, if any.
    pub async fn latest(&self) -> Result<Option<DigestRecord>, sqlx::Error> {
        let row: Option<DigestRunRow> = sqlx::query_as(
            "SELECT run_id, created_at, data FROM funding_digest_runs ORDER BY created_at DESC, rowid DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        row.map(DigestRunRow::into_record).transpose()
    }

    /// Stores `data` stamped with the current time. See [`Self::save_at`].
    pub async fn save(
        &self,
        data: &DigestRoot,
        run_id: Option<&str>,
    ) -> Result<DigestRecord, sqlx::Error> {
        self.save_at(data, run_id, Utc::now()).await
    }

    /// Stores `data` under `run_id`, or under a fresh id when none is given.
    /// An existing run with the same id is overwritten.
    pub async fn save_at(
        &self,
        data: &DigestRoot,
        run_id: Option<&str>,
        recorded_at: DateTime<Utc>,
    ) -> Result<DigestRecord, sqlx::Error> {
        let run_id = run_id
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let payload = serde_json::to_string(data).map_err(|e| sqlx::Error::Encode(Box::new(e)))?;
        let created_at = recorded_at.to_rfc3339_opts(SecondsFormat::Micros, true);

        let row: DigestRunRow = sqlx::query_as(
            r#"
            INSERT INTO funding_digest_runs (run_id, created_at, data)
            VALUES (?, ?, ?)
            ON CONFLICT (run_id) DO UPDATE
            SET created_at = excluded.created_at,
                data = excluded.data
            RETURNING run_id, created_at, data
            "#,
        )
        .bind(&run_id)
        .bind(&created_at)
        .bind(&payload)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("Stored digest run {}", run_id);
        row.into_record()
    }

    #[cfg(test)]
    pub async fn count(&self) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM funding_digest_runs")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
