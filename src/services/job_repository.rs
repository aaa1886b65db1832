//! Read access to the job database.
//!
//! The database is owned by another tool; it is opened read-only and only
//! the `midjourney_likes` table is queried.

use crate::{
    errors::{SyncError, SyncResult},
    models::job_record::JobRecord,
};
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use std::{path::Path, str::FromStr};
use tracing::debug;

#[derive(Clone)]
pub struct JobRepository {
    pub db: SqlitePool,
}

impl JobRepository {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Open the database at `database_url` read-only.
    ///
    /// A missing database file is a `MissingInput` error rather than an
    /// empty database being created in its place.
    pub async fn connect(database_url: &str) -> SyncResult<Self> {
        if !database_url.starts_with("sqlite:") {
            return Err(SyncError::Config(format!(
                "database URL `{database_url}` must use the sqlite: scheme"
            )));
        }
        let db_path = database_url
            .trim_start_matches("sqlite://")
            .trim_start_matches("sqlite:")
            .trim_start_matches("file:");
        debug!("Interpreted SQLite path => {}", db_path);

        if db_path != ":memory:" && !Path::new(db_path).is_file() {
            return Err(SyncError::MissingInput(db_path.into()));
        }

        let options = SqliteConnectOptions::from_str(database_url)?.read_only(true);
        let db = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        Ok(Self::new(db))
    }

    /// Every job, newest first by the stored date text.
    pub async fn fetch_all_jobs(&self) -> SyncResult<Vec<JobRecord>> {
        let rows = sqlx::query_as::<_, JobRecord>(
            "SELECT job_id, midjourney_created_at, raw_parameters, aspect_ratio,
                    prompt, cdn_url, midjourney_url
             FROM midjourney_likes
             ORDER BY midjourney_created_at DESC",
        )
        .fetch_all(&self.db)
        .await?;
        debug!("fetched {} job rows", rows.len());
        Ok(rows)
    }

    pub async fn fetch_job_ids(&self) -> SyncResult<Vec<String>> {
        let ids = sqlx::query_scalar::<_, String>("SELECT job_id FROM midjourney_likes")
            .fetch_all(&self.db)
            .await?;
        Ok(ids)
    }

    /// Jobs that have a creation date recorded.
    ///
    /// Only `job_id` and `midjourney_created_at` are populated.
    pub async fn fetch_job_dates(&self) -> SyncResult<Vec<JobRecord>> {
        let rows = sqlx::query_as::<_, JobRecord>(
            "SELECT job_id, midjourney_created_at,
                    NULL AS raw_parameters, NULL AS aspect_ratio, NULL AS prompt,
                    NULL AS cdn_url, NULL AS midjourney_url
             FROM midjourney_likes
             WHERE midjourney_created_at IS NOT NULL",
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }
}
