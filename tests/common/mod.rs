//! Shared fixtures for integration tests.
#![allow(dead_code)]

use gallery_sync::config::{AppConfig, SinkTarget};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::{path::Path, str::FromStr};

pub const ID_A: &str = "4147cb5f-c531-47fd-b8a2-ab4ec1a424e9";
pub const ID_B: &str = "e055ca01-1d3c-433c-80f3-aa4818322225";
pub const ID_C: &str = "0a1b2c3d-0000-4000-8000-123456789abc";

pub const GALLERY_JS: &str = "// Gallery data - embedded for local file:// access, also loads from data/gallery.json when served
const embeddedData = {
  \"items\": []
};

let items = [];

async function loadData() {
    items = embeddedData.items;
    renderGallery();
}

function renderGallery() {}
function openModal(item, index) {}
document.addEventListener('keydown', (e) => {});

loadData();
";

/// Row values: `(job_id, created_at, raw_parameters, aspect_ratio, prompt, cdn_url)`.
pub type Row<'a> = (
    &'a str,
    Option<&'a str>,
    Option<&'a str>,
    Option<&'a str>,
    Option<&'a str>,
    Option<&'a str>,
);

/// Create a job database at `path` holding `rows`.
pub async fn create_job_db(path: &Path, rows: &[Row<'_>]) -> String {
    let url = format!("sqlite://{}", path.display());
    let options = SqliteConnectOptions::from_str(&url)
        .unwrap()
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();

    sqlx::query(
        "CREATE TABLE midjourney_likes (
            job_id TEXT PRIMARY KEY,
            midjourney_created_at TEXT,
            raw_parameters TEXT,
            aspect_ratio TEXT,
            prompt TEXT,
            cdn_url TEXT,
            midjourney_url TEXT
        )",
    )
    .execute(&pool)
    .await
    .unwrap();

    for (job_id, created, params, ratio, prompt, cdn_url) in rows {
        sqlx::query(
            "INSERT INTO midjourney_likes
                (job_id, midjourney_created_at, raw_parameters, aspect_ratio, prompt, cdn_url)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(*job_id)
        .bind(*created)
        .bind(*params)
        .bind(*ratio)
        .bind(*prompt)
        .bind(*cdn_url)
        .execute(&pool)
        .await
        .unwrap();
    }

    pool.close().await;
    url
}

/// Config rooted in `dir` with the usual file names.
pub fn config_in(dir: &Path, database_url: &str) -> AppConfig {
    AppConfig {
        gallery_json: dir.join("data/gallery.json"),
        gallery_js: dir.join("gallery.js"),
        database_url: database_url.to_string(),
        download_dir: dir.join("downloads"),
        bucket: "gallery-images".into(),
        key_prefix: "gallery".into(),
        public_url: Some("https://images.example.com".into()),
        sink: Some(SinkTarget::Local(dir.join("bucket-root"))),
        sink_token: None,
    }
}
