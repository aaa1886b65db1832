mod common;

use common::{ID_A, ID_B, ID_C, config_in, create_job_db};
use gallery_sync::{
    commands::{overlap, rebuild, sync_dates},
    errors::SyncError,
    services::gallery_store,
};
use std::collections::HashSet;

async fn seeded_db(dir: &std::path::Path) -> String {
    create_job_db(
        &dir.join("universal.db"),
        &[
            (
                ID_A,
                Some("Dec 21, 25, 8:36 PM"),
                Some("--ar 3:2 --v 7"),
                Some("3:2"),
                Some("A cinematic portrait of a woman, film grain"),
                Some("https://cdn.midjourney.com/a/0_0.png"),
            ),
            (
                ID_B,
                Some("Jan 1, 26, 12:00 AM"),
                Some("--v 6.1"),
                Some("21:9"),
                Some("a rock on a table"),
                None,
            ),
            (ID_C, Some("not a date"), None, None, None, None),
        ],
    )
    .await
}

#[tokio::test]
async fn rebuild_writes_one_item_per_row() {
    let dir = tempfile::tempdir().unwrap();
    let url = seeded_db(dir.path()).await;
    let cfg = config_in(dir.path(), &url);

    let report = rebuild::run(&cfg).await.unwrap();
    assert_eq!(report.total, 3);
    assert_eq!(report.with_dates, 2);
    assert_eq!(report.duplicates_dropped, 0);
    assert!(report.backup.is_none());

    let gallery = gallery_store::load_gallery(&cfg.gallery_json).await.unwrap();
    let ids: HashSet<&str> = gallery.items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, HashSet::from([ID_A, ID_B, ID_C]));

    let a = gallery.items.iter().find(|i| i.id == ID_A).unwrap();
    assert_eq!(a.created, "2025-12-21");
    assert_eq!(a.dimensions, "3:2");
    assert!(a.tags.contains(&"portrait".to_string()));
    assert!(a.tags.contains(&"cinematic".to_string()));

    let b = gallery.items.iter().find(|i| i.id == ID_B).unwrap();
    assert_eq!(b.model, "Midjourney v6");
    assert_eq!(b.dimensions, "16:9");
    assert_eq!(b.tags, vec!["general"]);
    assert_eq!(b.cdn_url, "");

    let c = gallery.items.iter().find(|i| i.id == ID_C).unwrap();
    assert_eq!(c.created, "2026-02-10");
}

#[tokio::test]
async fn rebuild_backs_up_existing_gallery() {
    let dir = tempfile::tempdir().unwrap();
    let url = seeded_db(dir.path()).await;
    let cfg = config_in(dir.path(), &url);

    std::fs::create_dir_all(cfg.gallery_json.parent().unwrap()).unwrap();
    std::fs::write(&cfg.gallery_json, "{\"items\": [{\"id\": \"old\"}]}").unwrap();

    let report = rebuild::run(&cfg).await.unwrap();
    let backup = report.backup.expect("backup path");
    assert!(backup.ends_with("gallery.json.backup-before-rebuild"));
    assert_eq!(
        std::fs::read_to_string(backup).unwrap(),
        "{\"items\": [{\"id\": \"old\"}]}"
    );
}

#[tokio::test]
async fn sync_dates_updates_only_what_changed() {
    let dir = tempfile::tempdir().unwrap();
    let url = seeded_db(dir.path()).await;
    let cfg = config_in(dir.path(), &url);

    std::fs::create_dir_all(cfg.gallery_json.parent().unwrap()).unwrap();
    let original = format!(
        r#"{{
  "items": [
    {{"id": "{ID_A}", "name": "Heroine", "created": "2024-12-14", "featured": true}},
    {{"id": "{ID_B}", "name": "Rock", "created": "2026-01-01"}},
    {{"id": "{ID_C}", "name": "Mystery", "created": "2024-07-07"}},
    {{"id": "not-in-db", "name": "Orphan", "created": "2023-01-01"}}
  ]
}}"#
    );
    std::fs::write(&cfg.gallery_json, &original).unwrap();

    let report = sync_dates::run(&cfg).await.unwrap();
    let u = &report.updates;
    assert_eq!(u.total, 4);
    assert_eq!(u.updated, 1);
    assert_eq!(u.already_correct, 1);
    assert_eq!(u.skipped, 1);
    assert_eq!(u.missing, 1);

    let backup = report.backup.expect("backup path");
    assert_eq!(std::fs::read_to_string(backup).unwrap(), original);

    let gallery = gallery_store::load_gallery(&cfg.gallery_json).await.unwrap();
    assert_eq!(gallery.items[0].created, "2025-12-21");
    assert_eq!(gallery.items[0].name, "Heroine");
    assert_eq!(gallery.items[0].extra["featured"], serde_json::Value::Bool(true));
    assert_eq!(gallery.items[2].created, "2024-07-07");
    assert_eq!(gallery.items[3].created, "2023-01-01");
}

#[tokio::test]
async fn sync_dates_without_gallery_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let url = seeded_db(dir.path()).await;
    let cfg = config_in(dir.path(), &url);

    let err = sync_dates::run(&cfg).await.unwrap_err();
    assert!(matches!(err, SyncError::MissingInput(_)));
    assert!(!cfg.gallery_json.exists());
}

#[tokio::test]
async fn missing_database_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("absent.db").display());
    let cfg = config_in(dir.path(), &url);

    let err = rebuild::run(&cfg).await.unwrap_err();
    assert!(matches!(err, SyncError::MissingInput(_)));
    assert!(!cfg.gallery_json.exists());
}

#[tokio::test]
async fn overlap_counts_shared_ids() {
    let dir = tempfile::tempdir().unwrap();
    let url = seeded_db(dir.path()).await;
    let cfg = config_in(dir.path(), &url);

    std::fs::create_dir_all(cfg.gallery_json.parent().unwrap()).unwrap();
    std::fs::write(
        &cfg.gallery_json,
        format!(r#"{{"items": [{{"id": "{ID_A}"}}, {{"id": "other"}}]}}"#),
    )
    .unwrap();

    let report = overlap::run(&cfg).await.unwrap();
    assert_eq!(report.gallery_ids, 2);
    assert_eq!(report.db_ids, 3);
    assert_eq!(report.overlap, 1);
    assert_eq!(report.sample, vec![ID_A.to_string()]);
}
