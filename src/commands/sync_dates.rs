//! Copy creation dates from the job database into gallery.json.

use super::{heading, rule};
use crate::{
    config::AppConfig,
    errors::SyncResult,
    models::{gallery_item::GalleryItem, job_record::JobRecord},
    services::{
        dates::{self, DateFallback, DateParseError},
        gallery_store,
        job_repository::JobRepository,
        reconcile::{self, FieldMapping, UpdateReport},
    },
};
use std::{fmt, path::PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct SyncDatesReport {
    pub updates: UpdateReport<DateParseError>,
    pub backup: Option<PathBuf>,
}

fn created_field(item: &mut GalleryItem) -> &mut String {
    &mut item.created
}

fn derive_created(job: &JobRecord) -> Result<Option<String>, DateParseError> {
    DateFallback::Skip
        .resolve(job.midjourney_created_at.as_deref())
        .map(|date| Some(dates::to_iso(date)))
}

/// Apply database dates to `items` in place.
///
/// Rows whose date cannot be parsed leave the item's date alone.
pub fn sync_created_dates(
    items: &mut [GalleryItem],
    jobs: &[JobRecord],
) -> UpdateReport<DateParseError> {
    let mappings = [FieldMapping {
        field: "created",
        target: created_field,
        derive: &derive_created,
    }];
    let report = reconcile::apply_updates(items, jobs, &mappings);
    for failure in &report.failures {
        warn!(
            "Failed to parse {} for {}: {}",
            failure.field, failure.key, failure.error
        );
    }
    report
}

pub async fn run(cfg: &AppConfig) -> SyncResult<SyncDatesReport> {
    let mut gallery = gallery_store::load_gallery(&cfg.gallery_json).await?;
    info!("Loaded {} items from gallery", gallery.items.len());

    let repo = JobRepository::connect(&cfg.database_url).await?;
    let jobs = repo.fetch_job_dates().await?;
    info!("Loaded {} dates from database", jobs.len());

    let updates = sync_created_dates(&mut gallery.items, &jobs);

    let backup = gallery_store::save_gallery(
        &cfg.gallery_json,
        &gallery,
        gallery_store::SYNC_BACKUP_SUFFIX,
    )
    .await?;

    Ok(SyncDatesReport { updates, backup })
}

impl fmt::Display for SyncDatesReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let u = &self.updates;
        heading(f, "SYNC COMPLETE")?;
        writeln!(f, "Total items:       {}", u.total)?;
        writeln!(f, "Updated:           {}", u.updated)?;
        writeln!(f, "Already correct:   {}", u.already_correct)?;
        writeln!(f, "Unparseable dates: {}", u.skipped)?;
        writeln!(f, "Missing from DB:   {}", u.missing)?;
        writeln!(f, "Success rate:      {:.1}%", u.success_rate())?;
        if let Some(path) = &self.backup {
            writeln!(f, "\nBackup location: {}", path.display())?;
        }
        rule(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, created: &str) -> GalleryItem {
        GalleryItem {
            id: id.into(),
            created: created.into(),
            ..Default::default()
        }
    }

    fn job(id: &str, date: Option<&str>) -> JobRecord {
        JobRecord {
            job_id: id.into(),
            midjourney_created_at: date.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn dates_are_synced_and_counted() {
        let mut items = vec![
            item("a", "2024-01-01"),
            item("b", "2025-12-21"),
            item("c", "2024-03-03"),
            item("d", "2024-04-04"),
        ];
        let jobs = vec![
            job("a", Some("Jan 1, 26, 12:00 AM")),
            job("b", Some("Dec 21, 25, 8:36 PM")),
            job("c", Some("garbage")),
        ];

        let report = sync_created_dates(&mut items, &jobs);
        assert_eq!(report.updated, 1);
        assert_eq!(report.already_correct, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.missing, 1);
        assert_eq!(report.failures[0].key, "c");

        assert_eq!(items[0].created, "2026-01-01");
        assert_eq!(items[2].created, "2024-03-03");
        assert_eq!(items[3].created, "2024-04-04");
    }

    #[test]
    fn summary_lists_every_count() {
        let mut items = vec![item("a", "")];
        let jobs = vec![job("a", Some("Dec 21, 25, 8:36 PM"))];
        let report = SyncDatesReport {
            updates: sync_created_dates(&mut items, &jobs),
            backup: None,
        };
        let text = report.to_string();
        assert!(text.contains("Updated:           1"));
        assert!(text.contains("Success rate:      100.0%"));
    }
}
