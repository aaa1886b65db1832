//! Rebuild gallery.json from the job database.
//!
//! This is a full replacement: every existing item is dropped and one item
//! is produced per distinct job id, the first row winning when an id
//! repeats. The previous file is kept as a backup.

use super::{heading, rule};
use crate::{
    config::AppConfig,
    errors::SyncResult,
    models::{gallery_item::Gallery, job_record::JobRecord},
    services::{
        dates::{DateFallback, rebuild_fallback_date},
        gallery_builder, gallery_store,
        job_repository::JobRepository,
    },
};
use std::{collections::HashSet, fmt, path::PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct RebuildReport {
    pub total: usize,
    /// Items whose date came from the database rather than the fallback.
    pub with_dates: usize,
    /// Rows dropped because an earlier row had the same job id.
    pub duplicates_dropped: usize,
    pub backup: Option<PathBuf>,
    pub gallery: PathBuf,
}

pub async fn run(cfg: &AppConfig) -> SyncResult<RebuildReport> {
    info!("Loading items from database...");
    let repo = JobRepository::connect(&cfg.database_url).await?;
    let jobs = repo.fetch_all_jobs().await?;
    info!("Loaded {} items from database", jobs.len());

    let (jobs, duplicates_dropped) = dedupe_jobs(jobs);
    if duplicates_dropped > 0 {
        warn!("Dropped {} rows with repeated job ids", duplicates_dropped);
    }

    let items =
        gallery_builder::build_items(&jobs, DateFallback::Default(rebuild_fallback_date()));
    let with_dates = jobs
        .iter()
        .filter(|job| {
            DateFallback::Skip
                .resolve(job.midjourney_created_at.as_deref())
                .is_ok()
        })
        .count();
    info!("Converted {} items", items.len());

    let gallery = Gallery::new(items);
    let backup = gallery_store::save_gallery(
        &cfg.gallery_json,
        &gallery,
        gallery_store::REBUILD_BACKUP_SUFFIX,
    )
    .await?;

    Ok(RebuildReport {
        total: gallery.items.len(),
        with_dates,
        duplicates_dropped,
        backup,
        gallery: cfg.gallery_json.clone(),
    })
}

/// Keep the first row for each job id, in row order.
///
/// Returns the kept rows and how many were dropped.
pub fn dedupe_jobs(jobs: Vec<JobRecord>) -> (Vec<JobRecord>, usize) {
    let total = jobs.len();
    let mut seen = HashSet::new();
    let mut kept = Vec::with_capacity(total);
    for job in jobs {
        if seen.insert(job.job_id.clone()) {
            kept.push(job);
        } else {
            debug!("dropping repeated job {}", job.job_id);
        }
    }
    let dropped = total - kept.len();
    (kept, dropped)
}

impl fmt::Display for RebuildReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        heading(f, "GENERATION COMPLETE")?;
        writeln!(f, "Total items:         {}", self.total)?;
        writeln!(f, "Items with dates:    {}", self.with_dates)?;
        if self.duplicates_dropped > 0 {
            writeln!(f, "Duplicate rows:      {} dropped", self.duplicates_dropped)?;
        }
        match &self.backup {
            Some(path) => writeln!(f, "Backup location:     {}", path.display())?,
            None => writeln!(f, "Backup location:     (no previous gallery)")?,
        }
        writeln!(f, "Gallery location:    {}", self.gallery.display())?;
        rule(f)?;
        writeln!(
            f,
            "NOTE: This is a complete rebuild. All previous gallery items have been"
        )?;
        writeln!(
            f,
            "replaced with database content. Check the backup if you need old data."
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(id: &str, prompt: &str) -> JobRecord {
        JobRecord {
            job_id: id.into(),
            prompt: Some(prompt.into()),
            ..Default::default()
        }
    }

    #[test]
    fn repeated_job_ids_keep_the_first_row() {
        let rows = vec![
            job("a", "first a"),
            job("b", "only b"),
            job("a", "second a"),
            job("c", "only c"),
            job("a", "third a"),
        ];
        let (kept, dropped) = dedupe_jobs(rows);
        assert_eq!(dropped, 2);
        let ids: Vec<&str> = kept.iter().map(|j| j.job_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(kept[0].prompt.as_deref(), Some("first a"));
    }

    #[test]
    fn distinct_rows_are_untouched() {
        let rows = vec![job("a", ""), job("b", "")];
        let (kept, dropped) = dedupe_jobs(rows.clone());
        assert_eq!(dropped, 0);
        assert_eq!(kept, rows);
    }

    #[test]
    fn summary_mentions_dropped_rows() {
        let report = RebuildReport {
            total: 3,
            with_dates: 3,
            duplicates_dropped: 2,
            backup: None,
            gallery: PathBuf::from("data/gallery.json"),
        };
        assert!(report.to_string().contains("Duplicate rows:      2 dropped"));
    }
}
