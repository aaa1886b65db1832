//! Compare the gallery's ids with the database's job ids.

use crate::{
    config::AppConfig,
    errors::SyncResult,
    services::{gallery_store, job_repository::JobRepository, reconcile::partition_by},
};
use std::{collections::BTreeSet, fmt};

const SAMPLE_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct OverlapReport {
    pub gallery_ids: usize,
    pub db_ids: usize,
    pub overlap: usize,
    pub sample: Vec<String>,
}

pub async fn run(cfg: &AppConfig) -> SyncResult<OverlapReport> {
    let gallery = gallery_store::load_gallery(&cfg.gallery_json).await?;
    let repo = JobRepository::connect(&cfg.database_url).await?;
    let db_ids = repo.fetch_job_ids().await?;

    let gallery_ids: Vec<String> = gallery.items.into_iter().map(|item| item.id).collect();
    Ok(compare_ids(&gallery_ids, &db_ids))
}

/// Overlap of two id lists, each treated as a set.
pub fn compare_ids(gallery_ids: &[String], db_ids: &[String]) -> OverlapReport {
    let left: Vec<&str> = gallery_ids
        .iter()
        .map(String::as_str)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let right: Vec<&str> = db_ids
        .iter()
        .map(String::as_str)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let joined = partition_by(&left, &right, |id| *id, |id| *id);
    OverlapReport {
        gallery_ids: left.len(),
        db_ids: right.len(),
        overlap: joined.matched.len(),
        sample: joined
            .matched
            .iter()
            .take(SAMPLE_SIZE)
            .map(|(id, _)| id.to_string())
            .collect(),
    }
}

impl fmt::Display for OverlapReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Gallery IDs: {}", self.gallery_ids)?;
        writeln!(f, "DB IDs: {}", self.db_ids)?;
        writeln!(f, "Overlap: {}", self.overlap)?;
        if !self.sample.is_empty() {
            writeln!(f, "\nSample matching IDs:")?;
            for id in &self.sample {
                writeln!(f, "  {id}")?;
            }
        }
        Ok(())
    }
}
