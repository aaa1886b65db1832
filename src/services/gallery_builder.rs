//! Conversion of job database rows into gallery items.

use crate::{
    models::{gallery_item::GalleryItem, job_record::JobRecord},
    services::{
        categorize::categorize_prompt,
        dates::{self, DateFallback},
    },
};
use tracing::warn;

pub const DEFAULT_MODEL: &str = "Midjourney v7";
pub const DEFAULT_DIMENSIONS: &str = "16:9";
pub const JOB_PAGE_BASE: &str = "https://www.midjourney.com/jobs/";

const KNOWN_RATIOS: [&str; 7] = ["1:1", "16:9", "9:16", "3:2", "2:3", "4:3", "3:4"];

/// Model label derived from the raw parameter string.
pub fn model_version(raw_parameters: Option<&str>) -> &'static str {
    let Some(params) = raw_parameters.filter(|p| !p.is_empty()) else {
        return DEFAULT_MODEL;
    };
    let lowered = params.to_lowercase();
    if params.contains("--v 7") || lowered.contains("v7") {
        "Midjourney v7"
    } else if params.contains("--v 6") || lowered.contains("v6") {
        "Midjourney v6"
    } else if params.contains("--v 5") || lowered.contains("v5") {
        "Midjourney v5"
    } else {
        DEFAULT_MODEL
    }
}

pub fn dimensions(aspect_ratio: Option<&str>) -> &'static str {
    aspect_ratio
        .and_then(|ratio| KNOWN_RATIOS.iter().find(|known| **known == ratio))
        .copied()
        .unwrap_or(DEFAULT_DIMENSIONS)
}

pub fn job_page_url(job_id: &str) -> String {
    format!("{JOB_PAGE_BASE}{job_id}")
}

/// Build a fresh gallery item from a database row.
pub fn item_from_job(job: &JobRecord, date_policy: DateFallback) -> GalleryItem {
    let created = match date_policy.resolve(job.midjourney_created_at.as_deref()) {
        Ok(date) => dates::to_iso(date),
        Err(err) => {
            warn!("job {}: {}", job.job_id, err);
            String::new()
        }
    };
    let short_id: String = job.job_id.chars().take(8).collect();
    let prompt = job.prompt.clone().unwrap_or_default();

    GalleryItem {
        id: job.job_id.clone(),
        name: format!("Midjourney {short_id}"),
        kind: "image".into(),
        source: "midjourney".into(),
        model: model_version(job.raw_parameters.as_deref()).into(),
        url: job
            .midjourney_url
            .clone()
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| job_page_url(&job.job_id)),
        cdn_url: job.cdn_url.clone().unwrap_or_default(),
        tags: categorize_prompt(&prompt),
        prompt,
        parameters: job.raw_parameters.clone().unwrap_or_default(),
        dimensions: dimensions(job.aspect_ratio.as_deref()).into(),
        created,
        extra: Default::default(),
    }
}

/// One item per row, in row order.
pub fn build_items(jobs: &[JobRecord], date_policy: DateFallback) -> Vec<GalleryItem> {
    jobs.iter()
        .map(|job| item_from_job(job, date_policy))
        .collect()
}
