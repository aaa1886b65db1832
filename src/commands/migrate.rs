//! Image migration subcommands: status, export-urls, scan, upload.

use super::{heading, rule};
use crate::{
    config::AppConfig,
    errors::SyncResult,
    services::{
        gallery_builder::JOB_PAGE_BASE,
        gallery_store,
        migration::{self, HostingStatus, UploadReport},
    },
};
use anyhow::Result;
use std::{fmt, path::PathBuf};
use tracing::{info, warn};

const UNMATCHED_PREVIEW: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct StatusReport {
    pub status: HostingStatus,
}

pub async fn status(cfg: &AppConfig) -> SyncResult<StatusReport> {
    let gallery = gallery_store::load_gallery(&cfg.gallery_json).await?;
    Ok(StatusReport {
        status: migration::hosting_status(&gallery.items, cfg.public_url.as_deref()),
    })
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.status;
        heading(f, "IMAGE HOSTING STATUS")?;
        writeln!(f, "Total items:          {}", s.total)?;
        writeln!(f, "Legacy CDN:           {}", s.legacy_cdn)?;
        writeln!(f, "Migrated:             {}", s.migrated)?;
        writeln!(f, "Other:                {}", s.other)?;
        if s.legacy_cdn > 0 {
            writeln!(
                f,
                "\nWARNING: {} images still use the legacy CDN",
                s.legacy_cdn
            )?;
            writeln!(
                f,
                "Run 'gallery-sync migrate scan <download-dir>' to check progress"
            )?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportReport {
    pub count: usize,
    pub output: PathBuf,
    /// Copy of a previous export that was about to be overwritten.
    pub backup: Option<PathBuf>,
}

pub async fn export_urls(cfg: &AppConfig, output: Option<PathBuf>) -> SyncResult<ExportReport> {
    let gallery = gallery_store::load_gallery(&cfg.gallery_json).await?;
    let output = output.unwrap_or_else(|| PathBuf::from("download-urls.txt"));
    let backup = gallery_store::backup_file(&output, gallery_store::SYNC_BACKUP_SUFFIX).await?;
    gallery_store::write_atomic(&output, &migration::export_urls(&gallery.items)).await?;
    Ok(ExportReport {
        count: gallery.items.len(),
        output,
        backup,
    })
}

impl fmt::Display for ExportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Exported {} URLs to {}",
            self.count,
            self.output.display()
        )?;
        if let Some(path) = &self.backup {
            writeln!(f, "Previous list saved to {}", path.display())?;
        }
        writeln!(f, "Visit each URL to download the image.")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScanReport {
    pub gallery_items: usize,
    pub images_found: usize,
    pub matched: usize,
    /// `(id, name)` of the first unmatched items.
    pub unmatched_preview: Vec<(String, String)>,
    pub unmatched: usize,
}

pub async fn scan(cfg: &AppConfig, dir: Option<PathBuf>) -> SyncResult<ScanReport> {
    let gallery = gallery_store::load_gallery(&cfg.gallery_json).await?;
    let dir = cfg.download_dir_or(dir);
    let images = migration::scan_downloaded_images(&dir);
    let joined = migration::match_images(&gallery.items, &images);

    Ok(ScanReport {
        gallery_items: gallery.items.len(),
        images_found: images.len(),
        matched: joined.matched.len(),
        unmatched: joined.left_only.len(),
        unmatched_preview: joined
            .left_only
            .iter()
            .take(UNMATCHED_PREVIEW)
            .map(|item| (item.id.clone(), item.name.clone()))
            .collect(),
    })
}

impl fmt::Display for ScanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        heading(f, "SCANNING DOWNLOADED IMAGES")?;
        writeln!(f, "Gallery items: {}", self.gallery_items)?;
        writeln!(f, "Downloaded images found: {}", self.images_found)?;
        writeln!(f, "Matched: {}", self.matched)?;
        writeln!(f, "Unmatched (need downloading): {}", self.unmatched)?;
        if !self.unmatched_preview.is_empty() {
            writeln!(f, "\nFirst {} unmatched items:", self.unmatched_preview.len())?;
            for (id, name) in &self.unmatched_preview {
                let short: String = id.chars().take(8).collect();
                writeln!(f, "  {short}... - {name}")?;
            }
        }
        writeln!(f, "\nTo download unmatched images, visit each job page:")?;
        writeln!(f, "  {JOB_PAGE_BASE}<job_id>")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MigrateUploadReport {
    pub matched: usize,
    pub unmatched: usize,
    pub upload: UploadReport,
    /// False when there was nothing to upload and no file was rewritten.
    pub files_updated: bool,
}

/// Upload matched images, then rewrite gallery.json and gallery.js.
///
/// Both files are written only after the whole batch has run.
pub async fn upload(cfg: &AppConfig, dir: Option<PathBuf>) -> Result<MigrateUploadReport> {
    let sink = cfg.build_sink()?;
    let target = cfg.upload_target();
    if target.public_url.is_none() {
        warn!("no public URL configured; cdn_url fields will not be rewritten");
    }

    let mut gallery = gallery_store::load_gallery(&cfg.gallery_json).await?;
    let dir = cfg.download_dir_or(dir);
    let images = migration::scan_downloaded_images(&dir);
    let plan = migration::plan_uploads(&gallery.items, &images);
    let matched = plan.len();
    let unmatched = gallery.items.len() - matched;
    info!("Matched: {} | Unmatched: {}", matched, unmatched);

    if plan.is_empty() {
        return Ok(MigrateUploadReport {
            matched,
            unmatched,
            upload: UploadReport::default(),
            files_updated: false,
        });
    }

    let upload = migration::upload_matched(&sink, &target, &mut gallery.items, &plan).await;
    info!("Uploaded {}/{} images", upload.uploaded, upload.attempted);

    gallery_store::save_gallery_and_js(&cfg.gallery_json, &cfg.gallery_js, &gallery).await?;

    Ok(MigrateUploadReport {
        matched,
        unmatched,
        upload,
        files_updated: true,
    })
}

impl fmt::Display for MigrateUploadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        heading(f, "UPLOADING IMAGES")?;
        writeln!(f, "Matched: {} | Unmatched: {}", self.matched, self.unmatched)?;
        if !self.files_updated {
            writeln!(f, "No matched images to upload.")?;
            return rule(f);
        }
        writeln!(
            f,
            "Uploaded {}/{} images ({} failed)",
            self.upload.uploaded, self.upload.attempted, self.upload.failed
        )?;
        for (job_id, error) in &self.upload.failures {
            writeln!(f, "  Failed {job_id}: {error}")?;
        }
        writeln!(f, "\nDone! CDN URLs updated in gallery.json and gallery.js")?;
        rule(f)
    }
}
