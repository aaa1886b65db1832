//! Moving gallery images off the expiring CDN.
//!
//! Downloaded files are matched to gallery items through the job UUID in
//! their file name, uploaded one at a time to an [`ObjectSink`], and the
//! item's `cdn_url` is pointed at the new public location.

use crate::{
    models::gallery_item::GalleryItem,
    services::{
        gallery_builder::job_page_url,
        object_sink::{ObjectSink, PutObject},
        reconcile::{Keyed, Partition, partition_by},
    },
};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};
use tracing::{info, warn};
use walkdir::WalkDir;

pub const IMAGE_EXTENSIONS: [&str; 4] = [".png", ".jpg", ".jpeg", ".webp"];
pub const CACHE_CONTROL: &str = "public, max-age=31536000";
pub const LEGACY_CDN_HOST: &str = "cdn.midjourney.com";
const PROGRESS_EVERY: usize = 50;
const UUID_LEN: usize = 36;

/// A downloaded image that carries a job id in its file name.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageFile {
    pub path: PathBuf,
    pub job_id: String,
    /// Lower-case, including the dot.
    pub extension: String,
}

impl Keyed for ImageFile {
    fn key(&self) -> &str {
        &self.job_id
    }
}

/// Where uploads go and how their public URLs are formed.
#[derive(Debug, Clone)]
pub struct UploadTarget {
    pub bucket: String,
    pub key_prefix: String,
    pub public_url: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct UploadReport {
    pub attempted: usize,
    pub uploaded: usize,
    pub failed: usize,
    /// `(job_id, error message)` per failed upload.
    pub failures: Vec<(String, String)>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HostingStatus {
    pub total: usize,
    pub legacy_cdn: usize,
    pub migrated: usize,
    pub other: usize,
}

/// First canonical lower-case UUID (`8-4-4-4-12` hex) inside `text`.
pub fn extract_job_id(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    if bytes.len() < UUID_LEN {
        return None;
    }
    (0..=bytes.len() - UUID_LEN)
        .find(|&start| is_uuid(&bytes[start..start + UUID_LEN]))
        .map(|start| &text[start..start + UUID_LEN])
}

fn is_uuid(candidate: &[u8]) -> bool {
    candidate.iter().enumerate().all(|(i, &b)| match i {
        8 | 13 | 18 | 23 => b == b'-',
        _ => b.is_ascii_digit() || (b'a'..=b'f').contains(&b),
    })
}

/// The key an item is matched on: its id, or the UUID in its CDN URL.
pub fn item_join_key(item: &GalleryItem) -> &str {
    if !item.id.is_empty() {
        return &item.id;
    }
    extract_job_id(&item.cdn_url).unwrap_or_default()
}

/// Lower-cased extension with its leading dot, if it is an image type.
fn image_extension(path: &Path) -> Option<String> {
    let ext = format!(".{}", path.extension()?.to_str()?.to_lowercase());
    IMAGE_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// Recursively collect image files under `dir` that name a job id.
///
/// A later file with the same job id replaces an earlier one. A missing
/// directory yields an empty list.
pub fn scan_downloaded_images(dir: &Path) -> Vec<ImageFile> {
    if !dir.exists() {
        warn!("Download directory not found: {}", dir.display());
        return Vec::new();
    }

    let mut images: Vec<ImageFile> = Vec::new();
    let mut by_id: HashMap<String, usize> = HashMap::new();

    for entry in WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let path = entry.path();
        let Some(extension) = image_extension(path) else {
            continue;
        };
        let Some(job_id) = entry.file_name().to_str().and_then(extract_job_id) else {
            continue;
        };

        let image = ImageFile {
            path: path.to_path_buf(),
            job_id: job_id.to_string(),
            extension,
        };
        match by_id.get(job_id) {
            Some(&slot) => images[slot] = image,
            None => {
                by_id.insert(image.job_id.clone(), images.len());
                images.push(image);
            }
        }
    }
    images
}

pub fn match_images<'a>(
    items: &'a [GalleryItem],
    images: &'a [ImageFile],
) -> Partition<'a, GalleryItem, ImageFile> {
    partition_by(items, images, item_join_key, |image: &'a ImageFile| {
        image.job_id.as_str()
    })
}

/// Matched uploads as `(item index, image)`.
pub fn plan_uploads(items: &[GalleryItem], images: &[ImageFile]) -> Vec<(usize, ImageFile)> {
    let indexed: Vec<(usize, &GalleryItem)> = items.iter().enumerate().collect();
    partition_by(
        &indexed,
        images,
        |(_, item)| item_join_key(item),
        |image| image.job_id.as_str(),
    )
    .matched
    .into_iter()
    .map(|((index, _), image)| (*index, image.clone()))
    .collect()
}

pub fn object_key(prefix: &str, job_id: &str, extension: &str) -> String {
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        format!("{job_id}{extension}")
    } else {
        format!("{prefix}/{job_id}{extension}")
    }
}

pub fn content_type(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        ".jpg" | ".jpeg" => "image/jpeg",
        ".webp" => "image/webp",
        _ => "image/png",
    }
}

pub fn public_object_url(public_url: &str, key: &str) -> String {
    format!("{}/{}", public_url.trim_end_matches('/'), key)
}

/// Upload every planned image, one call per file.
///
/// A failed upload is logged and counted and the batch moves on. Only
/// successful uploads touch `cdn_url`, and only when a public URL is set.
pub async fn upload_matched<S: ObjectSink>(
    sink: &S,
    target: &UploadTarget,
    items: &mut [GalleryItem],
    plan: &[(usize, ImageFile)],
) -> UploadReport {
    let mut report = UploadReport {
        attempted: plan.len(),
        ..Default::default()
    };

    for (index, image) in plan {
        let key = object_key(&target.key_prefix, &image.job_id, &image.extension);
        let request = PutObject {
            bucket: &target.bucket,
            key: &key,
            content_type: content_type(&image.extension),
            cache_control: CACHE_CONTROL,
        };

        match sink.put_object(&request, &image.path).await {
            Ok(_) => {
                if let (Some(base), Some(item)) = (&target.public_url, items.get_mut(*index)) {
                    item.cdn_url = public_object_url(base, &key);
                }
                report.uploaded += 1;
                if report.uploaded % PROGRESS_EVERY == 0 {
                    info!("Uploaded {}/{}...", report.uploaded, plan.len());
                }
            }
            Err(err) => {
                warn!("Failed to upload {}: {}", image.job_id, err);
                report.failed += 1;
                report.failures.push((image.job_id.clone(), err.to_string()));
            }
        }
    }

    report
}

/// Count where each item's image is currently served from.
pub fn hosting_status(items: &[GalleryItem], public_url: Option<&str>) -> HostingStatus {
    let mut status = HostingStatus {
        total: items.len(),
        ..Default::default()
    };
    for item in items {
        let url = item.cdn_url.as_str();
        let on_public = public_url.is_some_and(|base| !base.is_empty() && url.starts_with(base));
        if url.contains(LEGACY_CDN_HOST) {
            status.legacy_cdn += 1;
        } else if on_public || url.contains("r2") || url.contains("cloudflare") {
            status.migrated += 1;
        } else {
            status.other += 1;
        }
    }
    status
}

/// One job page URL per line, for manual download.
pub fn export_urls(items: &[GalleryItem]) -> String {
    items
        .iter()
        .map(|item| format!("{}\n", job_page_url(&item.id)))
        .collect()
}
