//! Reading and writing the gallery data files.
//!
//! `gallery.json` is the primary copy; `gallery.js` carries the same JSON
//! bound to `embeddedData` so the site also works from `file://`. Every
//! overwrite is preceded by a backup copy and goes through a temp file that
//! is renamed into place.

use crate::{
    errors::{SyncError, SyncResult},
    models::gallery_item::{Gallery, GalleryItem},
    services::block_replace::{self, EmbeddedDocument},
};
use serde_json::Value;
use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use tracing::{debug, info};
use uuid::Uuid;

/// Start of the data binding inside `gallery.js`.
pub const GALLERY_JS_MARKER: &str = "const embeddedData = ";

/// Names the code after the data block must still contain.
pub const GALLERY_JS_IDENTIFIERS: &[&str] =
    &["renderGallery", "openModal", "addEventListener", "loadData"];

pub const SYNC_BACKUP_SUFFIX: &str = ".backup";
pub const REBUILD_BACKUP_SUFFIX: &str = ".backup-before-rebuild";

/// Load `gallery.json`.
///
/// Accepts `{"items": [...]}` as well as a bare array of items.
pub async fn load_gallery(path: &Path) -> SyncResult<Gallery> {
    let text = read_input(path).await?;
    parse_gallery(&text).map_err(|source| SyncError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn parse_gallery(text: &str) -> Result<Gallery, serde_json::Error> {
    match serde_json::from_str::<Value>(text)? {
        items @ Value::Array(_) => Ok(Gallery::new(serde_json::from_value::<Vec<GalleryItem>>(
            items,
        )?)),
        other => serde_json::from_value(other),
    }
}

/// Serialize with two-space indentation; non-ASCII stays literal.
pub fn render_gallery(gallery: &Gallery) -> SyncResult<String> {
    Ok(serde_json::to_string_pretty(gallery)?)
}

/// Backup, then overwrite `gallery.json`. Returns the backup path, if any.
pub async fn save_gallery(
    path: &Path,
    gallery: &Gallery,
    backup_suffix: &str,
) -> SyncResult<Option<PathBuf>> {
    let text = render_gallery(gallery)?;
    let backup = backup_file(path, backup_suffix).await?;
    write_atomic(path, &text).await?;
    info!("Saved {} items to {}", gallery.items.len(), path.display());
    Ok(backup)
}

/// Produce the new `gallery.js` text with `gallery` embedded.
///
/// Fails without producing output if the block cannot be located or if the
/// code after it lost any of `GALLERY_JS_IDENTIFIERS`. Only the tail is
/// searched; the payload may mention those names in prompts.
pub fn embed_gallery(js: &str, gallery: &Gallery) -> SyncResult<String> {
    let payload = render_gallery(gallery)?;
    let mut doc = EmbeddedDocument::parse(js, GALLERY_JS_MARKER)?;
    block_replace::verify_identifiers(doc.tail(), GALLERY_JS_IDENTIFIERS)?;
    doc.set_block(payload);
    Ok(doc.render())
}

/// Re-embed `gallery` into the JS file at `path`, keeping a backup.
pub async fn save_gallery_js(path: &Path, gallery: &Gallery) -> SyncResult<()> {
    let original = read_input(path).await?;
    let updated = embed_gallery(&original, gallery)?;
    backup_file(path, SYNC_BACKUP_SUFFIX).await?;
    write_atomic(path, &updated).await?;
    info!(
        "Embedded {} items into {}",
        gallery.items.len(),
        path.display()
    );
    Ok(())
}

/// Write `gallery` to both files, preparing both outputs before touching
/// either so a bad `gallery.js` leaves `gallery.json` as it was.
pub async fn save_gallery_and_js(
    json_path: &Path,
    js_path: &Path,
    gallery: &Gallery,
) -> SyncResult<()> {
    let json = render_gallery(gallery)?;
    let js = embed_gallery(&read_input(js_path).await?, gallery)?;

    backup_file(json_path, SYNC_BACKUP_SUFFIX).await?;
    backup_file(js_path, SYNC_BACKUP_SUFFIX).await?;
    write_atomic(json_path, &json).await?;
    write_atomic(js_path, &js).await?;
    info!(
        "Saved {} items to {} and {}",
        gallery.items.len(),
        json_path.display(),
        js_path.display()
    );
    Ok(())
}

/// Path of the backup copy for `path`.
pub fn backup_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

/// Copy `path` next to itself with `suffix` appended.
///
/// Returns `None` when there is nothing to back up.
pub async fn backup_file(path: &Path, suffix: &str) -> SyncResult<Option<PathBuf>> {
    let target = backup_path(path, suffix);
    match fs::copy(path, &target).await {
        Ok(_) => {
            info!("Backup saved to {}", target.display());
            Ok(Some(target))
        }
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!("no existing {} to back up", path.display());
            Ok(None)
        }
        Err(err) => Err(SyncError::Io(err)),
    }
}

/// Write `contents` to a temp sibling, fsync, then rename over `path`.
pub async fn write_atomic(path: &Path, contents: &str) -> SyncResult<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent).await?;
    let tmp_path = parent.join(format!(".tmp-{}", Uuid::new_v4()));

    let mut file = File::create(&tmp_path).await?;
    if let Err(err) = write_and_sync(&mut file, contents).await {
        let _ = fs::remove_file(&tmp_path).await;
        return Err(SyncError::Io(err));
    }
    drop(file);

    if let Err(err) = fs::rename(&tmp_path, path).await {
        let _ = fs::remove_file(&tmp_path).await;
        return Err(SyncError::Io(err));
    }
    Ok(())
}

async fn write_and_sync(file: &mut File, contents: &str) -> std::io::Result<()> {
    file.write_all(contents.as_bytes()).await?;
    file.flush().await?;
    file.sync_all().await
}

/// Read a required input, mapping absence to `MissingInput`.
pub async fn read_input(path: &Path) -> SyncResult<String> {
    match fs::read_to_string(path).await {
        Ok(text) => Ok(text),
        Err(err) if err.kind() == ErrorKind::NotFound => {
            Err(SyncError::MissingInput(path.to_path_buf()))
        }
        Err(err) => Err(SyncError::Io(err)),
    }
}
