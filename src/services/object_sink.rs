//! Write-only object storage destinations for migrated images.
//!
//! `LocalSink` lays objects out on disk beneath `root/{bucket}/{key}` and
//! records content-type and cache-control in a JSON sidecar. `HttpSink`
//! streams each file as a `PUT {endpoint}/{bucket}/{key}` to an
//! S3-compatible endpoint.

use bytes::Bytes;
use futures::{Stream, StreamExt, pin_mut};
use md5::Context;
use reqwest::header;
use serde::Serialize;
use std::{
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};
use thiserror::Error;
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use tokio_util::io::ReaderStream;
use tracing::debug;
use uuid::Uuid;

const MAX_OBJECT_KEY_LEN: usize = 1024;
const BUCKET_NAME_MIN_LEN: usize = 3;
const BUCKET_NAME_MAX_LEN: usize = 63;
const METADATA_SUFFIX: &str = ".meta.json";

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("invalid object key `{0}`")]
    InvalidObjectKey(String),
    #[error("bucket `{name}` invalid: {reason}")]
    InvalidBucketName { name: String, reason: String },
    #[error("upload of `{key}` rejected with HTTP status {status}")]
    Rejected { key: String, status: u16 },
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type SinkResult<T> = Result<T, SinkError>;

/// Everything about an object except its bytes.
#[derive(Debug, Clone)]
pub struct PutObject<'a> {
    pub bucket: &'a str,
    pub key: &'a str,
    pub content_type: &'a str,
    pub cache_control: &'a str,
}

/// What the sink reports back for a stored object.
#[derive(Debug, Clone, PartialEq)]
pub struct PutReceipt {
    pub key: String,
    pub etag: Option<String>,
    pub size_bytes: u64,
}

#[allow(async_fn_in_trait)]
pub trait ObjectSink {
    /// Store the file at `source` as `request.key` in `request.bucket`.
    async fn put_object(&self, request: &PutObject<'_>, source: &Path) -> SinkResult<PutReceipt>;
}

/// Destination chosen from configuration at startup.
pub enum Sink {
    Local(LocalSink),
    Http(HttpSink),
}

impl ObjectSink for Sink {
    async fn put_object(&self, request: &PutObject<'_>, source: &Path) -> SinkResult<PutReceipt> {
        match self {
            Sink::Local(sink) => sink.put_object(request, source).await,
            Sink::Http(sink) => sink.put_object(request, source).await,
        }
    }
}

/// Sidecar written next to each locally stored object.
#[derive(Debug, Serialize)]
struct ObjectMetadata<'a> {
    content_type: &'a str,
    cache_control: &'a str,
    etag: &'a str,
    size_bytes: u64,
}

#[derive(Clone, Debug)]
pub struct LocalSink {
    /// Base directory; buckets are its subdirectories.
    pub base_path: PathBuf,
}

impl LocalSink {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn object_path(&self, bucket: &str, key: &str) -> PathBuf {
        let mut path = self.base_path.join(bucket);
        for segment in key.split('/') {
            path.push(segment);
        }
        path
    }

    /// Stream `stream` into a temp file, fsync, and rename it into place.
    ///
    /// Returns the MD5 etag and byte count.
    async fn write_stream<S>(&self, file_path: &Path, stream: S) -> SinkResult<(String, u64)>
    where
        S: Stream<Item = io::Result<Bytes>>,
    {
        let parent = file_path.parent().map(Path::to_path_buf).ok_or_else(|| {
            SinkError::Io(io::Error::new(
                ErrorKind::Other,
                "object path missing parent directory",
            ))
        })?;
        fs::create_dir_all(&parent).await?;
        let tmp_path = parent.join(format!(".tmp-{}", Uuid::new_v4()));
        let mut file = File::create(&tmp_path).await?;

        let mut size_bytes: u64 = 0;
        let mut digest = Context::new();
        pin_mut!(stream);
        while let Some(chunk_res) = stream.next().await {
            let chunk = match chunk_res {
                Ok(chunk) => chunk,
                Err(err) => {
                    let _ = fs::remove_file(&tmp_path).await;
                    return Err(SinkError::Io(err));
                }
            };
            size_bytes += chunk.len() as u64;
            digest.consume(&chunk);
            if let Err(err) = file.write_all(&chunk).await {
                let _ = fs::remove_file(&tmp_path).await;
                return Err(SinkError::Io(err));
            }
        }
        if let Err(err) = file.flush().await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(SinkError::Io(err));
        }
        if let Err(err) = file.sync_all().await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(SinkError::Io(err));
        }
        drop(file);

        if let Err(err) = fs::rename(&tmp_path, file_path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(SinkError::Io(err));
        }

        Ok((format!("{:x}", digest.compute()), size_bytes))
    }
}

impl ObjectSink for LocalSink {
    async fn put_object(&self, request: &PutObject<'_>, source: &Path) -> SinkResult<PutReceipt> {
        validate_bucket_name(request.bucket)?;
        ensure_key_safe(request.key)?;

        let file_path = self.object_path(request.bucket, request.key);
        let input = File::open(source).await?;
        let (etag, size_bytes) = self
            .write_stream(&file_path, ReaderStream::new(input))
            .await?;

        let metadata = ObjectMetadata {
            content_type: request.content_type,
            cache_control: request.cache_control,
            etag: &etag,
            size_bytes,
        };
        let mut sidecar = file_path.clone().into_os_string();
        sidecar.push(METADATA_SUFFIX);
        fs::write(&sidecar, serde_json::to_vec_pretty(&metadata)?).await?;
        debug!("stored {} ({} bytes)", file_path.display(), size_bytes);

        Ok(PutReceipt {
            key: request.key.to_string(),
            etag: Some(etag),
            size_bytes,
        })
    }
}

#[derive(Clone, Debug)]
pub struct HttpSink {
    client: reqwest::Client,
    endpoint: String,
    token: Option<String>,
}

impl HttpSink {
    pub fn new(endpoint: impl Into<String>, token: Option<String>) -> SinkResult<Self> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn object_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/{}/{}", self.endpoint, bucket, key)
    }
}

impl ObjectSink for HttpSink {
    async fn put_object(&self, request: &PutObject<'_>, source: &Path) -> SinkResult<PutReceipt> {
        validate_bucket_name(request.bucket)?;
        ensure_key_safe(request.key)?;

        let input = File::open(source).await?;
        let size_bytes = input.metadata().await?.len();
        let body = reqwest::Body::wrap_stream(ReaderStream::new(input));

        let mut builder = self
            .client
            .put(self.object_url(request.bucket, request.key))
            .header(header::CONTENT_TYPE, request.content_type)
            .header(header::CACHE_CONTROL, request.cache_control)
            .header(header::CONTENT_LENGTH, size_bytes)
            .body(body);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SinkError::Rejected {
                key: request.key.to_string(),
                status: status.as_u16(),
            });
        }

        let etag = response
            .headers()
            .get(header::ETAG)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim_matches('"').to_string());

        Ok(PutReceipt {
            key: request.key.to_string(),
            etag,
            size_bytes,
        })
    }
}

/// Reject keys that could escape the bucket or confuse a filesystem layout.
pub fn ensure_key_safe(key: &str) -> SinkResult<()> {
    let invalid = key.is_empty()
        || key.len() > MAX_OBJECT_KEY_LEN
        || key.starts_with('/')
        || key.contains("..")
        || key
            .bytes()
            .any(|b| b.is_ascii_control() || b == b'\\' || b == b'\0');
    if invalid {
        return Err(SinkError::InvalidObjectKey(key.to_string()));
    }
    Ok(())
}

/// S3-style bucket naming rules.
///
/// - 3–63 characters
/// - lowercase letters, digits, dots, hyphens only
/// - must start and end with a letter or digit
/// - no consecutive dots or dot-hyphen pairs
pub fn validate_bucket_name(name: &str) -> SinkResult<()> {
    let reject = |reason: &str| {
        Err(SinkError::InvalidBucketName {
            name: name.to_string(),
            reason: reason.to_string(),
        })
    };

    let len = name.len();
    if !(BUCKET_NAME_MIN_LEN..=BUCKET_NAME_MAX_LEN).contains(&len) {
        return reject("must be between 3 and 63 characters");
    }
    if !name
        .chars()
        .all(|c| matches!(c, 'a'..='z' | '0'..='9' | '.' | '-'))
    {
        return reject("allowed characters are lowercase letters, digits, dots, and hyphens");
    }
    if name.starts_with(['.', '-']) || name.ends_with(['.', '-']) {
        return reject("must start and end with a lowercase letter or digit");
    }
    if name.contains("..") || name.contains("-.") || name.contains(".-") {
        return reject("cannot contain consecutive dots or dot-hyphen combinations");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request<'a>(key: &'a str) -> PutObject<'a> {
        PutObject {
            bucket: "gallery-images",
            key,
            content_type: "image/png",
            cache_control: "public, max-age=31536000",
        }
    }

    #[test]
    fn key_validation() {
        assert!(ensure_key_safe("gallery/abc.png").is_ok());
        assert!(ensure_key_safe("").is_err());
        assert!(ensure_key_safe("/abs.png").is_err());
        assert!(ensure_key_safe("gallery/../x.png").is_err());
        assert!(ensure_key_safe("a\\b.png").is_err());
    }

    #[test]
    fn bucket_validation() {
        assert!(validate_bucket_name("gallery-images").is_ok());
        assert!(validate_bucket_name("ab").is_err());
        assert!(validate_bucket_name("Gallery").is_err());
        assert!(validate_bucket_name("-gallery").is_err());
        assert!(validate_bucket_name("gal..lery").is_err());
    }

    #[test]
    fn http_urls_join_endpoint_bucket_and_key() {
        let sink = HttpSink::new("http://127.0.0.1:3000/", None).unwrap();
        assert_eq!(
            sink.object_url("gallery-images", "gallery/abc.png"),
            "http://127.0.0.1:3000/gallery-images/gallery/abc.png"
        );
    }

    #[tokio::test]
    async fn local_sink_stores_bytes_and_metadata() {
        let src_dir = tempfile::tempdir().unwrap();
        let source = src_dir.path().join("abc.png");
        std::fs::write(&source, b"not really a png").unwrap();

        let root = tempfile::tempdir().unwrap();
        let sink = LocalSink::new(root.path());
        let receipt = sink
            .put_object(&request("gallery/abc.png"), &source)
            .await
            .unwrap();

        assert_eq!(receipt.size_bytes, 16);
        assert_eq!(
            receipt.etag.as_deref(),
            Some(format!("{:x}", md5::compute(b"not really a png")).as_str())
        );

        let stored = root.path().join("gallery-images/gallery/abc.png");
        assert_eq!(std::fs::read(&stored).unwrap(), b"not really a png");

        let meta = std::fs::read_to_string(root.path().join("gallery-images/gallery/abc.png.meta.json"))
            .unwrap();
        let meta: serde_json::Value = serde_json::from_str(&meta).unwrap();
        assert_eq!(meta["content_type"], "image/png");
        assert_eq!(meta["cache_control"], "public, max-age=31536000");
    }

    #[tokio::test]
    async fn local_sink_reports_missing_source() {
        let root = tempfile::tempdir().unwrap();
        let sink = LocalSink::new(root.path());
        let err = sink
            .put_object(&request("gallery/abc.png"), &root.path().join("missing.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, SinkError::Io(_)));
    }
}
