use crate::services::{
    migration::UploadTarget,
    object_sink::{self, HttpSink, LocalSink, Sink},
};
use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::{env, path::PathBuf};

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub gallery_json: PathBuf,
    pub gallery_js: PathBuf,
    pub database_url: String,
    pub download_dir: PathBuf,
    pub bucket: String,
    pub key_prefix: String,
    pub public_url: Option<String>,
    pub sink: Option<SinkTarget>,
    pub sink_token: Option<String>,
}

/// Where `migrate upload` sends files.
#[derive(Debug, Clone, PartialEq)]
pub enum SinkTarget {
    Local(PathBuf),
    Http(String),
}

impl SinkTarget {
    /// `http://` and `https://` select the HTTP sink; anything else is a directory.
    pub fn parse(raw: &str) -> Self {
        if raw.starts_with("http://") || raw.starts_with("https://") {
            SinkTarget::Http(raw.to_string())
        } else {
            SinkTarget::Local(PathBuf::from(raw))
        }
    }
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Keeps gallery.json and gallery.js in sync with the job database"
)]
pub struct Args {
    /// Path to gallery.json (overrides GALLERY_SYNC_GALLERY_JSON)
    #[arg(long, global = true)]
    pub gallery_json: Option<PathBuf>,

    /// Path to gallery.js (overrides GALLERY_SYNC_GALLERY_JS)
    #[arg(long, global = true)]
    pub gallery_js: Option<PathBuf>,

    /// Job database URL (overrides GALLERY_SYNC_DATABASE_URL)
    #[arg(long, global = true)]
    pub database_url: Option<String>,

    /// Destination bucket (overrides GALLERY_SYNC_BUCKET)
    #[arg(long, global = true)]
    pub bucket: Option<String>,

    /// Object key prefix (overrides GALLERY_SYNC_KEY_PREFIX)
    #[arg(long, global = true)]
    pub key_prefix: Option<String>,

    /// Public base URL of the bucket (overrides GALLERY_SYNC_PUBLIC_URL)
    #[arg(long, global = true)]
    pub public_url: Option<String>,

    /// Upload endpoint URL or local directory (overrides GALLERY_SYNC_SINK)
    #[arg(long, global = true)]
    pub sink: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Count gallery ids, database ids, and their overlap
    Overlap,
    /// Replace gallery.json with items built from the database
    Rebuild,
    /// Copy creation dates from the database into gallery.json
    SyncDates,
    /// Re-embed gallery.json into gallery.js
    Embed,
    /// Move images off the legacy CDN
    Migrate {
        #[command(subcommand)]
        action: MigrateCommand,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum MigrateCommand {
    /// Show where gallery images are currently hosted
    Status,
    /// Write job page URLs for manual download
    ExportUrls { output: Option<PathBuf> },
    /// Match downloaded images to gallery items
    Scan { dir: Option<PathBuf> },
    /// Upload matched images and rewrite their URLs
    Upload { dir: Option<PathBuf> },
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and the command to run.
    pub fn from_env_and_args() -> Result<(Self, Command)> {
        let args = Args::parse();
        let cfg = Self::resolve(&args, |key| env::var(key).ok())?;
        Ok((cfg, args.command))
    }

    /// Merge `args` over values looked up through `env`.
    pub fn resolve(args: &Args, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let env_path = |key: &str, default: &str| {
            env(key)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(default))
        };

        // --- Environment fallback ---
        let env_json = env_path("GALLERY_SYNC_GALLERY_JSON", "data/gallery.json");
        let env_js = env_path("GALLERY_SYNC_GALLERY_JS", "gallery.js");
        let env_db = env("GALLERY_SYNC_DATABASE_URL")
            .unwrap_or_else(|| "sqlite://data/universal.db".into());
        let env_download = env_path("GALLERY_SYNC_DOWNLOAD_DIR", "scripts/downloaded-images");
        let env_bucket = env("GALLERY_SYNC_BUCKET").unwrap_or_else(|| "gallery-images".into());
        let env_prefix = env("GALLERY_SYNC_KEY_PREFIX").unwrap_or_else(|| "gallery".into());

        // --- Merge ---
        let cfg = Self {
            gallery_json: args.gallery_json.clone().unwrap_or(env_json),
            gallery_js: args.gallery_js.clone().unwrap_or(env_js),
            database_url: args.database_url.clone().unwrap_or(env_db),
            download_dir: env_download,
            bucket: args.bucket.clone().unwrap_or(env_bucket),
            key_prefix: args.key_prefix.clone().unwrap_or(env_prefix),
            public_url: args
                .public_url
                .clone()
                .or_else(|| env("GALLERY_SYNC_PUBLIC_URL"))
                .filter(|url| !url.is_empty()),
            sink: args
                .sink
                .clone()
                .or_else(|| env("GALLERY_SYNC_SINK"))
                .filter(|raw| !raw.is_empty())
                .map(|raw| SinkTarget::parse(&raw)),
            sink_token: env("GALLERY_SYNC_SINK_TOKEN").filter(|t| !t.is_empty()),
        };

        object_sink::validate_bucket_name(&cfg.bucket)
            .with_context(|| format!("validating bucket `{}`", cfg.bucket))?;
        if let Some(url) = &cfg.public_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                bail!("public URL `{}` must start with http:// or https://", url);
            }
        }

        Ok(cfg)
    }

    /// The subcommand's directory argument, or the configured default.
    pub fn download_dir_or(&self, dir: Option<PathBuf>) -> PathBuf {
        dir.unwrap_or_else(|| self.download_dir.clone())
    }

    pub fn upload_target(&self) -> UploadTarget {
        UploadTarget {
            bucket: self.bucket.clone(),
            key_prefix: self.key_prefix.clone(),
            public_url: self.public_url.clone(),
        }
    }

    pub fn build_sink(&self) -> Result<Sink> {
        match &self.sink {
            Some(SinkTarget::Local(dir)) => Ok(Sink::Local(LocalSink::new(dir))),
            Some(SinkTarget::Http(endpoint)) => Ok(Sink::Http(
                HttpSink::new(endpoint, self.sink_token.clone())
                    .context("building HTTP upload client")?,
            )),
            None => bail!("no upload destination configured; set --sink or GALLERY_SYNC_SINK"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn resolve(argv: &[&str], vars: &[(&str, &str)]) -> Result<AppConfig> {
        let args = Args::try_parse_from(argv)?;
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::resolve(&args, |key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_without_env_or_flags() {
        let cfg = resolve(&["gallery-sync", "rebuild"], &[]).unwrap();
        assert_eq!(cfg.gallery_json, PathBuf::from("data/gallery.json"));
        assert_eq!(cfg.gallery_js, PathBuf::from("gallery.js"));
        assert_eq!(cfg.database_url, "sqlite://data/universal.db");
        assert_eq!(cfg.bucket, "gallery-images");
        assert_eq!(cfg.key_prefix, "gallery");
        assert!(cfg.public_url.is_none());
        assert!(cfg.sink.is_none());
    }

    #[test]
    fn flags_override_environment() {
        let cfg = resolve(
            &["gallery-sync", "--bucket", "from-flag", "sync-dates"],
            &[
                ("GALLERY_SYNC_BUCKET", "from-env"),
                ("GALLERY_SYNC_GALLERY_JSON", "/srv/site/gallery.json"),
            ],
        )
        .unwrap();
        assert_eq!(cfg.bucket, "from-flag");
        assert_eq!(cfg.gallery_json, PathBuf::from("/srv/site/gallery.json"));
    }

    #[test]
    fn sink_kind_follows_scheme() {
        let cfg = resolve(
            &["gallery-sync", "migrate", "status"],
            &[("GALLERY_SYNC_SINK", "https://store.example.com")],
        )
        .unwrap();
        assert_eq!(
            cfg.sink,
            Some(SinkTarget::Http("https://store.example.com".into()))
        );

        let cfg = resolve(&["gallery-sync", "--sink", "/mnt/bucket", "migrate", "status"], &[])
            .unwrap();
        assert_eq!(cfg.sink, Some(SinkTarget::Local("/mnt/bucket".into())));
    }

    #[test]
    fn invalid_bucket_is_rejected() {
        assert!(resolve(&["gallery-sync", "--bucket", "No_Caps", "rebuild"], &[]).is_err());
    }

    #[test]
    fn public_url_needs_scheme() {
        assert!(resolve(&["gallery-sync", "embed"], &[("GALLERY_SYNC_PUBLIC_URL", "images.example.com")]).is_err());
    }

    #[test]
    fn upload_without_sink_refuses() {
        let cfg = resolve(&["gallery-sync", "migrate", "upload"], &[]).unwrap();
        assert!(cfg.build_sink().is_err());
    }

    #[test]
    fn parses_migrate_subcommands() {
        let args = Args::try_parse_from(["gallery-sync", "migrate", "scan", "downloads"]).unwrap();
        assert_eq!(
            args.command,
            Command::Migrate {
                action: MigrateCommand::Scan {
                    dir: Some(PathBuf::from("downloads"))
                }
            }
        );
    }
}
