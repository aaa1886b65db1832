//! Crate-level error type for whole-operation (fatal) failures.
//!
//! Record-level failures such as an unparseable date or a single failed
//! upload never surface here; they are counted by the operation that hit
//! them and reported in its summary.

use crate::services::{block_replace::BlockError, object_sink::SinkError};
use std::{io, path::PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("input file `{}` not found", .0.display())]
    MissingInput(PathBuf),
    #[error("failed to parse `{}`: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Block(#[from] BlockError),
    #[error(transparent)]
    Sink(#[from] SinkError),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type SyncResult<T> = Result<T, SyncError>;
