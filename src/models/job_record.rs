//! Represents one generation job as stored in the job database.

use crate::services::reconcile::Keyed;
use sqlx::FromRow;

/// A row of the `midjourney_likes` table.
///
/// Read-only from the point of view of this tool. Every column other than
/// `job_id` may be NULL.
#[derive(Clone, FromRow, Debug, Default, PartialEq)]
pub struct JobRecord {
    /// Join key; corresponds to `GalleryItem::id`.
    pub job_id: String,

    /// Free-text creation date, e.g. "Dec 21, 25, 8:36 PM".
    pub midjourney_created_at: Option<String>,

    /// Parameter suffix of the prompt (e.g. "--ar 3:2 --v 7").
    pub raw_parameters: Option<String>,

    pub aspect_ratio: Option<String>,

    pub prompt: Option<String>,

    /// Image URL on the original CDN.
    pub cdn_url: Option<String>,

    /// Job page URL.
    pub midjourney_url: Option<String>,
}

impl Keyed for JobRecord {
    fn key(&self) -> &str {
        &self.job_id
    }
}
