//! Core data models for the gallery tooling.
//!
//! `GalleryItem` is what the website renders; `JobRecord` is one row of the
//! job database. Gallery types serialize to the exact field names the site
//! expects, and `JobRecord` maps onto the table via `sqlx::FromRow`.

pub mod gallery_item;
pub mod job_record;
