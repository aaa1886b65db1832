//! Batch tooling that keeps a static gallery's data files in sync with a
//! job database and moves its images to durable object storage.

pub mod commands;
pub mod config;
pub mod errors;
pub mod models;
pub mod services;
