pub mod block_replace;
pub mod categorize;
pub mod dates;
pub mod gallery_builder;
pub mod gallery_store;
pub mod job_repository;
pub mod migration;
pub mod object_sink;
pub mod reconcile;
