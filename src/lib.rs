//! Anime catalog title canonicalization - shared modules for both binaries.

pub mod config;
pub mod dedup;
pub mod error;
pub mod ingest;
pub mod models;
pub mod progress;
pub mod store;
pub mod variant;

pub use dedup::deduplicate_catalog;
pub use ingest::should_accept_as_base;
pub use variant::is_variant_title;
