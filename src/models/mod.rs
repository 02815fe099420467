// src/models/mod.rs

//! Domain models for the fetcher.
//!
//! - `config`: TOML-backed settings
//! - `post`: normalized output records and the author-grouped result set
//! - `raw`: typed protocol views consumed by the normalizer

mod config;
mod post;
pub mod raw;

// Re-export all public types
pub use config::{ApiConfig, Config, ExportConfig, ExportFormat, FetchConfig};
pub use post::{Author, Engagement, Post, PostType, ResultSet};

#[cfg(test)]
pub(crate) use post::tests::sample_post;
