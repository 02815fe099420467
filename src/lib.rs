// src/lib.rs

//! skyfetch: Bluesky timeline, list and search fetcher

pub mod client;
pub mod error;
pub mod export;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod utils;
