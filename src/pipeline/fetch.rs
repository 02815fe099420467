// src/pipeline/fetch.rs

//! Fetch pipeline: target → result set → export.

use std::path::Path;

use chrono::{DateTime, Utc};

use crate::client::SearchFilters;
use crate::error::{AppError, Result};
use crate::export::{ExportSummary, PostExporter};
use crate::models::ResultSet;
use crate::services::{FetchContext, ListFetcher, ListSource, PostSearcher, TimelineFetcher};
use crate::utils::uri::normalize_handle;

/// What to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// One user's timeline
    Handle(String),
    /// Several timelines, e.g. read from a handles file
    Handles(Vec<String>),
    /// A curated list locator
    List(String),
    /// A keyword search
    Search {
        query: String,
        filters: SearchFilters,
    },
}

impl Target {
    /// Base of the default output file name.
    pub fn base_name(&self) -> String {
        match self {
            Target::Handle(handle) => normalize_handle(handle),
            Target::Handles(handles) => match handles.as_slice() {
                [single] => normalize_handle(single),
                _ => "users".to_string(),
            },
            Target::List(_) => "list".to_string(),
            Target::Search { query, .. } => format!("search_{}", query.trim()),
        }
    }
}

/// Result of one fetch run.
#[derive(Debug)]
pub struct FetchReport {
    pub results: ResultSet,
    /// Base of the default output file name
    pub base_name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// Fetch up to `limit` posts per target.
///
/// For lists and searches `limit` is the total; for handles it applies to
/// each handle.
pub async fn run_fetch(ctx: &FetchContext, target: &Target, limit: usize) -> Result<FetchReport> {
    let start_time = Utc::now();
    let mut base_name = target.base_name();

    let results = match target {
        Target::Handle(handle) => {
            log::info!(
                "Fetching up to {limit} posts from @{}",
                normalize_handle(handle)
            );
            TimelineFetcher::new(ctx.clone())
                .get_posts_from_users(std::slice::from_ref(handle), limit)
                .await
        }
        Target::Handles(handles) => {
            if handles.iter().all(|h| h.trim().is_empty()) {
                return Err(AppError::validation("no handles given"));
            }
            log::info!(
                "Fetching up to {limit} posts from each of {} users",
                handles.len()
            );
            TimelineFetcher::new(ctx.clone())
                .get_posts_from_users(handles, limit)
                .await
        }
        Target::List(locator) => {
            log::info!("Fetching up to {limit} posts from list {locator}");
            let outcome = ListFetcher::new(ctx.clone())
                .get_list_posts_from_locator(locator, limit)
                .await;
            if let Some(name) = &outcome.name {
                log::info!("List name: '{name}'");
                base_name = format!("list_{name}");
            }
            match outcome.source {
                ListSource::ListFeed => log::info!("Read the list feed directly"),
                ListSource::Members(count) => log::info!("Read timelines of {count} list members"),
                ListSource::Unresolved => log::warn!("List could not be resolved"),
            }
            outcome.results
        }
        Target::Search { query, filters } => {
            PostSearcher::new(ctx.clone())
                .get_posts_from_search(query, limit, filters)
                .await
        }
    };

    let end_time = Utc::now();
    log::info!(
        "Fetched {} posts from {} authors in {:.1}s",
        results.post_count(),
        results.len(),
        (end_time - start_time).num_milliseconds() as f64 / 1000.0
    );

    Ok(FetchReport {
        results,
        base_name,
        start_time,
        end_time,
    })
}

/// Export a report, to `output` when given or the exporter's default path.
///
/// An empty report is not written; `Ok(None)` is returned instead.
pub async fn run_export(
    exporter: &dyn PostExporter,
    report: &FetchReport,
    output: Option<&Path>,
) -> Result<Option<ExportSummary>> {
    if report.results.is_empty() {
        log::warn!("No posts found, nothing to export");
        return Ok(None);
    }

    let summary = match output {
        Some(path) => exporter.write(&report.results, path).await?,
        None => exporter.export(&report.results, &report.base_name).await?,
    };
    Ok(Some(summary))
}

/// Handles listed one per line; blank lines and `#` comments are skipped.
pub fn parse_handles(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(normalize_handle)
        .filter(|handle| !handle.is_empty())
        .collect()
}

/// Read a handles file (see [`parse_handles`]).
pub fn read_handles_file(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
        AppError::config(format!("cannot read handles file {}: {e}", path.display()))
    })?;
    let handles = parse_handles(&content);
    log::info!("Loaded {} handles from {}", handles.len(), path.display());
    Ok(handles)
}
