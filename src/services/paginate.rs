// src/services/paginate.rs

//! Cursor-driven pagination under a fixed per-call cap.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::client::Page;
use crate::error::{AppError, Result};
use crate::models::FetchConfig;

/// Waits between consecutive calls to stay clear of upstream rate limits.
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone)]
pub struct TokioPacer {
    delay: Duration,
}

impl TokioPacer {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn from_config(config: &FetchConfig) -> Self {
        Self::new(Duration::from_millis(config.request_delay_ms))
    }
}

#[async_trait]
impl Pacer for TokioPacer {
    async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

/// Never waits.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

#[async_trait]
impl Pacer for NoDelay {
    async fn pause(&self) {}
}

/// Arguments for one page call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Cursor from the previous page, `None` on the first call
    pub cursor: Option<String>,
    /// Items to ask for, never above the page cap
    pub limit: usize,
}

/// Items gathered by [`Paginator::paginate`].
#[derive(Debug)]
pub struct PaginateOutcome<T> {
    pub items: Vec<T>,
    /// Number of page calls issued
    pub calls: usize,
    /// Error that cut pagination short; `items` holds the pages before it
    pub error: Option<AppError>,
}

impl<T> PaginateOutcome<T> {
    fn empty() -> Self {
        Self {
            items: Vec::new(),
            calls: 0,
            error: None,
        }
    }

    /// Whether the first call already failed.
    pub fn failed_outright(&self) -> bool {
        self.error.is_some() && self.items.is_empty()
    }
}

/// Drives a paged call until the requested total is met or the source runs dry.
#[derive(Clone)]
pub struct Paginator {
    page_cap: usize,
    pacer: Arc<dyn Pacer>,
}

impl Paginator {
    pub fn new(page_cap: usize, pacer: Arc<dyn Pacer>) -> Self {
        Self {
            page_cap: page_cap.max(1),
            pacer,
        }
    }

    pub fn page_cap(&self) -> usize {
        self.page_cap
    }

    /// Fetch up to `requested_total` items.
    ///
    /// Issues at most `ceil(requested_total / page_cap)` calls, each asking
    /// for `min(page_cap, remaining)`. Stops early on an empty page, a
    /// missing cursor, or an error (keeping what was already collected).
    pub async fn paginate<T, F, Fut>(
        &self,
        requested_total: usize,
        mut call: F,
    ) -> PaginateOutcome<T>
    where
        F: FnMut(PageRequest) -> Fut,
        Fut: Future<Output = Result<Page<T>>>,
    {
        let mut outcome = PaginateOutcome::empty();
        if requested_total == 0 {
            return outcome;
        }

        let calls_needed = requested_total.div_ceil(self.page_cap);
        let mut cursor: Option<String> = None;

        for call_num in 0..calls_needed {
            let remaining = requested_total.saturating_sub(outcome.items.len());
            if remaining == 0 {
                break;
            }
            if call_num > 0 {
                self.pacer.pause().await;
            }

            let request = PageRequest {
                cursor: cursor.take(),
                limit: remaining.min(self.page_cap),
            };
            outcome.calls += 1;

            match call(request).await {
                Ok(page) => {
                    if page.items.is_empty() {
                        break;
                    }
                    outcome.items.extend(page.items);
                    if calls_needed > 1 {
                        log::debug!(
                            "Retrieved {} of {} requested items",
                            outcome.items.len(),
                            requested_total
                        );
                    }
                    match page.cursor {
                        Some(next) if outcome.items.len() < requested_total => cursor = Some(next),
                        _ => break,
                    }
                }
                Err(error) => {
                    log::warn!("Page {} failed: {}", call_num + 1, error);
                    outcome.error = Some(error);
                    break;
                }
            }
        }

        outcome
    }
}
