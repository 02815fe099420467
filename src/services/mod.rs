//! Service layer for the fetcher.
//!
//! - Cursor pagination (`Paginator`)
//! - Raw-to-record normalization (`PostNormalizer`)
//! - User timelines (`TimelineFetcher`)
//! - Curated lists (`ListFetcher`)
//! - Keyword search (`PostSearcher`)

mod lists;
mod normalize;
mod paginate;
mod search;
mod timeline;

use std::sync::Arc;

use crate::client::BlueskyApi;
use crate::models::Config;

pub use lists::{AddressStrategy, ListFetcher, ListOutcome, ListSource};
pub use normalize::{InterestContext, PostNormalizer, classify, extract_images, extract_links};
pub use paginate::{NoDelay, PageRequest, PaginateOutcome, Pacer, Paginator, TokioPacer};
pub use search::PostSearcher;
pub use timeline::TimelineFetcher;

/// Shared handles every fetch service needs.
#[derive(Clone)]
pub struct FetchContext {
    pub config: Arc<Config>,
    pub api: Arc<dyn BlueskyApi>,
    pub pacer: Arc<dyn Pacer>,
}

impl FetchContext {
    /// Context pacing calls with the configured delay.
    pub fn new(config: Arc<Config>, api: Arc<dyn BlueskyApi>) -> Self {
        let pacer = Arc::new(TokioPacer::from_config(&config.fetch));
        Self { config, api, pacer }
    }

    pub fn with_pacer(mut self, pacer: Arc<dyn Pacer>) -> Self {
        self.pacer = pacer;
        self
    }

    pub fn paginator(&self) -> Paginator {
        Paginator::new(self.config.fetch.page_cap, Arc::clone(&self.pacer))
    }

    pub fn normalizer(&self) -> PostNormalizer {
        PostNormalizer::new(&self.config.api, Arc::clone(&self.api))
    }
}

#[cfg(test)]
pub(crate) fn test_context(api: Arc<dyn BlueskyApi>, config: Config) -> FetchContext {
    FetchContext::new(Arc::new(config), api).with_pacer(Arc::new(NoDelay))
}
