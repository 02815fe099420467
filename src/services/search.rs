// src/services/search.rs

//! Keyword search over all posts.

use super::{FetchContext, InterestContext, Paginator, PostNormalizer};
use crate::client::SearchFilters;
use crate::models::raw::FeedViewPost;
use crate::models::{Post, ResultSet};
use crate::utils::uri::normalize_handle;

pub struct PostSearcher {
    ctx: FetchContext,
    paginator: Paginator,
    normalizer: PostNormalizer,
}

impl PostSearcher {
    pub fn new(ctx: FetchContext) -> Self {
        Self {
            paginator: ctx.paginator(),
            normalizer: ctx.normalizer(),
            ctx,
        }
    }

    /// Up to `limit` posts matching `query`.
    ///
    /// The domain filter runs on the normalized posts, so fewer than
    /// `limit` may come back when it drops some.
    pub async fn search_posts(
        &self,
        query: &str,
        limit: usize,
        filters: &SearchFilters,
    ) -> Vec<Post> {
        let query = query.trim();
        if query.is_empty() {
            log::warn!("Empty search query");
            return Vec::new();
        }

        let filters = clean_filters(filters);
        log::info!("Searching for '{query}' ({})", describe(&filters));

        let api = &self.ctx.api;
        let server_filters = &filters;
        let outcome = self
            .paginator
            .paginate(limit, |req| async move {
                api.search_posts(query, req.limit, req.cursor.as_deref(), server_filters)
                    .await
            })
            .await;

        if let Some(e) = &outcome.error {
            log::warn!(
                "Search stopped after {} results: {e}",
                outcome.items.len()
            );
        }

        let raw: Vec<FeedViewPost> = outcome.items.into_iter().map(FeedViewPost::from).collect();
        let context = InterestContext::Search {
            author_filter: filters.author.clone(),
        };
        let mut posts = self.normalizer.normalize_all(&raw, &context).await;

        if let Some(domain) = filters.domain.as_deref() {
            let before = posts.len();
            posts.retain(|post| matches_domain(post, domain));
            log::debug!(
                "Domain filter '{domain}' dropped {} posts",
                before - posts.len()
            );
        }

        log::info!("Found {} posts for '{query}'", posts.len());
        posts
    }

    /// Search results grouped by author handle.
    pub async fn get_posts_from_search(
        &self,
        query: &str,
        limit: usize,
        filters: &SearchFilters,
    ) -> ResultSet {
        ResultSet::from_posts(self.search_posts(query, limit, filters).await)
    }
}

/// Strip `@` from handle filters and drop blank values.
fn clean_filters(filters: &SearchFilters) -> SearchFilters {
    let keep = |value: &Option<String>| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };
    let handle = |value: &Option<String>| {
        value
            .as_deref()
            .map(normalize_handle)
            .filter(|v| !v.is_empty())
    };

    SearchFilters {
        author: handle(&filters.author),
        mention: handle(&filters.mention),
        lang: keep(&filters.lang),
        since: keep(&filters.since),
        until: keep(&filters.until),
        domain: keep(&filters.domain).map(|d| d.to_lowercase()),
    }
}

fn describe(filters: &SearchFilters) -> String {
    let parts: Vec<String> = [
        ("from", &filters.author),
        ("mention", &filters.mention),
        ("lang", &filters.lang),
        ("since", &filters.since),
        ("until", &filters.until),
        ("domain", &filters.domain),
    ]
    .into_iter()
    .filter_map(|(name, value)| value.as_ref().map(|v| format!("{name}={v}")))
    .collect();

    if parts.is_empty() {
        "no filters".to_string()
    } else {
        parts.join(", ")
    }
}

/// Posts without links pass; posts with links need one on `domain`.
fn matches_domain(post: &Post, domain: &str) -> bool {
    if post.urls.is_empty() {
        return true;
    }
    post.urls
        .iter()
        .any(|url| url.to_lowercase().contains(domain))
}
