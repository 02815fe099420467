// src/services/timeline.rs

//! Timeline fetching for individual users.

use futures::stream::{self, StreamExt};

use super::{FetchContext, InterestContext, Paginator, PostNormalizer};
use crate::models::{Post, ResultSet};
use crate::utils::uri::{is_did, normalize_handle};

/// Fetches posts from user timelines.
pub struct TimelineFetcher {
    ctx: FetchContext,
    paginator: Paginator,
    normalizer: PostNormalizer,
}

impl TimelineFetcher {
    pub fn new(ctx: FetchContext) -> Self {
        Self {
            paginator: ctx.paginator(),
            normalizer: ctx.normalizer(),
            ctx,
        }
    }

    /// Up to `limit` posts from one user's timeline, newest first.
    ///
    /// Failures are logged; whatever was collected before them is returned.
    pub async fn get_user_posts(&self, handle: &str, limit: usize) -> Vec<Post> {
        let handle = normalize_handle(handle);
        if handle.is_empty() {
            log::warn!("Skipping empty handle");
            return Vec::new();
        }

        let owner_did = if is_did(&handle) {
            Some(handle.clone())
        } else {
            match self.ctx.api.get_profile(&handle).await {
                Ok(profile) => Some(profile.did),
                Err(e) => {
                    log::warn!("Could not resolve profile for @{handle}: {e}");
                    None
                }
            }
        };

        let api = &self.ctx.api;
        let actor = handle.as_str();
        let outcome = self
            .paginator
            .paginate(limit, |req| async move {
                api.get_author_feed(actor, req.limit, req.cursor.as_deref())
                    .await
            })
            .await;

        if let Some(e) = &outcome.error {
            log::warn!(
                "Stopped fetching @{handle} after {} posts: {e}",
                outcome.items.len()
            );
        }

        let context = InterestContext::Timeline { owner_did };
        let posts = self
            .normalizer
            .normalize_all(&outcome.items, &context)
            .await;
        log::info!("Retrieved {} posts from @{handle}", posts.len());
        posts
    }

    /// Timelines of several users, keyed by handle in input order.
    ///
    /// Blank entries are skipped and users without posts get no key.
    /// With `fetch.max_concurrent` above one, timelines are fetched
    /// concurrently; key order still follows the input.
    pub async fn get_posts_from_users(&self, handles: &[String], limit: usize) -> ResultSet {
        let handles: Vec<String> = handles
            .iter()
            .map(|h| normalize_handle(h))
            .filter(|h| !h.is_empty())
            .collect();
        let concurrency = self.ctx.config.fetch.max_concurrent.max(1);

        let mut results = ResultSet::new();
        if concurrency == 1 {
            for (i, handle) in handles.iter().enumerate() {
                if i > 0 {
                    self.ctx.pacer.pause().await;
                }
                let posts = self.get_user_posts(handle, limit).await;
                if !posts.is_empty() {
                    results.extend_group(handle.as_str(), posts);
                }
            }
        } else {
            let mut timelines = stream::iter(handles)
                .map(|handle| async move {
                    let posts = self.get_user_posts(&handle, limit).await;
                    (handle, posts)
                })
                .buffered(concurrency);

            while let Some((handle, posts)) = timelines.next().await {
                if !posts.is_empty() {
                    results.extend_group(handle, posts);
                }
            }
        }

        log::info!(
            "Collected {} posts from {} users",
            results.post_count(),
            results.len()
        );
        results
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::client::mock::{ScriptedApi, numbered_feed, simple_item};
    use crate::models::{Config, PostType};
    use crate::services::test_context;

    fn fetcher(api: &Arc<ScriptedApi>, config: Config) -> TimelineFetcher {
        TimelineFetcher::new(test_context(api.clone(), config))
    }

    #[tokio::test]
    async fn test_user_posts_paginate_under_cap() {
        let api = Arc::new(
            ScriptedApi::new()
                .with_profile("did:plc:alice.test", "alice.test")
                .with_author_feed("alice.test", numbered_feed("alice.test", 300)),
        );

        let posts = fetcher(&api, Config::default())
            .get_user_posts("@alice.test", 250)
            .await;

        assert_eq!(posts.len(), 250);
        let limits: Vec<usize> = api
            .calls_to("getAuthorFeed")
            .iter()
            .map(|c| c.limit)
            .collect();
        assert_eq!(limits, vec![100, 100, 50]);
    }

    #[tokio::test]
    async fn test_other_authors_are_reposts() {
        let mut feed = numbered_feed("alice.test", 2);
        feed.push(simple_item("bob.test", "b1", "2024-01-01T00:00:00Z"));
        let api = Arc::new(
            ScriptedApi::new()
                .with_profile("did:plc:alice.test", "alice.test")
                .with_author_feed("alice.test", feed),
        );

        let posts = fetcher(&api, Config::default())
            .get_user_posts("alice.test", 10)
            .await;

        let types: Vec<PostType> = posts.iter().map(|p| p.post_type).collect();
        assert_eq!(
            types,
            vec![PostType::Original, PostType::Original, PostType::Repost]
        );
    }

    #[tokio::test]
    async fn test_unknown_user_yields_empty() {
        let api = Arc::new(ScriptedApi::new());

        let posts = fetcher(&api, Config::default())
            .get_user_posts("ghost.test", 10)
            .await;

        assert!(posts.is_empty());
    }

    #[tokio::test]
    async fn test_failure_mid_way_keeps_earlier_pages() {
        let api = Arc::new(
            ScriptedApi::new()
                .with_author_feed("alice.test", numbered_feed("alice.test", 300))
                .failing_at_cursor("100"),
        );

        let posts = fetcher(&api, Config::default())
            .get_user_posts("alice.test", 300)
            .await;

        assert_eq!(posts.len(), 100);
    }

    #[tokio::test]
    async fn test_many_users_keep_input_order() {
        let api = Arc::new(
            ScriptedApi::new()
                .with_author_feed("b.test", numbered_feed("b.test", 3))
                .with_author_feed("a.test", numbered_feed("a.test", 3))
                .with_author_feed("empty.test", Vec::new()),
        );
        let handles = vec![
            "b.test".to_string(),
            "  ".to_string(),
            "empty.test".to_string(),
            "@a.test".to_string(),
        ];

        let results = fetcher(&api, Config::default())
            .get_posts_from_users(&handles, 2)
            .await;

        assert_eq!(results.keys().collect::<Vec<_>>(), vec!["b.test", "a.test"]);
        assert_eq!(results.post_count(), 4);
    }

    #[tokio::test]
    async fn test_concurrent_users_keep_input_order() {
        let api = Arc::new(
            ScriptedApi::new()
                .with_author_feed("c.test", numbered_feed("c.test", 1))
                .with_author_feed("a.test", numbered_feed("a.test", 1))
                .with_author_feed("b.test", numbered_feed("b.test", 1)),
        );
        let mut config = Config::default();
        config.fetch.max_concurrent = 3;
        let handles = vec![
            "c.test".to_string(),
            "a.test".to_string(),
            "b.test".to_string(),
        ];

        let results = fetcher(&api, config)
            .get_posts_from_users(&handles, 5)
            .await;

        assert_eq!(
            results.keys().collect::<Vec<_>>(),
            vec!["c.test", "a.test", "b.test"]
        );
    }
}
