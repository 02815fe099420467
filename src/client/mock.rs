//! Scripted in-memory [`BlueskyApi`] for service tests.
//!
//! Feeds are served in slices; the cursor is the stringified offset of the
//! next slice. Every request is recorded so tests can assert on call counts,
//! page sizes and cursors.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{BlueskyApi, ListPage, Page, SearchFilters};
use crate::error::{AppError, Result};
use crate::models::raw::{FeedViewPost, ListItemView, ListView, PostView, ProfileView};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub method: &'static str,
    pub target: String,
    pub limit: usize,
    pub cursor: Option<String>,
}

#[derive(Default)]
pub struct ScriptedApi {
    profiles: HashMap<String, ProfileView>,
    author_feeds: HashMap<String, Vec<FeedViewPost>>,
    list_feeds: HashMap<String, Vec<FeedViewPost>>,
    lists: HashMap<String, (ListView, Vec<ListItemView>)>,
    search_results: Vec<PostView>,
    failing_cursors: HashSet<String>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a profile, resolvable by handle and by DID.
    pub fn with_profile(mut self, did: &str, handle: &str) -> Self {
        let profile = ProfileView {
            did: did.to_string(),
            handle: handle.to_string(),
            display_name: None,
        };
        self.profiles.insert(did.to_string(), profile.clone());
        self.profiles.insert(handle.to_string(), profile);
        self
    }

    pub fn with_author_feed(mut self, actor: &str, feed: Vec<FeedViewPost>) -> Self {
        self.author_feeds.insert(actor.to_string(), feed);
        self
    }

    pub fn with_list_feed(mut self, address: &str, feed: Vec<FeedViewPost>) -> Self {
        self.list_feeds.insert(address.to_string(), feed);
        self
    }

    /// Register a list with `(did, handle)` members.
    pub fn with_list(mut self, address: &str, name: &str, members: &[(&str, &str)]) -> Self {
        let list = ListView {
            uri: address.to_string(),
            name: name.to_string(),
            purpose: None,
            creator: None,
        };
        let items = members
            .iter()
            .map(|(did, handle)| ListItemView {
                uri: format!("at://owner/app.bsky.graph.listitem/{handle}"),
                subject: ProfileView {
                    did: did.to_string(),
                    handle: handle.to_string(),
                    display_name: None,
                },
            })
            .collect();
        self.lists.insert(address.to_string(), (list, items));
        self
    }

    pub fn with_search_results(mut self, posts: Vec<PostView>) -> Self {
        self.search_results = posts;
        self
    }

    /// Fail any paged call made with this cursor.
    pub fn failing_at_cursor(mut self, cursor: &str) -> Self {
        self.failing_cursors.insert(cursor.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, method: &str) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| call.method == method)
            .collect()
    }

    fn record(&self, method: &'static str, target: &str, limit: usize, cursor: Option<&str>) {
        self.calls.lock().unwrap().push(Call {
            method,
            target: target.to_string(),
            limit,
            cursor: cursor.map(str::to_string),
        });
    }

    fn check_cursor(&self, method: &str, cursor: Option<&str>) -> Result<()> {
        match cursor {
            Some(cursor) if self.failing_cursors.contains(cursor) => {
                Err(AppError::api(method, 502, "UpstreamFailure"))
            }
            _ => Ok(()),
        }
    }

    fn slice<T: Clone>(items: &[T], limit: usize, cursor: Option<&str>) -> Page<T> {
        let offset: usize = cursor.and_then(|c| c.parse().ok()).unwrap_or(0);
        let end = (offset + limit).min(items.len());
        let page = items.get(offset..end).unwrap_or_default().to_vec();
        let next = (end < items.len()).then(|| end.to_string());
        Page::new(page, next)
    }
}

#[async_trait]
impl BlueskyApi for ScriptedApi {
    async fn login(&self, identifier: &str, password: &str) -> Result<bool> {
        self.record("login", identifier, 0, None);
        Ok(!password.is_empty())
    }

    async fn get_profile(&self, actor: &str) -> Result<ProfileView> {
        self.record("getProfile", actor, 0, None);
        self.profiles
            .get(actor)
            .cloned()
            .ok_or_else(|| AppError::api("app.bsky.actor.getProfile", 400, "Profile not found"))
    }

    async fn get_author_feed(
        &self,
        actor: &str,
        limit: usize,
        cursor: Option<&str>,
    ) -> Result<Page<FeedViewPost>> {
        self.record("getAuthorFeed", actor, limit, cursor);
        self.check_cursor("app.bsky.feed.getAuthorFeed", cursor)?;
        let feed = self.author_feeds.get(actor).ok_or_else(|| {
            AppError::api("app.bsky.feed.getAuthorFeed", 400, "Profile not found")
        })?;
        Ok(Self::slice(feed, limit, cursor))
    }

    async fn get_list(&self, list: &str, limit: usize, cursor: Option<&str>) -> Result<ListPage> {
        self.record("getList", list, limit, cursor);
        self.check_cursor("app.bsky.graph.getList", cursor)?;
        let (view, items) = self
            .lists
            .get(list)
            .ok_or_else(|| AppError::api("app.bsky.graph.getList", 400, "List not found"))?;
        let page = Self::slice(items, limit, cursor);
        Ok(ListPage {
            list: view.clone(),
            items: page.items,
            cursor: page.cursor,
        })
    }

    async fn get_list_feed(
        &self,
        list: &str,
        limit: usize,
        cursor: Option<&str>,
    ) -> Result<Page<FeedViewPost>> {
        self.record("getListFeed", list, limit, cursor);
        self.check_cursor("app.bsky.feed.getListFeed", cursor)?;
        let feed = self
            .list_feeds
            .get(list)
            .ok_or_else(|| AppError::api("app.bsky.feed.getListFeed", 400, "List not found"))?;
        Ok(Self::slice(feed, limit, cursor))
    }

    async fn search_posts(
        &self,
        query: &str,
        limit: usize,
        cursor: Option<&str>,
        _filters: &SearchFilters,
    ) -> Result<Page<PostView>> {
        self.record("searchPosts", query, limit, cursor);
        self.check_cursor("app.bsky.feed.searchPosts", cursor)?;
        Ok(Self::slice(&self.search_results, limit, cursor))
    }
}

/// Build a raw feed entry from JSON, the way the API would send it.
pub fn feed_item(value: serde_json::Value) -> FeedViewPost {
    serde_json::from_value(value).expect("valid feed item fixture")
}

/// A plain post by `handle` (`did:plc:<handle>`), key `rkey`.
pub fn simple_item(handle: &str, rkey: &str, created_at: &str) -> FeedViewPost {
    feed_item(serde_json::json!({
        "post": {
            "uri": format!("at://did:plc:{handle}/app.bsky.feed.post/{rkey}"),
            "cid": format!("bafy{rkey}"),
            "author": {"did": format!("did:plc:{handle}"), "handle": handle},
            "record": {"text": format!("post {rkey}"), "createdAt": created_at},
            "likeCount": 1
        }
    }))
}

/// `count` plain posts by `handle` with keys `p0..p{count-1}`.
pub fn numbered_feed(handle: &str, count: usize) -> Vec<FeedViewPost> {
    (0..count)
        .map(|i| {
            let created_at = format!("2024-01-01T00:00:{:02}Z", i % 60);
            simple_item(handle, &format!("p{i}"), &created_at)
        })
        .collect()
}
