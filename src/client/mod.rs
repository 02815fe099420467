//! Network capability used by the fetch services.
//!
//! The services only see the [`BlueskyApi`] trait. [`XrpcClient`] is the
//! HTTP implementation; tests script their own.

#[cfg(test)]
pub(crate) mod mock;
mod xrpc;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::raw::{FeedViewPost, ListItemView, ListView, PostView, ProfileView};

pub use xrpc::XrpcClient;

/// One page of a cursor-paginated call.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Continuation token, absent on the last page
    pub cursor: Option<String>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, cursor: Option<String>) -> Self {
        Self { items, cursor }
    }
}

/// Response of `app.bsky.graph.getList`: list metadata plus one page of members.
#[derive(Debug, Clone)]
pub struct ListPage {
    pub list: ListView,
    pub items: Vec<ListItemView>,
    pub cursor: Option<String>,
}

/// Search refinements.
///
/// `author`, `mention`, `lang`, `since` and `until` go to the server;
/// `domain` is applied client side to the extracted links.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilters {
    pub author: Option<String>,
    pub mention: Option<String>,
    pub lang: Option<String>,
    /// Lower bound, `YYYY-MM-DD` or a full timestamp
    pub since: Option<String>,
    /// Upper bound, `YYYY-MM-DD` or a full timestamp
    pub until: Option<String>,
    pub domain: Option<String>,
}

/// Calls the fetcher needs from the network.
#[async_trait]
pub trait BlueskyApi: Send + Sync {
    /// Open a session. `Ok(false)` means the credentials were rejected.
    async fn login(&self, identifier: &str, password: &str) -> Result<bool>;

    /// Resolve a handle or DID to a profile.
    async fn get_profile(&self, actor: &str) -> Result<ProfileView>;

    async fn get_author_feed(
        &self,
        actor: &str,
        limit: usize,
        cursor: Option<&str>,
    ) -> Result<Page<FeedViewPost>>;

    /// List metadata and members.
    async fn get_list(&self, list: &str, limit: usize, cursor: Option<&str>) -> Result<ListPage>;

    /// Aggregate feed of a list's members.
    async fn get_list_feed(
        &self,
        list: &str,
        limit: usize,
        cursor: Option<&str>,
    ) -> Result<Page<FeedViewPost>>;

    async fn search_posts(
        &self,
        query: &str,
        limit: usize,
        cursor: Option<&str>,
        filters: &SearchFilters,
    ) -> Result<Page<PostView>>;
}
