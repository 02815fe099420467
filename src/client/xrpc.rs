// src/client/xrpc.rs

//! Minimal XRPC client over `reqwest`.
//!
//! Covers the six calls the fetcher makes. Sessions come from a single
//! `createSession`; there is no refresh, a run is expected to finish well
//! within the access token lifetime.

use std::sync::RwLock;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{BlueskyApi, ListPage, Page, SearchFilters};
use crate::error::{AppError, Result};
use crate::models::ApiConfig;
use crate::models::raw::{FeedViewPost, ListView, PostView, ProfileView};
use crate::utils::http::{create_client, xrpc_url};

const CREATE_SESSION: &str = "com.atproto.server.createSession";
const GET_PROFILE: &str = "app.bsky.actor.getProfile";
const GET_AUTHOR_FEED: &str = "app.bsky.feed.getAuthorFeed";
const GET_LIST: &str = "app.bsky.graph.getList";
const GET_LIST_FEED: &str = "app.bsky.feed.getListFeed";
const SEARCH_POSTS: &str = "app.bsky.feed.searchPosts";

#[derive(Debug, Clone)]
struct Session {
    access_jwt: String,
    did: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionResponse {
    access_jwt: String,
    did: String,
    handle: String,
}

// Page entries stay untyped until `decode_entries`, so one malformed
// record does not fail the whole page.

#[derive(Debug, Deserialize)]
struct FeedResponse {
    #[serde(default)]
    feed: Vec<Value>,
    #[serde(default)]
    cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    posts: Vec<Value>,
    #[serde(default)]
    cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    list: ListView,
    #[serde(default)]
    items: Vec<Value>,
    #[serde(default)]
    cursor: Option<String>,
}

/// XRPC error body (`{"error": "...", "message": "..."}`).
#[derive(Debug, Deserialize, Default)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Decode each page entry on its own, logging and skipping the ones that fail.
fn decode_entries<T: DeserializeOwned>(method: &str, entries: Vec<Value>) -> Vec<T> {
    entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value(entry) {
            Ok(item) => Some(item),
            Err(e) => {
                log::warn!("Skipping malformed {method} entry #{index}: {e}");
                None
            }
        })
        .collect()
}

/// HTTP implementation of [`BlueskyApi`].
pub struct XrpcClient {
    http: Client,
    service_url: String,
    session: RwLock<Option<Session>>,
}

impl XrpcClient {
    /// Create a client for the configured service.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        Ok(Self::with_client(
            create_client(config)?,
            &config.service_url,
        ))
    }

    /// Create a client reusing an existing `reqwest` client.
    pub fn with_client(http: Client, service_url: &str) -> Self {
        Self {
            http,
            service_url: service_url.trim_end_matches('/').to_string(),
            session: RwLock::new(None),
        }
    }

    /// DID of the logged-in account, if any.
    pub fn session_did(&self) -> Option<String> {
        self.session
            .read()
            .ok()
            .and_then(|guard| guard.as_ref().map(|s| s.did.clone()))
    }

    fn access_token(&self) -> Option<String> {
        self.session
            .read()
            .ok()
            .and_then(|guard| guard.as_ref().map(|s| s.access_jwt.clone()))
    }

    async fn get<T: DeserializeOwned>(&self, method: &str, query: &[(&str, String)]) -> Result<T> {
        let url = xrpc_url(&self.service_url, method)?;
        let mut request = self.http.get(url).query(query);
        if let Some(token) = self.access_token() {
            request = request.bearer_auth(token);
        }

        log::debug!("GET {method} {query:?}");
        let response = request.send().await?;
        Self::decode(method, response).await
    }

    async fn decode<T: DeserializeOwned>(method: &str, response: Response) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let body = response.text().await.unwrap_or_default();
        let parsed: ErrorBody = serde_json::from_str(&body).unwrap_or_default();
        let message = match (parsed.error, parsed.message) {
            (Some(error), Some(message)) => format!("{error}: {message}"),
            (Some(error), None) => error,
            (None, Some(message)) => message,
            (None, None) => body,
        };
        Err(AppError::api(method, status.as_u16(), message))
    }

    fn page_query(limit: usize, cursor: Option<&str>) -> Vec<(&'static str, String)> {
        let mut query = vec![("limit", limit.to_string())];
        if let Some(cursor) = cursor {
            query.push(("cursor", cursor.to_string()));
        }
        query
    }
}

#[async_trait]
impl BlueskyApi for XrpcClient {
    async fn login(&self, identifier: &str, password: &str) -> Result<bool> {
        let url = xrpc_url(&self.service_url, CREATE_SESSION)?;
        let response = self
            .http
            .post(url)
            .json(&serde_json::json!({
                "identifier": identifier,
                "password": password,
            }))
            .send()
            .await?;

        if matches!(
            response.status(),
            StatusCode::UNAUTHORIZED | StatusCode::BAD_REQUEST
        ) {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            log::warn!("Login rejected for {identifier} ({status}): {body}");
            return Ok(false);
        }

        let session: SessionResponse = Self::decode(CREATE_SESSION, response).await?;
        log::info!("Authenticated as {} ({})", session.handle, session.did);

        let mut guard = self
            .session
            .write()
            .map_err(|_| AppError::auth("session lock poisoned"))?;
        *guard = Some(Session {
            access_jwt: session.access_jwt,
            did: session.did,
        });
        Ok(true)
    }

    async fn get_profile(&self, actor: &str) -> Result<ProfileView> {
        self.get(GET_PROFILE, &[("actor", actor.to_string())]).await
    }

    async fn get_author_feed(
        &self,
        actor: &str,
        limit: usize,
        cursor: Option<&str>,
    ) -> Result<Page<FeedViewPost>> {
        let mut query = vec![("actor", actor.to_string())];
        query.extend(Self::page_query(limit, cursor));
        let response: FeedResponse = self.get(GET_AUTHOR_FEED, &query).await?;
        Ok(Page::new(
            decode_entries(GET_AUTHOR_FEED, response.feed),
            response.cursor,
        ))
    }

    async fn get_list(&self, list: &str, limit: usize, cursor: Option<&str>) -> Result<ListPage> {
        let mut query = vec![("list", list.to_string())];
        query.extend(Self::page_query(limit, cursor));
        let response: ListResponse = self.get(GET_LIST, &query).await?;
        Ok(ListPage {
            list: response.list,
            items: decode_entries(GET_LIST, response.items),
            cursor: response.cursor,
        })
    }

    async fn get_list_feed(
        &self,
        list: &str,
        limit: usize,
        cursor: Option<&str>,
    ) -> Result<Page<FeedViewPost>> {
        let mut query = vec![("list", list.to_string())];
        query.extend(Self::page_query(limit, cursor));
        let response: FeedResponse = self.get(GET_LIST_FEED, &query).await?;
        Ok(Page::new(
            decode_entries(GET_LIST_FEED, response.feed),
            response.cursor,
        ))
    }

    async fn search_posts(
        &self,
        query: &str,
        limit: usize,
        cursor: Option<&str>,
        filters: &SearchFilters,
    ) -> Result<Page<PostView>> {
        let mut params = vec![("q", query.to_string())];
        params.extend(Self::page_query(limit, cursor));
        for (key, value) in [
            ("author", &filters.author),
            ("mention", &filters.mention),
            ("lang", &filters.lang),
            ("since", &filters.since),
            ("until", &filters.until),
        ] {
            if let Some(value) = value.as_deref().filter(|v| !v.trim().is_empty()) {
                params.push((key, value.to_string()));
            }
        }

        let response: SearchResponse = self.get(SEARCH_POSTS, &params).await?;
        Ok(Page::new(
            decode_entries(SEARCH_POSTS, response.posts),
            response.cursor,
        ))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::models::raw::ListItemView;

    fn entry(rkey: &str, facets: Value) -> Value {
        json!({
            "post": {
                "uri": format!("at://did:plc:a/app.bsky.feed.post/{rkey}"),
                "author": {"did": "did:plc:a", "handle": "a.test"},
                "record": {"text": "hi", "createdAt": "2024-01-01T00:00:00Z", "facets": facets}
            }
        })
    }

    #[test]
    fn test_malformed_entry_skipped_rest_kept() {
        let bad_link = json!([{"features": [{"$type": "app.bsky.richtext.facet#link"}]}]);
        let entries = vec![
            entry("1", json!([])),
            entry("2", bad_link),
            json!({"post": {"uri": "at://did:plc:a/app.bsky.feed.post/3"}}),
            entry("4", json!([])),
        ];

        let items: Vec<FeedViewPost> = decode_entries(GET_AUTHOR_FEED, entries);

        let uris: Vec<&str> = items.iter().map(|item| item.post.uri.as_str()).collect();
        assert_eq!(
            uris,
            vec![
                "at://did:plc:a/app.bsky.feed.post/1",
                "at://did:plc:a/app.bsky.feed.post/4"
            ]
        );
    }

    #[test]
    fn test_list_member_without_subject_skipped() {
        let entries = vec![
            json!({"uri": "at://o/app.bsky.graph.listitem/1"}),
            json!({
                "uri": "at://o/app.bsky.graph.listitem/2",
                "subject": {"did": "did:plc:b", "handle": "b.test"}
            }),
        ];

        let items: Vec<ListItemView> = decode_entries(GET_LIST, entries);

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].subject.handle, "b.test");
    }
}
