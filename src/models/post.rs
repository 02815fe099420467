//! Normalized post record and the author-grouped result set.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// How a post relates to the feed it was found in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PostType {
    #[default]
    Original,
    Reply,
    Repost,
}

impl PostType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostType::Original => "original",
            PostType::Reply => "reply",
            PostType::Repost => "repost",
        }
    }
}

impl std::fmt::Display for PostType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Post author identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Author {
    /// Stable decentralized identifier
    pub did: String,

    /// Handle at fetch time
    pub handle: String,

    /// Display name, the handle when the profile has none
    pub display_name: String,
}

/// Like/repost/reply counters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Engagement {
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub reposts: u64,
    #[serde(default)]
    pub replies: u64,
}

/// A post normalized from a raw feed or search record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Post {
    /// Protocol URI (`at://<did>/app.bsky.feed.post/<rkey>`)
    pub uri: String,

    /// Content identifier of the record
    pub cid: String,

    pub author: Author,

    pub text: String,

    /// ISO-8601 creation timestamp, kept as sent
    pub created_at: String,

    #[serde(default)]
    pub engagement: Engagement,

    pub post_type: PostType,

    /// Links, structured annotations first
    #[serde(default)]
    pub urls: Vec<String>,

    /// Mentioned handles, or DIDs when no handle was annotated
    #[serde(default)]
    pub mentions: Vec<String>,

    /// Media-fetch URLs for embedded images
    #[serde(default)]
    pub images: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,

    /// Browser URL of the post
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_url: Option<String>,

    /// DID of the parent post's author (replies only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replied_to_id: Option<String>,

    /// Handle of the parent post's author (replies only, best effort)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replied_to_handle: Option<String>,
}

/// Posts grouped by handle, in retrieval order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ResultSet {
    groups: IndexMap<String, Vec<Post>>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Group posts by their author's handle.
    pub fn from_posts(posts: impl IntoIterator<Item = Post>) -> Self {
        let mut results = Self::new();
        for post in posts {
            results.push(post);
        }
        results
    }

    /// Append a post under its author's handle.
    pub fn push(&mut self, post: Post) {
        self.groups
            .entry(post.author.handle.clone())
            .or_default()
            .push(post);
    }

    /// Append posts under an explicit key (e.g. the timeline that was fetched).
    pub fn extend_group(&mut self, key: impl Into<String>, posts: Vec<Post>) {
        self.groups.entry(key.into()).or_default().extend(posts);
    }

    /// Merge another result set, keeping this set's key order first.
    pub fn merge(&mut self, other: ResultSet) {
        for (key, posts) in other.groups {
            self.extend_group(key, posts);
        }
    }

    pub fn get(&self, key: &str) -> Option<&[Post]> {
        self.groups.get(key).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Post])> {
        self.groups
            .iter()
            .map(|(key, posts)| (key.as_str(), posts.as_slice()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of posts across all groups.
    pub fn post_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }
}
