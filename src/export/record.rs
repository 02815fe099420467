// src/export/record.rs

//! Flattened one-row-per-post representation used by the JSONL and CSV writers.

use chrono::DateTime;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{Author, Engagement, Post, PostType, ResultSet};

/// Column order of flattened exports.
pub const COLUMNS: [&str; 19] = [
    "user_handle",
    "author_handle",
    "author_display_name",
    "created_at",
    "post_type",
    "text",
    "web_url",
    "likes",
    "reposts",
    "replies",
    "urls",
    "images",
    "mentions",
    "lang",
    "replied_to_handle",
    "replied_to_id",
    "cid",
    "author_did",
    "uri",
];

/// One post plus the result-set key it was stored under.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FlatRecord {
    /// Group key (the timeline or author the post was collected for)
    pub user_handle: String,
    pub author_handle: String,
    #[serde(default)]
    pub author_display_name: String,
    #[serde(default)]
    pub created_at: String,
    pub post_type: PostType,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub web_url: Option<String>,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub reposts: u64,
    #[serde(default)]
    pub replies: u64,
    #[serde(default)]
    pub urls: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub mentions: Vec<String>,
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub replied_to_handle: Option<String>,
    #[serde(default)]
    pub replied_to_id: Option<String>,
    #[serde(default)]
    pub cid: String,
    #[serde(default)]
    pub author_did: String,
    pub uri: String,
}

impl FlatRecord {
    pub fn new(user_handle: &str, post: &Post) -> Self {
        Self {
            user_handle: user_handle.to_string(),
            author_handle: post.author.handle.clone(),
            author_display_name: post.author.display_name.clone(),
            created_at: post.created_at.clone(),
            post_type: post.post_type,
            text: post.text.clone(),
            web_url: post.web_url.clone(),
            likes: post.engagement.likes,
            reposts: post.engagement.reposts,
            replies: post.engagement.replies,
            urls: post.urls.clone(),
            images: post.images.clone(),
            mentions: post.mentions.clone(),
            lang: post.lang.clone(),
            replied_to_handle: post.replied_to_handle.clone(),
            replied_to_id: post.replied_to_id.clone(),
            cid: post.cid.clone(),
            author_did: post.author.did.clone(),
            uri: post.uri.clone(),
        }
    }

    /// Split back into the group key and the post.
    pub fn into_post(self) -> (String, Post) {
        let post = Post {
            uri: self.uri,
            cid: self.cid,
            author: Author {
                did: self.author_did,
                handle: self.author_handle,
                display_name: self.author_display_name,
            },
            text: self.text,
            created_at: self.created_at,
            engagement: Engagement {
                likes: self.likes,
                reposts: self.reposts,
                replies: self.replies,
            },
            post_type: self.post_type,
            urls: self.urls,
            mentions: self.mentions,
            images: self.images,
            lang: self.lang,
            web_url: self.web_url,
            replied_to_id: self.replied_to_id,
            replied_to_handle: self.replied_to_handle,
        };
        (self.user_handle, post)
    }

    /// Cell values in [`COLUMNS`] order. List columns are JSON arrays.
    pub fn cells(&self) -> Result<Vec<String>> {
        let opt = |value: &Option<String>| value.clone().unwrap_or_default();
        Ok(vec![
            self.user_handle.clone(),
            self.author_handle.clone(),
            self.author_display_name.clone(),
            self.created_at.clone(),
            self.post_type.as_str().to_string(),
            self.text.clone(),
            opt(&self.web_url),
            self.likes.to_string(),
            self.reposts.to_string(),
            self.replies.to_string(),
            serde_json::to_string(&self.urls)?,
            serde_json::to_string(&self.images)?,
            serde_json::to_string(&self.mentions)?,
            opt(&self.lang),
            opt(&self.replied_to_handle),
            opt(&self.replied_to_id),
            self.cid.clone(),
            self.author_did.clone(),
            self.uri.clone(),
        ])
    }
}

/// Flatten a result set, optionally newest first.
///
/// Sorting is stable; timestamps that do not parse sort after those that do.
pub fn flatten(results: &ResultSet, sort_by_date: bool) -> Vec<FlatRecord> {
    let mut records: Vec<FlatRecord> = results
        .iter()
        .flat_map(|(key, posts)| posts.iter().map(move |post| FlatRecord::new(key, post)))
        .collect();

    if sort_by_date {
        records.sort_by_cached_key(|record| {
            std::cmp::Reverse(
                DateTime::parse_from_rfc3339(&record.created_at)
                    .ok()
                    .map(|dt| dt.timestamp_micros()),
            )
        });
    }
    records
}

/// Quote a CSV field when it contains a delimiter, quote or line break.
pub fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

pub fn csv_row<S: AsRef<str>>(cells: &[S]) -> String {
    let mut row = cells
        .iter()
        .map(|cell| csv_field(cell.as_ref()))
        .collect::<Vec<_>>()
        .join(",");
    row.push_str("\r\n");
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sample_post;

    #[test]
    fn test_flatten_sorts_newest_first() {
        let mut results = ResultSet::new();
        results.push(sample_post("a.test", "old", "2024-01-01T00:00:00Z"));
        results.push(sample_post("b.test", "new", "2024-06-01T00:00:00.000Z"));
        results.push(sample_post("a.test", "bad", "yesterday"));
        results.push(sample_post("b.test", "mid", "2024-03-01T00:00:00+02:00"));

        let keys: Vec<String> = flatten(&results, true)
            .into_iter()
            .map(|r| r.uri.rsplit('/').next().unwrap().to_string())
            .collect();
        assert_eq!(keys, vec!["new", "mid", "old", "bad"]);
    }

    #[test]
    fn test_flatten_keeps_group_order_unsorted() {
        let mut results = ResultSet::new();
        results.extend_group("timeline.test", vec![
            sample_post("x.test", "1", "2024-01-01T00:00:00Z"),
            sample_post("y.test", "2", "2024-02-01T00:00:00Z"),
        ]);

        let records = flatten(&results, false);
        assert_eq!(records[0].user_handle, "timeline.test");
        assert_eq!(records[0].author_handle, "x.test");
        assert_eq!(records[1].author_handle, "y.test");
    }

    #[test]
    fn test_missing_lists_read_as_empty() {
        let record: FlatRecord = serde_json::from_str(
            r#"{"user_handle":"a","author_handle":"a","post_type":"original","uri":"at://x"}"#,
        )
        .unwrap();
        assert!(record.images.is_empty());
        assert!(record.urls.is_empty());
        assert!(record.mentions.is_empty());
    }

    #[test]
    fn test_cells_match_columns() {
        let mut post = sample_post("a.test", "1", "2024-01-01T00:00:00Z");
        post.urls = vec!["https://x.example".to_string()];
        let cells = FlatRecord::new("a.test", &post).cells().unwrap();

        assert_eq!(cells.len(), COLUMNS.len());
        assert_eq!(cells[10], r#"["https://x.example"]"#);
        assert_eq!(cells[11], "[]");
        assert_eq!(cells[13], "");
    }

    #[test]
    fn test_csv_quoting() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_field("two\nlines"), "\"two\nlines\"");
        assert_eq!(csv_row(&["a", "b,c"]), "a,\"b,c\"\r\n");
    }
}
