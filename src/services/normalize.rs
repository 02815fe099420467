// src/services/normalize.rs

//! Turns raw feed entries into [`Post`] records.

use std::sync::Arc;

use crate::client::BlueskyApi;
use crate::error::{AppError, Result};
use crate::models::raw::{FacetFeature, FeedReason, FeedViewPost, PostRecord};
use crate::models::{ApiConfig, Author, Engagement, Post, PostType};
use crate::utils::text::{append_unique, extract_urls, leading_handle};
use crate::utils::uri::{blob_url, did_from_at_uri, is_did, normalize_handle, web_url};

/// Why a post showed up, which drives repost classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterestContext {
    /// Fetched from a user's timeline; anything not authored by the owner is a repost
    Timeline { owner_did: Option<String> },
    /// Returned by a search, optionally restricted to an author
    Search { author_filter: Option<String> },
    /// No owner to compare against; only the feed reason counts
    Neutral,
}

/// Classify a feed entry.
///
/// A record with a reply reference is always a reply.
pub fn classify(raw: &FeedViewPost, context: &InterestContext) -> PostType {
    if raw.post.record.reply.is_some() {
        return PostType::Reply;
    }

    let reposted = raw.reason.as_ref().is_some_and(FeedReason::is_repost);
    let by_reason = if reposted {
        PostType::Repost
    } else {
        PostType::Original
    };

    match context {
        InterestContext::Timeline {
            owner_did: Some(owner),
        } => {
            if raw.post.author.did != *owner {
                PostType::Repost
            } else {
                PostType::Original
            }
        }
        InterestContext::Search {
            author_filter: Some(filter),
        } => {
            let filter = normalize_handle(filter).to_lowercase();
            if !filter.is_empty() && raw.post.author.handle.to_lowercase().contains(&filter) {
                PostType::Original
            } else {
                by_reason
            }
        }
        _ => by_reason,
    }
}

/// Links and mentions of a record.
///
/// Facet annotations come first in their own order; URLs found in the text
/// by pattern are appended when not already present. Mentions use the
/// annotated handle, falling back to the DID.
pub fn extract_links(record: &PostRecord) -> (Vec<String>, Vec<String>) {
    let mut urls = Vec::new();
    let mut mentions = Vec::new();

    for feature in record.facets.iter().flat_map(|facet| &facet.features) {
        match feature {
            FacetFeature::Link { uri } => append_unique(&mut urls, [uri.clone()]),
            FacetFeature::Mention { did, handle } => {
                let mention = handle
                    .as_deref()
                    .filter(|h| !h.trim().is_empty())
                    .unwrap_or(did);
                mentions.push(mention.to_string());
            }
            FacetFeature::Tag { .. } | FacetFeature::Unknown => {}
        }
    }

    append_unique(&mut urls, extract_urls(&record.text));
    (urls, mentions)
}

/// Media URLs for the images embedded in a record.
pub fn extract_images(record: &PostRecord, author_did: &str, blob_host: &str) -> Vec<String> {
    record
        .embed
        .iter()
        .flat_map(|embed| embed.images())
        .filter_map(|entry| entry.image.as_ref()?.cid())
        .map(|cid| blob_url(blob_host, author_did, cid))
        .collect()
}

/// Builds [`Post`] records, resolving reply targets through the API when needed.
pub struct PostNormalizer {
    web_host: String,
    blob_host: String,
    api: Arc<dyn BlueskyApi>,
}

impl PostNormalizer {
    pub fn new(config: &ApiConfig, api: Arc<dyn BlueskyApi>) -> Self {
        Self {
            web_host: config.web_host.clone(),
            blob_host: config.blob_host.clone(),
            api,
        }
    }

    /// Normalize one entry. Fails only on an entry without a URI.
    pub async fn normalize(&self, raw: &FeedViewPost, context: &InterestContext) -> Result<Post> {
        let view = &raw.post;
        if view.uri.trim().is_empty() {
            return Err(AppError::validation("feed entry without a post URI"));
        }

        let record = &view.record;
        let (urls, mentions) = extract_links(record);
        let images = extract_images(record, &view.author.did, &self.blob_host);
        let post_type = classify(raw, context);

        let (replied_to_id, replied_to_handle) = if post_type == PostType::Reply {
            self.reply_target(record, &mentions).await
        } else {
            (None, None)
        };

        let handle = view.author.handle.clone();
        let display_name = view
            .author
            .display_name
            .clone()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| handle.clone());

        Ok(Post {
            uri: view.uri.clone(),
            cid: view.cid.clone(),
            web_url: web_url(&self.web_host, &handle, &view.uri),
            author: Author {
                did: view.author.did.clone(),
                handle,
                display_name,
            },
            text: record.text.clone(),
            created_at: record.created_at.clone(),
            engagement: Engagement {
                likes: view.like_count.unwrap_or(0),
                reposts: view.repost_count.unwrap_or(0),
                replies: view.reply_count.unwrap_or(0),
            },
            post_type,
            urls,
            mentions,
            images,
            lang: record
                .langs
                .first()
                .filter(|lang| !lang.trim().is_empty())
                .cloned(),
            replied_to_id,
            replied_to_handle,
        })
    }

    /// Normalize a batch, dropping entries that fail.
    pub async fn normalize_all(
        &self,
        raw: &[FeedViewPost],
        context: &InterestContext,
    ) -> Vec<Post> {
        let mut posts = Vec::with_capacity(raw.len());
        for item in raw {
            match self.normalize(item, context).await {
                Ok(post) => posts.push(post),
                Err(e) => log::warn!("Skipping post by @{}: {}", item.post.author.handle, e),
            }
        }
        posts
    }

    /// Parent DID and handle of a reply.
    ///
    /// The handle comes from a leading `@handle` in the text, then the first
    /// mention, then a profile lookup of the parent DID.
    async fn reply_target(
        &self,
        record: &PostRecord,
        mentions: &[String],
    ) -> (Option<String>, Option<String>) {
        let parent_did = record
            .reply
            .as_ref()
            .and_then(|reply| did_from_at_uri(&reply.parent.uri));

        let handle = leading_handle(&record.text).or_else(|| {
            mentions
                .first()
                .map(|m| normalize_handle(m))
                .filter(|m| !m.is_empty() && !is_did(m))
        });
        if handle.is_some() {
            return (parent_did, handle);
        }

        let Some(did) = parent_did.as_deref() else {
            return (None, None);
        };
        match self.api.get_profile(did).await {
            Ok(profile) => (parent_did.clone(), Some(profile.handle)),
            Err(e) => {
                log::debug!("Could not resolve reply parent {did}: {e}");
                (parent_did.clone(), None)
            }
        }
    }
}
