//! Typed views of the AT Protocol records consumed by the normalizer.
//!
//! Only the fields the fetcher reads are modelled. Anything optional in the
//! lexicon is an `Option` or a defaulted collection here, so a sparse record
//! deserializes instead of failing the whole page.

use serde::Deserialize;

/// Feed reason `$type` for reposts surfaced in a feed.
pub const REASON_REPOST: &str = "app.bsky.feed.defs#reasonRepost";

/// Basic actor view embedded in posts and list items.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    pub did: String,
    pub handle: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// One entry of an author or list feed.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedViewPost {
    pub post: PostView,
    #[serde(default)]
    pub reason: Option<FeedReason>,
}

impl From<PostView> for FeedViewPost {
    fn from(post: PostView) -> Self {
        Self { post, reason: None }
    }
}

/// Why a post appears in a feed (e.g. a repost by the feed owner).
#[derive(Debug, Clone, Deserialize, Default)]
pub struct FeedReason {
    #[serde(rename = "$type", default)]
    pub kind: Option<String>,
}

impl FeedReason {
    pub fn is_repost(&self) -> bool {
        self.kind
            .as_deref()
            .is_some_and(|kind| kind.to_lowercase().contains("repost"))
    }
}

/// Hydrated post as returned by feed and search endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub cid: String,
    pub author: ProfileView,
    #[serde(default)]
    pub record: PostRecord,
    #[serde(default)]
    pub like_count: Option<u64>,
    #[serde(default)]
    pub repost_count: Option<u64>,
    #[serde(default)]
    pub reply_count: Option<u64>,
    #[serde(default)]
    pub indexed_at: Option<String>,
}

/// The `app.bsky.feed.post` record itself.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PostRecord {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub reply: Option<ReplyRef>,
    #[serde(default)]
    pub facets: Vec<Facet>,
    #[serde(default)]
    pub embed: Option<RecordEmbed>,
    #[serde(default)]
    pub langs: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReplyRef {
    pub parent: StrongRef,
    #[serde(default)]
    pub root: Option<StrongRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StrongRef {
    pub uri: String,
    #[serde(default)]
    pub cid: String,
}

/// Rich-text annotation over a byte range of the text.
#[derive(Debug, Clone, Deserialize)]
pub struct Facet {
    #[serde(default)]
    pub features: Vec<FacetFeature>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "$type")]
pub enum FacetFeature {
    #[serde(rename = "app.bsky.richtext.facet#link")]
    Link { uri: String },
    #[serde(rename = "app.bsky.richtext.facet#mention")]
    Mention {
        did: String,
        #[serde(default)]
        handle: Option<String>,
    },
    #[serde(rename = "app.bsky.richtext.facet#tag")]
    Tag { tag: String },
    #[serde(other)]
    Unknown,
}

/// Embed as stored in the record (not the hydrated `#view` form).
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "$type")]
pub enum RecordEmbed {
    #[serde(rename = "app.bsky.embed.images")]
    Images {
        #[serde(default)]
        images: Vec<ImageEntry>,
    },
    #[serde(rename = "app.bsky.embed.recordWithMedia")]
    RecordWithMedia { media: Box<RecordEmbed> },
    #[serde(other)]
    Unknown,
}

impl RecordEmbed {
    /// Image entries, looking through a record-with-media wrapper.
    pub fn images(&self) -> &[ImageEntry] {
        match self {
            RecordEmbed::Images { images } => images,
            RecordEmbed::RecordWithMedia { media } => media.images(),
            RecordEmbed::Unknown => &[],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageEntry {
    #[serde(default)]
    pub image: Option<BlobRef>,
    #[serde(default)]
    pub alt: String,
}

/// Blob reference, either the current `ref.$link` form or the legacy `cid`.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct BlobRef {
    #[serde(rename = "ref", default)]
    pub reference: Option<CidLink>,
    #[serde(default)]
    pub cid: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
}

impl BlobRef {
    pub fn cid(&self) -> Option<&str> {
        self.reference
            .as_ref()
            .map(|r| r.link.as_str())
            .or(self.cid.as_deref())
            .filter(|cid| !cid.trim().is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CidLink {
    #[serde(rename = "$link")]
    pub link: String,
}

/// List metadata from `app.bsky.graph.getList`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListView {
    pub uri: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub purpose: Option<String>,
    #[serde(default)]
    pub creator: Option<ProfileView>,
}

/// A list membership entry.
#[derive(Debug, Clone, Deserialize)]
pub struct ListItemView {
    #[serde(default)]
    pub uri: String,
    pub subject: ProfileView,
}
