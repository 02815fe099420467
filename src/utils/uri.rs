// src/utils/uri.rs

//! Identifier and address helpers for handles, DIDs and `at://` URIs.

use std::sync::LazyLock;

use regex::Regex;

use super::text::sanitize;

/// Locator shapes understood by [`parse_list_locator`], for error reports.
pub const ACCEPTED_LIST_FORMATS: [&str; 3] = [
    "[https://]bsky.app/profile/<handle>/lists/<list_id>",
    "at://<did>/app.bsky.graph.list/<list_id>",
    "<did>/app.bsky.graph.list/<list_id>",
];

static WEB_LIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:https?://)?[^/\s"']+/profile/([^/]+)/lists/([^/?#]+)"#).expect("valid regex")
});

static AT_LIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"at://([^/]+)/[A-Za-z0-9.\-]+\.graph\.list/([^/?#]+)").expect("valid regex")
});

static BARE_LIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(did:[^/]+)/[A-Za-z0-9.\-]+\.graph\.list/([^/?#]+)").expect("valid regex")
});

/// Owner and record key of a curated list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListLocator {
    /// Handle or DID of the list owner
    pub owner: String,
    pub list_id: String,
}

/// Parse a user supplied list locator.
///
/// Tries the web URL, `at://` URI and bare DID shapes in that order.
/// Captured parts are sanitized; `None` when nothing matches.
///
/// # Examples
/// ```
/// use skyfetch::utils::uri::parse_list_locator;
///
/// let locator = parse_list_locator("https://bsky.app/profile/alice.test/lists/99").unwrap();
/// assert_eq!(locator.owner, "alice.test");
/// assert_eq!(locator.list_id, "99");
/// ```
pub fn parse_list_locator(input: &str) -> Option<ListLocator> {
    [&*WEB_LIST, &*AT_LIST, &*BARE_LIST]
        .into_iter()
        .find_map(|pattern| pattern.captures(input))
        .and_then(|caps| {
            let owner = sanitize(caps.get(1)?.as_str());
            let list_id = sanitize(caps.get(2)?.as_str());
            (!owner.is_empty() && !list_id.is_empty()).then_some(ListLocator { owner, list_id })
        })
}

/// Build `at://<owner_did>/<collection>/<list_id>` from sanitized parts.
///
/// Copy-pasted locators sometimes carry quotes that survive into the
/// assembled string, so any left are stripped once more.
pub fn list_address(owner_did: &str, collection: &str, list_id: &str) -> String {
    let address = format!(
        "at://{}/{}/{}",
        sanitize(owner_did),
        collection,
        sanitize(list_id)
    );
    if address.contains(['"', '\'']) {
        address.replace(['"', '\''], "")
    } else {
        address
    }
}

/// Trim a handle and drop one leading `@`.
pub fn normalize_handle(handle: &str) -> String {
    let trimmed = handle.trim();
    trimmed
        .strip_prefix('@')
        .unwrap_or(trimmed)
        .trim()
        .to_string()
}

pub fn is_did(value: &str) -> bool {
    value.starts_with("did:")
}

/// Authority (the DID) of an `at://` URI.
pub fn did_from_at_uri(uri: &str) -> Option<String> {
    let rest = uri.strip_prefix("at://")?;
    let authority = rest.split('/').next()?;
    (!authority.is_empty()).then(|| authority.to_string())
}

/// Last path segment of a URI (the record key for post URIs).
pub fn record_key(uri: &str) -> Option<&str> {
    let (_, key) = uri.rsplit_once('/')?;
    (!key.is_empty()).then_some(key)
}

/// Browser URL for a post, `None` when the inputs cannot form one.
pub fn web_url(web_host: &str, handle: &str, uri: &str) -> Option<String> {
    if handle.trim().is_empty() {
        return None;
    }
    let rkey = record_key(uri)?;
    Some(format!(
        "{}/profile/{}/post/{}",
        web_host.trim_end_matches('/'),
        handle,
        rkey
    ))
}

/// Media-fetch URL for a blob owned by `did`.
pub fn blob_url(blob_host: &str, did: &str, cid: &str) -> String {
    format!(
        "{}/xrpc/com.atproto.sync.getBlob?did={}&cid={}",
        blob_host.trim_end_matches('/'),
        did,
        cid
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_web_list_url() {
        assert_eq!(
            parse_list_locator("https://example.org/profile/alice.test/lists/99"),
            Some(ListLocator {
                owner: "alice.test".to_string(),
                list_id: "99".to_string()
            })
        );
    }

    #[test]
    fn test_parse_web_list_url_without_scheme() {
        assert_eq!(
            parse_list_locator("bsky.app/profile/alice.test/lists/99"),
            Some(ListLocator {
                owner: "alice.test".to_string(),
                list_id: "99".to_string()
            })
        );
        let locator = parse_list_locator("'bsky.app/profile/did:plc:xyz/lists/3kabc?x=1'").unwrap();
        assert_eq!(locator.owner, "did:plc:xyz");
        assert_eq!(locator.list_id, "3kabc");
    }

    #[test]
    fn test_parse_at_list_uri() {
        assert_eq!(
            parse_list_locator("at://did:plc:xyz/app.example.graph.list/99"),
            Some(ListLocator {
                owner: "did:plc:xyz".to_string(),
                list_id: "99".to_string()
            })
        );
    }

    #[test]
    fn test_parse_bare_did_list() {
        let locator = parse_list_locator("did:plc:xyz/app.bsky.graph.list/3kabc").unwrap();
        assert_eq!(locator.owner, "did:plc:xyz");
        assert_eq!(locator.list_id, "3kabc");
    }

    #[test]
    fn test_parse_unrecognized() {
        assert_eq!(parse_list_locator("not a list url"), None);
        assert_eq!(
            parse_list_locator("https://bsky.app/profile/alice.test"),
            None
        );
        assert_eq!(
            parse_list_locator("at://did:plc:xyz/app.bsky.feed.post/99"),
            None
        );
    }

    #[test]
    fn test_parse_quoted_locator() {
        let locator =
            parse_list_locator("\"https://bsky.app/profile/'alice.test'/lists/3kab\"c'\"").unwrap();
        assert_eq!(locator.owner, "alice.test");
        assert_eq!(locator.list_id, "3kabc");
    }

    #[test]
    fn test_list_address_double_clean() {
        assert_eq!(
            list_address("\"did:plc:xyz\"", "app.bsky.graph.list", "'3kabc'"),
            "at://did:plc:xyz/app.bsky.graph.list/3kabc"
        );
        assert_eq!(
            list_address("did:plc:xyz", "app.bsky.graph.list'", "3k"),
            "at://did:plc:xyz/app.bsky.graph.list/3k"
        );
    }

    #[test]
    fn test_normalize_handle() {
        assert_eq!(normalize_handle("  @alice.test "), "alice.test");
        assert_eq!(normalize_handle("bob.test"), "bob.test");
    }

    #[test]
    fn test_did_from_at_uri() {
        assert_eq!(
            did_from_at_uri("at://did:plc:abc/app.bsky.feed.post/3k"),
            Some("did:plc:abc".to_string())
        );
        assert_eq!(did_from_at_uri("https://bsky.app"), None);
        assert_eq!(did_from_at_uri("at:///x"), None);
    }

    #[test]
    fn test_web_url() {
        assert_eq!(
            web_url(
                "https://bsky.app/",
                "alice.test",
                "at://did:plc:abc/app.bsky.feed.post/3kpost"
            ),
            Some("https://bsky.app/profile/alice.test/post/3kpost".to_string())
        );
        assert_eq!(web_url("https://bsky.app", "", "at://d/c/r"), None);
        assert_eq!(web_url("https://bsky.app", "a.test", "no-slashes"), None);
        assert_eq!(web_url("https://bsky.app", "a.test", "at://d/c/"), None);
    }

    #[test]
    fn test_blob_url() {
        assert_eq!(
            blob_url("https://bsky.social", "did:plc:abc", "bafkimg"),
            "https://bsky.social/xrpc/com.atproto.sync.getBlob?did=did:plc:abc&cid=bafkimg"
        );
    }
}
