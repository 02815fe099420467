// src/utils/text.rs

//! Text cleanup and extraction helpers.

use std::sync::LazyLock;

use regex::Regex;

static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://[\w\-.]+(?:/[\w\-./%?&=+#]*)?").expect("valid URL regex")
});

static LEADING_HANDLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@([\w.-]+\.\w+)").expect("valid handle regex"));

/// Clean an untrusted fragment before it is embedded in a protocol address.
///
/// Removes quote characters (`"` and `'`), all whitespace and all C0/C1
/// control characters, wherever they appear. Idempotent.
///
/// # Examples
/// ```
/// use skyfetch::utils::text::sanitize;
///
/// assert_eq!(sanitize("  \"abc'def\"  "), "abcdef");
/// ```
pub fn sanitize(component: &str) -> String {
    component
        .chars()
        .filter(|c| !matches!(c, '"' | '\'') && !c.is_whitespace() && !c.is_control())
        .collect()
}

/// Find every `http(s)` URL in free text, in order of appearance.
pub fn extract_urls(text: &str) -> Vec<String> {
    URL_PATTERN
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Handle of a leading `@mention` (replies usually start with one).
pub fn leading_handle(text: &str) -> Option<String> {
    LEADING_HANDLE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Append `items` to `target`, skipping values already present.
pub fn append_unique(target: &mut Vec<String>, items: impl IntoIterator<Item = String>) {
    for item in items {
        if !target.contains(&item) {
            target.push(item);
        }
    }
}
