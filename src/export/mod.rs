//! Export of collected posts.
//!
//! Three formats are supported:
//! - `json`: the result set as one object, handle → array of posts
//! - `jsonl`: one flattened record per line
//! - `csv`: flattened rows, list columns as JSON arrays
//!
//! ```text
//! data/
//! ├── alice.bsky.social_20240501_101500.csv
//! └── search_rust_20240501_102000.jsonl
//! ```

pub mod local;
pub mod record;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Local};

use crate::error::Result;
use crate::models::{ExportFormat, ResultSet};

pub use local::{LocalExporter, load_json, load_jsonl};
pub use record::{COLUMNS, FlatRecord, flatten};

/// What an export wrote.
#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub format: ExportFormat,
    /// Posts written
    pub records: usize,
}

/// Destination for a finished result set.
#[async_trait]
pub trait PostExporter: Send + Sync {
    /// Write `results` to `path`.
    async fn write(&self, results: &ResultSet, path: &Path) -> Result<ExportSummary>;

    /// Path used when the caller names no output file.
    fn default_path(&self, base_name: &str) -> PathBuf;

    /// Write `results` under the default path for `base_name`.
    async fn export(&self, results: &ResultSet, base_name: &str) -> Result<ExportSummary> {
        let path = self.default_path(base_name);
        self.write(results, &path).await
    }
}

/// `<base>_<YYYYmmdd_HHMMSS>.<ext>` with `base` reduced to file-safe characters.
pub fn default_file_name(base_name: &str, format: ExportFormat, at: DateTime<Local>) -> String {
    let base: String = base_name
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let base = base.trim_matches(['_', '.']);
    let base = if base.is_empty() { "posts" } else { base };

    format!(
        "{}_{}.{}",
        base,
        at.format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_default_file_name() {
        let at = Local.with_ymd_and_hms(2024, 5, 1, 10, 15, 0).unwrap();

        assert_eq!(
            default_file_name("alice.bsky.social", ExportFormat::Csv, at),
            "alice.bsky.social_20240501_101500.csv"
        );
        assert_eq!(
            default_file_name("search: rust lang", ExportFormat::Jsonl, at),
            "search__rust_lang_20240501_101500.jsonl"
        );
        assert_eq!(
            default_file_name("  ", ExportFormat::Json, at),
            "posts_20240501_101500.json"
        );
    }
}
