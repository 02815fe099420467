//! Local filesystem exporter.
//!
//! Files are written atomically: the content goes to a sibling `.tmp`
//! file that is renamed over the target once flushed.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Local;
use tokio::io::AsyncWriteExt;

use super::record::{COLUMNS, FlatRecord, csv_row, flatten};
use super::{ExportSummary, PostExporter, default_file_name};
use crate::error::{AppError, Result};
use crate::models::{ExportConfig, ExportFormat, ResultSet};

/// Writes result sets under a local output directory.
#[derive(Debug, Clone)]
pub struct LocalExporter {
    output_dir: PathBuf,
    format: ExportFormat,
    sort_by_date: bool,
}

impl LocalExporter {
    pub fn new(config: &ExportConfig) -> Self {
        Self {
            output_dir: PathBuf::from(&config.output_dir),
            format: config.format,
            sort_by_date: config.sort_by_date,
        }
    }

    pub fn with_format(mut self, format: ExportFormat) -> Self {
        self.format = format;
        self
    }

    pub fn format(&self) -> ExportFormat {
        self.format
    }

    /// Encode `results` in the configured format.
    fn encode(&self, results: &ResultSet) -> Result<Vec<u8>> {
        match self.format {
            ExportFormat::Json => Ok(serde_json::to_vec_pretty(results)?),
            ExportFormat::Jsonl => {
                let mut out = Vec::new();
                for record in flatten(results, self.sort_by_date) {
                    serde_json::to_writer(&mut out, &record)?;
                    out.push(b'\n');
                }
                Ok(out)
            }
            ExportFormat::Csv => {
                let mut out = csv_row(&COLUMNS);
                for record in flatten(results, self.sort_by_date) {
                    out.push_str(&csv_row(&record.cells()?));
                }
                Ok(out.into_bytes())
            }
        }
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}

#[async_trait]
impl PostExporter for LocalExporter {
    async fn write(&self, results: &ResultSet, path: &Path) -> Result<ExportSummary> {
        let bytes = self.encode(results)?;
        Self::write_bytes(path, &bytes)
            .await
            .map_err(|e| AppError::export(format!("failed to write {}: {e}", path.display())))?;

        let records = results.post_count();
        log::info!(
            "Exported {} posts from {} authors to {}",
            records,
            results.len(),
            path.display()
        );
        Ok(ExportSummary {
            path: path.to_path_buf(),
            format: self.format,
            records,
        })
    }

    fn default_path(&self, base_name: &str) -> PathBuf {
        self.output_dir
            .join(default_file_name(base_name, self.format, Local::now()))
    }
}

/// Read a grouped JSON export back.
pub async fn load_json(path: impl AsRef<Path>) -> Result<ResultSet> {
    let bytes = tokio::fs::read(path.as_ref()).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Read a JSONL export back, regrouped by the `user_handle` column.
pub async fn load_jsonl(path: impl AsRef<Path>) -> Result<ResultSet> {
    let content = tokio::fs::read_to_string(path.as_ref()).await?;
    let mut results = ResultSet::new();

    for (number, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record: FlatRecord = serde_json::from_str(line).map_err(|e| {
            AppError::export(format!(
                "{} line {}: {e}",
                path.as_ref().display(),
                number + 1
            ))
        })?;
        let (key, post) = record.into_post();
        results.extend_group(key, vec![post]);
    }
    Ok(results)
}
