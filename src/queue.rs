//! Durable human-review queue, one JSON file per escalated item.
//!
//! Filenames are `{data_id}_{UTC %Y%m%d_%H%M%S_%f}.json`, so repeated
//! escalations of the same `data_id` across runs never collide and no
//! cross-key locking is needed. Listing tolerates corrupt or unreadable
//! entries: a reviewer losing one damaged file is better than losing the
//! whole queue.

use crate::errors::QueueError;
use crate::models::{FallbackReason, HumanReviewItem};
use chrono::Utc;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Aggregate view of the queue for dashboards and the CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueSummary {
    pub total: usize,
    pub by_reason: BTreeMap<FallbackReason, usize>,
}

pub struct ReviewQueue {
    queue_dir: PathBuf,
}

impl ReviewQueue {
    pub fn new(queue_dir: &Path) -> Self {
        Self {
            queue_dir: queue_dir.to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.queue_dir
    }

    fn ensure_dir(&self) -> Result<(), QueueError> {
        fs::create_dir_all(&self.queue_dir).map_err(|source| QueueError::CreateDirFailed {
            path: self.queue_dir.clone(),
            source,
        })
    }

    /// Persist one escalated item. The timestamp component of the filename
    /// makes each write uniquely keyed.
    pub fn write(&self, item: &HumanReviewItem) -> Result<PathBuf, QueueError> {
        self.ensure_dir()?;
        let stamp = Utc::now().format("%Y%m%d_%H%M%S_%f");
        let path = self.queue_dir.join(format!("{}_{}.json", item.data_id, stamp));
        let json = serde_json::to_string_pretty(item).map_err(|source| {
            QueueError::SerializeFailed {
                data_id: item.data_id.clone(),
                source,
            }
        })?;
        fs::write(&path, json).map_err(|source| QueueError::WriteFailed {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), "wrote review queue item");
        Ok(path)
    }

    /// All readable items, filename-sorted (which is data_id-then-time
    /// order). Corrupt entries are skipped with a warning.
    pub fn list_all(&self) -> Result<Vec<HumanReviewItem>, QueueError> {
        if !self.queue_dir.exists() {
            return Ok(Vec::new());
        }
        let mut files: Vec<PathBuf> = fs::read_dir(&self.queue_dir)
            .map_err(|source| QueueError::ReadDirFailed {
                path: self.queue_dir.clone(),
                source,
            })?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().map(|ext| ext == "json").unwrap_or(false))
            .collect();
        files.sort();

        let mut items = Vec::new();
        for path in files {
            match fs::read_to_string(&path) {
                Ok(content) => match serde_json::from_str::<HumanReviewItem>(&content) {
                    Ok(item) => items.push(item),
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "skipping corrupt review queue entry")
                    }
                },
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable review queue entry")
                }
            }
        }
        Ok(items)
    }

    pub fn summary(&self) -> Result<QueueSummary, QueueError> {
        let items = self.list_all()?;
        let mut by_reason = BTreeMap::new();
        for item in &items {
            *by_reason.entry(item.fallback_reason).or_insert(0) += 1;
        }
        Ok(QueueSummary {
            total: items.len(),
            by_reason,
        })
    }

    /// Remove every entry for a `data_id`; returns how many were removed.
    pub fn delete(&self, data_id: &str) -> Result<usize, QueueError> {
        let prefix = format!("{}_", data_id);
        let mut removed = 0;
        for path in self.entry_paths()? {
            let matches = path
                .file_name()
                .and_then(|name| name.to_str())
                .map(|name| name.starts_with(&prefix))
                .unwrap_or(false);
            if matches {
                if let Err(e) = fs::remove_file(&path) {
                    warn!(path = %path.display(), error = %e, "failed to delete review queue entry");
                } else {
                    removed += 1;
                }
            }
        }
        Ok(removed)
    }

    /// Remove every entry. Destructive; a `false` confirm is a no-op.
    pub fn clear(&self, confirm: bool) -> Result<usize, QueueError> {
        if !confirm {
            return Ok(0);
        }
        let mut removed = 0;
        for path in self.entry_paths()? {
            if let Err(e) = fs::remove_file(&path) {
                warn!(path = %path.display(), error = %e, "failed to clear review queue entry");
            } else {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Flat CSV rendering for spreadsheet triage. Histories stay in the
    /// JSON files; the CSV carries the identifying columns plus the original
    /// input as a JSON string. An empty queue exports empty bytes.
    pub fn export_csv(&self) -> Result<Vec<u8>, QueueError> {
        let items = self.list_all()?;
        if items.is_empty() {
            return Ok(Vec::new());
        }
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record([
                "data_id",
                "fallback_reason",
                "timestamp",
                "error_log",
                "original_input",
            ])
            .map_err(|e| QueueError::ExportFailed(e.to_string()))?;
        for item in &items {
            writer
                .write_record([
                    item.data_id.as_str(),
                    &item.fallback_reason.to_string(),
                    &item.timestamp.to_rfc3339(),
                    &item.error_log.join(" | "),
                    &item.original_input.to_string(),
                ])
                .map_err(|e| QueueError::ExportFailed(e.to_string()))?;
        }
        writer
            .into_inner()
            .map_err(|e| QueueError::ExportFailed(e.to_string()))
    }

    fn entry_paths(&self) -> Result<Vec<PathBuf>, QueueError> {
        if !self.queue_dir.exists() {
            return Ok(Vec::new());
        }
        Ok(fs::read_dir(&self.queue_dir)
            .map_err(|source| QueueError::ReadDirFailed {
                path: self.queue_dir.clone(),
                source,
            })?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().map(|ext| ext == "json").unwrap_or(false))
            .collect())
    }
}
