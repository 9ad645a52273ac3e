//! Optional scoring rubrics for the critic, keyed by task type.
//!
//! A rubric lives at `<rubric_dir>/<task_type>.json`:
//!
//! ```json
//! { "criteria": ["polarity must match the dominant clause", "ignore emoji"] }
//! ```
//!
//! Absence is normal — most task types run without a rubric. A file that
//! exists but cannot be read or parsed is treated the same as absent, with
//! a warning, so a malformed rubric can never stall labeling.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Rubric {
    #[serde(default)]
    pub criteria: Vec<String>,
}

/// Loads rubrics from a directory of per-task-type JSON files.
#[derive(Debug, Clone)]
pub struct RubricProvider {
    rubric_dir: PathBuf,
}

impl RubricProvider {
    pub fn new(rubric_dir: &Path) -> Self {
        Self {
            rubric_dir: rubric_dir.to_path_buf(),
        }
    }

    /// Look up the rubric for a task type; `None` when absent or unusable.
    pub fn load(&self, task_type: &str) -> Option<Rubric> {
        let path = self.rubric_dir.join(format!("{}.json", task_type.to_lowercase()));
        if !path.exists() {
            return None;
        }
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read rubric, continuing without one");
                return None;
            }
        };
        match serde_json::from_str::<Rubric>(&content) {
            Ok(rubric) => Some(rubric),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to parse rubric, continuing without one");
                None
            }
        }
    }
}
