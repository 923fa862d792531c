//! Append-only experience log, one JSON object per line.

use std::path::{Path, PathBuf};

use super::types::Experience;
use crate::utilities::errors::PersistenceError;
use crate::utilities::FileHandler;

/// File name of the log inside the experiences directory.
pub const EXPERIENCE_LOG_FILE: &str = "experiences.jsonl";

#[derive(Debug, Clone)]
pub struct ExperienceLog {
    files: FileHandler,
}

impl ExperienceLog {
    /// A log stored as `experiences.jsonl` inside `directory`.
    pub fn new(directory: impl AsRef<Path>) -> Self {
        Self {
            files: FileHandler::new(directory.as_ref()),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.files.path(EXPERIENCE_LOG_FILE)
    }

    /// Append one experience.
    pub fn append(&self, exp: &Experience) -> Result<(), PersistenceError> {
        let line = serde_json::to_string(exp)
            .map_err(|e| PersistenceError::serialization("experience", e))?;
        self.files.append_line(EXPERIENCE_LOG_FILE, &line)?;
        log::debug!("Saved experience to {}", self.path().display());
        Ok(())
    }

    /// The last `count` experiences, oldest first.
    ///
    /// Malformed lines, including ones that are not valid UTF-8, are skipped
    /// with a warning. A missing log is empty; an unreadable one is logged
    /// and treated as empty.
    pub fn recent(&self, count: usize) -> Vec<Experience> {
        let content = match self.files.read_bytes(EXPERIENCE_LOG_FILE) {
            Ok(Some(content)) => content,
            Ok(None) => return Vec::new(),
            Err(e) => {
                log::error!("Failed to read experience log: {}", e);
                return Vec::new();
            }
        };

        let lines: Vec<&[u8]> = content
            .split(|b| *b == b'\n')
            .filter(|l| !l.iter().all(u8::is_ascii_whitespace))
            .collect();
        let start = lines.len().saturating_sub(count);
        lines[start..]
            .iter()
            .filter_map(|line| match serde_json::from_slice::<Experience>(line) {
                Ok(exp) => Some(exp),
                Err(e) => {
                    log::warn!("Failed to parse experience: {}", e);
                    None
                }
            })
            .collect()
    }
}
