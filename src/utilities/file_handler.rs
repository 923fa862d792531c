//! File handler for the JSON documents and JSON-lines logs under the data
//! directory.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::utilities::errors::PersistenceError;

/// Reads and writes named files inside one directory.
///
/// Whole-document writes go through a temp file and a rename, so a reader
/// never sees a half-written document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandler {
    /// Directory for file storage.
    pub directory: PathBuf,
}

impl FileHandler {
    /// Create a new `FileHandler` for the given directory.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Split a file path into a handler for its parent and the file name.
    pub fn for_file(path: &Path) -> (Self, String) {
        let directory = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        (Self::new(directory), filename)
    }

    /// Full path of `filename` inside the handler's directory.
    pub fn path(&self, filename: &str) -> PathBuf {
        self.directory.join(filename)
    }

    /// Check if a file exists in the handler's directory.
    pub fn exists(&self, filename: &str) -> bool {
        self.path(filename).exists()
    }

    /// Read a file as UTF-8.
    ///
    /// Returns `Ok(None)` if the file does not exist.
    pub fn read_to_string(&self, filename: &str) -> Result<Option<String>, PersistenceError> {
        let path = self.path(filename);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PersistenceError::io(path, e)),
        }
    }

    /// Read a file as raw bytes.
    ///
    /// Returns `Ok(None)` if the file does not exist.
    pub fn read_bytes(&self, filename: &str) -> Result<Option<Vec<u8>>, PersistenceError> {
        let path = self.path(filename);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PersistenceError::io(path, e)),
        }
    }

    /// Serialize `data` as pretty JSON and atomically replace `filename`.
    ///
    /// Creates the directory if it does not exist.
    pub fn save_json<T: Serialize>(
        &self,
        filename: &str,
        what: &'static str,
        data: &T,
    ) -> Result<(), PersistenceError> {
        let content = serde_json::to_string_pretty(data)
            .map_err(|e| PersistenceError::serialization(what, e))?;
        self.write_atomic(filename, content.as_bytes())
    }

    /// Write bytes to a sibling temp file, then rename it over `filename`.
    pub fn write_atomic(&self, filename: &str, bytes: &[u8]) -> Result<(), PersistenceError> {
        self.ensure_dir()?;
        let path = self.path(filename);
        let tmp = self.path(&format!(".{}.tmp", filename));

        let result = fs::File::create(&tmp)
            .and_then(|mut f| {
                f.write_all(bytes)?;
                f.sync_all()
            })
            .and_then(|_| fs::rename(&tmp, &path));

        if let Err(e) = result {
            let _ = fs::remove_file(&tmp);
            return Err(PersistenceError::io(path, e));
        }
        Ok(())
    }

    /// Append one line (a trailing newline is added) to `filename`.
    pub fn append_line(&self, filename: &str, line: &str) -> Result<(), PersistenceError> {
        self.ensure_dir()?;
        let path = self.path(filename);
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .and_then(|mut f| writeln!(f, "{}", line))
            .map_err(|e| PersistenceError::io(path, e))
    }

    fn ensure_dir(&self) -> Result<(), PersistenceError> {
        if !self.directory.exists() {
            fs::create_dir_all(&self.directory)
                .map_err(|e| PersistenceError::io(&self.directory, e))?;
        }
        Ok(())
    }
}

impl Default for FileHandler {
    fn default() -> Self {
        Self::new(".")
    }
}
