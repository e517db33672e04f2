// # File Document Store
//
// File-based implementation of DocumentStore.
//
// ## Purpose
//
// Persists the sensor's settings and cached response across restarts.
// Each key maps to `<dir>/<key>.json`.
//
// ## Crash Safety
//
// - Atomic writes: New content written to a temporary file, flushed and
//   synced, then renamed over the target
// - The temporary file is closed before the rename on every path, so a crash
//   mid-write leaves the previous document intact
// - A failed write removes its temporary file
//
// ## Keys
//
// The key is used verbatim as the file stem, so keys that differ anywhere
// (dots included) never share a file. Keys that are empty, contain a path
// separator or are `.`/`..` are rejected.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::Error;
use crate::traits::document_store::DocumentStore;

/// Extension appended to every document key
const DOCUMENT_EXTENSION: &str = "json";

/// File-based document store with atomic writes
///
/// # Example
///
/// ```rust,no_run
/// use petsensor_core::state::FileDocumentStore;
/// use petsensor_core::traits::DocumentStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileDocumentStore::new("/var/lib/petsensor").await?;
///
///     store.save("petfindersensor", r#"{"offline_mode": true}"#).await?;
///     let text = store.load("petfindersensor").await?;
///     assert!(text.contains("offline_mode"));
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FileDocumentStore {
    dir: PathBuf,
}

impl FileDocumentStore {
    /// Open a store rooted at `dir`, creating the directory if needed
    pub async fn new<P: AsRef<Path>>(dir: P) -> Result<Self, Error> {
        let dir = dir.as_ref().to_path_buf();

        if !dir.as_os_str().is_empty() && !dir.exists() {
            fs::create_dir_all(&dir).await.map_err(|e| {
                Error::store(format!(
                    "Failed to create store directory {}: {}",
                    dir.display(),
                    e
                ))
            })?;
        }

        Ok(Self { dir })
    }

    /// Directory holding the documents
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the document stored under `key`
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.{DOCUMENT_EXTENSION}"))
    }

    /// Get path to temporary file for atomic writes
    fn temp_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.{DOCUMENT_EXTENSION}.tmp"))
    }

    /// Reject keys that would escape the store directory
    fn check_key(key: &str) -> Result<(), Error> {
        if key.is_empty()
            || key == "."
            || key == ".."
            || key.contains(['/', '\\'])
            || key.contains('\0')
        {
            return Err(Error::store(format!("Invalid document key '{}'", key)));
        }
        Ok(())
    }

    async fn write_temp(temp_path: &Path, document: &str) -> Result<(), Error> {
        let mut file = fs::File::create(temp_path).await.map_err(|e| {
            Error::store(format!(
                "Failed to create temp file {}: {}",
                temp_path.display(),
                e
            ))
        })?;

        file.write_all(document.as_bytes()).await.map_err(|e| {
            Error::store(format!(
                "Failed to write to temp file {}: {}",
                temp_path.display(),
                e
            ))
        })?;

        file.flush().await.map_err(|e| {
            Error::store(format!(
                "Failed to flush temp file {}: {}",
                temp_path.display(),
                e
            ))
        })?;

        file.sync_all().await.map_err(|e| {
            Error::store(format!(
                "Failed to sync temp file {}: {}",
                temp_path.display(),
                e
            ))
        })?;

        // Dropped here, before the caller renames
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FileDocumentStore {
    async fn load(&self, key: &str) -> Result<String, Error> {
        Self::check_key(key)?;
        let path = self.path_for(key);

        match fs::read_to_string(&path).await {
            Ok(content) => {
                tracing::trace!("Loaded document {} ({} bytes)", path.display(), content.len());
                Ok(content)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::not_found(path.display().to_string()))
            }
            Err(e) => Err(Error::store(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn save(&self, key: &str, document: &str) -> Result<(), Error> {
        Self::check_key(key)?;
        let path = self.path_for(key);
        let temp_path = self.temp_path(key);

        let written = match Self::write_temp(&temp_path, document).await {
            Ok(()) => fs::rename(&temp_path, &path).await.map_err(|e| {
                Error::store(format!(
                    "Failed to rename {} to {}: {}",
                    temp_path.display(),
                    path.display(),
                    e
                ))
            }),
            Err(e) => Err(e),
        };

        if let Err(e) = written {
            if let Err(cleanup) = fs::remove_file(&temp_path).await {
                if cleanup.kind() != std::io::ErrorKind::NotFound {
                    tracing::debug!(
                        "Could not remove temp file {}: {}",
                        temp_path.display(),
                        cleanup
                    );
                }
            }
            return Err(e);
        }

        tracing::trace!("Document written to file: {}", path.display());
        Ok(())
    }
}
