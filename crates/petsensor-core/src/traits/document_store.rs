// # Document Store Trait
//
// Defines the interface for persisting small JSON documents.
//
// ## Purpose
//
// A sensor keeps two documents:
// - Its settings (credentials, throttle bookkeeping, watermark)
// - The last successful upstream response body (cache fallback)
//
// Documents are stored as text so the cached response stays byte-for-byte
// what the service returned.
//
// ## Implementations
//
// - File-based: one `<key>.json` file per document, atomic writes
// - In-memory: tests and embedding

use async_trait::async_trait;

/// Trait for document store implementations
///
/// # Thread Safety
///
/// Implementations must be usable across async tasks, even though a single
/// sensor only ever drives its store sequentially.
///
/// # Implementation Guidelines
///
/// - **Async I/O only**: Use async file operations, never blocking I/O
/// - **Whole-document writes**: `save` replaces the document; a reader must
///   never observe a partially written document
/// - **No interpretation**: the store never parses the documents it holds
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Load the document stored under `key`
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: The document text
    /// - `Err(Error::NotFound)`: No document under this key
    /// - `Err(Error)`: Storage error
    async fn load(&self, key: &str) -> Result<String, crate::Error>;

    /// Replace the document stored under `key`
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Document durably written
    /// - `Err(Error)`: Storage error
    async fn save(&self, key: &str, document: &str) -> Result<(), crate::Error>;
}
