// # Memory Document Store
//
// In-memory implementation of DocumentStore.
//
// ## Purpose
//
// Provides a simple, fast store that doesn't persist across restarts.
// Useful for testing and for embedding the sensor in a process that
// manages persistence itself.
//
// ## Crash Behavior
//
// - All documents are lost on restart
// - A sensor backed by this store must be seeded with its settings first

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::document_store::DocumentStore;

/// In-memory document store implementation
///
/// Clones share the same documents, so a test can keep a handle and inspect
/// what the sensor wrote.
///
/// # Example
///
/// ```rust,no_run
/// use petsensor_core::state::MemoryDocumentStore;
/// use petsensor_core::traits::DocumentStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryDocumentStore::new();
///
///     store.save("petfindersensor", "{}").await?;
///     assert_eq!(store.load("petfindersensor").await?, "{}");
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryDocumentStore {
    inner: Arc<RwLock<HashMap<String, String>>>,
    read_only: Arc<AtomicBool>,
    save_count: Arc<AtomicUsize>,
}

impl MemoryDocumentStore {
    /// Create a new empty memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with documents
    pub fn with_documents<I, K, V>(documents: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map = documents
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            inner: Arc::new(RwLock::new(map)),
            ..Self::default()
        }
    }

    /// Get the document under `key` without going through the trait
    pub async fn get(&self, key: &str) -> Option<String> {
        self.inner.read().await.get(key).cloned()
    }

    /// Make every subsequent `save` fail
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    /// Number of successful saves so far
    pub fn save_count(&self) -> usize {
        self.save_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn load(&self, key: &str) -> Result<String, Error> {
        let guard = self.inner.read().await;
        guard
            .get(key)
            .cloned()
            .ok_or_else(|| Error::not_found(key.to_string()))
    }

    async fn save(&self, key: &str, document: &str) -> Result<(), Error> {
        if self.read_only.load(Ordering::SeqCst) {
            return Err(Error::store(format!("Store is read-only, cannot save {}", key)));
        }

        let mut guard = self.inner.write().await;
        guard.insert(key.to_string(), document.to_string());
        self.save_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
