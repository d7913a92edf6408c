//! Single-slot holder for the most recently ingested document text.

use std::sync::Arc;
use tokio::sync::RwLock;

/// Process-wide document slot shared by the upload and ask paths.
///
/// Writers swap in a fresh `Arc<str>`; readers clone the current one, so a question always sees
/// one complete document even while an upload is in flight.
#[derive(Debug, Default)]
pub struct DocumentStore {
    current: RwLock<Arc<str>>,
}

impl DocumentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored text in full.
    pub async fn replace(&self, text: impl Into<Arc<str>>) {
        let text = text.into();
        *self.current.write().await = text;
    }

    /// Return the text installed at the time of the call.
    pub async fn snapshot(&self) -> Arc<str> {
        Arc::clone(&*self.current.read().await)
    }

    /// Whether no document has been stored yet.
    pub async fn is_empty(&self) -> bool {
        self.current.read().await.is_empty()
    }
}
