//! Where saved drawings go.

use std::future::Future;

use tokio::sync::Mutex;

use crate::PersistError;

/// Accepts PNG snapshots of a finished drawing.
pub trait SnapshotStore: Send + Sync + 'static {
    /// Stores one snapshot, given as base64-encoded PNG.
    fn save_snapshot(
        &self,
        png_base64: String,
    ) -> impl Future<Output = Result<(), PersistError>> + Send;
}

/// Keeps snapshots in memory.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    snapshots: Mutex<Vec<String>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every snapshot saved so far, oldest first.
    pub async fn snapshots(&self) -> Vec<String> {
        self.snapshots.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.snapshots.lock().await.len()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn save_snapshot(
        &self,
        png_base64: String,
    ) -> impl Future<Output = Result<(), PersistError>> + Send {
        async move {
            if png_base64.is_empty() {
                return Err(PersistError::Rejected("empty snapshot".into()));
            }
            self.snapshots.lock().await.push(png_base64);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_keeps_snapshots_in_order() {
        let store = MemorySnapshotStore::new();
        store.save_snapshot("first".into()).await.unwrap();
        store.save_snapshot("second".into()).await.unwrap();

        assert_eq!(store.snapshots().await, vec!["first", "second"]);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_memory_store_rejects_empty_snapshot() {
        let store = MemorySnapshotStore::new();
        let err = store.save_snapshot(String::new()).await.unwrap_err();
        assert!(matches!(err, PersistError::Rejected(_)));
    }
}
