use slatedb::Db;
use slatedb::object_store::ObjectStore;
use slatedb::object_store::local::LocalFileSystem;
use slatedb::object_store::memory::InMemory;
use slatedb::object_store::path::Path;
use std::sync::Arc;
use tracing::info;

/// Persistent state store backed by SlateDB.
/// Production uses a local filesystem; tests use an in-memory object store.
#[derive(Clone)]
pub struct StateStore {
    db: Db,
}

impl StateStore {
    /// Open (or create) a state store rooted at `path` on the local filesystem.
    pub async fn new(path: &str) -> anyhow::Result<Self> {
        info!("Opening SlateDB state store at {}", path);

        // Ensure the data directory exists before opening the object store
        std::fs::create_dir_all(path)
            .map_err(|e| anyhow::anyhow!("Failed to create data directory {}: {}", path, e))?;

        let object_store = Arc::new(
            LocalFileSystem::new_with_prefix(path)
                .map_err(|e| anyhow::anyhow!("Failed to create local object store: {}", e))?,
        );
        Self::open(object_store).await
    }

    /// Open a state store that lives only as long as the process.
    pub async fn in_memory() -> anyhow::Result<Self> {
        Self::open(Arc::new(InMemory::new())).await
    }

    async fn open(object_store: Arc<dyn ObjectStore>) -> anyhow::Result<Self> {
        let db = Db::open(Path::from("/"), object_store)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to open SlateDB: {}", e))?;
        Ok(Self { db })
    }

    /// Store a value under the given key.
    pub async fn put(&self, key: &str, value: &[u8]) -> anyhow::Result<()> {
        self.db
            .put(key.as_bytes(), value)
            .await
            .map(|_| ())
            .map_err(|e| anyhow::anyhow!("SlateDB put of {} failed: {}", key, e))
    }

    /// Retrieve the value for a key, or `None` if it does not exist.
    pub async fn get(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>> {
        match self.db.get(key.as_bytes()).await {
            Ok(Some(bytes)) => Ok(Some(bytes.to_vec())),
            Ok(None) => Ok(None),
            Err(e) => Err(anyhow::anyhow!("SlateDB get of {} failed: {}", key, e)),
        }
    }

    /// Gracefully close the state store.
    pub async fn close(self) -> anyhow::Result<()> {
        info!("Closing SlateDB state store");
        self.db
            .close()
            .await
            .map_err(|e| anyhow::anyhow!("SlateDB close failed: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get() {
        let store = StateStore::in_memory().await.unwrap();
        assert!(store.get("/k").await.unwrap().is_none());

        store.put("/k", b"v1").await.unwrap();
        assert_eq!(store.get("/k").await.unwrap(), Some(b"v1".to_vec()));

        store.put("/k", b"v2").await.unwrap();
        assert_eq!(store.get("/k").await.unwrap(), Some(b"v2".to_vec()));

        store.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_local_filesystem_reopen() {
        let dir = std::env::temp_dir().join(format!("rootca-state-{}", uuid::Uuid::new_v4()));
        let path = dir.to_string_lossy().to_string();

        let store = StateStore::new(&path).await.unwrap();
        store.put("/persisted", b"yes").await.unwrap();
        store.close().await.unwrap();

        let store = StateStore::new(&path).await.unwrap();
        assert_eq!(store.get("/persisted").await.unwrap(), Some(b"yes".to_vec()));
        store.close().await.unwrap();

        let _ = std::fs::remove_dir_all(&dir);
    }
}
