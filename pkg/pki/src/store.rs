use async_trait::async_trait;
use pkg_types::secret::{Secret, SecretData, SecretLocation};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Keyed secret store the bootstrap reads from and writes to.
/// Implementations: in-memory (tests, embedded), SlateDB (`pkg-state`).
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch the record at `location`, or `None` if there is none.
    async fn get(&self, location: &SecretLocation) -> anyhow::Result<Option<Secret>>;

    /// Create a record at `location`. Fails if one already exists.
    async fn create(&self, location: &SecretLocation, data: SecretData) -> anyhow::Result<()>;

    /// Replace the fields of the record at `location`. Fails if there is none.
    async fn update(&self, location: &SecretLocation, data: SecretData) -> anyhow::Result<()>;
}

/// In-memory secret store.
#[derive(Default)]
pub struct MemorySecretStore {
    secrets: RwLock<HashMap<SecretLocation, SecretData>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put a record in place without going through create/update.
    pub async fn seed(&self, location: SecretLocation, data: SecretData) {
        self.secrets.write().await.insert(location, data);
    }

    /// Copy of the fields stored at `location`.
    pub async fn snapshot(&self, location: &SecretLocation) -> Option<SecretData> {
        self.secrets.read().await.get(location).cloned()
    }

    pub async fn len(&self) -> usize {
        self.secrets.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.secrets.read().await.is_empty()
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn get(&self, location: &SecretLocation) -> anyhow::Result<Option<Secret>> {
        Ok(self
            .secrets
            .read()
            .await
            .get(location)
            .map(|data| Secret::new(location.clone(), data.clone())))
    }

    async fn create(&self, location: &SecretLocation, data: SecretData) -> anyhow::Result<()> {
        let mut secrets = self.secrets.write().await;
        if secrets.contains_key(location) {
            anyhow::bail!("secret {} already exists", location);
        }
        secrets.insert(location.clone(), data);
        Ok(())
    }

    async fn update(&self, location: &SecretLocation, data: SecretData) -> anyhow::Result<()> {
        let mut secrets = self.secrets.write().await;
        match secrets.get_mut(location) {
            Some(existing) => {
                *existing = data;
                Ok(())
            }
            None => anyhow::bail!("secret {} not found", location),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(name: &str) -> SecretLocation {
        SecretLocation::new("rootca-system", name).unwrap()
    }

    fn fields(pairs: &[(&str, &str)]) -> SecretData {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.as_bytes().to_vec()))
            .collect()
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let store = MemorySecretStore::new();
        assert!(store.get(&loc("a")).await.unwrap().is_none());

        store.create(&loc("a"), fields(&[("k", "v")])).await.unwrap();
        let secret = store.get(&loc("a")).await.unwrap().expect("should exist");
        assert_eq!(secret.location, loc("a"));
        assert_eq!(secret.data, fields(&[("k", "v")]));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_create_existing_fails() {
        let store = MemorySecretStore::new();
        store.seed(loc("a"), fields(&[("k", "v")])).await;
        let err = store.create(&loc("a"), SecretData::new()).await.unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert_eq!(store.snapshot(&loc("a")).await, Some(fields(&[("k", "v")])));
    }

    #[tokio::test]
    async fn test_update_replaces_fields() {
        let store = MemorySecretStore::new();
        store.seed(loc("a"), fields(&[("k", "v"), ("x", "y")])).await;
        store.update(&loc("a"), fields(&[("k", "w")])).await.unwrap();
        assert_eq!(store.snapshot(&loc("a")).await, Some(fields(&[("k", "w")])));
    }

    #[tokio::test]
    async fn test_update_missing_fails() {
        let store = MemorySecretStore::new();
        assert!(store.update(&loc("a"), SecretData::new()).await.is_err());
        assert!(store.is_empty().await);
    }
}
