use anyhow::Context;
use async_trait::async_trait;
use pkg_constants::state::SECRET_KEY_PREFIX;
use pkg_pki::store::SecretStore;
use pkg_types::secret::{Secret, SecretData, SecretLocation};
use tracing::debug;

use crate::client::StateStore;

/// [`SecretStore`] over the SlateDB state store.
///
/// Each secret is one JSON document under
/// `/registry/secrets/<namespace>/<name>`. Create and update check existence
/// with a separate read, so they are not atomic against concurrent writers.
#[derive(Clone)]
pub struct StateSecretStore {
    store: StateStore,
}

impl StateSecretStore {
    pub fn new(store: StateStore) -> Self {
        Self { store }
    }

    /// Hand back the underlying state store, e.g. to close it.
    pub fn into_inner(self) -> StateStore {
        self.store
    }

    fn key_for(location: &SecretLocation) -> String {
        format!(
            "{}{}/{}",
            SECRET_KEY_PREFIX,
            location.namespace(),
            location.name()
        )
    }

    async fn put_secret(&self, key: &str, secret: &Secret) -> anyhow::Result<()> {
        let data = serde_json::to_vec(secret)?;
        self.store.put(key, &data).await
    }
}

#[async_trait]
impl SecretStore for StateSecretStore {
    async fn get(&self, location: &SecretLocation) -> anyhow::Result<Option<Secret>> {
        let key = Self::key_for(location);
        match self.store.get(&key).await? {
            Some(raw) => {
                let secret: Secret = serde_json::from_slice(&raw)
                    .with_context(|| format!("corrupt secret record at {}", key))?;
                Ok(Some(secret))
            }
            None => Ok(None),
        }
    }

    async fn create(&self, location: &SecretLocation, data: SecretData) -> anyhow::Result<()> {
        let key = Self::key_for(location);
        if self.store.get(&key).await?.is_some() {
            anyhow::bail!("secret {} already exists", location);
        }
        debug!("Creating secret record {}", key);
        self.put_secret(&key, &Secret::new(location.clone(), data))
            .await
    }

    async fn update(&self, location: &SecretLocation, data: SecretData) -> anyhow::Result<()> {
        let key = Self::key_for(location);
        if self.store.get(&key).await?.is_none() {
            anyhow::bail!("secret {} not found", location);
        }
        debug!("Updating secret record {}", key);
        self.put_secret(&key, &Secret::new(location.clone(), data))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pkg_constants::secret::{CA_CERT_KEY, CA_EXPIRATION_KEY, ROOT_PRIVATE_KEY_KEY};
    use pkg_pki::{CallContext, RootCertificate, read_root_certificate, write_root_certificate};

    async fn secret_store() -> StateSecretStore {
        StateSecretStore::new(StateStore::in_memory().await.unwrap())
    }

    fn location() -> SecretLocation {
        SecretLocation::new("rootca-system", uuid::Uuid::new_v4().to_string()).unwrap()
    }

    fn fields(pairs: &[(&str, &[u8])]) -> SecretData {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_vec()))
            .collect()
    }

    #[test]
    fn test_key_layout() {
        let loc = SecretLocation::new("mesh", "root-ca").unwrap();
        assert_eq!(
            StateSecretStore::key_for(&loc),
            "/registry/secrets/mesh/root-ca"
        );
    }

    #[tokio::test]
    async fn test_create_get_update() {
        let store = secret_store().await;
        let loc = location();
        assert!(store.get(&loc).await.unwrap().is_none());

        store.create(&loc, fields(&[("a", b"1")])).await.unwrap();
        let secret = store.get(&loc).await.unwrap().unwrap();
        assert_eq!(secret.location, loc);
        assert_eq!(secret.data, fields(&[("a", b"1")]));

        store.update(&loc, fields(&[("a", b"2"), ("b", b"\x00\xff")])).await.unwrap();
        let secret = store.get(&loc).await.unwrap().unwrap();
        assert_eq!(secret.data, fields(&[("a", b"2"), ("b", b"\x00\xff")]));
    }

    #[tokio::test]
    async fn test_create_existing_and_update_missing_fail() {
        let store = secret_store().await;
        let loc = location();

        assert!(store.update(&loc, SecretData::new()).await.is_err());
        assert!(store.get(&loc).await.unwrap().is_none());

        store.create(&loc, fields(&[("a", b"1")])).await.unwrap();
        let err = store.create(&loc, SecretData::new()).await.unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert_eq!(
            store.get(&loc).await.unwrap().unwrap().data,
            fields(&[("a", b"1")])
        );
    }

    #[tokio::test]
    async fn test_corrupt_record_is_an_error() {
        let state = StateStore::in_memory().await.unwrap();
        let loc = location();
        state
            .put(&StateSecretStore::key_for(&loc), b"not json")
            .await
            .unwrap();

        let store = StateSecretStore::new(state);
        let err = store.get(&loc).await.unwrap_err();
        assert!(err.to_string().contains("corrupt secret record"));
    }

    #[tokio::test]
    async fn test_invalid_stored_location_is_an_error() {
        let state = StateStore::in_memory().await.unwrap();
        let loc = location();
        state
            .put(
                &StateSecretStore::key_for(&loc),
                br#"{"location":{"namespace":"Bad_NS","name":"root-ca"},"data":{}}"#,
            )
            .await
            .unwrap();

        let store = StateSecretStore::new(state);
        let err = store.get(&loc).await.unwrap_err();
        assert!(err.to_string().contains("corrupt secret record"));
    }

    #[tokio::test]
    async fn test_bootstrap_over_state_store() {
        let store = secret_store().await;
        let ctx = CallContext::background();
        let loc = location();

        store
            .create(
                &loc,
                fields(&[
                    (CA_CERT_KEY, b"abc"),
                    (CA_EXPIRATION_KEY, b"def"),
                    (ROOT_PRIVATE_KEY_KEY, b"ghi"),
                    ("foo", b"bar"),
                    ("123", b"456"),
                ]),
            )
            .await
            .unwrap();

        let cert = RootCertificate::from_raw("cert-2", "key-2", "2030-01-02T03:04:05.678Z").unwrap();
        write_root_certificate(&store, &cert, &loc, b"key-2", &ctx)
            .await
            .unwrap();

        assert_eq!(
            store.get(&loc).await.unwrap().unwrap().data,
            fields(&[
                (CA_CERT_KEY, b"cert-2"),
                (CA_EXPIRATION_KEY, b"2030-01-02T03:04:05.678Z"),
                (ROOT_PRIVATE_KEY_KEY, b"key-2"),
                ("foo", b"bar"),
                ("123", b"456"),
            ])
        );
        assert_eq!(read_root_certificate(&store, &loc, &ctx).await.unwrap(), cert);

        store.into_inner().close().await.unwrap();
    }
}
