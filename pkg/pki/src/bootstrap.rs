//! One-shot read and write of the root credential secret.
//!
//! Neither operation retries. The writer's probe-then-write is not atomic
//! against other writers of the same location: concurrent bootstraps race
//! and the last write wins on the reserved fields. Callers that need a
//! single writer must serialize externally.

use pkg_types::secret::{Secret, SecretData, SecretLocation};
use tracing::{debug, info};

use crate::certificate::RootCertificate;
use crate::context::CallContext;
use crate::error::{BootstrapError, Result, StoreOp};
use crate::record;
use crate::store::SecretStore;

/// Read the root certificate stored at `location`.
pub async fn read_root_certificate<S: SecretStore + ?Sized>(
    store: &S,
    location: &SecretLocation,
    ctx: &CallContext,
) -> Result<RootCertificate> {
    debug!("Reading root certificate secret {}", location);

    let secret = ctx
        .run(StoreOp::Get, location, store.get(location))
        .await?
        .ok_or_else(|| BootstrapError::NotFound {
            location: location.clone(),
        })?;
    let cert = record::decode(&secret.data)?;

    info!(
        "Loaded root certificate from {} (expires {})",
        location,
        cert.expiration_string()
    );
    Ok(cert)
}

/// What the writer will submit after probing the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WritePlan {
    /// No record exists: create one holding only the reserved fields.
    Create(SecretData),
    /// A record exists: replace it with its fields plus the new reserved ones.
    Merge(SecretData),
}

impl WritePlan {
    /// Decide between create and merge. Existing reserved values are
    /// overwritten without being looked at.
    pub fn from_probe(existing: Option<Secret>, reserved: SecretData) -> Self {
        match existing {
            None => WritePlan::Create(reserved),
            Some(secret) => WritePlan::Merge(record::merge_reserved(secret.data, reserved)),
        }
    }

    pub fn data(&self) -> &SecretData {
        match self {
            WritePlan::Create(data) | WritePlan::Merge(data) => data,
        }
    }

    async fn apply<S: SecretStore + ?Sized>(
        self,
        store: &S,
        location: &SecretLocation,
        ctx: &CallContext,
    ) -> Result<()> {
        match self {
            WritePlan::Create(data) => {
                ctx.run(StoreOp::Create, location, store.create(location, data))
                    .await
            }
            WritePlan::Merge(data) => {
                ctx.run(StoreOp::Update, location, store.update(location, data))
                    .await
            }
        }
    }
}

/// Persist `cert` at `location`, creating the secret or merging into it.
///
/// The private key is written from `raw_key_pem`, not from `cert`. The caller
/// guarantees both hold the same key material; nothing here checks it.
pub async fn write_root_certificate<S: SecretStore + ?Sized>(
    store: &S,
    cert: &RootCertificate,
    location: &SecretLocation,
    raw_key_pem: &[u8],
    ctx: &CallContext,
) -> Result<()> {
    debug!("Probing {} for an existing root certificate secret", location);
    let existing = ctx.run(StoreOp::Get, location, store.get(location)).await?;

    let plan = WritePlan::from_probe(existing, record::reserved_fields(cert, raw_key_pem));
    let action = match &plan {
        WritePlan::Create(_) => {
            debug!("No secret at {}, creating it", location);
            "Created"
        }
        WritePlan::Merge(data) => {
            debug!(
                "Secret {} exists, merging reserved fields ({} fields total)",
                location,
                data.len()
            );
            "Updated"
        }
    };

    plan.apply(store, location, ctx).await?;

    info!(
        "{} root certificate secret {} (expires {})",
        action,
        location,
        cert.expiration_string()
    );
    Ok(())
}
