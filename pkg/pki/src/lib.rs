//! Root credential bootstrap.
//!
//! Loads the control plane's root certificate/key pair from a secret store,
//! or creates/updates it there, so that every restart sees the same trust
//! anchor.

pub mod bootstrap;
pub mod certificate;
pub mod context;
pub mod error;
pub mod record;
pub mod store;

pub use bootstrap::{WritePlan, read_root_certificate, write_root_certificate};
pub use certificate::RootCertificate;
pub use context::CallContext;
pub use error::{BootstrapError, StoreOp};
pub use store::{MemorySecretStore, SecretStore};
