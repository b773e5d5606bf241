use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::validate::validate_label;

/// Field name → raw bytes. Key order carries no meaning.
pub type SecretData = HashMap<String, Vec<u8>>;

/// Two-part address of a secret record: `(namespace, name)`.
/// Deserialization goes through the same validation as [`SecretLocation::new`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawSecretLocation")]
pub struct SecretLocation {
    namespace: String,
    name: String,
}

#[derive(Deserialize)]
struct RawSecretLocation {
    namespace: String,
    name: String,
}

impl TryFrom<RawSecretLocation> for SecretLocation {
    type Error = anyhow::Error;

    fn try_from(raw: RawSecretLocation) -> anyhow::Result<Self> {
        Self::new(raw.namespace, raw.name)
    }
}

impl SecretLocation {
    /// Build a location, validating both parts as DNS-1123 labels.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> anyhow::Result<Self> {
        let namespace = namespace.into();
        let name = name.into();
        validate_label("namespace", &namespace)?;
        validate_label("secret name", &name)?;
        Ok(Self { namespace, name })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for SecretLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// A flat keyed record stored at a [`SecretLocation`].
///
/// Fields other than the ones a given subsystem owns are opaque to it and
/// must be carried through unchanged on update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Secret {
    pub location: SecretLocation,
    #[serde(default)]
    pub data: SecretData,
}

impl Secret {
    pub fn new(location: SecretLocation, data: SecretData) -> Self {
        Self { location, data }
    }
}
