use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};
use pkg_constants::secret::{CA_CERT_KEY, ROOT_PRIVATE_KEY_KEY, TIME_DATE_LAYOUT};
use std::fmt;

use crate::error::{BootstrapError, Result};

/// Root certificate/key pair anchoring the control plane's trust chain.
///
/// The PEM material is held verbatim; this type never re-encodes it. The
/// expiration is kept at millisecond precision, the resolution of its stored
/// form.
#[derive(Clone, PartialEq, Eq)]
pub struct RootCertificate {
    cert_pem: Vec<u8>,
    key_pem: Vec<u8>,
    expiration: DateTime<Utc>,
}

impl RootCertificate {
    /// Build a root certificate from PEM material and an expiration instant.
    /// Sub-millisecond precision of `expiration` is discarded.
    pub fn from_pem(
        cert_pem: impl Into<Vec<u8>>,
        key_pem: impl Into<Vec<u8>>,
        expiration: DateTime<Utc>,
    ) -> Result<Self> {
        let cert_pem = cert_pem.into();
        let key_pem = key_pem.into();
        if cert_pem.is_empty() {
            return Err(BootstrapError::InvalidMaterial {
                field: CA_CERT_KEY,
                reason: "certificate is empty".to_string(),
            });
        }
        if key_pem.is_empty() {
            return Err(BootstrapError::InvalidMaterial {
                field: ROOT_PRIVATE_KEY_KEY,
                reason: "private key is empty".to_string(),
            });
        }
        Ok(Self {
            cert_pem,
            key_pem,
            expiration: expiration.trunc_subsecs(3),
        })
    }

    /// Build a root certificate from PEM material and a textual expiration
    /// in the stored layout (`2020-05-07T14:25:18.677Z`).
    pub fn from_raw(
        cert_pem: impl Into<Vec<u8>>,
        key_pem: impl Into<Vec<u8>>,
        expiration: &str,
    ) -> Result<Self> {
        let expiration = parse_expiration(expiration)?;
        Self::from_pem(cert_pem, key_pem, expiration)
    }

    pub fn cert_pem(&self) -> &[u8] {
        &self.cert_pem
    }

    pub fn private_key_pem(&self) -> &[u8] {
        &self.key_pem
    }

    pub fn expiration(&self) -> DateTime<Utc> {
        self.expiration
    }

    /// Expiration rendered in the stored layout.
    pub fn expiration_string(&self) -> String {
        format_expiration(self.expiration)
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expiration
    }

    /// Check that the material actually looks like PEM: at least one
    /// `CERTIFICATE` block, and a private key block.
    pub fn verify_pem(&self) -> Result<()> {
        let mut reader = self.cert_pem.as_slice();
        let certs = rustls_pemfile::certs(&mut reader)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| BootstrapError::InvalidMaterial {
                field: CA_CERT_KEY,
                reason: e.to_string(),
            })?;
        if certs.is_empty() {
            return Err(BootstrapError::InvalidMaterial {
                field: CA_CERT_KEY,
                reason: "no PEM CERTIFICATE block found".to_string(),
            });
        }

        let mut reader = self.key_pem.as_slice();
        match rustls_pemfile::private_key(&mut reader) {
            Ok(Some(_)) => Ok(()),
            Ok(None) => Err(BootstrapError::InvalidMaterial {
                field: ROOT_PRIVATE_KEY_KEY,
                reason: "no PEM private key block found".to_string(),
            }),
            Err(e) => Err(BootstrapError::InvalidMaterial {
                field: ROOT_PRIVATE_KEY_KEY,
                reason: e.to_string(),
            }),
        }
    }
}

// Keep key material out of logs.
impl fmt::Debug for RootCertificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RootCertificate")
            .field("cert_pem_len", &self.cert_pem.len())
            .field("key_pem", &"<redacted>")
            .field("expiration", &self.expiration_string())
            .finish()
    }
}

/// Format an instant in the stored expiration layout.
pub fn format_expiration(at: DateTime<Utc>) -> String {
    at.format(TIME_DATE_LAYOUT).to_string()
}

/// Parse a stored expiration string. Anything not matching the layout exactly
/// is rejected.
pub fn parse_expiration(value: &str) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, TIME_DATE_LAYOUT)
        .map(|naive| naive.and_utc())
        .map_err(|source| BootstrapError::TimestampParse {
            value: value.to_string(),
            source,
        })
}
