//! Conversion between [`RootCertificate`] and the flat field map of a secret.

use pkg_constants::secret::{CA_CERT_KEY, CA_EXPIRATION_KEY, RESERVED_KEYS, ROOT_PRIVATE_KEY_KEY};
use pkg_types::secret::SecretData;

use crate::certificate::{RootCertificate, format_expiration, parse_expiration};
use crate::error::{BootstrapError, Result};

/// Encode a certificate into exactly the three reserved fields.
pub fn encode(cert: &RootCertificate) -> SecretData {
    reserved_fields(cert, cert.private_key_pem())
}

/// Reserved fields for `cert`, taking the private key from `raw_key_pem`
/// instead of the certificate.
pub fn reserved_fields(cert: &RootCertificate, raw_key_pem: &[u8]) -> SecretData {
    SecretData::from([
        (CA_CERT_KEY.to_string(), cert.cert_pem().to_vec()),
        (
            CA_EXPIRATION_KEY.to_string(),
            format_expiration(cert.expiration()).into_bytes(),
        ),
        (ROOT_PRIVATE_KEY_KEY.to_string(), raw_key_pem.to_vec()),
    ])
}

/// Decode a certificate from a secret's fields. Non-reserved fields are ignored.
pub fn decode(data: &SecretData) -> Result<RootCertificate> {
    let cert_pem = required(data, CA_CERT_KEY)?;
    let expiration = required(data, CA_EXPIRATION_KEY)?;
    let key_pem = required(data, ROOT_PRIVATE_KEY_KEY)?;

    let expiration = parse_expiration(&String::from_utf8_lossy(expiration))?;
    RootCertificate::from_pem(cert_pem.clone(), key_pem.clone(), expiration)
}

/// Overlay the reserved fields onto `base`. Every other field of `base` is
/// returned untouched.
pub fn merge_reserved(mut base: SecretData, reserved: SecretData) -> SecretData {
    debug_assert!(reserved.keys().all(|k| RESERVED_KEYS.contains(&k.as_str())));
    base.extend(reserved);
    base
}

fn required<'a>(data: &'a SecretData, field: &'static str) -> Result<&'a Vec<u8>> {
    data.get(field)
        .ok_or(BootstrapError::MissingField { field })
}
