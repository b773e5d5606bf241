//! Root credential secret constants.
//!
//! The field names are part of the stored record format. Changing any of
//! them orphans every record written by an earlier release, so they must not
//! change without a migration.

/// Field holding the PEM-encoded root certificate.
pub const CA_CERT_KEY: &str = "ca.crt";

/// Field holding the certificate expiration, formatted with [`TIME_DATE_LAYOUT`].
pub const CA_EXPIRATION_KEY: &str = "expiration";

/// Field holding the PEM-encoded root private key.
pub const ROOT_PRIVATE_KEY_KEY: &str = "private.key";

/// All reserved field names, in the order they are checked on decode.
pub const RESERVED_KEYS: [&str; 3] = [CA_CERT_KEY, CA_EXPIRATION_KEY, ROOT_PRIVATE_KEY_KEY];

/// `chrono` layout of the expiration field, e.g. `2020-05-07T14:25:18.677Z`.
/// Millisecond precision with a literal UTC `Z` suffix.
pub const TIME_DATE_LAYOUT: &str = "%Y-%m-%dT%H:%M:%S.%3fZ";

/// Default namespace of the root credential secret.
pub const DEFAULT_NAMESPACE: &str = "rootca-system";

/// Default name of the root credential secret.
pub const DEFAULT_SECRET_NAME: &str = "root-ca";
