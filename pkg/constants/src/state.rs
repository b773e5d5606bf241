//! State store constants.

/// etcd-style key prefix under which secret records are stored.
/// Full key = `SECRET_KEY_PREFIX + namespace + "/" + name`.
pub const SECRET_KEY_PREFIX: &str = "/registry/secrets/";

/// Default per-call deadline for store operations, in seconds.
pub const DEFAULT_STORE_TIMEOUT_SECS: u64 = 30;
