use pkg_types::secret::SecretLocation;
use std::fmt;

pub type Result<T> = std::result::Result<T, BootstrapError>;

/// Store call that failed or was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Get,
    Create,
    Update,
}

impl fmt::Display for StoreOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            StoreOp::Get => "get",
            StoreOp::Create => "create",
            StoreOp::Update => "update",
        };
        f.write_str(op)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("no root certificate secret at {location}")]
    NotFound { location: SecretLocation },

    #[error("secret is missing reserved field {field:?}")]
    MissingField { field: &'static str },

    #[error("invalid expiration timestamp {value:?}")]
    TimestampParse {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("invalid {field}: {reason}")]
    InvalidMaterial { field: &'static str, reason: String },

    #[error("secret store {op} of {location} failed")]
    StoreOperation {
        op: StoreOp,
        location: SecretLocation,
        #[source]
        source: anyhow::Error,
    },

    #[error("secret store {op} of {location} aborted: {reason}")]
    Cancelled {
        op: StoreOp,
        location: SecretLocation,
        reason: &'static str,
    },
}
