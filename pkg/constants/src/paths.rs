//! Filesystem path constants.

// ─── Bootstrap ────────────────────────────────────────────────────────────

/// Default config file path for `rootca-bootstrap`.
pub const DEFAULT_BOOTSTRAP_CONFIG: &str = "/etc/rootca/config.yaml";

/// Default data directory for the SlateDB state store.
pub const DEFAULT_DATA_DIR: &str = "/tmp/rootca-data";
