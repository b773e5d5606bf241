use anyhow::{Result, bail};

/// Maximum length of a DNS-1123 label.
const MAX_LABEL_LEN: usize = 63;

/// Validate one part of a secret location (`kind` is "namespace" or "secret name").
/// Rules: lowercase `[a-z0-9-]`, max 63 chars, no leading/trailing hyphens.
pub fn validate_label(kind: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        bail!("{} must not be empty", kind);
    }
    if value.len() > MAX_LABEL_LEN {
        bail!(
            "{} '{}' exceeds {} characters (got {})",
            kind,
            value,
            MAX_LABEL_LEN,
            value.len()
        );
    }
    if value.starts_with('-') || value.ends_with('-') {
        bail!("{} '{}' must not start or end with a hyphen", kind, value);
    }
    if let Some(bad) = value
        .chars()
        .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-'))
    {
        bail!(
            "{} '{}' contains '{}'; only lowercase letters, digits, and hyphens [a-z0-9-] are allowed",
            kind,
            value,
            bad
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_labels() {
        assert!(validate_label("namespace", "rootca-system").is_ok());
        assert!(validate_label("namespace", "a").is_ok());
        assert!(validate_label("secret name", "root-ca-2").is_ok());
        assert!(validate_label("secret name", &"a".repeat(63)).is_ok());
    }

    #[test]
    fn invalid_labels() {
        assert!(validate_label("namespace", "").is_err());
        assert!(validate_label("namespace", "Root").is_err());
        assert!(validate_label("namespace", "root.ca").is_err());
        assert!(validate_label("namespace", "-leading").is_err());
        assert!(validate_label("namespace", "trailing-").is_err());
        assert!(validate_label("namespace", &"a".repeat(64)).is_err());
    }

    #[test]
    fn error_names_kind_and_offending_char() {
        let err = validate_label("secret name", "root_ca").unwrap_err().to_string();
        assert!(err.starts_with("secret name 'root_ca'"), "got: {}", err);
        assert!(err.contains("'_'"), "got: {}", err);
    }
}
