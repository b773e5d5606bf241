use serde::{Deserialize, Serialize};

/// `rootca-bootstrap` configuration file (YAML).
///
/// Example `config.yaml`:
/// ```yaml
/// data-dir: /var/lib/rootca/data
/// namespace: rootca-system
/// secret-name: root-ca
/// timeout-secs: 30
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BootstrapConfigFile {
    #[serde(default, alias = "data-dir")]
    pub data_dir: Option<String>,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default, alias = "secret-name")]
    pub secret_name: Option<String>,
    #[serde(default, alias = "timeout-secs")]
    pub timeout_secs: Option<u64>,
}

/// Load a YAML config file, returning the default if the file doesn't exist.
pub fn load_config_file<T: serde::de::DeserializeOwned + Default>(path: &str) -> anyhow::Result<T> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(T::default());
        }
        Err(e) => return Err(e.into()),
    };
    let config: T = serde_yaml::from_str(&content)?;
    Ok(config)
}
