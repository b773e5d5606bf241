use anyhow::Context;
use clap::{Parser, Subcommand};
use pkg_constants::paths::{DEFAULT_BOOTSTRAP_CONFIG, DEFAULT_DATA_DIR};
use pkg_constants::secret::{DEFAULT_NAMESPACE, DEFAULT_SECRET_NAME};
use pkg_constants::state::DEFAULT_STORE_TIMEOUT_SECS;
use pkg_pki::{
    CallContext, RootCertificate, SecretStore, read_root_certificate, write_root_certificate,
};
use pkg_state::client::StateStore;
use pkg_state::secrets::StateSecretStore;
use pkg_types::config::{BootstrapConfigFile, load_config_file};
use pkg_types::secret::SecretLocation;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "rootca-bootstrap",
    about = "Load or persist the control plane root certificate"
)]
struct Cli {
    /// Path to YAML config file
    #[arg(long, short, default_value = DEFAULT_BOOTSTRAP_CONFIG)]
    config: String,

    /// Directory for SlateDB state storage
    #[arg(long)]
    data_dir: Option<String>,

    /// Namespace of the root certificate secret
    #[arg(long)]
    namespace: Option<String>,

    /// Name of the root certificate secret
    #[arg(long)]
    secret_name: Option<String>,

    /// Deadline for the whole operation, in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read the root certificate from the store
    Get {
        /// Write the certificate PEM to this file
        #[arg(long)]
        cert_out: Option<PathBuf>,
        /// Write the private key PEM to this file
        #[arg(long)]
        key_out: Option<PathBuf>,
    },
    /// Store a root certificate, creating or updating the secret
    Put {
        /// PEM file holding the root certificate
        #[arg(long)]
        cert: PathBuf,
        /// PEM file holding the root private key
        #[arg(long)]
        key: PathBuf,
        /// Expiration, e.g. 2030-05-07T14:25:18.677Z
        #[arg(long)]
        expiration: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let cli = Cli::parse();

    // Load config file (returns defaults if file not found)
    let file_cfg: BootstrapConfigFile = load_config_file(&cli.config)?;
    info!("Config file: {}", cli.config);

    let settings = resolve_settings(&cli, file_cfg);
    let location = SecretLocation::new(settings.namespace, settings.secret_name)?;
    let data_dir = settings.data_dir;
    let timeout_secs = settings.timeout_secs;

    info!("Starting rootca-bootstrap");
    info!("  Data dir:  {}", data_dir);
    info!("  Secret:    {}", location);
    info!("  Timeout:   {}s", timeout_secs);

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling in-flight store call");
                cancel.cancel();
            }
        });
    }
    let ctx = CallContext::with_cancel(cancel).with_timeout(Duration::from_secs(timeout_secs));

    let store = StateSecretStore::new(StateStore::new(&data_dir).await?);
    let result = run(cli.command, &store, &location, &ctx).await;
    store.into_inner().close().await?;

    result
}

/// Effective settings after merging CLI args > config file > defaults.
#[derive(Debug, PartialEq, Eq)]
struct Settings {
    data_dir: String,
    namespace: String,
    secret_name: String,
    timeout_secs: u64,
}

fn resolve_settings(cli: &Cli, file_cfg: BootstrapConfigFile) -> Settings {
    Settings {
        data_dir: cli
            .data_dir
            .clone()
            .or(file_cfg.data_dir)
            .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string()),
        namespace: cli
            .namespace
            .clone()
            .or(file_cfg.namespace)
            .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string()),
        secret_name: cli
            .secret_name
            .clone()
            .or(file_cfg.secret_name)
            .unwrap_or_else(|| DEFAULT_SECRET_NAME.to_string()),
        timeout_secs: cli
            .timeout_secs
            .or(file_cfg.timeout_secs)
            .unwrap_or(DEFAULT_STORE_TIMEOUT_SECS),
    }
}

async fn run(
    command: Command,
    store: &dyn SecretStore,
    location: &SecretLocation,
    ctx: &CallContext,
) -> anyhow::Result<()> {
    match command {
        Command::Get { cert_out, key_out } => {
            let cert = read_root_certificate(store, location, ctx)
                .await
                .with_context(|| format!("failed to load root certificate from {}", location))?;

            info!(
                "Root certificate: {} bytes, expires {}",
                cert.cert_pem().len(),
                cert.expiration_string()
            );
            if cert.is_expired() {
                warn!("Root certificate in {} has expired", location);
            }

            if let Some(path) = cert_out {
                write_pem(&path, cert.cert_pem(), false).await?;
            }
            if let Some(path) = key_out {
                write_pem(&path, cert.private_key_pem(), true).await?;
            }
        }
        Command::Put {
            cert,
            key,
            expiration,
        } => {
            let cert_pem = tokio::fs::read(&cert)
                .await
                .with_context(|| format!("failed to read {}", cert.display()))?;
            let key_pem = tokio::fs::read(&key)
                .await
                .with_context(|| format!("failed to read {}", key.display()))?;

            let root = RootCertificate::from_raw(cert_pem, key_pem.clone(), &expiration)?;
            root.verify_pem()?;

            write_root_certificate(store, &root, location, &key_pem, ctx)
                .await
                .with_context(|| format!("failed to store root certificate in {}", location))?;
        }
    }
    Ok(())
}

/// Write PEM material to disk. Private keys are owner-only on Unix from the
/// moment the file is opened, before any key bytes are written.
async fn write_pem(path: &Path, pem: &[u8], private: bool) -> anyhow::Result<()> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(if private { 0o600 } else { 0o644 });

    let mut file = options
        .open(path)
        .await
        .with_context(|| format!("failed to open {}", path.display()))?;

    // `mode` only applies to newly created files.
    if private {
        restrict_permissions(&file, path).await?;
    }

    file.write_all(pem)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;
    file.flush().await?;

    info!("Wrote {}", path.display());
    Ok(())
}

#[cfg(unix)]
async fn restrict_permissions(file: &tokio::fs::File, path: &Path) -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(std::fs::Permissions::from_mode(0o600))
        .await
        .with_context(|| format!("failed to restrict permissions on {}", path.display()))
}

#[cfg(not(unix))]
async fn restrict_permissions(_file: &tokio::fs::File, _path: &Path) -> anyhow::Result<()> {
    Ok(())
}
