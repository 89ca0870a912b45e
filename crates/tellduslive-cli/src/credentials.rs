//! Credential resolution and session setup.
//!
//! Stored credentials are merged with command-line overrides. For the host,
//! a discovered gateway beats `-H`, which beats the stored host. The `-L`
//! config is merged under `config`, and `listen` follows `list -r`.

use std::path::Path;

use anyhow::{Context, Result};
use tellduslive_core::{Credentials, Discovery, Session};
use tracing::info;

use crate::config::load_listen_config;

/// Command-line inputs to credential resolution.
#[derive(Debug, Clone, Copy, Default)]
pub struct CredentialArgs<'a> {
    /// `-H`
    pub host: Option<&'a str>,
    /// `-L`
    pub local_config: Option<&'a Path>,
    /// `-D`
    pub autodiscover: bool,
    /// Register for pushed updates (`list -r`).
    pub listen: bool,
    /// Application name from the preferences, used when none is stored.
    pub application: Option<&'a str>,
}

/// Merge `stored` with the command line.
///
/// Fails when discovery was requested and found nothing (or is not
/// available), or when the `-L` file cannot be read or parsed.
pub async fn resolve_credentials(
    mut credentials: Credentials,
    args: &CredentialArgs<'_>,
    discovery: &Discovery,
) -> Result<Credentials> {
    if args.autodiscover {
        let gateway = discovery
            .discover_first()
            .await
            .context("Autodiscovery failed")?;
        info!("Using {} at {}", gateway.product, gateway.address);
        credentials.host = Some(gateway.host());
    } else if let Some(host) = args.host {
        credentials.host = Some(host.to_string());
    }

    if let Some(path) = args.local_config {
        credentials.config = Some(load_listen_config(path)?);
    }

    if credentials.application.is_none() {
        credentials.application = args.application.map(str::to_string);
    }
    credentials.listen = args.listen;
    Ok(credentials)
}

/// Build a session from resolved credentials and fetch the first snapshot.
pub async fn open_session(credentials: &Credentials) -> Result<Session> {
    let session = Session::connect(credentials).await?;
    session
        .update()
        .await
        .context("Could not update status from server")?;
    Ok(session)
}
