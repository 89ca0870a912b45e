//! Authorize command implementation.
//!
//! With `public_key` and `private_key` stored, runs the Telldus Live OAuth
//! flow. With a host (`-H`, `-D` or stored), requests a token from the
//! gateway's local API. Either way the resulting token is written to the
//! credentials file.

use std::path::Path;

use anyhow::{Result, bail};
use tellduslive_core::{Authorizer, Credentials, LiveAuthorizer, LocalAuthorizer};

use crate::style;

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Pick the flow the credentials call for.
pub fn select_authorizer(
    credentials: &Credentials,
    application: &str,
) -> Result<Box<dyn Authorizer>> {
    if let (Some(public_key), Some(private_key)) = (
        present(&credentials.public_key),
        present(&credentials.private_key),
    ) {
        return Ok(Box::new(LiveAuthorizer::new(public_key, private_key)?));
    }
    if let Some(host) = present(&credentials.host) {
        return Ok(Box::new(LocalAuthorizer::new(host, application)?));
    }
    bail!(
        "Nothing to authorize against. Use -H <HOST> or -D for a local gateway, \
         or store public_key and private_key for Telldus Live."
    )
}

/// Run `authorizer` to completion and return `credentials` with the new
/// token. `confirm` is called with the URL the user must visit and returns
/// once access was granted.
pub async fn authorize<F>(
    authorizer: &mut dyn Authorizer,
    mut credentials: Credentials,
    confirm: F,
) -> Result<Credentials>
where
    F: FnOnce(&str) -> Result<()>,
{
    let url = authorizer.authorize_url().await?;
    confirm(&url)?;
    let token = authorizer.authorize().await?;

    credentials.token = Some(token.token);
    credentials.token_secret = token.token_secret;
    Ok(credentials)
}

/// Authorize and write the credentials to `path`.
pub async fn cmd_authorize<F>(
    credentials: Credentials,
    application: &str,
    path: &Path,
    no_color: bool,
    confirm: F,
) -> Result<()>
where
    F: FnOnce(&str) -> Result<()>,
{
    let mut authorizer = select_authorizer(&credentials, application)?;
    let credentials = authorize(authorizer.as_mut(), credentials, confirm).await?;
    credentials.write(path)?;
    eprintln!(
        "{}",
        style::format_success(
            &format!("Credentials written to {}", path.display()),
            no_color
        )
    );
    Ok(())
}
