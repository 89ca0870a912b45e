//! Credentials for a Telldus session and the `.tellduslive.conf` store.
//!
//! The store is a plain text file of `key: value` lines:
//!
//! ```text
//! # Telldus Live
//! public_key: FEHUVEW84RAFR5SP22RABURUPHAFRUNU
//! private_key: ZUXEVEGA9USTAZEWRETHAQUBUR69U6EF
//! token: 0123456789abcdef0123456789abcdef01234567
//! token_secret: 0123456789abcdef0123456789abcdef
//! ```
//!
//! Lines starting with `#` or `local` are ignored.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// File name of the credentials store.
pub const CREDENTIALS_FILE: &str = ".tellduslive.conf";

/// A TellStick Net controller the listener may register with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Numeric ids are read as strings.
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
}

fn string_or_number<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Str(String),
        Int(i64),
    }
    Ok(Option::<Id>::deserialize(d)?.map(|id| match id {
        Id::Str(s) => s,
        Id::Int(i) => i.to_string(),
    }))
}

/// Local listener configuration, loaded from a YAML file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenConfig {
    #[serde(default)]
    pub controllers: Vec<ControllerConfig>,
}

impl ListenConfig {
    /// Address of the first controller that has one.
    pub fn first_address(&self) -> Option<&str> {
        self.controllers
            .iter()
            .find_map(|c| c.address.as_deref())
    }
}

/// Which API a set of credentials selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// Telldus Live, OAuth 1.0a.
    Live,
    /// Local TellStick REST API, bearer token.
    Local,
}

/// Everything needed to construct a session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Credentials {
    pub public_key: Option<String>,
    pub private_key: Option<String>,
    pub token: Option<String>,
    pub token_secret: Option<String>,
    pub host: Option<String>,
    pub application: Option<String>,
    /// Keep listening for pushed updates from the gateway.
    pub listen: bool,
    pub config: Option<ListenConfig>,
}

fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}

impl Credentials {
    /// Parse the contents of a credentials file.
    ///
    /// Unknown keys and malformed lines are skipped.
    pub fn parse(contents: &str) -> Self {
        let mut credentials = Self::default();
        for line in contents.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') || line.starts_with("local") {
                continue;
            }
            let Some((key, value)) = line.split_once(':') else {
                debug!("Skipping malformed credentials line");
                continue;
            };
            let value = Some(value.trim().to_string());
            match key.trim() {
                "public_key" => credentials.public_key = value,
                "private_key" => credentials.private_key = value,
                "token" => credentials.token = value,
                "token_secret" => credentials.token_secret = value,
                "host" => credentials.host = value,
                "application" => credentials.application = value,
                other => debug!("Ignoring unknown credentials key '{}'", other),
            }
        }
        credentials
    }

    /// Read a credentials file. A missing file yields empty credentials.
    pub fn read(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(contents) => {
                debug!("Read credentials from {}", path.display());
                Ok(Self::parse(&contents))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Read the first credentials file found in [`search_paths`].
    pub fn read_default() -> Self {
        for path in search_paths() {
            match fs::read_to_string(&path) {
                Ok(contents) => {
                    debug!("Read credentials from {}", path.display());
                    return Self::parse(&contents);
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => warn!("Could not read {}: {}", path.display(), e),
            }
        }
        Self::default()
    }

    /// The stored fields, in file format.
    pub fn to_file_string(&self) -> String {
        let fields = [
            ("public_key", &self.public_key),
            ("private_key", &self.private_key),
            ("token", &self.token),
            ("token_secret", &self.token_secret),
            ("host", &self.host),
            ("application", &self.application),
        ];
        fields
            .iter()
            .filter_map(|(k, v)| v.as_ref().map(|v| format!("{}: {}\n", k, v)))
            .collect()
    }

    /// Write the stored fields to `path`.
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, self.to_file_string())?;
        Ok(())
    }

    /// Check that the credentials select a transport.
    ///
    /// Local access needs a host and a token and no public key; Telldus Live
    /// needs both key pairs. `listen` alone selects nothing: pushed packets
    /// only trigger a refresh, so a transport is always required.
    pub fn validate(&self) -> Result<TransportKind> {
        if present(&self.host) && present(&self.token) && !present(&self.public_key) {
            Ok(TransportKind::Local)
        } else if present(&self.public_key)
            && present(&self.private_key)
            && present(&self.token)
            && present(&self.token_secret)
        {
            Ok(TransportKind::Live)
        } else {
            Err(Error::MissingConfiguration)
        }
    }

    /// Gateway address for the push listener: the host, else the first
    /// configured controller.
    pub fn listen_host(&self) -> Option<&str> {
        self.host
            .as_deref()
            .filter(|h| !h.is_empty())
            .or_else(|| self.config.as_ref().and_then(ListenConfig::first_address))
    }
}

/// Where the credentials file is looked for: next to the running
/// executable, then in the home directory.
pub fn search_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        paths.push(dir.join(CREDENTIALS_FILE));
    }
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(CREDENTIALS_FILE));
    }
    paths
}

/// Where a newly authorized credentials file is written.
pub fn default_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CREDENTIALS_FILE))
}
