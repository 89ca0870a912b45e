//! Error types for tellduslive-core.
//!
//! This module defines all error types that can occur when talking to
//! Telldus Live, a local TellStick gateway, or the gateway's UDP services.
//!
//! # Error Recovery
//!
//! The library never retries on its own. Callers decide:
//!
//! | Error Type | Typical handling |
//! |------------|------------------|
//! | [`Error::Http`] | Transient; the next poll may succeed |
//! | [`Error::Api`] | Server refused the request; report it |
//! | [`Error::CommandRejected`] | Device command not accepted; report it |
//! | [`Error::MissingConfiguration`] | Fix the credentials and restart |
//! | [`Error::DeviceNotFound`] | Wrong id, or the snapshot is stale |
//! | [`Error::NoGatewayFound`] | No TellStick answered discovery |

use thiserror::Error;

/// Errors that can occur when using a Telldus session.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// HTTP transport error (connection refused, timeout, TLS, ...).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with an `error` field or a non-success status.
    #[error("API error: {message}")]
    Api {
        /// HTTP status, when the failure came from the status line.
        status: Option<u16>,
        /// Message reported by the server.
        message: String,
    },

    /// The server response could not be interpreted.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Neither OAuth keys nor a local host and token were supplied.
    #[error("Missing configuration")]
    MissingConfiguration,

    /// No device with the given id in the current snapshot.
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// The server did not acknowledge a device command.
    #[error("Command '{method}' on device {device_id} was rejected")]
    CommandRejected {
        /// Device the command was sent to.
        device_id: String,
        /// API name of the command.
        method: String,
    },

    /// No TellStick gateway answered discovery.
    #[error("No TellStick gateway found on the local network")]
    NoGatewayFound,

    /// Discovery was requested but is not compiled in.
    #[error("Autodiscovery is not available in this build")]
    DiscoveryUnavailable,

    /// Malformed TellStick Net packet.
    #[error("Invalid packet: {0}")]
    Codec(#[from] CodecError),

    /// The authorization flow did not complete.
    #[error("Authorization failed: {0}")]
    Authorization(String),

    /// I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors produced while decoding a TellStick Net packet.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum CodecError {
    /// Input ended inside a value.
    #[error("unexpected end of packet")]
    UnexpectedEnd,

    /// A value started with a byte that is not a known type marker.
    #[error("unexpected byte '{0}' at offset {1}")]
    UnexpectedByte(char, usize),

    /// A length or integer field is not valid hexadecimal.
    #[error("invalid hex number '{0}'")]
    InvalidNumber(String),

    /// Bytes remained after the packet was fully decoded.
    #[error("{0} trailing bytes after packet")]
    TrailingBytes(usize),

    /// A dictionary key was not a string.
    #[error("dictionary keys must be strings")]
    NonStringKey,

    /// A string field is not valid UTF-8.
    #[error("string is not valid UTF-8")]
    InvalidUtf8,
}

impl Error {
    /// Create an API error from a message reported in the response body.
    pub fn api(message: impl Into<String>) -> Self {
        Self::Api {
            status: None,
            message: message.into(),
        }
    }

    /// Create a device not found error.
    pub fn device_not_found(id: impl Into<String>) -> Self {
        Self::DeviceNotFound(id.into())
    }

    /// Create a command rejected error.
    pub fn command_rejected(device_id: impl Into<String>, method: impl Into<String>) -> Self {
        Self::CommandRejected {
            device_id: device_id.into(),
            method: method.into(),
        }
    }
}

impl From<tellduslive_types::ParseError> for Error {
    fn from(err: tellduslive_types::ParseError) -> Self {
        Error::InvalidResponse(err.to_string())
    }
}

/// Result type alias using tellduslive-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;
