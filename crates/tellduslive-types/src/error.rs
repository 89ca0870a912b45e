//! Error types for data parsing in tellduslive-types.

use thiserror::Error;

/// Errors that can occur when interpreting Telldus device data.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// A method name that is not one of the known Tellstick methods.
    #[error("Unknown method: {0}")]
    UnknownMethod(String),

    /// A bit value that does not correspond to a single Tellstick method.
    #[error("Unknown method bit value: {0}")]
    UnknownMethodBits(u32),

    /// Malformed data.
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Result type alias using tellduslive-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;
