//! Error types shared across the crate.
//!
//! - [`WireError`] - decode-side failures of SOME/IP and SD messages
//! - [`DiagError`] - diagnostic error domain with stable numeric codes
//! - [`ConfigError`] - configuration loading failures
//!
//! Routing misses and cancellations are not errors: they are encoded as a
//! negative response and as [`crate::diag::Resolution::Cancelled`].

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("buffer too small: need {needed} bytes, got {actual}")]
    Truncated { needed: usize, actual: usize },
    #[error("length field {length} does not match {available} bytes after it")]
    LengthMismatch { length: u32, available: usize },
    #[error("unknown message type 0x{0:02x}")]
    UnknownMessageType(u8),
    #[error("unknown return code 0x{0:02x}")]
    UnknownReturnCode(u8),
    #[error("message 0x{0:08x} is not a service discovery message")]
    NotServiceDiscovery(u32),
    #[error("malformed SD payload: {0}")]
    MalformedSd(#[from] io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiagError {
    #[error("service already offered")]
    AlreadyOffered,
    #[error("configuration mismatch: {0}")]
    ConfigurationMismatch(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("service not offered")]
    NotOffered,
    #[error("generic diagnostic error")]
    GenericError,
    #[error("interface busy")]
    Busy,
    #[error("operation failed")]
    Failed,
    #[error("request rejected")]
    Rejected,
    #[error("diagnostic request failed")]
    RequestFailed,
    #[error("no value present for '{key}'")]
    ValueAbsent { key: String },
}

impl DiagError {
    /// Numeric code of the error within the diagnostic domain.
    pub fn code(&self) -> u32 {
        match self {
            DiagError::AlreadyOffered => 101,
            DiagError::ConfigurationMismatch(_) => 102,
            DiagError::InvalidArgument(_) => 105,
            DiagError::NotOffered => 106,
            DiagError::GenericError => 107,
            DiagError::Busy => 109,
            DiagError::Failed => 110,
            DiagError::Rejected => 113,
            DiagError::RequestFailed => 115,
            // Not part of the diagnostic domain proper; mirrors an empty optional access.
            DiagError::ValueAbsent { .. } => 0,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] io::Error),
    #[error("failed to parse config json: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("instance '{0}' not found in config")]
    UnknownInstance(String),
}
