//! Error types for protocol operations
//!
//! Provides error types for request construction and reply decoding.

use std::fmt;

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors that can occur while building requests or decoding replies
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Verb is empty or contains whitespace/control characters
    InvalidVerb(String),

    /// Payload is not valid base64
    InvalidEncoding(String),

    /// Decoded payload is not valid UTF-8
    InvalidUtf8(String),

    /// A candidate row has a count that is not an integer
    InvalidCandidate(String),

    /// A record payload is not a JSON object
    InvalidRecord(String),
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidVerb(verb) => write!(f, "Invalid verb: {:?}", verb),
            Self::InvalidEncoding(msg) => write!(f, "Invalid payload encoding: {}", msg),
            Self::InvalidUtf8(msg) => write!(f, "Payload is not UTF-8: {}", msg),
            Self::InvalidCandidate(row) => write!(f, "Invalid candidate row: {:?}", row),
            Self::InvalidRecord(msg) => write!(f, "Invalid record: {}", msg),
        }
    }
}

impl std::error::Error for ProtocolError {}

impl From<serde_json::Error> for ProtocolError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidRecord(err.to_string())
    }
}

impl From<base64::DecodeError> for ProtocolError {
    fn from(err: base64::DecodeError) -> Self {
        Self::InvalidEncoding(err.to_string())
    }
}

impl From<std::string::FromUtf8Error> for ProtocolError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        Self::InvalidUtf8(err.to_string())
    }
}
