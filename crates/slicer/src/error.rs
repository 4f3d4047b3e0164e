//! Error types for the slicer client
//!
//! Failures fall into two groups. Per-command failures ([`SlicerError::Remote`],
//! [`SlicerError::UnexpectedReply`], [`SlicerError::Protocol`]) leave the
//! connection usable. Connection failures ([`SlicerError::Closed`],
//! [`SlicerError::Transport`]) are terminal: every later command fails too.
//! Nothing is retried, since a command may already have run remotely.

use slicer_protocol::ProtocolError;
use slicer_transport::TransportError;
use thiserror::Error;

/// Result type for slicer operations
pub type Result<T> = std::result::Result<T, SlicerError>;

/// Errors returned by [`Slicer`](crate::Slicer) commands
#[derive(Debug, Error)]
pub enum SlicerError {
    /// slicebot answered `ERROR`; the message is passed through verbatim
    #[error("slicebot error: {0}")]
    Remote(String),

    /// slicebot answered with a verb that does not belong to the command
    #[error("Unexpected reply {reply} to {command}")]
    UnexpectedReply {
        /// Command verb that was sent
        command: String,
        /// Reply verb that came back
        reply: String,
    },

    /// Reply could not be decoded, or a request could not be built
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Spawning or talking to the subprocess failed
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The connection is closed
    #[error("Connection closed")]
    Closed,

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl SlicerError {
    /// Whether the connection is unusable after this error
    pub fn is_connection_fatal(&self) -> bool {
        matches!(self, Self::Closed | Self::Transport(_))
    }

    /// Message reported by slicebot, for [`SlicerError::Remote`]
    pub fn remote_message(&self) -> Option<&str> {
        match self {
            Self::Remote(msg) => Some(msg),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(SlicerError::Remote("file not found".to_string()), false)]
    #[case(SlicerError::UnexpectedReply { command: "LOAD".to_string(), reply: "NODE".to_string() }, false)]
    #[case(SlicerError::Protocol(ProtocolError::InvalidEncoding("bad".to_string())), false)]
    #[case(SlicerError::Transport(TransportError::Closed), true)]
    #[case(SlicerError::Closed, true)]
    #[case(SlicerError::Config("bad chunk size".to_string()), false)]
    fn test_connection_fatal(#[case] err: SlicerError, #[case] fatal: bool) {
        assert_eq!(err.is_connection_fatal(), fatal);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            SlicerError::Remote("file not found".to_string()).to_string(),
            "slicebot error: file not found"
        );
        assert_eq!(
            SlicerError::UnexpectedReply {
                command: "CANDIDATES".to_string(),
                reply: "GRAPH".to_string()
            }
            .to_string(),
            "Unexpected reply GRAPH to CANDIDATES"
        );
        assert_eq!(SlicerError::Closed.to_string(), "Connection closed");
    }

    #[test]
    fn test_remote_message() {
        let err = SlicerError::Remote("no graph loaded".to_string());
        assert_eq!(err.remote_message(), Some("no graph loaded"));
        assert_eq!(SlicerError::Closed.remote_message(), None);
    }
}
