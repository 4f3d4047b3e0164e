//! Transport error types

use std::fmt;

/// Result type for transport operations
pub type Result<T> = std::result::Result<T, TransportError>;

/// Errors that can occur in transport operations
#[derive(Debug)]
pub enum TransportError {
    /// I/O error on one of the child's streams
    Io(std::io::Error),

    /// Process error (spawn, kill, wait)
    Process(String),

    /// The stream was already shut down
    Closed,
}

impl TransportError {
    /// Whether the peer has gone away (broken pipe, reset, closed)
    pub fn is_disconnect(&self) -> bool {
        match self {
            Self::Io(err) => matches!(
                err.kind(),
                std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::UnexpectedEof
            ),
            Self::Closed => true,
            Self::Process(_) => false,
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "I/O error: {}", err),
            Self::Process(msg) => write!(f, "Process error: {}", msg),
            Self::Closed => write!(f, "Channel closed"),
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::broken_pipe(std::io::ErrorKind::BrokenPipe, true)]
    #[case::reset(std::io::ErrorKind::ConnectionReset, true)]
    #[case::eof(std::io::ErrorKind::UnexpectedEof, true)]
    #[case::permission(std::io::ErrorKind::PermissionDenied, false)]
    #[case::other(std::io::ErrorKind::Other, false)]
    fn test_io_disconnect_classification(#[case] kind: std::io::ErrorKind, #[case] expected: bool) {
        let err = TransportError::from(std::io::Error::from(kind));
        assert_eq!(err.is_disconnect(), expected);
    }

    #[test]
    fn test_closed_is_disconnect() {
        assert!(TransportError::Closed.is_disconnect());
        assert!(!TransportError::Process("spawn failed".to_string()).is_disconnect());
    }

    #[test]
    fn test_display() {
        assert_eq!(TransportError::Closed.to_string(), "Channel closed");
        assert_eq!(
            TransportError::Process("no such file".to_string()).to_string(),
            "Process error: no such file"
        );
    }
}
