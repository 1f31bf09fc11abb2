//! SMPP Link Error Types

use thiserror::Error;

/// Result type for smpp-link operations
pub type Result<T> = std::result::Result<T, LinkError>;

/// Link layer errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LinkError {
    /// Connection could not be opened (refused, DNS, unreachable)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Connect or response timeout
    #[error("Timeout: {0}")]
    Timeout(String),

    /// IO errors on an open connection
    #[error("IO error: {0}")]
    Io(String),

    /// Malformed or unexpected PDU
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Field value cannot be encoded
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Operation requires a bound session
    #[error("Session not bound")]
    NotBound,

    /// Peer closed the connection or the session was unbound
    #[error("Connection closed")]
    Closed,
}

impl From<std::io::Error> for LinkError {
    fn from(err: std::io::Error) -> Self {
        LinkError::Io(err.to_string())
    }
}

// Helper methods for creating errors
impl LinkError {
    pub fn connection(msg: impl Into<String>) -> Self {
        LinkError::Connection(msg.into())
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        LinkError::Timeout(msg.into())
    }

    pub fn protocol(msg: impl Into<String>) -> Self {
        LinkError::Protocol(msg.into())
    }

    pub fn invalid_data(msg: impl Into<String>) -> Self {
        LinkError::InvalidData(msg.into())
    }

    /// Check if this error indicates the session is gone and must be re-bound
    pub fn needs_reconnect(&self) -> bool {
        match self {
            LinkError::Io(msg) => {
                msg.contains("Broken pipe")
                    || msg.contains("Connection reset")
                    || msg.contains("Connection refused")
                    || msg.contains("Connection aborted")
                    || msg.contains("Network is unreachable")
            },
            LinkError::Connection(_)
            | LinkError::Timeout(_)
            | LinkError::NotBound
            | LinkError::Closed => true,
            LinkError::Protocol(_) | LinkError::InvalidData(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_needs_reconnect() {
        assert!(LinkError::Closed.needs_reconnect());
        assert!(LinkError::NotBound.needs_reconnect());
        assert!(LinkError::connection("refused").needs_reconnect());
        assert!(LinkError::Io("Connection reset by peer".into()).needs_reconnect());
        assert!(!LinkError::Io("disk full".into()).needs_reconnect());
        assert!(!LinkError::protocol("bad header").needs_reconnect());
    }

    #[test]
    fn test_from_io_error() {
        let err: LinkError = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "Broken pipe").into();
        assert!(matches!(err, LinkError::Io(_)));
        assert!(err.needs_reconnect());
    }
}
