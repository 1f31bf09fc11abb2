//! Error handling for the OTP gateway
//!
//! `GatewayError` is `Clone` so one bind outcome can be handed to every
//! caller that waited on the same attempt.

use errors::{ErrorCategory, ServiceError, ServiceErrorTrait};
use smpp_link::{status_description, LinkError};
use thiserror::Error;

/// Gateway error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Connection to the message center could not be opened or was lost
    #[error("Transport error: {0}")]
    Transport(String),

    /// Message center rejected the bind
    #[error("Bind rejected: status 0x{status:08X} ({})", status_description(*.status))]
    Bind { status: u32 },

    /// Every startup bind attempt failed
    #[error("Bind failed after {attempts} attempts: {last}")]
    RetryExhausted {
        attempts: u32,
        last: Box<GatewayError>,
    },

    /// No bound session to send through
    #[error("Message delivery unavailable: {0}")]
    DeliveryUnavailable(String),

    /// Message center refused a submit_sm
    #[error("Submit rejected: status 0x{status:08X} ({})", status_description(*.status))]
    SubmitRejected { status: u32 },

    /// Malformed PDU or field that cannot be encoded
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input/Output operation errors
    #[error("IO error: {0}")]
    Io(String),

    /// Operation timeout errors
    #[error("Timeout error: {0}")]
    Timeout(String),
}

/// Result type for gateway operations
pub type Result<T> = std::result::Result<T, GatewayError>;

impl GatewayError {
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::DeliveryUnavailable(msg.into())
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// The bind status behind this error, if the gateway rejected a bind
    pub fn bind_status(&self) -> Option<u32> {
        match self {
            Self::Bind { status } => Some(*status),
            Self::RetryExhausted { last, .. } => last.bind_status(),
            _ => None,
        }
    }
}

impl From<LinkError> for GatewayError {
    fn from(err: LinkError) -> Self {
        match err {
            LinkError::Connection(msg) => Self::Transport(msg),
            LinkError::Timeout(msg) => Self::Timeout(msg),
            LinkError::Io(msg) => Self::Io(msg),
            LinkError::Protocol(msg) | LinkError::InvalidData(msg) => Self::Protocol(msg),
            LinkError::NotBound => Self::DeliveryUnavailable("session not bound".to_string()),
            LinkError::Closed => Self::Transport("connection closed".to_string()),
        }
    }
}

impl From<std::io::Error> for GatewayError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl ServiceErrorTrait for GatewayError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Transport(_) => "OTPGW_TRANSPORT_ERROR",
            Self::Bind { .. } => "OTPGW_BIND_REJECTED",
            Self::RetryExhausted { .. } => "OTPGW_RETRY_EXHAUSTED",
            Self::DeliveryUnavailable(_) => "OTPGW_DELIVERY_UNAVAILABLE",
            Self::SubmitRejected { .. } => "OTPGW_SUBMIT_REJECTED",
            Self::Protocol(_) => "OTPGW_PROTOCOL_ERROR",
            Self::Config(_) => "OTPGW_CONFIG_ERROR",
            Self::Io(_) => "OTPGW_IO_ERROR",
            Self::Timeout(_) => "OTPGW_TIMEOUT",
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Transport(_) => ErrorCategory::Connection,
            Self::Bind { .. } | Self::SubmitRejected { .. } => ErrorCategory::Rejected,
            Self::RetryExhausted { last, .. } => last.category(),
            Self::DeliveryUnavailable(_) => ErrorCategory::Unavailable,
            Self::Protocol(_) => ErrorCategory::Protocol,
            Self::Config(_) => ErrorCategory::Configuration,
            Self::Io(_) => ErrorCategory::Network,
            Self::Timeout(_) => ErrorCategory::Timeout,
        }
    }

    fn is_retryable(&self) -> bool {
        match self {
            // Startup gave up; the process is not going to try again
            Self::RetryExhausted { .. } => false,
            _ => matches!(
                self.category(),
                ErrorCategory::Network
                    | ErrorCategory::Timeout
                    | ErrorCategory::Connection
                    | ErrorCategory::Unavailable
            ),
        }
    }
}

// ============================================================================
// Process-level conversion: GatewayError → ServiceError
// ============================================================================

impl From<GatewayError> for ServiceError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Config(msg) => ServiceError::Configuration(msg),
            GatewayError::Io(msg) => ServiceError::Io(std::io::Error::other(msg)),
            GatewayError::Timeout(msg) => ServiceError::Timeout(msg),
            GatewayError::Protocol(msg) => ServiceError::Protocol {
                protocol: "smpp".to_string(),
                message: msg,
            },
            GatewayError::DeliveryUnavailable(msg) => ServiceError::ServiceUnavailable(msg),
            GatewayError::Transport(msg) => ServiceError::ConnectionFailed {
                endpoint: "smsc".to_string(),
                reason: msg,
            },
            other @ (GatewayError::Bind { .. }
            | GatewayError::RetryExhausted { .. }
            | GatewayError::SubmitRejected { .. }) => ServiceError::StartupFailed(other.to_string()),
        }
    }
}
