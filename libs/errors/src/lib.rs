//! Unified error handling for OTP gateway services
//!
//! Every service keeps its own domain error type and exposes a common
//! interface through [`ServiceErrorTrait`]. [`ServiceError`] is the
//! process-level error returned from `main`.

use thiserror::Error;

// ============================================================================
// ServiceError - Main error type
// ============================================================================

/// Process-level error type for gateway services
#[derive(Debug, Error)]
pub enum ServiceError {
    // ======================================
    // Configuration Errors
    // ======================================
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid configuration: {field}: {reason}")]
    InvalidConfig { field: String, reason: String },

    // ======================================
    // Protocol & Communication Errors
    // ======================================
    #[error("Protocol error: {protocol}: {message}")]
    Protocol { protocol: String, message: String },

    #[error("Connection failed: {endpoint}: {reason}")]
    ConnectionFailed { endpoint: String, reason: String },

    #[error("Timeout waiting for response from {0}")]
    Timeout(String),

    // ======================================
    // Service & Runtime Errors
    // ======================================
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Service startup failed: {0}")]
    StartupFailed(String),

    // ======================================
    // File & I/O Errors
    // ======================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using ServiceError
pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    /// Process exit code for this error
    ///
    /// Configuration problems exit with 78 (EX_CONFIG), failures to reach
    /// an upstream with 69 (EX_UNAVAILABLE), everything else with 1.
    pub fn exit_code(&self) -> i32 {
        match self.category() {
            ErrorCategory::Configuration => 78,
            ErrorCategory::Network | ErrorCategory::Connection | ErrorCategory::Timeout => 69,
            _ => 1,
        }
    }
}

// ============================================================================
// ServiceError implements ServiceErrorTrait
// ============================================================================

impl ServiceErrorTrait for ServiceError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::InvalidConfig { .. } => "INVALID_CONFIG",
            Self::Protocol { .. } => "PROTOCOL_ERROR",
            Self::ConnectionFailed { .. } => "CONNECTION_FAILED",
            Self::Timeout(_) => "TIMEOUT",
            Self::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            Self::StartupFailed(_) => "STARTUP_FAILED",
            Self::Io(_) => "IO_ERROR",
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration(_) | Self::InvalidConfig { .. } => ErrorCategory::Configuration,
            Self::Protocol { .. } => ErrorCategory::Protocol,
            Self::ConnectionFailed { .. } => ErrorCategory::Connection,
            Self::Timeout(_) => ErrorCategory::Timeout,
            Self::ServiceUnavailable(_) => ErrorCategory::ResourceBusy,
            Self::StartupFailed(_) | Self::Io(_) => ErrorCategory::Internal,
        }
    }
}

// ============================================================================
// Service Error Trait - Architectural layer
// ============================================================================

/// Error category enum - used for classification and exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    // Infrastructure layer
    Configuration,
    Network,
    Timeout,

    // Business logic layer
    Rejected,
    Unavailable,

    // Protocol/communication layer
    Protocol,
    Connection,

    // System level
    Internal,
    ResourceBusy,
}

/// Error capability trait
///
/// Each service keeps its domain-specific error variants and gains a common
/// outward-facing interface by implementing this trait.
pub trait ServiceErrorTrait: std::error::Error + Send + Sync + 'static {
    /// Get error code (for logs and monitoring)
    fn error_code(&self) -> &'static str;

    /// Get error category
    fn category(&self) -> ErrorCategory;

    /// Whether the error is retryable (default implementation is category-based)
    fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Network
                | ErrorCategory::Timeout
                | ErrorCategory::Connection
                | ErrorCategory::ResourceBusy
                | ErrorCategory::Unavailable
        )
    }
}

// Tests
#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;

    #[test]
    fn test_error_retryable() {
        assert!(ServiceError::Timeout("smsc".into()).is_retryable());
        assert!(ServiceError::ConnectionFailed {
            endpoint: "smsc:2775".into(),
            reason: "refused".into()
        }
        .is_retryable());
        assert!(!ServiceError::Configuration("bad".into()).is_retryable());
        assert!(!ServiceError::StartupFailed("bind".into()).is_retryable());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(ServiceError::Configuration("x".into()).exit_code(), 78);
        assert_eq!(
            ServiceError::InvalidConfig {
                field: "smpp.port".into(),
                reason: "must be non-zero".into()
            }
            .exit_code(),
            78
        );
        assert_eq!(ServiceError::Timeout("x".into()).exit_code(), 69);
        assert_eq!(ServiceError::StartupFailed("x".into()).exit_code(), 1);
    }

    #[test]
    fn test_error_codes() {
        let err = ServiceError::Protocol {
            protocol: "smpp".into(),
            message: "bad frame".into(),
        };
        assert_eq!(err.error_code(), "PROTOCOL_ERROR");
        assert_eq!(err.category(), ErrorCategory::Protocol);
        assert_eq!(
            ServiceError::ServiceUnavailable("x".into()).category(),
            ErrorCategory::ResourceBusy
        );
    }
}
