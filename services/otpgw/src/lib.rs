//! OTP SMS Gateway
//!
//! Owns one long-lived SMPP transmitter session to the message center:
//! binds it at startup under a bounded retry policy, keeps it healthy from a
//! background monitor, and hands it to senders through [`SmsDispatcher`].

pub mod config;
pub mod dispatch;
pub mod error;
pub mod runtime;
pub mod session;

pub use config::{AppConfig, BindCredentials, SessionConfig};
pub use dispatch::SmsDispatcher;
pub use error::{GatewayError, Result};
pub use runtime::Gateway;
pub use session::{HealthMonitor, RetryPolicy, SessionLifecycleManager, SessionState};
