//! SMPP session lifecycle: the manager that owns the session, the startup
//! retry policy and the background health monitor.

pub mod health;
pub mod manager;
pub mod retry;

pub use health::HealthMonitor;
pub use manager::{SessionLifecycleManager, SessionState};
pub use retry::RetryPolicy;
