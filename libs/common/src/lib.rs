//! Shared service plumbing for the OTP gateway
//!
//! Provides basic functions shared by all services, including:
//! - logging bootstrap
//! - command-line service arguments
//! - layered configuration loading
//! - startup banner and shutdown signal handling

pub mod config_loader;
pub mod logging;
pub mod service_bootstrap;
pub mod shutdown;

// Bootstrap modules
pub mod bootstrap_args;

pub use bootstrap_args::ServiceArgs;
pub use logging::{LogConfig, LoggingConfig};
pub use service_bootstrap::ServiceInfo;

// Re-export common dependencies
pub use serde;
pub use tokio;

// Re-export CLI dependencies when cli feature is enabled
#[cfg(feature = "cli")]
pub use clap;

// Re-export clap derive macros separately for proper macro resolution
#[cfg(feature = "cli")]
pub use clap::Parser;
