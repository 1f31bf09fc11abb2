//! Unified service bootstrap utilities
//!
//! Provides common initialization functionality for gateway services,
//! including startup banners and logging initialization.

use crate::bootstrap_args::ServiceArgs;
use crate::logging::{self, LoggingConfig};
use errors::{ServiceError, ServiceResult};
use tracing::info;

/// Service metadata for startup
pub struct ServiceInfo {
    /// Service name (e.g., "otpgw")
    pub name: String,
    /// Service version from Cargo.toml
    pub version: String,
    /// Service description
    pub description: String,
}

impl ServiceInfo {
    /// Create new service info
    ///
    /// Pass `env!("CARGO_PKG_VERSION")` from the service crate so the banner
    /// shows the service version rather than this library's.
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            description: description.into(),
        }
    }
}

/// Print unified startup banner for any service
pub fn print_startup_banner(service: &ServiceInfo) {
    let banner = r#"
  ██████╗ ████████╗██████╗  ██████╗ ██╗    ██╗
 ██╔═══██╗╚══██╔══╝██╔══██╗██╔════╝ ██║    ██║
 ██║   ██║   ██║   ██████╔╝██║  ███╗██║ █╗ ██║
 ██║   ██║   ██║   ██╔═══╝ ██║   ██║██║███╗██║
 ╚██████╔╝   ██║   ██║     ╚██████╔╝╚███╔███╔╝
  ╚═════╝    ╚═╝   ╚═╝      ╚═════╝  ╚══╝╚══╝
    "#;

    info!("{}", banner);
    info!("");
    info!(" {} v{}", service.name.to_uppercase(), service.version);
    info!(" {}", service.description);
    info!("");
}

/// Initialize logging for a service
///
/// The CLI/env level (`--log-level`, `OTPGW_LOG_LEVEL`) overrides the
/// configured level; `--no-color` disables ANSI console output.
pub fn init_logging(
    service: &ServiceInfo,
    args: &ServiceArgs,
    logging_config: &LoggingConfig,
) -> ServiceResult<()> {
    let mut effective = logging_config.clone();
    effective.level = args.effective_log_level(&logging_config.level).to_string();

    let mut log_config = effective.to_log_config(&service.name);
    log_config.ansi = !args.no_color;

    logging::init_with_config(log_config)
        .map_err(|e| ServiceError::StartupFailed(format!("Failed to initialize logging: {}", e)))
}
