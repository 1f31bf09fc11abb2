//! Gateway configuration
//!
//! Loaded once at startup from defaults, `config/otpgw.yaml` (or `--config`)
//! and `OTPGW_`-prefixed environment variables, e.g. `OTPGW_SMPP__HOST`.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use common::LoggingConfig;
use serde::{Deserialize, Serialize};
use smpp_link::{constants, BindTransmitter, TransportOptions};

use crate::error::{GatewayError, Result};
use crate::session::RetryPolicy;

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "OTPGW_";

/// Top-level gateway configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub smpp: BindCredentials,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

/// Identity and endpoint used to bind to the message center
///
/// Immutable once loaded; the session manager only reads it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BindCredentials {
    pub host: String,
    pub port: u16,
    pub system_id: String,
    pub password: String,
    pub system_type: String,
    /// Default originating address; also sent as the bind address range
    pub source_addr: String,
}

impl Default for BindCredentials {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 2775,
            system_id: String::new(),
            password: String::new(),
            system_type: String::new(),
            source_addr: String::new(),
        }
    }
}

impl fmt::Debug for BindCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindCredentials")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("system_id", &self.system_id)
            .field("password", &"***")
            .field("system_type", &self.system_type)
            .field("source_addr", &self.source_addr)
            .finish()
    }
}

impl BindCredentials {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        system_id: impl Into<String>,
        password: impl Into<String>,
        system_type: impl Into<String>,
        source_addr: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            system_id: system_id.into(),
            password: password.into(),
            system_type: system_type.into(),
            source_addr: source_addr.into(),
        }
    }

    /// bind_transmitter request for these credentials (interface version 3.4)
    pub fn bind_request(&self) -> BindTransmitter {
        BindTransmitter::new(
            self.system_id.as_str(),
            self.password.as_str(),
            self.system_type.as_str(),
            self.source_addr.as_str(),
        )
    }

    /// `host:port`, for logs
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(GatewayError::config("smpp.host must not be empty"));
        }
        if self.port == 0 {
            return Err(GatewayError::config("smpp.port must not be 0"));
        }
        if self.system_id.is_empty() {
            return Err(GatewayError::config("smpp.system_id must not be empty"));
        }
        check_len("smpp.system_id", &self.system_id, constants::SYSTEM_ID_MAX)?;
        check_len("smpp.password", &self.password, constants::PASSWORD_MAX)?;
        check_len("smpp.system_type", &self.system_type, constants::SYSTEM_TYPE_MAX)?;
        check_len("smpp.source_addr", &self.source_addr, constants::ADDR_MAX)?;
        Ok(())
    }
}

fn check_len(field: &str, value: &str, max_with_nul: usize) -> Result<()> {
    if value.len() >= max_with_nul {
        return Err(GatewayError::config(format!(
            "{} is {} octets, at most {} allowed",
            field,
            value.len(),
            max_with_nul - 1
        )));
    }
    Ok(())
}

/// Session lifecycle tunables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Startup bind attempts
    pub retry_max_attempts: u32,
    /// Delay between startup bind attempts
    pub retry_delay_secs: u64,
    /// Health check period
    pub health_interval_secs: u64,
    /// Upper bound on one health check, recovery included
    pub health_check_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub response_timeout_secs: u64,
    /// enquire_link keep-alive period; 0 disables
    pub enquire_link_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            retry_max_attempts: 3,
            retry_delay_secs: 5,
            health_interval_secs: 30,
            health_check_timeout_secs: 20,
            connect_timeout_secs: 10,
            response_timeout_secs: 10,
            enquire_link_interval_secs: 0,
        }
    }
}

impl SessionConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry_max_attempts,
            Duration::from_secs(self.retry_delay_secs),
        )
    }

    pub fn health_interval(&self) -> Duration {
        Duration::from_secs(self.health_interval_secs)
    }

    pub fn health_check_timeout(&self) -> Duration {
        Duration::from_secs(self.health_check_timeout_secs)
    }

    pub fn transport_options(&self) -> TransportOptions {
        TransportOptions {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            response_timeout: Duration::from_secs(self.response_timeout_secs),
            enquire_link_interval: (self.enquire_link_interval_secs > 0)
                .then(|| Duration::from_secs(self.enquire_link_interval_secs)),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.retry_max_attempts == 0 {
            return Err(GatewayError::config(
                "session.retry_max_attempts must be at least 1",
            ));
        }
        if self.health_interval_secs == 0 {
            return Err(GatewayError::config(
                "session.health_interval_secs must be at least 1",
            ));
        }
        if self.health_check_timeout_secs == 0 {
            return Err(GatewayError::config(
                "session.health_check_timeout_secs must be at least 1",
            ));
        }
        if self.connect_timeout_secs == 0 || self.response_timeout_secs == 0 {
            return Err(GatewayError::config("session timeouts must be at least 1s"));
        }
        Ok(())
    }
}

impl AppConfig {
    /// Load layered configuration
    ///
    /// A missing file is tolerated only when no path was given explicitly.
    pub fn load(path: &Path, required: bool) -> Result<Self> {
        common::config_loader::load_layered(Self::default(), path, ENV_PREFIX, required)
            .map_err(|e| GatewayError::config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        self.smpp.validate()?;
        self.session.validate()?;
        if !common::logging::is_known_level(&self.logging.level) {
            return Err(GatewayError::config(format!(
                "logging.level: unknown level '{}'",
                self.logging.level
            )));
        }
        Ok(())
    }
}
