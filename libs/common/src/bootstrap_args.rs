//! Common command-line arguments for gateway services
//!
//! Provides a unified argument structure that can be extended by individual services

#[cfg(feature = "cli")]
use clap::Parser;
use std::path::PathBuf;

/// Common service startup arguments
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "cli", derive(Parser))]
#[cfg_attr(feature = "cli", clap(author, version, about))]
pub struct ServiceArgs {
    /// Log level override (trace, debug, info, warn, error)
    #[cfg_attr(feature = "cli", clap(short = 'l', long, env = "OTPGW_LOG_LEVEL"))]
    pub log_level: Option<String>,

    /// Configuration file path
    #[cfg_attr(feature = "cli", clap(short = 'c', long, env = "OTPGW_CONFIG"))]
    pub config: Option<PathBuf>,

    /// Disable colored output (useful for log files)
    #[cfg_attr(feature = "cli", clap(long))]
    pub no_color: bool,

    /// Only validate configuration without starting service
    #[cfg_attr(feature = "cli", clap(long))]
    pub validate: bool,
}

impl ServiceArgs {
    /// Configuration file path, falling back to `config/{service}.yaml`
    pub fn config_path(&self, service_name: &str) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("config/{service_name}.yaml")))
    }

    /// Effective log level: CLI/env override first, then the configured level
    pub fn effective_log_level<'a>(&'a self, configured: &'a str) -> &'a str {
        self.log_level.as_deref().unwrap_or(configured)
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;

    #[test]
    fn test_default_args() {
        let args = ServiceArgs::default();
        assert!(args.log_level.is_none());
        assert!(!args.no_color);
        assert!(!args.validate);
    }

    #[test]
    fn test_config_path() {
        let args = ServiceArgs::default();
        assert_eq!(args.config_path("otpgw"), PathBuf::from("config/otpgw.yaml"));

        let args = ServiceArgs {
            config: Some(PathBuf::from("/etc/otpgw.yaml")),
            ..Default::default()
        };
        assert_eq!(args.config_path("otpgw"), PathBuf::from("/etc/otpgw.yaml"));
    }

    #[test]
    fn test_effective_log_level() {
        let args = ServiceArgs::default();
        assert_eq!(args.effective_log_level("warn"), "warn");

        let args = ServiceArgs {
            log_level: Some("debug".to_string()),
            ..Default::default()
        };
        assert_eq!(args.effective_log_level("warn"), "debug");
    }

    #[cfg(feature = "cli")]
    #[test]
    fn test_parse_from_cli() {
        let args = ServiceArgs::parse_from([
            "otpgw",
            "--config",
            "gw.yaml",
            "--validate",
            "-l",
            "trace",
        ]);
        assert_eq!(args.config, Some(PathBuf::from("gw.yaml")));
        assert!(args.validate);
        assert_eq!(args.log_level.as_deref(), Some("trace"));
    }
}
