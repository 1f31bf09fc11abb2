//! Configuration loading helper functions
//!
//! Layered loading with figment. Priority (highest to lowest):
//! 1. Environment variables (prefixed, `__` separates nested keys)
//! 2. Configuration file (YAML, TOML or JSON by extension)
//! 3. Compiled-in defaults

use std::path::Path;

use errors::{ServiceError, ServiceResult};
use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info};

/// Load configuration from defaults, an optional file and the environment
///
/// When `required` is true a missing file is an error; otherwise the file
/// layer is skipped and defaults plus environment are used.
pub fn load_layered<T>(defaults: T, path: &Path, env_prefix: &str, required: bool) -> ServiceResult<T>
where
    T: Serialize + DeserializeOwned,
{
    let mut figment = Figment::from(Serialized::defaults(defaults));

    if path.exists() {
        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .ok_or_else(|| {
                ServiceError::Configuration("Config file must have an extension".to_string())
            })?;

        figment = match extension {
            "yaml" | "yml" => figment.merge(Yaml::file(path)),
            "toml" => figment.merge(Toml::file(path)),
            "json" => figment.merge(Json::file(path)),
            _ => {
                return Err(ServiceError::Configuration(format!(
                    "Unsupported config file format: {}",
                    extension
                )))
            },
        };
        info!("Loading configuration from {}", path.display());
    } else if required {
        return Err(ServiceError::Configuration(format!(
            "Config file not found: {}",
            path.display()
        )));
    } else {
        debug!(
            "Config file {} not found, using defaults and environment",
            path.display()
        );
    }

    figment
        .merge(Env::prefixed(env_prefix).split("__"))
        .extract()
        .map_err(|e| ServiceError::Configuration(format!("Failed to load configuration: {}", e)))
}
