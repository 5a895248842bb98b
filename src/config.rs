// Application configuration
// Defaults, optionally overlaid by a JSON file, then by environment variables.

use crate::compressor::{CompressionConfig, CompressionError};
use crate::pricing::PricingConfig;
use serde::{Deserialize, Serialize};
use std::{env, fmt::Display, fs::read_to_string, path::Path, str::FromStr};
use thiserror::Error;
use tracing::{info, warn};

pub const ENV_MAX_WIDTH: &str = "ITINERARY_MAX_WIDTH";
pub const ENV_MAX_HEIGHT: &str = "ITINERARY_MAX_HEIGHT";
pub const ENV_TARGET_BYTES: &str = "ITINERARY_TARGET_BYTES";
pub const ENV_GROUPING: &str = "ITINERARY_GROUPING";
pub const ENV_SUFFIX: &str = "ITINERARY_SUFFIX";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error reading {path}: {source}")]
    IoError {
        path: String,
        source: std::io::Error,
    },

    #[error("JSON parse error: {0}")]
    JsonParseError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] CompressionError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub compression: CompressionConfig,
    pub pricing: PricingConfig,
}

impl AppConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = read_to_string(path).map_err(|source| ConfigError::IoError {
            path: path.display().to_string(),
            source,
        })?;
        let config: AppConfig = serde_json::from_str(&raw)?;
        config.compression.validate()?;
        Ok(config)
    }

    /// File (when given) then environment overrides, validated.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                info!(path = %path.display(), "loading configuration file");
                Self::from_file(path)?
            }
            None => Self::default(),
        };
        config.apply_env();
        config.compression.validate()?;
        Ok(config)
    }

    // Unset or unparseable variables leave the current value in place
    pub fn apply_env(&mut self) {
        override_from_env(ENV_MAX_WIDTH, &mut self.compression.max_width);
        override_from_env(ENV_MAX_HEIGHT, &mut self.compression.max_height);
        override_from_env(ENV_TARGET_BYTES, &mut self.compression.target_bytes);
        override_from_env(ENV_GROUPING, &mut self.pricing.grouping);
        override_from_env(ENV_SUFFIX, &mut self.pricing.suffix);
    }
}

fn override_from_env<T: FromStr>(key: &str, slot: &mut T)
where
    T::Err: Display,
{
    let Ok(raw) = env::var(key) else {
        return;
    };

    match raw.parse() {
        Ok(value) => {
            info!("{key} set, overriding configuration");
            *slot = value;
        }
        Err(e) => warn!("Invalid {key} value '{raw}': {e}, keeping current"),
    }
}
