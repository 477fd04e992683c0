//! Shared domain primitives and configuration for the venue detection stack.

mod app_config;
mod config;
mod geo;
mod venues;

pub use app_config::{AgentSettings, AppConfig, DetectSettings, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use geo::{GeoError, GeoPoint};
pub use venues::{load_venues, parse_venues, VenueConfig, VenueRecord};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read venues file {path}: {source}")]
    VenuesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse venues file: {0}")]
    VenuesFileParse(#[from] serde_yaml::Error),

    #[error("venue registry validation failed: {0}")]
    Validation(String),
}
