pub mod app_config;
pub mod config;
pub mod coordinate;
pub mod reports;
pub mod scoring;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use coordinate::Coordinate;
pub use reports::{ReportType, RouteVariant};
pub use scoring::{load_scoring_policy, ScoringPolicyConfig};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read scoring policy file {path}: {source}")]
    PolicyFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse scoring policy file: {0}")]
    PolicyFileParse(#[from] serde_yaml::Error),

    #[error("scoring policy validation failed: {0}")]
    Validation(String),
}
