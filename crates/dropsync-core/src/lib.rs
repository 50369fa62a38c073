use thiserror::Error;

pub mod app_config;
pub mod config;
pub mod language;
pub mod locales;
pub mod products;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use language::{detect_language, matches_locale, DetectedLanguage};
pub use locales::{load_locales, LocaleConfig, LocalesFile};
pub use products::{is_eu_country, slugify, NormalizedImage, NormalizedProduct, NormalizedVariant};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read locales file at {path}: {source}")]
    LocalesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse locales file: {0}")]
    LocalesFileParse(#[from] serde_yaml::Error),

    #[error("config validation failed: {0}")]
    Validation(String),
}
