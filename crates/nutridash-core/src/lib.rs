use thiserror::Error;

pub mod aggregate;
pub mod app_config;
pub mod config;
pub mod countries;
pub mod model;

pub use aggregate::aggregate;
pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use countries::{CountryCatalog, ResolvedCountry};
pub use model::{
    strip_language_prefix, AggregationResult, Product, TagCount, TagField, UNKNOWN_GRADE,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
