//! Domain model and search pipeline for the havenmap service directory.
//!
//! Raw records from the store are normalized into the canonical [`Service`]
//! shape once, at the boundary; everything downstream (facet filtering,
//! distance ranking, the search state machine) operates only on `Service`.

use thiserror::Error;

pub mod app_config;
pub mod config;
pub mod distance;
pub mod filter;
pub mod normalize;
pub mod postcode;
pub mod query_state;
pub mod search;
pub mod service;
pub mod vocabulary;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use normalize::{normalize, RawRecord};
pub use search::{
    GeocodeFailure, PostcodeResolver, SearchPhase, SearchQuery, SearchSession, SearchState,
};
pub use service::{Coordinates, Service};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
