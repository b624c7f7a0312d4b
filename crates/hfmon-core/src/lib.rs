//! Shared domain types and configuration for the hfmon media monitor.

pub mod app_config;
pub mod config;
pub mod error;
pub mod types;
pub mod watchlist;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use error::{ConfigError, CoreError};
pub use types::{
    document_id, Channel, CollectState, CollectStatus, Granularity, RawDocument, Sentiment,
};
pub use watchlist::{load_watchlist, parse_watchlist, Gallery, Watchlist};
