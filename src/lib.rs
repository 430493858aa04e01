pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;

pub use crate::adapters::http::HttpUpstream;
pub use crate::config::toml_config::TomlConfig;
pub use crate::core::aggregator::{Aggregator, AggregatorSettings};
pub use crate::core::cache::{CacheStats, TtlCache};
pub use crate::domain::model::{Comment, FailurePolicy, LightComment, Post, Response, User};
pub use crate::domain::ports::{ConfigProvider, Upstream};
pub use crate::utils::error::{AggregationError, AggregatorError, Result, UpstreamError};
