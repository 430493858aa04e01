pub mod toml_config;

#[cfg(feature = "cli")]
use crate::domain::model::FailurePolicy;
#[cfg(feature = "cli")]
use crate::domain::ports::ConfigProvider;
#[cfg(feature = "cli")]
use crate::utils::validation::{validate_positive_number, validate_range, validate_url, Validate};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use std::path::PathBuf;
#[cfg(feature = "cli")]
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://jsonplaceholder.typicode.com/";
pub const DEFAULT_CACHE_TTL_SECS: u64 = 60;
pub const DEFAULT_CONCURRENCY_LIMIT: usize = 4;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const MAX_CONCURRENCY_LIMIT: usize = 64;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "post-aggregator")]
#[command(about = "Aggregates posts with their author and comments from a JSON REST API")]
pub struct CliConfig {
    #[arg(long, env = "UPSTREAM_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    #[arg(long, env = "CACHE_TTL_SECS", default_value_t = DEFAULT_CACHE_TTL_SECS)]
    pub cache_ttl_secs: u64,

    #[arg(long, env = "CONCURRENCY_LIMIT", default_value_t = DEFAULT_CONCURRENCY_LIMIT)]
    pub concurrency: usize,

    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    #[arg(long, help = "Skip posts that fail instead of failing the whole request")]
    pub partial: bool,

    #[arg(
        long,
        help = "Load settings from a TOML file; --base-url, --cache-ttl-secs, --concurrency, --timeout-secs and --partial are then ignored"
    )]
    pub config: Option<PathBuf>,

    #[arg(long, env = "BIND_ADDR", help = "Serve GET /api on this address instead of printing once")]
    pub serve: Option<String>,

    #[arg(long, help = "Pretty-print the JSON output")]
    pub pretty: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// Upstream and aggregation flags set away from their defaults. A TOML
    /// file given with `--config` takes their place, so these go unused.
    pub fn ignored_with_config_file(&self) -> Vec<&'static str> {
        let mut ignored = Vec::new();
        if self.base_url != DEFAULT_BASE_URL {
            ignored.push("--base-url");
        }
        if self.cache_ttl_secs != DEFAULT_CACHE_TTL_SECS {
            ignored.push("--cache-ttl-secs");
        }
        if self.concurrency != DEFAULT_CONCURRENCY_LIMIT {
            ignored.push("--concurrency");
        }
        if self.timeout_secs != DEFAULT_TIMEOUT_SECS {
            ignored.push("--timeout-secs");
        }
        if self.partial {
            ignored.push("--partial");
        }
        ignored
    }
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    fn concurrency_limit(&self) -> usize {
        self.concurrency
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn failure_policy(&self) -> FailurePolicy {
        if self.partial {
            FailurePolicy::Partial
        } else {
            FailurePolicy::FailFast
        }
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> crate::utils::error::Result<()> {
        validate_url("base_url", &self.base_url)?;
        validate_positive_number("cache_ttl_secs", self.cache_ttl_secs, 1)?;
        validate_positive_number("timeout_secs", self.timeout_secs, 1)?;
        validate_range("concurrency", self.concurrency, 1, MAX_CONCURRENCY_LIMIT)?;
        Ok(())
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let config = CliConfig::try_parse_from(["post-aggregator"]).unwrap();

        assert_eq!(config.base_url(), DEFAULT_BASE_URL);
        assert_eq!(config.cache_ttl(), Duration::from_secs(60));
        assert_eq!(config.concurrency_limit(), 4);
        assert_eq!(config.failure_policy(), FailurePolicy::FailFast);
        assert!(config.serve.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cli_flags() {
        let config = CliConfig::try_parse_from([
            "post-aggregator",
            "--base-url",
            "http://127.0.0.1:3000",
            "--concurrency",
            "8",
            "--partial",
            "--serve",
            "0.0.0.0:8080",
        ])
        .unwrap();

        assert_eq!(config.base_url(), "http://127.0.0.1:3000");
        assert_eq!(config.concurrency_limit(), 8);
        assert_eq!(config.failure_policy(), FailurePolicy::Partial);
        assert_eq!(config.serve.as_deref(), Some("0.0.0.0:8080"));
    }

    #[test]
    fn test_cli_validation_rejects_zero_concurrency() {
        let config = CliConfig::try_parse_from(["post-aggregator", "--concurrency", "0"]).unwrap();

        let err = config.validate().unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_flags_overridden_by_config_file() {
        let defaults = CliConfig::try_parse_from(["post-aggregator", "--config", "agg.toml"]).unwrap();
        assert!(defaults.ignored_with_config_file().is_empty());

        let config = CliConfig::try_parse_from([
            "post-aggregator",
            "--config",
            "agg.toml",
            "--concurrency",
            "8",
            "--partial",
            "--serve",
            "127.0.0.1:8080",
        ])
        .unwrap();

        assert_eq!(config.ignored_with_config_file(), vec!["--concurrency", "--partial"]);
    }
}
