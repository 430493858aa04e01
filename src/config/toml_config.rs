use crate::config::{
    DEFAULT_CACHE_TTL_SECS, DEFAULT_CONCURRENCY_LIMIT, DEFAULT_TIMEOUT_SECS, MAX_CONCURRENCY_LIMIT,
};
use crate::domain::model::FailurePolicy;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{AggregatorError, Result};
use crate::utils::validation::{validate_positive_number, validate_range, validate_url, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub aggregation: AggregationConfig,
    pub server: Option<ServerConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheConfig {
    pub ttl_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregationConfig {
    pub concurrency_limit: Option<usize>,
    pub failure_policy: Option<FailurePolicy>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind: String,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(AggregatorError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| AggregatorError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${UPSTREAM_BASE_URL})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| AggregatorError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 取得服務綁定位址
    pub fn bind(&self) -> Option<&str> {
        self.server.as_ref().map(|s| s.bind.as_str())
    }
}

impl ConfigProvider for TomlConfig {
    fn base_url(&self) -> &str {
        &self.upstream.base_url
    }

    fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_seconds.unwrap_or(DEFAULT_CACHE_TTL_SECS))
    }

    fn concurrency_limit(&self) -> usize {
        self.aggregation
            .concurrency_limit
            .unwrap_or(DEFAULT_CONCURRENCY_LIMIT)
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    fn failure_policy(&self) -> FailurePolicy {
        self.aggregation.failure_policy.unwrap_or_default()
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        // 驗證上游 API 位址
        validate_url("upstream.base_url", &self.upstream.base_url)?;

        if let Some(timeout) = self.upstream.timeout_seconds {
            validate_positive_number("upstream.timeout_seconds", timeout, 1)?;
        }

        if let Some(ttl) = self.cache.ttl_seconds {
            validate_positive_number("cache.ttl_seconds", ttl, 1)?;
        }

        // 驗證並發數
        if let Some(limit) = self.aggregation.concurrency_limit {
            validate_range("aggregation.concurrency_limit", limit, 1, MAX_CONCURRENCY_LIMIT)?;
        }

        if let Some(server) = &self.server {
            if server.bind.parse::<std::net::SocketAddr>().is_err() {
                return Err(AggregatorError::InvalidConfigValueError {
                    field: "server.bind".to_string(),
                    value: server.bind.clone(),
                    reason: "Expected a socket address such as 127.0.0.1:8080".to_string(),
                });
            }
        }

        Ok(())
    }
}
