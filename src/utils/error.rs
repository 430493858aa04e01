use crate::domain::model::PostId;
use thiserror::Error;

/// Failure of a single call against the upstream API.
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("Request to {url} failed: {source}")]
    RequestError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Upstream returned HTTP {status} for {url}")]
    StatusError { url: String, status: u16 },

    #[error("Could not decode response from {url}: {source}")]
    DecodeError {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid upstream path {path}: {source}")]
    UrlError {
        path: String,
        #[source]
        source: url::ParseError,
    },
}

pub type UpstreamResult<T> = std::result::Result<T, UpstreamError>;

/// Which of the two per-post fetches failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStage {
    Comments,
    User,
}

impl std::fmt::Display for FetchStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchStage::Comments => write!(f, "comments"),
            FetchStage::User => write!(f, "user"),
        }
    }
}

#[derive(Error, Debug)]
#[error("post {post_id}: {stage} fetch failed: {source}")]
pub struct PostFailure {
    pub post_id: PostId,
    pub stage: FetchStage,
    #[source]
    pub source: UpstreamError,
}

impl PostFailure {
    pub fn new(post_id: PostId, stage: FetchStage, source: UpstreamError) -> Self {
        Self {
            post_id,
            stage,
            source,
        }
    }
}

/// One or more posts could not be aggregated.
#[derive(Error, Debug)]
#[error("Aggregation failed for {} post(s): {}", .failures.len(), summarize(.failures))]
pub struct AggregationError {
    pub failures: Vec<PostFailure>,
}

impl AggregationError {
    pub fn new(failures: Vec<PostFailure>) -> Self {
        Self { failures }
    }

    pub fn failed_post_ids(&self) -> Vec<PostId> {
        self.failures.iter().map(|f| f.post_id).collect()
    }
}

fn summarize(failures: &[PostFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Error, Debug)]
pub enum AggregatorError {
    #[error("Upstream error: {0}")]
    UpstreamError(#[from] UpstreamError),

    #[error(transparent)]
    AggregationError(#[from] AggregationError),

    #[error("HTTP client error: {0}")]
    ClientError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

impl AggregatorError {
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            AggregatorError::ConfigError { .. } | AggregatorError::InvalidConfigValueError { .. }
        )
    }

    /// Post ids that failed, empty unless this is an aggregation failure.
    pub fn failed_post_ids(&self) -> Vec<PostId> {
        match self {
            AggregatorError::AggregationError(e) => e.failed_post_ids(),
            _ => Vec::new(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            AggregatorError::UpstreamError(_) => "Could not fetch the post list from the upstream API".to_string(),
            AggregatorError::AggregationError(e) => format!(
                "Could not aggregate {} post(s): {:?}",
                e.failures.len(),
                e.failed_post_ids()
            ),
            AggregatorError::ClientError(_) => "Could not create the HTTP client".to_string(),
            AggregatorError::IoError(e) => format!("I/O failure: {}", e),
            AggregatorError::SerializationError(_) => "Could not serialize the aggregated result".to_string(),
            AggregatorError::ConfigError { message } => format!("Invalid configuration: {}", message),
            AggregatorError::InvalidConfigValueError { field, reason, .. } => {
                format!("Invalid configuration value for {}: {}", field, reason)
            }
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            AggregatorError::UpstreamError(_) | AggregatorError::AggregationError(_) => {
                "Check that the upstream base URL is reachable and try again"
            }
            AggregatorError::ClientError(_) => "Check the TLS setup and the request timeout",
            AggregatorError::IoError(_) => "Check file permissions and the bind address",
            AggregatorError::SerializationError(_) => "Report this as a bug",
            AggregatorError::ConfigError { .. } | AggregatorError::InvalidConfigValueError { .. } => {
                "Fix the configuration flags or the TOML file and run again"
            }
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            AggregatorError::ConfigError { .. } | AggregatorError::InvalidConfigValueError { .. } => 1,
            AggregatorError::UpstreamError(_)
            | AggregatorError::AggregationError(_)
            | AggregatorError::ClientError(_) => 2,
            AggregatorError::IoError(_) | AggregatorError::SerializationError(_) => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, AggregatorError>;
