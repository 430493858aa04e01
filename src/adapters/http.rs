use crate::domain::model::{Comment, Post, PostId, User, UserId};
use crate::domain::ports::{ConfigProvider, Upstream};
use crate::utils::error::{AggregatorError, Result, UpstreamError, UpstreamResult};
use reqwest::Client;
use serde::de::DeserializeOwned;
use url::Url;

/// [`Upstream`] backed by a JSON REST API such as jsonplaceholder.
///
/// The `reqwest` client is passed in so one connection pool can be shared for
/// the lifetime of the process.
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    client: Client,
    base_url: Url,
}

impl HttpUpstream {
    pub fn new(client: Client, base_url: &str) -> Result<Self> {
        // 確保結尾有斜線，否則 join 會取代最後一段路徑
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };

        let base_url = Url::parse(&normalized).map_err(|e| AggregatorError::InvalidConfigValueError {
            field: "base_url".to_string(),
            value: base_url.to_string(),
            reason: format!("Invalid URL format: {}", e),
        })?;

        Ok(Self { client, base_url })
    }

    /// Builds its own client with the configured per-call timeout.
    pub fn from_config<C: ConfigProvider + ?Sized>(config: &C) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Self::new(client, config.base_url())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> UpstreamResult<T> {
        let url = self
            .base_url
            .join(path)
            .map_err(|source| UpstreamError::UrlError {
                path: path.to_string(),
                source,
            })?;

        tracing::debug!("GET {}", url);
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| UpstreamError::RequestError {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        tracing::debug!("{} -> {}", url, status);
        if !status.is_success() {
            return Err(UpstreamError::StatusError {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| UpstreamError::RequestError {
                url: url.to_string(),
                source,
            })?;

        serde_json::from_slice(&body).map_err(|source| UpstreamError::DecodeError {
            url: url.to_string(),
            source,
        })
    }
}

#[async_trait::async_trait]
impl Upstream for HttpUpstream {
    async fn list_posts(&self) -> UpstreamResult<Vec<Post>> {
        self.get_json("posts").await
    }

    async fn list_comments(&self, post_id: PostId) -> UpstreamResult<Vec<Comment>> {
        self.get_json(&format!("posts/{}/comments", post_id)).await
    }

    async fn get_user(&self, user_id: UserId) -> UpstreamResult<User> {
        self.get_json(&format!("users/{}", user_id)).await
    }
}
