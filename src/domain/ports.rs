use crate::domain::model::{Comment, FailurePolicy, Post, PostId, User, UserId};
use crate::utils::error::UpstreamResult;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// The remote REST API the aggregator reads from.
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn list_posts(&self) -> UpstreamResult<Vec<Post>>;
    async fn list_comments(&self, post_id: PostId) -> UpstreamResult<Vec<Comment>>;
    async fn get_user(&self, user_id: UserId) -> UpstreamResult<User>;
}

#[async_trait]
impl<T: Upstream + ?Sized> Upstream for Arc<T> {
    async fn list_posts(&self) -> UpstreamResult<Vec<Post>> {
        (**self).list_posts().await
    }

    async fn list_comments(&self, post_id: PostId) -> UpstreamResult<Vec<Comment>> {
        (**self).list_comments(post_id).await
    }

    async fn get_user(&self, user_id: UserId) -> UpstreamResult<User> {
        (**self).get_user(user_id).await
    }
}

pub trait ConfigProvider: Send + Sync {
    fn base_url(&self) -> &str;
    fn cache_ttl(&self) -> Duration;
    fn concurrency_limit(&self) -> usize;
    fn request_timeout(&self) -> Duration;
    fn failure_policy(&self) -> FailurePolicy;
}
