use crate::core::assembler::{assemble, project_all};
use crate::core::cache::TtlCache;
use crate::domain::model::{Comment, FailurePolicy, Post, PostId, Response, User, UserId};
use crate::domain::ports::{ConfigProvider, Upstream};
use crate::utils::error::{AggregationError, FetchStage, PostFailure, Result, UpstreamResult};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60);
pub const DEFAULT_CONCURRENCY_LIMIT: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatorSettings {
    /// How long comments and users stay cached.
    pub cache_ttl: Duration,
    /// Maximum number of posts fetching comments and user at the same time.
    pub concurrency_limit: usize,
    pub failure_policy: FailurePolicy,
}

impl Default for AggregatorSettings {
    fn default() -> Self {
        Self {
            cache_ttl: DEFAULT_CACHE_TTL,
            concurrency_limit: DEFAULT_CONCURRENCY_LIMIT,
            failure_policy: FailurePolicy::FailFast,
        }
    }
}

impl AggregatorSettings {
    pub fn from_config<C: ConfigProvider + ?Sized>(config: &C) -> Self {
        Self {
            cache_ttl: config.cache_ttl(),
            concurrency_limit: config.concurrency_limit(),
            failure_policy: config.failure_policy(),
        }
    }

    pub fn with_cache_ttl(mut self, cache_ttl: Duration) -> Self {
        self.cache_ttl = cache_ttl;
        self
    }

    pub fn with_concurrency_limit(mut self, concurrency_limit: usize) -> Self {
        self.concurrency_limit = concurrency_limit;
        self
    }

    pub fn with_failure_policy(mut self, failure_policy: FailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }
}

/// Fans out one comments fetch and one user fetch per post, joins them and
/// assembles the composite responses.
///
/// Nothing is spawned: every fetch runs inside the future returned by
/// [`Aggregator::aggregate`], so dropping that future cancels queued and
/// in-flight work alike.
pub struct Aggregator<U> {
    upstream: U,
    comments: TtlCache<PostId, Vec<Comment>>,
    users: TtlCache<UserId, User>,
    settings: AggregatorSettings,
}

impl<U: Upstream> Aggregator<U> {
    pub fn new(upstream: U, settings: AggregatorSettings) -> Self {
        Self {
            comments: TtlCache::new("comments", settings.cache_ttl),
            users: TtlCache::new("users", settings.cache_ttl),
            upstream,
            settings,
        }
    }

    pub fn settings(&self) -> &AggregatorSettings {
        &self.settings
    }

    pub fn comments_cache(&self) -> &TtlCache<PostId, Vec<Comment>> {
        &self.comments
    }

    pub fn users_cache(&self) -> &TtlCache<UserId, User> {
        &self.users
    }

    pub async fn comments_for(&self, post_id: PostId) -> UpstreamResult<Vec<Comment>> {
        self.comments
            .get(post_id, || self.upstream.list_comments(post_id))
            .await
    }

    pub async fn user_for(&self, user_id: UserId) -> UpstreamResult<User> {
        self.users
            .get(user_id, || self.upstream.get_user(user_id))
            .await
    }

    /// Fetches a fresh post list and aggregates every post in it.
    pub async fn aggregate(&self) -> Result<Vec<Response>> {
        let started = Instant::now();

        let posts = self.upstream.list_posts().await?;
        info!("Fetched {} posts from upstream", posts.len());

        let responses = self.aggregate_posts(posts).await?;
        info!(
            "Aggregated {} posts in {:?}",
            responses.len(),
            started.elapsed()
        );

        Ok(responses)
    }

    /// Aggregates the given posts. Responses come back in the order of `posts`.
    pub async fn aggregate_posts(&self, posts: Vec<Post>) -> Result<Vec<Response>> {
        let total = posts.len();
        let limit = self.settings.concurrency_limit.max(1);
        debug!(
            "Processing {} posts, at most {} in flight, policy {}",
            total, limit, self.settings.failure_policy
        );

        // 建立每篇文章的工作，buffer_unordered 控制同時進行的數量
        let work: Vec<_> = posts
            .into_iter()
            .enumerate()
            .map(|(index, post)| self.process_indexed(index, post))
            .collect();

        let mut completed: Vec<(usize, Response)> = match self.settings.failure_policy {
            FailurePolicy::FailFast => stream::iter(work)
                .buffer_unordered(limit)
                .try_collect()
                .await
                .map_err(|failure| {
                    warn!("Aborting aggregation: {}", failure);
                    AggregationError::new(vec![failure])
                })?,
            FailurePolicy::Partial => {
                let outcomes: Vec<_> = stream::iter(work).buffer_unordered(limit).collect().await;

                let mut completed = Vec::with_capacity(outcomes.len());
                let mut failures = Vec::new();
                for outcome in outcomes {
                    match outcome {
                        Ok(done) => completed.push(done),
                        Err(failure) => {
                            warn!("Skipping {}", failure);
                            failures.push(failure);
                        }
                    }
                }

                if completed.is_empty() && !failures.is_empty() {
                    return Err(AggregationError::new(failures).into());
                }
                if !failures.is_empty() {
                    warn!("{} of {} posts were skipped", failures.len(), total);
                }
                completed
            }
        };

        // 完成順序不固定，依原始索引排回輸入順序
        completed.sort_unstable_by_key(|(index, _)| *index);
        Ok(completed.into_iter().map(|(_, response)| response).collect())
    }

    async fn process_indexed(
        &self,
        index: usize,
        post: Post,
    ) -> std::result::Result<(usize, Response), PostFailure> {
        self.process_post(post)
            .await
            .map(|response| (index, response))
    }

    /// Fetches comments and user for one post concurrently and joins them.
    ///
    /// The first failure drops the sibling fetch.
    pub async fn process_post(&self, post: Post) -> std::result::Result<Response, PostFailure> {
        let post_id = post.id;
        let user_id = post.user_id;
        debug!("Post {} in flight", post_id);

        let (comments, user) = tokio::try_join!(
            async {
                self.comments_for(post_id)
                    .await
                    .map_err(|e| PostFailure::new(post_id, FetchStage::Comments, e))
            },
            async {
                self.user_for(user_id)
                    .await
                    .map_err(|e| PostFailure::new(post_id, FetchStage::User, e))
            },
        )?;

        debug!("Post {} resolved with {} comments", post_id, comments.len());
        Ok(assemble(post, user, project_all(comments)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedConfig;

    impl ConfigProvider for FixedConfig {
        fn base_url(&self) -> &str {
            "http://localhost/"
        }

        fn cache_ttl(&self) -> Duration {
            Duration::from_secs(5)
        }

        fn concurrency_limit(&self) -> usize {
            2
        }

        fn request_timeout(&self) -> Duration {
            Duration::from_secs(1)
        }

        fn failure_policy(&self) -> FailurePolicy {
            FailurePolicy::Partial
        }
    }

    #[test]
    fn test_default_settings() {
        let settings = AggregatorSettings::default();

        assert_eq!(settings.cache_ttl, Duration::from_secs(60));
        assert_eq!(settings.concurrency_limit, 4);
        assert_eq!(settings.failure_policy, FailurePolicy::FailFast);
    }

    #[test]
    fn test_settings_from_config() {
        let settings = AggregatorSettings::from_config(&FixedConfig);

        assert_eq!(
            settings,
            AggregatorSettings::default()
                .with_cache_ttl(Duration::from_secs(5))
                .with_concurrency_limit(2)
                .with_failure_policy(FailurePolicy::Partial)
        );
    }
}
