#![allow(dead_code)]

use async_trait::async_trait;
use post_aggregator::domain::model::{PostId, UserId};
use post_aggregator::utils::error::UpstreamResult;
use post_aggregator::{Comment, Post, Upstream, UpstreamError, User};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// In-memory upstream with call counters and an optional gate that holds
/// every user fetch until the test hands out permits.
#[derive(Default)]
pub struct FakeUpstream {
    posts: Vec<Post>,
    comments: HashMap<PostId, Vec<Comment>>,
    users: HashMap<UserId, User>,
    failing_users: HashSet<UserId>,
    failing_comments: HashSet<PostId>,
    gate: Option<Arc<Semaphore>>,
    pub post_calls: AtomicUsize,
    pub comment_calls: AtomicUsize,
    pub user_calls: AtomicUsize,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl FakeUpstream {
    /// Posts 1..=count, each written by the user with the same id and
    /// carrying two comments.
    pub fn with_posts(count: i64) -> Self {
        let mut fake = Self::default();
        for id in 1..=count {
            fake.posts.push(Post {
                user_id: id,
                id,
                title: format!("Post {}", id),
                body: format!("Body {}", id),
            });
            fake.comments.insert(
                id,
                (1..=2)
                    .map(|n| Comment {
                        post_id: id,
                        id: id * 10 + n,
                        name: format!("Comment {}", n),
                        email: format!("c{}@post{}.com", n, id),
                        body: format!("comment {} on post {}", n, id),
                    })
                    .collect(),
            );
            fake.users.insert(
                id,
                User {
                    id,
                    name: format!("User {}", id),
                    email: format!("user{}@x.com", id),
                },
            );
        }
        fake
    }

    pub fn with_shared_author(mut self, user_id: UserId) -> Self {
        for post in &mut self.posts {
            post.user_id = user_id;
        }
        self
    }

    pub fn fail_user(mut self, user_id: UserId) -> Self {
        self.failing_users.insert(user_id);
        self
    }

    pub fn fail_comments(mut self, post_id: PostId) -> Self {
        self.failing_comments.insert(post_id);
        self
    }

    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn calls(&self) -> (usize, usize, usize) {
        (
            self.post_calls.load(Ordering::SeqCst),
            self.comment_calls.load(Ordering::SeqCst),
            self.user_calls.load(Ordering::SeqCst),
        )
    }
}

struct InFlight<'a>(&'a FakeUpstream);

impl<'a> InFlight<'a> {
    fn enter(fake: &'a FakeUpstream) -> Self {
        let now = fake.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        fake.max_in_flight.fetch_max(now, Ordering::SeqCst);
        Self(fake)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Upstream for FakeUpstream {
    async fn list_posts(&self) -> UpstreamResult<Vec<Post>> {
        self.post_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.posts.clone())
    }

    async fn list_comments(&self, post_id: PostId) -> UpstreamResult<Vec<Comment>> {
        self.comment_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_comments.contains(&post_id) {
            return Err(UpstreamError::StatusError {
                url: format!("fake://posts/{}/comments", post_id),
                status: 500,
            });
        }
        Ok(self.comments.get(&post_id).cloned().unwrap_or_default())
    }

    async fn get_user(&self, user_id: UserId) -> UpstreamResult<User> {
        self.user_calls.fetch_add(1, Ordering::SeqCst);
        let _in_flight = InFlight::enter(self);

        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("gate closed").forget();
        }

        if self.failing_users.contains(&user_id) {
            return Err(UpstreamError::StatusError {
                url: format!("fake://users/{}", user_id),
                status: 500,
            });
        }
        self.users
            .get(&user_id)
            .cloned()
            .ok_or_else(|| UpstreamError::StatusError {
                url: format!("fake://users/{}", user_id),
                status: 404,
            })
    }
}
