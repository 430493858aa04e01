use serde::{Deserialize, Serialize};

pub type PostId = i64;
pub type UserId = i64;

/// 上游 `/posts` 回傳的文章
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub user_id: UserId,
    pub id: PostId,
    pub title: String,
    pub body: String,
}

/// 上游 `/posts/{id}/comments` 回傳的原始留言
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub post_id: PostId,
    pub id: i64,
    pub name: String,
    pub email: String,
    pub body: String,
}

/// 只保留 email 與內容的輕量留言
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightComment {
    pub email: String,
    pub body: String,
}

impl From<Comment> for LightComment {
    fn from(comment: Comment) -> Self {
        Self {
            email: comment.email,
            body: comment.body,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

/// One aggregated post: the post itself, its author and its comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub post_id: PostId,
    pub title: String,
    pub user: User,
    pub comments: Vec<LightComment>,
}

/// What the aggregator does when a single post cannot be resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Abort the whole request on the first failed post.
    #[default]
    FailFast,
    /// Drop failed posts and return the rest.
    Partial,
}

impl std::fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailurePolicy::FailFast => write!(f, "fail-fast"),
            FailurePolicy::Partial => write!(f, "partial"),
        }
    }
}
