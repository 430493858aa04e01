//! Pure projection and merge steps used by the aggregator.

use crate::domain::model::{Comment, LightComment, Post, Response, User};

pub fn project(comment: Comment) -> LightComment {
    LightComment::from(comment)
}

/// Projects every comment, keeping the upstream order.
pub fn project_all(comments: Vec<Comment>) -> Vec<LightComment> {
    comments.into_iter().map(project).collect()
}

pub fn assemble(post: Post, user: User, comments: Vec<LightComment>) -> Response {
    Response {
        post_id: post.id,
        title: post.title,
        user,
        comments,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(id: i64, email: &str, body: &str) -> Comment {
        Comment {
            post_id: 1,
            id,
            name: format!("N{}", id),
            email: email.to_string(),
            body: body.to_string(),
        }
    }

    #[test]
    fn test_project_keeps_email_and_body() {
        let light = project(comment(1, "e@x.com", "hi"));

        assert_eq!(
            light,
            LightComment {
                email: "e@x.com".to_string(),
                body: "hi".to_string(),
            }
        );
    }

    #[test]
    fn test_assemble_maps_fields() {
        let post = Post {
            user_id: 1,
            id: 1,
            title: "T".to_string(),
            body: "B".to_string(),
        };
        let user = User {
            id: 1,
            name: "U".to_string(),
            email: "u@x.com".to_string(),
        };

        let response = assemble(post, user.clone(), project_all(vec![comment(1, "e@x.com", "hi")]));

        assert_eq!(response.post_id, 1);
        assert_eq!(response.title, "T");
        assert_eq!(response.user, user);
        assert_eq!(response.comments.len(), 1);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "postId": 1,
                "title": "T",
                "user": {"id": 1, "name": "U", "email": "u@x.com"},
                "comments": [{"email": "e@x.com", "body": "hi"}]
            })
        );
    }

    #[test]
    fn test_project_all_preserves_count_and_order() {
        let comments = (1..=5)
            .map(|i| comment(i, &format!("c{}@x.com", i), &format!("body {}", i)))
            .collect::<Vec<_>>();

        let light = project_all(comments);

        assert_eq!(light.len(), 5);
        let emails: Vec<&str> = light.iter().map(|c| c.email.as_str()).collect();
        assert_eq!(
            emails,
            vec!["c1@x.com", "c2@x.com", "c3@x.com", "c4@x.com", "c5@x.com"]
        );
    }

    #[test]
    fn test_assemble_with_no_comments() {
        let post = Post {
            user_id: 2,
            id: 9,
            title: "Empty".to_string(),
            body: String::new(),
        };
        let user = User {
            id: 2,
            name: "Ervin".to_string(),
            email: "ervin@x.com".to_string(),
        };

        let response = assemble(post, user, project_all(Vec::new()));

        assert_eq!(response.post_id, 9);
        assert!(response.comments.is_empty());
    }
}
