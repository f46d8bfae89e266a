//! Top-comment composition and publication, ported from
//! `GenerateTopComment` in
//! `examples/original_source/.../reviewcomment.go` and `PublishReview` in
//! `reviewer.go`. Template selection uses `rand` in place of Go's
//! `math/rand.Intn`.

use rand::seq::SliceRandom;
use reviewbot_remote::ReviewBoardApi;
use tracing::warn;

use crate::config::CommentsConfig;

/// Builds the top comment body for a reply.
pub fn generate_top_comment(
    comments: &CommentsConfig,
    seen_before: bool,
    requester: &str,
    commented: bool,
    extra_comment: &str,
) -> String {
    let mut body = String::new();

    if !commented {
        if let Some(phrase) = comments.top.perfect_review.choose(&mut rand::thread_rng()) {
            body.push_str(phrase);
            body.push_str("\n\n");
        }
    } else {
        let pool = if seen_before {
            &comments.top.seen_before
        } else {
            &comments.top.new_review
        };
        if let Some(phrase) = pool.choose(&mut rand::thread_rng()) {
            body.push_str(phrase);
            body.push(' ');
            body.push_str(requester);
            body.push_str("\n\n");
        }
    }

    if !extra_comment.is_empty() {
        body.push_str("Extra comments:\n\n");
        body.push_str(extra_comment);
    }

    body
}

/// Publishes the reply, choosing `trivial`/`body_bottom` based on whether
/// any comments were actually attached.
pub async fn publish<C: ReviewBoardApi>(
    client: &C,
    comments: &CommentsConfig,
    email_on_perfect: bool,
    review_id: &str,
    reply_id: u64,
    seen_before: bool,
    requester: &str,
    commented: bool,
    extra_comment: &str,
) {
    let top = generate_top_comment(comments, seen_before, requester, commented, extra_comment);
    let trivial = !email_on_perfect && !commented;

    let bottom_template = if seen_before {
        &comments.bottom.seen_review
    } else {
        &comments.bottom.new_review
    };
    let bottom = if !seen_before && !bottom_template.is_empty() {
        Some(bottom_template.as_str())
    } else {
        None
    };

    if let Err(err) = client
        .publish(review_id, reply_id, &top, trivial, bottom)
        .await
    {
        warn!(%err, review_id, reply_id, "failed to publish review reply");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BottomComments, TopComments};

    fn comments_config() -> CommentsConfig {
        CommentsConfig {
            top: TopComments {
                new_review: vec!["New review incoming".to_string()],
                seen_before: vec!["Seen this before".to_string()],
                perfect_review: vec!["Looks perfect".to_string()],
            },
            bottom: BottomComments::default(),
            drop_previous_comments: false,
            max_comments: 10,
            max_comment_comment: String::new(),
        }
    }

    #[test]
    fn perfect_review_has_no_requester_interpolation() {
        let cfg = comments_config();
        let body = generate_top_comment(&cfg, false, "alice", false, "");
        assert_eq!(body, "Looks perfect\n\n");
    }

    #[test]
    fn commented_review_interpolates_requester() {
        let cfg = comments_config();
        let body = generate_top_comment(&cfg, false, "alice", true, "");
        assert_eq!(body, "New review incoming alice\n\n");
    }

    #[test]
    fn extra_comment_is_appended() {
        let cfg = comments_config();
        let body = generate_top_comment(&cfg, true, "bob", true, "watch out for X");
        assert_eq!(body, "Seen this before bob\n\nExtra comments:\n\nwatch out for X");
    }
}
