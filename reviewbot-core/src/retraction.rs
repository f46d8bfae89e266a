//! Retraction engine, ported from `DropPreviousComments` and
//! `DropCommentsFromReply` in `examples/original_source/.../reviewer.go`.
//! Best-effort: failures are logged and do not abort the review.

use std::sync::Arc;

use reviewbot_remote::ReviewBoardApi;
use tokio::sync::Semaphore;
use tracing::{info, warn};

const MAX_CONCURRENT_DROPS: usize = 10;

/// Drops every still-open issue comment on the bot's prior reply to
/// `review_id`, or (if no prior reply id was recorded) on every reply
/// authored by `bot_username`.
pub async fn drop_previous_comments<C: ReviewBoardApi + Send + Sync + 'static>(
    client: &Arc<C>,
    review_id: &str,
    last_reply_id: Option<&str>,
    bot_username: &str,
) {
    match last_reply_id {
        Some(reply_id) => drop_comments_from_reply(client, review_id, reply_id).await,
        None => {
            let replies = match client.list_replies(review_id).await {
                Ok(replies) => replies,
                Err(err) => {
                    warn!(%err, review_id, "could not list replies for retraction");
                    return;
                }
            };
            for reply in replies {
                if reply.links.user.title == bot_username {
                    drop_comments_from_reply(client, review_id, &reply.id.to_string()).await;
                }
            }
        }
    }
}

async fn drop_comments_from_reply<C: ReviewBoardApi + Send + Sync + 'static>(
    client: &Arc<C>,
    review_id: &str,
    reply_id: &str,
) {
    let comments = match client.list_reply_comments(review_id, reply_id).await {
        Ok(comments) => comments,
        Err(err) => {
            warn!(%err, review_id, reply_id, "could not retrieve diff comments for retraction");
            return;
        }
    };

    let to_drop: Vec<String> = comments
        .into_iter()
        .filter(|c| c.issue_opened && c.issue_status == "open")
        .map(|c| c.links.self_link.href)
        .collect();

    info!(
        review_id,
        reply_id,
        count = to_drop.len(),
        "dropping previously issued comments"
    );

    let semaphore = Arc::new(Semaphore::new(MAX_CONCURRENT_DROPS));
    let mut handles = Vec::with_capacity(to_drop.len());
    for href in to_drop {
        let client = Arc::clone(client);
        let semaphore = Arc::clone(&semaphore);
        handles.push(tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await.expect("semaphore never closed");
            if let Err(err) = client.drop_comment(&href).await {
                warn!(%err, href, "failed to drop comment");
            }
        }));
    }

    for handle in handles {
        if let Err(err) = handle.await {
            warn!(%err, "retraction task panicked");
        }
    }

    info!(review_id, reply_id, "retraction complete");
}
