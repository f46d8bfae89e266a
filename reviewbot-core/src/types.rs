//! Review pipeline data model.

use tokio::sync::oneshot;

/// The outcome of one review, delivered exactly once per [`ReviewRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewResult {
    pub num_comments: i64,
}

/// A single-use result channel that guarantees exactly-once delivery: if
/// the pipeline never explicitly sends (an early return, a panic unwind),
/// dropping the sink still delivers `NumComments: 0` rather than silently
/// leaking the caller's receiver.
pub struct ResultSink(Option<oneshot::Sender<ReviewResult>>);

impl ResultSink {
    pub fn new(tx: oneshot::Sender<ReviewResult>) -> Self {
        Self(Some(tx))
    }

    pub fn send(&mut self, num_comments: i64) {
        if let Some(tx) = self.0.take() {
            let _ = tx.send(ReviewResult { num_comments });
        }
    }
}

impl Drop for ResultSink {
    fn drop(&mut self) {
        if let Some(tx) = self.0.take() {
            let _ = tx.send(ReviewResult { num_comments: 0 });
        }
    }
}

/// One incoming review request, produced by the ingestion boundary.
///
/// `id` stays `0` until the pipeline enriches it from the review-id string;
/// everything else is set by ingestion up front.
pub struct ReviewRequest {
    pub review_id: String,
    pub id: u64,
    pub summary: String,
    pub requester: String,
    pub latest_diff_url: String,
    pub force: bool,
    pub seen_before: bool,
    pub result: ResultSink,
}

impl ReviewRequest {
    /// A request that still needs enrichment (`id == 0`, everything else
    /// empty) — the common case for ingestion, which knows only the id
    /// string and the force flag.
    pub fn unenriched(review_id: String, force: bool, result_tx: oneshot::Sender<ReviewResult>) -> Self {
        Self {
            review_id,
            id: 0,
            summary: String::new(),
            requester: String::new(),
            latest_diff_url: String::new(),
            force,
            seen_before: false,
            result: ResultSink::new(result_tx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dropping_unsent_sink_delivers_zero() {
        let (tx, rx) = oneshot::channel();
        {
            let _sink = ResultSink::new(tx);
        }
        let result = rx.await.unwrap();
        assert_eq!(result.num_comments, 0);
    }

    #[tokio::test]
    async fn explicit_send_is_delivered_and_idempotent() {
        let (tx, rx) = oneshot::channel();
        let mut sink = ResultSink::new(tx);
        sink.send(5);
        sink.send(9); // no-op, already sent
        let result = rx.await.unwrap();
        assert_eq!(result.num_comments, 5);
    }
}
