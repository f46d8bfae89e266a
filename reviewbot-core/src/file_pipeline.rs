//! Per-file pipeline, ported from `CheckFileAndComment` in
//! `examples/original_source/.../reviewer.go`.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use reviewbot_plugins::{Passback, PluginHost};
use reviewbot_remote::ReviewBoardApi;
use reviewbot_remote::types::FileDiff;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::aggregator::{self, CommentedFile};

/// Runs every checker on `file`, aggregates their comments, and submits as
/// many as the shared budget allows.
///
/// `passbacks[i]` is the passback checker `i` (same index into
/// `host.checkers()`) produced during this review's review-level check.
pub async fn run<C: ReviewBoardApi + Send + Sync + 'static>(
    file: Arc<FileDiff>,
    review_id: Arc<str>,
    reply_id: u64,
    host: Arc<PluginHost>,
    passbacks: Arc<Vec<Arc<Passback>>>,
    comment_count: Arc<AtomicI64>,
    max_comments: i64,
    client: Arc<C>,
) {
    let num_checkers = host.checkers().len();
    // A capacity-1 channel approximates the original's unbuffered channel:
    // a checker's send suspends until the aggregator (the sole consumer)
    // has drained the previous value, giving the same backpressure.
    let (tx, rx) = mpsc::channel(1);

    let aggregator_handle = tokio::spawn(aggregator::run(file.id, rx));

    let mut checker_handles = Vec::with_capacity(num_checkers);
    for i in 0..num_checkers {
        let host = Arc::clone(&host);
        let file = Arc::clone(&file);
        let passback = Arc::clone(&passbacks[i]);
        let tx = tx.clone();
        checker_handles.push(tokio::spawn(async move {
            let checker = &host.checkers()[i];
            checker.check(&file, &passback, tx).await;
        }));
    }
    drop(tx);

    for handle in checker_handles {
        if let Err(err) = handle.await {
            warn!(%err, file_id = file.id, "checker task failed, continuing with the rest");
        }
    }

    let commented: CommentedFile = match aggregator_handle.await {
        Ok(file) => file,
        Err(err) => {
            warn!(%err, file_id = file.id, "aggregator task failed, dropping this file's comments");
            return;
        }
    };

    if commented.comments.is_empty() {
        return;
    }

    let this_file_count = commented.comments.len() as i64;
    let before = comment_count.fetch_add(this_file_count, Ordering::SeqCst);
    let allowed = max_comments - before;

    debug!(
        file_id = commented.file_id,
        max_comments, before, allowed, "computed per-file comment budget"
    );

    if allowed <= 0 {
        return;
    }

    let mut sent = 0i64;
    'lines: for (&line, comments) in &commented.comments {
        for comment in comments {
            if sent >= allowed {
                break 'lines;
            }
            let result = client
                .post_comment(
                    &review_id,
                    reply_id,
                    commented.file_id,
                    line,
                    comment.span,
                    &comment.text,
                    comment.raise_issue,
                )
                .await;
            if let Err(err) = result {
                warn!(%err, file_id = commented.file_id, line, "failed to post comment");
            }
            sent += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reviewbot_plugins::Checker;
    use reviewbot_remote::errors::RbResult;
    use reviewbot_remote::types::{
        ChangeKind, DiffChunk, DiffCommentEntry, FileDiff, Line, ReplyEntry, ReviewRequestPayload,
    };
    use std::sync::Mutex;

    struct CountingChecker {
        name: &'static str,
        line: u32,
    }

    impl Checker for CountingChecker {
        fn canonical_name(&self) -> &str {
            self.name
        }

        fn configure(&mut self, _cfg: &serde_json::Value) {}

        fn check<'a>(
            &'a self,
            _file: &'a FileDiff,
            _passback: &'a Passback,
            tx: mpsc::Sender<reviewbot_plugins::Comment>,
        ) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send + 'a>> {
            let line = self.line;
            Box::pin(async move {
                let _ = tx
                    .send(reviewbot_plugins::Comment {
                        line,
                        span: 1,
                        text: "hi".to_string(),
                        raise_issue: false,
                    })
                    .await;
            })
        }
    }

    #[derive(Default)]
    struct FakeClient {
        posted: Mutex<Vec<(u32, u32)>>,
    }

    impl ReviewBoardApi for FakeClient {
        async fn get_review_request(&self, _review_id: &str) -> RbResult<ReviewRequestPayload> {
            unimplemented!()
        }
        async fn get_diffed_files(
            &self,
            _latest_diff_url: &str,
        ) -> RbResult<reviewbot_remote::types::DiffFileIndex> {
            unimplemented!()
        }
        async fn get_file_diff(
            &self,
            _entry: &reviewbot_remote::types::DiffFileEntry,
        ) -> RbResult<FileDiff> {
            unimplemented!()
        }
        async fn create_reply(&self, _review_id: &str) -> RbResult<u64> {
            unimplemented!()
        }
        async fn post_comment(
            &self,
            _review_id: &str,
            _reply_id: u64,
            _filediff_id: u64,
            first_line: u32,
            num_lines: u32,
            _text: &str,
            _raise_issue: bool,
        ) -> RbResult<()> {
            self.posted.lock().unwrap().push((first_line, num_lines));
            Ok(())
        }
        async fn list_reply_comments(
            &self,
            _review_id: &str,
            _reply_id: &str,
        ) -> RbResult<Vec<DiffCommentEntry>> {
            unimplemented!()
        }
        async fn list_replies(&self, _review_id: &str) -> RbResult<Vec<ReplyEntry>> {
            unimplemented!()
        }
        async fn drop_comment(&self, _comment_self_href: &str) -> RbResult<()> {
            unimplemented!()
        }
        async fn publish(
            &self,
            _review_id: &str,
            _reply_id: u64,
            _body_top: &str,
            _trivial: bool,
            _body_bottom: Option<&str>,
        ) -> RbResult<()> {
            unimplemented!()
        }
    }

    fn file_with(id: u64) -> Arc<FileDiff> {
        Arc::new(FileDiff {
            id,
            filename: "a.rs".into(),
            chunks: vec![DiffChunk {
                change: ChangeKind::Insert,
                lines: vec![Line {
                    review_line: 1,
                    rh_line: 1,
                    rh_text: "x".into(),
                    whitespace_only: false,
                }],
            }],
            entire_file: Vec::new(),
        })
    }

    #[tokio::test]
    async fn posts_comments_within_budget() {
        let checkers: Vec<Box<dyn Checker>> = vec![
            Box::new(CountingChecker { name: "a", line: 1 }),
            Box::new(CountingChecker { name: "b", line: 2 }),
        ];
        let host = Arc::new(PluginHost::with_checkers(checkers));
        let passbacks = Arc::new(vec![Arc::new(Box::new(()) as Passback), Arc::new(Box::new(()) as Passback)]);
        let client = Arc::new(FakeClient::default());
        let comment_count = Arc::new(AtomicI64::new(0));

        run(
            file_with(1),
            Arc::from("42"),
            9,
            host,
            passbacks,
            comment_count,
            10,
            Arc::clone(&client),
        )
        .await;

        assert_eq!(client.posted.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn respects_zero_budget() {
        let checkers: Vec<Box<dyn Checker>> = vec![Box::new(CountingChecker { name: "a", line: 1 })];
        let host = Arc::new(PluginHost::with_checkers(checkers));
        let passbacks = Arc::new(vec![Arc::new(Box::new(()) as Passback)]);
        let client = Arc::new(FakeClient::default());
        let comment_count = Arc::new(AtomicI64::new(5));

        run(
            file_with(1),
            Arc::from("42"),
            9,
            host,
            passbacks,
            comment_count,
            5,
            Arc::clone(&client),
        )
        .await;

        assert_eq!(client.posted.lock().unwrap().len(), 0);
    }
}
