//! The review pipeline: one-shot coordinator per request, ported
//! from `DoReview` in `examples/original_source/.../reviewer.go`.
//!
//! State machine: `Received -> Populated -> DecisionMade ->
//! (Ignored | Reviewed) -> Finalized`. Every exit path ends by calling
//! `request.result.send(...)`; [`crate::types::ResultSink`]'s `Drop` impl
//! is the backstop for any path that doesn't.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use reviewbot_plugins::{Passback, PluginHost, ReviewView};
use reviewbot_remote::ReviewBoardApi;
use reviewbot_remote::types::FileDiff;
use reviewbot_store::Store;
use tokio::sync::{Semaphore, mpsc};
use tracing::{info, warn};

use crate::config::CompiledConfig;
use crate::types::ReviewRequest;
use crate::{file_pipeline, retraction, top_comment};

fn rld_key(review_id: &str) -> String {
    format!("RLD{review_id}")
}

fn last_reply_key(review_id: &str) -> String {
    format!("LastReplyId_{review_id}")
}

/// Runs one review request to completion.
pub async fn run<C: ReviewBoardApi + Send + Sync + 'static>(
    mut request: ReviewRequest,
    client: Arc<C>,
    store: Arc<Store>,
    host: Arc<PluginHost>,
    config: Arc<CompiledConfig>,
) {
    let review_id = request.review_id.clone();
    info!(review_id, "received review request");

    // Received -> Populated
    if request.id == 0 {
        match client.get_review_request(&review_id).await {
            Ok(payload) => {
                request.id = payload.id;
                request.summary = payload.summary;
                request.latest_diff_url = payload
                    .links
                    .latest_diff
                    .map(|l| l.href)
                    .unwrap_or_default();
            }
            Err(err) => {
                warn!(%err, review_id, "failed to populate review request");
            }
        }
    }

    if request.id == 0 {
        request.result.send(0);
        return;
    }

    // Populated -> DecisionMade
    let last_seen = match store.get(&rld_key(&review_id)).await {
        Ok(v) => v,
        Err(err) => {
            warn!(%err, review_id, "store get failed, treating review as not previously seen");
            None
        }
    };

    let already_reviewed_this_diff =
        last_seen.as_deref() == Some(request.latest_diff_url.as_str());

    if already_reviewed_this_diff && !request.force {
        info!(review_id, "ignoring already-seen diff");
        request.result.send(0);
        return;
    }

    if !request.force && config.is_title_excluded(&request.summary) {
        info!(review_id, summary = %request.summary, "ignoring review excluded by title");
        request.result.send(0);
        return;
    }

    request.seen_before = last_seen.is_some();
    if let Err(err) = store
        .put(&rld_key(&review_id), &request.latest_diff_url)
        .await
    {
        warn!(%err, review_id, "failed to persist latest-diff url");
    }

    // Reviewed
    if config.config.comments.drop_previous_comments && request.seen_before {
        let last_reply_id = store
            .get(&last_reply_key(&review_id))
            .await
            .ok()
            .flatten();
        retraction::drop_previous_comments(
            &client,
            &review_id,
            last_reply_id.as_deref(),
            &config.config.review_board.rb_username,
        )
        .await;
    }

    let diffed = match client.get_diffed_files(&request.latest_diff_url).await {
        Ok(d) => d,
        Err(err) => {
            warn!(%err, review_id, "failed to fetch diffed-files index, finalizing with no comments");
            request.result.send(0);
            return;
        }
    };

    let files = fetch_files_bounded(&client, &config, diffed.files).await;

    let reply_id = match client.create_reply(&review_id).await {
        Ok(id) => id,
        Err(err) => {
            warn!(%err, review_id, "failed to create reply, aborting review");
            request.result.send(0);
            return;
        }
    };
    if let Err(err) = store
        .put(&last_reply_key(&review_id), &reply_id.to_string())
        .await
    {
        warn!(%err, review_id, "failed to persist last reply id");
    }

    // Review-level checks run serially: a plugin's passback must exist
    // before any file-level check for that plugin starts.
    let review_comment_capacity = host.checkers().len().max(1);
    let (review_tx, mut review_rx) = mpsc::channel::<String>(review_comment_capacity);
    let view = ReviewView {
        review_id: review_id.clone(),
        summary: request.summary.clone(),
        description: String::new(),
    };
    let passbacks: Vec<Arc<Passback>> = host
        .checkers()
        .iter()
        .map(|checker| Arc::new(checker.check_review(&view, &review_tx)))
        .collect();
    drop(review_tx);

    let mut review_comments = Vec::new();
    while let Some(comment) = review_rx.recv().await {
        review_comments.push(comment);
    }
    let passbacks = Arc::new(passbacks);

    let comment_count = Arc::new(AtomicI64::new(0));
    let review_id_arc: Arc<str> = Arc::from(review_id.as_str());
    let max_comments = config.config.comments.max_comments;

    let mut file_handles = Vec::with_capacity(files.len());
    for file in files {
        let file = Arc::new(file);
        let client = Arc::clone(&client);
        let host = Arc::clone(&host);
        let passbacks = Arc::clone(&passbacks);
        let comment_count = Arc::clone(&comment_count);
        let review_id_arc = Arc::clone(&review_id_arc);
        file_handles.push(tokio::spawn(file_pipeline::run(
            file,
            review_id_arc,
            reply_id,
            host,
            passbacks,
            comment_count,
            max_comments,
            Arc::clone(&client),
        )));
    }
    for handle in file_handles {
        if let Err(err) = handle.await {
            warn!(%err, review_id, "file pipeline task panicked");
        }
    }

    // This count is the number of distinct anchor lines commented on, not
    // the number of comments actually POSTed — preserved from the source's
    // definition of `numComments`.
    let comments_made = comment_count.load(Ordering::SeqCst);

    let mut extra_comment = review_comments.join("\n");
    if comments_made > max_comments {
        if !extra_comment.is_empty() {
            extra_comment.push('\n');
        }
        extra_comment.push('\n');
        extra_comment.push_str(&config.config.comments.max_comment_comment);
        extra_comment.push('\n');
    }

    top_comment::publish(
        client.as_ref(),
        &config.config.comments,
        config.config.email_on_perfect,
        &review_id,
        reply_id,
        request.seen_before,
        &request.requester,
        comments_made > 0,
        &extra_comment,
    )
    .await;

    if let Err(err) = store.incr("reviewsDone", 1).await {
        warn!(%err, "failed to increment reviewsDone");
    }
    if let Err(err) = store.incr("commentsMade", comments_made).await {
        warn!(%err, "failed to increment commentsMade");
    }

    request.result.send(comments_made);
}

/// Fetches every entry's full `FileDiff`, bounded to
/// `ConcurrentFileDownloads` in flight, dropping entries whose fetch
/// errors or whose filename matches the exclusion regex.
async fn fetch_files_bounded<C: ReviewBoardApi + Send + Sync + 'static>(
    client: &Arc<C>,
    config: &Arc<CompiledConfig>,
    entries: Vec<reviewbot_remote::types::DiffFileEntry>,
) -> Vec<FileDiff> {
    let semaphore = Arc::new(Semaphore::new(
        config.config.concurrent_file_downloads.max(1),
    ));
    let files = Arc::new(Mutex::new(Vec::with_capacity(entries.len())));

    let mut handles = Vec::with_capacity(entries.len());
    for entry in entries {
        let client = Arc::clone(client);
        let semaphore = Arc::clone(&semaphore);
        let files = Arc::clone(&files);
        let config = Arc::clone(config);
        handles.push(tokio::spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .expect("semaphore never closed");
            match client.get_file_diff(&entry).await {
                Ok(file_diff) => {
                    if !config.is_file_excluded(&file_diff.filename) {
                        files.lock().expect("file list mutex poisoned").push(file_diff);
                    }
                }
                Err(err) => {
                    warn!(%err, file_id = entry.id, "failed to fetch file diff, skipping file");
                }
            }
        }));
    }
    for handle in handles {
        let _ = handle.await;
    }

    Arc::try_unwrap(files)
        .expect("all fetch tasks have completed, no other Arc holders remain")
        .into_inner()
        .expect("file list mutex poisoned")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use reviewbot_plugins::{Checker, Comment};
    use reviewbot_remote::errors::RbResult;
    use reviewbot_remote::types::{
        DiffCommentEntry, DiffCommentLinks, DiffFileIndex, Link, LinkContainer, ReplyEntry,
        ReplyLinks, ReplyUser, ReviewRequestPayload,
    };
    use std::collections::HashMap;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[derive(Default)]
    struct FakeReviewBoard {
        numeric_id: u64,
        summary: String,
        latest_diff_url: String,
        files: Vec<DiffFileEntry>,
        file_diffs: HashMap<u64, FileDiff>,
        reply_id: u64,
        replies: Vec<ReplyEntry>,
        reply_comments: HashMap<String, Vec<DiffCommentEntry>>,

        posted: Mutex<Vec<(u32, u32, String, bool)>>,
        dropped: Mutex<Vec<String>>,
        publishes: Mutex<Vec<(String, bool, Option<String>)>>,
        create_reply_calls: Mutex<u32>,
        in_flight_drops: AtomicUsize,
        max_in_flight_drops: AtomicUsize,
    }

    impl ReviewBoardApi for FakeReviewBoard {
        async fn get_review_request(&self, _review_id: &str) -> RbResult<ReviewRequestPayload> {
            Ok(ReviewRequestPayload {
                id: self.numeric_id,
                summary: self.summary.clone(),
                links: LinkContainer {
                    latest_diff: Some(Link {
                        href: self.latest_diff_url.clone(),
                        method: None,
                    }),
                    ..Default::default()
                },
            })
        }

        async fn get_diffed_files(&self, _latest_diff_url: &str) -> RbResult<DiffFileIndex> {
            Ok(DiffFileIndex {
                files: self.files.clone(),
            })
        }

        async fn get_file_diff(&self, entry: &DiffFileEntry) -> RbResult<FileDiff> {
            self.file_diffs
                .get(&entry.id)
                .cloned()
                .ok_or_else(|| reviewbot_remote::Error::InvalidResponse("no such file".into()))
        }

        async fn create_reply(&self, _review_id: &str) -> RbResult<u64> {
            *self.create_reply_calls.lock().unwrap() += 1;
            Ok(self.reply_id)
        }

        async fn post_comment(
            &self,
            _review_id: &str,
            _reply_id: u64,
            _filediff_id: u64,
            first_line: u32,
            num_lines: u32,
            text: &str,
            raise_issue: bool,
        ) -> RbResult<()> {
            self.posted
                .lock()
                .unwrap()
                .push((first_line, num_lines, text.to_string(), raise_issue));
            Ok(())
        }

        async fn list_reply_comments(
            &self,
            _review_id: &str,
            reply_id: &str,
        ) -> RbResult<Vec<DiffCommentEntry>> {
            Ok(self.reply_comments.get(reply_id).cloned().unwrap_or_default())
        }

        async fn list_replies(&self, _review_id: &str) -> RbResult<Vec<ReplyEntry>> {
            Ok(self.replies.clone())
        }

        async fn drop_comment(&self, comment_self_href: &str) -> RbResult<()> {
            let now = self.in_flight_drops.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight_drops.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(2)).await;
            self.in_flight_drops.fetch_sub(1, Ordering::SeqCst);
            self.dropped.lock().unwrap().push(comment_self_href.to_string());
            Ok(())
        }

        async fn publish(
            &self,
            _review_id: &str,
            _reply_id: u64,
            body_top: &str,
            trivial: bool,
            body_bottom: Option<&str>,
        ) -> RbResult<()> {
            self.publishes.lock().unwrap().push((
                body_top.to_string(),
                trivial,
                body_bottom.map(|s| s.to_string()),
            ));
            Ok(())
        }
    }

    /// Builds a `CompiledConfig` from a `comments` object and zero or more
    /// extra top-level fields (each a complete `"key": value` pair), so
    /// individual tests only spell out what they actually vary.
    fn config_from(comments_json: &str, extra_top_level: &[&str]) -> Arc<CompiledConfig> {
        let mut fields = vec![
            "\"plugin_path\": \"/plugins\"".to_string(),
            "\"db_path\": \":memory:\"".to_string(),
            "\"trigger_secret\": \"shh\"".to_string(),
            "\"review_board\": {\"rb_api_url\": \"http://rb\", \"rb_token\": \"t\", \"rb_username\": \"bot\"}"
                .to_string(),
            format!("\"comments\": {comments_json}"),
            "\"concurrent_file_downloads\": 4".to_string(),
        ];
        fields.extend(extra_top_level.iter().map(|s| s.to_string()));
        let raw = format!("{{{}}}", fields.join(","));
        Arc::new(Config::from_json(&raw).unwrap().compile().unwrap())
    }

    struct FixedLineChecker {
        name: &'static str,
        line: u32,
    }

    impl Checker for FixedLineChecker {
        fn canonical_name(&self) -> &str {
            self.name
        }
        fn configure(&mut self, _cfg: &serde_json::Value) {}
        fn check<'a>(
            &'a self,
            _file: &'a FileDiff,
            _passback: &'a Passback,
            tx: mpsc::Sender<Comment>,
        ) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send + 'a>> {
            let line = self.line;
            Box::pin(async move {
                let _ = tx
                    .send(Comment {
                        line,
                        span: 1,
                        text: format!("issue at {line}"),
                        raise_issue: false,
                    })
                    .await;
            })
        }
    }

    fn file_entry(id: u64) -> (DiffFileEntry, FileDiff) {
        (
            DiffFileEntry {
                id,
                links: LinkContainer::default(),
            },
            FileDiff {
                id,
                filename: format!("file{id}.rs"),
                chunks: Vec::new(),
                entire_file: Vec::new(),
            },
        )
    }

    #[tokio::test]
    async fn ignore_seen_diff_skips_review() {
        let store = Arc::new(Store::open_in_memory().await.unwrap());
        store.put("RLD42", "http://rb/diffs/7/").await.unwrap();

        let client = Arc::new(FakeReviewBoard {
            numeric_id: 42,
            latest_diff_url: "http://rb/diffs/7/".to_string(),
            ..Default::default()
        });
        let host = Arc::new(PluginHost::empty());
        let config = config_from("{\"max_comments\": 10}", &[]);

        let (result_tx, result_rx) = tokio::sync::oneshot::channel();
        let request = ReviewRequest::unenriched("42".to_string(), false, result_tx);

        run(request, Arc::clone(&client), store, host, config).await;

        let result = result_rx.await.unwrap();
        assert_eq!(result.num_comments, 0);
        assert!(client.posted.lock().unwrap().is_empty());
        assert!(client.publishes.lock().unwrap().is_empty());
        assert_eq!(*client.create_reply_calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn force_through_seen_diff_still_reviews() {
        let store = Arc::new(Store::open_in_memory().await.unwrap());
        store.put("RLD42", "http://rb/diffs/7/").await.unwrap();

        let client = Arc::new(FakeReviewBoard {
            numeric_id: 42,
            latest_diff_url: "http://rb/diffs/7/".to_string(),
            reply_id: 99,
            ..Default::default()
        });
        let host = Arc::new(PluginHost::empty());
        let config = config_from("{\"max_comments\": 10}", &[]);

        let (result_tx, result_rx) = tokio::sync::oneshot::channel();
        let request = ReviewRequest::unenriched("42".to_string(), true, result_tx);

        run(request, Arc::clone(&client), store, host, config).await;

        let result = result_rx.await.unwrap();
        assert_eq!(result.num_comments, 0);
        assert_eq!(*client.create_reply_calls.lock().unwrap(), 1);
        assert_eq!(client.publishes.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn title_excluded_skips_review() {
        let store = Arc::new(Store::open_in_memory().await.unwrap());
        let client = Arc::new(FakeReviewBoard {
            numeric_id: 42,
            summary: "WIP: fix".to_string(),
            latest_diff_url: "http://rb/diffs/1/".to_string(),
            ..Default::default()
        });
        let host = Arc::new(PluginHost::empty());
        let config = config_from(
            "{\"max_comments\": 10}",
            &["\"exclusion_regexes\": {\"review_title\": [\"^WIP:\"]}"],
        );

        let (result_tx, result_rx) = tokio::sync::oneshot::channel();
        let request = ReviewRequest::unenriched("42".to_string(), false, result_tx);

        run(request, Arc::clone(&client), store, host, config).await;

        let result = result_rx.await.unwrap();
        assert_eq!(result.num_comments, 0);
        assert_eq!(*client.create_reply_calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn comment_budget_caps_posts_and_flags_extra() {
        let store = Arc::new(Store::open_in_memory().await.unwrap());

        let (entry, diff) = file_entry(1);
        let mut file_diffs = HashMap::new();
        file_diffs.insert(1, diff);

        let client = Arc::new(FakeReviewBoard {
            numeric_id: 42,
            latest_diff_url: "http://rb/diffs/1/".to_string(),
            files: vec![entry],
            file_diffs,
            reply_id: 5,
            ..Default::default()
        });

        let checkers: Vec<Box<dyn Checker>> = vec![
            Box::new(FixedLineChecker { name: "a", line: 1 }),
            Box::new(FixedLineChecker { name: "b", line: 2 }),
            Box::new(FixedLineChecker { name: "c", line: 3 }),
        ];
        let host = Arc::new(PluginHost::with_checkers(checkers));
        let config = config_from(
            "{\"max_comments\": 2, \"max_comment_comment\": \"Too many comments.\"}",
            &[],
        );

        let (result_tx, result_rx) = tokio::sync::oneshot::channel();
        let request = ReviewRequest::unenriched("42".to_string(), false, result_tx);

        run(request, Arc::clone(&client), store, host, config).await;

        let result = result_rx.await.unwrap();
        assert_eq!(result.num_comments, 3);
        assert_eq!(client.posted.lock().unwrap().len(), 2);

        let publishes = client.publishes.lock().unwrap();
        assert_eq!(publishes.len(), 1);
        assert!(publishes[0].0.contains("Too many comments."));
    }

    #[tokio::test]
    async fn retraction_drops_all_open_comments_with_bounded_concurrency() {
        let store = Arc::new(Store::open_in_memory().await.unwrap());
        store.put("RLD42", "http://rb/diffs/old/").await.unwrap();
        store.put("LastReplyId_42", "9").await.unwrap();

        let mut reply_comments = HashMap::new();
        reply_comments.insert(
            "9".to_string(),
            (0..15)
                .map(|i| DiffCommentEntry {
                    issue_opened: true,
                    issue_status: "open".to_string(),
                    links: DiffCommentLinks {
                        self_link: Link {
                            href: format!("http://rb/comments/{i}"),
                            method: None,
                        },
                    },
                })
                .collect(),
        );

        let client = Arc::new(FakeReviewBoard {
            numeric_id: 42,
            latest_diff_url: "http://rb/diffs/new/".to_string(),
            reply_id: 10,
            reply_comments,
            ..Default::default()
        });
        let host = Arc::new(PluginHost::empty());
        let config = config_from(
            "{\"max_comments\": 10, \"drop_previous_comments\": true}",
            &[],
        );

        let (result_tx, result_rx) = tokio::sync::oneshot::channel();
        let request = ReviewRequest::unenriched("42".to_string(), false, result_tx);

        run(request, Arc::clone(&client), store, host, config).await;

        let _ = result_rx.await.unwrap();
        assert_eq!(client.dropped.lock().unwrap().len(), 15);
        assert!(client.max_in_flight_drops.load(Ordering::SeqCst) <= 10);
        assert_eq!(*client.create_reply_calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn idempotent_retrigger_with_same_diff_creates_one_reply() {
        let store = Arc::new(Store::open_in_memory().await.unwrap());
        let client = Arc::new(FakeReviewBoard {
            numeric_id: 42,
            latest_diff_url: "http://rb/diffs/1/".to_string(),
            reply_id: 7,
            ..Default::default()
        });
        let host = Arc::new(PluginHost::empty());
        let config = config_from("{\"max_comments\": 10}", &[]);

        let (tx1, rx1) = tokio::sync::oneshot::channel();
        let request1 = ReviewRequest::unenriched("42".to_string(), false, tx1);
        run(
            request1,
            Arc::clone(&client),
            Arc::clone(&store),
            Arc::clone(&host),
            Arc::clone(&config),
        )
        .await;
        rx1.await.unwrap();

        let (tx2, rx2) = tokio::sync::oneshot::channel();
        let request2 = ReviewRequest::unenriched("42".to_string(), false, tx2);
        run(request2, Arc::clone(&client), store, host, config).await;
        let result2 = rx2.await.unwrap();

        assert_eq!(result2.num_comments, 0);
        assert_eq!(*client.create_reply_calls.lock().unwrap(), 1);
    }
}
