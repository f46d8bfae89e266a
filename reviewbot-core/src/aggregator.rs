//! Per-file comment aggregator, ported from `ManageComments` in
//! `examples/original_source/.../reviewer.go`, fixing the merge-branch bug
//! the source has: the original appends to a local `commentList` slice
//! variable on the merge path instead of writing back through the map
//! entry, so a merged comment's extended text can be silently dropped.
//! Here every mutation goes through the map entry directly.

use std::collections::BTreeMap;

use reviewbot_plugins::Comment;
use tokio::sync::mpsc;

/// One file's comments, keyed by internal anchor line.
#[derive(Debug, Default)]
pub struct CommentedFile {
    pub file_id: u64,
    pub comments: BTreeMap<u32, Vec<Comment>>,
}

impl CommentedFile {
    pub fn new(file_id: u64) -> Self {
        Self {
            file_id,
            comments: BTreeMap::new(),
        }
    }

    fn ingest(&mut self, mut comment: Comment) {
        if comment.span == 0 {
            comment.span = 1;
        }

        let list = self.comments.entry(comment.line).or_default();
        match list.iter_mut().find(|c| c.span == comment.span) {
            Some(existing) => {
                existing.text.push_str("\n\n");
                existing.text.push_str(&comment.text);
                existing.raise_issue |= comment.raise_issue;
            }
            None => list.push(comment),
        }
    }
}

/// Drains `rx` until the channel closes, merging every inbound comment
/// into a [`CommentedFile`] for `file_id`. Intended to be run as its own
/// `tokio::spawn`ed task; the caller awaits the returned `JoinHandle` as
/// the Rust-native "wait for completion" signal the original gets from a
/// `sync.WaitGroup`.
pub async fn run(file_id: u64, mut rx: mpsc::Receiver<Comment>) -> CommentedFile {
    let mut file = CommentedFile::new(file_id);
    while let Some(comment) = rx.recv().await {
        file.ingest(comment);
    }
    file
}
