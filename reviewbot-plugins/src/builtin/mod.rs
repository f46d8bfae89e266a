//! Built-in checkers, direct ports of the original plugin set.

pub mod line_length;
pub mod regex_checker;
pub mod todo;

use reviewbot_remote::types::{ChangeKind, DiffChunk};
use tokio::sync::mpsc;

use crate::types::Comment;

/// Groups consecutive matching lines in one chunk into comments, exactly
/// the run-length accumulation the original line/todo/regex checkers do:
/// a match starts a new comment (using `single_text`), each further
/// consecutive match extends its span (switching to `multi_text`), and a
/// non-match (or end of chunk) flushes the pending comment.
pub(crate) async fn scan_chunk_lines(
    chunk: &DiffChunk,
    raise_issue: bool,
    single_text: &str,
    multi_text: &str,
    matches: impl Fn(&str) -> bool,
    tx: &mpsc::Sender<Comment>,
) {
    if !matches!(chunk.change, ChangeKind::Insert | ChangeKind::Replace) {
        return;
    }

    let mut pending: Option<Comment> = None;

    for line in &chunk.lines {
        if matches(&line.rh_text) {
            pending = Some(match pending.take() {
                None => Comment {
                    line: line.review_line,
                    span: 1,
                    text: single_text.to_string(),
                    raise_issue,
                },
                Some(mut c) => {
                    c.span += 1;
                    c.text = multi_text.to_string();
                    c
                }
            });
        } else if let Some(c) = pending.take() {
            let _ = tx.send(c).await;
        }
    }

    if let Some(c) = pending.take() {
        let _ = tx.send(c).await;
    }
}
