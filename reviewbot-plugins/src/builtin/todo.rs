//! Flags lines containing `TODO`. Ported from `todoreviewer.go`.

use reviewbot_remote::types::FileDiff;
use tokio::sync::mpsc;

use crate::builtin::scan_chunk_lines;
use crate::checker::Checker;
use crate::types::{Comment, Passback};

#[derive(Debug, Default)]
pub struct TodoChecker;

impl Checker for TodoChecker {
    fn canonical_name(&self) -> &str {
        "TodoReviewer"
    }

    fn configure(&mut self, _cfg: &serde_json::Value) {}

    fn check<'a>(
        &'a self,
        file: &'a FileDiff,
        _passback: &'a Passback,
        tx: mpsc::Sender<Comment>,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            for chunk in &file.chunks {
                scan_chunk_lines(
                    chunk,
                    true,
                    "This line contains a TODO",
                    "These lines contain TODOs",
                    |text| text.contains("TODO"),
                    &tx,
                )
                .await;
            }
        })
    }
}
