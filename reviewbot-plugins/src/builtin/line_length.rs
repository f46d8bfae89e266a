//! Flags lines over 80 characters. Ported from `linereviewer.go`.

use reviewbot_remote::types::FileDiff;
use tokio::sync::mpsc;

use crate::builtin::scan_chunk_lines;
use crate::checker::Checker;
use crate::types::{Comment, Passback};

const MAX_LEN: usize = 80;

#[derive(Debug, Default)]
pub struct LineLengthChecker;

impl Checker for LineLengthChecker {
    fn canonical_name(&self) -> &str {
        "LineReviewer"
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
                    false,
                    "This line is over 80 characters",
                    "These lines are over 80 characters",
                    |text| text.len() > MAX_LEN,
                    &tx,
                )
                .await;
            }
        })
    }
}
