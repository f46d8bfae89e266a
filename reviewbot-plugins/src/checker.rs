//! The checker capability set every plugin implements.
//!
//! Ported from the Go plugin interface (`Version`, `CanonicalName`,
//! `Configure`, `CheckReview`, `Check`) rather than expressed via
//! `async-trait` or `Box<dyn Trait>` dynamic dispatch: `check` uses a plain
//! `async fn`, and the host holds checkers as a `Vec<Box<dyn Checker>>` only
//! because they are genuinely heterogeneous, compile-time-registered types
//! — the trait itself stays object-safe by keeping `check_review` and
//! `configure` synchronous and giving `check` a boxed-future return.

use reviewbot_remote::types::FileDiff;
use tokio::sync::mpsc;

use crate::types::{Passback, ReviewView};

/// A single checker plugin.
pub trait Checker: Send + Sync {
    /// Semver-ish version triple, unused for gating in this workspace but
    /// kept for parity with the capability set checkers satisfy.
    fn version(&self) -> (u32, u32, u32) {
        (0, 0, 0)
    }

    /// Stable name used in manifests and logs.
    fn canonical_name(&self) -> &str;

    /// Applies this checker's config blob. Called once, before any review
    /// is processed.
    fn configure(&mut self, cfg: &serde_json::Value);

    /// Runs once per review, before any file-level check for that review.
    /// The returned `Passback` is handed back to every `check` call this
    /// checker makes for the same review.
    fn check_review(&self, review: &ReviewView, comment_tx: &mpsc::Sender<String>) -> Passback {
        let _ = (review, comment_tx);
        Box::new(())
    }

    /// Runs once per file in a review, receiving the `Passback` this
    /// checker produced for the review.
    fn check<'a>(
        &'a self,
        file: &'a FileDiff,
        passback: &'a Passback,
        tx: mpsc::Sender<crate::types::Comment>,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send + 'a>>;
}
