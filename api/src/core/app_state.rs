use tokio::sync::mpsc;

use reviewbot_core::ReviewRequest;

/// Shared state for handlers.
#[derive(Clone)]
pub struct AppState {
    /// Channel onto which freshly-ingested review requests are pushed for
    /// the dispatcher to pick up.
    pub dispatch_tx: mpsc::Sender<ReviewRequest>,
    /// Shared secret the trigger endpoint checks against the request body.
    pub trigger_secret: String,
}
