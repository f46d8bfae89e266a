//! The top-level dispatch loop, ported from `reviewer.go`'s `Go`
//! method: one `tokio::spawn`ed [`crate::review_pipeline::run`] per inbound
//! [`ReviewRequest`], unbounded in-flight, plus a periodic stats logger
//! mirroring `LogStats`.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use reviewbot_plugins::PluginHost;
use reviewbot_remote::ReviewBoardApi;
use reviewbot_store::Store;
use tokio::sync::mpsc;
use tracing::info;

use crate::config::CompiledConfig;
use crate::review_pipeline;
use crate::types::ReviewRequest;

/// Consumes `rx` until the channel closes, spawning one review pipeline per
/// request. Each pipeline runs independently; this loop never awaits a
/// pipeline's completion, so a slow review never blocks the next request's
/// intake.
pub async fn run<C: ReviewBoardApi + Send + Sync + 'static>(
    mut rx: mpsc::Receiver<ReviewRequest>,
    client: Arc<C>,
    store: Arc<Store>,
    host: Arc<PluginHost>,
    config: Arc<CompiledConfig>,
) {
    let in_flight = Arc::new(AtomicUsize::new(0));

    if config.config.stats.logstats {
        tokio::spawn(log_stats(
            Arc::clone(&store),
            Arc::clone(&in_flight),
            Duration::from_secs(config.config.stats.log_interval_sec),
        ));
    }

    while let Some(request) = rx.recv().await {
        let client = Arc::clone(&client);
        let store = Arc::clone(&store);
        let host = Arc::clone(&host);
        let config = Arc::clone(&config);
        let in_flight = Arc::clone(&in_flight);

        in_flight.fetch_add(1, Ordering::SeqCst);
        tokio::spawn(async move {
            review_pipeline::run(request, client, store, host, config).await;
            in_flight.fetch_sub(1, Ordering::SeqCst);
        });
    }
}

async fn log_stats(store: Arc<Store>, in_flight: Arc<AtomicUsize>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        let reviews_done = store.get("reviewsDone").await.ok().flatten();
        let comments_made = store.get("commentsMade").await.ok().flatten();
        info!(
            in_flight = in_flight.load(Ordering::SeqCst),
            reviews_done = reviews_done.as_deref().unwrap_or("0"),
            comments_made = comments_made.as_deref().unwrap_or("0"),
            "dispatcher stats"
        );
    }
}
