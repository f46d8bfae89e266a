use std::env;
use std::error::Error;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use reviewbot_core::config::Config;
use reviewbot_core::dispatcher;
use reviewbot_plugins::PluginHost;
use reviewbot_remote::{RbClient, RbConfig};
use reviewbot_store::Store;
use tokio::sync::mpsc;
use tracing::info;

const DISPATCH_CHANNEL_CAPACITY: usize = 64;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Fails if .env file not found, not readable or invalid.
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config_path = env::var("REVIEWBOT_CONFIG").unwrap_or_else(|_| "config.json".to_string());
    let raw_config = std::fs::read_to_string(&config_path)
        .map_err(|e| format!("failed to read config file {config_path}: {e}"))?;
    let config = Config::from_json(&raw_config)?.compile()?;

    let store = Arc::new(Store::open(&config.config.db_path).await?);

    let host = Arc::new(PluginHost::load(Path::new(&config.config.plugin_path))?);

    let client = Arc::new(RbClient::new(RbConfig {
        rb_api_url: config.config.review_board.rb_api_url.clone(),
        rb_token: config.config.review_board.rb_token.clone(),
    })?);

    let (dispatch_tx, dispatch_rx) = mpsc::channel(DISPATCH_CHANNEL_CAPACITY);
    let config = Arc::new(config);

    let dispatcher_handle = tokio::spawn(dispatcher::run(
        dispatch_rx,
        Arc::clone(&client),
        Arc::clone(&store),
        Arc::clone(&host),
        Arc::clone(&config),
    ));

    let bind_addr: SocketAddr = env::var("REVIEWBOT_BIND")
        .unwrap_or_else(|_| "0.0.0.0:1550".to_string())
        .parse()?;

    info!(%bind_addr, "starting reviewbot");

    api::serve(bind_addr, dispatch_tx, config.config.trigger_secret.clone()).await?;

    dispatcher_handle.abort();

    Ok(())
}
