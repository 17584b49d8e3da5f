//! wpt-slack-relay - page-speed test relay
//!
//! Triggers WebPageTest runs when the site changes and posts the results
//! to a Slack channel.

mod config;
mod db;
mod notify;
mod relay;
#[cfg(test)]
mod testing;
mod web;
mod wpt;

use config::ServerConfig;
use db::Store;
use notify::Notifier;
use relay::{PollLoop, Relay};
use web::Server;
use wpt::WptClient;

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("wpt_slack_relay=info".parse()?))
        .init();

    // Load configuration
    let cfg = ServerConfig::load();
    tracing::info!("Starting wpt-slack-relay on port {}...", cfg.http_port);
    tracing::info!("Using option store at {}", cfg.db_path);
    tracing::info!("Testing service at {}", cfg.service_url);

    // Initialize database
    let store = Arc::new(Store::new(&cfg.db_path)?);
    tracing::info!("Option store initialized successfully");

    let pending = store.get_pending()?;
    if pending.is_pending() {
        tracing::info!("Resuming pending test {} ({})", pending.test_id, pending.action);
    }

    // Build the relay once and share it
    let wpt = WptClient::new(&cfg.service_url, cfg.http_timeout())?;
    let notifier = Notifier::new(&cfg.site_name)?;
    let relay = Arc::new(Relay::new(store, wpt, notifier));

    // Start background polling
    let poller = cfg.poll_interval().map(|every| PollLoop::new(relay.clone(), every));
    match &poller {
        Some(poller) => poller.start().await,
        None => tracing::info!("Background polling disabled; relying on /hooks/init"),
    }

    // Start web server
    let server = Server::new(cfg, relay);
    let result = server.start().await;

    if let Some(poller) = &poller {
        poller.stop().await;
    }
    result
}
