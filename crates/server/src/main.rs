//! listafeed ingestion daemon entry point.
//!
//! Boots the scheduled feed-ingestion pipeline: loads configuration,
//! constructs every component explicitly, runs one eager refresh, then
//! keeps refreshing on the cron schedule until ctrl-c. SIGUSR1 triggers a
//! manual refresh through the same overlap guard as the timer. Logging is
//! JSON on stderr.

use std::sync::Arc;

use anyhow::Result;
use listafeed_core::{AppConfig, CacheStore};
use listafeed_feed::FeedTransport;
use listafeed_feed::transport::TransportConfig;
use listafeed_server::{IngestionScheduler, Ingestor};
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    let feed_base_url = config.require_feed_base_url()?.to_owned();

    let cache = Arc::new(CacheStore::new(config.cache_namespaces()));
    let transport = FeedTransport::new(TransportConfig::from_parts(
        &feed_base_url,
        config.feed_username.clone(),
        config.feed_password.clone(),
        &config.user_agent,
        config.timeout(),
    )?);
    let ingestor = Arc::new(Ingestor::new(Arc::new(transport), cache));
    let scheduler = Arc::new(IngestionScheduler::new(ingestor, &config.refresh_cron)?);

    let (shutdown_tx, _) = broadcast::channel(1);
    let timer = {
        let scheduler = scheduler.clone();
        let shutdown = shutdown_tx.subscribe();
        tokio::spawn(async move { scheduler.run(shutdown).await })
    };

    tracing::info!(feed = %feed_base_url, cron = %config.refresh_cron, "listafeed started");
    scheduler.try_refresh().await;

    let mut manual_trigger = signal(SignalKind::user_defined1())?;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = manual_trigger.recv() => {
                tracing::info!("manual refresh requested");
                scheduler.try_refresh().await;
            }
        }
    }

    tracing::info!(state = ?scheduler.state(), "shutting down");
    let _ = shutdown_tx.send(());
    let _ = timer.await;

    Ok(())
}
