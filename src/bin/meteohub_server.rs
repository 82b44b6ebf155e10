use log::{debug, info};
use meteohub::{router, ApiState, HubConfig, MeteoHub};
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init(); // RUST_LOG=debug for request-level detail.

    let config = HubConfig::from_env()?;
    let bind_address = config.bind_address.clone();
    let purge_every = config.cache_ttl.max(Duration::from_secs(30));
    let hub = Arc::new(MeteoHub::new(config)?);

    let purger = hub.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(purge_every);
        loop {
            ticker.tick().await;
            let purged = purger.purge_expired().await;
            if purged > 0 {
                debug!("Purged {} expired cache entries", purged);
            }
        }
    });

    let app = router(ApiState::new(hub));
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("meteohub listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;
    Ok(())
}
