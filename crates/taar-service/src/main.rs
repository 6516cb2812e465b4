//! TAAR recommendation service
//!
//! Serves add-on recommendations over HTTP and reloads the recommender
//! payloads on a fixed interval.

use anyhow::Result;
use std::sync::Arc;
use taar_core::{health::components, HealthRegistry, ProfileFetcher};
use taar_service::{api, initialize, load_profile_store, ServiceConfig};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting taar-service");

    let config = ServiceConfig::load()?;
    info!(
        instance = %config.instance,
        api_port = config.api_port,
        reload_interval_secs = config.reload_interval_secs,
        "Service configured"
    );

    let health_registry = HealthRegistry::new();
    for component in [
        components::DONOR_POOL,
        components::LR_CURVES,
        components::LOCALE_TABLE,
        components::PROFILE_STORE,
    ] {
        health_registry.register(component).await;
    }

    let profiles: Arc<dyn ProfileFetcher> =
        Arc::new(load_profile_store(&config.profiles_path, &health_registry).await);

    let port = config.api_port;
    let reload_interval = config.reload_interval();
    let state = initialize(config, profiles, health_registry).await?;

    let manager = state.manager.current();
    state
        .logger
        .log_startup(SERVICE_VERSION, &manager.recommender_names());

    let reload_handle = reload_interval.map(|interval| {
        info!(interval_secs = interval.as_secs(), "Periodic data reload enabled");
        tokio::spawn(Arc::clone(&state.reloader).run(interval))
    });

    let logger = state.logger.clone();
    api::serve(port, state, async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => logger.log_shutdown("SIGINT received"),
            Err(e) => {
                error!(error = %e, "Cannot listen for shutdown signal");
                std::future::pending::<()>().await
            }
        }
    })
    .await?;

    if let Some(handle) = reload_handle {
        handle.abort();
    }
    info!("Shutting down");

    Ok(())
}
