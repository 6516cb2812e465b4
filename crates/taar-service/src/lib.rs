//! TAAR recommendation service
//!
//! Wires the core recommenders into an HTTP API with health checks,
//! Prometheus metrics and periodic data reloading.

pub mod api;
pub mod config;
pub mod reload;

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use taar_core::{
    build_manager, health::components, HealthRegistry, InMemoryProfileStore, ManagerHandle,
    ProfileFetcher, ServiceMetrics, StructuredLogger,
};
use tracing::error;

pub use api::{create_router, serve, ApiError, AppState};
pub use config::ServiceConfig;
pub use reload::{DataReloader, ReloadOutcome};

/// Load client profiles, falling back to an empty store.
///
/// Every client is unknown while the store is empty, so the service still
/// answers but only with empty recommendations.
pub async fn load_profile_store(
    path: &Path,
    health_registry: &HealthRegistry,
) -> InMemoryProfileStore {
    match InMemoryProfileStore::from_file(path) {
        Ok(store) => {
            health_registry.set_healthy(components::PROFILE_STORE).await;
            store
        }
        Err(e) => {
            error!(error = %e, "Cannot load client profiles");
            health_registry
                .set_degraded(components::PROFILE_STORE, "Client profiles unavailable")
                .await;
            InMemoryProfileStore::new()
        }
    }
}

/// Build the first manager and the state shared by the HTTP handlers.
///
/// The service is marked ready once this returns, whatever data could be
/// loaded.
pub async fn initialize(
    config: ServiceConfig,
    profiles: Arc<dyn ProfileFetcher>,
    health_registry: HealthRegistry,
) -> Result<Arc<AppState>> {
    let metrics = ServiceMetrics::new();
    let logger = StructuredLogger::new(&config.instance);
    let paths = config.data_paths();

    let build_paths = paths.clone();
    let build_profiles = Arc::clone(&profiles);
    let (manager, report) =
        tokio::task::spawn_blocking(move || build_manager(&build_paths, build_profiles))
            .await
            .context("Initial data load panicked")?;

    metrics.record_data_load(&report);
    logger.log_data_reload(&report);
    health_registry.apply_load_report(&report).await;

    let handle = ManagerHandle::new(manager);
    let reloader = Arc::new(DataReloader::new(
        paths,
        profiles,
        handle.clone(),
        health_registry.clone(),
        metrics.clone(),
        logger.clone(),
    ));

    health_registry.set_ready(true).await;

    Ok(Arc::new(AppState {
        manager: handle,
        health_registry,
        metrics,
        logger,
        reloader,
        config,
    }))
}
