//! Periodic and on-demand data reloading

use anyhow::{Context, Result};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use taar_core::{
    build_manager, DataPaths, HealthRegistry, LoadReport, ManagerHandle, ProfileFetcher,
    ServiceMetrics, StructuredLogger,
};
use tokio::sync::Mutex;
use tracing::{debug, error, warn};

/// Result of a reload attempt
#[derive(Debug, Clone, Serialize)]
pub struct ReloadOutcome {
    /// Whether the freshly built manager replaced the active one
    pub swapped: bool,
    pub report: LoadReport,
}

/// Rebuilds the recommendation manager from the payload files
pub struct DataReloader {
    paths: DataPaths,
    profiles: Arc<dyn ProfileFetcher>,
    handle: ManagerHandle,
    health_registry: HealthRegistry,
    metrics: ServiceMetrics,
    logger: StructuredLogger,
    in_progress: Mutex<()>,
}

impl DataReloader {
    pub fn new(
        paths: DataPaths,
        profiles: Arc<dyn ProfileFetcher>,
        handle: ManagerHandle,
        health_registry: HealthRegistry,
        metrics: ServiceMetrics,
        logger: StructuredLogger,
    ) -> Self {
        Self {
            paths,
            profiles,
            handle,
            health_registry,
            metrics,
            logger,
            in_progress: Mutex::new(()),
        }
    }

    /// Build a new manager and swap it in.
    ///
    /// A build that loaded no data at all leaves the active manager in
    /// place, so a transient outage of the payload files does not wipe out
    /// recommendations that were being served.
    pub async fn reload(&self) -> Result<ReloadOutcome> {
        let _guard = self.in_progress.lock().await;

        let paths = self.paths.clone();
        let profiles = Arc::clone(&self.profiles);
        let (manager, report) =
            tokio::task::spawn_blocking(move || build_manager(&paths, profiles))
                .await
                .context("Data reload task panicked")?;

        self.metrics.record_data_load(&report);
        self.logger.log_data_reload(&report);

        if report.is_empty() {
            warn!("Reload produced no usable data, keeping the active recommenders");
            return Ok(ReloadOutcome {
                swapped: false,
                report,
            });
        }

        self.handle.swap(manager);
        self.health_registry.apply_load_report(&report).await;
        Ok(ReloadOutcome {
            swapped: true,
            report,
        })
    }

    /// Reload on a fixed interval until the task is dropped
    pub async fn run(self: Arc<Self>, interval: Duration) {
        loop {
            tokio::time::sleep(interval).await;

            match self.reload().await {
                Ok(outcome) if outcome.swapped => {
                    debug!(donors = outcome.report.donors, "Periodic data reload complete");
                }
                Ok(_) => {}
                Err(e) => {
                    error!(error = %e, "Periodic data reload failed");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taar_core::health::components;
    use taar_core::{ClientProfile, ComponentStatus, InMemoryProfileStore};
    use tempfile::TempDir;

    fn paths_in(dir: &TempDir) -> DataPaths {
        DataPaths {
            donors: dir.path().join("donors.json"),
            lr_curves: dir.path().join("lr_curves.json"),
            locale: dir.path().join("locale.json"),
        }
    }

    fn write_locale(paths: &DataPaths, addons: &[&str]) {
        std::fs::write(
            &paths.locale,
            serde_json::json!({ "en-US": addons }).to_string(),
        )
        .unwrap();
    }

    fn create_reloader(paths: DataPaths) -> (DataReloader, ManagerHandle, HealthRegistry) {
        let store = InMemoryProfileStore::new();
        store.insert(
            "client-1",
            ClientProfile {
                locale: Some("en-US".into()),
                ..Default::default()
            },
        );
        let profiles: Arc<dyn ProfileFetcher> = Arc::new(store);
        let (manager, _) = build_manager(&paths, Arc::clone(&profiles));
        let handle = ManagerHandle::new(manager);
        let health = HealthRegistry::new();
        let reloader = DataReloader::new(
            paths,
            profiles,
            handle.clone(),
            health.clone(),
            ServiceMetrics::new(),
            StructuredLogger::new("test"),
        );
        (reloader, handle, health)
    }

    #[tokio::test]
    async fn test_reload_picks_up_new_payload() {
        let dir = TempDir::new().unwrap();
        let paths = paths_in(&dir);
        write_locale(&paths, &["old"]);
        let (reloader, handle, health) = create_reloader(paths.clone());
        assert_eq!(handle.recommend("client-1", 5).unwrap().results, vec!["old"]);

        write_locale(&paths, &["new-1", "new-2"]);
        let outcome = reloader.reload().await.unwrap();

        assert!(outcome.swapped);
        assert!(outcome.report.locale_loaded);
        assert_eq!(
            handle.recommend("client-1", 5).unwrap().results,
            vec!["new-1", "new-2"]
        );

        let status = health.health().await.components;
        assert_eq!(
            status[components::LOCALE_TABLE].status,
            ComponentStatus::Healthy
        );
        assert_eq!(
            status[components::DONOR_POOL].status,
            ComponentStatus::Degraded
        );
    }

    #[tokio::test]
    async fn test_empty_reload_keeps_active_manager() {
        let dir = TempDir::new().unwrap();
        let paths = paths_in(&dir);
        write_locale(&paths, &["kept"]);
        let (reloader, handle, _) = create_reloader(paths.clone());

        std::fs::remove_file(&paths.locale).unwrap();
        let outcome = reloader.reload().await.unwrap();

        assert!(!outcome.swapped);
        assert!(outcome.report.is_empty());
        assert_eq!(handle.recommend("client-1", 5).unwrap().results, vec!["kept"]);
    }
}
