//! Health check infrastructure for the recommendation service
//!
//! Tracks whether each backing dataset is loaded. A missing dataset only
//! degrades the service: the remaining recommenders keep answering.

use crate::reload::LoadReport;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Health status of a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Healthy,
    /// Operational with reduced recommendation coverage
    Degraded,
    Unhealthy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub last_check_timestamp: i64,
}

impl ComponentHealth {
    fn with_status(status: ComponentStatus, message: Option<String>) -> Self {
        Self {
            status,
            message,
            last_check_timestamp: chrono::Utc::now().timestamp(),
        }
    }

    pub fn healthy() -> Self {
        Self::with_status(ComponentStatus::Healthy, None)
    }

    pub fn degraded(message: impl Into<String>) -> Self {
        Self::with_status(ComponentStatus::Degraded, Some(message.into()))
    }

    pub fn unhealthy(message: impl Into<String>) -> Self {
        Self::with_status(ComponentStatus::Unhealthy, Some(message.into()))
    }
}

/// Overall health response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: ComponentStatus,
    pub components: HashMap<String, ComponentHealth>,
}

impl HealthResponse {
    /// Worst status among the components
    pub fn compute_status(components: &HashMap<String, ComponentHealth>) -> ComponentStatus {
        let mut status = ComponentStatus::Healthy;
        for health in components.values() {
            match health.status {
                ComponentStatus::Unhealthy => return ComponentStatus::Unhealthy,
                ComponentStatus::Degraded => status = ComponentStatus::Degraded,
                ComponentStatus::Healthy => {}
            }
        }
        status
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Component names for health tracking
pub mod components {
    pub const DONOR_POOL: &str = "donor_pool";
    pub const LR_CURVES: &str = "lr_curves";
    pub const LOCALE_TABLE: &str = "locale_table";
    pub const PROFILE_STORE: &str = "profile_store";
}

/// Health registry for tracking component health
#[derive(Debug, Clone)]
pub struct HealthRegistry {
    components: Arc<RwLock<HashMap<String, ComponentHealth>>>,
    ready: Arc<RwLock<bool>>,
}

impl Default for HealthRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self {
            components: Arc::new(RwLock::new(HashMap::new())),
            ready: Arc::new(RwLock::new(false)),
        }
    }

    /// Register a component with initial healthy status
    pub async fn register(&self, name: &str) {
        self.update(name, ComponentHealth::healthy()).await;
    }

    pub async fn update(&self, name: &str, health: ComponentHealth) {
        self.components
            .write()
            .await
            .insert(name.to_string(), health);
    }

    pub async fn set_healthy(&self, name: &str) {
        self.update(name, ComponentHealth::healthy()).await;
    }

    pub async fn set_degraded(&self, name: &str, message: impl Into<String>) {
        self.update(name, ComponentHealth::degraded(message)).await;
    }

    pub async fn set_unhealthy(&self, name: &str, message: impl Into<String>) {
        self.update(name, ComponentHealth::unhealthy(message)).await;
    }

    /// Reflect a data load in the dataset components
    pub async fn apply_load_report(&self, report: &LoadReport) {
        if !report.similarity_loaded {
            self.set_degraded(components::DONOR_POOL, "Donor list or lr curves unavailable")
                .await;
            self.set_degraded(components::LR_CURVES, "Donor list or lr curves unavailable")
                .await;
        } else if report.donors == 0 {
            self.set_degraded(components::DONOR_POOL, "Donor pool is empty")
                .await;
            self.set_healthy(components::LR_CURVES).await;
        } else {
            self.set_healthy(components::DONOR_POOL).await;
            self.set_healthy(components::LR_CURVES).await;
        }

        if report.locale_loaded {
            self.set_healthy(components::LOCALE_TABLE).await;
        } else {
            self.set_degraded(components::LOCALE_TABLE, "Top addons per locale unavailable")
                .await;
        }
    }

    pub async fn set_ready(&self, ready: bool) {
        *self.ready.write().await = ready;
    }

    pub async fn health(&self) -> HealthResponse {
        let components = self.components.read().await.clone();
        let status = HealthResponse::compute_status(&components);
        HealthResponse { status, components }
    }

    pub async fn readiness(&self) -> ReadinessResponse {
        let ready = *self.ready.read().await;
        let health = self.health().await;

        let (ready, reason) = if !ready {
            (false, Some("Recommenders not yet loaded".to_string()))
        } else if health.status == ComponentStatus::Unhealthy {
            (false, Some("Critical component unhealthy".to_string()))
        } else {
            (true, None)
        };
        ReadinessResponse { ready, reason }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(similarity_loaded: bool, donors: usize, locale_loaded: bool) -> LoadReport {
        LoadReport {
            similarity_loaded,
            donors,
            curve_points: if similarity_loaded { 3 } else { 0 },
            locale_loaded,
            locales: if locale_loaded { 2 } else { 0 },
        }
    }

    #[tokio::test]
    async fn test_health_registry_initial_state() {
        let registry = HealthRegistry::new();
        let health = registry.health().await;

        assert_eq!(health.status, ComponentStatus::Healthy);
        assert!(health.components.is_empty());
    }

    #[tokio::test]
    async fn test_full_load_is_healthy() {
        let registry = HealthRegistry::new();
        registry.apply_load_report(&report(true, 100, true)).await;

        let health = registry.health().await;
        assert_eq!(health.status, ComponentStatus::Healthy);
        assert_eq!(health.components.len(), 3);
    }

    #[tokio::test]
    async fn test_missing_similarity_data_degrades() {
        let registry = HealthRegistry::new();
        registry.apply_load_report(&report(false, 0, true)).await;

        let health = registry.health().await;
        assert_eq!(health.status, ComponentStatus::Degraded);
        assert_eq!(
            health.components[components::DONOR_POOL].status,
            ComponentStatus::Degraded
        );
        assert_eq!(
            health.components[components::LOCALE_TABLE].status,
            ComponentStatus::Healthy
        );
    }

    #[tokio::test]
    async fn test_empty_donor_pool_degrades() {
        let registry = HealthRegistry::new();
        registry.apply_load_report(&report(true, 0, true)).await;

        let health = registry.health().await;
        assert_eq!(
            health.components[components::DONOR_POOL].status,
            ComponentStatus::Degraded
        );
        assert_eq!(
            health.components[components::LR_CURVES].status,
            ComponentStatus::Healthy
        );
    }

    #[tokio::test]
    async fn test_readiness_not_ready_initially() {
        let registry = HealthRegistry::new();
        let readiness = registry.readiness().await;

        assert!(!readiness.ready);
        assert!(readiness.reason.is_some());
    }

    #[tokio::test]
    async fn test_readiness_survives_degraded_data() {
        let registry = HealthRegistry::new();
        registry.apply_load_report(&report(false, 0, false)).await;
        registry.set_ready(true).await;

        assert!(registry.readiness().await.ready);
    }

    #[tokio::test]
    async fn test_readiness_not_ready_when_unhealthy() {
        let registry = HealthRegistry::new();
        registry.register(components::PROFILE_STORE).await;
        registry.set_ready(true).await;
        registry
            .set_unhealthy(components::PROFILE_STORE, "Failed to load profiles")
            .await;

        assert!(!registry.readiness().await.ready);
    }
}
