//! Core library for telemetry-aware add-on recommendation
//!
//! This crate provides:
//! - Client profile and donor data models
//! - Pluggable recommendation strategies (similarity, locale)
//! - First-match dispatch across strategies
//! - Payload loading, hot swapping of loaded data
//! - Health checks and observability

pub mod data;
pub mod error;
pub mod health;
pub mod models;
pub mod observability;
pub mod profile;
pub mod recommenders;
pub mod reload;

pub use error::{DataError, RecommendError};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{ServiceMetrics, StructuredLogger};
pub use profile::{InMemoryProfileStore, ProfileFetcher};
pub use recommenders::{
    LocaleRecommender, RecommendationManager, Recommender, SimilarityRecommender,
};
pub use reload::{build_manager, DataPaths, LoadReport, ManagerHandle};
