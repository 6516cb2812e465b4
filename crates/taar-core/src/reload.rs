//! Construction and hot swapping of the recommendation manager
//!
//! Backing data is never mutated in place. A refresh builds a complete new
//! manager from the payload files and swaps it in; requests already holding
//! the previous manager finish against it.

use crate::error::RecommendError;
use crate::models::Recommendation;
use crate::profile::ProfileFetcher;
use crate::recommenders::{
    LocaleRecommender, RecommendationManager, Recommender, SimilarityRecommender,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use tracing::info;

/// Locations of the externally produced payloads
#[derive(Debug, Clone)]
pub struct DataPaths {
    pub donors: PathBuf,
    pub lr_curves: PathBuf,
    pub locale: PathBuf,
}

/// What a manager build managed to load
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub similarity_loaded: bool,
    pub donors: usize,
    pub curve_points: usize,
    pub locale_loaded: bool,
    pub locales: usize,
}

impl LoadReport {
    /// True when no strategy has data to work with
    pub fn is_empty(&self) -> bool {
        !self.similarity_loaded && !self.locale_loaded
    }
}

/// Build the production strategy chain: similarity first, locale as fallback
pub fn build_manager(
    paths: &DataPaths,
    profile_fetcher: Arc<dyn ProfileFetcher>,
) -> (RecommendationManager, LoadReport) {
    let similarity = SimilarityRecommender::from_sources(&paths.donors, &paths.lr_curves);
    let locale = LocaleRecommender::from_source(&paths.locale);

    let report = LoadReport {
        similarity_loaded: similarity.is_loaded(),
        donors: similarity.donor_count(),
        curve_points: similarity.curve_len(),
        locale_loaded: locale.is_loaded(),
        locales: locale.locale_count(),
    };

    let recommenders: Vec<Arc<dyn Recommender>> = vec![Arc::new(similarity), Arc::new(locale)];
    (
        RecommendationManager::new(profile_fetcher, recommenders),
        report,
    )
}

/// Shared, swappable reference to the active manager
#[derive(Clone)]
pub struct ManagerHandle {
    current: Arc<RwLock<Arc<RecommendationManager>>>,
}

impl ManagerHandle {
    pub fn new(manager: RecommendationManager) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(manager))),
        }
    }

    /// The manager serving requests right now
    pub fn current(&self) -> Arc<RecommendationManager> {
        // The guarded value is a plain Arc, so a poisoned lock still holds a valid manager
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    /// Replace the active manager, returning the previous one
    pub fn swap(&self, manager: RecommendationManager) -> Arc<RecommendationManager> {
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        let previous = std::mem::replace(&mut *guard, Arc::new(manager));
        info!("Recommendation manager swapped");
        previous
    }

    /// Recommend against whichever manager is active when the call starts
    pub fn recommend(
        &self,
        client_id: &str,
        limit: usize,
    ) -> Result<Recommendation, RecommendError> {
        self.current().recommend_with_source(client_id, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ClientProfile;
    use crate::profile::InMemoryProfileStore;
    use tempfile::TempDir;

    fn write_payloads(dir: &TempDir, locale_addons: &[&str]) -> DataPaths {
        let paths = DataPaths {
            donors: dir.path().join("donors.json"),
            lr_curves: dir.path().join("lr_curves.json"),
            locale: dir.path().join("locale.json"),
        };
        std::fs::write(&paths.donors, "[]").unwrap();
        std::fs::write(&paths.lr_curves, "[[0.0, [0.9, 0.1]]]").unwrap();
        std::fs::write(
            &paths.locale,
            serde_json::json!({ "en-US": locale_addons }).to_string(),
        )
        .unwrap();
        paths
    }

    fn create_store() -> Arc<InMemoryProfileStore> {
        let store = InMemoryProfileStore::new();
        store.insert(
            "client-1",
            ClientProfile {
                locale: Some("en-US".into()),
                ..Default::default()
            },
        );
        Arc::new(store)
    }

    #[test]
    fn test_build_manager_reports_loaded_data() {
        let dir = TempDir::new().unwrap();
        let paths = write_payloads(&dir, &["a", "b"]);

        let (manager, report) = build_manager(&paths, create_store());
        assert!(report.similarity_loaded);
        assert_eq!(report.donors, 0);
        assert_eq!(report.curve_points, 1);
        assert!(report.locale_loaded);
        assert_eq!(report.locales, 1);
        assert_eq!(manager.recommender_names(), vec!["similarity", "locale"]);
    }

    #[test]
    fn test_build_manager_with_missing_files() {
        let dir = TempDir::new().unwrap();
        let paths = DataPaths {
            donors: dir.path().join("missing-donors.json"),
            lr_curves: dir.path().join("missing-curves.json"),
            locale: dir.path().join("missing-locale.json"),
        };

        let (manager, report) = build_manager(&paths, create_store());
        assert!(report.is_empty());
        assert!(manager.recommend("client-1", 10).unwrap().is_empty());
    }

    #[test]
    fn test_swap_is_visible_to_new_requests_only() {
        let dir = TempDir::new().unwrap();
        let store = create_store();

        let (first, _) = build_manager(&write_payloads(&dir, &["old"]), store.clone());
        let handle = ManagerHandle::new(first);
        let in_flight = handle.current();

        let (second, _) = build_manager(&write_payloads(&dir, &["new"]), store);
        let previous = handle.swap(second);

        assert!(Arc::ptr_eq(&previous, &in_flight));
        assert_eq!(in_flight.recommend("client-1", 10).unwrap(), vec!["old"]);
        assert_eq!(handle.recommend("client-1", 10).unwrap().results, vec!["new"]);
    }
}
