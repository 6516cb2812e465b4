//! Add-on recommendation strategies
//!
//! This module provides:
//! - The `Recommender` contract shared by every strategy
//! - Similarity-based recommendation against a donor population
//! - Locale-based top add-on lookup
//! - The first-match `RecommendationManager` dispatcher

mod locale;
mod manager;
mod similarity;


pub use locale::LocaleRecommender;
pub use manager::RecommendationManager;
pub use similarity::{
    canberra_distance, hamming_distance, FeatureCache, SimilarityRecommender, SimilarityStats,
    GOOD_DONOR_LR, LOW_CONFIDENCE_LR, SIMILARITY_OFFSET,
};

use crate::error::RecommendError;
use crate::models::ClientProfile;
use std::fmt;

/// Trait for recommendation strategy implementations
pub trait Recommender: Send + Sync {
    /// Tell whether this strategy can serve the given client.
    ///
    /// Never fails: absent backing data or an incomplete profile yield `false`.
    fn can_recommend(&self, profile: &ClientProfile) -> bool;

    /// Return at most `limit` add-on identifiers for the client.
    ///
    /// Only called after `can_recommend` returned `true` for the same
    /// profile. An empty list is a valid outcome.
    fn recommend(&self, profile: &ClientProfile, limit: usize)
        -> Result<Vec<String>, RecommendError>;

    /// Stable strategy name for observability
    fn name(&self) -> &str;
}

impl fmt::Display for dyn Recommender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
