//! First-match dispatch over an ordered list of recommenders

use super::Recommender;
use crate::error::RecommendError;
use crate::models::Recommendation;
use crate::profile::ProfileFetcher;
use std::sync::Arc;
use tracing::info;

/// A fixed, ordered collection of recommenders.
///
/// The order matters: more specific strategies should come before general
/// fallbacks, since only the first one able to serve a client is consulted.
pub struct RecommendationManager {
    profile_fetcher: Arc<dyn ProfileFetcher>,
    recommenders: Vec<Arc<dyn Recommender>>,
}

impl RecommendationManager {
    pub fn new(
        profile_fetcher: Arc<dyn ProfileFetcher>,
        recommenders: Vec<Arc<dyn Recommender>>,
    ) -> Self {
        info!(
            recommenders = ?recommenders.iter().map(|r| r.name()).collect::<Vec<_>>(),
            "Initializing recommendation manager"
        );
        Self {
            profile_fetcher,
            recommenders,
        }
    }

    /// Return recommendations for the given client.
    ///
    /// An unknown client, or one no recommender can serve, yields an empty list.
    pub fn recommend(
        &self,
        client_id: &str,
        limit: usize,
    ) -> Result<Vec<String>, RecommendError> {
        Ok(self.recommend_with_source(client_id, limit)?.results)
    }

    /// Same as `recommend`, also reporting which recommender answered
    pub fn recommend_with_source(
        &self,
        client_id: &str,
        limit: usize,
    ) -> Result<Recommendation, RecommendError> {
        let mut outcome = Recommendation {
            client_id: client_id.to_string(),
            recommender: None,
            results: Vec::new(),
        };

        let profile = match self.profile_fetcher.get(client_id) {
            Some(profile) => profile,
            None => {
                info!(client_id = %client_id, "Client profile not found");
                return Ok(outcome);
            }
        };

        let selected = self.recommenders.iter().find(|r| r.can_recommend(&profile));
        let recommender = match selected {
            Some(recommender) => recommender,
            None => {
                info!(client_id = %client_id, "No recommender can recommend addons");
                return Ok(outcome);
            }
        };

        info!(
            client_id = %client_id,
            recommender = %recommender,
            "Recommender selected"
        );
        let results = recommender.recommend(&profile, limit)?;
        if results.is_empty() {
            info!(
                client_id = %client_id,
                recommender = %recommender,
                "No recommendations"
            );
        }

        outcome.recommender = Some(recommender.name().to_string());
        outcome.results = results;
        Ok(outcome)
    }

    pub fn recommender_names(&self) -> Vec<&str> {
        self.recommenders.iter().map(|r| r.name()).collect()
    }
}
