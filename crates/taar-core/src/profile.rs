//! Client profile retrieval

use crate::data;
use crate::error::DataError;
use crate::models::ClientProfile;
use dashmap::DashMap;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// Source of client telemetry profiles keyed by client id
pub trait ProfileFetcher: Send + Sync {
    /// Return the profile of `client_id`, or `None` for an unknown client
    fn get(&self, client_id: &str) -> Option<ClientProfile>;
}

/// Concurrent in-memory profile store
#[derive(Debug, Default)]
pub struct InMemoryProfileStore {
    profiles: DashMap<String, ClientProfile>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load profiles from a JSON object of `client_id -> profile`
    pub fn from_file(path: &Path) -> Result<Self, DataError> {
        let profiles: HashMap<String, ClientProfile> = data::read_json(path)?;
        let store = Self::new();
        for (client_id, profile) in profiles {
            store.insert(client_id, profile);
        }
        info!(path = %path.display(), profiles = store.len(), "Loaded client profiles");
        Ok(store)
    }

    /// Insert or replace a profile. The stored `client_id` always matches the key.
    pub fn insert(&self, client_id: impl Into<String>, mut profile: ClientProfile) {
        let client_id = client_id.into();
        profile.client_id = Some(client_id.clone());
        self.profiles.insert(client_id, profile);
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl ProfileFetcher for InMemoryProfileStore {
    fn get(&self, client_id: &str) -> Option<ClientProfile> {
        self.profiles.get(client_id).map(|entry| entry.value().clone())
    }
}
