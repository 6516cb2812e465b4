//! Locale-based recommendation
//!
//! Returns the most used add-ons for the client's locale, as computed by a
//! periodic offline job.

use super::Recommender;
use crate::data;
use crate::error::RecommendError;
use crate::models::{ClientProfile, LocaleTable};
use std::path::Path;
use tracing::error;

pub struct LocaleRecommender {
    top_addons_per_locale: Option<LocaleTable>,
}

impl LocaleRecommender {
    pub fn new(top_addons_per_locale: Option<LocaleTable>) -> Self {
        if top_addons_per_locale.is_none() {
            error!("Cannot load the top addons per locale table, locale recommender disabled");
        }
        Self {
            top_addons_per_locale,
        }
    }

    pub fn from_source(path: &Path) -> Self {
        Self::new(data::load_locale_table_or_absent(path))
    }

    pub fn is_loaded(&self) -> bool {
        self.top_addons_per_locale.is_some()
    }

    pub fn locale_count(&self) -> usize {
        self.top_addons_per_locale
            .as_ref()
            .map(|t| t.len())
            .unwrap_or(0)
    }
}

impl Recommender for LocaleRecommender {
    fn can_recommend(&self, profile: &ClientProfile) -> bool {
        let table = match self.top_addons_per_locale.as_ref() {
            Some(table) => table,
            None => return false,
        };

        profile
            .locale
            .as_deref()
            .and_then(|locale| table.get(locale))
            .map(|addons| !addons.is_empty())
            .unwrap_or(false)
    }

    fn recommend(
        &self,
        profile: &ClientProfile,
        limit: usize,
    ) -> Result<Vec<String>, RecommendError> {
        let table = self
            .top_addons_per_locale
            .as_ref()
            .ok_or(RecommendError::NotReady)?;
        let locale = profile
            .locale
            .as_deref()
            .ok_or(RecommendError::IncompleteProfile("locale"))?;

        Ok(table
            .get(locale)
            .map(|addons| addons.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    fn name(&self) -> &str {
        "locale"
    }
}
