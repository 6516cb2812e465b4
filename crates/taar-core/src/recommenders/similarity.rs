//! Similarity-based recommendation
//!
//! Ranks a population of donor clients by how closely their telemetry
//! matches the requesting client, converts each distance into a likelihood
//! ratio of being a "good" donor through an empirical calibration curve, and
//! returns the add-ons installed by the best donors.

use super::Recommender;
use crate::data;
use crate::error::RecommendError;
use crate::models::{
    CalibrationCurve, ClientProfile, DonorRecord, CATEGORICAL_FEATURES, CONTINUOUS_FEATURES,
};
use crate::observability::ServiceMetrics;
use nalgebra::DMatrix;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, error, warn};

/// Added to the continuous distance so that donors sharing the same
/// categorical distance are still separated by continuous closeness
pub const SIMILARITY_OFFSET: f64 = 0.001;

/// Donors above this likelihood ratio contribute add-ons
pub const GOOD_DONOR_LR: f64 = 1.0;

/// Best likelihood ratio below which the donor pool is considered a poor fit
pub const LOW_CONFIDENCE_LR: f64 = 2.0;

/// Canberra distance between two numeric vectors.
///
/// Positions where both values are zero contribute nothing.
pub fn canberra_distance<'a, 'b>(
    u: impl IntoIterator<Item = &'a f64>,
    v: impl IntoIterator<Item = &'b f64>,
) -> f64 {
    u.into_iter()
        .zip(v)
        .map(|(a, b)| {
            let denom = a.abs() + b.abs();
            if denom == 0.0 {
                0.0
            } else {
                (a - b).abs() / denom
            }
        })
        .sum()
}

/// Fraction of positions at which two vectors differ
pub fn hamming_distance<A, B>(u: &[A], v: &[B]) -> f64
where
    A: PartialEq<B>,
{
    if u.is_empty() {
        return 0.0;
    }
    let differing = u.iter().zip(v).filter(|(a, b)| *a != *b).count();
    differing as f64 / u.len() as f64
}

/// Donor feature matrices, built once per donor population
#[derive(Debug, Clone)]
pub struct FeatureCache {
    /// donors x continuous features
    continuous: DMatrix<f64>,
    /// donors x categorical features, compared as raw strings
    categorical: Vec<[String; 3]>,
}

impl FeatureCache {
    pub fn build(donors: &[DonorRecord]) -> Self {
        let continuous = DMatrix::from_fn(donors.len(), CONTINUOUS_FEATURES.len(), |row, col| {
            donors[row].continuous_features()[col]
        });

        let categorical = donors
            .iter()
            .map(|d| d.categorical_features().map(str::to_string))
            .collect();

        Self {
            continuous,
            categorical,
        }
    }

    pub fn num_donors(&self) -> usize {
        self.categorical.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categorical.is_empty()
    }

    /// Composite distance between the client and every donor, in donor order
    pub fn distances(&self, categorical: &[&str; 3], continuous: &[f64; 5]) -> Vec<f64> {
        (0..self.num_donors())
            .map(|idx| {
                let cont = canberra_distance(self.continuous.row(idx).iter(), continuous);
                let cat = hamming_distance(&self.categorical[idx], categorical);
                (cont + SIMILARITY_OFFSET) * cat
            })
            .collect()
    }
}

/// Everything the strategy needs once both payloads are available
struct LoadedData {
    donors: Vec<DonorRecord>,
    curve: CalibrationCurve,
    curve_scores: Vec<f64>,
    features: FeatureCache,
}

/// Recommender returning the add-ons of the most similar donors
pub struct SimilarityRecommender {
    data: Option<LoadedData>,
    recommendation_count: AtomicU64,
    low_confidence_count: AtomicU64,
    metrics: ServiceMetrics,
}

impl SimilarityRecommender {
    pub fn new(donors: Option<Vec<DonorRecord>>, curve: Option<CalibrationCurve>) -> Self {
        if donors.is_none() {
            error!("Cannot load the donor list, similarity recommender disabled");
        }
        let curve = curve.filter(|curve| {
            if curve.is_empty() {
                error!("Cannot load the lr curves, curve has no points");
                return false;
            }
            if let Some(reason) = curve.invalid_point() {
                error!(reason = %reason, "Cannot load the lr curves, curve is invalid");
                return false;
            }
            true
        });
        if curve.is_none() {
            error!("Cannot load the lr curves, similarity recommender disabled");
        }

        let data = match (donors, curve) {
            (Some(donors), Some(curve)) => {
                let features = FeatureCache::build(&donors);
                let curve_scores = curve.points().iter().map(|p| p.score).collect();
                debug!(
                    donors = donors.len(),
                    curve_points = curve.len(),
                    "Built similarity feature caches"
                );
                Some(LoadedData {
                    donors,
                    curve,
                    curve_scores,
                    features,
                })
            }
            _ => None,
        };

        Self {
            data,
            recommendation_count: AtomicU64::new(0),
            low_confidence_count: AtomicU64::new(0),
            metrics: ServiceMetrics::new(),
        }
    }

    /// Build from payload files, degrading when either cannot be loaded
    pub fn from_sources(donors_path: &Path, curve_path: &Path) -> Self {
        Self::new(
            data::load_donors_or_absent(donors_path),
            data::load_curve_or_absent(curve_path),
        )
    }

    pub fn is_loaded(&self) -> bool {
        self.data.is_some()
    }

    pub fn donor_count(&self) -> usize {
        self.data.as_ref().map(|d| d.donors.len()).unwrap_or(0)
    }

    pub fn curve_len(&self) -> usize {
        self.data.as_ref().map(|d| d.curve.len()).unwrap_or(0)
    }

    /// Likelihood ratio at the curve point nearest to `score`.
    ///
    /// Returns `None` when no curve is loaded. On equal distance the
    /// earliest point in the curve wins.
    pub fn likelihood_ratio(&self, score: f64) -> Option<f64> {
        let data = self.data.as_ref()?;
        let mut best_idx = 0;
        let mut best_diff = f64::INFINITY;
        for (idx, s) in data.curve_scores.iter().enumerate() {
            let diff = (score - s).abs();
            if diff < best_diff {
                best_diff = diff;
                best_idx = idx;
            }
        }
        data.curve
            .points()
            .get(best_idx)
            .map(|point| point.likelihood_ratio())
    }

    /// Donor indices with their likelihood ratios, best first.
    ///
    /// Equal ratios keep the original donor order.
    pub fn rank_donors(
        &self,
        profile: &ClientProfile,
    ) -> Result<Vec<(usize, f64)>, RecommendError> {
        let data = self.data.as_ref().ok_or(RecommendError::NotReady)?;
        if data.features.is_empty() {
            return Err(RecommendError::EmptyDonorPool);
        }

        let categorical = profile
            .categorical_features()
            .map_err(RecommendError::IncompleteProfile)?;
        let continuous = profile
            .continuous_features()
            .map_err(RecommendError::IncompleteProfile)?;

        let mut ranking = data
            .features
            .distances(&categorical, &continuous)
            .into_iter()
            .enumerate()
            .map(|(idx, distance)| {
                self.likelihood_ratio(distance)
                    .map(|lr| (idx, lr))
                    .ok_or(RecommendError::NotReady)
            })
            .collect::<Result<Vec<_>, _>>()?;

        // sort_by is stable, so ties stay in donor order
        ranking.sort_by(|a, b| b.1.total_cmp(&a.1));
        Ok(ranking)
    }

    pub fn stats(&self) -> SimilarityStats {
        SimilarityStats {
            recommendations: self.recommendation_count.load(Ordering::Relaxed),
            low_confidence: self.low_confidence_count.load(Ordering::Relaxed),
        }
    }
}

impl Recommender for SimilarityRecommender {
    fn can_recommend(&self, profile: &ClientProfile) -> bool {
        let data = match self.data.as_ref() {
            Some(data) => data,
            None => return false,
        };

        if data.donors.is_empty() {
            debug!("Donor pool is empty, similarity recommender cannot recommend");
            return false;
        }

        if let Some(field) = profile.missing_similarity_field() {
            // The client id may not be part of the profile, so log the field only
            error!(missing_field = field, "Unusable client data encountered");
            return false;
        }

        true
    }

    fn recommend(
        &self,
        profile: &ClientProfile,
        limit: usize,
    ) -> Result<Vec<String>, RecommendError> {
        let data = self.data.as_ref().ok_or(RecommendError::NotReady)?;
        let ranking = self.rank_donors(profile)?;
        self.recommendation_count.fetch_add(1, Ordering::Relaxed);

        let best_lr = ranking
            .first()
            .map(|(_, lr)| *lr)
            .ok_or(RecommendError::EmptyDonorPool)?;
        if best_lr < LOW_CONFIDENCE_LR {
            self.low_confidence_count.fetch_add(1, Ordering::Relaxed);
            self.metrics.inc_low_confidence_matches();
            warn!(
                maximum_similarity = best_lr,
                "Addons recommended with very low similarity score, perhaps donor set is unrepresentative"
            );
        }

        let mut recommendations = Vec::new();
        for (idx, _) in ranking.iter().take_while(|(_, lr)| *lr > GOOD_DONOR_LR) {
            recommendations.extend(data.donors[*idx].active_addons.iter().cloned());
            if recommendations.len() > limit {
                break;
            }
        }
        recommendations.truncate(limit);

        debug!(
            best_lr = best_lr,
            results = recommendations.len(),
            "Similarity recommendation computed"
        );
        Ok(recommendations)
    }

    fn name(&self) -> &str {
        "similarity"
    }
}

/// Counters for similarity recommendations served
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimilarityStats {
    pub recommendations: u64,
    pub low_confidence: u64,
}
