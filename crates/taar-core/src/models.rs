//! Core data models for the recommendation service

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Categorical telemetry fields, in feature-cache column order
pub const CATEGORICAL_FEATURES: [&str; 3] = ["geo_city", "locale", "os"];

/// Continuous telemetry fields, in feature-cache column order
pub const CONTINUOUS_FEATURES: [&str; 5] = [
    "subsession_length",
    "bookmark_count",
    "tab_open_count",
    "total_uri",
    "unique_tlds",
];

/// Telemetry profile of a single client
///
/// Every attribute is optional: a JSON `null` and a missing key both
/// deserialize to `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientProfile {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub geo_city: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub os: Option<String>,
    #[serde(default)]
    pub subsession_length: Option<f64>,
    #[serde(default)]
    pub bookmark_count: Option<f64>,
    #[serde(default)]
    pub tab_open_count: Option<f64>,
    #[serde(default)]
    pub total_uri: Option<f64>,
    #[serde(default)]
    pub unique_tlds: Option<f64>,
    #[serde(default)]
    pub installed_addons: Vec<String>,
}

impl ClientProfile {
    /// Categorical values in column order, or the name of the first missing field
    pub fn categorical_features(&self) -> Result<[&str; 3], &'static str> {
        let values = [&self.geo_city, &self.locale, &self.os];
        let mut out = [""; 3];
        for (idx, value) in values.iter().enumerate() {
            out[idx] = value.as_deref().ok_or(CATEGORICAL_FEATURES[idx])?;
        }
        Ok(out)
    }

    /// Continuous values in column order, or the name of the first missing field
    pub fn continuous_features(&self) -> Result<[f64; 5], &'static str> {
        let values = [
            self.subsession_length,
            self.bookmark_count,
            self.tab_open_count,
            self.total_uri,
            self.unique_tlds,
        ];
        let mut out = [0.0; 5];
        for (idx, value) in values.iter().enumerate() {
            out[idx] = value.ok_or(CONTINUOUS_FEATURES[idx])?;
        }
        Ok(out)
    }

    /// Name of the first similarity field that is missing, if any
    pub fn missing_similarity_field(&self) -> Option<&'static str> {
        self.categorical_features()
            .err()
            .or_else(|| self.continuous_features().err())
    }
}

/// Snapshot of a historical client used as a similarity reference point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DonorRecord {
    pub geo_city: String,
    pub locale: String,
    pub os: String,
    pub subsession_length: f64,
    pub bookmark_count: f64,
    pub tab_open_count: f64,
    pub total_uri: f64,
    pub unique_tlds: f64,
    #[serde(default)]
    pub active_addons: Vec<String>,
}

impl DonorRecord {
    pub fn categorical_features(&self) -> [&str; 3] {
        [&self.geo_city, &self.locale, &self.os]
    }

    pub fn continuous_features(&self) -> [f64; 5] {
        [
            self.subsession_length,
            self.bookmark_count,
            self.tab_open_count,
            self.total_uri,
            self.unique_tlds,
        ]
    }
}

/// One point of the likelihood-ratio calibration curve
///
/// Serialized as `[score, [numerator, denominator]]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, (f64, f64))", into = "(f64, (f64, f64))")]
pub struct CurvePoint {
    pub score: f64,
    pub numerator: f64,
    pub denominator: f64,
}

impl CurvePoint {
    pub fn new(score: f64, numerator: f64, denominator: f64) -> Self {
        Self {
            score,
            numerator,
            denominator,
        }
    }

    pub fn likelihood_ratio(&self) -> f64 {
        self.numerator / self.denominator
    }
}

impl From<(f64, (f64, f64))> for CurvePoint {
    fn from((score, (numerator, denominator)): (f64, (f64, f64))) -> Self {
        Self::new(score, numerator, denominator)
    }
}

impl From<CurvePoint> for (f64, (f64, f64)) {
    fn from(point: CurvePoint) -> Self {
        (point.score, (point.numerator, point.denominator))
    }
}

/// Empirical densities of good vs poor donors over composite distance scores
///
/// Points are kept in payload order; the curve is not required to be sorted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CalibrationCurve {
    points: Vec<CurvePoint>,
}

impl CalibrationCurve {
    pub fn new(points: Vec<CurvePoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[CurvePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Returns a description of the first point that cannot yield a ratio
    pub fn invalid_point(&self) -> Option<String> {
        self.points.iter().enumerate().find_map(|(idx, p)| {
            if !p.score.is_finite() || !p.numerator.is_finite() {
                Some(format!("point {} has a non-finite value", idx))
            } else if p.denominator == 0.0 || !p.denominator.is_finite() {
                Some(format!(
                    "point {} has an unusable denominator {}",
                    idx, p.denominator
                ))
            } else {
                None
            }
        })
    }
}

/// Top add-ons per locale, in ranked order
pub type LocaleTable = HashMap<String, Vec<String>>;

/// A recommendation outcome together with the strategy that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub client_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommender: Option<String>,
    pub results: Vec<String>,
}
