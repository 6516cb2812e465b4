//! Loaders for the externally supplied JSON payloads
//!
//! Donor pools, calibration curves and locale tables are produced by
//! offline jobs and dropped on disk as JSON. Loaders report typed errors;
//! the `*_or_absent` helpers turn any failure into `None` so that a
//! strategy degrades to "cannot recommend" instead of failing startup.

use crate::error::DataError;
use crate::models::{CalibrationCurve, DonorRecord, LocaleTable};
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::{error, info};

/// Read and deserialize a JSON payload
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, DataError> {
    let bytes = std::fs::read(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let value = serde_json::from_slice(&bytes).map_err(|source| DataError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    info!(
        path = %path.display(),
        size_bytes = bytes.len(),
        checksum = %compute_checksum(&bytes),
        "Loaded data payload"
    );

    Ok(value)
}

/// Load the donor pool. An empty pool is a valid payload.
pub fn load_donors(path: &Path) -> Result<Vec<DonorRecord>, DataError> {
    read_json(path)
}

/// Load and validate the likelihood-ratio curve
pub fn load_curve(path: &Path) -> Result<CalibrationCurve, DataError> {
    let curve: CalibrationCurve = read_json(path)?;
    if curve.is_empty() {
        return Err(DataError::EmptyPayload(path.to_path_buf()));
    }
    if let Some(reason) = curve.invalid_point() {
        return Err(DataError::InvalidCurve(reason));
    }
    Ok(curve)
}

/// Load the top add-ons per locale table
pub fn load_locale_table(path: &Path) -> Result<LocaleTable, DataError> {
    read_json(path)
}

pub fn load_donors_or_absent(path: &Path) -> Option<Vec<DonorRecord>> {
    absent_on_error("donor list", path, load_donors(path))
}

pub fn load_curve_or_absent(path: &Path) -> Option<CalibrationCurve> {
    absent_on_error("lr curves", path, load_curve(path))
}

pub fn load_locale_table_or_absent(path: &Path) -> Option<LocaleTable> {
    absent_on_error("top addons per locale file", path, load_locale_table(path))
}

fn absent_on_error<T>(what: &str, path: &Path, result: Result<T, DataError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            error!(path = %path.display(), error = %e, "Cannot load the {}", what);
            None
        }
    }
}

/// Compute SHA256 checksum of a payload
pub fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_compute_checksum() {
        let checksum = compute_checksum(b"donors");
        assert_eq!(checksum.len(), 64);
        assert_eq!(checksum, compute_checksum(b"donors"));
    }

    #[test]
    fn test_load_donors() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "donors.json",
            r#"[{
                "geo_city": "Rome", "locale": "it-IT", "os": "Linux",
                "subsession_length": 10, "bookmark_count": 5, "tab_open_count": 3,
                "total_uri": 40, "unique_tlds": 7,
                "active_addons": ["a", "b"]
            }]"#,
        );

        let donors = load_donors(&path).unwrap();
        assert_eq!(donors.len(), 1);
        assert_eq!(donors[0].active_addons, vec!["a", "b"]);
        assert_eq!(donors[0].total_uri, 40.0);
    }

    #[test]
    fn test_missing_file_is_absent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nope.json");

        assert!(matches!(load_donors(&path), Err(DataError::Io { .. })));
        assert!(load_donors_or_absent(&path).is_none());
        assert!(load_curve_or_absent(&path).is_none());
        assert!(load_locale_table_or_absent(&path).is_none());
    }

    #[test]
    fn test_malformed_payload_is_absent() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "donors.json", "{not json");

        assert!(matches!(load_donors(&path), Err(DataError::Parse { .. })));
        assert!(load_donors_or_absent(&path).is_none());
    }

    #[test]
    fn test_empty_curve_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "lr_curves.json", "[]");

        assert!(matches!(load_curve(&path), Err(DataError::EmptyPayload(_))));
    }

    #[test]
    fn test_zero_denominator_curve_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "lr_curves.json", "[[0.0, [0.9, 0.0]]]");

        assert!(matches!(load_curve(&path), Err(DataError::InvalidCurve(_))));
        assert!(load_curve_or_absent(&path).is_none());
    }

    #[test]
    fn test_load_locale_table() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "locale.json", r#"{"en-US": ["x", "y"], "de": []}"#);

        let table = load_locale_table(&path).unwrap();
        assert_eq!(table["en-US"], vec!["x", "y"]);
        assert!(table["de"].is_empty());
    }
}
