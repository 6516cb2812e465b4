//! Service configuration

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use taar_core::DataPaths;

/// Recommendation service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Instance name reported in structured logs
    #[serde(default = "default_instance")]
    pub instance: String,

    /// Port for the recommendation, health and metrics API
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Donor population payload
    #[serde(default = "default_donors_path")]
    pub donors_path: PathBuf,

    /// Likelihood ratio curve payload
    #[serde(default = "default_lr_curves_path")]
    pub lr_curves_path: PathBuf,

    /// Top add-ons per locale payload
    #[serde(default = "default_locale_path")]
    pub locale_path: PathBuf,

    /// Client profiles keyed by client id
    #[serde(default = "default_profiles_path")]
    pub profiles_path: PathBuf,

    /// Data reload interval in seconds, 0 disables periodic reloads
    #[serde(default = "default_reload_interval")]
    pub reload_interval_secs: u64,

    /// Number of add-ons returned when the request gives no limit
    #[serde(default = "default_limit")]
    pub default_limit: usize,

    /// Largest limit a request may ask for
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,

    /// Upper bound on a single recommendation computation
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

fn default_instance() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "taar".to_string())
}

fn default_api_port() -> u16 {
    8000
}

fn default_donors_path() -> PathBuf {
    PathBuf::from("data/donors.json")
}

fn default_lr_curves_path() -> PathBuf {
    PathBuf::from("data/lr_curves.json")
}

fn default_locale_path() -> PathBuf {
    PathBuf::from("data/top_addons_by_locale.json")
}

fn default_profiles_path() -> PathBuf {
    PathBuf::from("data/profiles.json")
}

fn default_reload_interval() -> u64 {
    3600
}

fn default_limit() -> usize {
    10
}

fn default_max_limit() -> usize {
    100
}

fn default_request_timeout() -> u64 {
    2000
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            instance: default_instance(),
            api_port: default_api_port(),
            donors_path: default_donors_path(),
            lr_curves_path: default_lr_curves_path(),
            locale_path: default_locale_path(),
            profiles_path: default_profiles_path(),
            reload_interval_secs: default_reload_interval(),
            default_limit: default_limit(),
            max_limit: default_max_limit(),
            request_timeout_ms: default_request_timeout(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from an optional `taar` config file and `TAAR_*` environment variables
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("taar").required(false))
            .add_source(config::Environment::with_prefix("TAAR"))
            .build()
            .context("Failed to read configuration")?;

        let config: Self = config
            .try_deserialize()
            .context("Invalid configuration")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.max_limit >= 1, "max_limit must be at least 1");
        anyhow::ensure!(
            (1..=self.max_limit).contains(&self.default_limit),
            "default_limit must be between 1 and max_limit ({})",
            self.max_limit
        );
        anyhow::ensure!(
            self.request_timeout_ms > 0,
            "request_timeout_ms must be positive"
        );
        Ok(())
    }

    pub fn data_paths(&self) -> DataPaths {
        DataPaths {
            donors: self.donors_path.clone(),
            lr_curves: self.lr_curves_path.clone(),
            locale: self.locale_path.clone(),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// `None` when periodic reloading is disabled
    pub fn reload_interval(&self) -> Option<Duration> {
        (self.reload_interval_secs > 0).then(|| Duration::from_secs(self.reload_interval_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.api_port, 8000);
        assert_eq!(config.default_limit, 10);
        assert_eq!(config.max_limit, 100);
        assert_eq!(config.request_timeout(), Duration::from_millis(2000));
        assert_eq!(config.reload_interval(), Some(Duration::from_secs(3600)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_interval_disables_reload() {
        let config = ServiceConfig {
            reload_interval_secs: 0,
            ..Default::default()
        };
        assert_eq!(config.reload_interval(), None);
    }

    #[test]
    fn test_default_limit_above_max_is_rejected() {
        let config = ServiceConfig {
            default_limit: 20,
            max_limit: 10,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_data_paths_follow_config() {
        let config = ServiceConfig {
            donors_path: PathBuf::from("/srv/donors.json"),
            ..Default::default()
        };
        assert_eq!(config.data_paths().donors, PathBuf::from("/srv/donors.json"));
        assert_eq!(config.data_paths().locale, default_locale_path());
    }
}
