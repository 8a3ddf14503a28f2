//! TOML configuration for the dispatch service, backends and wrappers.

use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::tracking::form::FormTrackingConfig;
use crate::tracking::performance::PerformanceConfig;
use crate::tracking::scroll::ScrollTrackingConfig;

/// Application-level analytics configuration.
///
/// ```rust
/// use oxide_track::AnalyticsConfig;
///
/// let config = AnalyticsConfig::from_toml_str(r#"
///     enabled = true
///
///     [google_analytics]
///     measurement_id = "G-TEST"
///
///     [scroll]
///     screen_name = "Job Description"
///     depth_markers = [25, 50, 75, 90, 100]
/// "#).unwrap();
///
/// assert_eq!(config.google_analytics.unwrap().measurement_id, "G-TEST");
/// assert_eq!(config.scroll.unwrap().debounce_ms, 100);
/// ```
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub enabled: bool,
    /// Log every tracked call. Defaults to on in debug builds.
    pub debug: bool,
    pub google_analytics: Option<GoogleAnalyticsConfig>,
    pub mixpanel: Option<MixpanelConfig>,
    pub scroll: Option<ScrollTrackingConfig>,
    pub performance: Option<PerformanceConfig>,
    pub form: Option<FormTrackingConfig>,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            debug: cfg!(debug_assertions),
            google_analytics: None,
            mixpanel: None,
            scroll: None,
            performance: None,
            form: None,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct GoogleAnalyticsConfig {
    pub measurement_id: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct MixpanelConfig {
    pub token: String,
}

impl AnalyticsConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }
}
