//! Runtime configuration sourced from the environment.
//!
//! Every setting has a default, so an empty environment yields a working
//! configuration pointed at the hosted prediction service.

use std::time::Duration;

use crate::application::PresentationConfig;

/// Hosted prediction backend.
pub const DEFAULT_API_URL: &str = "https://cardiovascular-disease-detector-backend.onrender.com";

const API_URL_ENV: &str = "CARDIORISK_API_URL";
const REQUEST_TIMEOUT_ENV: &str = "CARDIORISK_REQUEST_TIMEOUT_SECS";
const HEALTH_TIMEOUT_ENV: &str = "CARDIORISK_HEALTH_TIMEOUT_SECS";
const DEBOUNCE_ENV: &str = "CARDIORISK_DEBOUNCE_MS";
const HEART_AGE_BASE_ENV: &str = "CARDIORISK_HEART_AGE_BASE";
const HEART_AGE_SPREAD_ENV: &str = "CARDIORISK_HEART_AGE_SPREAD";
const SYSTOLIC_THRESHOLD_ENV: &str = "CARDIORISK_SYSTOLIC_THRESHOLD";

/// Error type for configuration loading.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Settings for the HTTP prediction client.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base URL of the prediction API (no trailing slash).
    pub base_url: String,
    /// Timeout for `/predict` and `/model-info`; `None` waits indefinitely.
    pub request_timeout: Option<Duration>,
    /// Timeout for the passive `/health` probe.
    pub health_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            request_timeout: Some(Duration::from_secs(30)),
            health_timeout: Duration::from_secs(5),
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub client: ClientConfig,
    /// Quiet period before a simulation edit is sent for re-evaluation.
    pub debounce: Duration,
    pub presentation: PresentationConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            client: ClientConfig::default(),
            debounce: Duration::from_millis(500),
            presentation: PresentationConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from process environment variables.
    ///
    /// # Errors
    /// Returns `ConfigError::Invalid` if a variable is set but malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// # Errors
    /// Returns `ConfigError::Invalid` if a value is present but malformed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let base_url = lookup(API_URL_ENV)
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.client.base_url);

        let request_timeout = match parse::<u64>(&lookup, REQUEST_TIMEOUT_ENV)? {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => defaults.client.request_timeout,
        };

        let health_timeout = parse::<u64>(&lookup, HEALTH_TIMEOUT_ENV)?
            .filter(|&secs| secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.client.health_timeout);

        let debounce = parse::<u64>(&lookup, DEBOUNCE_ENV)?
            .map(Duration::from_millis)
            .unwrap_or(defaults.debounce);

        let presentation = PresentationConfig {
            heart_age_base: parse(&lookup, HEART_AGE_BASE_ENV)?
                .unwrap_or(defaults.presentation.heart_age_base),
            heart_age_spread: parse_finite(&lookup, HEART_AGE_SPREAD_ENV)?
                .unwrap_or(defaults.presentation.heart_age_spread),
            systolic_threshold: parse_finite(&lookup, SYSTOLIC_THRESHOLD_ENV)?
                .unwrap_or(defaults.presentation.systolic_threshold),
        };

        Ok(Self {
            client: ClientConfig {
                base_url,
                request_timeout,
                health_timeout,
            },
            debounce,
            presentation,
        })
    }
}

fn parse<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
    }
}

/// Like [`parse`], but `inf` and `NaN` are rejected too.
fn parse_finite(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<f64>, ConfigError> {
    match parse::<f64>(lookup, key)? {
        Some(value) if !value.is_finite() => Err(ConfigError::Invalid {
            key,
            value: lookup(key).unwrap_or_default(),
        }),
        parsed => Ok(parsed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_from_empty_environment() {
        let config = AppConfig::from_lookup(|_| None).expect("Should load");
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.client.base_url, DEFAULT_API_URL);
        assert_eq!(config.client.health_timeout, Duration::from_secs(5));
        assert_eq!(config.debounce, Duration::from_millis(500));
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            (API_URL_ENV, "http://localhost:8000/"),
            (REQUEST_TIMEOUT_ENV, "0"),
            (DEBOUNCE_ENV, "250"),
            (SYSTOLIC_THRESHOLD_ENV, "140"),
        ]))
        .expect("Should load");

        assert_eq!(config.client.base_url, "http://localhost:8000");
        assert_eq!(config.client.request_timeout, None);
        assert_eq!(config.debounce, Duration::from_millis(250));
        assert!((config.presentation.systolic_threshold - 140.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_malformed_value_is_an_error() {
        let err = AppConfig::from_lookup(lookup_from(&[(DEBOUNCE_ENV, "soon")]))
            .expect_err("Should reject");
        assert_eq!(
            err,
            ConfigError::Invalid {
                key: DEBOUNCE_ENV,
                value: "soon".to_string()
            }
        );
    }

    #[test]
    fn test_non_finite_floats_are_rejected() {
        for key in [HEART_AGE_SPREAD_ENV, SYSTOLIC_THRESHOLD_ENV] {
            for raw in ["inf", "NaN", "-inf", "infinity"] {
                let err = AppConfig::from_lookup(lookup_from(&[(key, raw)]))
                    .expect_err("Should reject non-finite values");
                assert_eq!(
                    err,
                    ConfigError::Invalid {
                        key,
                        value: raw.to_string()
                    }
                );
            }
        }
    }

    #[test]
    fn test_extreme_heart_age_base_is_accepted() {
        let max = i64::MAX.to_string();
        let config = AppConfig::from_lookup(lookup_from(&[(HEART_AGE_BASE_ENV, max.as_str())]))
            .expect("Should load");
        assert_eq!(config.presentation.heart_age_base, i64::MAX);

        let err = AppConfig::from_lookup(lookup_from(&[(
            HEART_AGE_BASE_ENV,
            "99999999999999999999",
        )]))
        .expect_err("Should reject out-of-range integers");
        assert!(matches!(err, ConfigError::Invalid { key: HEART_AGE_BASE_ENV, .. }));
    }
}
