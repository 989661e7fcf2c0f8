//! # Cardiorisk
//!
//! Terminal client for a remote cardiovascular-risk prediction service.
//!
//! This crate provides:
//! - A five-step questionnaire that gates submission on field validation
//! - A results screen with live what-if simulation against the service
//! - A health probe suitable for keeping a sleeping host awake
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core types (patient record, field domains, predictions)
//! - `ports`: Trait definitions for the prediction service
//! - `adapters`: Concrete implementations (reqwest client, log sanitizer)
//! - `application`: Wizard, simulation engine and display derivation
//! - `tui`: Terminal user interface

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod tui;

pub use config::AppConfig;
pub use domain::{PatientRecord, RiskLevel, RiskPrediction, ValidRecord};

/// Result type for Cardiorisk operations
pub type Result<T> = std::result::Result<T, CardioError>;

/// Main error type for Cardiorisk
#[derive(Debug, thiserror::Error)]
pub enum CardioError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Prediction failed: {0}")]
    Prediction(#[from] ports::PredictionError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errors_convert_into_cardio_error() {
        let err: CardioError = config::ConfigError::Invalid {
            key: "CARDIORISK_DEBOUNCE_MS",
            value: "soon".to_string(),
        }
        .into();
        assert!(matches!(err, CardioError::Config(_)));
        assert_eq!(
            err.to_string(),
            "Configuration error: Invalid value for CARDIORISK_DEBOUNCE_MS: \"soon\""
        );

        let err: CardioError = ports::PredictionError::network("timed out").into();
        assert_eq!(err.to_string(), "Prediction failed: Network error: timed out");
    }
}
