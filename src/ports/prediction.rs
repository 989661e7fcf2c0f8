//! Prediction port: Trait for the external risk prediction service.
//!
//! This trait abstracts the transport (HTTP) from the application logic, so
//! the wizard and simulation can be driven by an in-memory client in tests.

use crate::domain::{ModelInfo, RiskPrediction, ValidRecord};

/// Errors that can occur while talking to the prediction service.
///
/// The two variants are kept apart so the UI can tell "couldn't reach the
/// service" from "the service answered with something unusable".
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PredictionError {
    /// Service unreachable, timed out, or answered with a non-2xx status.
    #[error("Network error{}: {detail}", http_suffix(.status))]
    Network { status: Option<u16>, detail: String },

    /// Response body could not be interpreted.
    #[error("Service error: {0}")]
    Service(String),
}

fn http_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

impl PredictionError {
    pub fn network(detail: impl Into<String>) -> Self {
        Self::Network {
            status: None,
            detail: detail.into(),
        }
    }

    /// Message suitable for showing to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Network { status: None, .. } => {
                "Couldn't reach the prediction service. Check your connection and try again."
                    .to_string()
            }
            Self::Network {
                status: Some(_),
                detail,
            } => format!("The prediction service rejected the request: {detail}"),
            Self::Service(_) => {
                "The prediction service returned an unexpected response. Please try again later."
                    .to_string()
            }
        }
    }
}

/// Trait for the external prediction service.
///
/// Implementations are called from background workers, hence `Send + Sync`.
pub trait PredictionClient: Send + Sync {
    /// Evaluate a validated patient record.
    ///
    /// # Errors
    /// Returns `PredictionError::Network` if the service cannot be reached or
    /// answers with a non-success status, `PredictionError::Service` if the
    /// response body is malformed.
    fn predict(&self, record: &ValidRecord) -> Result<RiskPrediction, PredictionError>;

    /// Check that the service is up.
    ///
    /// # Errors
    /// Returns `PredictionError::Network` if the service cannot be reached,
    /// times out, or answers with a non-success status.
    fn health(&self) -> Result<(), PredictionError>;

    /// [`PredictionClient::health`] as a yes/no answer.
    fn check_health(&self) -> bool {
        self.health().is_ok()
    }

    /// Describe the model behind the service.
    ///
    /// # Errors
    /// Same taxonomy as [`PredictionClient::predict`].
    fn model_info(&self) -> Result<ModelInfo, PredictionError>;
}

impl<C: PredictionClient + ?Sized> PredictionClient for std::sync::Arc<C> {
    fn predict(&self, record: &ValidRecord) -> Result<RiskPrediction, PredictionError> {
        (**self).predict(record)
    }

    fn health(&self) -> Result<(), PredictionError> {
        (**self).health()
    }

    fn model_info(&self) -> Result<ModelInfo, PredictionError> {
        (**self).model_info()
    }
}
