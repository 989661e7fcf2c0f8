//! Assessment service: Submits completed questionnaires to the prediction
//! service and probes its health.
//!
//! This service coordinates:
//! - The single authoritative prediction for a finished wizard
//! - Passive health checks (landing screen, keep-alive pings)
//! - Model metadata lookup

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

use crate::domain::{ModelInfo, RiskPrediction, ValidRecord};
use crate::ports::{PredictionClient, PredictionError};

/// Outcome of a health probe.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub success: bool,
    pub response_time_ms: u128,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Why the probe failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// HTTP status of a failed check, when the service answered at all.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl HealthReport {
    /// Encode the report as a single JSON line.
    ///
    /// # Errors
    /// Returns `CardioError::Serialization` if encoding fails.
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Service wrapping a [`PredictionClient`] for the initial submission.
pub struct AssessmentService<C>
where
    C: PredictionClient,
{
    client: Arc<C>,
}

impl<C> Clone for AssessmentService<C>
where
    C: PredictionClient,
{
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
        }
    }
}

impl<C> AssessmentService<C>
where
    C: PredictionClient,
{
    /// Create a new assessment service.
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }

    /// Shared handle to the underlying client (used by simulation workers).
    #[must_use]
    pub fn client(&self) -> Arc<C> {
        Arc::clone(&self.client)
    }

    /// Request the authoritative prediction for a completed questionnaire.
    ///
    /// # Errors
    /// Propagates the client's network/service error unchanged.
    pub fn submit(&self, record: &ValidRecord) -> Result<RiskPrediction, PredictionError> {
        tracing::info!("Submitting assessment...");
        let started = Instant::now();

        match self.client.predict(record) {
            Ok(prediction) => {
                tracing::info!(
                    "Assessment complete: prediction={}, probability={:.2}%, risk={} ({} ms)",
                    prediction.prediction,
                    prediction.probability * 100.0,
                    prediction.risk_level,
                    started.elapsed().as_millis()
                );
                Ok(prediction)
            }
            Err(e) => {
                tracing::warn!("Assessment submission failed: {}", e);
                Err(e)
            }
        }
    }

    /// Probe the service and time the round trip.
    #[must_use]
    pub fn check_health(&self) -> HealthReport {
        let started = Instant::now();
        let outcome = self.client.health();
        let response_time_ms = started.elapsed().as_millis();

        let (error, status) = match outcome {
            Ok(()) => {
                tracing::info!("Prediction service is healthy ({} ms)", response_time_ms);
                (None, None)
            }
            Err(e) => {
                tracing::warn!(
                    "Prediction service health check failed ({} ms): {}",
                    response_time_ms,
                    e
                );
                match e {
                    PredictionError::Network { status, detail } => (Some(detail), status),
                    PredictionError::Service(detail) => (Some(detail), None),
                }
            }
        };

        HealthReport {
            success: error.is_none(),
            response_time_ms,
            timestamp: chrono::Utc::now(),
            error,
            status,
        }
    }

    /// Fetch model metadata.
    ///
    /// # Errors
    /// Propagates the client's network/service error unchanged.
    pub fn model_info(&self) -> Result<ModelInfo, PredictionError> {
        self.client.model_info().inspect_err(|e| {
            tracing::debug!("Model info unavailable: {}", e);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{AdvanceOutcome, WizardController, WizardStep};
    use crate::domain::{Field, RiskLevel};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory client returning a fixed answer and counting calls.
    struct FixedClient {
        answer: Result<RiskPrediction, PredictionError>,
        calls: AtomicUsize,
        healthy: bool,
    }

    impl FixedClient {
        fn new(answer: Result<RiskPrediction, PredictionError>) -> Self {
            Self {
                answer,
                calls: AtomicUsize::new(0),
                healthy: true,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl PredictionClient for FixedClient {
        fn predict(&self, _record: &ValidRecord) -> Result<RiskPrediction, PredictionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer.clone()
        }

        fn health(&self) -> Result<(), PredictionError> {
            if self.healthy {
                Ok(())
            } else {
                Err(PredictionError::Network {
                    status: Some(503),
                    detail: "Backend returned error".to_string(),
                })
            }
        }

        fn model_info(&self) -> Result<ModelInfo, PredictionError> {
            Err(PredictionError::Service("not served".to_string()))
        }
    }

    fn low_risk() -> RiskPrediction {
        RiskPrediction::new(0, 0.18, RiskLevel::Low, "Low risk").expect("valid")
    }

    /// Drive the wizard's last step the way the UI does.
    fn finish(
        wizard: &mut WizardController,
        service: &AssessmentService<FixedClient>,
    ) -> Option<Result<RiskPrediction, PredictionError>> {
        match wizard.advance() {
            AdvanceOutcome::Completed(record) => Some(service.submit(&record)),
            _ => None,
        }
    }

    fn wizard_at_last_step() -> WizardController {
        let mut wizard = WizardController::new();
        while wizard.step() != WizardStep::Habits {
            wizard.advance();
        }
        wizard
    }

    #[test]
    fn test_submit_valid_record() {
        let client = Arc::new(FixedClient::new(Ok(low_risk())));
        let service = AssessmentService::new(client.clone());
        let mut wizard = wizard_at_last_step();

        let result = finish(&mut wizard, &service).expect("submitted");
        assert_eq!(result, Ok(low_risk()));
        assert_eq!(client.calls(), 1);
    }

    #[test]
    fn test_invalid_record_never_reaches_client() {
        let client = Arc::new(FixedClient::new(Ok(low_risk())));
        let service = AssessmentService::new(client.clone());

        for field in Field::ALL {
            let mut wizard = wizard_at_last_step();
            let (_, max) = field.domain().bounds();
            wizard.set_field(field, max + 1.0);

            assert!(finish(&mut wizard, &service).is_none());
            assert_ne!(wizard.state(), crate::application::WizardState::Submitted);
        }
        assert_eq!(client.calls(), 0);
    }

    #[test]
    fn test_network_failure_is_surfaced() {
        let err = PredictionError::network("connection refused");
        let client = Arc::new(FixedClient::new(Err(err.clone())));
        let service = AssessmentService::new(client);
        let mut wizard = wizard_at_last_step();

        let result = finish(&mut wizard, &service).expect("submitted");
        assert_eq!(result, Err(err.clone()));

        wizard.submission_failed(err.user_message());
        assert_eq!(wizard.step(), WizardStep::Habits);
        assert!(wizard
            .submit_error()
            .is_some_and(|m| m.contains("Couldn't reach")));
    }

    #[test]
    fn test_health_report() {
        let service = AssessmentService::new(Arc::new(FixedClient::new(Ok(low_risk()))));
        let report = service.check_health();
        assert!(report.success);

        let json = serde_json::to_value(&report).expect("Should serialize");
        assert!(json.get("responseTimeMs").is_some());
        assert!(json.get("error").is_none());
        assert!(json.get("status").is_none());
    }

    #[test]
    fn test_failed_health_report_records_reason() {
        let mut client = FixedClient::new(Ok(low_risk()));
        client.healthy = false;
        let service = AssessmentService::new(Arc::new(client));
        let report = service.check_health();
        assert!(!report.success);
        assert_eq!(report.error.as_deref(), Some("Backend returned error"));
        assert_eq!(report.status, Some(503));

        let line = report.to_json().expect("Should encode the report");
        let json: serde_json::Value = serde_json::from_str(&line).expect("Should be JSON");
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "Backend returned error");
        assert_eq!(json["status"], 503);
    }
}
