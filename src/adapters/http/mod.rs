//! HTTP adapter: Implementation of PredictionClient over the REST API.
//!
//! Endpoints:
//! - `POST /predict` with the wire-named patient record
//! - `GET /health` (any 2xx is healthy)
//! - `GET /model-info`
//!
//! Uses a blocking `reqwest` client; calls are made from background workers,
//! never from the UI loop.

use reqwest::blocking::{Client, Response};
use serde::Deserialize;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::domain::{ModelInfo, RiskLevel, RiskPrediction, ValidRecord};
use crate::ports::{PredictionClient, PredictionError};

/// Response body of `POST /predict`.
#[derive(Debug, Deserialize)]
struct WirePrediction {
    prediction: f64,
    probability: f64,
    risk_level: String,
    #[serde(default)]
    message: String,
}

/// Prediction client talking to the hosted REST service.
#[derive(Debug, Clone)]
pub struct HttpPredictionClient {
    config: ClientConfig,
    client: Client,
}

impl HttpPredictionClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    /// Returns `PredictionError::Network` if the HTTP client cannot be built
    /// (e.g. TLS backend initialisation failure).
    pub fn new(config: ClientConfig) -> Result<Self, PredictionError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| PredictionError::network(format!("HTTP client setup failed: {e}")))?;
        Ok(Self::with_client(config, client))
    }

    /// Use a preconfigured `reqwest` client.
    #[must_use]
    pub fn with_client(config: ClientConfig, client: Client) -> Self {
        Self { config, client }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Read the body of a response, mapping non-2xx statuses to network errors.
    fn read_body(response: Response) -> Result<String, PredictionError> {
        let status = response.status();
        let body = response
            .text()
            .map_err(|e| PredictionError::network(format!("failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(PredictionError::Network {
                status: Some(status.as_u16()),
                detail: error_detail(&body),
            });
        }
        Ok(body)
    }
}

impl PredictionClient for HttpPredictionClient {
    fn predict(&self, record: &ValidRecord) -> Result<RiskPrediction, PredictionError> {
        let url = self.url("/predict");
        tracing::debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .json(record)
            .send()
            .map_err(|e| PredictionError::network(describe_transport_error(&e)))?;

        parse_prediction(&Self::read_body(response)?)
    }

    fn health(&self) -> Result<(), PredictionError> {
        let url = self.url("/health");
        let response = self
            .client
            .get(&url)
            .timeout(self.config.health_timeout)
            .send()
            .map_err(|e| PredictionError::network(describe_transport_error(&e)))
            .inspect_err(|e| tracing::debug!("Health check failed: {}", e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        tracing::debug!("Health check returned HTTP {}", status);
        Err(PredictionError::Network {
            status: Some(status.as_u16()),
            detail: "Backend returned error".to_string(),
        })
    }

    fn model_info(&self) -> Result<ModelInfo, PredictionError> {
        let response = self
            .client
            .get(self.url("/model-info"))
            .send()
            .map_err(|e| PredictionError::network(describe_transport_error(&e)))?;

        let body = Self::read_body(response)?;
        serde_json::from_str(&body)
            .map_err(|e| PredictionError::Service(format!("malformed model info: {e}")))
    }
}

fn describe_transport_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "request timed out".to_string()
    } else if e.is_connect() {
        format!("connection failed: {e}")
    } else {
        e.to_string()
    }
}

/// Decode a `POST /predict` response body.
fn parse_prediction(body: &str) -> Result<RiskPrediction, PredictionError> {
    let wire: WirePrediction = serde_json::from_str(body)
        .map_err(|e| PredictionError::Service(format!("malformed prediction: {e}")))?;

    let risk_level: RiskLevel = wire.risk_level.parse().map_err(PredictionError::Service)?;
    let class = match wire.prediction {
        p if p == 0.0 => 0,
        p if p == 1.0 => 1,
        other => {
            return Err(PredictionError::Service(format!(
                "unexpected class label {other}"
            )))
        }
    };

    RiskPrediction::new(class, wire.probability, risk_level, wire.message)
        .map_err(PredictionError::Service)
}

/// Extract a readable reason from an error body.
///
/// The service reports `{"detail": ...}` where detail is a string or a list
/// of validation entries.
fn error_detail(body: &str) -> String {
    const FALLBACK: &str = "Failed to fetch prediction";

    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return FALLBACK.to_string();
    };
    match value.get("detail") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Array(items)) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            if messages.is_empty() {
                FALLBACK.to_string()
            } else {
                messages.join("; ")
            }
        }
        _ => FALLBACK.to_string(),
    }
}
