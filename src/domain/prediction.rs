//! Prediction result types.
//!
//! Represents the output of the external cardiovascular risk service.

use serde::{Deserialize, Serialize};

/// Risk band supplied by the prediction service.
///
/// The band is never derived locally from the probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    /// Low risk of cardiovascular disease
    Low,
    /// Moderate risk, monitoring recommended
    Moderate,
    /// High risk, consultation recommended
    High,
}

impl RiskLevel {
    /// Get a human-readable description.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Low => "Low risk - No significant indicators",
            Self::Moderate => "Moderate risk - Follow-up recommended",
            Self::High => "High risk - Consultation advised",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "Low"),
            Self::Moderate => write!(f, "Moderate"),
            Self::High => write!(f, "High"),
        }
    }
}

impl std::str::FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "moderate" | "medium" => Ok(Self::Moderate),
            "high" => Ok(Self::High),
            other => Err(format!("Unknown risk level: {other}")),
        }
    }
}

/// Result of evaluating one patient record.
///
/// Immutable: every evaluation produces a new value that replaces the old one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskPrediction {
    /// Binary class label (0 = no disease, 1 = disease present)
    pub prediction: u8,

    /// Probability of disease (0.0 to 1.0)
    pub probability: f64,

    /// Risk band attached by the service
    pub risk_level: RiskLevel,

    /// Human-readable summary from the service
    pub message: String,
}

impl RiskPrediction {
    /// Create a prediction, checking the probability range.
    ///
    /// # Errors
    /// Returns error if `probability` is not a finite number in [0, 1].
    pub fn new(
        prediction: u8,
        probability: f64,
        risk_level: RiskLevel,
        message: impl Into<String>,
    ) -> Result<Self, String> {
        if !probability.is_finite() || !(0.0..=1.0).contains(&probability) {
            return Err(format!("Probability {probability} out of range [0, 1]"));
        }

        Ok(Self {
            prediction,
            probability,
            risk_level,
            message: message.into(),
        })
    }
}

/// Description of the model behind the prediction service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub model_type: String,
    pub features: Vec<String>,
    pub n_features: usize,
    pub description: String,
}
