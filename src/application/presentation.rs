//! Display model: derives what the results screen shows from a prediction.
//!
//! Everything here is a pure function of its inputs and safe to call on
//! every frame.

use crate::domain::{Field, PatientRecord, RiskLevel, RiskPrediction};

/// Tunable presentation heuristics.
///
/// The heart age formula and the blood pressure threshold are illustrative
/// display aids without clinical grounding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PresentationConfig {
    /// Heart age shown for a probability of zero.
    pub heart_age_base: i64,
    /// Years added across the full probability range.
    pub heart_age_spread: f64,
    /// Systolic pressure above which blood pressure is flagged.
    pub systolic_threshold: f64,
}

impl Default for PresentationConfig {
    fn default() -> Self {
        Self {
            heart_age_base: 38,
            heart_age_spread: 25.0,
            systolic_threshold: 130.0,
        }
    }
}

/// Colour family for the risk band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskHue {
    Ok,
    Warning,
    Alert,
}

impl From<RiskLevel> for RiskHue {
    fn from(level: RiskLevel) -> Self {
        match level {
            RiskLevel::High => Self::Alert,
            RiskLevel::Moderate => Self::Warning,
            RiskLevel::Low => Self::Ok,
        }
    }
}

/// Direction of the change from the baseline prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Up,
    Flat,
    Down,
}

/// Styling tag for a key factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactorTone {
    Good,
    Warning,
    Neutral,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyFactor {
    pub label: &'static str,
    pub value: String,
    pub tone: FactorTone,
}

/// Display-ready quantities for the results screen.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayModel {
    /// Probability as a whole percentage.
    pub percentage: i64,
    /// Percentage points versus the baseline; positive is worse.
    pub risk_delta: i64,
    pub trend: Trend,
    /// Illustrative "heart age"; not a medical claim.
    pub derived_age: i64,
    /// Body mass index rounded to one decimal.
    pub bmi: f64,
    pub risk_level: RiskLevel,
    pub hue: RiskHue,
    pub key_factors: Vec<KeyFactor>,
}

/// Derive the display model for `record` and its `prediction`.
#[must_use]
pub fn derive(
    record: &PatientRecord,
    prediction: &RiskPrediction,
    baseline: &RiskPrediction,
    config: &PresentationConfig,
) -> DisplayModel {
    let percentage = (prediction.probability * 100.0).round() as i64;
    let risk_delta = ((prediction.probability - baseline.probability) * 100.0).round() as i64;
    let trend = match risk_delta.signum() {
        1 => Trend::Up,
        -1 => Trend::Down,
        _ => Trend::Flat,
    };
    // Float-to-int casts saturate (NaN becomes 0), so only the add can overflow.
    let derived_age = config
        .heart_age_base
        .saturating_add((prediction.probability * config.heart_age_spread).round() as i64);
    let bmi = (record.bmi() * 10.0).round() / 10.0;

    DisplayModel {
        percentage,
        risk_delta,
        trend,
        derived_age,
        bmi,
        risk_level: prediction.risk_level,
        hue: prediction.risk_level.into(),
        key_factors: key_factors(record, bmi, config),
    }
}

fn key_factors(record: &PatientRecord, bmi: f64, config: &PresentationConfig) -> Vec<KeyFactor> {
    let high_pressure = record.systolic_pressure > config.systolic_threshold;
    let active = record.flag(Field::PhysicallyActive);

    vec![
        KeyFactor {
            label: "Blood Pressure",
            value: if high_pressure { "High" } else { "Optimal" }.to_string(),
            tone: if high_pressure {
                FactorTone::Warning
            } else {
                FactorTone::Good
            },
        },
        KeyFactor {
            label: "BMI",
            value: format!("{bmi:.1}"),
            tone: FactorTone::Neutral,
        },
        KeyFactor {
            label: "Lifestyle",
            value: if active { "Active" } else { "Sedentary" }.to_string(),
            tone: if active {
                FactorTone::Good
            } else {
                FactorTone::Warning
            },
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prediction(probability: f64, level: RiskLevel) -> RiskPrediction {
        RiskPrediction::new(u8::from(probability >= 0.5), probability, level, "test")
            .expect("valid probability")
    }

    #[test]
    fn test_reference_example() {
        let record = PatientRecord::default();
        let p = prediction(0.18, RiskLevel::Low);
        let model = derive(&record, &p, &p, &PresentationConfig::default());

        assert_eq!(model.percentage, 18);
        assert_eq!(model.risk_delta, 0);
        assert_eq!(model.trend, Trend::Flat);
        assert!((model.bmi - 25.7).abs() < 1e-9);
        assert_eq!(model.hue, RiskHue::Ok);
    }

    #[test]
    fn test_derived_age() {
        let record = PatientRecord::default();
        let config = PresentationConfig::default();
        let age = |p: f64| {
            let p = prediction(p, RiskLevel::Moderate);
            derive(&record, &p, &p, &config).derived_age
        };
        assert_eq!(age(0.0), 38);
        assert_eq!(age(0.6), 53);
        assert_eq!(age(1.0), 63);
    }

    #[test]
    fn test_delta_sign() {
        let record = PatientRecord::default();
        let baseline = prediction(0.40, RiskLevel::Moderate);
        let config = PresentationConfig::default();

        let worse = derive(&record, &prediction(0.72, RiskLevel::High), &baseline, &config);
        assert_eq!(worse.risk_delta, 32);
        assert_eq!(worse.trend, Trend::Up);
        assert_eq!(worse.hue, RiskHue::Alert);

        let better = derive(&record, &prediction(0.31, RiskLevel::Moderate), &baseline, &config);
        assert_eq!(better.risk_delta, -9);
        assert_eq!(better.trend, Trend::Down);
        assert_eq!(better.hue, RiskHue::Warning);
    }

    #[test]
    fn test_key_factors() {
        let record = PatientRecord {
            systolic_pressure: 145.0,
            physically_active: 0.0,
            ..PatientRecord::default()
        };
        let p = prediction(0.5, RiskLevel::Moderate);
        let model = derive(&record, &p, &p, &PresentationConfig::default());

        let values: Vec<(&str, &str, FactorTone)> = model
            .key_factors
            .iter()
            .map(|f| (f.label, f.value.as_str(), f.tone))
            .collect();
        assert_eq!(
            values,
            vec![
                ("Blood Pressure", "High", FactorTone::Warning),
                ("BMI", "25.7", FactorTone::Neutral),
                ("Lifestyle", "Sedentary", FactorTone::Warning),
            ]
        );
    }

    #[test]
    fn test_threshold_is_exclusive_and_configurable() {
        let record = PatientRecord {
            systolic_pressure: 130.0,
            ..PatientRecord::default()
        };
        let p = prediction(0.2, RiskLevel::Low);
        let default = derive(&record, &p, &p, &PresentationConfig::default());
        assert_eq!(default.key_factors[0].value, "Optimal");

        let strict = PresentationConfig {
            systolic_threshold: 120.0,
            ..PresentationConfig::default()
        };
        assert_eq!(derive(&record, &p, &p, &strict).key_factors[0].value, "High");
    }

    #[test]
    fn test_derive_is_deterministic() {
        let record = PatientRecord::default();
        let p = prediction(0.66, RiskLevel::High);
        let b = prediction(0.18, RiskLevel::Low);
        let config = PresentationConfig::default();
        assert_eq!(derive(&record, &p, &b, &config), derive(&record, &p, &b, &config));
    }

    #[test]
    fn test_extreme_heart_age_settings_saturate() {
        let record = PatientRecord::default();
        let p = prediction(0.18, RiskLevel::Low);

        let huge = PresentationConfig {
            heart_age_base: i64::MAX,
            heart_age_spread: 1e300,
            ..PresentationConfig::default()
        };
        assert_eq!(derive(&record, &p, &p, &huge).derived_age, i64::MAX);

        let negative = PresentationConfig {
            heart_age_base: i64::MIN,
            heart_age_spread: -1e300,
            ..PresentationConfig::default()
        };
        assert_eq!(derive(&record, &p, &p, &negative).derived_age, i64::MIN);

        let nan = PresentationConfig {
            heart_age_spread: f64::NAN,
            ..PresentationConfig::default()
        };
        assert_eq!(derive(&record, &p, &p, &nan).derived_age, 38);
    }
}
