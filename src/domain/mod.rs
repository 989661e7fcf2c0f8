//! Domain layer: Core business types and logic.
//!
//! This module contains pure Rust types with no I/O. Patient records are
//! validated as a whole before they may leave the process.

mod patient;
mod prediction;
mod validation;

pub use patient::{Field, FieldDomain, Gender, PatientRecord};
pub use prediction::{ModelInfo, RiskLevel, RiskPrediction};
pub use validation::{check_field, validate, FieldError, FieldErrorKind, FieldErrors, ValidRecord};
