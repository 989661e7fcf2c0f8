//! Whole-record validation of patient answers.

use std::ops::Deref;

use serde::Serialize;

use super::patient::{Field, FieldDomain, PatientRecord};

/// Why a single field was rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldErrorKind {
    /// Input could not be coerced to a finite number.
    NotANumber { input: String },
    /// Value outside an inclusive range, or fractional where an integer is required.
    OutOfRange { value: f64, min: f64, max: f64 },
    /// Value not in the enumerated set of codes.
    NotAllowed { value: f64, allowed: Vec<f64> },
}

/// A rejected field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub field: Field,
    pub kind: FieldErrorKind,
}

impl FieldError {
    pub(crate) fn not_a_number(field: Field, input: &str) -> Self {
        Self {
            field,
            kind: FieldErrorKind::NotANumber {
                input: input.to_string(),
            },
        }
    }

    fn describe(&self) -> String {
        match &self.kind {
            FieldErrorKind::NotANumber { .. } => "invalid number".to_string(),
            FieldErrorKind::OutOfRange { value, min, max } => {
                if value.is_finite() && value.fract() != 0.0 && (*min..=*max).contains(value) {
                    "must be a whole number".to_string()
                } else {
                    format!("value must be between {min} and {max}")
                }
            }
            FieldErrorKind::NotAllowed { allowed, .. } => {
                let codes: Vec<String> = allowed.iter().map(|a| a.to_string()).collect();
                format!("value must be one of {}", codes.join(", "))
            }
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.describe())
    }
}

impl std::error::Error for FieldError {}

/// Every field error found in one record, in field declaration order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldErrors {
    errors: Vec<FieldError>,
}

impl FieldErrors {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Fields with at least one violation.
    #[must_use]
    pub fn fields(&self) -> Vec<Field> {
        self.errors.iter().map(|e| e.field).collect()
    }

    #[must_use]
    pub fn contains(&self, field: Field) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// Error reported for `field`, if any.
    #[must_use]
    pub fn get(&self, field: Field) -> Option<&FieldError> {
        self.errors.iter().find(|e| e.field == field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    /// Keep only the errors for the given fields.
    #[must_use]
    pub fn restricted_to(&self, fields: &[Field]) -> Self {
        Self {
            errors: self
                .errors
                .iter()
                .filter(|e| fields.contains(&e.field))
                .cloned()
                .collect(),
        }
    }

    /// Drop the error reported for `field`.
    pub fn clear(&mut self, field: Field) {
        self.errors.retain(|e| e.field != field);
    }

    pub(crate) fn push(&mut self, error: FieldError) {
        self.errors.push(error);
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lines: Vec<String> = self.errors.iter().map(ToString::to_string).collect();
        f.write_str(&lines.join("\n"))
    }
}

impl std::error::Error for FieldErrors {}

/// A record that passed [`validate`].
///
/// Only the validator can construct one, so anything that accepts a
/// `ValidRecord` can rely on every field being inside its domain.
/// Serializes exactly like the wrapped record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidRecord(PatientRecord);

impl ValidRecord {
    #[must_use]
    pub fn record(&self) -> &PatientRecord {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> PatientRecord {
        self.0
    }
}

impl Deref for ValidRecord {
    type Target = PatientRecord;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Check one field's value against its domain.
///
/// # Errors
/// Returns the violation for this field.
pub fn check_field(field: Field, value: f64) -> Result<(), FieldError> {
    let domain = field.domain();
    if domain.contains(value) {
        return Ok(());
    }
    if !value.is_finite() {
        return Err(FieldError::not_a_number(field, &value.to_string()));
    }
    let kind = match domain {
        FieldDomain::Range { min, max, .. } => FieldErrorKind::OutOfRange { value, min, max },
        FieldDomain::OneOf(allowed) => FieldErrorKind::NotAllowed {
            value,
            allowed: allowed.to_vec(),
        },
    };
    Err(FieldError { field, kind })
}

/// Validate a whole record.
///
/// Reports every violated field rather than stopping at the first one.
///
/// # Errors
/// Returns all field violations when any field is out of domain.
pub fn validate(record: &PatientRecord) -> Result<ValidRecord, FieldErrors> {
    let mut errors = FieldErrors::default();
    for field in Field::ALL {
        if let Err(e) = check_field(field, record.get(field)) {
            errors.push(e);
        }
    }

    if errors.is_empty() {
        Ok(ValidRecord(*record))
    } else {
        Err(errors)
    }
}
