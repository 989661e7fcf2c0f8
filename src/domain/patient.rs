//! Patient record types for cardiovascular risk prediction.
//!
//! Field set and domains follow the cardiovascular-disease dataset the
//! prediction service was trained on (11 features).

use serde::{Deserialize, Serialize, Serializer};

/// Answers collected by the assessment questionnaire.
///
/// Every field is a plain number so that a record can be transiently out of
/// domain while it is being edited. Validity is a whole-record property, see
/// [`crate::domain::validate`].
///
/// Serializes to the prediction service's request body: wire field names,
/// whole numbers as JSON integers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    /// Age in years (30-70)
    #[serde(serialize_with = "wire_number")]
    pub age: f64,

    /// Gender: 1 = female, 2 = male
    #[serde(serialize_with = "wire_number")]
    pub gender: f64,

    /// Height in cm (140-210)
    #[serde(serialize_with = "wire_number")]
    pub height: f64,

    /// Weight in kg (35-200)
    #[serde(serialize_with = "wire_number")]
    pub weight: f64,

    /// Systolic blood pressure in mmHg (80-200)
    #[serde(rename = "ap_hi", serialize_with = "wire_number")]
    pub systolic_pressure: f64,

    /// Diastolic blood pressure in mmHg (50-150)
    #[serde(rename = "ap_lo", serialize_with = "wire_number")]
    pub diastolic_pressure: f64,

    /// Cholesterol: 1 = normal, 2 = above normal, 3 = well above normal
    #[serde(serialize_with = "wire_number")]
    pub cholesterol: f64,

    /// Glucose: 1 = normal, 2 = above normal, 3 = well above normal
    #[serde(rename = "gluc", serialize_with = "wire_number")]
    pub glucose: f64,

    /// Smoker: 0 = no, 1 = yes
    #[serde(rename = "smoke", serialize_with = "wire_number")]
    pub smoker: f64,

    /// Alcohol intake: 0 = no, 1 = yes
    #[serde(rename = "alco", serialize_with = "wire_number")]
    pub alcohol_use: f64,

    /// Physically active: 0 = no, 1 = yes
    #[serde(rename = "active", serialize_with = "wire_number")]
    pub physically_active: f64,
}

impl Default for PatientRecord {
    /// Questionnaire starting point: a 50 year old active, non-smoking woman
    /// with normal labs and 120/80 blood pressure.
    fn default() -> Self {
        Self {
            age: 50.0,
            gender: Gender::Female.code(),
            height: 165.0,
            weight: 70.0,
            systolic_pressure: 120.0,
            diastolic_pressure: 80.0,
            cholesterol: 1.0,
            glucose: 1.0,
            smoker: 0.0,
            alcohol_use: 0.0,
            physically_active: 1.0,
        }
    }
}

impl PatientRecord {
    /// Read a single field.
    #[must_use]
    pub fn get(&self, field: Field) -> f64 {
        match field {
            Field::Age => self.age,
            Field::Gender => self.gender,
            Field::Height => self.height,
            Field::Weight => self.weight,
            Field::SystolicPressure => self.systolic_pressure,
            Field::DiastolicPressure => self.diastolic_pressure,
            Field::Cholesterol => self.cholesterol,
            Field::Glucose => self.glucose,
            Field::Smoker => self.smoker,
            Field::AlcoholUse => self.alcohol_use,
            Field::PhysicallyActive => self.physically_active,
        }
    }

    /// Overwrite a single field.
    pub fn set(&mut self, field: Field, value: f64) {
        let slot = match field {
            Field::Age => &mut self.age,
            Field::Gender => &mut self.gender,
            Field::Height => &mut self.height,
            Field::Weight => &mut self.weight,
            Field::SystolicPressure => &mut self.systolic_pressure,
            Field::DiastolicPressure => &mut self.diastolic_pressure,
            Field::Cholesterol => &mut self.cholesterol,
            Field::Glucose => &mut self.glucose,
            Field::Smoker => &mut self.smoker,
            Field::AlcoholUse => &mut self.alcohol_use,
            Field::PhysicallyActive => &mut self.physically_active,
        };
        *slot = value;
    }

    /// Whether a boolean-as-number field is set.
    #[must_use]
    pub fn flag(&self, field: Field) -> bool {
        self.get(field) >= 1.0
    }

    /// Body mass index in kg/m², unrounded.
    #[must_use]
    pub fn bmi(&self) -> f64 {
        let meters = self.height / 100.0;
        self.weight / (meters * meters)
    }
}

/// Whole numbers go on the wire as JSON integers.
fn wire_number<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.fract() == 0.0 && value.abs() < 9.0e15 {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

/// Gender codes used by the prediction service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Female,
    Male,
}

impl Gender {
    #[must_use]
    pub fn code(self) -> f64 {
        match self {
            Self::Female => 1.0,
            Self::Male => 2.0,
        }
    }

    /// Exact inverse of [`Gender::code`].
    #[must_use]
    pub fn from_code(value: f64) -> Option<Self> {
        [Self::Female, Self::Male]
            .into_iter()
            .find(|gender| gender.code() == value)
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Female => "Female",
            Self::Male => "Male",
        }
    }
}

/// Value domain of a field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldDomain {
    /// Inclusive numeric range.
    Range { min: f64, max: f64, integer: bool },
    /// One of an enumerated set of integer codes.
    OneOf(&'static [f64]),
}

impl FieldDomain {
    /// Whether `value` lies inside the domain.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        if !value.is_finite() {
            return false;
        }
        match *self {
            Self::Range { min, max, integer } => {
                (min..=max).contains(&value) && (!integer || value.fract() == 0.0)
            }
            Self::OneOf(allowed) => allowed.iter().any(|&a| a == value),
        }
    }

    /// Smallest and largest admissible value.
    #[must_use]
    pub fn bounds(&self) -> (f64, f64) {
        match *self {
            Self::Range { min, max, .. } => (min, max),
            Self::OneOf(allowed) => {
                let min = allowed.iter().copied().fold(f64::INFINITY, f64::min);
                let max = allowed.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                (min, max)
            }
        }
    }
}

impl std::fmt::Display for FieldDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Range { min, max, .. } => write!(f, "between {min} and {max}"),
            Self::OneOf(allowed) => {
                let codes: Vec<String> = allowed.iter().map(|a| a.to_string()).collect();
                write!(f, "one of {}", codes.join(", "))
            }
        }
    }
}

const GENDER_CODES: &[f64] = &[1.0, 2.0];
const ORDINAL_CODES: &[f64] = &[1.0, 2.0, 3.0];
const BINARY_CODES: &[f64] = &[0.0, 1.0];

/// Fields of a [`PatientRecord`], in questionnaire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Age,
    Gender,
    Height,
    Weight,
    SystolicPressure,
    DiastolicPressure,
    Cholesterol,
    Glucose,
    Smoker,
    AlcoholUse,
    PhysicallyActive,
}

impl Field {
    /// All fields in declaration order.
    pub const ALL: [Field; 11] = [
        Field::Age,
        Field::Gender,
        Field::Height,
        Field::Weight,
        Field::SystolicPressure,
        Field::DiastolicPressure,
        Field::Cholesterol,
        Field::Glucose,
        Field::Smoker,
        Field::AlcoholUse,
        Field::PhysicallyActive,
    ];

    /// Name used on the wire by the prediction service.
    #[must_use]
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Age => "age",
            Self::Gender => "gender",
            Self::Height => "height",
            Self::Weight => "weight",
            Self::SystolicPressure => "ap_hi",
            Self::DiastolicPressure => "ap_lo",
            Self::Cholesterol => "cholesterol",
            Self::Glucose => "gluc",
            Self::Smoker => "smoke",
            Self::AlcoholUse => "alco",
            Self::PhysicallyActive => "active",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Age => "Age",
            Self::Gender => "Gender",
            Self::Height => "Height",
            Self::Weight => "Weight",
            Self::SystolicPressure => "Systolic Pressure",
            Self::DiastolicPressure => "Diastolic Pressure",
            Self::Cholesterol => "Cholesterol",
            Self::Glucose => "Glucose",
            Self::Smoker => "Smoking",
            Self::AlcoholUse => "Alcohol Intake",
            Self::PhysicallyActive => "Physical Activity",
        }
    }

    /// Display unit, if any.
    #[must_use]
    pub fn unit(self) -> Option<&'static str> {
        match self {
            Self::Age => Some("years"),
            Self::Height => Some("cm"),
            Self::Weight => Some("kg"),
            Self::SystolicPressure | Self::DiastolicPressure => Some("mmHg"),
            _ => None,
        }
    }

    #[must_use]
    pub fn domain(self) -> FieldDomain {
        match self {
            Self::Age => FieldDomain::Range { min: 30.0, max: 70.0, integer: true },
            Self::Gender => FieldDomain::OneOf(GENDER_CODES),
            Self::Height => FieldDomain::Range { min: 140.0, max: 210.0, integer: false },
            Self::Weight => FieldDomain::Range { min: 35.0, max: 200.0, integer: false },
            Self::SystolicPressure => FieldDomain::Range { min: 80.0, max: 200.0, integer: true },
            Self::DiastolicPressure => FieldDomain::Range { min: 50.0, max: 150.0, integer: true },
            Self::Cholesterol | Self::Glucose => FieldDomain::OneOf(ORDINAL_CODES),
            Self::Smoker | Self::AlcoholUse | Self::PhysicallyActive => {
                FieldDomain::OneOf(BINARY_CODES)
            }
        }
    }

    /// Whether the field is chosen from a fixed set of codes.
    #[must_use]
    pub fn is_choice(self) -> bool {
        matches!(self.domain(), FieldDomain::OneOf(_))
    }

    /// Text shown for a coded value (`None` for numeric fields).
    #[must_use]
    pub fn choice_label(self, value: f64) -> Option<&'static str> {
        if self == Self::Gender {
            return Gender::from_code(value).map(Gender::label);
        }
        // Only exact codes have a label; 1.5 must not read as 1.
        if !value.is_finite() || value.fract() != 0.0 {
            return None;
        }
        let code = value as i64;
        let label = match (self, code) {
            (Self::Cholesterol | Self::Glucose, 1) => "Normal",
            (Self::Cholesterol | Self::Glucose, 2) => "Above Normal",
            (Self::Cholesterol | Self::Glucose, 3) => "Well Above Normal",
            (Self::Smoker, 0) => "Non-Smoker",
            (Self::Smoker, 1) => "Smoker",
            (Self::AlcoholUse, 0) => "No Alcohol",
            (Self::AlcoholUse, 1) => "Drinks Alcohol",
            (Self::PhysicallyActive, 0) => "Sedentary",
            (Self::PhysicallyActive, 1) => "Active",
            _ => return None,
        };
        Some(label)
    }

    /// Coerce text input into a numeric value.
    ///
    /// Only checks that the text is a finite number; domain membership is
    /// left to the validator.
    ///
    /// # Errors
    /// Returns a `NotANumber` field error for empty or non-numeric input.
    pub fn parse_value(self, input: &str) -> Result<f64, crate::domain::FieldError> {
        input
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| crate::domain::FieldError::not_a_number(self, input))
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
