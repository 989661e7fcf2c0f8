//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement
//! the questionnaire, the initial assessment, and the live simulation.

mod assessment;
mod presentation;
mod simulation;
mod wizard;

pub use assessment::{AssessmentService, HealthReport};
pub use presentation::{
    derive, DisplayModel, FactorTone, KeyFactor, PresentationConfig, RiskHue, Trend,
};
pub use simulation::{
    Completion, RecordPatch, RequestTag, SessionId, SimulationEngine, SimulationIssue,
    SimulationRequest,
};
pub use wizard::{slider_bounds, AdvanceOutcome, WizardController, WizardState, WizardStep};
