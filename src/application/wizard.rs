//! Assessment wizard: five-step questionnaire state machine.
//!
//! The controller owns the draft record and the step pointer. Forward
//! navigation is gated on the validity of the current step's fields, and the
//! last step validates the whole record before handing it out.

use crate::domain::{self, Field, FieldDomain, FieldErrors, PatientRecord, ValidRecord};

/// Questionnaire steps, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
    Profile,
    Activity,
    Vitals,
    Labs,
    Habits,
}

impl WizardStep {
    pub const ALL: [WizardStep; 5] = [
        WizardStep::Profile,
        WizardStep::Activity,
        WizardStep::Vitals,
        WizardStep::Labs,
        WizardStep::Habits,
    ];

    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Profile => "Personal Profile",
            Self::Activity => "Daily Activity",
            Self::Vitals => "Vital Signs",
            Self::Labs => "Lab Results",
            Self::Habits => "Lifestyle Habits",
        }
    }

    #[must_use]
    pub fn subtitle(self) -> &'static str {
        match self {
            Self::Profile => "Basic demographics",
            Self::Activity => "Establish your baseline",
            Self::Vitals => "Current measurements",
            Self::Labs => "Blood work indicators",
            Self::Habits => "Risk factors",
        }
    }

    /// Fields collected on this step.
    #[must_use]
    pub fn fields(self) -> &'static [Field] {
        match self {
            Self::Profile => &[Field::Age, Field::Gender],
            Self::Activity => &[Field::PhysicallyActive],
            Self::Vitals => &[
                Field::Height,
                Field::Weight,
                Field::SystolicPressure,
                Field::DiastolicPressure,
            ],
            Self::Labs => &[Field::Cholesterol, Field::Glucose],
            Self::Habits => &[Field::Smoker, Field::AlcoholUse],
        }
    }
}

/// Slider range offered for a numeric field.
///
/// Mostly the field's domain; the weight slider stops at 150 kg.
#[must_use]
pub fn slider_bounds(field: Field) -> (f64, f64) {
    match field {
        Field::Weight => (35.0, 150.0),
        other => other.domain().bounds(),
    }
}

/// Where the wizard currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardState {
    Step(WizardStep),
    /// The validated record has been handed out for submission.
    Submitted,
}

/// Result of [`WizardController::advance`].
#[derive(Debug, Clone, PartialEq)]
pub enum AdvanceOutcome {
    /// Moved forward to the given step.
    Moved(WizardStep),
    /// Stayed in place; the listed fields need attention.
    Blocked(FieldErrors),
    /// The whole record is valid and ready for submission.
    Completed(ValidRecord),
    /// Already submitted; nothing to do.
    AlreadySubmitted,
}

/// Controller for one questionnaire session.
#[derive(Debug, Clone)]
pub struct WizardController {
    state: WizardState,
    draft: PatientRecord,
    errors: FieldErrors,
    submit_error: Option<String>,
    scroll_requested: bool,
}

impl Default for WizardController {
    fn default() -> Self {
        Self::new()
    }
}

impl WizardController {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: WizardState::Step(WizardStep::Profile),
            draft: PatientRecord::default(),
            errors: FieldErrors::default(),
            submit_error: None,
            scroll_requested: false,
        }
    }

    #[must_use]
    pub fn state(&self) -> WizardState {
        self.state
    }

    /// Current step; the last step while submitted.
    #[must_use]
    pub fn step(&self) -> WizardStep {
        match self.state {
            WizardState::Step(step) => step,
            WizardState::Submitted => WizardStep::Habits,
        }
    }

    #[must_use]
    pub fn step_count(&self) -> usize {
        WizardStep::ALL.len()
    }

    #[must_use]
    pub fn draft(&self) -> &PatientRecord {
        &self.draft
    }

    /// Field errors surfaced by the last blocked advance.
    #[must_use]
    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// Message from a failed submission, if any.
    #[must_use]
    pub fn submit_error(&self) -> Option<&str> {
        self.submit_error.as_deref()
    }

    /// Consume the pending "scroll to top" signal raised by a transition.
    pub fn take_scroll_request(&mut self) -> bool {
        std::mem::take(&mut self.scroll_requested)
    }

    /// Set a draft field without validating it.
    pub fn set_field(&mut self, field: Field, value: f64) {
        if self.state == WizardState::Submitted {
            tracing::debug!("Ignoring edit to {} after submission", field.wire_name());
            return;
        }
        self.draft.set(field, value);
        self.errors.clear(field);
    }

    /// Slider/choice style adjustment, bounded by construction.
    ///
    /// Numeric fields move by `delta` and are clamped to the slider range.
    /// Choice fields step through their codes by the sign of `delta`.
    pub fn nudge(&mut self, field: Field, delta: f64) {
        let current = self.draft.get(field);
        let next = match field.domain() {
            FieldDomain::OneOf(codes) => {
                let position = codes.iter().position(|&c| c == current).unwrap_or(0);
                let target = if delta > 0.0 {
                    (position + 1).min(codes.len() - 1)
                } else if delta < 0.0 {
                    position.saturating_sub(1)
                } else {
                    position
                };
                codes[target]
            }
            FieldDomain::Range { .. } => {
                let (min, max) = slider_bounds(field);
                (current + delta).clamp(min, max)
            }
        };
        self.set_field(field, next);
    }

    /// Activity step shortcut: record the choice and advance immediately.
    pub fn select_activity(&mut self, active: bool) -> AdvanceOutcome {
        self.set_field(Field::PhysicallyActive, if active { 1.0 } else { 0.0 });
        self.advance()
    }

    /// Move forward one step, or complete the questionnaire on the last step.
    pub fn advance(&mut self) -> AdvanceOutcome {
        let WizardState::Step(step) = self.state else {
            return AdvanceOutcome::AlreadySubmitted;
        };

        let is_last = step.index() + 1 == WizardStep::ALL.len();
        match domain::validate(&self.draft) {
            Ok(valid) if is_last => {
                self.errors = FieldErrors::default();
                self.submit_error = None;
                self.state = WizardState::Submitted;
                self.scroll_requested = true;
                tracing::info!("Assessment complete, record handed out for submission");
                AdvanceOutcome::Completed(valid)
            }
            Err(errors) if is_last => {
                tracing::debug!("Final step blocked on {} field(s)", errors.len());
                self.errors = errors.clone();
                AdvanceOutcome::Blocked(errors)
            }
            result => {
                let step_errors = match result {
                    Ok(_) => FieldErrors::default(),
                    Err(errors) => errors.restricted_to(step.fields()),
                };
                if !step_errors.is_empty() {
                    self.errors = step_errors.clone();
                    return AdvanceOutcome::Blocked(step_errors);
                }

                let next = WizardStep::ALL[step.index() + 1];
                self.errors = FieldErrors::default();
                self.state = WizardState::Step(next);
                self.scroll_requested = true;
                AdvanceOutcome::Moved(next)
            }
        }
    }

    /// Move back one step. Returns `false` at the first step.
    pub fn retreat(&mut self) -> bool {
        let WizardState::Step(step) = self.state else {
            return false;
        };
        if step.index() == 0 {
            return false;
        }
        self.state = WizardState::Step(WizardStep::ALL[step.index() - 1]);
        self.errors = FieldErrors::default();
        self.scroll_requested = true;
        true
    }

    /// The initial prediction request failed: reopen the last step with the
    /// draft intact so the user can retry.
    pub fn submission_failed(&mut self, message: impl Into<String>) {
        if self.state == WizardState::Submitted {
            self.state = WizardState::Step(WizardStep::Habits);
        }
        self.submit_error = Some(message.into());
    }

    /// Start over with the default draft.
    pub fn reset(&mut self) {
        *self = Self::new();
        self.scroll_requested = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn advance_to(wizard: &mut WizardController, step: WizardStep) {
        while wizard.step() != step {
            assert!(matches!(wizard.advance(), AdvanceOutcome::Moved(_)));
        }
    }

    #[test]
    fn test_walk_through_with_defaults() {
        let mut wizard = WizardController::new();
        for expected in &WizardStep::ALL[1..] {
            assert_eq!(wizard.advance(), AdvanceOutcome::Moved(*expected));
        }
        match wizard.advance() {
            AdvanceOutcome::Completed(record) => {
                assert_eq!(*record.record(), PatientRecord::default());
            }
            other => panic!("Expected completion, got {other:?}"),
        }
        assert_eq!(wizard.state(), WizardState::Submitted);
        assert_eq!(wizard.advance(), AdvanceOutcome::AlreadySubmitted);
    }

    #[test]
    fn test_advance_then_retreat_keeps_draft() {
        for k in 1..WizardStep::ALL.len() {
            let mut wizard = WizardController::new();
            wizard.set_field(Field::Weight, 82.0);
            advance_to(&mut wizard, WizardStep::ALL[k - 1]);
            let before = *wizard.draft();

            assert!(matches!(wizard.advance(), AdvanceOutcome::Moved(_)));
            assert!(wizard.retreat());
            assert_eq!(wizard.step(), WizardStep::ALL[k - 1]);
            assert_eq!(*wizard.draft(), before);
        }
    }

    #[test]
    fn test_retreat_at_first_step_is_noop() {
        let mut wizard = WizardController::new();
        assert!(!wizard.retreat());
        assert_eq!(wizard.step(), WizardStep::Profile);
        assert!(!wizard.take_scroll_request());
    }

    #[test]
    fn test_step_gate_only_checks_step_fields() {
        let mut wizard = WizardController::new();
        // Out of domain, but collected on the vitals step.
        wizard.set_field(Field::Weight, 500.0);
        wizard.set_field(Field::Age, 12.0);

        match wizard.advance() {
            AdvanceOutcome::Blocked(errors) => assert_eq!(errors.fields(), vec![Field::Age]),
            other => panic!("Expected block, got {other:?}"),
        }
        assert_eq!(wizard.step(), WizardStep::Profile);

        wizard.set_field(Field::Age, 45.0);
        assert!(wizard.errors().is_empty());
        assert_eq!(wizard.advance(), AdvanceOutcome::Moved(WizardStep::Activity));
    }

    #[test]
    fn test_terminal_gate_reports_all_fields() {
        let mut wizard = WizardController::new();
        advance_to(&mut wizard, WizardStep::Habits);
        wizard.set_field(Field::Smoker, 4.0);
        // Sneaks past earlier steps: edited after they were passed.
        wizard.set_field(Field::Height, 90.0);

        match wizard.advance() {
            AdvanceOutcome::Blocked(errors) => {
                assert_eq!(errors.fields(), vec![Field::Height, Field::Smoker]);
            }
            other => panic!("Expected block, got {other:?}"),
        }
        assert_eq!(wizard.state(), WizardState::Step(WizardStep::Habits));
    }

    #[test]
    fn test_activity_auto_advance() {
        let mut wizard = WizardController::new();
        advance_to(&mut wizard, WizardStep::Activity);
        assert_eq!(wizard.select_activity(false), AdvanceOutcome::Moved(WizardStep::Vitals));
        assert!(!wizard.draft().flag(Field::PhysicallyActive));
    }

    #[test]
    fn test_nudge_is_clamped() {
        let mut wizard = WizardController::new();
        wizard.nudge(Field::Weight, 500.0);
        assert!((wizard.draft().weight - 150.0).abs() < f64::EPSILON);
        wizard.nudge(Field::Age, -100.0);
        assert!((wizard.draft().age - 30.0).abs() < f64::EPSILON);

        wizard.nudge(Field::Cholesterol, 1.0);
        wizard.nudge(Field::Cholesterol, 1.0);
        wizard.nudge(Field::Cholesterol, 1.0);
        assert!((wizard.draft().cholesterol - 3.0).abs() < f64::EPSILON);
        wizard.nudge(Field::Gender, -1.0);
        assert!((wizard.draft().gender - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_submission_failure_reopens_last_step() {
        let mut wizard = WizardController::new();
        advance_to(&mut wizard, WizardStep::Habits);
        wizard.set_field(Field::AlcoholUse, 1.0);
        assert!(matches!(wizard.advance(), AdvanceOutcome::Completed(_)));

        wizard.set_field(Field::AlcoholUse, 0.0);
        assert!(wizard.draft().flag(Field::AlcoholUse), "edits ignored once submitted");

        wizard.submission_failed("Couldn't reach the prediction service.");
        assert_eq!(wizard.state(), WizardState::Step(WizardStep::Habits));
        assert!(wizard.draft().flag(Field::AlcoholUse));
        assert!(wizard.submit_error().is_some());
        assert!(matches!(wizard.advance(), AdvanceOutcome::Completed(_)));
        assert!(wizard.submit_error().is_none());
    }

    #[test]
    fn test_transitions_request_scroll() {
        let mut wizard = WizardController::new();
        wizard.advance();
        assert!(wizard.take_scroll_request());
        assert!(!wizard.take_scroll_request());
        wizard.retreat();
        assert!(wizard.take_scroll_request());
    }
}
