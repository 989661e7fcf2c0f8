//! Live what-if simulation over a submitted assessment.
//!
//! The engine is a plain state machine driven by the UI loop:
//! - [`SimulationEngine::edit`] changes the working record and (re)arms a
//!   trailing-edge debounce deadline,
//! - [`SimulationEngine::poll`] fires the deadline and hands out at most one
//!   tagged [`SimulationRequest`] per quiet period,
//! - [`SimulationEngine::complete`] applies a response only if its tag is the
//!   latest one issued by this session.
//!
//! Network calls happen elsewhere (see `tui::worker`); the engine never
//! blocks and owns no threads, so timing can be tested with explicit
//! `Instant`s.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::domain::{self, Field, FieldErrors, PatientRecord, RiskPrediction, ValidRecord};
use crate::ports::PredictionError;

static NEXT_SESSION: AtomicU64 = AtomicU64::new(1);

/// Identity of one simulation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl SessionId {
    fn next() -> Self {
        Self(NEXT_SESSION.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "S{}", self.0)
    }
}

/// Staleness tag carried by every outgoing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestTag {
    pub session: SessionId,
    pub seq: u64,
}

impl std::fmt::Display for RequestTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.session, self.seq)
    }
}

/// A re-evaluation the caller should send to the prediction service.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationRequest {
    pub tag: RequestTag,
    pub record: ValidRecord,
}

/// Shallow field replacement applied to the working record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordPatch {
    changes: Vec<(Field, f64)>,
}

impl RecordPatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Patch holding a single field.
    #[must_use]
    pub fn field(field: Field, value: f64) -> Self {
        Self::new().set(field, value)
    }

    #[must_use]
    pub fn set(mut self, field: Field, value: f64) -> Self {
        self.changes.retain(|(f, _)| *f != field);
        self.changes.push((field, value));
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn apply_to(&self, record: &mut PatientRecord) {
        for &(field, value) in &self.changes {
            record.set(field, value);
        }
    }
}

/// Outcome of feeding a response back into the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// The response was current and is now displayed.
    Applied,
    /// The response was current but the call failed; last good result kept.
    Failed,
    /// A newer request (or a reset, or another session) superseded it.
    Stale,
}

/// Why the displayed prediction may not reflect the working record.
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationIssue {
    /// The last re-evaluation failed.
    Failed(PredictionError),
    /// The working record is out of domain and was not sent.
    Invalid(FieldErrors),
}

/// Debounced, staleness-guarded re-prediction over one submitted record.
#[derive(Debug)]
pub struct SimulationEngine {
    session: SessionId,
    debounce: Duration,
    baseline: ValidRecord,
    baseline_prediction: RiskPrediction,
    working: PatientRecord,
    current_prediction: RiskPrediction,
    /// Scheduled re-evaluation; `None` when no edit is waiting.
    deadline: Option<Instant>,
    last_seq: u64,
    /// Only a completion carrying this tag may update the display.
    latest: Option<RequestTag>,
    issue: Option<SimulationIssue>,
}

impl SimulationEngine {
    /// Start a session from the submitted record and its prediction.
    #[must_use]
    pub fn new(baseline: ValidRecord, baseline_prediction: RiskPrediction, debounce: Duration) -> Self {
        let session = SessionId::next();
        tracing::info!(
            "Simulation session {} started (baseline probability {:.2})",
            session,
            baseline_prediction.probability
        );
        Self {
            session,
            debounce,
            working: baseline.into_inner(),
            current_prediction: baseline_prediction.clone(),
            baseline,
            baseline_prediction,
            deadline: None,
            last_seq: 0,
            latest: None,
            issue: None,
        }
    }

    #[must_use]
    pub fn session(&self) -> SessionId {
        self.session
    }

    #[must_use]
    pub fn baseline(&self) -> &ValidRecord {
        &self.baseline
    }

    #[must_use]
    pub fn baseline_prediction(&self) -> &RiskPrediction {
        &self.baseline_prediction
    }

    #[must_use]
    pub fn working(&self) -> &PatientRecord {
        &self.working
    }

    /// Latest successfully resolved prediction.
    #[must_use]
    pub fn current_prediction(&self) -> &RiskPrediction {
        &self.current_prediction
    }

    /// Transient problem to show next to the result, if any.
    #[must_use]
    pub fn issue(&self) -> Option<&SimulationIssue> {
        self.issue.as_ref()
    }

    /// Whether an edit is waiting for its quiet period or a request is out.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.deadline.is_some() || self.latest.is_some()
    }

    /// Time left before the pending edit is due, if one is waiting.
    #[must_use]
    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        self.deadline.map(|d| d.saturating_duration_since(now))
    }

    /// Merge `patch` into the working record and restart the quiet period.
    ///
    /// Any issue from the previous evaluation is cleared; the edit gets its
    /// own outcome once it is polled.
    pub fn edit(&mut self, patch: &RecordPatch, now: Instant) {
        if patch.is_empty() {
            return;
        }
        patch.apply_to(&mut self.working);
        self.deadline = Some(now + self.debounce);
        self.issue = None;
    }

    /// Fire the debounce deadline if it has passed.
    ///
    /// Returns the request to send, if any. At most one request is issued per
    /// quiet period, carrying the working record as of the last edit.
    pub fn poll(&mut self, now: Instant) -> Option<SimulationRequest> {
        match self.deadline {
            Some(deadline) if now >= deadline => self.deadline = None,
            _ => return None,
        }

        // Anything still in flight is superseded by this evaluation.
        self.last_seq += 1;
        self.latest = None;

        if self.working == *self.baseline.record() {
            tracing::debug!("Simulation {} back at baseline, skipping request", self.session);
            self.current_prediction = self.baseline_prediction.clone();
            self.issue = None;
            return None;
        }

        match domain::validate(&self.working) {
            Ok(record) => {
                let tag = RequestTag {
                    session: self.session,
                    seq: self.last_seq,
                };
                self.latest = Some(tag);
                tracing::debug!("Issuing simulation request {}", tag);
                Some(SimulationRequest { tag, record })
            }
            Err(errors) => {
                tracing::debug!(
                    "Simulation {} working record invalid ({} field(s)), not sent",
                    self.session,
                    errors.len()
                );
                self.issue = Some(SimulationIssue::Invalid(errors));
                None
            }
        }
    }

    /// Feed back the response to a previously issued request.
    pub fn complete(
        &mut self,
        tag: RequestTag,
        result: Result<RiskPrediction, PredictionError>,
    ) -> Completion {
        if self.latest != Some(tag) {
            tracing::debug!("Dropping stale simulation response {}", tag);
            return Completion::Stale;
        }
        self.latest = None;

        match result {
            Ok(prediction) => {
                tracing::debug!(
                    "Simulation {} updated: probability {:.2} ({})",
                    tag,
                    prediction.probability,
                    prediction.risk_level
                );
                self.current_prediction = prediction;
                self.issue = None;
                Completion::Applied
            }
            Err(e) => {
                tracing::warn!("Simulation request {} failed: {}", tag, e);
                self.issue = Some(SimulationIssue::Failed(e));
                Completion::Failed
            }
        }
    }

    /// Return to the baseline, cancelling pending and in-flight work.
    pub fn reset(&mut self) {
        self.working = self.baseline.into_inner();
        self.current_prediction = self.baseline_prediction.clone();
        self.deadline = None;
        self.last_seq += 1;
        self.latest = None;
        self.issue = None;
        tracing::info!("Simulation session {} reset to baseline", self.session);
    }
}
