//! Background worker for non-blocking prediction calls.
//!
//! Every call to the prediction service runs on its own short-lived thread
//! and reports back over a single channel, so the TUI main loop never waits
//! on the network. Results are applied on the loop thread.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use crate::application::{AssessmentService, HealthReport, RequestTag, SimulationRequest};
use crate::domain::{ModelInfo, RiskPrediction, ValidRecord};
use crate::ports::{PredictionClient, PredictionError};

/// Messages from background calls to the main loop.
#[derive(Debug)]
pub enum WorkerMessage {
    /// Health probe finished
    Health(HealthReport),
    /// Model metadata lookup finished
    ModelInfo(Result<ModelInfo, PredictionError>),
    /// Initial assessment finished; the record is handed back to seed the
    /// simulation session
    Assessment {
        record: ValidRecord,
        result: Result<RiskPrediction, PredictionError>,
    },
    /// Simulation re-evaluation finished
    Simulation {
        tag: RequestTag,
        result: Result<RiskPrediction, PredictionError>,
    },
}

/// Spawns prediction calls in the background.
pub struct PredictionWorker<C>
where
    C: PredictionClient + 'static,
{
    service: AssessmentService<C>,
    tx: Sender<WorkerMessage>,
    rx: Receiver<WorkerMessage>,
}

impl<C> PredictionWorker<C>
where
    C: PredictionClient + 'static,
{
    #[must_use]
    pub fn new(service: AssessmentService<C>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self { service, tx, rx }
    }

    /// Try to receive the next finished call (non-blocking).
    #[must_use]
    pub fn try_recv(&self) -> Option<WorkerMessage> {
        self.rx.try_recv().ok()
    }

    pub fn spawn_health(&self) {
        self.spawn(|service| WorkerMessage::Health(service.check_health()));
    }

    pub fn spawn_model_info(&self) {
        self.spawn(|service| WorkerMessage::ModelInfo(service.model_info()));
    }

    /// Submit a completed questionnaire.
    pub fn spawn_assessment(&self, record: ValidRecord) {
        self.spawn(move |service| {
            let result = service.submit(&record);
            WorkerMessage::Assessment { record, result }
        });
    }

    /// Send a tagged simulation request; the tag comes back with the result.
    pub fn spawn_simulation(&self, request: SimulationRequest) {
        self.spawn(move |service| {
            let SimulationRequest { tag, record } = request;
            let result = service.client().predict(&record);
            WorkerMessage::Simulation { tag, result }
        });
    }

    fn spawn<F>(&self, call: F)
    where
        F: FnOnce(&AssessmentService<C>) -> WorkerMessage + Send + 'static,
    {
        let service = self.service.clone();
        let tx = self.tx.clone();

        // Detached: a result arriving after the app moved on is dropped by
        // the receiver (or by the closed channel on shutdown).
        thread::spawn(move || {
            let _ = tx.send(call(&service));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{RecordPatch, SimulationEngine};
    use crate::domain::{self, Field, PatientRecord, RiskLevel};
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    struct EchoClient;

    impl PredictionClient for EchoClient {
        fn predict(&self, record: &ValidRecord) -> Result<RiskPrediction, PredictionError> {
            // Heavier patients get a higher number so results are traceable.
            let probability = (record.weight / 200.0).clamp(0.0, 1.0);
            RiskPrediction::new(0, probability, RiskLevel::Moderate, "echo")
                .map_err(PredictionError::Service)
        }

        fn health(&self) -> Result<(), PredictionError> {
            Ok(())
        }

        fn model_info(&self) -> Result<ModelInfo, PredictionError> {
            Err(PredictionError::network("offline"))
        }
    }

    fn worker() -> PredictionWorker<EchoClient> {
        PredictionWorker::new(AssessmentService::new(Arc::new(EchoClient)))
    }

    fn recv(worker: &PredictionWorker<EchoClient>) -> WorkerMessage {
        worker
            .rx
            .recv_timeout(Duration::from_secs(5))
            .expect("Worker should report back")
    }

    #[test]
    fn test_assessment_round_trip() {
        let worker = worker();
        let record = domain::validate(&PatientRecord::default()).expect("valid");
        worker.spawn_assessment(record);

        match recv(&worker) {
            WorkerMessage::Assessment { record: back, result } => {
                assert_eq!(back, record);
                assert!((result.expect("ok").probability - 0.35).abs() < 1e-9);
            }
            other => panic!("Unexpected message: {other:?}"),
        }
    }

    #[test]
    fn test_simulation_tag_is_returned() {
        let worker = worker();
        let baseline = domain::validate(&PatientRecord::default()).expect("valid");
        let first = RiskPrediction::new(0, 0.35, RiskLevel::Moderate, "").expect("valid");
        let mut engine = SimulationEngine::new(baseline, first, Duration::ZERO);

        let now = Instant::now();
        engine.edit(&RecordPatch::field(Field::Weight, 100.0), now);
        let request = engine.poll(now).expect("due");
        let tag = request.tag;
        worker.spawn_simulation(request);

        match recv(&worker) {
            WorkerMessage::Simulation { tag: back, result } => {
                assert_eq!(back, tag);
                assert!((result.expect("ok").probability - 0.5).abs() < 1e-9);
            }
            other => panic!("Unexpected message: {other:?}"),
        }
    }

    #[test]
    fn test_health_and_model_info() {
        let worker = worker();
        worker.spawn_health();
        worker.spawn_model_info();

        let mut health = None;
        let mut model = None;
        for _ in 0..2 {
            match recv(&worker) {
                WorkerMessage::Health(report) => health = Some(report),
                WorkerMessage::ModelInfo(result) => model = Some(result),
                other => panic!("Unexpected message: {other:?}"),
            }
        }
        assert!(health.expect("health reported").success);
        assert!(model.expect("model info reported").is_err());
    }
}
