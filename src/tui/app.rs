//! Main TUI application state machine.
//!
//! Handles:
//! - Screen navigation
//! - Input event handling
//! - Background prediction calls via the worker
//! - Driving the simulation debounce from the loop tick

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Frame, Terminal,
};

use crate::adapters::HttpPredictionClient;
use crate::application::{
    derive, AdvanceOutcome, AssessmentService, RecordPatch, SimulationEngine, WizardController,
    WizardStep,
};
use crate::config::AppConfig;
use crate::ports::PredictionClient;

use super::ui::{
    landing::{render_landing, LandingState},
    render_disclaimer,
    results::{render_results, ResultsView},
    wizard::{render_submitting, render_wizard, WizardView},
};
use super::worker::{PredictionWorker, WorkerMessage};

/// Upper bound on how long the loop waits for input.
const TICK: Duration = Duration::from_millis(50);

/// Current screen/view in the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Landing,
    Assessment,
    Submitting,
    Results,
}

/// A live simulation over a submitted assessment.
struct ResultsSession {
    engine: SimulationEngine,
    view: ResultsView,
}

/// Main application state
pub struct App<C = HttpPredictionClient>
where
    C: PredictionClient + 'static,
{
    /// Current screen
    screen: Screen,

    /// Whether the app should quit
    should_quit: bool,

    config: AppConfig,

    /// Background calls to the prediction service
    worker: PredictionWorker<C>,

    landing: LandingState,

    wizard: WizardController,
    wizard_view: WizardView,

    /// When the initial assessment was sent
    submitted_at: Option<Instant>,

    /// Present only on the results screen; dropping it ends the session
    results: Option<ResultsSession>,
}

impl App<HttpPredictionClient> {
    /// Create a new application configured from `CARDIORISK_*` variables.
    ///
    /// # Errors
    /// Returns `CardioError::Config` for a malformed variable, otherwise as
    /// [`App::new`].
    pub fn from_env() -> crate::Result<Self> {
        Self::new(AppConfig::from_env()?)
    }

    /// Create a new application talking to the configured HTTP service.
    ///
    /// # Errors
    /// Returns `CardioError::Prediction` if the HTTP client cannot be built.
    pub fn new(config: AppConfig) -> crate::Result<Self> {
        let client = HttpPredictionClient::new(config.client.clone())?;
        tracing::info!("Prediction service: {}", config.client.base_url);
        Ok(Self::with_dependencies(
            config,
            AssessmentService::new(Arc::new(client)),
        ))
    }
}

impl<C> App<C>
where
    C: PredictionClient + 'static,
{
    /// Create application with an injected service (Composition Root pattern).
    pub fn with_dependencies(config: AppConfig, service: AssessmentService<C>) -> Self {
        Self {
            screen: Screen::Landing,
            should_quit: false,
            config,
            worker: PredictionWorker::new(service),
            landing: LandingState::default(),
            wizard: WizardController::new(),
            wizard_view: WizardView::default(),
            submitted_at: None,
            results: None,
        }
    }

    /// Run the main application loop.
    ///
    /// # Errors
    /// Returns error if terminal operations fail.
    pub fn run(&mut self) -> crate::Result<()> {
        self.refresh_landing();

        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.main_loop(&mut terminal);

        // Restore terminal
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn main_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> crate::Result<()> {
        loop {
            self.poll_worker();
            self.tick_simulation(Instant::now());

            terminal.draw(|f| self.render(f))?;

            // Wake up in time for a pending simulation deadline.
            if event::poll(self.poll_timeout(Instant::now()))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code, key.modifiers);
                    }
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    fn render(&self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(3)])
            .split(f.area());

        let content_area = chunks[0];
        let disclaimer_area = chunks[1];

        match self.screen {
            Screen::Landing => render_landing(f, content_area, &self.landing),
            Screen::Assessment => {
                render_wizard(f, content_area, &self.wizard, &self.wizard_view);
            }
            Screen::Submitting => {
                let elapsed = self.submitted_at.map_or(0, |t| t.elapsed().as_secs());
                render_submitting(f, content_area, elapsed);
            }
            Screen::Results => {
                if let Some(session) = &self.results {
                    let engine = &session.engine;
                    let model = derive(
                        engine.working(),
                        engine.current_prediction(),
                        engine.baseline_prediction(),
                        &self.config.presentation,
                    );
                    render_results(f, content_area, engine, &model, &session.view);
                }
            }
        }

        render_disclaimer(f, disclaimer_area);
    }

    fn poll_timeout(&self, now: Instant) -> Duration {
        self.results
            .as_ref()
            .and_then(|session| session.engine.time_until_due(now))
            .map_or(TICK, |due| due.min(TICK))
    }

    /// Fire the simulation debounce and hand any request to the worker.
    fn tick_simulation(&mut self, now: Instant) {
        let Some(session) = self.results.as_mut() else {
            return;
        };
        if let Some(request) = session.engine.poll(now) {
            self.worker.spawn_simulation(request);
        }
    }

    /// Apply every finished background call.
    fn poll_worker(&mut self) {
        while let Some(message) = self.worker.try_recv() {
            self.apply(message);
        }
    }

    fn apply(&mut self, message: WorkerMessage) {
        match message {
            WorkerMessage::Health(report) => {
                self.landing.checking = false;
                self.landing.health = Some(report);
            }
            WorkerMessage::ModelInfo(result) => {
                self.landing.model = Some(result.map_err(|e| e.user_message()));
            }
            WorkerMessage::Assessment { record, result } => {
                if self.screen != Screen::Submitting {
                    tracing::debug!("Discarding assessment result; nothing is waiting for it");
                    return;
                }
                self.submitted_at = None;

                match result {
                    Ok(prediction) => {
                        let engine = SimulationEngine::new(record, prediction, self.config.debounce);
                        self.results = Some(ResultsSession {
                            engine,
                            view: ResultsView::default(),
                        });
                        self.screen = Screen::Results;
                    }
                    Err(e) => {
                        self.wizard.submission_failed(e.user_message());
                        self.sync_wizard_view();
                        self.screen = Screen::Assessment;
                    }
                }
            }
            WorkerMessage::Simulation { tag, result } => match self.results.as_mut() {
                Some(session) => {
                    session.engine.complete(tag, result);
                }
                None => {
                    tracing::debug!("Dropping simulation response {} after session ended", tag);
                }
            },
        }
    }

    fn refresh_landing(&mut self) {
        if self.landing.checking {
            return;
        }
        self.landing.checking = true;
        self.worker.spawn_health();
        if !matches!(self.landing.model, Some(Ok(_))) {
            self.worker.spawn_model_info();
        }
    }

    fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        // Global quit handling
        if modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key, KeyCode::Char('q') | KeyCode::Char('c'))
        {
            self.should_quit = true;
            return;
        }

        match self.screen {
            Screen::Landing => self.handle_landing_key(key),
            Screen::Assessment => self.handle_wizard_key(key),
            Screen::Submitting => {}
            Screen::Results => self.handle_results_key(key),
        }
    }

    fn handle_landing_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Enter | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.wizard.reset();
                self.sync_wizard_view();
                self.screen = Screen::Assessment;
            }
            KeyCode::Char('h') | KeyCode::Char('H') => self.refresh_landing(),
            KeyCode::Char('q') | KeyCode::Char('Q') => self.should_quit = true,
            _ => {}
        }
    }

    fn handle_wizard_key(&mut self, key: KeyCode) {
        let step = self.wizard.step();
        let activity = step == WizardStep::Activity;

        match key {
            KeyCode::Up | KeyCode::BackTab => self.wizard_view.prev_field(step),
            KeyCode::Down | KeyCode::Tab => self.wizard_view.next_field(step),
            KeyCode::Left | KeyCode::Right => {
                let delta = if key == KeyCode::Left { -1.0 } else { 1.0 };
                let field = self.wizard_view.selected_field(step);
                self.wizard_view.clear_input();
                self.wizard.nudge(field, delta);
            }
            KeyCode::Char('y') | KeyCode::Char('Y') if activity => {
                let outcome = self.wizard.select_activity(true);
                self.apply_outcome(outcome);
            }
            KeyCode::Char('n') | KeyCode::Char('N') if activity => {
                let outcome = self.wizard.select_activity(false);
                self.apply_outcome(outcome);
            }
            KeyCode::Char(c) => self.wizard_view.input_char(step, c),
            KeyCode::Backspace if !self.wizard_view.input.is_empty() => {
                self.wizard_view.input.pop();
            }
            KeyCode::Esc if !self.wizard_view.input.is_empty() => {
                self.wizard_view.clear_input();
            }
            KeyCode::Backspace | KeyCode::Esc => self.go_back(),
            KeyCode::Enter if !self.wizard_view.input.is_empty() => {
                // Commit only; the next Enter advances.
                if let Some((field, value)) = self.wizard_view.take_input(step) {
                    self.wizard.set_field(field, value);
                }
            }
            KeyCode::Enter => {
                let outcome = self.wizard.advance();
                self.apply_outcome(outcome);
            }
            _ => {}
        }
    }

    fn apply_outcome(&mut self, outcome: AdvanceOutcome) {
        match outcome {
            AdvanceOutcome::Moved(step) => {
                tracing::debug!("Wizard moved to step {}", step.index() + 1);
            }
            AdvanceOutcome::Blocked(errors) => {
                if let Some(&first) = errors.fields().first() {
                    self.wizard_view.focus(self.wizard.step(), first);
                }
            }
            AdvanceOutcome::Completed(record) => {
                self.screen = Screen::Submitting;
                self.submitted_at = Some(Instant::now());
                self.worker.spawn_assessment(record);
            }
            AdvanceOutcome::AlreadySubmitted => {}
        }
        self.sync_wizard_view();
    }

    fn go_back(&mut self) {
        if self.wizard.retreat() {
            self.sync_wizard_view();
        } else {
            self.screen = Screen::Landing;
        }
    }

    /// Step transitions put focus back on the first field.
    fn sync_wizard_view(&mut self) {
        if self.wizard.take_scroll_request() {
            self.wizard_view.reset();
        }
    }

    fn handle_results_key(&mut self, key: KeyCode) {
        let Some(session) = self.results.as_mut() else {
            self.screen = Screen::Landing;
            return;
        };

        match key {
            KeyCode::Up | KeyCode::BackTab => session.view.prev_control(),
            KeyCode::Down | KeyCode::Tab => session.view.next_control(),
            KeyCode::Left | KeyCode::Right | KeyCode::Char(' ') | KeyCode::Enter => {
                let control = session.view.control();
                let is_slider = control.bounds().is_some();
                if is_slider && matches!(key, KeyCode::Char(' ') | KeyCode::Enter) {
                    return;
                }

                let delta = if key == KeyCode::Left { -1.0 } else { 1.0 };
                let field = control.field();
                let current = session.engine.working().get(field);
                let next = control.adjusted(current, delta);
                if next != current {
                    session
                        .engine
                        .edit(&RecordPatch::field(field, next), Instant::now());
                }
            }
            KeyCode::Char('r') | KeyCode::Char('R') => session.engine.reset(),
            KeyCode::Esc => {
                tracing::info!("Leaving results; simulation session {} ended", session.engine.session());
                self.results = None;
                self.screen = Screen::Landing;
                self.refresh_landing();
            }
            _ => {}
        }
    }
}
