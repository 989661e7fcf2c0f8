//! Results view: prediction, display model and what-if controls.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
    Frame,
};

use crate::application::{DisplayModel, SimulationEngine, SimulationIssue};
use crate::domain::{Field, PatientRecord};
use crate::tui::styles::MedicalTheme;

use super::{format_value, render_header, render_key_hints, slider_bar};

/// What-if controls on the results screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimControl {
    Weight,
    Systolic,
    Exercise,
    Smoking,
}

impl SimControl {
    pub const ALL: [SimControl; 4] = [
        SimControl::Weight,
        SimControl::Systolic,
        SimControl::Exercise,
        SimControl::Smoking,
    ];

    #[must_use]
    pub fn field(self) -> Field {
        match self {
            Self::Weight => Field::Weight,
            Self::Systolic => Field::SystolicPressure,
            Self::Exercise => Field::PhysicallyActive,
            Self::Smoking => Field::Smoker,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Weight => "Weight",
            Self::Systolic => "Systolic BP",
            Self::Exercise => "Regular Exercise",
            Self::Smoking => "Smoking",
        }
    }

    /// Slider range; `None` for toggles.
    #[must_use]
    pub fn bounds(self) -> Option<(f64, f64)> {
        match self {
            Self::Weight => Some((40.0, 150.0)),
            Self::Systolic => Some((90.0, 180.0)),
            Self::Exercise | Self::Smoking => None,
        }
    }

    /// Value after one step in the direction of `delta`.
    ///
    /// Sliders move by `delta` within their range; toggles flip whenever
    /// `delta` is non-zero.
    #[must_use]
    pub fn adjusted(self, current: f64, delta: f64) -> f64 {
        match self.bounds() {
            Some((min, max)) => (current + delta).clamp(min, max),
            None if delta != 0.0 => {
                if current == 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            None => current,
        }
    }
}

/// Results view state.
#[derive(Debug, Default)]
pub struct ResultsView {
    pub selected: usize,
}

impl ResultsView {
    #[must_use]
    pub fn control(&self) -> SimControl {
        SimControl::ALL[self.selected % SimControl::ALL.len()]
    }

    pub fn next_control(&mut self) {
        self.selected = (self.selected + 1) % SimControl::ALL.len();
    }

    pub fn prev_control(&mut self) {
        let len = SimControl::ALL.len();
        self.selected = (self.selected + len - 1) % len;
    }
}

/// Render the results screen.
pub fn render_results(
    f: &mut Frame,
    area: Rect,
    engine: &SimulationEngine,
    model: &DisplayModel,
    view: &ResultsView,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Main content
            Constraint::Length(2), // Status line
            Constraint::Length(2), // Footer
        ])
        .split(area);

    render_header(f, chunks[0], "Your Results", "Cardiovascular Risk Estimate");

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .margin(1)
        .split(chunks[1]);

    render_risk(f, columns[0], engine, model);
    render_controls(f, columns[1], engine.working(), view);
    render_status(f, chunks[2], engine);

    render_key_hints(
        f,
        chunks[3],
        &[
            ("↑↓", "Control"),
            ("←→", "Adjust"),
            ("Space", "Toggle"),
            ("R", "Reset"),
            ("Esc", "Home"),
        ],
    );
}

fn render_risk(f: &mut Frame, area: Rect, engine: &SimulationEngine, model: &DisplayModel) {
    let block = Block::default()
        .title(Span::styled(" Risk Estimate ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border_focused());

    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Band and delta
            Constraint::Length(3), // Probability
            Constraint::Length(2), // Heart age
            Constraint::Min(0),    // Key factors
        ])
        .margin(1)
        .split(inner);

    let hue = MedicalTheme::hue(model.hue);
    let (arrow, trend_style) = MedicalTheme::trend(model.trend);
    let delta = if model.risk_delta == 0 {
        "no change from your answers".to_string()
    } else {
        format!("{:+} pts vs your answers", model.risk_delta)
    };

    let band = Paragraph::new(vec![
        Line::from(Span::styled(
            format!("{} Risk", model.risk_level),
            hue.add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            model.risk_level.description(),
            MedicalTheme::text_secondary(),
        )),
        Line::from(vec![
            Span::styled(format!("{arrow} "), trend_style),
            Span::styled(delta, MedicalTheme::text_secondary()),
        ]),
    ])
    .alignment(Alignment::Center);
    f.render_widget(band, chunks[0]);

    let gauge = Gauge::default()
        .block(
            Block::default()
                .title(Span::styled(" Probability ", MedicalTheme::text_secondary()))
                .borders(Borders::ALL)
                .border_style(MedicalTheme::border()),
        )
        .gauge_style(hue)
        .percent(model.percentage.clamp(0, 100) as u16)
        .label(format!("{}%", model.percentage));
    f.render_widget(gauge, chunks[1]);

    let heart_age = Paragraph::new(Line::from(vec![
        Span::styled("Heart age: ", MedicalTheme::text_secondary()),
        Span::styled(format!("{} years*", model.derived_age), MedicalTheme::text()),
        Span::styled("   BMI: ", MedicalTheme::text_secondary()),
        Span::styled(format!("{:.1}", model.bmi), MedicalTheme::text()),
    ]))
    .alignment(Alignment::Center);
    f.render_widget(heart_age, chunks[2]);

    let mut lines: Vec<Line> = model
        .key_factors
        .iter()
        .map(|factor| {
            Line::from(vec![
                Span::styled(format!("{:<16}", factor.label), MedicalTheme::text_secondary()),
                Span::styled(factor.value.clone(), MedicalTheme::tone(factor.tone)),
            ])
        })
        .collect();

    let message = &engine.current_prediction().message;
    if !message.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(message.clone(), MedicalTheme::text_muted())));
    }

    let factors = Paragraph::new(lines)
        .block(
            Block::default()
                .title(Span::styled(" Key Factors ", MedicalTheme::text_secondary()))
                .borders(Borders::TOP)
                .border_style(MedicalTheme::border()),
        )
        .wrap(Wrap { trim: true });
    f.render_widget(factors, chunks[3]);
}

fn render_controls(f: &mut Frame, area: Rect, working: &PatientRecord, view: &ResultsView) {
    let block = Block::default()
        .title(Span::styled(" What If? ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border());

    let mut lines = vec![
        Line::from(Span::styled(
            "Adjust a factor to see how your risk would change.",
            MedicalTheme::text_muted(),
        )),
        Line::from(""),
    ];

    for (i, control) in SimControl::ALL.iter().enumerate() {
        let is_selected = i == view.selected;
        let label_style = if is_selected {
            MedicalTheme::focused()
        } else {
            MedicalTheme::text_secondary()
        };
        let marker = if is_selected { "▶ " } else { "  " };
        let field = control.field();
        let value = working.get(field);

        let detail = match control.bounds() {
            Some((min, max)) => vec![
                Span::styled(
                    format!("{:>4} {} ", format_value(value), field.unit().unwrap_or("")),
                    MedicalTheme::text(),
                ),
                Span::styled(slider_bar(value, min, max, 20), MedicalTheme::focused()),
            ],
            None => {
                let on = value != 0.0;
                vec![Span::styled(
                    if on { "[x] Yes" } else { "[ ] No" },
                    if on {
                        MedicalTheme::selected()
                    } else {
                        MedicalTheme::text()
                    },
                )]
            }
        };

        lines.push(Line::from(vec![
            Span::styled(marker, label_style),
            Span::styled(format!("{:<17}", control.label()), label_style),
        ]));
        let mut row = vec![Span::raw("    ")];
        row.extend(detail);
        lines.push(Line::from(row));
        lines.push(Line::from(""));
    }

    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_status(f: &mut Frame, area: Rect, engine: &SimulationEngine) {
    // Pending work outranks the outcome of an earlier evaluation.
    let line = match engine.issue() {
        _ if engine.is_busy() => Line::from(Span::styled(
            " Simulating...",
            MedicalTheme::info(),
        )),
        Some(SimulationIssue::Failed(e)) => Line::from(vec![
            Span::styled("! ", MedicalTheme::danger()),
            Span::styled(e.user_message(), MedicalTheme::danger()),
        ]),
        Some(SimulationIssue::Invalid(errors)) => Line::from(vec![
            Span::styled("! ", MedicalTheme::warning()),
            Span::styled(errors.to_string(), MedicalTheme::warning()),
        ]),
        None => Line::from(Span::styled(
            " * Heart age is illustrative only.",
            MedicalTheme::text_muted(),
        )),
    };

    f.render_widget(Paragraph::new(line), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::RecordPatch;
    use crate::domain::{self, RiskLevel, RiskPrediction};
    use crate::ports::PredictionError;
    use ratatui::{backend::TestBackend, Terminal};
    use std::time::{Duration, Instant};

    fn status_text(engine: &SimulationEngine) -> String {
        let mut terminal =
            Terminal::new(TestBackend::new(80, 2)).expect("Should create test terminal");
        terminal
            .draw(|f| render_status(f, f.area(), engine))
            .expect("Should draw");
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_pending_edit_replaces_failure_banner() {
        let baseline = domain::validate(&PatientRecord::default()).expect("Should be valid");
        let prediction = RiskPrediction::new(0, 0.18, RiskLevel::Low, "Low risk")
            .expect("Should be a valid prediction");
        let mut engine = SimulationEngine::new(baseline, prediction, Duration::from_millis(500));
        let t0 = Instant::now();

        engine.edit(&RecordPatch::field(Field::Weight, 95.0), t0);
        let request = engine
            .poll(t0 + Duration::from_millis(500))
            .expect("Should issue a request");
        engine.complete(request.tag, Err(PredictionError::network("connection refused")));
        assert!(status_text(&engine).contains("Couldn't reach"));

        engine.edit(&RecordPatch::field(Field::Weight, 96.0), t0 + Duration::from_secs(1));
        let text = status_text(&engine);
        assert!(text.contains("Simulating..."));
        assert!(!text.contains("Couldn't reach"));
    }

    #[test]
    fn test_sliders_clamp_to_their_range() {
        assert_eq!(SimControl::Weight.adjusted(150.0, 1.0), 150.0);
        assert_eq!(SimControl::Weight.adjusted(70.0, -1.0), 69.0);
        assert_eq!(SimControl::Weight.adjusted(36.0, 1.0), 40.0);
        assert_eq!(SimControl::Systolic.adjusted(90.0, -1.0), 90.0);
        assert_eq!(SimControl::Systolic.adjusted(200.0, -1.0), 180.0);
    }

    #[test]
    fn test_toggles_flip() {
        assert_eq!(SimControl::Exercise.adjusted(1.0, 1.0), 0.0);
        assert_eq!(SimControl::Smoking.adjusted(0.0, -1.0), 1.0);
        assert_eq!(SimControl::Smoking.adjusted(1.0, 0.0), 1.0);
    }

    #[test]
    fn test_control_selection_wraps() {
        let mut view = ResultsView::default();
        view.prev_control();
        assert_eq!(view.control(), SimControl::Smoking);
        view.next_control();
        assert_eq!(view.control(), SimControl::Weight);
    }

    #[test]
    fn test_controls_map_to_record_fields() {
        let fields: Vec<Field> = SimControl::ALL.iter().map(|c| c.field()).collect();
        assert_eq!(
            fields,
            vec![
                Field::Weight,
                Field::SystolicPressure,
                Field::PhysicallyActive,
                Field::Smoker
            ]
        );
    }
}
