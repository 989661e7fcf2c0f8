//! Landing view: service status and model details.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::application::HealthReport;
use crate::domain::ModelInfo;
use crate::tui::styles::MedicalTheme;

use super::{render_header, render_key_hints};

/// Landing state for rendering.
#[derive(Debug, Default)]
pub struct LandingState {
    /// Last health probe; `None` while the first one is running.
    pub health: Option<HealthReport>,
    /// A probe is in flight.
    pub checking: bool,
    /// Model metadata, or the message explaining why it is missing.
    pub model: Option<Result<ModelInfo, String>>,
}

/// Render the landing view.
pub fn render_landing(f: &mut Frame, area: Rect, state: &LandingState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Main content
            Constraint::Length(2), // Footer
        ])
        .split(area);

    render_header(
        f,
        chunks[0],
        "Cardiorisk",
        "Cardiovascular Risk Assessment",
    );

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .margin(1)
        .split(chunks[1]);

    render_service_status(f, columns[0], state);
    render_model_info(f, columns[1], state);

    render_key_hints(
        f,
        chunks[2],
        &[("Enter", "Start Assessment"), ("H", "Re-check Service"), ("Q", "Quit")],
    );
}

fn render_service_status(f: &mut Frame, area: Rect, state: &LandingState) {
    let status = match (&state.health, state.checking) {
        (_, true) | (None, _) => Line::from(Span::styled(
            "  Checking prediction service...",
            MedicalTheme::info(),
        )),
        (Some(report), false) if report.success => Line::from(vec![
            Span::styled("  OK ", MedicalTheme::success()),
            Span::styled("Online", MedicalTheme::text()),
            Span::styled(
                format!(" ({} ms)", report.response_time_ms),
                MedicalTheme::text_muted(),
            ),
        ]),
        (Some(_), false) => Line::from(vec![
            Span::styled("  FAIL ", MedicalTheme::danger()),
            Span::styled("Unreachable", MedicalTheme::text()),
        ]),
    };

    let mut lines = vec![status];
    if let Some(report) = state.health.as_ref().filter(|r| !r.success && !state.checking) {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "  The service may be waking up; assessments can take a while.",
            MedicalTheme::text_muted(),
        )));
        lines.push(Line::from(Span::styled(
            format!("  Last checked {}", report.timestamp.format("%H:%M:%S UTC")),
            MedicalTheme::text_muted(),
        )));
    }

    let block = Block::default()
        .title(Span::styled(" Service Status ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border());

    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_model_info(f: &mut Frame, area: Rect, state: &LandingState) {
    let block = Block::default()
        .title(Span::styled(" Model ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border());

    let lines = match &state.model {
        None => vec![Line::from(Span::styled(
            "Loading model details...",
            MedicalTheme::text_muted(),
        ))],
        Some(Err(message)) => vec![Line::from(Span::styled(
            message.clone(),
            MedicalTheme::text_muted(),
        ))],
        Some(Ok(info)) => vec![
            Line::from(vec![
                Span::styled("Type: ", MedicalTheme::text_secondary()),
                Span::styled(info.model_type.clone(), MedicalTheme::text()),
            ]),
            Line::from(vec![
                Span::styled("Features: ", MedicalTheme::text_secondary()),
                Span::styled(info.n_features.to_string(), MedicalTheme::text()),
                Span::styled(
                    format!(" ({})", info.features.join(", ")),
                    MedicalTheme::text_muted(),
                ),
            ]),
            Line::from(""),
            Line::from(Span::styled(info.description.clone(), MedicalTheme::text())),
        ],
    };

    let p = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: true });
    f.render_widget(p, area);
}
