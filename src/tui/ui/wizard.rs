//! Assessment wizard view and the submitting screen.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};

use crate::application::{slider_bounds, WizardController, WizardStep};
use crate::domain::{Field, FieldDomain, FieldError};
use crate::tui::styles::MedicalTheme;

use super::{format_value, render_header, render_key_hints, slider_bar};

/// Per-step view state: focused field and typed input.
#[derive(Debug, Default)]
pub struct WizardView {
    pub selected: usize,
    /// Digits typed for the focused field, committed with Enter.
    pub input: String,
    pub input_error: Option<FieldError>,
}

impl WizardView {
    /// Back to the first field with nothing typed.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    #[must_use]
    pub fn selected_field(&self, step: WizardStep) -> Field {
        let fields = step.fields();
        fields[self.selected.min(fields.len() - 1)]
    }

    pub fn next_field(&mut self, step: WizardStep) {
        self.clear_input();
        self.selected = (self.selected + 1) % step.fields().len();
    }

    pub fn prev_field(&mut self, step: WizardStep) {
        self.clear_input();
        let len = step.fields().len();
        self.selected = (self.selected + len - 1) % len;
    }

    /// Focus `field` if it belongs to `step`.
    pub fn focus(&mut self, step: WizardStep, field: Field) {
        if let Some(index) = step.fields().iter().position(|&f| f == field) {
            self.clear_input();
            self.selected = index;
        }
    }

    /// Drop typed text and its error.
    pub fn clear_input(&mut self) {
        self.input.clear();
        self.input_error = None;
    }

    /// Add a character to the typed input for numeric fields.
    pub fn input_char(&mut self, step: WizardStep, c: char) {
        if self.selected_field(step).is_choice() {
            return;
        }
        if c.is_ascii_digit() || c == '.' {
            self.input.push(c);
            self.input_error = None;
        }
    }

    /// Parse the typed input for the focused field.
    ///
    /// Returns `None` (and keeps the error for display) when the text is not
    /// a number. Domain checks happen when the step advances.
    pub fn take_input(&mut self, step: WizardStep) -> Option<(Field, f64)> {
        let field = self.selected_field(step);
        let text = std::mem::take(&mut self.input);
        match field.parse_value(&text) {
            Ok(value) => {
                self.input_error = None;
                Some((field, value))
            }
            Err(e) => {
                self.input_error = Some(e);
                None
            }
        }
    }
}

/// Render the current wizard step.
pub fn render_wizard(f: &mut Frame, area: Rect, wizard: &WizardController, view: &WizardView) {
    let step = wizard.step();
    let banner_height = if wizard.submit_error().is_some() { 3 } else { 0 };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),             // Header
            Constraint::Length(1),             // Progress
            Constraint::Length(banner_height), // Submission error
            Constraint::Min(0),                // Fields
            Constraint::Length(2),             // Footer
        ])
        .split(area);

    render_header(
        f,
        chunks[0],
        &format!("Step {}/{}", step.index() + 1, wizard.step_count()),
        &format!("{} · {}", step.title(), step.subtitle()),
    );

    let progress = Gauge::default()
        .gauge_style(MedicalTheme::progress())
        .ratio((step.index() + 1) as f64 / wizard.step_count() as f64)
        .label("");
    f.render_widget(progress, chunks[1]);

    if let Some(message) = wizard.submit_error() {
        let banner = Paragraph::new(Line::from(vec![
            Span::styled("! ", MedicalTheme::danger()),
            Span::styled(message.to_string(), MedicalTheme::danger()),
        ]))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(MedicalTheme::danger()),
        );
        f.render_widget(banner, chunks[2]);
    }

    render_fields(f, chunks[3], wizard, view);

    let hints: &[(&str, &str)] = if step == WizardStep::Activity {
        &[
            ("Y", "Active"),
            ("N", "Sedentary"),
            ("←→", "Choose"),
            ("Enter", "Confirm"),
            ("Esc", "Back"),
        ]
    } else if step.index() + 1 == wizard.step_count() {
        &[
            ("↑↓", "Field"),
            ("←→", "Adjust"),
            ("0-9", "Type"),
            ("Enter", "Get Results"),
            ("Esc", "Back"),
        ]
    } else {
        &[
            ("↑↓", "Field"),
            ("←→", "Adjust"),
            ("0-9", "Type"),
            ("Enter", "Next"),
            ("Esc", "Back"),
        ]
    };
    render_key_hints(f, chunks[4], hints);
}

fn render_fields(f: &mut Frame, area: Rect, wizard: &WizardController, view: &WizardView) {
    let step = wizard.step();
    let fields = step.fields();

    let constraints: Vec<Constraint> = fields
        .iter()
        .map(|_| Constraint::Length(4))
        .chain(std::iter::once(Constraint::Min(0)))
        .collect();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .margin(1)
        .split(area);

    for (i, &field) in fields.iter().enumerate() {
        let is_selected = i == view.selected;
        let value = wizard.draft().get(field);

        let (border_style, title_style) = if is_selected {
            (MedicalTheme::border_focused(), MedicalTheme::focused())
        } else {
            (MedicalTheme::border(), MedicalTheme::text_secondary())
        };

        let mut title = format!(" {} ", field.label());
        if let Some(unit) = field.unit() {
            title = format!(" {} ({unit}) ", field.label());
        }

        let block = Block::default()
            .title(Span::styled(title, title_style))
            .borders(Borders::ALL)
            .border_style(border_style);

        let control = match field.domain() {
            FieldDomain::OneOf(codes) => choice_line(field, codes, value),
            FieldDomain::Range { .. } if is_selected && !view.input.is_empty() => Line::from(vec![
                Span::raw(" "),
                Span::styled(view.input.clone(), MedicalTheme::text()),
                Span::styled("▌", MedicalTheme::focused()),
            ]),
            FieldDomain::Range { .. } => {
                let (min, max) = slider_bounds(field);
                Line::from(vec![
                    Span::styled(format!(" {:>5} ", format_value(value)), MedicalTheme::text()),
                    Span::styled(slider_bar(value, min, max, 30), MedicalTheme::focused()),
                    Span::styled(
                        format!(" {}-{}", format_value(min), format_value(max)),
                        MedicalTheme::text_muted(),
                    ),
                ])
            }
        };

        let error = if is_selected {
            view.input_error
                .as_ref()
                .or_else(|| wizard.errors().get(field))
        } else {
            wizard.errors().get(field)
        };
        let message = match error {
            Some(e) => Line::from(Span::styled(format!(" {e}"), MedicalTheme::danger())),
            None => Line::from(""),
        };

        f.render_widget(Paragraph::new(vec![control, message]).block(block), chunks[i]);
    }
}

fn choice_line(field: Field, codes: &[f64], value: f64) -> Line<'static> {
    let mut spans = vec![Span::raw(" ")];
    for &code in codes {
        let label = field.choice_label(code).unwrap_or("?");
        let style = if code == value {
            MedicalTheme::selected()
        } else {
            MedicalTheme::text_secondary()
        };
        spans.push(Span::styled(format!(" {label} "), style));
        spans.push(Span::raw(" "));
    }
    Line::from(spans)
}

/// Waiting screen while the initial assessment is in flight.
pub fn render_submitting(f: &mut Frame, area: Rect, elapsed_secs: u64) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled("Analyzing your answers...", MedicalTheme::focused())),
        Line::from(""),
        Line::from(Span::styled(
            format!("Waiting for the prediction service ({elapsed_secs}s)"),
            MedicalTheme::text_muted(),
        )),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(content, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FieldErrorKind;

    #[test]
    fn test_field_focus_wraps() {
        let mut view = WizardView::default();
        let step = WizardStep::Vitals;
        view.prev_field(step);
        assert_eq!(view.selected_field(step), Field::DiastolicPressure);
        view.next_field(step);
        assert_eq!(view.selected_field(step), Field::Height);

        view.focus(step, Field::SystolicPressure);
        assert_eq!(view.selected, 2);
        // Fields of other steps are ignored.
        view.focus(step, Field::Age);
        assert_eq!(view.selected, 2);
    }

    #[test]
    fn test_typed_input() {
        let mut view = WizardView::default();
        let step = WizardStep::Vitals;
        for c in "172.5x".chars() {
            view.input_char(step, c);
        }
        assert_eq!(view.input, "172.5");
        assert_eq!(view.take_input(step), Some((Field::Height, 172.5)));
        assert!(view.input.is_empty());
    }

    #[test]
    fn test_malformed_input_keeps_error() {
        let mut view = WizardView::default();
        let step = WizardStep::Vitals;
        view.input_char(step, '.');
        assert_eq!(view.take_input(step), None);
        let error = view.input_error.as_ref().expect("error kept");
        assert_eq!(error.field, Field::Height);
        assert!(matches!(error.kind, FieldErrorKind::NotANumber { .. }));
    }

    #[test]
    fn test_choice_fields_ignore_typing() {
        let mut view = WizardView::default();
        view.input_char(WizardStep::Profile, '5');
        assert_eq!(view.input, "5");

        view.next_field(WizardStep::Profile);
        view.input_char(WizardStep::Profile, '2');
        assert!(view.input.is_empty());
    }
}
