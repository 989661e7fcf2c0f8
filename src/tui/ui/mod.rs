//! UI module: View components for the TUI.

pub mod landing;
pub mod results;
pub mod wizard;

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::tui::styles::MedicalTheme;

pub fn render_disclaimer(f: &mut Frame, area: Rect) {
    let text = vec![
        Line::from(vec![Span::styled(
            "DISCLAIMER: This tool provides indicative estimates and does not replace professional medical evaluation.",
            MedicalTheme::text_muted(),
        )]),
        Line::from(vec![Span::styled(
            "Heart age is an illustrative figure, not a clinical measurement.",
            MedicalTheme::text_muted(),
        )]),
    ];

    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(MedicalTheme::border());

    let p = Paragraph::new(text).block(block).wrap(Wrap { trim: true });

    f.render_widget(p, area);
}

/// Screen header: product name, then a screen-specific caption.
pub(crate) fn render_header(f: &mut Frame, area: Rect, title: &str, caption: &str) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", MedicalTheme::text()),
        Span::styled(title.to_string(), MedicalTheme::title()),
        Span::styled(" │ ", MedicalTheme::text_muted()),
        Span::styled(caption.to_string(), MedicalTheme::text_secondary()),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(header, area);
}

/// Footer with `[key] description` pairs.
pub(crate) fn render_key_hints(f: &mut Frame, area: Rect, hints: &[(&str, &str)]) {
    let spans: Vec<Span> = hints
        .iter()
        .flat_map(|(key, desc)| {
            [
                Span::styled(format!("[{key}] "), MedicalTheme::key_hint()),
                Span::styled(format!("{desc} "), MedicalTheme::key_desc()),
            ]
        })
        .collect();

    let footer = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(footer, area);
}

/// Whole numbers without decimals, everything else with one.
pub(crate) fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}

/// Text slider such as `━━━━●─────` for `value` within `[min, max]`.
pub(crate) fn slider_bar(value: f64, min: f64, max: f64, width: usize) -> String {
    if width == 0 {
        return String::new();
    }
    let span = (max - min).max(f64::EPSILON);
    let ratio = ((value - min) / span).clamp(0.0, 1.0);
    let knob = (ratio * (width - 1) as f64).round() as usize;

    (0..width)
        .map(|i| match i.cmp(&knob) {
            std::cmp::Ordering::Less => '━',
            std::cmp::Ordering::Equal => '●',
            std::cmp::Ordering::Greater => '─',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(165.0), "165");
        assert_eq!(format_value(81.5), "81.5");
    }

    #[test]
    fn test_slider_bar_positions() {
        assert_eq!(slider_bar(40.0, 40.0, 150.0, 5), "●────");
        assert_eq!(slider_bar(150.0, 40.0, 150.0, 5), "━━━━●");
        assert_eq!(slider_bar(95.0, 40.0, 150.0, 5), "━━●──");
        // Out-of-range values pin to the ends.
        assert_eq!(slider_bar(200.0, 40.0, 150.0, 3), "━━●");
        assert_eq!(slider_bar(1.0, 0.0, 1.0, 0), "");
    }
}
