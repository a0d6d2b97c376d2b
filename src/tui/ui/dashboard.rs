//! Dashboard view: Main overview screen.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::adapters::{ModelInfo, Verification};
use crate::tui::styles::MedicalTheme;

use super::{key_hints, render_header};

/// Render the main dashboard view.
pub fn render_dashboard(f: &mut Frame, area: Rect, model: &ModelInfo) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Main content
        ])
        .split(area);

    render_header(f, chunks[0], "Heart Attack Risk Check");
    render_main_content(f, chunks[1], model);
}

fn render_main_content(f: &mut Frame, area: Rect, model: &ModelInfo) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .margin(1)
        .split(area);

    let status = Paragraph::new(model_status_lines(model)).block(
        Block::default()
            .title(Span::styled(" Model Status ", MedicalTheme::subtitle()))
            .borders(Borders::ALL)
            .border_style(MedicalTheme::border()),
    );
    f.render_widget(status, chunks[0]);

    let actions = Paragraph::new(vec![
        Line::from(""),
        key_hints(&[("N", "New risk check")]),
        key_hints(&[("Q", "Quit")]),
        Line::from(""),
        Line::from(Span::styled(
            "Answer a few questions about your health to",
            MedicalTheme::text_muted(),
        )),
        Line::from(Span::styled(
            "get an estimated heart attack risk.",
            MedicalTheme::text_muted(),
        )),
    ])
    .block(
        Block::default()
            .title(Span::styled(" Quick Actions ", MedicalTheme::subtitle()))
            .borders(Borders::ALL)
            .border_style(MedicalTheme::border()),
    );
    f.render_widget(actions, chunks[1]);
}

pub(crate) fn model_status_lines(model: &ModelInfo) -> Vec<Line<'static>> {
    let mut lines = vec![
        status_row("Model", model.kind.replace('_', " ")),
        status_row("Schema", model.schema.to_string()),
        status_row("Features", model.n_features.to_string()),
    ];
    if let Some(n) = model.n_trees {
        lines.push(status_row("Trees", n.to_string()));
    }

    lines.push(match &model.verification {
        Verification::Signed { fingerprint } => Line::from(vec![
            Span::styled("  OK ", MedicalTheme::success()),
            Span::styled("Signature verified ", MedicalTheme::text()),
            Span::styled(
                fingerprint.chars().take(16).collect::<String>(),
                MedicalTheme::text_muted(),
            ),
        ]),
        Verification::Unsigned => Line::from(vec![
            Span::styled("  !! ", MedicalTheme::warning()),
            Span::styled("Unsigned model (opt-in)", MedicalTheme::warning()),
        ]),
    });
    lines
}

fn status_row(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {label}: "), MedicalTheme::text_secondary()),
        Span::styled(value, MedicalTheme::text()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FeatureSchema;
    use std::path::PathBuf;

    fn line_text(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_status_lines_for_unsigned_forest() {
        let info = ModelInfo {
            path: PathBuf::from("models/model.json"),
            kind: "random_forest",
            schema: FeatureSchema::MetabolicProxy,
            n_features: 13,
            n_trees: Some(5),
            verification: Verification::Unsigned,
        };
        let text: Vec<String> = model_status_lines(&info).iter().map(line_text).collect();

        assert_eq!(text[0], "  Model: random forest");
        assert_eq!(text[1], "  Schema: metabolic");
        assert!(text.iter().any(|l| l == "  Trees: 5"));
        assert!(text.last().is_some_and(|l| l.contains("Unsigned")));
    }
}
