//! Risk check result view.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};

use crate::domain::{Assessment, RiskLabel};
use crate::tui::styles::MedicalTheme;

use super::{key_hints, render_header};

pub const CONSULT_WARNING: &str =
    "This is not a diagnosis. Please consult a doctor about your heart health.";

/// What the result screen shows.
#[derive(Debug, Clone)]
pub enum ResultState {
    Complete { assessment: Assessment },
    Error { message: String },
}

pub fn render_result(f: &mut Frame, area: Rect, state: &ResultState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Footer
        ])
        .split(area);

    render_header(f, chunks[0], "Risk Check Result");
    match state {
        ResultState::Complete { assessment } => render_assessment(f, chunks[1], assessment),
        ResultState::Error { message } => render_error(f, chunks[1], message),
    }
    render_result_footer(f, chunks[2], state);
}

/// Banner, summary and BMI lines, in display order.
pub(crate) fn headline_lines(assessment: &Assessment) -> Vec<Line<'static>> {
    let label = assessment.prediction.label;
    let icon = match label {
        RiskLabel::Low => "OK",
        RiskLabel::High => "!",
    };
    vec![
        Line::from(Span::styled(
            format!("{icon} {label}"),
            MedicalTheme::risk(label).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(assessment.prediction.summary(), MedicalTheme::text())),
        Line::from(Span::styled(label.description(), MedicalTheme::text_secondary())),
        Line::from(""),
        Line::from(Span::styled(assessment.bmi_line(), MedicalTheme::text())),
    ]
}

fn render_assessment(f: &mut Frame, area: Rect, assessment: &Assessment) {
    let block = Block::default()
        .title(Span::styled(" Assessment ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border_focused());

    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6), // Banner + BMI
            Constraint::Length(3), // Probability
            Constraint::Length(2), // Warning
            Constraint::Min(0),    // Timestamp
        ])
        .margin(1)
        .split(inner);

    let headline = Paragraph::new(headline_lines(assessment)).alignment(Alignment::Center);
    f.render_widget(headline, chunks[0]);

    let label = assessment.prediction.label;
    let percent = assessment.prediction.percent();
    let gauge = Gauge::default()
        .block(
            Block::default()
                .title(Span::styled(" Heart attack probability ", MedicalTheme::text_secondary()))
                .borders(Borders::ALL)
                .border_style(MedicalTheme::border()),
        )
        .gauge_style(MedicalTheme::risk(label))
        .ratio(assessment.prediction.probability.clamp(0.0, 1.0))
        .label(format!("{percent:.1}%"));
    f.render_widget(gauge, chunks[1]);

    let warning = Paragraph::new(Line::from(Span::styled(CONSULT_WARNING, MedicalTheme::warning())))
        .alignment(Alignment::Center);
    f.render_widget(warning, chunks[2]);

    let stamp = Paragraph::new(Line::from(vec![
        Span::styled("Assessed at ", MedicalTheme::text_muted()),
        Span::styled(
            assessment.assessed_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            MedicalTheme::text_secondary(),
        ),
    ]))
    .alignment(Alignment::Center);
    f.render_widget(stamp, chunks[3]);
}

fn render_error(f: &mut Frame, area: Rect, message: &str) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled("! Risk check failed", MedicalTheme::danger())),
        Line::from(""),
        Line::from(Span::styled(message.to_string(), MedicalTheme::text())),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(MedicalTheme::danger()),
    );

    f.render_widget(content, area);
}

fn render_result_footer(f: &mut Frame, area: Rect, state: &ResultState) {
    let content = match state {
        ResultState::Complete { .. } => key_hints(&[("Enter", "Dashboard"), ("N", "New check")]),
        ResultState::Error { .. } => key_hints(&[("Enter", "Back to form"), ("Esc", "Dashboard")]),
    };

    let footer = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(footer, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{derive, FeatureSchema, PatientInput, Prediction};

    fn text(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_headline_for_high_risk() {
        let input = PatientInput {
            weight_kg: 90.0,
            ..Default::default()
        };
        let features = derive(&input, FeatureSchema::MetabolicProxy);
        let assessment = Assessment::new(features, 31.14, Prediction::new(RiskLabel::High, 0.734));

        let lines: Vec<String> = headline_lines(&assessment).iter().map(text).collect();
        assert_eq!(lines[0], "! HIGH RISK");
        assert_eq!(lines[1], "73.4% chance of a heart attack");
        assert_eq!(lines[4], "BMI: 31.1 → Obese");
    }

    #[test]
    fn test_headline_for_low_risk() {
        let features = derive(&PatientInput::default(), FeatureSchema::MetabolicProxy);
        let assessment = Assessment::new(features, 24.22, Prediction::new(RiskLabel::Low, 0.12));

        let lines: Vec<String> = headline_lines(&assessment).iter().map(text).collect();
        assert_eq!(lines[0], "OK LOW RISK");
        assert_eq!(lines[1], "Only 12.0% risk");
    }
}
