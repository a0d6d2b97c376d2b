//! UI module: View components for the TUI.

pub mod dashboard;
pub mod patient;
pub mod result;

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::tui::styles::MedicalTheme;

pub const DISCLAIMER: &str =
    "DISCLAIMER: This tool gives an indicative estimate only and does not replace a medical examination.";

pub fn render_disclaimer(f: &mut Frame, area: Rect) {
    let text = vec![
        Line::from(vec![Span::styled(DISCLAIMER, MedicalTheme::text_muted())]),
        Line::from(vec![Span::styled(
            "Nothing you enter is stored.",
            MedicalTheme::text_muted(),
        )]),
    ];

    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(MedicalTheme::border());

    let p = Paragraph::new(text).block(block).wrap(Wrap { trim: true });

    f.render_widget(p, area);
}

/// One-line header shared by every screen.
pub(crate) fn render_header(f: &mut Frame, area: Rect, subtitle: &str) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", MedicalTheme::text()),
        Span::styled(crate::tui::styles::APP_NAME, MedicalTheme::title()),
        Span::styled(" │ ", MedicalTheme::text_muted()),
        Span::styled(subtitle.to_string(), MedicalTheme::text_secondary()),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(header, area);
}

/// Key hint line: `[key] desc` pairs.
pub(crate) fn key_hints(pairs: &[(&'static str, &'static str)]) -> Line<'static> {
    let mut spans = Vec::with_capacity(pairs.len() * 2);
    for (key, desc) in pairs {
        spans.push(Span::styled(format!("[{key}] "), MedicalTheme::key_hint()));
        spans.push(Span::styled(format!("{desc} "), MedicalTheme::key_desc()));
    }
    Line::from(spans)
}
