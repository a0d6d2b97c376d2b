//! Patient data input form.
//!
//! Numeric fields are free-text buffers limited to digits and `.`; choice
//! fields cycle through a closed list. Bounds come from the domain constants
//! and are checked on submit.

use std::ops::RangeInclusive;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use zeroize::Zeroize;

use crate::domain::{
    Answer, FeatureSchema, PatientInput, Sex, SmokingStatus, AGE_RANGE, BLOOD_SUGAR_RANGE,
    CHOLESTEROL_RANGE, HEIGHT_RANGE, WAIST_RANGE, WEIGHT_RANGE,
};
use crate::tui::styles::MedicalTheme;

use super::{key_hints, render_header};

const ANSWER_LABELS: [&str; 2] = ["No", "Yes"];
const SEX_LABELS: [&str; 2] = ["Male", "Female"];
const SMOKING_LABELS: [&str; 3] = ["Never smoked", "Former (quit)", "Current smoker"];

/// Which `PatientInput` attribute a field feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldId {
    Age,
    Sex,
    PreviousHeartDisease,
    Hypertension,
    Diabetes,
    Smoking,
    Obesity,
    Weight,
    Height,
    Waist,
    Cholesterol,
    BloodSugar,
}

#[derive(Debug, Clone)]
pub enum FieldValue {
    Number {
        buffer: String,
        min: f64,
        max: f64,
        unit: &'static str,
    },
    Choice {
        options: &'static [&'static str],
        index: usize,
    },
}

#[derive(Debug, Clone)]
pub struct FormField {
    pub id: FieldId,
    pub label: &'static str,
    pub value: FieldValue,
}

impl FormField {
    fn number(
        id: FieldId,
        label: &'static str,
        range: &RangeInclusive<f64>,
        unit: &'static str,
        default: f64,
    ) -> Self {
        Self {
            id,
            label,
            value: FieldValue::Number {
                buffer: default.to_string(),
                min: *range.start(),
                max: *range.end(),
                unit,
            },
        }
    }

    fn choice(
        id: FieldId,
        label: &'static str,
        options: &'static [&'static str],
        index: usize,
    ) -> Self {
        Self {
            id,
            label,
            value: FieldValue::Choice { options, index },
        }
    }

    /// Text shown in the field box.
    #[must_use]
    pub fn display(&self) -> String {
        match &self.value {
            FieldValue::Number { buffer, min, max, unit } if buffer.is_empty() => {
                format!("{unit} ({min}-{max})")
            }
            FieldValue::Number { buffer, unit, .. } => format!("{buffer} {unit}"),
            FieldValue::Choice { options, index } => format!("◂ {} ▸", options[*index]),
        }
    }

    fn parse_number(&self) -> Result<f64, String> {
        match &self.value {
            FieldValue::Number { buffer, .. } => buffer
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| format!("{}: Invalid number", self.label)),
            FieldValue::Choice { .. } => Err(format!("{}: not a numeric field", self.label)),
        }
    }

    fn choice_index(&self) -> usize {
        match &self.value {
            FieldValue::Choice { index, .. } => *index,
            FieldValue::Number { .. } => 0,
        }
    }
}

/// Patient form state
pub struct PatientFormState {
    pub fields: Vec<FormField>,
    pub selected_field: usize,
    pub error_message: Option<String>,
}

impl PatientFormState {
    /// Empty form for `schema`, prefilled with the form defaults.
    #[must_use]
    pub fn new(schema: FeatureSchema) -> Self {
        let d = PatientInput::default();
        let mut fields = vec![
            FormField::number(
                FieldId::Age,
                "Age",
                &(f64::from(*AGE_RANGE.start())..=f64::from(*AGE_RANGE.end())),
                "years",
                f64::from(d.age),
            ),
            FormField::choice(FieldId::Sex, "Sex", &SEX_LABELS, 0),
            FormField::choice(
                FieldId::PreviousHeartDisease,
                "Previous heart disease?",
                &ANSWER_LABELS,
                0,
            ),
            FormField::choice(FieldId::Hypertension, "Hypertension?", &ANSWER_LABELS, 0),
            FormField::choice(FieldId::Diabetes, "Diabetes?", &ANSWER_LABELS, 0),
            FormField::choice(FieldId::Smoking, "Smoking status", &SMOKING_LABELS, 0),
        ];
        if schema.asks_obesity() {
            fields.push(FormField::choice(
                FieldId::Obesity,
                "Obesity (BMI ≥ 30)?",
                &ANSWER_LABELS,
                0,
            ));
        }
        fields.extend([
            FormField::number(FieldId::Weight, "Weight", &WEIGHT_RANGE, "kg", d.weight_kg),
            FormField::number(FieldId::Height, "Height", &HEIGHT_RANGE, "cm", d.height_cm),
            FormField::number(
                FieldId::Waist,
                "Waist circumference",
                &WAIST_RANGE,
                "cm",
                d.waist_circumference_cm,
            ),
            FormField::number(
                FieldId::Cholesterol,
                "Total cholesterol",
                &CHOLESTEROL_RANGE,
                "mg/dL",
                d.cholesterol_total_mg_dl,
            ),
            FormField::number(
                FieldId::BloodSugar,
                "Fasting blood sugar",
                &BLOOD_SUGAR_RANGE,
                "mg/dL",
                d.fasting_blood_sugar_mg_dl,
            ),
        ]);

        Self {
            fields,
            selected_field: 0,
            error_message: None,
        }
    }

    /// Move to the next field
    pub fn next_field(&mut self) {
        self.selected_field = (self.selected_field + 1) % self.fields.len();
    }

    /// Move to the previous field
    pub fn prev_field(&mut self) {
        if self.selected_field == 0 {
            self.selected_field = self.fields.len() - 1;
        } else {
            self.selected_field -= 1;
        }
    }

    /// Add a character to the current numeric field
    pub fn input_char(&mut self, c: char) {
        if let FieldValue::Number { buffer, .. } = &mut self.fields[self.selected_field].value {
            if c.is_ascii_digit() || c == '.' {
                buffer.push(c);
                self.error_message = None;
            }
        }
    }

    /// Delete the last character
    pub fn delete_char(&mut self) {
        if let FieldValue::Number { buffer, .. } = &mut self.fields[self.selected_field].value {
            buffer.pop();
        }
    }

    /// Clear the current field
    pub fn clear_field(&mut self) {
        match &mut self.fields[self.selected_field].value {
            FieldValue::Number { buffer, .. } => buffer.zeroize(),
            FieldValue::Choice { index, .. } => *index = 0,
        }
    }

    /// Step the current choice field forward or back, wrapping.
    pub fn cycle_choice(&mut self, forward: bool) {
        if let FieldValue::Choice { options, index } = &mut self.fields[self.selected_field].value {
            let n = options.len();
            *index = if forward { (*index + 1) % n } else { (*index + n - 1) % n };
            self.error_message = None;
        }
    }

    #[must_use]
    pub fn selected_is_choice(&self) -> bool {
        matches!(self.fields[self.selected_field].value, FieldValue::Choice { .. })
    }

    /// Wipe all field buffers from memory and reset choices.
    ///
    /// Called once a submission is accepted so plaintext inputs do not
    /// linger in UI state.
    pub fn clear_sensitive(&mut self) {
        for field in &mut self.fields {
            match &mut field.value {
                FieldValue::Number { buffer, .. } => buffer.zeroize(),
                FieldValue::Choice { index, .. } => *index = 0,
            }
        }
        self.error_message = None;
        self.selected_field = 0;
    }

    /// Parse and bounds-check every field.
    ///
    /// # Errors
    /// Returns a message naming the offending fields.
    pub fn to_patient_input(&self) -> Result<PatientInput, String> {
        let mut input = PatientInput::default();

        for field in &self.fields {
            match field.id {
                FieldId::Age => {
                    let age = field.parse_number()?;
                    if age.fract() != 0.0 || age < 0.0 {
                        return Err(format!("{}: Whole years only", field.label));
                    }
                    input.age = age as u32;
                }
                FieldId::Sex => input.sex = Sex::ALL[field.choice_index()],
                FieldId::PreviousHeartDisease => {
                    input.previous_heart_disease = Answer::ALL[field.choice_index()];
                }
                FieldId::Hypertension => input.hypertension = Answer::ALL[field.choice_index()],
                FieldId::Diabetes => input.diabetes = Answer::ALL[field.choice_index()],
                FieldId::Smoking => input.smoking_status = SmokingStatus::ALL[field.choice_index()],
                FieldId::Obesity => {
                    input.reported_obesity = Some(Answer::ALL[field.choice_index()]);
                }
                FieldId::Weight => input.weight_kg = field.parse_number()?,
                FieldId::Height => input.height_cm = field.parse_number()?,
                FieldId::Waist => input.waist_circumference_cm = field.parse_number()?,
                FieldId::Cholesterol => input.cholesterol_total_mg_dl = field.parse_number()?,
                FieldId::BloodSugar => input.fasting_blood_sugar_mg_dl = field.parse_number()?,
            }
        }

        input.validate().map_err(|errors| {
            errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        })?;
        Ok(input)
    }

    /// Load sample data for a quick demo (high-risk profile)
    pub fn load_sample_data(&mut self) {
        for field in &mut self.fields {
            match (&mut field.value, field.id) {
                (FieldValue::Number { buffer, .. }, id) => {
                    let sample = match id {
                        FieldId::Age => "67",
                        FieldId::Weight => "90",
                        FieldId::Height => "170",
                        FieldId::Waist => "104",
                        FieldId::Cholesterol => "250",
                        FieldId::BloodSugar => "130",
                        _ => continue,
                    };
                    buffer.zeroize();
                    buffer.push_str(sample);
                }
                (FieldValue::Choice { index, .. }, id) => {
                    *index = match id {
                        FieldId::Smoking => 2,
                        FieldId::Diabetes | FieldId::Sex => 0,
                        _ => 1,
                    };
                }
            }
        }
        self.error_message = None;
    }
}

/// Render the patient data input form
pub fn render_patient_form(f: &mut Frame, area: Rect, state: &PatientFormState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Form
            Constraint::Length(3), // Footer/error
        ])
        .split(area);

    render_header(f, chunks[0], "Patient Data Entry");
    render_form_fields(f, chunks[1], state);
    render_form_footer(f, chunks[2], state);
}

fn render_form_fields(f: &mut Frame, area: Rect, state: &PatientFormState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .margin(1)
        .split(area);

    let mid = state.fields.len().div_ceil(2);

    render_field_column(f, columns[0], &state.fields[..mid], 0, state.selected_field);
    render_field_column(f, columns[1], &state.fields[mid..], mid, state.selected_field);
}

fn render_field_column(
    f: &mut Frame,
    area: Rect,
    fields: &[FormField],
    offset: usize,
    selected: usize,
) {
    let constraints: Vec<Constraint> = fields
        .iter()
        .map(|_| Constraint::Length(3))
        .chain(std::iter::once(Constraint::Min(0)))
        .collect();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    for (i, field) in fields.iter().enumerate() {
        let is_selected = offset + i == selected;
        let (border_style, title_style) = if is_selected {
            (MedicalTheme::border_focused(), MedicalTheme::focused())
        } else {
            (MedicalTheme::border(), MedicalTheme::text_secondary())
        };

        let block = Block::default()
            .title(Span::styled(format!(" {} ", field.label), title_style))
            .borders(Borders::ALL)
            .border_style(border_style);

        let empty = matches!(&field.value, FieldValue::Number { buffer, .. } if buffer.is_empty());
        let value_style = if empty {
            MedicalTheme::text_muted()
        } else {
            MedicalTheme::text()
        };

        let content = Paragraph::new(Line::from(vec![
            Span::raw(" "),
            Span::styled(field.display(), value_style),
            if is_selected && !matches!(field.value, FieldValue::Choice { .. }) {
                Span::styled("▌", MedicalTheme::cursor())
            } else {
                Span::raw("")
            },
        ]))
        .block(block);

        f.render_widget(content, chunks[i]);
    }
}

fn render_form_footer(f: &mut Frame, area: Rect, state: &PatientFormState) {
    let content = if let Some(err) = &state.error_message {
        Line::from(vec![
            Span::styled("! ", MedicalTheme::danger()),
            Span::styled(err.clone(), MedicalTheme::danger()),
        ])
    } else if state.selected_is_choice() {
        key_hints(&[
            ("↑↓", "Navigate"),
            ("←→/Space", "Change"),
            ("Enter", "Check risk"),
            ("S", "Sample"),
            ("Esc", "Cancel"),
        ])
    } else {
        key_hints(&[
            ("↑↓", "Navigate"),
            ("Del", "Clear"),
            ("Enter", "Check risk"),
            ("S", "Sample"),
            ("Esc", "Cancel"),
        ])
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

    fn select(state: &mut PatientFormState, id: FieldId) {
        state.selected_field = state
            .fields
            .iter()
            .position(|f| f.id == id)
            .expect("field present");
    }

    #[test]
    fn test_defaults_round_trip_to_input() {
        let state = PatientFormState::new(FeatureSchema::MetabolicProxy);
        assert_eq!(state.to_patient_input().expect("valid"), PatientInput::default());
        assert!(state.fields.iter().all(|f| f.id != FieldId::Obesity));
    }

    #[test]
    fn test_clinical_form_asks_obesity() {
        let state = PatientFormState::new(FeatureSchema::RawClinical);
        let input = state.to_patient_input().expect("valid");
        assert_eq!(input.reported_obesity, Some(Answer::No));
    }

    #[test]
    fn test_numeric_field_filters_input() {
        let mut state = PatientFormState::new(FeatureSchema::MetabolicProxy);
        select(&mut state, FieldId::Weight);
        state.clear_field();
        for c in "8x2.5-".chars() {
            state.input_char(c);
        }
        assert_eq!(state.to_patient_input().expect("valid").weight_kg, 82.5);
    }

    #[test]
    fn test_choice_cycles_and_wraps() {
        let mut state = PatientFormState::new(FeatureSchema::MetabolicProxy);
        select(&mut state, FieldId::Smoking);
        state.cycle_choice(false);
        assert_eq!(
            state.to_patient_input().expect("valid").smoking_status,
            SmokingStatus::Current
        );
        state.cycle_choice(true);
        assert_eq!(
            state.to_patient_input().expect("valid").smoking_status,
            SmokingStatus::Never
        );
        // Typing into a choice field is ignored.
        state.input_char('1');
        assert!(state.selected_is_choice());
    }

    #[test]
    fn test_out_of_range_is_reported() {
        let mut state = PatientFormState::new(FeatureSchema::MetabolicProxy);
        select(&mut state, FieldId::Height);
        state.clear_field();
        state.input_char('9');
        state.input_char('0');
        let err = state.to_patient_input().expect_err("out of range");
        assert!(err.contains("height_cm"));
    }

    #[test]
    fn test_empty_and_fractional_age_rejected() {
        let mut state = PatientFormState::new(FeatureSchema::MetabolicProxy);
        select(&mut state, FieldId::Age);
        state.clear_field();
        assert!(state.to_patient_input().expect_err("empty").contains("Invalid number"));

        for c in "50.5".chars() {
            state.input_char(c);
        }
        assert!(state.to_patient_input().expect_err("fraction").contains("Whole years"));
    }

    #[test]
    fn test_sample_data_is_valid() {
        let mut state = PatientFormState::new(FeatureSchema::RawClinical);
        state.load_sample_data();
        let input = state.to_patient_input().expect("valid");
        assert_eq!(input.age, 67);
        assert_eq!(input.smoking_status, SmokingStatus::Current);
        assert_eq!(input.hypertension, Answer::Yes);
        assert_eq!(input.diabetes, Answer::No);
        assert_eq!(input.reported_obesity, Some(Answer::Yes));
    }

    #[test]
    fn test_clear_sensitive_wipes_buffers() {
        let mut state = PatientFormState::new(FeatureSchema::MetabolicProxy);
        state.load_sample_data();
        state.selected_field = 3;
        state.clear_sensitive();

        assert_eq!(state.selected_field, 0);
        for field in &state.fields {
            match &field.value {
                FieldValue::Number { buffer, .. } => assert!(buffer.is_empty()),
                FieldValue::Choice { index, .. } => assert_eq!(*index, 0),
            }
        }
    }
}
