//! Main TUI application state machine.
//!
//! Handles:
//! - Screen navigation
//! - Input event handling
//! - Service integration (scoring runs inline on submit)

use std::io;
use std::time::Duration;

use anyhow::{anyhow, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Terminal,
};

use crate::adapters::ModelInfo;
use crate::application::AssessmentService;
use crate::config::AppConfig;

use super::ui::{
    dashboard::render_dashboard,
    patient::{render_patient_form, PatientFormState},
    render_disclaimer,
    result::{render_result, ResultState},
};

/// Current screen/view in the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Dashboard,
    PatientForm,
    Result,
}

/// Main application state
pub struct App {
    screen: Screen,
    should_quit: bool,
    service: AssessmentService,
    model_info: ModelInfo,
    patient_form_state: PatientFormState,
    result_state: Option<ResultState>,
}

impl App {
    /// Load the model once and build the app around it (composition root).
    ///
    /// The app refuses to start if the model cannot be verified or does not
    /// match the configured schema.
    ///
    /// # Errors
    /// Returns error if the model cannot be loaded.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let loaded = config
            .model_loader()
            .load(&config.model_path)
            .map_err(|e| anyhow!("Failed to load model from {:?}: {}", config.model_path, e))?;

        let service = AssessmentService::new(loaded.predictor, config.schema);
        Ok(Self::with_dependencies(service, loaded.info))
    }

    /// Create application with injected dependencies.
    #[must_use]
    pub fn with_dependencies(service: AssessmentService, model_info: ModelInfo) -> Self {
        let patient_form_state = PatientFormState::new(service.schema());
        Self {
            screen: Screen::Dashboard,
            should_quit: false,
            service,
            model_info,
            patient_form_state,
            result_state: None,
        }
    }

    #[must_use]
    pub fn screen(&self) -> Screen {
        self.screen
    }

    #[must_use]
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Run the main application loop.
    ///
    /// # Errors
    /// Returns error if terminal operations fail.
    pub fn run(&mut self) -> Result<()> {
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

    fn main_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|f| {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Min(0), Constraint::Length(3)])
                    .split(f.area());

                match (self.screen, &self.result_state) {
                    (Screen::Dashboard, _) => render_dashboard(f, chunks[0], &self.model_info),
                    (Screen::PatientForm, _) => {
                        render_patient_form(f, chunks[0], &self.patient_form_state)
                    }
                    (Screen::Result, Some(state)) => render_result(f, chunks[0], state),
                    (Screen::Result, None) => render_dashboard(f, chunks[0], &self.model_info),
                }

                render_disclaimer(f, chunks[1]);
            })?;

            if event::poll(Duration::from_millis(100))? {
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

    pub fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        // Global quit handling
        if matches!(key, KeyCode::Char('q') | KeyCode::Char('Q'))
            && modifiers.contains(KeyModifiers::CONTROL)
        {
            self.should_quit = true;
            return;
        }

        match self.screen {
            Screen::Dashboard => self.handle_dashboard_key(key),
            Screen::PatientForm => self.handle_patient_form_key(key),
            Screen::Result => self.handle_result_key(key),
        }
    }

    fn handle_dashboard_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('n') | KeyCode::Char('N') => self.start_new_check(),
            KeyCode::Char('q') | KeyCode::Char('Q') => self.should_quit = true,
            _ => {}
        }
    }

    fn handle_patient_form_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => {
                self.patient_form_state.clear_sensitive();
                self.screen = Screen::Dashboard;
                return;
            }
            KeyCode::Enter => {
                self.submit_patient_form();
                return;
            }
            _ => {}
        }

        let form = &mut self.patient_form_state;
        match key {
            KeyCode::Up | KeyCode::BackTab => form.prev_field(),
            KeyCode::Down | KeyCode::Tab => form.next_field(),
            KeyCode::Left if form.selected_is_choice() => form.cycle_choice(false),
            KeyCode::Right | KeyCode::Char(' ') if form.selected_is_choice() => {
                form.cycle_choice(true);
            }
            KeyCode::Char('s') | KeyCode::Char('S') => form.load_sample_data(),
            KeyCode::Char(c) => form.input_char(c),
            KeyCode::Backspace => form.delete_char(),
            KeyCode::Delete => form.clear_field(),
            _ => {}
        }
    }

    fn handle_result_key(&mut self, key: KeyCode) {
        let failed = matches!(self.result_state, Some(ResultState::Error { .. }));
        match key {
            KeyCode::Enter if failed => {
                self.result_state = None;
                self.screen = Screen::PatientForm;
            }
            KeyCode::Enter | KeyCode::Esc => {
                self.result_state = None;
                self.screen = Screen::Dashboard;
            }
            KeyCode::Char('n') | KeyCode::Char('N') if !failed => self.start_new_check(),
            _ => {}
        }
    }

    fn start_new_check(&mut self) {
        self.result_state = None;
        self.patient_form_state = PatientFormState::new(self.service.schema());
        self.screen = Screen::PatientForm;
    }

    fn submit_patient_form(&mut self) {
        let input = match self.patient_form_state.to_patient_input() {
            Ok(input) => input,
            Err(message) => {
                self.patient_form_state.error_message = Some(message);
                return;
            }
        };

        let state = match self.service.assess(&input) {
            Ok(assessment) => {
                // Plaintext buffers are only wiped once the submission is accepted.
                self.patient_form_state.clear_sensitive();
                ResultState::Complete { assessment }
            }
            Err(e) => {
                tracing::error!("Risk check failed: {}", e);
                ResultState::Error {
                    message: e.to_string(),
                }
            }
        };

        self.result_state = Some(state);
        self.screen = Screen::Result;
    }
}
