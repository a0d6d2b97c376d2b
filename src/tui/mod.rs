//! TUI module: Terminal User Interface using Ratatui.
//!
//! Three screens:
//! - Dashboard with model status
//! - Patient data input
//! - Risk check result

mod app;
mod styles;
mod ui;

pub use app::{App, Screen};
pub use styles::MedicalTheme;
