//! TUI module: Terminal User Interface using Ratatui.
//!
//! Screens:
//! - Landing with service status and model details
//! - Five-step assessment wizard
//! - Results with live what-if simulation

mod app;
mod styles;
mod ui;
mod worker;

pub use app::{App, Screen};
pub use styles::MedicalTheme;
pub use worker::{PredictionWorker, WorkerMessage};
