//! TUI module for the interactive list/detail viewer.
//!
//! Uses `ratatui` + `crossterm` for rendering.

/// Viewer state container.
pub mod state;
mod ui;
mod viewer;

pub use viewer::run_viewer;
