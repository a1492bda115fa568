//! Ratatui front end: screen state, form state, key dispatch, and the
//! terminal event loop.

mod app;
mod forms;
mod helpers;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::run_app;
