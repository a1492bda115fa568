//! Core library surface for the Workout Log Manager TUI application.
//!
//! The modules exposed here keep the `bin` target thin: persistence lives in
//! [`db`], password hashing in [`auth`], the on-disk login record in
//! [`session`], background execution in [`tasks`], and everything the user
//! sees in [`ui`].

pub mod auth;
pub mod db;
pub mod models;
pub mod session;
pub mod share;
pub mod tasks;
pub mod ui;
pub mod validation;

/// The pieces `main.rs` wires together at startup.
pub use session::SessionStore;
pub use tasks::DbWorker;
pub use ui::{run_app, App};
