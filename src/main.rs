//! Binary entry point that glues the SQLite-backed domain model to the TUI.
//! Bootstrapping order matters: the logger comes up first so early failures
//! are visible, the database connection moves onto the worker thread, and the
//! session store decides which screen the app opens on.

use workout_log_manager::{db, run_app, App, DbWorker, SessionStore};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let conn = db::open_default()?;
    let worker = DbWorker::spawn(conn)?;
    let session = SessionStore::open_default()?;

    let mut app = App::new(worker, session)?;
    run_app(&mut app)
}
