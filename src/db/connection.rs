use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use directories::BaseDirs;
use log::debug;
use rusqlite::Connection;

/// Folder name used beneath the user's home directory for application data.
/// The session record lives in the same folder.
pub(crate) const DATA_DIR_NAME: &str = ".workout-log-manager";
/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "workouts.sqlite";

/// Open the on-disk database, creating the data directory and schema when
/// missing, and return a live connection. The handle is constructed here and
/// injected everywhere else; there is no global.
pub fn open_default() -> Result<Connection> {
    let db_path = db_path()?;

    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent).context("failed to create data directory")?;
    }

    debug!("opening database at {}", db_path.display());
    let conn = Connection::open(&db_path).context("failed to open SQLite database")?;
    initialize(&conn)?;
    Ok(conn)
}

/// Apply the schema to a connection. Separated from `open_default` so tests
/// can run against `Connection::open_in_memory()` with identical tables and
/// pragmas. `PRAGMA foreign_keys = ON` is per-connection in SQLite, so it has
/// to happen here rather than in the schema.
pub fn initialize(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON")
        .context("failed to enable foreign keys")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS users (
            user_id INTEGER PRIMARY KEY AUTOINCREMENT,
            full_name TEXT NOT NULL,
            email TEXT NOT NULL,
            password_hash TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            last_login INTEGER NOT NULL
        )",
        [],
    )
    .context("failed to create users table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS workouts (
            workout_id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            workout_name TEXT NOT NULL,
            description TEXT,
            image_path TEXT,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            is_completed INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY(user_id) REFERENCES users(user_id) ON DELETE CASCADE
        )",
        [],
    )
    .context("failed to create workouts table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS exercises (
            exercise_id INTEGER PRIMARY KEY AUTOINCREMENT,
            workout_id INTEGER NOT NULL,
            exercise_name TEXT NOT NULL,
            sets INTEGER NOT NULL,
            reps INTEGER NOT NULL,
            instructions TEXT,
            is_completed INTEGER NOT NULL DEFAULT 0,
            order_index INTEGER NOT NULL,
            FOREIGN KEY(workout_id) REFERENCES workouts(workout_id) ON DELETE CASCADE
        )",
        [],
    )
    .context("failed to create exercises table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS equipment (
            equipment_id INTEGER PRIMARY KEY AUTOINCREMENT,
            exercise_id INTEGER NOT NULL,
            equipment_name TEXT NOT NULL,
            FOREIGN KEY(exercise_id) REFERENCES exercises(exercise_id) ON DELETE CASCADE
        )",
        [],
    )
    .context("failed to create equipment table")?;

    Ok(())
}

/// Resolve the absolute path to the SQLite database inside the user's home.
fn db_path() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME).join(DB_FILE_NAME))
}
