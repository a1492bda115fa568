//! Persistence module split across one submodule per table. Every function in
//! here tries to encapsulate one query (or one explicit transaction) so the
//! rest of the codebase can stay focused on UI state management.

mod connection;
mod equipment;
mod exercises;
mod users;
mod workouts;

pub use connection::{initialize, open_default};
pub(crate) use connection::DATA_DIR_NAME;
pub use equipment::{
    count_distinct_equipment, create_equipment, create_equipment_items, delete_equipment,
    delete_equipment_by_exercise, fetch_equipment_by_exercise, fetch_equipment_by_workout,
    fetch_unique_equipment_names, update_equipment,
};
pub use exercises::{
    count_exercises, create_exercise, create_exercises, delete_exercise, delete_exercises,
    delete_exercises_by_workout, fetch_completed_exercises, fetch_exercise_by_id,
    fetch_exercises_by_workout, reset_exercises, set_exercise_completed, update_exercise,
};
pub use users::{
    create_user, email_exists, fetch_user_by_email, fetch_user_by_id, update_last_login,
    update_user,
};
pub use workouts::{
    count_completed_workouts, count_workouts, create_workout, create_workout_with_exercises,
    delete_workout, fetch_completed_workouts, fetch_incomplete_workouts, fetch_workout_by_id,
    fetch_workout_overviews, fetch_workouts_by_user, replace_workout_exercises,
    reset_all_workouts, set_workout_completed, update_workout,
};

use chrono::Utc;
use rusqlite::{Error as SqlError, ErrorCode};
use thiserror::Error;

/// Failures the store distinguishes beyond plain SQL errors. Reads never
/// produce `NotFound`; only writes that matched zero rows do, since callers
/// of those must have supplied a stale primary key.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Constraint(String),
}

/// Current time as epoch milliseconds, the unit every timestamp column uses.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Coerce SQLite constraint errors into human-readable messages. Anything
/// else passes through untouched so the caller's context chain stays intact.
fn map_constraint(err: SqlError, what: &str) -> anyhow::Error {
    if matches!(err.sqlite_error_code(), Some(ErrorCode::ConstraintViolation)) {
        StoreError::Constraint(format!("{what} violates a database constraint")).into()
    } else {
        err.into()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use rusqlite::Connection;

    /// Fresh in-memory database with the full schema applied, used by the
    /// per-module tests for isolation.
    pub(crate) fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().expect("open in-memory database");
        super::initialize(&conn).expect("initialize schema");
        conn
    }
}
