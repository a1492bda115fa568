use anyhow::{Context, Result};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{equipment, exercises, map_constraint, now_millis, StoreError};
use crate::models::{ExerciseDraft, Workout, WorkoutWithExercises};

fn workout_from_row(row: &Row<'_>) -> rusqlite::Result<Workout> {
    Ok(Workout {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        image_path: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
        is_completed: row.get(7)?,
    })
}

const WORKOUT_COLUMNS: &str = "workout_id, user_id, workout_name, description, image_path, \
                               created_at, updated_at, is_completed";

/// Insert a new workout row, returning the hydrated struct so the caller can
/// push it straight into the in-memory list.
pub fn create_workout(
    conn: &Connection,
    user_id: i64,
    name: &str,
    description: Option<&str>,
    image_path: Option<&str>,
) -> Result<Workout> {
    let now = now_millis();
    conn.execute(
        "INSERT INTO workouts (user_id, workout_name, description, image_path,
                               created_at, updated_at, is_completed)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0)",
        params![user_id, name, description, image_path, now, now],
    )
    .map_err(|err| map_constraint(err, "workout"))
    .context("failed to insert workout")?;

    Ok(Workout {
        id: conn.last_insert_rowid(),
        user_id,
        name: name.to_string(),
        description: description.map(str::to_string),
        image_path: image_path.map(str::to_string),
        created_at: now,
        updated_at: now,
        is_completed: false,
    })
}

/// Full-row overwrite by primary key, refreshing `updated_at`. A missing key
/// updates nothing and is not an error.
pub fn update_workout(conn: &Connection, workout: &Workout) -> Result<()> {
    conn.execute(
        "UPDATE workouts SET workout_name = ?1, description = ?2, image_path = ?3,
         updated_at = ?4, is_completed = ?5 WHERE workout_id = ?6",
        params![
            workout.name,
            workout.description,
            workout.image_path,
            now_millis(),
            workout.is_completed,
            workout.id
        ],
    )
    .map_err(|err| map_constraint(err, "workout"))
    .context("failed to update workout")?;
    Ok(())
}

/// Remove a workout row. The schema cascades to `exercises` and from there to
/// `equipment`, so dependents need no manual cleanup.
pub fn delete_workout(conn: &Connection, workout_id: i64) -> Result<()> {
    let deleted = conn
        .execute(
            "DELETE FROM workouts WHERE workout_id = ?1",
            params![workout_id],
        )
        .context("failed to delete workout")?;

    if deleted == 0 {
        Err(StoreError::NotFound("workout").into())
    } else {
        Ok(())
    }
}

/// Point lookup by primary key; `None` when no row matches.
pub fn fetch_workout_by_id(conn: &Connection, workout_id: i64) -> Result<Option<Workout>> {
    conn.query_row(
        &format!("SELECT {WORKOUT_COLUMNS} FROM workouts WHERE workout_id = ?1 LIMIT 1"),
        params![workout_id],
        workout_from_row,
    )
    .optional()
    .context("failed to look up workout")
}

fn fetch_workouts(conn: &Connection, sql: &str, user_id: i64) -> Result<Vec<Workout>> {
    let mut stmt = conn.prepare(sql).context("failed to prepare workout query")?;
    let workouts = stmt
        .query_map(params![user_id], workout_from_row)
        .context("failed to load workouts")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect workouts")?;
    Ok(workouts)
}

/// Every workout owned by a user, newest first. The id tiebreak keeps rows
/// created in the same millisecond in insertion order.
pub fn fetch_workouts_by_user(conn: &Connection, user_id: i64) -> Result<Vec<Workout>> {
    fetch_workouts(
        conn,
        &format!(
            "SELECT {WORKOUT_COLUMNS} FROM workouts WHERE user_id = ?1
             ORDER BY created_at DESC, workout_id DESC"
        ),
        user_id,
    )
}

/// Completed workouts only, most recently touched first.
pub fn fetch_completed_workouts(conn: &Connection, user_id: i64) -> Result<Vec<Workout>> {
    fetch_workouts(
        conn,
        &format!(
            "SELECT {WORKOUT_COLUMNS} FROM workouts
             WHERE user_id = ?1 AND is_completed = 1
             ORDER BY updated_at DESC, workout_id DESC"
        ),
        user_id,
    )
}

/// Workouts still in progress, newest first.
pub fn fetch_incomplete_workouts(conn: &Connection, user_id: i64) -> Result<Vec<Workout>> {
    fetch_workouts(
        conn,
        &format!(
            "SELECT {WORKOUT_COLUMNS} FROM workouts
             WHERE user_id = ?1 AND is_completed = 0
             ORDER BY created_at DESC, workout_id DESC"
        ),
        user_id,
    )
}

/// Toggle the workout-level completion flag, stamping `updated_at` so the
/// completed list sorts by when things were finished.
pub fn set_workout_completed(
    conn: &Connection,
    workout_id: i64,
    completed: bool,
    timestamp: i64,
) -> Result<()> {
    let updated = conn
        .execute(
            "UPDATE workouts SET is_completed = ?1, updated_at = ?2 WHERE workout_id = ?3",
            params![completed, timestamp, workout_id],
        )
        .context("failed to update workout completion")?;

    if updated == 0 {
        Err(StoreError::NotFound("workout").into())
    } else {
        Ok(())
    }
}

/// Total workouts owned by a user.
pub fn count_workouts(conn: &Connection, user_id: i64) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM workouts WHERE user_id = ?1",
        params![user_id],
        |row| row.get(0),
    )
    .context("failed to count workouts")
}

/// Completed subset of the above.
pub fn count_completed_workouts(conn: &Connection, user_id: i64) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM workouts WHERE user_id = ?1 AND is_completed = 1",
        params![user_id],
        |row| row.get(0),
    )
    .context("failed to count completed workouts")
}

/// Bulk-clear the completion flag on every workout a user owns. Returns how
/// many rows flipped so the UI can report it.
pub fn reset_all_workouts(conn: &Connection, user_id: i64) -> Result<usize> {
    let reset = conn
        .execute(
            "UPDATE workouts SET is_completed = 0 WHERE user_id = ?1",
            params![user_id],
        )
        .context("failed to reset workouts")?;
    debug!("reset {reset} workouts for user {user_id}");
    Ok(reset)
}

/// Create a workout together with its exercise drafts in one transaction, so
/// a failed exercise insert cannot leave a half-built workout behind.
pub fn create_workout_with_exercises(
    conn: &mut Connection,
    user_id: i64,
    name: &str,
    description: Option<&str>,
    image_path: Option<&str>,
    drafts: &[ExerciseDraft],
) -> Result<Workout> {
    let tx = conn.transaction().context("failed to begin transaction")?;
    let workout = create_workout(&tx, user_id, name, description, image_path)?;
    for (position, draft) in drafts.iter().enumerate() {
        exercises::insert_draft(&tx, workout.id, draft, position as i64)?;
    }
    tx.commit().context("failed to commit workout creation")?;
    Ok(workout)
}

/// The edit-save path: update the workout row, drop exercises the user
/// removed, rewrite survivors, and insert new drafts, all inside one
/// transaction. `order_index` becomes the draft's position in the list.
/// Partial failure rolls the whole edit back.
pub fn replace_workout_exercises(
    conn: &mut Connection,
    workout: &Workout,
    drafts: &[ExerciseDraft],
) -> Result<()> {
    let tx = conn.transaction().context("failed to begin transaction")?;

    update_workout(&tx, workout)?;

    let kept: Vec<i64> = drafts.iter().filter_map(|d| d.id).collect();
    let existing = exercises::fetch_exercise_ids(&tx, workout.id)?;
    let removed: Vec<i64> = existing
        .into_iter()
        .filter(|id| !kept.contains(id))
        .collect();
    if !removed.is_empty() {
        exercises::delete_exercises(&tx, &removed)?;
    }

    for (position, draft) in drafts.iter().enumerate() {
        let order_index = position as i64;
        match draft.id {
            Some(exercise_id) => {
                exercises::update_draft(&tx, exercise_id, draft, order_index)?;
                equipment::delete_equipment_by_exercise(&tx, exercise_id)?;
                equipment::create_equipment_items(&tx, exercise_id, &draft.equipment)?;
            }
            None => {
                exercises::insert_draft(&tx, workout.id, draft, order_index)?;
            }
        }
    }

    tx.commit().context("failed to commit workout edit")
}

/// Hydrate every workout of a user together with its ordered exercises. The
/// join happens in memory over two queries per workout, which is fine at the
/// row counts a single user produces.
pub fn fetch_workout_overviews(conn: &Connection, user_id: i64) -> Result<Vec<WorkoutWithExercises>> {
    let workouts = fetch_workouts_by_user(conn, user_id)?;
    let mut overviews = Vec::with_capacity(workouts.len());
    for workout in workouts {
        let exercises = exercises::fetch_exercises_by_workout(conn, workout.id)?;
        overviews.push(WorkoutWithExercises { workout, exercises });
    }
    Ok(overviews)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::db::test_support::memory_db;
    use crate::db::{create_user, email_exists};

    fn seeded_user(conn: &Connection) -> i64 {
        create_user(conn, "Ada", "ada@example.com", "hash")
            .unwrap()
            .id
    }

    fn draft(name: &str) -> ExerciseDraft {
        ExerciseDraft {
            name: name.to_string(),
            sets: 3,
            reps: 10,
            ..ExerciseDraft::default()
        }
    }

    #[test]
    fn workouts_order_newest_first() {
        let conn = memory_db();
        let user_id = seeded_user(&conn);
        let first = create_workout(&conn, user_id, "First", None, None).unwrap();
        let second = create_workout(&conn, user_id, "Second", None, None).unwrap();

        let listed = fetch_workouts_by_user(&conn, user_id).unwrap();
        assert_eq!(
            listed.iter().map(|w| w.id).collect::<Vec<_>>(),
            vec![second.id, first.id]
        );
    }

    #[test]
    fn counts_track_completion() {
        let conn = memory_db();
        let user_id = seeded_user(&conn);
        let a = create_workout(&conn, user_id, "A", None, None).unwrap();
        create_workout(&conn, user_id, "B", None, None).unwrap();

        assert_eq!(count_workouts(&conn, user_id).unwrap(), 2);
        assert_eq!(count_completed_workouts(&conn, user_id).unwrap(), 0);

        set_workout_completed(&conn, a.id, true, now_millis()).unwrap();
        assert_eq!(count_completed_workouts(&conn, user_id).unwrap(), 1);
        assert_eq!(fetch_completed_workouts(&conn, user_id).unwrap().len(), 1);
        assert_eq!(fetch_incomplete_workouts(&conn, user_id).unwrap().len(), 1);

        assert_eq!(reset_all_workouts(&conn, user_id).unwrap(), 2);
        assert_eq!(count_completed_workouts(&conn, user_id).unwrap(), 0);
    }

    #[test]
    fn update_overwrites_existing_and_skips_missing() {
        let conn = memory_db();
        let user_id = seeded_user(&conn);
        let mut workout = create_workout(&conn, user_id, "Push", None, None).unwrap();

        workout.name = "Push Day".to_string();
        update_workout(&conn, &workout).unwrap();
        assert_eq!(
            fetch_workout_by_id(&conn, workout.id).unwrap().unwrap().name,
            "Push Day"
        );

        let mut ghost = workout.clone();
        ghost.id += 1;
        update_workout(&conn, &ghost).unwrap();
        assert!(fetch_workout_by_id(&conn, ghost.id).unwrap().is_none());
    }

    #[test]
    fn insert_rejects_missing_owner() {
        let conn = memory_db();
        let err = create_workout(&conn, 999, "Orphan", None, None).unwrap_err();
        assert!(err.to_string().contains("constraint"), "{err}");
    }

    #[test]
    fn end_to_end_create_browse_delete() {
        let mut conn = memory_db();
        let user_id = seeded_user(&conn);
        assert!(email_exists(&conn, "ada@example.com").unwrap());

        let workout = create_workout_with_exercises(
            &mut conn,
            user_id,
            "Leg Day",
            Some(""),
            None,
            &[draft("Squat"), draft("Lunge")],
        )
        .unwrap();

        let fetched = fetch_workout_by_id(&conn, workout.id).unwrap().unwrap();
        assert_eq!(fetched.name, "Leg Day");

        let exercises = exercises::fetch_exercises_by_workout(&conn, workout.id).unwrap();
        assert_eq!(exercises.len(), 2);
        assert_eq!(exercises[0].name, "Squat");
        assert_eq!(exercises[0].order_index, 0);
        assert_eq!(exercises[1].name, "Lunge");
        assert_eq!(exercises[1].order_index, 1);

        delete_workout(&conn, workout.id).unwrap();
        assert_eq!(exercises::count_exercises(&conn, workout.id).unwrap(), 0);
    }

    #[test]
    fn replace_rewrites_children_atomically() {
        let mut conn = memory_db();
        let user_id = seeded_user(&conn);
        let mut squat = draft("Squat");
        squat.equipment = vec!["Barbell".to_string()];
        let workout = create_workout_with_exercises(
            &mut conn,
            user_id,
            "Leg Day",
            None,
            None,
            &[squat, draft("Lunge")],
        )
        .unwrap();

        let persisted = exercises::fetch_exercises_by_workout(&conn, workout.id).unwrap();

        // Drop the lunge, keep the squat with new numbers, add a new one.
        let mut kept = ExerciseDraft::from_exercise(&persisted[0], &[]);
        kept.sets = 5;
        kept.equipment = vec!["Rack".to_string()];
        let mut edited = workout.clone();
        edited.name = "Heavy Leg Day".to_string();
        replace_workout_exercises(&mut conn, &edited, &[kept, draft("Leg Press")]).unwrap();

        let after = exercises::fetch_exercises_by_workout(&conn, workout.id).unwrap();
        assert_eq!(after.len(), 2);
        assert_eq!(after[0].name, "Squat");
        assert_eq!(after[0].sets, 5);
        assert_eq!(after[1].name, "Leg Press");
        assert_eq!(
            fetch_workout_by_id(&conn, workout.id).unwrap().unwrap().name,
            "Heavy Leg Day"
        );

        let names = equipment::fetch_unique_equipment_names(&conn, workout.id).unwrap();
        assert_eq!(names, vec!["Rack".to_string()]);
    }

    #[test]
    fn overviews_compose_exercises_in_memory() {
        let mut conn = memory_db();
        let user_id = seeded_user(&conn);
        create_workout_with_exercises(&mut conn, user_id, "Push", None, None, &[draft("Bench")])
            .unwrap();

        let overviews = fetch_workout_overviews(&conn, user_id).unwrap();
        assert_eq!(overviews.len(), 1);
        assert_eq!(overviews[0].exercise_count(), 1);
        assert_eq!(overviews[0].completion_percentage(), 0);
    }
}
