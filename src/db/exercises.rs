use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{equipment, map_constraint, StoreError};
use crate::models::{Exercise, ExerciseDraft};

fn exercise_from_row(row: &Row<'_>) -> rusqlite::Result<Exercise> {
    Ok(Exercise {
        id: row.get(0)?,
        workout_id: row.get(1)?,
        name: row.get(2)?,
        sets: row.get(3)?,
        reps: row.get(4)?,
        instructions: row.get(5)?,
        is_completed: row.get(6)?,
        order_index: row.get(7)?,
    })
}

const EXERCISE_COLUMNS: &str = "exercise_id, workout_id, exercise_name, sets, reps, \
                                instructions, is_completed, order_index";

/// Insert one exercise draft at an explicit position, together with its
/// equipment rows. Shared by the create and edit paths in `workouts`.
pub(crate) fn insert_draft(
    conn: &Connection,
    workout_id: i64,
    draft: &ExerciseDraft,
    order_index: i64,
) -> Result<Exercise> {
    conn.execute(
        "INSERT INTO exercises (workout_id, exercise_name, sets, reps, instructions,
                                is_completed, order_index)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            workout_id,
            draft.name,
            draft.sets,
            draft.reps,
            draft.instructions,
            draft.is_completed,
            order_index
        ],
    )
    .map_err(|err| map_constraint(err, "exercise"))
    .context("failed to insert exercise")?;

    let exercise_id = conn.last_insert_rowid();
    equipment::create_equipment_items(conn, exercise_id, &draft.equipment)?;

    Ok(Exercise {
        id: exercise_id,
        workout_id,
        name: draft.name.clone(),
        sets: draft.sets,
        reps: draft.reps,
        instructions: draft.instructions.clone(),
        is_completed: draft.is_completed,
        order_index,
    })
}

/// Rewrite an existing exercise row from a draft, moving it to the given
/// position. Equipment is handled by the caller so the edit transaction can
/// sequence deletes before inserts.
pub(crate) fn update_draft(
    conn: &Connection,
    exercise_id: i64,
    draft: &ExerciseDraft,
    order_index: i64,
) -> Result<()> {
    let updated = conn
        .execute(
            "UPDATE exercises SET exercise_name = ?1, sets = ?2, reps = ?3,
             instructions = ?4, is_completed = ?5, order_index = ?6
             WHERE exercise_id = ?7",
            params![
                draft.name,
                draft.sets,
                draft.reps,
                draft.instructions,
                draft.is_completed,
                order_index,
                exercise_id
            ],
        )
        .map_err(|err| map_constraint(err, "exercise"))
        .context("failed to update exercise")?;

    if updated == 0 {
        Err(StoreError::NotFound("exercise").into())
    } else {
        Ok(())
    }
}

/// Primary keys of a workout's exercises, used to diff the edit form's drafts
/// against what is persisted.
pub(crate) fn fetch_exercise_ids(conn: &Connection, workout_id: i64) -> Result<Vec<i64>> {
    let mut stmt = conn
        .prepare("SELECT exercise_id FROM exercises WHERE workout_id = ?1")
        .context("failed to prepare exercise id query")?;
    let ids = stmt
        .query_map(params![workout_id], |row| row.get(0))
        .context("failed to load exercise ids")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect exercise ids")?;
    Ok(ids)
}

/// Insert a single exercise appended after the workout's current maximum
/// order index.
pub fn create_exercise(conn: &Connection, workout_id: i64, draft: &ExerciseDraft) -> Result<Exercise> {
    let next_index: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(order_index) + 1, 0) FROM exercises WHERE workout_id = ?1",
            params![workout_id],
            |row| row.get(0),
        )
        .context("failed to compute next order index")?;
    insert_draft(conn, workout_id, draft, next_index)
}

/// Insert several drafts with order indexes taken from their positions.
pub fn create_exercises(
    conn: &Connection,
    workout_id: i64,
    drafts: &[ExerciseDraft],
) -> Result<Vec<Exercise>> {
    let mut created = Vec::with_capacity(drafts.len());
    for (position, draft) in drafts.iter().enumerate() {
        created.push(insert_draft(conn, workout_id, draft, position as i64)?);
    }
    Ok(created)
}

/// Full-row overwrite by primary key. A missing key updates nothing and is
/// not an error.
pub fn update_exercise(conn: &Connection, exercise: &Exercise) -> Result<()> {
    conn.execute(
        "UPDATE exercises SET exercise_name = ?1, sets = ?2, reps = ?3,
         instructions = ?4, is_completed = ?5, order_index = ?6
         WHERE exercise_id = ?7",
        params![
            exercise.name,
            exercise.sets,
            exercise.reps,
            exercise.instructions,
            exercise.is_completed,
            exercise.order_index,
            exercise.id
        ],
    )
    .map_err(|err| map_constraint(err, "exercise"))
    .context("failed to update exercise")?;
    Ok(())
}

/// Remove one exercise; its equipment rows cascade away.
pub fn delete_exercise(conn: &Connection, exercise_id: i64) -> Result<()> {
    let deleted = conn
        .execute(
            "DELETE FROM exercises WHERE exercise_id = ?1",
            params![exercise_id],
        )
        .context("failed to delete exercise")?;

    if deleted == 0 {
        Err(StoreError::NotFound("exercise").into())
    } else {
        Ok(())
    }
}

/// Remove a batch of exercises by primary key. Ids that no longer exist are
/// skipped silently, matching bulk-delete semantics elsewhere.
pub fn delete_exercises(conn: &Connection, exercise_ids: &[i64]) -> Result<usize> {
    let mut stmt = conn
        .prepare("DELETE FROM exercises WHERE exercise_id = ?1")
        .context("failed to prepare exercise delete")?;
    let mut deleted = 0;
    for id in exercise_ids {
        deleted += stmt
            .execute(params![id])
            .context("failed to delete exercise")?;
    }
    Ok(deleted)
}

/// Point lookup by primary key; `None` when no row matches.
pub fn fetch_exercise_by_id(conn: &Connection, exercise_id: i64) -> Result<Option<Exercise>> {
    conn.query_row(
        &format!("SELECT {EXERCISE_COLUMNS} FROM exercises WHERE exercise_id = ?1 LIMIT 1"),
        params![exercise_id],
        exercise_from_row,
    )
    .optional()
    .context("failed to look up exercise")
}

fn fetch_ordered(conn: &Connection, sql: &str, workout_id: i64) -> Result<Vec<Exercise>> {
    let mut stmt = conn
        .prepare(sql)
        .context("failed to prepare exercise query")?;
    let exercises = stmt
        .query_map(params![workout_id], exercise_from_row)
        .context("failed to load exercises")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect exercises")?;
    Ok(exercises)
}

/// A workout's exercises in display order. The primary-key tiebreak keeps
/// equal order indexes stable instead of platform-defined.
pub fn fetch_exercises_by_workout(conn: &Connection, workout_id: i64) -> Result<Vec<Exercise>> {
    fetch_ordered(
        conn,
        &format!(
            "SELECT {EXERCISE_COLUMNS} FROM exercises WHERE workout_id = ?1
             ORDER BY order_index ASC, exercise_id ASC"
        ),
        workout_id,
    )
}

/// Completed exercises only, same ordering as the full list.
pub fn fetch_completed_exercises(conn: &Connection, workout_id: i64) -> Result<Vec<Exercise>> {
    fetch_ordered(
        conn,
        &format!(
            "SELECT {EXERCISE_COLUMNS} FROM exercises
             WHERE workout_id = ?1 AND is_completed = 1
             ORDER BY order_index ASC, exercise_id ASC"
        ),
        workout_id,
    )
}

/// Toggle one exercise's completion flag. Workout-level completion is never
/// touched here; the flags stay independent.
pub fn set_exercise_completed(conn: &Connection, exercise_id: i64, completed: bool) -> Result<()> {
    let updated = conn
        .execute(
            "UPDATE exercises SET is_completed = ?1 WHERE exercise_id = ?2",
            params![completed, exercise_id],
        )
        .context("failed to update exercise completion")?;

    if updated == 0 {
        Err(StoreError::NotFound("exercise").into())
    } else {
        Ok(())
    }
}

/// Bulk-clear the completion flag on every exercise of a workout.
pub fn reset_exercises(conn: &Connection, workout_id: i64) -> Result<usize> {
    conn.execute(
        "UPDATE exercises SET is_completed = 0 WHERE workout_id = ?1",
        params![workout_id],
    )
    .context("failed to reset exercises")
}

/// Number of exercises in a workout.
pub fn count_exercises(conn: &Connection, workout_id: i64) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM exercises WHERE workout_id = ?1",
        params![workout_id],
        |row| row.get(0),
    )
    .context("failed to count exercises")
}

/// Remove every exercise of a workout in one statement.
pub fn delete_exercises_by_workout(conn: &Connection, workout_id: i64) -> Result<usize> {
    conn.execute(
        "DELETE FROM exercises WHERE workout_id = ?1",
        params![workout_id],
    )
    .context("failed to delete workout exercises")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::db::test_support::memory_db;
    use crate::db::{create_user, create_workout};

    fn seeded_workout(conn: &Connection) -> i64 {
        let user = create_user(conn, "Ada", "ada@example.com", "hash").unwrap();
        create_workout(conn, user.id, "Leg Day", None, None)
            .unwrap()
            .id
    }

    fn draft(name: &str) -> ExerciseDraft {
        ExerciseDraft {
            name: name.to_string(),
            sets: 3,
            reps: 12,
            ..ExerciseDraft::default()
        }
    }

    #[test]
    fn exercises_come_back_in_index_order() {
        let conn = memory_db();
        let workout_id = seeded_workout(&conn);
        create_exercises(&conn, workout_id, &[draft("Squat"), draft("Lunge"), draft("Calf")])
            .unwrap();

        let listed = fetch_exercises_by_workout(&conn, workout_id).unwrap();
        assert_eq!(
            listed.iter().map(|e| e.name.as_str()).collect::<Vec<_>>(),
            vec!["Squat", "Lunge", "Calf"]
        );
        assert_eq!(
            listed.iter().map(|e| e.order_index).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn order_index_ties_break_by_primary_key() {
        let conn = memory_db();
        let workout_id = seeded_workout(&conn);
        let first = insert_draft(&conn, workout_id, &draft("First"), 0).unwrap();
        let second = insert_draft(&conn, workout_id, &draft("Second"), 0).unwrap();

        let listed = fetch_exercises_by_workout(&conn, workout_id).unwrap();
        assert_eq!(
            listed.iter().map(|e| e.id).collect::<Vec<_>>(),
            vec![first.id, second.id]
        );
    }

    #[test]
    fn append_continues_after_max_index() {
        let conn = memory_db();
        let workout_id = seeded_workout(&conn);
        create_exercises(&conn, workout_id, &[draft("A"), draft("B")]).unwrap();
        let appended = create_exercise(&conn, workout_id, &draft("C")).unwrap();
        assert_eq!(appended.order_index, 2);
    }

    #[test]
    fn completion_toggle_and_reset() {
        let conn = memory_db();
        let workout_id = seeded_workout(&conn);
        let created = create_exercises(&conn, workout_id, &[draft("A"), draft("B")]).unwrap();

        set_exercise_completed(&conn, created[0].id, true).unwrap();
        assert_eq!(fetch_completed_exercises(&conn, workout_id).unwrap().len(), 1);

        assert_eq!(reset_exercises(&conn, workout_id).unwrap(), 2);
        assert!(fetch_completed_exercises(&conn, workout_id)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn update_overwrites_existing_and_skips_missing() {
        let conn = memory_db();
        let workout_id = seeded_workout(&conn);
        let mut exercise = create_exercise(&conn, workout_id, &draft("Squat")).unwrap();

        exercise.sets = 5;
        update_exercise(&conn, &exercise).unwrap();
        assert_eq!(
            fetch_exercise_by_id(&conn, exercise.id).unwrap().unwrap().sets,
            5
        );

        let mut ghost = exercise.clone();
        ghost.id += 1;
        update_exercise(&conn, &ghost).unwrap();
        assert!(fetch_exercise_by_id(&conn, ghost.id).unwrap().is_none());
    }

    #[test]
    fn insert_rejects_missing_workout() {
        let conn = memory_db();
        let err = insert_draft(&conn, 999, &draft("Orphan"), 0).unwrap_err();
        assert!(err.to_string().contains("constraint"), "{err}");
    }

    #[test]
    fn missing_exercise_reads_as_none() {
        let conn = memory_db();
        assert!(fetch_exercise_by_id(&conn, 7).unwrap().is_none());
        assert_eq!(count_exercises(&conn, 7).unwrap(), 0);
    }
}
