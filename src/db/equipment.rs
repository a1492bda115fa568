use anyhow::{Context, Result};
use rusqlite::{params, Connection, Row};

use super::{map_constraint, StoreError};
use crate::models::Equipment;

fn equipment_from_row(row: &Row<'_>) -> rusqlite::Result<Equipment> {
    Ok(Equipment {
        id: row.get(0)?,
        exercise_id: row.get(1)?,
        name: row.get(2)?,
    })
}

/// Insert one equipment row for an exercise.
pub fn create_equipment(conn: &Connection, exercise_id: i64, name: &str) -> Result<Equipment> {
    conn.execute(
        "INSERT INTO equipment (exercise_id, equipment_name) VALUES (?1, ?2)",
        params![exercise_id, name],
    )
    .map_err(|err| map_constraint(err, "equipment"))
    .context("failed to insert equipment")?;

    Ok(Equipment {
        id: conn.last_insert_rowid(),
        exercise_id,
        name: name.to_string(),
    })
}

/// Insert a batch of equipment names for one exercise, skipping blanks the
/// form may have produced.
pub fn create_equipment_items(
    conn: &Connection,
    exercise_id: i64,
    names: &[String],
) -> Result<Vec<Equipment>> {
    let mut created = Vec::with_capacity(names.len());
    for name in names {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            continue;
        }
        created.push(create_equipment(conn, exercise_id, trimmed)?);
    }
    Ok(created)
}

/// Full-row overwrite by primary key. A missing key updates nothing and is
/// not an error.
pub fn update_equipment(conn: &Connection, item: &Equipment) -> Result<()> {
    conn.execute(
        "UPDATE equipment SET exercise_id = ?1, equipment_name = ?2 WHERE equipment_id = ?3",
        params![item.exercise_id, item.name, item.id],
    )
    .map_err(|err| map_constraint(err, "equipment"))
    .context("failed to update equipment")?;
    Ok(())
}

/// Remove one equipment row.
pub fn delete_equipment(conn: &Connection, equipment_id: i64) -> Result<()> {
    let deleted = conn
        .execute(
            "DELETE FROM equipment WHERE equipment_id = ?1",
            params![equipment_id],
        )
        .context("failed to delete equipment")?;

    if deleted == 0 {
        Err(StoreError::NotFound("equipment").into())
    } else {
        Ok(())
    }
}

/// Everything one exercise requires, in insertion order.
pub fn fetch_equipment_by_exercise(conn: &Connection, exercise_id: i64) -> Result<Vec<Equipment>> {
    let mut stmt = conn
        .prepare(
            "SELECT equipment_id, exercise_id, equipment_name
             FROM equipment WHERE exercise_id = ?1
             ORDER BY equipment_id ASC",
        )
        .context("failed to prepare equipment query")?;

    let items = stmt
        .query_map(params![exercise_id], equipment_from_row)
        .context("failed to load equipment")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect equipment")?;
    Ok(items)
}

/// Distinct equipment rows across all exercises of a workout.
pub fn fetch_equipment_by_workout(conn: &Connection, workout_id: i64) -> Result<Vec<Equipment>> {
    let mut stmt = conn
        .prepare(
            "SELECT DISTINCT e.equipment_id, e.exercise_id, e.equipment_name
             FROM equipment e
             INNER JOIN exercises ex ON e.exercise_id = ex.exercise_id
             WHERE ex.workout_id = ?1
             ORDER BY e.equipment_name COLLATE NOCASE",
        )
        .context("failed to prepare workout equipment query")?;

    let items = stmt
        .query_map(params![workout_id], equipment_from_row)
        .context("failed to load workout equipment")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect workout equipment")?;
    Ok(items)
}

/// Unique equipment names for a workout's checklist and the share text. Two
/// exercises both needing a barbell yield one entry.
pub fn fetch_unique_equipment_names(conn: &Connection, workout_id: i64) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare(
            "SELECT DISTINCT e.equipment_name FROM equipment e
             INNER JOIN exercises ex ON e.exercise_id = ex.exercise_id
             WHERE ex.workout_id = ?1
             ORDER BY e.equipment_name ASC",
        )
        .context("failed to prepare equipment name query")?;

    let mut rows = stmt
        .query(params![workout_id])
        .context("failed to execute equipment name query")?;

    let mut names = Vec::new();
    while let Some(row) = rows.next().context("failed to fetch equipment name row")? {
        let name: String = row.get(0).context("failed to read equipment name")?;
        names.push(name);
    }
    Ok(names)
}

/// Remove every equipment row of one exercise; used by the edit transaction
/// before rewriting the list from the form.
pub fn delete_equipment_by_exercise(conn: &Connection, exercise_id: i64) -> Result<usize> {
    conn.execute(
        "DELETE FROM equipment WHERE exercise_id = ?1",
        params![exercise_id],
    )
    .context("failed to delete exercise equipment")
}

/// Distinct equipment names across every workout a user owns; shown as a
/// profile statistic.
pub fn count_distinct_equipment(conn: &Connection, user_id: i64) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(DISTINCT e.equipment_name) FROM equipment e
         INNER JOIN exercises ex ON e.exercise_id = ex.exercise_id
         INNER JOIN workouts w ON ex.workout_id = w.workout_id
         WHERE w.user_id = ?1",
        params![user_id],
        |row| row.get(0),
    )
    .context("failed to count distinct equipment")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::db::test_support::memory_db;
    use crate::db::{create_exercises, create_user, create_workout, delete_workout};
    use crate::models::ExerciseDraft;

    fn draft(name: &str, equipment: &[&str]) -> ExerciseDraft {
        ExerciseDraft {
            name: name.to_string(),
            sets: 3,
            reps: 10,
            equipment: equipment.iter().map(|s| s.to_string()).collect(),
            ..ExerciseDraft::default()
        }
    }

    #[test]
    fn unique_names_dedupe_across_exercises() {
        let conn = memory_db();
        let user = create_user(&conn, "Ada", "ada@example.com", "hash").unwrap();
        let workout = create_workout(&conn, user.id, "Pull", None, None).unwrap();
        create_exercises(
            &conn,
            workout.id,
            &[
                draft("Row", &["Barbell", "Bench"]),
                draft("Deadlift", &["Barbell"]),
            ],
        )
        .unwrap();

        let names = fetch_unique_equipment_names(&conn, workout.id).unwrap();
        assert_eq!(names, vec!["Barbell".to_string(), "Bench".to_string()]);
        assert_eq!(count_distinct_equipment(&conn, user.id).unwrap(), 2);
    }

    #[test]
    fn cascade_removes_equipment_with_workout() {
        let conn = memory_db();
        let user = create_user(&conn, "Ada", "ada@example.com", "hash").unwrap();
        let workout = create_workout(&conn, user.id, "Pull", None, None).unwrap();
        let created =
            create_exercises(&conn, workout.id, &[draft("Row", &["Barbell"])]).unwrap();
        assert_eq!(
            fetch_equipment_by_exercise(&conn, created[0].id).unwrap().len(),
            1
        );

        delete_workout(&conn, workout.id).unwrap();
        assert!(fetch_equipment_by_exercise(&conn, created[0].id)
            .unwrap()
            .is_empty());
        assert_eq!(count_distinct_equipment(&conn, user.id).unwrap(), 0);
    }

    #[test]
    fn blank_names_are_skipped_on_batch_insert() {
        let conn = memory_db();
        let user = create_user(&conn, "Ada", "ada@example.com", "hash").unwrap();
        let workout = create_workout(&conn, user.id, "Push", None, None).unwrap();
        let created = create_exercises(&conn, workout.id, &[draft("Bench", &[])]).unwrap();

        let items = create_equipment_items(
            &conn,
            created[0].id,
            &["  ".to_string(), "Bench".to_string()],
        )
        .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Bench");
    }

    #[test]
    fn update_overwrites_existing_and_skips_missing() {
        let conn = memory_db();
        let user = create_user(&conn, "Ada", "ada@example.com", "hash").unwrap();
        let workout = create_workout(&conn, user.id, "Pull", None, None).unwrap();
        let created = create_exercises(&conn, workout.id, &[draft("Row", &["Bar"])]).unwrap();

        let mut item = fetch_equipment_by_exercise(&conn, created[0].id)
            .unwrap()
            .remove(0);
        item.name = "Barbell".to_string();
        update_equipment(&conn, &item).unwrap();
        assert_eq!(
            fetch_equipment_by_exercise(&conn, created[0].id).unwrap()[0].name,
            "Barbell"
        );

        let mut ghost = item.clone();
        ghost.id += 1;
        update_equipment(&conn, &ghost).unwrap();
        assert_eq!(
            fetch_equipment_by_exercise(&conn, created[0].id)
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn insert_rejects_missing_exercise() {
        let conn = memory_db();
        let err = create_equipment(&conn, 999, "Barbell").unwrap_err();
        assert!(err.to_string().contains("constraint"), "{err}");
    }
}
