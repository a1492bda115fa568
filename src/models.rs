//! Domain models that mirror the SQLite schema and get passed throughout the
//! TUI. The intent is that these types stay light-weight data holders so other
//! layers can focus on presentation and persistence logic. The two `*With*`
//! types at the bottom compose a parent with its already-fetched children in
//! memory rather than via SQL joins.

use std::fmt;

#[derive(Debug, Clone)]
/// A registered account. Exactly one user is logged in at a time, tracked by
/// the session record on disk.
pub struct User {
    /// Primary key from the database.
    pub id: i64,
    /// Display name shown in the header and on the profile screen.
    pub full_name: String,
    /// Login identifier. Uniqueness is enforced by an application-level
    /// existence check at registration, not by a database constraint.
    pub email: String,
    /// SHA-256 hex digest of the password.
    pub password_hash: String,
    /// Epoch milliseconds at registration.
    pub created_at: i64,
    /// Epoch milliseconds of the most recent successful login.
    pub last_login: i64,
}

#[derive(Debug, Clone)]
/// A workout owned by a single user. Deleting it cascades to its exercises
/// and, transitively, their equipment.
pub struct Workout {
    /// Primary key from the database.
    pub id: i64,
    /// Owning user.
    pub user_id: i64,
    /// Name shown in lists; at most 100 characters by validation.
    pub name: String,
    /// Optional free-text description, at most 500 characters by validation.
    pub description: Option<String>,
    /// Optional path to a cover image on disk. Carried through the store but
    /// never decoded here.
    pub image_path: Option<String>,
    /// Epoch milliseconds at creation.
    pub created_at: i64,
    /// Epoch milliseconds of the last edit or completion toggle.
    pub updated_at: i64,
    /// Whether the user marked the whole workout done. Independent of the
    /// per-exercise flags.
    pub is_completed: bool,
}

impl fmt::Display for Workout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, Clone)]
/// An exercise within a workout. `order_index` preserves the user-defined
/// ordering among siblings.
pub struct Exercise {
    /// Primary key from the database.
    pub id: i64,
    /// Owning workout.
    pub workout_id: i64,
    /// Name shown in the detail list.
    pub name: String,
    /// Target set count, 1..=100 by validation.
    pub sets: i64,
    /// Target rep count, 1..=100 by validation.
    pub reps: i64,
    /// Optional free-text instructions.
    pub instructions: Option<String>,
    /// Per-exercise completion flag.
    pub is_completed: bool,
    /// Display position among siblings. Ties are allowed and break by primary
    /// key so the order stays stable.
    pub order_index: i64,
}

impl Exercise {
    /// Compact `3x12` style summary used by list rows and the share text.
    pub fn sets_reps(&self) -> String {
        format!("{}x{}", self.sets, self.reps)
    }
}

#[derive(Debug, Clone)]
/// A piece of equipment required by one exercise.
pub struct Equipment {
    /// Primary key from the database.
    pub id: i64,
    /// Owning exercise.
    pub exercise_id: i64,
    /// Equipment name; aggregated as distinct names for checklists.
    pub name: String,
}

#[derive(Debug, Clone, Default)]
/// Editable exercise data held by the workout editor before anything is
/// persisted. `order_index` is assigned from the list position at save time,
/// so the draft does not carry one.
pub struct ExerciseDraft {
    /// Primary key when editing an existing row, `None` for new drafts.
    pub id: Option<i64>,
    pub name: String,
    pub sets: i64,
    pub reps: i64,
    pub instructions: Option<String>,
    /// Preserved across edits so saving a workout does not clear progress.
    pub is_completed: bool,
    /// Equipment names attached to this exercise.
    pub equipment: Vec<String>,
}

impl ExerciseDraft {
    /// Build a draft from a persisted exercise and its equipment rows.
    pub fn from_exercise(exercise: &Exercise, equipment: &[Equipment]) -> Self {
        Self {
            id: Some(exercise.id),
            name: exercise.name.clone(),
            sets: exercise.sets,
            reps: exercise.reps,
            instructions: exercise.instructions.clone(),
            is_completed: exercise.is_completed,
            equipment: equipment.iter().map(|e| e.name.clone()).collect(),
        }
    }
}

/// An exercise joined in memory with its equipment rows.
#[derive(Debug, Clone)]
pub struct ExerciseWithEquipment {
    pub exercise: Exercise,
    pub equipment: Vec<Equipment>,
}

impl ExerciseWithEquipment {
    /// Comma-joined equipment names, or a fixed placeholder when the exercise
    /// needs nothing.
    pub fn equipment_names(&self) -> String {
        if self.equipment.is_empty() {
            return "No equipment needed".to_string();
        }
        self.equipment
            .iter()
            .map(|e| e.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn equipment_count(&self) -> usize {
        self.equipment.len()
    }

    pub fn requires_equipment(&self) -> bool {
        !self.equipment.is_empty()
    }
}

/// A workout joined in memory with its (ordered) exercises.
#[derive(Debug, Clone)]
pub struct WorkoutWithExercises {
    pub workout: Workout,
    pub exercises: Vec<Exercise>,
}

impl WorkoutWithExercises {
    pub fn exercise_count(&self) -> usize {
        self.exercises.len()
    }

    pub fn completed_exercise_count(&self) -> usize {
        self.exercises.iter().filter(|e| e.is_completed).count()
    }

    /// True only when the workout has at least one exercise and every one of
    /// them is completed. An empty list is not "fully completed".
    pub fn is_fully_completed(&self) -> bool {
        !self.exercises.is_empty() && self.exercises.iter().all(|e| e.is_completed)
    }

    /// Completion percentage truncated toward zero, 0 when there are no
    /// exercises. One of three completed yields 33, not 34.
    pub fn completion_percentage(&self) -> u8 {
        if self.exercises.is_empty() {
            return 0;
        }
        let completed = self.completed_exercise_count();
        (completed * 100 / self.exercises.len()) as u8
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn exercise(id: i64, completed: bool) -> Exercise {
        Exercise {
            id,
            workout_id: 1,
            name: format!("Exercise {id}"),
            sets: 3,
            reps: 10,
            instructions: None,
            is_completed: completed,
            order_index: id,
        }
    }

    fn workout_with(completions: &[bool]) -> WorkoutWithExercises {
        WorkoutWithExercises {
            workout: Workout {
                id: 1,
                user_id: 1,
                name: "Leg Day".to_string(),
                description: None,
                image_path: None,
                created_at: 0,
                updated_at: 0,
                is_completed: false,
            },
            exercises: completions
                .iter()
                .enumerate()
                .map(|(i, done)| exercise(i as i64, *done))
                .collect(),
        }
    }

    #[test]
    fn empty_workout_is_not_fully_completed() {
        let view = workout_with(&[]);
        assert!(!view.is_fully_completed());
        assert_eq!(view.completion_percentage(), 0);
    }

    #[rstest]
    #[case(&[true, false, false], 33)]
    #[case(&[true, true, false], 66)]
    #[case(&[true, true, true], 100)]
    #[case(&[false, false], 0)]
    fn completion_percentage_truncates(#[case] flags: &[bool], #[case] expected: u8) {
        assert_eq!(workout_with(flags).completion_percentage(), expected);
    }

    #[test]
    fn fully_completed_requires_every_exercise() {
        assert!(workout_with(&[true, true]).is_fully_completed());
        assert!(!workout_with(&[true, false]).is_fully_completed());
    }

    #[test]
    fn equipment_names_join_with_placeholder() {
        let base = exercise(1, false);
        let none = ExerciseWithEquipment {
            exercise: base.clone(),
            equipment: Vec::new(),
        };
        assert_eq!(none.equipment_names(), "No equipment needed");
        assert!(!none.requires_equipment());

        let some = ExerciseWithEquipment {
            exercise: base,
            equipment: vec![
                Equipment {
                    id: 1,
                    exercise_id: 1,
                    name: "Barbell".to_string(),
                },
                Equipment {
                    id: 2,
                    exercise_id: 1,
                    name: "Rack".to_string(),
                },
            ],
        };
        assert_eq!(some.equipment_names(), "Barbell, Rack");
        assert_eq!(some.equipment_count(), 2);
        assert!(some.requires_equipment());
    }
}
