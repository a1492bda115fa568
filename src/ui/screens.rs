use anyhow::Result;

use crate::db;
use crate::models::{ExerciseDraft, ExerciseWithEquipment, Workout, WorkoutWithExercises};
use crate::tasks::DbWorker;

use super::forms::{LoginForm, RegisterForm, WorkoutForm};

/// Which of the two auth forms is showing.
#[derive(Copy, Clone, PartialEq, Eq)]
pub(crate) enum AuthMode {
    Login,
    Register,
}

/// State for the combined login/register screen.
pub(crate) struct AuthScreen {
    pub(crate) mode: AuthMode,
    pub(crate) login: LoginForm,
    pub(crate) register: RegisterForm,
}

impl AuthScreen {
    pub(crate) fn new() -> Self {
        Self {
            mode: AuthMode::Login,
            login: LoginForm::default(),
            register: RegisterForm::default(),
        }
    }

    /// Swap between login and registration, dropping any stale inline error.
    pub(crate) fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            AuthMode::Login => AuthMode::Register,
            AuthMode::Register => AuthMode::Login,
        };
        self.login.error = None;
        self.register.error = None;
    }
}

/// The workout list with in-memory progress views.
pub(crate) struct HomeScreen {
    pub(crate) workouts: Vec<WorkoutWithExercises>,
    pub(crate) selected: usize,
}

impl HomeScreen {
    pub(crate) fn load(worker: &DbWorker, user_id: i64) -> Result<Self> {
        let workouts = worker.call(move |conn| db::fetch_workout_overviews(conn, user_id))?;
        Ok(Self {
            workouts,
            selected: 0,
        })
    }

    /// Re-fetch after a mutation, keeping the selection clamped in bounds.
    pub(crate) fn reload(&mut self, worker: &DbWorker, user_id: i64) -> Result<()> {
        self.workouts = worker.call(move |conn| db::fetch_workout_overviews(conn, user_id))?;
        self.ensure_in_bounds();
        Ok(())
    }

    pub(crate) fn current_workout(&self) -> Option<&WorkoutWithExercises> {
        self.workouts.get(self.selected)
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        if self.workouts.is_empty() {
            return;
        }
        let len = self.workouts.len() as isize;
        let new = (self.selected as isize + offset).clamp(0, len - 1);
        self.selected = new as usize;
    }

    pub(crate) fn ensure_in_bounds(&mut self) {
        if self.workouts.is_empty() {
            self.selected = 0;
        } else if self.selected >= self.workouts.len() {
            self.selected = self.workouts.len() - 1;
        }
    }
}

/// One workout opened for progress tracking: ordered exercises with their
/// equipment, plus the unique-equipment checklist.
pub(crate) struct DetailScreen {
    pub(crate) workout: Workout,
    pub(crate) exercises: Vec<ExerciseWithEquipment>,
    pub(crate) checklist: Vec<String>,
    pub(crate) selected: usize,
}

impl DetailScreen {
    /// Load everything the detail view needs in one worker round trip.
    /// Returns `None` when the workout disappeared under us.
    pub(crate) fn load(worker: &DbWorker, workout_id: i64) -> Result<Option<Self>> {
        let loaded = worker.call(move |conn| {
            let Some(workout) = db::fetch_workout_by_id(conn, workout_id)? else {
                return Ok(None);
            };
            let mut exercises = Vec::new();
            for exercise in db::fetch_exercises_by_workout(conn, workout_id)? {
                let equipment = db::fetch_equipment_by_exercise(conn, exercise.id)?;
                exercises.push(ExerciseWithEquipment {
                    exercise,
                    equipment,
                });
            }
            let checklist = db::fetch_unique_equipment_names(conn, workout_id)?;
            Ok(Some((workout, exercises, checklist)))
        })?;

        Ok(loaded.map(|(workout, exercises, checklist)| Self {
            workout,
            exercises,
            checklist,
            selected: 0,
        }))
    }

    pub(crate) fn reload(&mut self, worker: &DbWorker) -> Result<bool> {
        match Self::load(worker, self.workout.id)? {
            Some(mut fresh) => {
                fresh.selected = self.selected.min(fresh.exercises.len().saturating_sub(1));
                *self = fresh;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        if self.exercises.is_empty() {
            return;
        }
        let len = self.exercises.len() as isize;
        let new = (self.selected as isize + offset).clamp(0, len - 1);
        self.selected = new as usize;
    }

    /// Progress view over the loaded exercises, for the header line and the
    /// "everything done" hint.
    pub(crate) fn progress(&self) -> WorkoutWithExercises {
        WorkoutWithExercises {
            workout: self.workout.clone(),
            exercises: self
                .exercises
                .iter()
                .map(|e| e.exercise.clone())
                .collect(),
        }
    }
}

/// Which half of the editor has keyboard focus.
#[derive(Copy, Clone, PartialEq, Eq)]
pub(crate) enum EditorFocus {
    Form,
    Drafts,
}

/// Create/edit screen state: the workout header form plus the ordered draft
/// list. Nothing is persisted until the user saves; `order_index` becomes the
/// draft's position at that moment.
pub(crate) struct EditorScreen {
    /// `Some` when editing an existing workout, `None` when creating.
    pub(crate) workout: Option<Workout>,
    pub(crate) form: WorkoutForm,
    pub(crate) drafts: Vec<ExerciseDraft>,
    pub(crate) selected: usize,
    pub(crate) focus: EditorFocus,
}

impl EditorScreen {
    pub(crate) fn new_workout() -> Self {
        Self {
            workout: None,
            form: WorkoutForm::default(),
            drafts: Vec::new(),
            selected: 0,
            focus: EditorFocus::Form,
        }
    }

    /// Hydrate the editor from a persisted workout and its children.
    pub(crate) fn edit_workout(worker: &DbWorker, workout: Workout) -> Result<Self> {
        let workout_id = workout.id;
        let drafts = worker.call(move |conn| {
            let mut drafts = Vec::new();
            for exercise in db::fetch_exercises_by_workout(conn, workout_id)? {
                let equipment = db::fetch_equipment_by_exercise(conn, exercise.id)?;
                drafts.push(ExerciseDraft::from_exercise(&exercise, &equipment));
            }
            Ok(drafts)
        })?;

        Ok(Self {
            form: WorkoutForm::from_workout(&workout),
            workout: Some(workout),
            drafts,
            selected: 0,
            focus: EditorFocus::Form,
        })
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        if self.drafts.is_empty() {
            return;
        }
        let len = self.drafts.len() as isize;
        let new = (self.selected as isize + offset).clamp(0, len - 1);
        self.selected = new as usize;
    }

    /// Swap the selected draft with its neighbor, reordering the list.
    pub(crate) fn move_draft(&mut self, offset: isize) -> bool {
        if self.drafts.is_empty() {
            return false;
        }
        let target = self.selected as isize + offset;
        if target < 0 || target >= self.drafts.len() as isize {
            return false;
        }
        self.drafts.swap(self.selected, target as usize);
        self.selected = target as usize;
        true
    }

    pub(crate) fn remove_selected(&mut self) -> Option<ExerciseDraft> {
        if self.drafts.is_empty() {
            return None;
        }
        let removed = self.drafts.remove(self.selected);
        if self.selected >= self.drafts.len() && self.selected > 0 {
            self.selected -= 1;
        }
        Some(removed)
    }
}

/// Profile statistics for the logged-in user.
pub(crate) struct ProfileScreen {
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) total_workouts: i64,
    pub(crate) completed_workouts: i64,
    pub(crate) equipment_count: i64,
}

impl ProfileScreen {
    pub(crate) fn load(
        worker: &DbWorker,
        user_id: i64,
        name: String,
        email: String,
    ) -> Result<Self> {
        let (total_workouts, completed_workouts, equipment_count) = worker.call(move |conn| {
            Ok((
                db::count_workouts(conn, user_id)?,
                db::count_completed_workouts(conn, user_id)?,
                db::count_distinct_equipment(conn, user_id)?,
            ))
        })?;

        Ok(Self {
            name,
            email,
            total_workouts,
            completed_workouts,
            equipment_count,
        })
    }
}
