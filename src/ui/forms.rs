use anyhow::{anyhow, Result};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::models::{ExerciseDraft, Workout};
use crate::validation;

fn field_line(field_name: &str, value: &str, is_active: bool, masked: bool) -> Line<'static> {
    let display = if value.is_empty() {
        "<required>".to_string()
    } else if masked {
        "*".repeat(value.chars().count())
    } else {
        value.to_string()
    };

    let style = if is_active {
        Style::default().fg(Color::Yellow)
    } else if value.is_empty() {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    };

    Line::from(vec![
        Span::raw(format!("{field_name}: ")),
        Span::styled(display, style),
    ])
}

/// Fields of the login form, in focus order.
#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub(crate) enum LoginField {
    #[default]
    Email,
    Password,
}

/// Form state for the login screen.
#[derive(Default, Clone)]
pub(crate) struct LoginForm {
    pub(crate) email: String,
    pub(crate) password: String,
    pub(crate) active: LoginField,
    pub(crate) error: Option<String>,
}

impl LoginForm {
    pub(crate) fn toggle_field(&mut self) {
        self.active = match self.active {
            LoginField::Email => LoginField::Password,
            LoginField::Password => LoginField::Email,
        };
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        match self.active {
            LoginField::Email => self.email.push(ch),
            LoginField::Password => self.password.push(ch),
        }
        true
    }

    pub(crate) fn backspace(&mut self) {
        match self.active {
            LoginField::Email => {
                self.email.pop();
            }
            LoginField::Password => {
                self.password.pop();
            }
        }
    }

    /// Validate the inputs and return the trimmed email plus password.
    pub(crate) fn parse_inputs(&self) -> Result<(String, String)> {
        let email = self.email.trim();
        if !validation::is_valid_email(email) {
            return Err(anyhow!("A valid email address is required."));
        }
        if self.password.is_empty() {
            return Err(anyhow!("Password is required."));
        }
        Ok((email.to_string(), self.password.clone()))
    }

    pub(crate) fn build_line(&self, field_name: &str, field: LoginField) -> Line<'static> {
        let (value, masked) = match field {
            LoginField::Email => (&self.email, false),
            LoginField::Password => (&self.password, true),
        };
        field_line(field_name, value, self.active == field, masked)
    }

    pub(crate) fn value_len(&self, field: LoginField) -> usize {
        match field {
            LoginField::Email => self.email.chars().count(),
            LoginField::Password => self.password.chars().count(),
        }
    }
}

/// Fields of the registration form, in focus order.
#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub(crate) enum RegisterField {
    #[default]
    Name,
    Email,
    Password,
    Confirm,
}

/// Form state for the registration screen.
#[derive(Default, Clone)]
pub(crate) struct RegisterForm {
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) password: String,
    pub(crate) confirm: String,
    pub(crate) active: RegisterField,
    pub(crate) error: Option<String>,
}

impl RegisterForm {
    pub(crate) fn toggle_field(&mut self) {
        self.active = match self.active {
            RegisterField::Name => RegisterField::Email,
            RegisterField::Email => RegisterField::Password,
            RegisterField::Password => RegisterField::Confirm,
            RegisterField::Confirm => RegisterField::Name,
        };
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        match self.active {
            RegisterField::Name => self.name.push(ch),
            RegisterField::Email => self.email.push(ch),
            RegisterField::Password => self.password.push(ch),
            RegisterField::Confirm => self.confirm.push(ch),
        }
        true
    }

    pub(crate) fn backspace(&mut self) {
        match self.active {
            RegisterField::Name => {
                self.name.pop();
            }
            RegisterField::Email => {
                self.email.pop();
            }
            RegisterField::Password => {
                self.password.pop();
            }
            RegisterField::Confirm => {
                self.confirm.pop();
            }
        }
    }

    /// Validate every field and return (name, email, password) ready for the
    /// registration flow.
    pub(crate) fn parse_inputs(&self) -> Result<(String, String, String)> {
        let name = self.name.trim();
        if !validation::is_valid_name(name) {
            return Err(anyhow!("Name must be between 2 and 50 characters."));
        }
        let email = self.email.trim();
        if !validation::is_valid_email(email) {
            return Err(anyhow!("A valid email address is required."));
        }
        if !validation::is_valid_password(&self.password) {
            return Err(anyhow!(
                "Password must be at least {} characters.",
                validation::MIN_PASSWORD_LENGTH
            ));
        }
        if !validation::passwords_match(&self.password, &self.confirm) {
            return Err(anyhow!("Passwords do not match."));
        }
        Ok((name.to_string(), email.to_string(), self.password.clone()))
    }

    pub(crate) fn build_line(&self, field_name: &str, field: RegisterField) -> Line<'static> {
        let (value, masked) = match field {
            RegisterField::Name => (&self.name, false),
            RegisterField::Email => (&self.email, false),
            RegisterField::Password => (&self.password, true),
            RegisterField::Confirm => (&self.confirm, true),
        };
        field_line(field_name, value, self.active == field, masked)
    }

    pub(crate) fn value_len(&self, field: RegisterField) -> usize {
        match field {
            RegisterField::Name => self.name.chars().count(),
            RegisterField::Email => self.email.chars().count(),
            RegisterField::Password => self.password.chars().count(),
            RegisterField::Confirm => self.confirm.chars().count(),
        }
    }
}

/// Fields of the workout header form.
#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub(crate) enum WorkoutField {
    #[default]
    Name,
    Description,
}

/// Form state for the workout name and description within the editor.
#[derive(Default, Clone)]
pub(crate) struct WorkoutForm {
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) active: WorkoutField,
    pub(crate) error: Option<String>,
}

impl WorkoutForm {
    /// Populate the form from an existing workout when editing.
    pub(crate) fn from_workout(workout: &Workout) -> Self {
        Self {
            name: workout.name.clone(),
            description: workout.description.clone().unwrap_or_default(),
            active: WorkoutField::Name,
            error: None,
        }
    }

    pub(crate) fn toggle_field(&mut self) {
        self.active = match self.active {
            WorkoutField::Name => WorkoutField::Description,
            WorkoutField::Description => WorkoutField::Name,
        };
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        match self.active {
            WorkoutField::Name => self.name.push(ch),
            WorkoutField::Description => self.description.push(ch),
        }
        true
    }

    pub(crate) fn backspace(&mut self) {
        match self.active {
            WorkoutField::Name => {
                self.name.pop();
            }
            WorkoutField::Description => {
                self.description.pop();
            }
        }
    }

    /// Validate and return the trimmed name plus the optional description.
    pub(crate) fn parse_inputs(&self) -> Result<(String, Option<String>)> {
        if !validation::is_valid_workout_name(&self.name) {
            return Err(anyhow!(
                "Workout name is required and may not exceed {} characters.",
                validation::MAX_WORKOUT_NAME_LENGTH
            ));
        }
        let description = self.description.trim();
        if !validation::is_valid_description(Some(description)) {
            return Err(anyhow!(
                "Description may not exceed {} characters.",
                validation::MAX_DESCRIPTION_LENGTH
            ));
        }
        let description = if description.is_empty() {
            None
        } else {
            Some(description.to_string())
        };
        Ok((self.name.trim().to_string(), description))
    }

    pub(crate) fn build_line(&self, field_name: &str, field: WorkoutField) -> Line<'static> {
        let value = match field {
            WorkoutField::Name => &self.name,
            WorkoutField::Description => &self.description,
        };
        field_line(field_name, value, self.active == field, false)
    }
}

/// Fields of the exercise form, in focus order.
#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub(crate) enum ExerciseField {
    #[default]
    Name,
    Sets,
    Reps,
    Instructions,
    Equipment,
}

const EXERCISE_FIELDS: [ExerciseField; 5] = [
    ExerciseField::Name,
    ExerciseField::Sets,
    ExerciseField::Reps,
    ExerciseField::Instructions,
    ExerciseField::Equipment,
];

/// Form state for adding or editing one exercise draft. Equipment is entered
/// as a comma-separated list of names.
#[derive(Default, Clone)]
pub(crate) struct ExerciseForm {
    pub(crate) name: String,
    pub(crate) sets: String,
    pub(crate) reps: String,
    pub(crate) instructions: String,
    pub(crate) equipment: String,
    pub(crate) active: ExerciseField,
    pub(crate) error: Option<String>,
}

impl ExerciseForm {
    /// Populate the form from an existing draft when editing.
    pub(crate) fn from_draft(draft: &ExerciseDraft) -> Self {
        Self {
            name: draft.name.clone(),
            sets: draft.sets.to_string(),
            reps: draft.reps.to_string(),
            instructions: draft.instructions.clone().unwrap_or_default(),
            equipment: draft.equipment.join(", "),
            active: ExerciseField::Name,
            error: None,
        }
    }

    pub(crate) fn toggle_field(&mut self) {
        let position = EXERCISE_FIELDS
            .iter()
            .position(|f| *f == self.active)
            .unwrap_or(0);
        self.active = EXERCISE_FIELDS[(position + 1) % EXERCISE_FIELDS.len()];
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        match self.active {
            ExerciseField::Sets | ExerciseField::Reps => {
                if !ch.is_ascii_digit() {
                    return false;
                }
            }
            _ => {
                if ch.is_control() {
                    return false;
                }
            }
        }
        match self.active {
            ExerciseField::Name => self.name.push(ch),
            ExerciseField::Sets => self.sets.push(ch),
            ExerciseField::Reps => self.reps.push(ch),
            ExerciseField::Instructions => self.instructions.push(ch),
            ExerciseField::Equipment => self.equipment.push(ch),
        }
        true
    }

    pub(crate) fn backspace(&mut self) {
        match self.active {
            ExerciseField::Name => {
                self.name.pop();
            }
            ExerciseField::Sets => {
                self.sets.pop();
            }
            ExerciseField::Reps => {
                self.reps.pop();
            }
            ExerciseField::Instructions => {
                self.instructions.pop();
            }
            ExerciseField::Equipment => {
                self.equipment.pop();
            }
        }
    }

    /// Validate and return the typed pieces of a draft. The caller merges
    /// them into a new or existing [`ExerciseDraft`] so the id and completion
    /// flag survive edits.
    pub(crate) fn parse_inputs(&self) -> Result<(String, i64, i64, Option<String>, Vec<String>)> {
        let name = self.name.trim();
        if !validation::is_valid_exercise_name(name) {
            return Err(anyhow!("Exercise name is required."));
        }
        let sets = validation::parse_sets_or_reps(&self.sets)
            .ok_or_else(|| anyhow!("Sets must be between 1 and {}.", validation::MAX_SETS_REPS))?;
        let reps = validation::parse_sets_or_reps(&self.reps)
            .ok_or_else(|| anyhow!("Reps must be between 1 and {}.", validation::MAX_SETS_REPS))?;
        let instructions = self.instructions.trim();
        let instructions = if instructions.is_empty() {
            None
        } else {
            Some(instructions.to_string())
        };
        let equipment = self
            .equipment
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();
        Ok((name.to_string(), sets, reps, instructions, equipment))
    }

    pub(crate) fn build_line(&self, field_name: &str, field: ExerciseField) -> Line<'static> {
        let value = match field {
            ExerciseField::Name => &self.name,
            ExerciseField::Sets => &self.sets,
            ExerciseField::Reps => &self.reps,
            ExerciseField::Instructions => &self.instructions,
            ExerciseField::Equipment => &self.equipment,
        };
        // Instructions and equipment are optional; show them plain when empty.
        let optional = matches!(
            field,
            ExerciseField::Instructions | ExerciseField::Equipment
        );
        if optional && value.is_empty() {
            let style = if self.active == field {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            return Line::from(vec![
                Span::raw(format!("{field_name}: ")),
                Span::styled("<optional>".to_string(), style),
            ]);
        }
        field_line(field_name, value, self.active == field, false)
    }
}

/// Confirmation state for deleting a workout and everything under it.
#[derive(Clone)]
pub(crate) struct ConfirmWorkoutDelete {
    pub(crate) id: i64,
    pub(crate) name: String,
}

impl ConfirmWorkoutDelete {
    pub(crate) fn from(workout: &Workout) -> Self {
        Self {
            id: workout.id,
            name: workout.name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::models::ExerciseDraft;

    #[test]
    fn login_form_requires_valid_email() {
        let mut form = LoginForm::default();
        form.email = "nope".to_string();
        form.password = "secret".to_string();
        assert!(form.parse_inputs().is_err());

        form.email = "ada@example.com".to_string();
        let (email, password) = form.parse_inputs().unwrap();
        assert_eq!(email, "ada@example.com");
        assert_eq!(password, "secret");
    }

    #[test]
    fn register_form_checks_password_confirmation() {
        let mut form = RegisterForm::default();
        form.name = "Ada".to_string();
        form.email = "ada@example.com".to_string();
        form.password = "secret1".to_string();
        form.confirm = "secret2".to_string();
        assert!(form.parse_inputs().is_err());

        form.confirm = "secret1".to_string();
        assert!(form.parse_inputs().is_ok());
    }

    #[test]
    fn workout_form_trims_and_drops_empty_description() {
        let mut form = WorkoutForm::default();
        form.name = "  Leg Day  ".to_string();
        form.description = "   ".to_string();
        let (name, description) = form.parse_inputs().unwrap();
        assert_eq!(name, "Leg Day");
        assert!(description.is_none());
    }

    #[test]
    fn exercise_form_parses_equipment_list() {
        let mut form = ExerciseForm::default();
        form.name = "Squat".to_string();
        form.sets = "5".to_string();
        form.reps = "5".to_string();
        form.equipment = "Barbell, Rack, ,".to_string();
        let (name, sets, reps, instructions, equipment) = form.parse_inputs().unwrap();
        assert_eq!(name, "Squat");
        assert_eq!((sets, reps), (5, 5));
        assert!(instructions.is_none());
        assert_eq!(equipment, vec!["Barbell".to_string(), "Rack".to_string()]);
    }

    #[test]
    fn exercise_form_rejects_out_of_range_sets() {
        let mut form = ExerciseForm::from_draft(&ExerciseDraft {
            name: "Squat".to_string(),
            sets: 3,
            reps: 10,
            ..ExerciseDraft::default()
        });
        form.sets = "101".to_string();
        assert!(form.parse_inputs().is_err());
    }

    #[test]
    fn sets_field_accepts_digits_only() {
        let mut form = ExerciseForm::default();
        form.active = ExerciseField::Sets;
        assert!(!form.push_char('x'));
        assert!(form.push_char('7'));
        assert_eq!(form.sets, "7");
    }
}
