use std::mem;

use anyhow::Result;
use crossterm::event::KeyCode;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;

use crate::auth;
use crate::db;
use crate::models::ExerciseDraft;
use crate::session::SessionStore;
use crate::share;
use crate::tasks::DbWorker;

use super::forms::{
    ConfirmWorkoutDelete, ExerciseField, ExerciseForm, LoginField, RegisterField, WorkoutField,
};
use super::helpers::{centered_rect, progress_summary, surface_error};
use super::screens::{
    AuthMode, AuthScreen, DetailScreen, EditorFocus, EditorScreen, HomeScreen, ProfileScreen,
};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;

/// High-level navigation states. Keeping this explicit makes it easy to reason
/// about which rendering path runs and what keyboard shortcuts should do.
enum Screen {
    Auth(AuthScreen),
    Home(HomeScreen),
    Detail(DetailScreen),
    Editor(EditorScreen),
    Profile(ProfileScreen),
}

/// Fine-grained modes scoped to the current screen.
enum Mode {
    Normal,
    /// The exercise popup inside the editor. `index` is `Some` when editing an
    /// existing draft, `None` when adding.
    EditingExercise {
        index: Option<usize>,
        form: ExerciseForm,
    },
    ConfirmDeleteWorkout(ConfirmWorkoutDelete),
    ConfirmResetAll,
    ConfirmResetExercises {
        workout_id: i64,
    },
    SharePreview(String),
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// What an auth form submission resolved to after validation.
enum AuthAction {
    Login {
        email: String,
        password: String,
    },
    Register {
        name: String,
        email: String,
        password: String,
    },
}

/// Central application state shared across the TUI. All database access goes
/// through the injected worker; the session store tracks who is logged in.
pub struct App {
    worker: DbWorker,
    session: SessionStore,
    screen: Screen,
    mode: Mode,
    status: Option<StatusMessage>,
    /// Bumped on every screen change so completions submitted by a previous
    /// screen are discarded instead of mutating the new one.
    generation: u64,
}

impl App {
    /// Restore the previous session if one exists and its user still does,
    /// otherwise start at the auth screen.
    pub fn new(worker: DbWorker, session: SessionStore) -> Result<Self> {
        let mut app = Self {
            worker,
            session,
            screen: Screen::Auth(AuthScreen::new()),
            mode: Mode::Normal,
            status: None,
            generation: 0,
        };

        if app.session.is_logged_in() {
            let user_id = app.session.user_id();
            match app
                .worker
                .call(move |conn| db::fetch_user_by_id(conn, user_id))?
            {
                Some(user) => {
                    app.open_home()?;
                    app.set_status(
                        format!("Welcome back, {}.", user.full_name),
                        StatusKind::Info,
                    );
                }
                None => {
                    // The account behind the session is gone; force a login.
                    app.session.clear()?;
                }
            }
        }

        Ok(app)
    }

    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mut mode = mem::replace(&mut self.mode, Mode::Normal);

        mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit)?,
            Mode::EditingExercise { index, form } => {
                self.handle_edit_exercise(code, index, form)?
            }
            Mode::ConfirmDeleteWorkout(confirm) => {
                self.handle_confirm_delete_workout(code, confirm)?
            }
            Mode::ConfirmResetAll => self.handle_confirm_reset_all(code)?,
            Mode::ConfirmResetExercises { workout_id } => {
                self.handle_confirm_reset_exercises(code, workout_id)?
            }
            Mode::SharePreview(message) => match code {
                KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => Mode::Normal,
                _ => Mode::SharePreview(message),
            },
        };

        self.mode = mode;
        Ok(exit)
    }

    /// Drain finished background submissions, surfacing their outcome in the
    /// footer and re-fetching the current screen's data. Completions from a
    /// screen that is no longer showing are dropped.
    pub(crate) fn pump_completions(&mut self) -> Result<()> {
        while let Some(completion) = self.worker.poll_completion() {
            if completion.generation != self.generation {
                continue;
            }
            match completion.result {
                Ok(()) => {
                    self.set_status(format!("{}.", completion.label), StatusKind::Info);
                }
                Err(err) => {
                    self.set_status(surface_error(&err), StatusKind::Error);
                }
            }
            self.refresh_screen()?;
        }
        Ok(())
    }

    /// Ctrl+S from the terminal loop: save the editor if it is open.
    pub(crate) fn handle_ctrl_s(&mut self) -> Result<()> {
        if matches!(self.screen, Screen::Editor(_)) && matches!(self.mode, Mode::Normal) {
            self.save_editor()?;
        }
        Ok(())
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        match self.screen {
            Screen::Auth(_) => self.handle_auth_key(code, exit),
            Screen::Home(_) => self.handle_home_key(code, exit),
            Screen::Detail(_) => self.handle_detail_key(code, exit),
            Screen::Editor(_) => self.handle_editor_key(code),
            Screen::Profile(_) => self.handle_profile_key(code, exit),
        }
    }

    fn handle_auth_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        let mut submit = false;
        {
            let Screen::Auth(auth) = &mut self.screen else {
                return Ok(Mode::Normal);
            };
            match code {
                KeyCode::Esc => *exit = true,
                KeyCode::BackTab => auth.toggle_mode(),
                KeyCode::Tab => match auth.mode {
                    AuthMode::Login => auth.login.toggle_field(),
                    AuthMode::Register => auth.register.toggle_field(),
                },
                KeyCode::Backspace => match auth.mode {
                    AuthMode::Login => auth.login.backspace(),
                    AuthMode::Register => auth.register.backspace(),
                },
                KeyCode::Enter => submit = true,
                KeyCode::Char(ch) => match auth.mode {
                    AuthMode::Login => {
                        if auth.login.push_char(ch) {
                            auth.login.error = None;
                        }
                    }
                    AuthMode::Register => {
                        if auth.register.push_char(ch) {
                            auth.register.error = None;
                        }
                    }
                },
                _ => {}
            }
        }

        if submit {
            self.submit_auth()?;
        }
        Ok(Mode::Normal)
    }

    fn submit_auth(&mut self) -> Result<()> {
        let mut action = None;
        let mut form_error = None;
        {
            let Screen::Auth(auth) = &mut self.screen else {
                return Ok(());
            };
            let parsed = match auth.mode {
                AuthMode::Login => auth
                    .login
                    .parse_inputs()
                    .map(|(email, password)| AuthAction::Login { email, password }),
                AuthMode::Register => {
                    auth.register
                        .parse_inputs()
                        .map(|(name, email, password)| AuthAction::Register {
                            name,
                            email,
                            password,
                        })
                }
            };
            match parsed {
                Ok(parsed) => action = Some(parsed),
                Err(err) => {
                    let message = surface_error(&err);
                    match auth.mode {
                        AuthMode::Login => auth.login.error = Some(message.clone()),
                        AuthMode::Register => auth.register.error = Some(message.clone()),
                    }
                    form_error = Some(message);
                }
            }
        }

        if let Some(message) = form_error {
            self.set_status(message, StatusKind::Error);
            return Ok(());
        }

        match action {
            Some(AuthAction::Login { email, password }) => self.log_in(email, password),
            Some(AuthAction::Register {
                name,
                email,
                password,
            }) => self.register(name, email, password),
            None => Ok(()),
        }
    }

    fn log_in(&mut self, email: String, password: String) -> Result<()> {
        let lookup = email.clone();
        let user = self
            .worker
            .call(move |conn| db::fetch_user_by_email(conn, &lookup))?;

        let Some(user) = user else {
            self.auth_error("Invalid email or password.");
            return Ok(());
        };
        if !auth::verify_password(&password, &user.password_hash) {
            self.auth_error("Invalid email or password.");
            return Ok(());
        }

        let user_id = user.id;
        self.worker
            .call(move |conn| db::update_last_login(conn, user_id, db::now_millis()))?;
        self.session.save(user.id, &user.full_name, &user.email)?;
        self.open_home()?;
        self.set_status(
            format!("Welcome back, {}.", user.full_name),
            StatusKind::Info,
        );
        Ok(())
    }

    fn register(&mut self, name: String, email: String, password: String) -> Result<()> {
        let lookup = email.clone();
        if self
            .worker
            .call(move |conn| db::email_exists(conn, &lookup))?
        {
            self.auth_error("An account with this email already exists.");
            return Ok(());
        }

        let password_hash = auth::hash_password(&password);
        let user = self
            .worker
            .call(move |conn| db::create_user(conn, &name, &email, &password_hash))?;
        self.session.save(user.id, &user.full_name, &user.email)?;
        self.open_home()?;
        self.set_status(
            format!("Account created. Welcome, {}.", user.full_name),
            StatusKind::Info,
        );
        Ok(())
    }

    /// Attach an error to whichever auth form is showing and echo it in the
    /// footer.
    fn auth_error(&mut self, message: &str) {
        if let Screen::Auth(auth) = &mut self.screen {
            match auth.mode {
                AuthMode::Login => auth.login.error = Some(message.to_string()),
                AuthMode::Register => auth.register.error = Some(message.to_string()),
            }
        }
        self.set_status(message, StatusKind::Error);
    }

    fn handle_home_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        let mut open_detail = None;
        let mut edit_workout = None;
        let mut new_workout = false;
        let mut open_profile = false;
        let mut log_out = false;
        let mut toggle = None;
        let mut no_selection: Option<&'static str> = None;

        {
            let Screen::Home(home) = &mut self.screen else {
                return Ok(Mode::Normal);
            };
            match code {
                KeyCode::Char('q') | KeyCode::Esc => *exit = true,
                KeyCode::Up => home.move_selection(-1),
                KeyCode::Down => home.move_selection(1),
                KeyCode::PageUp => home.move_selection(-5),
                KeyCode::PageDown => home.move_selection(5),
                KeyCode::Enter => match home.current_workout() {
                    Some(view) => open_detail = Some(view.workout.id),
                    None => no_selection = Some("No workout selected."),
                },
                KeyCode::Char('+') | KeyCode::Char('n') => new_workout = true,
                KeyCode::Char('e') | KeyCode::Char('E') => match home.current_workout() {
                    Some(view) => edit_workout = Some(view.workout.clone()),
                    None => no_selection = Some("No workout selected to edit."),
                },
                KeyCode::Char('-') | KeyCode::Char('d') => match home.current_workout() {
                    Some(view) => {
                        let confirm = ConfirmWorkoutDelete::from(&view.workout);
                        return Ok(Mode::ConfirmDeleteWorkout(confirm));
                    }
                    None => no_selection = Some("No workout selected to delete."),
                },
                KeyCode::Char(' ') | KeyCode::Char('c') => {
                    match home.workouts.get_mut(home.selected) {
                        Some(view) => {
                            let completed = !view.workout.is_completed;
                            view.workout.is_completed = completed;
                            toggle = Some((view.workout.id, completed));
                        }
                        None => no_selection = Some("No workout selected."),
                    }
                }
                KeyCode::Char('r') | KeyCode::Char('R') => {
                    return Ok(Mode::ConfirmResetAll);
                }
                KeyCode::Char('p') | KeyCode::Char('P') => open_profile = true,
                KeyCode::Char('l') | KeyCode::Char('L') => log_out = true,
                _ => {}
            }
        }

        if let Some(message) = no_selection {
            self.set_status(message, StatusKind::Error);
        } else if let Some(workout_id) = open_detail {
            self.clear_status();
            self.open_detail(workout_id)?;
        } else if new_workout {
            self.clear_status();
            self.open_editor(EditorScreen::new_workout());
        } else if let Some(workout) = edit_workout {
            self.clear_status();
            let editor = EditorScreen::edit_workout(&self.worker, workout)?;
            self.open_editor(editor);
        } else if let Some((workout_id, completed)) = toggle {
            let label = if completed {
                "Workout marked complete"
            } else {
                "Workout marked incomplete"
            };
            self.worker.submit(label, self.generation, move |conn| {
                db::set_workout_completed(conn, workout_id, completed, db::now_millis())
            })?;
        } else if open_profile {
            self.clear_status();
            self.open_profile()?;
        } else if log_out {
            self.log_out()?;
        }

        Ok(Mode::Normal)
    }

    fn handle_detail_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        let mut back_home = false;
        let mut edit_workout = None;
        let mut toggle = None;
        let mut share_message = None;
        let mut reset_workout = None;
        let mut no_selection = false;

        {
            let Screen::Detail(detail) = &mut self.screen else {
                return Ok(Mode::Normal);
            };
            match code {
                KeyCode::Char('q') => *exit = true,
                KeyCode::Esc => back_home = true,
                KeyCode::Up => detail.move_selection(-1),
                KeyCode::Down => detail.move_selection(1),
                KeyCode::PageUp => detail.move_selection(-5),
                KeyCode::PageDown => detail.move_selection(5),
                KeyCode::Char(' ') | KeyCode::Char('c') | KeyCode::Enter => {
                    match detail.exercises.get_mut(detail.selected) {
                        Some(entry) => {
                            let completed = !entry.exercise.is_completed;
                            entry.exercise.is_completed = completed;
                            toggle = Some((entry.exercise.id, completed));
                        }
                        None => no_selection = true,
                    }
                }
                KeyCode::Char('r') | KeyCode::Char('R') => {
                    reset_workout = Some(detail.workout.id);
                }
                KeyCode::Char('s') | KeyCode::Char('S') => {
                    let exercises: Vec<_> =
                        detail.exercises.iter().map(|e| e.exercise.clone()).collect();
                    share_message = Some(share::format_workout_message(
                        &detail.workout,
                        &exercises,
                        &detail.checklist,
                    ));
                }
                KeyCode::Char('e') | KeyCode::Char('E') => {
                    edit_workout = Some(detail.workout.clone());
                }
                _ => {}
            }
        }

        if no_selection {
            self.set_status("No exercise selected.", StatusKind::Error);
        } else if back_home {
            self.clear_status();
            self.open_home()?;
        } else if let Some(workout) = edit_workout {
            self.clear_status();
            let editor = EditorScreen::edit_workout(&self.worker, workout)?;
            self.open_editor(editor);
        } else if let Some((exercise_id, completed)) = toggle {
            let label = if completed {
                "Exercise marked complete"
            } else {
                "Exercise marked incomplete"
            };
            self.worker.submit(label, self.generation, move |conn| {
                db::set_exercise_completed(conn, exercise_id, completed)
            })?;
        } else if let Some(message) = share_message {
            return Ok(Mode::SharePreview(message));
        } else if let Some(workout_id) = reset_workout {
            return Ok(Mode::ConfirmResetExercises { workout_id });
        }

        Ok(Mode::Normal)
    }

    fn handle_editor_key(&mut self, code: KeyCode) -> Result<Mode> {
        let mut cancel = false;
        let mut save = false;
        let mut removed = false;
        let mut open_form: Option<(Option<usize>, ExerciseForm)> = None;

        {
            let Screen::Editor(editor) = &mut self.screen else {
                return Ok(Mode::Normal);
            };
            match editor.focus {
                EditorFocus::Form => match code {
                    KeyCode::Esc => cancel = true,
                    KeyCode::Tab | KeyCode::BackTab => editor.form.toggle_field(),
                    KeyCode::Backspace => editor.form.backspace(),
                    KeyCode::Down => editor.focus = EditorFocus::Drafts,
                    KeyCode::Enter => save = true,
                    KeyCode::Char(ch) => {
                        if editor.form.push_char(ch) {
                            editor.form.error = None;
                        }
                    }
                    _ => {}
                },
                EditorFocus::Drafts => match code {
                    KeyCode::Esc => cancel = true,
                    KeyCode::Tab | KeyCode::BackTab => editor.focus = EditorFocus::Form,
                    KeyCode::Up => {
                        if editor.selected == 0 {
                            editor.focus = EditorFocus::Form;
                        } else {
                            editor.move_selection(-1);
                        }
                    }
                    KeyCode::Down => editor.move_selection(1),
                    KeyCode::Char('+') => {
                        open_form = Some((None, ExerciseForm::default()));
                    }
                    KeyCode::Enter | KeyCode::Char('e') => {
                        if let Some(draft) = editor.drafts.get(editor.selected) {
                            open_form =
                                Some((Some(editor.selected), ExerciseForm::from_draft(draft)));
                        }
                    }
                    KeyCode::Char('-') | KeyCode::Char('d') => {
                        removed = editor.remove_selected().is_some();
                    }
                    KeyCode::Char('<') | KeyCode::Char(',') => {
                        editor.move_draft(-1);
                    }
                    KeyCode::Char('>') | KeyCode::Char('.') => {
                        editor.move_draft(1);
                    }
                    _ => {}
                },
            }
        }

        if cancel {
            self.open_home()?;
            self.set_status("Edit cancelled.", StatusKind::Info);
        } else if save {
            self.save_editor()?;
        } else if removed {
            self.set_status("Exercise removed from the list.", StatusKind::Info);
        } else if let Some((index, form)) = open_form {
            self.clear_status();
            return Ok(Mode::EditingExercise { index, form });
        }

        Ok(Mode::Normal)
    }

    fn handle_profile_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        match code {
            KeyCode::Char('q') => *exit = true,
            KeyCode::Esc => {
                self.clear_status();
                self.open_home()?;
            }
            KeyCode::Char('l') | KeyCode::Char('L') => self.log_out()?,
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_edit_exercise(
        &mut self,
        code: KeyCode,
        index: Option<usize>,
        mut form: ExerciseForm,
    ) -> Result<Mode> {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                self.set_status("Exercise edit cancelled.", StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Tab | KeyCode::BackTab => form.toggle_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match form.parse_inputs() {
                Ok((name, sets, reps, instructions, equipment)) => {
                    let mut message = "Exercise added.";
                    if let Screen::Editor(editor) = &mut self.screen {
                        match index {
                            Some(position) => {
                                // Merge over the existing draft so the id and
                                // completion flag survive the edit.
                                if let Some(draft) = editor.drafts.get_mut(position) {
                                    draft.name = name;
                                    draft.sets = sets;
                                    draft.reps = reps;
                                    draft.instructions = instructions;
                                    draft.equipment = equipment;
                                    message = "Exercise updated.";
                                }
                            }
                            None => {
                                editor.drafts.push(ExerciseDraft {
                                    id: None,
                                    name,
                                    sets,
                                    reps,
                                    instructions,
                                    is_completed: false,
                                    equipment,
                                });
                                editor.selected = editor.drafts.len() - 1;
                                editor.focus = EditorFocus::Drafts;
                            }
                        }
                    }
                    self.set_status(message, StatusKind::Info);
                    keep_open = false;
                }
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        if keep_open {
            Ok(Mode::EditingExercise { index, form })
        } else {
            Ok(Mode::Normal)
        }
    }

    fn handle_confirm_delete_workout(
        &mut self,
        code: KeyCode,
        confirm: ConfirmWorkoutDelete,
    ) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                let workout_id = confirm.id;
                match self
                    .worker
                    .call(move |conn| db::delete_workout(conn, workout_id))
                {
                    Ok(()) => {
                        self.refresh_screen()?;
                        self.set_status(
                            format!("Deleted '{}'.", confirm.name),
                            StatusKind::Info,
                        );
                        Ok(Mode::Normal)
                    }
                    Err(err) => {
                        let message = surface_error(&err);
                        self.set_status(message, StatusKind::Error);
                        Ok(Mode::ConfirmDeleteWorkout(confirm))
                    }
                }
            }
            _ => Ok(Mode::ConfirmDeleteWorkout(confirm)),
        }
    }

    fn handle_confirm_reset_all(&mut self, code: KeyCode) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Reset cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                let user_id = self.session.user_id();
                self.worker
                    .submit("All workouts reset", self.generation, move |conn| {
                        db::reset_all_workouts(conn, user_id).map(|_| ())
                    })?;
                Ok(Mode::Normal)
            }
            _ => Ok(Mode::ConfirmResetAll),
        }
    }

    fn handle_confirm_reset_exercises(&mut self, code: KeyCode, workout_id: i64) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Reset cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                self.worker
                    .submit("Exercise progress reset", self.generation, move |conn| {
                        db::reset_exercises(conn, workout_id).map(|_| ())
                    })?;
                Ok(Mode::Normal)
            }
            _ => Ok(Mode::ConfirmResetExercises { workout_id }),
        }
    }

    /// Persist the editor's workout and drafts. Returns whether the save
    /// succeeded and the editor closed.
    fn save_editor(&mut self) -> Result<bool> {
        let mut form_error = None;
        let mut to_save = None;
        {
            let Screen::Editor(editor) = &mut self.screen else {
                return Ok(false);
            };
            match editor.form.parse_inputs() {
                Ok((name, description)) => {
                    to_save = Some((
                        name,
                        description,
                        editor.drafts.clone(),
                        editor.workout.clone(),
                    ));
                }
                Err(err) => {
                    let message = surface_error(&err);
                    editor.form.error = Some(message.clone());
                    form_error = Some(message);
                }
            }
        }

        if let Some(message) = form_error {
            self.set_status(message, StatusKind::Error);
            return Ok(false);
        }
        let Some((name, description, drafts, existing)) = to_save else {
            return Ok(false);
        };

        let result = match existing {
            Some(workout) => {
                let mut updated = workout;
                updated.name = name;
                updated.description = description;
                self.worker
                    .call(move |conn| db::replace_workout_exercises(conn, &updated, &drafts))
            }
            None => {
                let user_id = self.session.user_id();
                self.worker.call(move |conn| {
                    db::create_workout_with_exercises(
                        conn,
                        user_id,
                        &name,
                        description.as_deref(),
                        None,
                        &drafts,
                    )
                    .map(|_| ())
                })
            }
        };

        match result {
            Ok(()) => {
                self.open_home()?;
                self.set_status("Workout saved.", StatusKind::Info);
                Ok(true)
            }
            Err(err) => {
                let message = surface_error(&err);
                if let Screen::Editor(editor) = &mut self.screen {
                    editor.form.error = Some(message.clone());
                }
                self.set_status(message, StatusKind::Error);
                Ok(false)
            }
        }
    }

    fn open_home(&mut self) -> Result<()> {
        let user_id = self.session.user_id();
        self.screen = Screen::Home(HomeScreen::load(&self.worker, user_id)?);
        self.generation += 1;
        Ok(())
    }

    fn open_detail(&mut self, workout_id: i64) -> Result<()> {
        match DetailScreen::load(&self.worker, workout_id)? {
            Some(detail) => {
                self.screen = Screen::Detail(detail);
                self.generation += 1;
            }
            None => {
                self.set_status("Workout no longer exists.", StatusKind::Error);
                self.open_home()?;
            }
        }
        Ok(())
    }

    fn open_editor(&mut self, editor: EditorScreen) {
        self.screen = Screen::Editor(editor);
        self.generation += 1;
    }

    fn open_profile(&mut self) -> Result<()> {
        let session = self.session.session().clone();
        self.screen = Screen::Profile(ProfileScreen::load(
            &self.worker,
            session.user_id,
            session.user_name,
            session.user_email,
        )?);
        self.generation += 1;
        Ok(())
    }

    fn log_out(&mut self) -> Result<()> {
        self.session.clear()?;
        self.screen = Screen::Auth(AuthScreen::new());
        self.generation += 1;
        self.set_status("Logged out.", StatusKind::Info);
        Ok(())
    }

    /// Re-fetch whatever the current screen shows from the store.
    fn refresh_screen(&mut self) -> Result<()> {
        let user_id = self.session.user_id();
        let mut workout_gone = false;
        let mut reload_profile = false;

        match &mut self.screen {
            Screen::Home(home) => home.reload(&self.worker, user_id)?,
            Screen::Detail(detail) => workout_gone = !detail.reload(&self.worker)?,
            Screen::Profile(_) => reload_profile = true,
            Screen::Auth(_) | Screen::Editor(_) => {}
        }

        if workout_gone {
            self.open_home()?;
            self.set_status("Workout no longer exists.", StatusKind::Error);
        } else if reload_profile {
            self.open_profile()?;
        }
        Ok(())
    }

    fn set_status(&mut self, text: impl Into<String>, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let footer_height = FOOTER_HEIGHT.min(area.height);

        let (content_area, footer_area) = if area.height > footer_height {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(footer_height)])
                .split(area);
            (chunks[0], chunks[1])
        } else {
            (area, area)
        };

        match &self.screen {
            Screen::Auth(auth) => self.draw_auth(frame, content_area, auth),
            Screen::Home(home) => self.draw_home(frame, content_area, home),
            Screen::Detail(detail) => self.draw_detail(frame, content_area, detail),
            Screen::Editor(editor) => self.draw_editor(frame, content_area, editor),
            Screen::Profile(profile) => self.draw_profile(frame, content_area, profile),
        }

        if area.height >= footer_height {
            self.draw_footer(frame, footer_area);
        }

        match &self.mode {
            Mode::EditingExercise { index, form } => {
                let title = if index.is_some() {
                    "Edit Exercise"
                } else {
                    "Add Exercise"
                };
                self.draw_exercise_form(frame, area, title, form);
            }
            Mode::ConfirmDeleteWorkout(confirm) => {
                self.draw_confirm(
                    frame,
                    area,
                    "Delete Workout",
                    &[
                        format!("Delete '{}' permanently?", confirm.name),
                        "This also removes its exercises and equipment.".to_string(),
                    ],
                );
            }
            Mode::ConfirmResetAll => {
                self.draw_confirm(
                    frame,
                    area,
                    "Reset All Workouts",
                    &["Mark every workout as not completed?".to_string()],
                );
            }
            Mode::ConfirmResetExercises { .. } => {
                self.draw_confirm(
                    frame,
                    area,
                    "Reset Exercises",
                    &["Clear the completion flag on every exercise here?".to_string()],
                );
            }
            Mode::SharePreview(message) => self.draw_share_preview(frame, area, message),
            Mode::Normal => {}
        }
    }

    fn draw_auth(&self, frame: &mut Frame, area: Rect, auth: &AuthScreen) {
        let popup_area = centered_rect(60, 70, area);
        let block = Block::default().title("Workout Log").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let (login_style, register_style) = match auth.mode {
            AuthMode::Login => (
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
                Style::default().fg(Color::DarkGray),
            ),
            AuthMode::Register => (
                Style::default().fg(Color::DarkGray),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
        };
        let tabs = Line::from(vec![
            Span::styled("Log In", login_style),
            Span::raw("   "),
            Span::styled("Register", register_style),
            Span::raw("   (Shift+Tab to switch)"),
        ]);

        let mut lines = vec![tabs, Line::from("")];
        let error = match auth.mode {
            AuthMode::Login => {
                lines.push(auth.login.build_line("Email", LoginField::Email));
                lines.push(auth.login.build_line("Password", LoginField::Password));
                &auth.login.error
            }
            AuthMode::Register => {
                lines.push(auth.register.build_line("Name", RegisterField::Name));
                lines.push(auth.register.build_line("Email", RegisterField::Email));
                lines.push(auth.register.build_line("Password", RegisterField::Password));
                lines.push(auth.register.build_line("Confirm", RegisterField::Confirm));
                &auth.register.error
            }
        };

        lines.push(Line::from(""));
        if let Some(error) = error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to submit, Tab next field, Esc to quit",
                Style::default().fg(Color::Gray),
            )));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        // Fields start two rows below the tab line.
        let (prefix, field_row, value_len) = match auth.mode {
            AuthMode::Login => match auth.login.active {
                LoginField::Email => ("Email: ", 0, auth.login.value_len(LoginField::Email)),
                LoginField::Password => {
                    ("Password: ", 1, auth.login.value_len(LoginField::Password))
                }
            },
            AuthMode::Register => match auth.register.active {
                RegisterField::Name => ("Name: ", 0, auth.register.value_len(RegisterField::Name)),
                RegisterField::Email => {
                    ("Email: ", 1, auth.register.value_len(RegisterField::Email))
                }
                RegisterField::Password => (
                    "Password: ",
                    2,
                    auth.register.value_len(RegisterField::Password),
                ),
                RegisterField::Confirm => (
                    "Confirm: ",
                    3,
                    auth.register.value_len(RegisterField::Confirm),
                ),
            },
        };
        let cursor_x = inner.x + prefix.len() as u16 + value_len as u16;
        let cursor_y = inner.y + 2 + field_row;
        frame.set_cursor_position((cursor_x, cursor_y));
    }

    fn draw_home(&self, frame: &mut Frame, area: Rect, home: &HomeScreen) {
        let title = format!("Workouts ({})", home.workouts.len());
        let block = Block::default().borders(Borders::ALL).title(title);

        if home.workouts.is_empty() {
            let message = Paragraph::new("No workouts yet. Press '+' to create one.")
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(message, area);
            return;
        }

        let items: Vec<ListItem> = home
            .workouts
            .iter()
            .map(|view| {
                let marker = if view.workout.is_completed {
                    "[x]"
                } else {
                    "[ ]"
                };
                let mut lines = vec![Line::from(vec![
                    Span::raw(format!("{marker} ")),
                    Span::styled(
                        view.workout.name.clone(),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                ])];
                let mut summary = format!("    {}", progress_summary(view));
                if let Some(description) = &view.workout.description {
                    summary.push_str("  ");
                    summary.push_str(description);
                }
                lines.push(Line::from(Span::styled(
                    summary,
                    Style::default().fg(Color::DarkGray),
                )));
                ListItem::new(lines)
            })
            .collect();

        let mut state = ListState::default();
        state.select(Some(home.selected));
        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().fg(Color::Yellow));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_detail(&self, frame: &mut Frame, area: Rect, detail: &DetailScreen) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Length(3),
                Constraint::Min(1),
            ])
            .split(area);

        let progress = detail.progress();
        let mut header_lines = vec![Line::from(Span::styled(
            detail.workout.name.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ))];
        if let Some(description) = &detail.workout.description {
            header_lines.push(Line::from(description.clone()));
        }
        let mut progress_line = progress_summary(&progress);
        if progress.is_fully_completed() {
            progress_line.push_str("  All done!");
        }
        header_lines.push(Line::from(Span::styled(
            progress_line,
            Style::default().fg(Color::Green),
        )));
        let header = Paragraph::new(header_lines)
            .block(Block::default().borders(Borders::ALL).title("Workout"));
        frame.render_widget(header, chunks[0]);

        let checklist = if detail.checklist.is_empty() {
            "No equipment needed".to_string()
        } else {
            detail.checklist.join(", ")
        };
        let equipment = Paragraph::new(checklist)
            .block(Block::default().borders(Borders::ALL).title("Equipment"));
        frame.render_widget(equipment, chunks[1]);

        if detail.exercises.is_empty() {
            let message = Paragraph::new("No exercises yet. Press 'e' to edit this workout.")
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).title("Exercises"));
            frame.render_widget(message, chunks[2]);
            return;
        }

        let items: Vec<ListItem> = detail
            .exercises
            .iter()
            .enumerate()
            .map(|(position, entry)| {
                let marker = if entry.exercise.is_completed {
                    "[x]"
                } else {
                    "[ ]"
                };
                let mut lines = vec![Line::from(vec![
                    Span::raw(format!("{marker} {}. ", position + 1)),
                    Span::styled(
                        entry.exercise.name.clone(),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(format!("  {}", entry.exercise.sets_reps())),
                ])];
                let mut secondary = format!("    {}", entry.equipment_names());
                if let Some(instructions) = &entry.exercise.instructions {
                    secondary.push_str("  ");
                    secondary.push_str(instructions);
                }
                lines.push(Line::from(Span::styled(
                    secondary,
                    Style::default().fg(Color::DarkGray),
                )));
                ListItem::new(lines)
            })
            .collect();

        let mut state = ListState::default();
        state.select(Some(detail.selected));
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title("Exercises"))
            .highlight_style(Style::default().fg(Color::Yellow));
        frame.render_stateful_widget(list, chunks[2], &mut state);
    }

    fn draw_editor(&self, frame: &mut Frame, area: Rect, editor: &EditorScreen) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(6), Constraint::Min(1)])
            .split(area);

        let title = if editor.workout.is_some() {
            "Edit Workout"
        } else {
            "New Workout"
        };
        let mut form_block = Block::default().borders(Borders::ALL).title(title);
        if editor.focus == EditorFocus::Form {
            form_block = form_block.border_style(Style::default().fg(Color::Yellow));
        }
        frame.render_widget(form_block.clone(), chunks[0]);
        let form_inner = form_block.inner(chunks[0]);

        let mut form_lines = vec![
            editor.form.build_line("Name", WorkoutField::Name),
            editor.form.build_line("Description", WorkoutField::Description),
            Line::from(""),
        ];
        if let Some(error) = &editor.form.error {
            form_lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            form_lines.push(Line::from(Span::styled(
                "Ctrl+S to save, Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }
        let form = Paragraph::new(form_lines).wrap(Wrap { trim: true });
        frame.render_widget(form, form_inner);

        if editor.focus == EditorFocus::Form {
            let (prefix, row, value) = match editor.form.active {
                WorkoutField::Name => ("Name: ", 0, &editor.form.name),
                WorkoutField::Description => ("Description: ", 1, &editor.form.description),
            };
            let cursor_x = form_inner.x + prefix.len() as u16 + value.chars().count() as u16;
            frame.set_cursor_position((cursor_x, form_inner.y + row));
        }

        let mut list_block = Block::default().borders(Borders::ALL).title("Exercises");
        if editor.focus == EditorFocus::Drafts {
            list_block = list_block.border_style(Style::default().fg(Color::Yellow));
        }

        if editor.drafts.is_empty() {
            let message = Paragraph::new("No exercises yet. Press Down, then '+' to add one.")
                .alignment(Alignment::Center)
                .block(list_block);
            frame.render_widget(message, chunks[1]);
            return;
        }

        let items: Vec<ListItem> = editor
            .drafts
            .iter()
            .enumerate()
            .map(|(position, draft)| {
                let mut lines = vec![Line::from(vec![
                    Span::raw(format!("{}. ", position + 1)),
                    Span::styled(
                        draft.name.clone(),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(format!("  {}x{}", draft.sets, draft.reps)),
                ])];
                if !draft.equipment.is_empty() {
                    lines.push(Line::from(Span::styled(
                        format!("    {}", draft.equipment.join(", ")),
                        Style::default().fg(Color::DarkGray),
                    )));
                }
                ListItem::new(lines)
            })
            .collect();

        let mut state = ListState::default();
        state.select(Some(editor.selected));
        let list = List::new(items)
            .block(list_block)
            .highlight_style(Style::default().fg(Color::Yellow));
        frame.render_stateful_widget(list, chunks[1], &mut state);
    }

    fn draw_profile(&self, frame: &mut Frame, area: Rect, profile: &ProfileScreen) {
        let popup_area = centered_rect(60, 60, area);
        let block = Block::default().title("Profile").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            Line::from(Span::styled(
                profile.name.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(profile.email.clone()),
            Line::from(""),
            Line::from(format!("Workouts: {}", profile.total_workouts)),
            Line::from(format!("Completed: {}", profile.completed_workouts)),
            Line::from(format!("Distinct equipment: {}", profile.equipment_count)),
        ];
        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let instructions = self.footer_instructions();

        let paragraph = Paragraph::new(vec![status_line, instructions]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        match (&self.screen, &self.mode) {
            (_, Mode::EditingExercise { .. }) => Line::from(vec![
                Span::styled("[Enter]", key_style),
                Span::raw(" Save   "),
                Span::styled("[Tab]", key_style),
                Span::raw(" Next Field   "),
                Span::styled("[Esc]", key_style),
                Span::raw(" Cancel"),
            ]),
            (
                _,
                Mode::ConfirmDeleteWorkout(_)
                | Mode::ConfirmResetAll
                | Mode::ConfirmResetExercises { .. },
            ) => Line::from(vec![
                Span::styled("[y]", key_style),
                Span::raw(" Confirm   "),
                Span::styled("[n]", key_style),
                Span::raw(" Cancel"),
            ]),
            (_, Mode::SharePreview(_)) => Line::from(vec![
                Span::styled("[Esc]", key_style),
                Span::raw(" Close"),
            ]),
            (Screen::Auth(_), _) => Line::from(vec![
                Span::styled("[Enter]", key_style),
                Span::raw(" Submit   "),
                Span::styled("[Tab]", key_style),
                Span::raw(" Next Field   "),
                Span::styled("[Shift+Tab]", key_style),
                Span::raw(" Log In/Register   "),
                Span::styled("[Esc]", key_style),
                Span::raw(" Quit"),
            ]),
            (Screen::Home(_), _) => Line::from(vec![
                Span::styled("[Enter]", key_style),
                Span::raw(" Open   "),
                Span::styled("[+]", key_style),
                Span::raw(" New   "),
                Span::styled("[e]", key_style),
                Span::raw(" Edit   "),
                Span::styled("[-]", key_style),
                Span::raw(" Delete   "),
                Span::styled("[Space]", key_style),
                Span::raw(" Toggle Done   "),
                Span::styled("[r]", key_style),
                Span::raw(" Reset All   "),
                Span::styled("[p]", key_style),
                Span::raw(" Profile   "),
                Span::styled("[l]", key_style),
                Span::raw(" Log Out   "),
                Span::styled("[q]", key_style),
                Span::raw(" Quit"),
            ]),
            (Screen::Detail(_), _) => Line::from(vec![
                Span::styled("[Space]", key_style),
                Span::raw(" Toggle Done   "),
                Span::styled("[r]", key_style),
                Span::raw(" Reset   "),
                Span::styled("[s]", key_style),
                Span::raw(" Share   "),
                Span::styled("[e]", key_style),
                Span::raw(" Edit   "),
                Span::styled("[Esc]", key_style),
                Span::raw(" Back   "),
                Span::styled("[q]", key_style),
                Span::raw(" Quit"),
            ]),
            (Screen::Editor(_), _) => Line::from(vec![
                Span::styled("[Ctrl+S]", key_style),
                Span::raw(" Save   "),
                Span::styled("[+]", key_style),
                Span::raw(" Add Exercise   "),
                Span::styled("[-]", key_style),
                Span::raw(" Remove   "),
                Span::styled("[< >]", key_style),
                Span::raw(" Reorder   "),
                Span::styled("[Tab]", key_style),
                Span::raw(" Switch Focus   "),
                Span::styled("[Esc]", key_style),
                Span::raw(" Cancel"),
            ]),
            (Screen::Profile(_), _) => Line::from(vec![
                Span::styled("[Esc]", key_style),
                Span::raw(" Back   "),
                Span::styled("[l]", key_style),
                Span::raw(" Log Out   "),
                Span::styled("[q]", key_style),
                Span::raw(" Quit"),
            ]),
        }
    }

    fn draw_exercise_form(&self, frame: &mut Frame, area: Rect, title: &str, form: &ExerciseForm) {
        let popup_area = centered_rect(70, 60, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = vec![
            form.build_line("Name", ExerciseField::Name),
            form.build_line("Sets", ExerciseField::Sets),
            form.build_line("Reps", ExerciseField::Reps),
            form.build_line("Instructions", ExerciseField::Instructions),
            form.build_line("Equipment", ExerciseField::Equipment),
            Line::from(""),
        ];

        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Equipment is comma-separated. Enter to save, Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        let (prefix, row, value) = match form.active {
            ExerciseField::Name => ("Name: ", 0, &form.name),
            ExerciseField::Sets => ("Sets: ", 1, &form.sets),
            ExerciseField::Reps => ("Reps: ", 2, &form.reps),
            ExerciseField::Instructions => ("Instructions: ", 3, &form.instructions),
            ExerciseField::Equipment => ("Equipment: ", 4, &form.equipment),
        };
        let cursor_x = inner.x + prefix.len() as u16 + value.chars().count() as u16;
        frame.set_cursor_position((cursor_x, inner.y + row));
    }

    fn draw_confirm(&self, frame: &mut Frame, area: Rect, title: &str, message: &[String]) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title.to_string()).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines: Vec<Line> = message.iter().map(|m| Line::from(m.clone())).collect();
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Press Y to confirm or N / Esc to cancel.",
            Style::default().fg(Color::Gray),
        )));

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn draw_share_preview(&self, frame: &mut Frame, area: Rect, message: &str) {
        let popup_area = centered_rect(70, 70, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Share Workout").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let segments = share::divide_message(message);
        let mut lines: Vec<Line> = message.lines().map(|l| Line::from(l.to_string())).collect();
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(
                "{} characters, {} SMS segment(s)",
                message.chars().count(),
                segments.len()
            ),
            Style::default().fg(Color::Gray),
        )));
        lines.push(Line::from(Span::styled(
            "Esc to close",
            Style::default().fg(Color::Gray),
        )));

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
        frame.render_widget(paragraph, inner);
    }
}
