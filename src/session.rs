//! The single on-disk session record identifying the logged-in user. There is
//! no expiry and no multi-session support: exactly one record exists
//! system-wide, stored as JSON next to the database file.

use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use directories::BaseDirs;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Sentinel user id meaning "nobody is logged in".
pub const NO_USER: i64 = -1;

const SESSION_FILE_NAME: &str = "session.json";

/// The stored session fields. `Default` is the logged-out state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub user_id: i64,
    pub is_logged_in: bool,
    pub user_name: String,
    pub user_email: String,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            user_id: NO_USER,
            is_logged_in: false,
            user_name: String::new(),
            user_email: String::new(),
        }
    }
}

/// Reader/writer for the session file. The path is injected so tests can use
/// a scratch directory instead of the real home.
pub struct SessionStore {
    path: PathBuf,
    session: Session,
}

impl SessionStore {
    /// Open the store at the default location under the user's home and read
    /// whatever session is there.
    pub fn open_default() -> Result<Self> {
        let base_dirs =
            BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
        let path = base_dirs
            .home_dir()
            .join(crate::db::DATA_DIR_NAME)
            .join(SESSION_FILE_NAME);
        Ok(Self::open_at(path))
    }

    /// Open the store against an explicit file path.
    pub fn open_at(path: PathBuf) -> Self {
        let session = load_session(&path);
        Self { path, session }
    }

    /// The current session record.
    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.is_logged_in && self.session.user_id != NO_USER
    }

    pub fn user_id(&self) -> i64 {
        self.session.user_id
    }

    /// Write all four fields as one atomic step: serialize to a sibling temp
    /// file, then rename over the target, so a reader never observes a
    /// partial session.
    pub fn save(&mut self, user_id: i64, user_name: &str, user_email: &str) -> Result<()> {
        let session = Session {
            user_id,
            is_logged_in: true,
            user_name: user_name.to_string(),
            user_email: user_email.to_string(),
        };
        self.persist(&session)?;
        self.session = session;
        debug!("session saved for user {user_id}");
        Ok(())
    }

    /// Wipe the stored session (logout) and revert to the logged-out default.
    pub fn clear(&mut self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path).context("failed to remove session file")?;
        }
        self.session = Session::default();
        debug!("session cleared");
        Ok(())
    }

    fn persist(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context("failed to create data directory")?;
        }
        let json =
            serde_json::to_string_pretty(session).context("failed to serialize session")?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, json).context("failed to write session file")?;
        fs::rename(&tmp_path, &self.path).context("failed to commit session file")
    }
}

/// Read a session from disk, treating a missing or unreadable file as "nobody
/// logged in" rather than an error.
fn load_session(path: &PathBuf) -> Session {
    match fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str(&contents) {
            Ok(session) => session,
            Err(err) => {
                warn!("ignoring malformed session file: {err}");
                Session::default()
            }
        },
        Err(_) => Session::default(),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn missing_file_reads_as_logged_out() {
        let dir = tempdir().unwrap();
        let store = SessionStore::open_at(dir.path().join("session.json"));
        assert!(!store.is_logged_in());
        assert_eq!(store.user_id(), NO_USER);
    }

    #[test]
    fn save_then_reopen_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");

        let mut store = SessionStore::open_at(path.clone());
        store.save(7, "Ada", "ada@example.com").unwrap();
        assert!(store.is_logged_in());

        let reopened = SessionStore::open_at(path);
        assert_eq!(
            reopened.session(),
            &Session {
                user_id: 7,
                is_logged_in: true,
                user_name: "Ada".to_string(),
                user_email: "ada@example.com".to_string(),
            }
        );
    }

    #[test]
    fn clear_removes_the_record() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");

        let mut store = SessionStore::open_at(path.clone());
        store.save(7, "Ada", "ada@example.com").unwrap();
        store.clear().unwrap();
        assert!(!store.is_logged_in());
        assert!(!path.exists());

        let reopened = SessionStore::open_at(path);
        assert!(!reopened.is_logged_in());
    }

    #[test]
    fn malformed_file_reads_as_logged_out() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = SessionStore::open_at(path);
        assert!(!store.is_logged_in());
    }
}
