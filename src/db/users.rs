use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{map_constraint, now_millis, StoreError};
use crate::models::User;

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        full_name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        created_at: row.get(4)?,
        last_login: row.get(5)?,
    })
}

/// Insert a new user with both timestamps set to now, returning the hydrated
/// struct so the caller can log the account in without a re-read.
pub fn create_user(
    conn: &Connection,
    full_name: &str,
    email: &str,
    password_hash: &str,
) -> Result<User> {
    let now = now_millis();
    conn.execute(
        "INSERT INTO users (full_name, email, password_hash, created_at, last_login)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![full_name, email, password_hash, now, now],
    )
    .map_err(|err| map_constraint(err, "user"))
    .context("failed to insert user")?;

    Ok(User {
        id: conn.last_insert_rowid(),
        full_name: full_name.to_string(),
        email: email.to_string(),
        password_hash: password_hash.to_string(),
        created_at: now,
        last_login: now,
    })
}

/// Full-row overwrite by primary key. A missing key updates nothing and is
/// not an error.
pub fn update_user(conn: &Connection, user: &User) -> Result<()> {
    conn.execute(
        "UPDATE users SET full_name = ?1, email = ?2, password_hash = ?3,
         created_at = ?4, last_login = ?5 WHERE user_id = ?6",
        params![
            user.full_name,
            user.email,
            user.password_hash,
            user.created_at,
            user.last_login,
            user.id
        ],
    )
    .map_err(|err| map_constraint(err, "user"))
    .context("failed to update user")?;
    Ok(())
}

/// Point lookup by login identifier. `LIMIT 1` keeps the first match when
/// duplicate emails exist, matching the registration-time existence check.
pub fn fetch_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>> {
    conn.query_row(
        "SELECT user_id, full_name, email, password_hash, created_at, last_login
         FROM users WHERE email = ?1 LIMIT 1",
        params![email],
        user_from_row,
    )
    .optional()
    .context("failed to look up user by email")
}

/// Point lookup by primary key; `None` when no row matches.
pub fn fetch_user_by_id(conn: &Connection, user_id: i64) -> Result<Option<User>> {
    conn.query_row(
        "SELECT user_id, full_name, email, password_hash, created_at, last_login
         FROM users WHERE user_id = ?1 LIMIT 1",
        params![user_id],
        user_from_row,
    )
    .optional()
    .context("failed to look up user by id")
}

/// Application-level uniqueness check run before registration inserts.
pub fn email_exists(conn: &Connection, email: &str) -> Result<bool> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM users WHERE email = ?1",
            params![email],
            |row| row.get(0),
        )
        .context("failed to count users by email")?;
    Ok(count > 0)
}

/// Stamp the most recent successful login.
pub fn update_last_login(conn: &Connection, user_id: i64, timestamp: i64) -> Result<()> {
    let updated = conn
        .execute(
            "UPDATE users SET last_login = ?1 WHERE user_id = ?2",
            params![timestamp, user_id],
        )
        .context("failed to update last login")?;

    if updated == 0 {
        Err(StoreError::NotFound("user").into())
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::db::test_support::memory_db;

    #[test]
    fn insert_then_fetch_round_trips() {
        let conn = memory_db();
        let user = create_user(&conn, "Ada Lovelace", "ada@example.com", "hash").unwrap();

        let fetched = fetch_user_by_id(&conn, user.id).unwrap().unwrap();
        assert_eq!(fetched.full_name, "Ada Lovelace");
        assert_eq!(fetched.email, "ada@example.com");
        assert_eq!(fetched.password_hash, "hash");
    }

    #[test]
    fn email_exists_flips_after_insert() {
        let conn = memory_db();
        assert!(!email_exists(&conn, "ada@example.com").unwrap());
        create_user(&conn, "Ada", "ada@example.com", "hash").unwrap();
        assert!(email_exists(&conn, "ada@example.com").unwrap());
    }

    #[test]
    fn missing_user_reads_as_none() {
        let conn = memory_db();
        assert!(fetch_user_by_id(&conn, 42).unwrap().is_none());
        assert!(fetch_user_by_email(&conn, "nobody@example.com")
            .unwrap()
            .is_none());
    }

    #[test]
    fn update_overwrites_existing_and_skips_missing() {
        let conn = memory_db();
        let mut user = create_user(&conn, "Ada", "ada@example.com", "hash").unwrap();

        user.full_name = "Ada Lovelace".to_string();
        update_user(&conn, &user).unwrap();
        assert_eq!(
            fetch_user_by_id(&conn, user.id).unwrap().unwrap().full_name,
            "Ada Lovelace"
        );

        let mut ghost = user.clone();
        ghost.id += 1;
        update_user(&conn, &ghost).unwrap();
        assert!(fetch_user_by_id(&conn, ghost.id).unwrap().is_none());
    }

    #[test]
    fn last_login_updates_only_existing_rows() {
        let conn = memory_db();
        let user = create_user(&conn, "Ada", "ada@example.com", "hash").unwrap();

        update_last_login(&conn, user.id, 12345).unwrap();
        let fetched = fetch_user_by_id(&conn, user.id).unwrap().unwrap();
        assert_eq!(fetched.last_login, 12345);

        assert!(update_last_login(&conn, user.id + 1, 12345).is_err());
    }
}
