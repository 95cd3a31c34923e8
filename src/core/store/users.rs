//! User account and session rows

use chrono::{DateTime, Utc};
use miette::{IntoDiagnostic, Result};
use rusqlite::{params, OptionalExtension, Row};

use super::{format_datetime, parse_datetime, DocumentStore, UserRecord};
use crate::core::auth::{Role, User};

const USER_COLUMNS: &str = "id, username, email, full_name, role, disabled, created_at, \
     updated_at, last_login, password_hash";

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<UserRecord> {
    let role: String = row.get(4)?;
    Ok(UserRecord {
        user: User {
            id: row.get(0)?,
            username: row.get(1)?,
            email: row.get(2)?,
            full_name: row.get(3)?,
            role: role.parse().unwrap_or(Role::User),
            disabled: row.get(5)?,
            created_at: parse_datetime(row.get::<_, String>(6)?),
            updated_at: parse_datetime(row.get::<_, String>(7)?),
            last_login: row.get::<_, Option<String>>(8)?.map(parse_datetime),
        },
        password_hash: row.get(9)?,
    })
}

impl DocumentStore {
    /// Insert a user row; uniqueness is checked by the caller
    pub fn insert_user(
        &self,
        username: &str,
        email: Option<&str>,
        full_name: Option<&str>,
        role: Role,
        disabled: bool,
        password_hash: &str,
    ) -> Result<User> {
        let now = Utc::now();
        self.conn
            .execute(
                r#"INSERT INTO users
                   (username, email, full_name, role, disabled, password_hash,
                    created_at, updated_at)
                   VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)"#,
                params![
                    username,
                    email,
                    full_name,
                    role.to_string(),
                    disabled,
                    password_hash,
                    format_datetime(&now),
                ],
            )
            .into_diagnostic()?;

        Ok(User {
            id: self.conn.last_insert_rowid(),
            username: username.to_string(),
            email: email.map(String::from),
            full_name: full_name.map(String::from),
            role,
            disabled,
            created_at: now,
            updated_at: now,
            last_login: None,
        })
    }

    pub fn get_user(&self, username: &str) -> Result<Option<UserRecord>> {
        let sql = format!("SELECT {} FROM users WHERE username = ?1", USER_COLUMNS);
        self.conn
            .query_row(&sql, params![username], record_from_row)
            .optional()
            .into_diagnostic()
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let sql = format!(
            "SELECT {} FROM users WHERE email = ?1 COLLATE NOCASE",
            USER_COLUMNS
        );
        self.conn
            .query_row(&sql, params![email], record_from_row)
            .optional()
            .into_diagnostic()
    }

    /// Users ordered by username, optionally filtered by role and a
    /// case-insensitive search over username, email and full name
    pub fn list_users(&self, role: Option<Role>, search: Option<&str>) -> Result<Vec<User>> {
        let sql = format!(
            "SELECT {} FROM users \
             WHERE (?1 IS NULL OR role = ?1) \
               AND (?2 IS NULL OR username LIKE ?2 OR email LIKE ?2 OR full_name LIKE ?2) \
             ORDER BY username",
            USER_COLUMNS
        );
        let pattern = search.map(|s| format!("%{}%", s));

        let mut stmt = self.conn.prepare(&sql).into_diagnostic()?;
        let users = stmt
            .query_map(
                params![role.map(|r| r.to_string()), pattern],
                record_from_row,
            )
            .into_diagnostic()?
            .map(|r| r.map(|record| record.user))
            .collect::<rusqlite::Result<Vec<_>>>()
            .into_diagnostic()?;
        Ok(users)
    }

    /// Apply profile changes; returns false if the user does not exist
    pub fn update_user_fields(
        &self,
        username: &str,
        email: Option<&str>,
        full_name: Option<&str>,
        role: Option<Role>,
    ) -> Result<bool> {
        let updated = self
            .conn
            .execute(
                r#"UPDATE users SET
                   email = COALESCE(?2, email),
                   full_name = COALESCE(?3, full_name),
                   role = COALESCE(?4, role),
                   updated_at = ?5
                   WHERE username = ?1"#,
                params![
                    username,
                    email,
                    full_name,
                    role.map(|r| r.to_string()),
                    format_datetime(&Utc::now()),
                ],
            )
            .into_diagnostic()?;
        Ok(updated > 0)
    }

    pub fn set_user_disabled(&self, username: &str, disabled: bool) -> Result<bool> {
        let updated = self
            .conn
            .execute(
                "UPDATE users SET disabled = ?2, updated_at = ?3 WHERE username = ?1",
                params![username, disabled, format_datetime(&Utc::now())],
            )
            .into_diagnostic()?;
        Ok(updated > 0)
    }

    pub fn set_password_hash(&self, username: &str, password_hash: &str) -> Result<bool> {
        let updated = self
            .conn
            .execute(
                "UPDATE users SET password_hash = ?2, updated_at = ?3 WHERE username = ?1",
                params![username, password_hash, format_datetime(&Utc::now())],
            )
            .into_diagnostic()?;
        Ok(updated > 0)
    }

    pub fn touch_last_login(&self, username: &str, at: &DateTime<Utc>) -> Result<()> {
        self.conn
            .execute(
                "UPDATE users SET last_login = ?2 WHERE username = ?1",
                params![username, format_datetime(at)],
            )
            .into_diagnostic()?;
        Ok(())
    }

    /// Delete a user and their sessions; returns false if unknown
    pub fn delete_user(&self, username: &str) -> Result<bool> {
        self.delete_sessions_for(username)?;
        let removed = self
            .conn
            .execute("DELETE FROM users WHERE username = ?1", params![username])
            .into_diagnostic()?;
        Ok(removed > 0)
    }

    pub fn insert_session(
        &self,
        token_digest: &str,
        username: &str,
        created_at: &DateTime<Utc>,
        expires_at: &DateTime<Utc>,
    ) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO sessions (token_digest, username, created_at, expires_at) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    token_digest,
                    username,
                    format_datetime(created_at),
                    format_datetime(expires_at),
                ],
            )
            .into_diagnostic()?;
        Ok(())
    }

    /// Username and expiry for a session digest
    pub fn find_session(&self, token_digest: &str) -> Result<Option<(String, DateTime<Utc>)>> {
        self.conn
            .query_row(
                "SELECT username, expires_at FROM sessions WHERE token_digest = ?1",
                params![token_digest],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        parse_datetime(row.get::<_, String>(1)?),
                    ))
                },
            )
            .optional()
            .into_diagnostic()
    }

    pub fn delete_session(&self, token_digest: &str) -> Result<bool> {
        let removed = self
            .conn
            .execute(
                "DELETE FROM sessions WHERE token_digest = ?1",
                params![token_digest],
            )
            .into_diagnostic()?;
        Ok(removed > 0)
    }

    pub fn delete_sessions_for(&self, username: &str) -> Result<usize> {
        self.conn
            .execute("DELETE FROM sessions WHERE username = ?1", params![username])
            .into_diagnostic()
    }

    /// Drop sessions that expired before `now`
    pub fn purge_expired_sessions(&self, now: &DateTime<Utc>) -> Result<usize> {
        let removed = self
            .conn
            .execute(
                "DELETE FROM sessions WHERE expires_at <= ?1",
                params![format_datetime(now)],
            )
            .into_diagnostic()?;
        if removed > 0 {
            tracing::debug!(removed, "purged expired sessions");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_users() -> DocumentStore {
        let store = DocumentStore::open_in_memory().unwrap();
        store
            .insert_user(
                "admin",
                Some("admin@example.com"),
                Some("Site Admin"),
                Role::Admin,
                false,
                "h1",
            )
            .unwrap();
        store
            .insert_user("alice", Some("alice@example.com"), None, Role::User, false, "h2")
            .unwrap();
        store
            .insert_user("bob", None, Some("Bob Builder"), Role::User, true, "h3")
            .unwrap();
        store
    }

    #[test]
    fn test_get_user_roundtrip() {
        let store = store_with_users();
        let record = store.get_user("alice").unwrap().unwrap();
        assert_eq!(record.password_hash, "h2");
        assert_eq!(record.user.role, Role::User);
        assert!(!record.user.disabled);
        assert!(store.get_user("nobody").unwrap().is_none());

        let by_email = store.get_user_by_email("ALICE@example.com").unwrap().unwrap();
        assert_eq!(by_email.user.username, "alice");
    }

    #[test]
    fn test_list_users_filters() {
        let store = store_with_users();
        assert_eq!(store.list_users(None, None).unwrap().len(), 3);

        let admins = store.list_users(Some(Role::Admin), None).unwrap();
        assert_eq!(admins.len(), 1);
        assert_eq!(admins[0].username, "admin");

        let builders = store.list_users(None, Some("builder")).unwrap();
        assert_eq!(builders.len(), 1);
        assert_eq!(builders[0].username, "bob");
    }

    #[test]
    fn test_update_fields_keeps_unset_values() {
        let store = store_with_users();
        assert!(store
            .update_user_fields("alice", None, Some("Alice"), None)
            .unwrap());

        let user = store.get_user("alice").unwrap().unwrap().user;
        assert_eq!(user.email.as_deref(), Some("alice@example.com"));
        assert_eq!(user.full_name.as_deref(), Some("Alice"));
        assert!(!store.update_user_fields("ghost", None, None, None).unwrap());
    }

    #[test]
    fn test_sessions_follow_user() {
        let store = store_with_users();
        let now = Utc::now();
        let later = now + chrono::Duration::minutes(30);

        store.insert_session("d1", "alice", &now, &later).unwrap();
        let (username, expires) = store.find_session("d1").unwrap().unwrap();
        assert_eq!(username, "alice");
        assert_eq!(expires, later);

        assert!(store.delete_user("alice").unwrap());
        assert!(store.find_session("d1").unwrap().is_none());
    }

    #[test]
    fn test_purge_expired_sessions() {
        let store = store_with_users();
        let now = Utc::now();
        store
            .insert_session("old", "admin", &now, &(now - chrono::Duration::minutes(1)))
            .unwrap();
        store
            .insert_session("new", "admin", &now, &(now + chrono::Duration::minutes(1)))
            .unwrap();

        assert_eq!(store.purge_expired_sessions(&now).unwrap(), 1);
        assert!(store.find_session("new").unwrap().is_some());
    }
}
