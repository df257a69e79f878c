//! User operations

use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};
use sha2::{Digest, Sha256};
use tracing::info;

use super::{format_datetime, parse_datetime, Database};
use crate::config::SeedUser;
use crate::error::{Error, Result};
use crate::models::{NewUser, User};

const USER_COLUMNS: &str = "Id, Username, Email, PasswordHash, FullName, CreatedAt, LastLogin";

/// Lowercase hex SHA-256 of the password (unsalted, kept for store compatibility)
pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

fn row_to_user(row: &Row) -> rusqlite::Result<User> {
    let created_at: String = row.get(5)?;
    let last_login: Option<String> = row.get(6)?;
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        full_name: row.get(4)?,
        created_at: parse_datetime(&created_at),
        last_login: last_login.map(|s| parse_datetime(&s)),
    })
}

impl Database {
    /// Register a new user, rejecting duplicate usernames and emails
    pub fn register_user(&self, user: &NewUser) -> Result<i64> {
        user.validate()?;
        let conn = self.conn()?;

        let taken: Option<String> = conn
            .query_row(
                "SELECT Username FROM Users WHERE Username = ? OR Email = ? LIMIT 1",
                params![user.username.trim(), user.email.trim()],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(existing) = taken {
            return Err(Error::InvalidData(if existing == user.username.trim() {
                format!("Username already taken: {}", existing)
            } else {
                format!("Email already registered: {}", user.email.trim())
            }));
        }

        conn.execute(
            "INSERT INTO Users (Username, Email, PasswordHash, FullName, CreatedAt) VALUES (?, ?, ?, ?, ?)",
            params![
                user.username.trim(),
                user.email.trim(),
                hash_password(&user.password),
                user.full_name.as_deref().map(str::trim),
                format_datetime(Utc::now()),
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// Check credentials by username or email; records the login on success
    pub fn authenticate(&self, login: &str, password: &str) -> Result<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                &format!(
                    "SELECT {} FROM Users WHERE Username = ?1 OR Email = ?1",
                    USER_COLUMNS
                ),
                params![login.trim()],
                row_to_user,
            )
            .optional()?;

        let Some(mut user) = user else {
            return Ok(None);
        };
        if user.password_hash != hash_password(password) {
            return Ok(None);
        }

        let now = Utc::now();
        conn.execute(
            "UPDATE Users SET LastLogin = ? WHERE Id = ?",
            params![format_datetime(now), user.id],
        )?;
        user.last_login = Some(parse_datetime(&format_datetime(now)));

        Ok(Some(user))
    }

    pub fn get_user(&self, id: i64) -> Result<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                &format!("SELECT {} FROM Users WHERE Id = ?", USER_COLUMNS),
                params![id],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                &format!("SELECT {} FROM Users WHERE Username = ?", USER_COLUMNS),
                params![username.trim()],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    pub fn list_users(&self) -> Result<Vec<User>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM Users ORDER BY Username",
            USER_COLUMNS
        ))?;
        let users = stmt
            .query_map([], row_to_user)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(users)
    }

    pub fn count_users(&self) -> Result<i64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM Users", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Change a user's email and full name
    pub fn update_user_profile(
        &self,
        id: i64,
        email: &str,
        full_name: Option<&str>,
    ) -> Result<()> {
        let email = email.trim();
        if email.is_empty() || !email.contains('@') || email.chars().count() > 100 {
            return Err(Error::InvalidData(format!("Invalid email address: {}", email)));
        }

        let conn = self.conn()?;
        let clash: Option<i64> = conn
            .query_row(
                "SELECT Id FROM Users WHERE Email = ? AND Id != ?",
                params![email, id],
                |row| row.get(0),
            )
            .optional()?;
        if clash.is_some() {
            return Err(Error::InvalidData(format!(
                "Email already registered: {}",
                email
            )));
        }

        let updated = conn.execute(
            "UPDATE Users SET Email = ?, FullName = ? WHERE Id = ?",
            params![email, full_name.map(str::trim), id],
        )?;
        if updated == 0 {
            return Err(Error::NotFound(format!("user {}", id)));
        }
        Ok(())
    }

    /// Replace the password after checking the current one
    pub fn change_password(&self, id: i64, current: &str, new_password: &str) -> Result<()> {
        if new_password.chars().count() < 6 {
            return Err(Error::InvalidData(
                "Password must be at least 6 characters".to_string(),
            ));
        }

        let conn = self.conn()?;
        let stored: Option<String> = conn
            .query_row(
                "SELECT PasswordHash FROM Users WHERE Id = ?",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        let stored = stored.ok_or_else(|| Error::NotFound(format!("user {}", id)))?;

        if stored != hash_password(current) {
            return Err(Error::Auth("current password does not match".to_string()));
        }

        conn.execute(
            "UPDATE Users SET PasswordHash = ? WHERE Id = ?",
            params![hash_password(new_password), id],
        )?;
        Ok(())
    }

    /// Delete a user and, through the foreign keys, everything they own
    pub fn delete_user(&self, id: i64) -> Result<()> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM Users WHERE Id = ?", params![id])?;
        if deleted == 0 {
            return Err(Error::NotFound(format!("user {}", id)));
        }
        Ok(())
    }

    /// Create the demo user when the store has no users at all
    ///
    /// Returns the new id, or `None` when users already exist.
    pub fn ensure_seed_user(&self, seed: &SeedUser) -> Result<Option<i64>> {
        if self.count_users()? > 0 {
            return Ok(None);
        }
        let id = self.register_user(&seed.to_new_user())?;
        info!(username = %seed.username, id, "Created demo user");
        Ok(Some(id))
    }
}
