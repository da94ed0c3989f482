use rusqlite::Connection;

use super::{FoundExt, is_unique_violation};
use crate::models::{USER_COLUMNS, UserRow};
use crate::{Database, DbError};

impl Database {
    /// Insert a user. Fails with `DuplicateEmail` if the address is taken.
    pub fn create_user(
        &self,
        email: &str,
        name: &str,
        password_hash: &str,
    ) -> Result<UserRow, DbError> {
        self.with_conn_mut(|conn| {
            conn.query_row(
                &format!(
                    "INSERT INTO users (email, name, password) VALUES (?1, ?2, ?3) RETURNING {USER_COLUMNS}"
                ),
                (email, name, password_hash),
                UserRow::from_row,
            )
            .map_err(|e| {
                if is_unique_violation(&e) {
                    DbError::DuplicateEmail
                } else {
                    e.into()
                }
            })
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<UserRow, DbError> {
        self.with_conn(|conn| query_user(conn, "email = ?1", email))
    }

    pub fn get_user_by_id(&self, id: i64) -> Result<UserRow, DbError> {
        self.with_conn(|conn| query_user(conn, "id = ?1", id))
    }
}

fn query_user(
    conn: &Connection,
    predicate: &'static str,
    value: impl rusqlite::ToSql,
) -> Result<UserRow, DbError> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE {predicate}"
    ))?;
    stmt.query_row([value], UserRow::from_row).found()
}
