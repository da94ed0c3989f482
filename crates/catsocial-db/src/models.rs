//! Database row types. These map directly to SQLite rows.
//! Distinct from catsocial-types API models to keep the DB layer independent.

use std::str::FromStr;

use catsocial_types::models::{MatchStatus, Race, Sex};
use chrono::{DateTime, Utc};
use rusqlite::Row;
use rusqlite::types::Type;

#[derive(Debug)]
pub struct UserRow {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub password: String,
    pub created_at: DateTime<Utc>,
}

pub(crate) const USER_COLUMNS: &str = "id, email, name, password, created_at";

impl UserRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            email: row.get(1)?,
            name: row.get(2)?,
            password: row.get(3)?,
            created_at: parse_timestamp(row, 4)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct CatRow {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub race: Race,
    pub sex: Sex,
    pub age_in_month: i64,
    pub description: String,
    pub image_urls: Vec<String>,
    pub has_matched: bool,
    pub created_at: DateTime<Utc>,
}

const CAT_FIELDS: [&str; 10] = [
    "id",
    "user_id",
    "name",
    "race",
    "sex",
    "age_in_month",
    "description",
    "image_urls",
    "has_matched",
    "created_at",
];

/// Cat column list, optionally qualified with a table alias for joins.
pub(crate) fn cat_columns(alias: Option<&str>) -> String {
    CAT_FIELDS
        .iter()
        .map(|field| match alias {
            Some(a) => format!("{a}.{field}"),
            None => field.to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

impl CatRow {
    pub(crate) const WIDTH: usize = CAT_FIELDS.len();

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Self::from_row_at(row, 0)
    }

    /// Read a cat whose columns start at `at` (joined queries).
    pub(crate) fn from_row_at(row: &Row<'_>, at: usize) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(at)?,
            user_id: row.get(at + 1)?,
            name: row.get(at + 2)?,
            race: parse_text(row, at + 3)?,
            sex: parse_text(row, at + 4)?,
            age_in_month: row.get(at + 5)?,
            description: row.get(at + 6)?,
            image_urls: parse_json_list(row, at + 7)?,
            has_matched: row.get(at + 8)?,
            created_at: parse_timestamp(row, at + 9)?,
        })
    }
}

/// Owner-editable cat attributes, used for both insert and update.
#[derive(Debug, Clone)]
pub struct CatFields {
    pub name: String,
    pub race: Race,
    pub sex: Sex,
    pub age_in_month: i64,
    pub description: String,
    pub image_urls: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct MatchRow {
    pub id: i64,
    /// Issuer of the proposal.
    pub user_id: i64,
    /// Owner of the target cat.
    pub match_user_id: i64,
    pub match_cat_id: i64,
    pub user_cat_id: i64,
    pub message: String,
    pub status: MatchStatus,
    pub created_at: DateTime<Utc>,
}

pub(crate) const MATCH_COLUMNS: &str =
    "id, user_id, match_user_id, match_cat_id, user_cat_id, message, status, created_at";

impl MatchRow {
    pub(crate) const WIDTH: usize = 8;

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            match_user_id: row.get(2)?,
            match_cat_id: row.get(3)?,
            user_cat_id: row.get(4)?,
            message: row.get(5)?,
            status: parse_text(row, 6)?,
            created_at: parse_timestamp(row, 7)?,
        })
    }

    pub fn involves_user(&self, user_id: i64) -> bool {
        self.user_id == user_id || self.match_user_id == user_id
    }
}

/// A match joined with its issuer and both cats.
#[derive(Debug)]
pub struct MatchDetailRow {
    pub record: MatchRow,
    pub issuer_name: String,
    pub issuer_email: String,
    pub issuer_created_at: DateTime<Utc>,
    pub match_cat: CatRow,
    pub user_cat: CatRow,
}

/// Outcome of a successful approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApprovedMatch {
    pub match_id: i64,
    /// Competing pending matches closed by the cascade.
    pub removed: usize,
}

fn conversion_error(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn parse_text<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e| conversion_error(idx, e))
}

fn parse_json_list(row: &Row<'_>, idx: usize) -> rusqlite::Result<Vec<String>> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw).map_err(|e| conversion_error(idx, e))
}

pub(crate) fn parse_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    raw.parse::<DateTime<Utc>>()
        .map_err(|e| conversion_error(idx, e))
}
