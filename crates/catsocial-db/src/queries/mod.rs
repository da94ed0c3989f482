mod cats;
mod matches;
mod users;

pub use matches::check_match_rules;

use crate::DbError;

/// Maps "no rows" to `DbError::NotFound`.
trait FoundExt<T> {
    fn found(self) -> Result<T, DbError>;
}

impl<T> FoundExt<T> for rusqlite::Result<T> {
    fn found(self) -> Result<T, DbError> {
        match self {
            Ok(val) => Ok(val),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(DbError::NotFound),
            Err(e) => Err(e.into()),
        }
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}
