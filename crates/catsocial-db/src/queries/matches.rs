use rusqlite::{Connection, TransactionBehavior, params};
use tracing::info;

use super::FoundExt;
use super::cats::query_cat;
use crate::models::{
    ApprovedMatch, CatRow, MATCH_COLUMNS, MatchDetailRow, MatchRow, cat_columns, parse_timestamp,
};
use crate::{Database, DbError, MatchRuleViolation};

/// Whether `user_cat` may propose to `match_cat`.
pub fn check_match_rules(user_cat: &CatRow, match_cat: &CatRow) -> Result<(), MatchRuleViolation> {
    if user_cat.has_matched {
        return Err(MatchRuleViolation::AlreadyMatched(user_cat.id));
    }
    if match_cat.has_matched {
        return Err(MatchRuleViolation::AlreadyMatched(match_cat.id));
    }
    if user_cat.sex == match_cat.sex {
        return Err(MatchRuleViolation::SameSex);
    }
    if user_cat.user_id == match_cat.user_id {
        return Err(MatchRuleViolation::SameOwner);
    }
    Ok(())
}

impl Database {
    /// Propose `user_cat_id` (owned by `issuer_id`) to `match_cat_id`.
    pub fn create_match(
        &self,
        issuer_id: i64,
        user_cat_id: i64,
        match_cat_id: i64,
        message: &str,
    ) -> Result<MatchRow, DbError> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let user_cat = query_cat(&tx, user_cat_id, Some(issuer_id))?;
            let match_cat = query_cat(&tx, match_cat_id, None)?;
            check_match_rules(&user_cat, &match_cat)?;

            let row = tx.query_row(
                &format!(
                    "INSERT INTO matches (user_id, match_user_id, match_cat_id, user_cat_id, message, status)
                     VALUES (?1, ?2, ?3, ?4, ?5, 'pending')
                     RETURNING {MATCH_COLUMNS}"
                ),
                params![issuer_id, match_cat.user_id, match_cat.id, user_cat.id, message],
                MatchRow::from_row,
            )?;

            tx.commit()?;
            Ok(row)
        })
    }

    pub fn get_match(&self, id: i64) -> Result<MatchRow, DbError> {
        self.with_conn(|conn| query_match(conn, id))
    }

    /// Non-removed matches the user issued or received, newest first, with
    /// issuer and both cats joined in.
    pub fn list_related_matches(&self, user_id: i64) -> Result<Vec<MatchDetailRow>, DbError> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT m.id, m.user_id, m.match_user_id, m.match_cat_id, m.user_cat_id,
                        m.message, m.status, m.created_at,
                        u.name, u.email, u.created_at,
                        {}, {}
                 FROM matches m
                 JOIN users u ON u.id = m.user_id
                 JOIN cats mc ON mc.id = m.match_cat_id
                 JOIN cats uc ON uc.id = m.user_cat_id
                 WHERE (m.user_id = ?1 OR m.match_user_id = ?1) AND m.status != 'removed'
                 ORDER BY m.created_at DESC, m.id DESC",
                cat_columns(Some("mc")),
                cat_columns(Some("uc")),
            );

            let issuer_at = MatchRow::WIDTH;
            let match_cat_at = issuer_at + 3;
            let user_cat_at = match_cat_at + CatRow::WIDTH;

            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([user_id], |row| {
                    Ok(MatchDetailRow {
                        record: MatchRow::from_row(row)?,
                        issuer_name: row.get(issuer_at)?,
                        issuer_email: row.get(issuer_at + 1)?,
                        issuer_created_at: parse_timestamp(row, issuer_at + 2)?,
                        match_cat: CatRow::from_row_at(row, match_cat_at)?,
                        user_cat: CatRow::from_row_at(row, user_cat_at)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Approve a pending match and close out every competing pending match
    /// for both cats, atomically.
    pub fn approve_match(&self, id: i64, caller_id: i64) -> Result<ApprovedMatch, DbError> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let record = load_open_match(&tx, id, caller_id)?;

            for cat_id in [record.user_cat_id, record.match_cat_id] {
                if query_cat(&tx, cat_id, None)?.has_matched {
                    return Err(MatchRuleViolation::AlreadyMatched(cat_id).into());
                }
            }

            tx.execute("UPDATE matches SET status = 'approved' WHERE id = ?1", [id])?;
            tx.execute(
                "UPDATE cats
                 SET has_matched = 1, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id IN (?1, ?2)",
                params![record.user_cat_id, record.match_cat_id],
            )?;
            let removed = tx.execute(
                "UPDATE matches SET status = 'removed'
                 WHERE id != ?1 AND status = 'pending'
                   AND (match_cat_id IN (?2, ?3) OR user_cat_id IN (?2, ?3))",
                params![id, record.user_cat_id, record.match_cat_id],
            )?;

            tx.commit()?;

            info!(
                "Match {} approved by user {}; {} competing matches removed",
                id, caller_id, removed
            );
            Ok(ApprovedMatch { match_id: id, removed })
        })
    }

    pub fn reject_match(&self, id: i64, caller_id: i64) -> Result<(), DbError> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            load_open_match(&tx, id, caller_id)?;
            tx.execute("UPDATE matches SET status = 'removed' WHERE id = ?1", [id])?;

            tx.commit()?;
            info!("Match {} rejected by user {}", id, caller_id);
            Ok(())
        })
    }

    /// Delete a match. Only its issuer may do so.
    pub fn delete_match(&self, id: i64, caller_id: i64) -> Result<(), DbError> {
        self.with_conn_mut(|conn| {
            let issuer: i64 = conn
                .query_row("SELECT user_id FROM matches WHERE id = ?1", [id], |row| row.get(0))
                .found()?;
            if issuer != caller_id {
                return Err(DbError::NotIssuer);
            }
            conn.execute("DELETE FROM matches WHERE id = ?1", [id])?;
            Ok(())
        })
    }
}

fn query_match(conn: &Connection, id: i64) -> Result<MatchRow, DbError> {
    conn.query_row(
        &format!("SELECT {MATCH_COLUMNS} FROM matches WHERE id = ?1"),
        [id],
        MatchRow::from_row,
    )
    .found()
}

/// Fetch a match the caller takes part in that is still pending.
fn load_open_match(conn: &Connection, id: i64, caller_id: i64) -> Result<MatchRow, DbError> {
    let record = query_match(conn, id)?;
    if !record.involves_user(caller_id) {
        return Err(DbError::NotParticipant);
    }
    if record.status.is_closed() {
        return Err(DbError::MatchClosed(record.status));
    }
    Ok(record)
}
