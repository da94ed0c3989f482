use rusqlite::{Connection, TransactionBehavior, params, params_from_iter};

use super::FoundExt;
use crate::models::{CatFields, CatRow, cat_columns};
use crate::{CatFilter, Database, DbError};

impl Database {
    pub fn insert_cat(&self, owner_id: i64, fields: &CatFields) -> Result<CatRow, DbError> {
        let image_urls = encode_urls(&fields.image_urls)?;
        self.with_conn_mut(|conn| {
            let sql = format!(
                "INSERT INTO cats (user_id, name, race, sex, age_in_month, description, image_urls)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 RETURNING {}",
                cat_columns(None)
            );
            let row = conn.query_row(
                &sql,
                params![
                    owner_id,
                    fields.name,
                    fields.race.as_str(),
                    fields.sex.as_str(),
                    fields.age_in_month,
                    fields.description,
                    image_urls,
                ],
                CatRow::from_row,
            )?;
            Ok(row)
        })
    }

    pub fn get_cat(&self, id: i64) -> Result<CatRow, DbError> {
        self.with_conn(|conn| query_cat(conn, id, None))
    }

    pub fn list_cats(&self, filter: &CatFilter) -> Result<Vec<CatRow>, DbError> {
        let query = filter.select(&cat_columns(None));
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&query.sql)?;
            let rows = stmt
                .query_map(params_from_iter(query.params.iter()), CatRow::from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Replace a cat's attributes. Refuses to change the sex of a matched cat.
    pub fn update_cat(
        &self,
        id: i64,
        owner_id: i64,
        fields: &CatFields,
    ) -> Result<CatRow, DbError> {
        let image_urls = encode_urls(&fields.image_urls)?;
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let current = query_cat(&tx, id, Some(owner_id))?;
            if current.has_matched && current.sex != fields.sex {
                return Err(DbError::SexLocked);
            }

            let sql = format!(
                "UPDATE cats
                 SET name = ?1, race = ?2, sex = ?3, age_in_month = ?4, description = ?5,
                     image_urls = ?6, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?7 AND user_id = ?8
                 RETURNING {}",
                cat_columns(None)
            );
            let updated = tx
                .query_row(
                    &sql,
                    params![
                        fields.name,
                        fields.race.as_str(),
                        fields.sex.as_str(),
                        fields.age_in_month,
                        fields.description,
                        image_urls,
                        id,
                        owner_id,
                    ],
                    CatRow::from_row,
                )
                .found()?;

            tx.commit()?;
            Ok(updated)
        })
    }

    /// Delete a cat owned by `owner_id`. Matches referencing it cascade.
    pub fn delete_cat(&self, id: i64, owner_id: i64) -> Result<(), DbError> {
        self.with_conn_mut(|conn| {
            let deleted = conn.execute(
                "DELETE FROM cats WHERE id = ?1 AND user_id = ?2",
                params![id, owner_id],
            )?;
            if deleted == 0 {
                return Err(DbError::NotFound);
            }
            Ok(())
        })
    }
}

pub(super) fn query_cat(
    conn: &Connection,
    id: i64,
    owner_id: Option<i64>,
) -> Result<CatRow, DbError> {
    let columns = cat_columns(None);
    match owner_id {
        Some(owner_id) => conn
            .query_row(
                &format!("SELECT {columns} FROM cats WHERE id = ?1 AND user_id = ?2"),
                params![id, owner_id],
                CatRow::from_row,
            )
            .found(),
        None => conn
            .query_row(
                &format!("SELECT {columns} FROM cats WHERE id = ?1"),
                [id],
                CatRow::from_row,
            )
            .found(),
    }
}

fn encode_urls(urls: &[String]) -> Result<String, DbError> {
    serde_json::to_string(urls)
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)).into())
}
