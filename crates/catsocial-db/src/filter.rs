use catsocial_types::models::{AgeComparison, Race, Sex};
use rusqlite::types::Value;

/// Filters for the cat listing. Every set field adds one `AND` clause; all
/// values are bound as parameters.
#[derive(Debug, Clone, Default)]
pub struct CatFilter {
    pub id: Option<i64>,
    pub owner_id: Option<i64>,
    pub race: Option<Race>,
    pub sex: Option<Sex>,
    pub has_matched: Option<bool>,
    pub age: Option<AgeComparison>,
    /// Case-insensitive substring of the cat name.
    pub search: Option<String>,
    /// `None` means no limit.
    pub limit: Option<u32>,
    pub offset: u32,
}

/// SQL text plus its positional parameters, in order.
#[derive(Debug)]
pub(crate) struct BoundQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

impl CatFilter {
    pub(crate) fn select(&self, columns: &str) -> BoundQuery {
        let mut clauses: Vec<&'static str> = Vec::new();
        let mut params: Vec<Value> = Vec::new();

        if let Some(owner_id) = self.owner_id {
            clauses.push("user_id = ?");
            params.push(Value::Integer(owner_id));
        }
        if let Some(id) = self.id {
            clauses.push("id = ?");
            params.push(Value::Integer(id));
        }
        if let Some(race) = self.race {
            clauses.push("race = ?");
            params.push(Value::Text(race.as_str().to_string()));
        }
        if let Some(sex) = self.sex {
            clauses.push("sex = ?");
            params.push(Value::Text(sex.as_str().to_string()));
        }
        if let Some(has_matched) = self.has_matched {
            clauses.push("has_matched = ?");
            params.push(Value::Integer(has_matched as i64));
        }
        if let Some(age) = self.age {
            clauses.push(match age {
                AgeComparison::Equal(_) => "age_in_month = ?",
                AgeComparison::AtMost(_) => "age_in_month <= ?",
                AgeComparison::AtLeast(_) => "age_in_month >= ?",
            });
            params.push(Value::Integer(age.months()));
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            clauses.push("name LIKE ? ESCAPE '\\'");
            params.push(Value::Text(format!("%{}%", escape_like(search))));
        }

        let mut sql = format!("SELECT {columns} FROM cats");
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?");

        // SQLite treats a negative LIMIT as unbounded
        params.push(Value::Integer(self.limit.map_or(-1, i64::from)));
        params.push(Value::Integer(i64::from(self.offset)));

        BoundQuery { sql, params }
    }
}

fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}
