use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (users, cats, matches)");
        conn.execute_batch(
            "
            BEGIN;

            CREATE TABLE users (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                email       TEXT NOT NULL UNIQUE,
                name        TEXT NOT NULL,
                password    TEXT NOT NULL,
                created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );

            CREATE TABLE cats (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id         INTEGER NOT NULL REFERENCES users(id),
                name            TEXT NOT NULL,
                race            TEXT NOT NULL,
                sex             TEXT NOT NULL CHECK (sex IN ('male', 'female')),
                age_in_month    INTEGER NOT NULL,
                description     TEXT NOT NULL,
                image_urls      TEXT NOT NULL DEFAULT '[]',
                has_matched     INTEGER NOT NULL DEFAULT 0,
                created_at      TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
                updated_at      TEXT
            );

            CREATE INDEX idx_cats_user ON cats(user_id, created_at);
            CREATE INDEX idx_cats_created ON cats(created_at);

            CREATE TABLE matches (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id         INTEGER NOT NULL REFERENCES users(id),
                match_user_id   INTEGER NOT NULL REFERENCES users(id),
                match_cat_id    INTEGER NOT NULL REFERENCES cats(id) ON DELETE CASCADE,
                user_cat_id     INTEGER NOT NULL REFERENCES cats(id) ON DELETE CASCADE,
                message         TEXT NOT NULL,
                status          TEXT NOT NULL DEFAULT 'pending'
                                CHECK (status IN ('pending', 'approved', 'removed')),
                created_at      TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );

            CREATE INDEX idx_matches_user ON matches(user_id);
            CREATE INDEX idx_matches_match_user ON matches(match_user_id);
            CREATE INDEX idx_matches_match_cat ON matches(match_cat_id);
            CREATE INDEX idx_matches_user_cat ON matches(user_cat_id);

            INSERT INTO schema_version (version) VALUES (1);

            COMMIT;
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
