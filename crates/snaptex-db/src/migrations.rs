use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

/// Schema migrations, keyed on `PRAGMA user_version`.
///
/// v1 is the pre-accounts schema; v2 adds the owning `user_id` column and
/// backfills existing rows with the default account. Databases written by
/// builds that predate the version marker still read as 0 and replay the
/// ladder; v1's DDL is idempotent so that is safe.
const MIGRATIONS: &[&str] = &[
    // v1: base history table
    "
    CREATE TABLE IF NOT EXISTS history (
        id              INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp       TEXT NOT NULL,
        image_data      TEXT NOT NULL,
        latex_result    TEXT NOT NULL,
        confidence      REAL NOT NULL,
        request_id      TEXT NOT NULL UNIQUE
    );
    ",
    // v2: per-user ownership
    "
    ALTER TABLE history ADD COLUMN user_id TEXT NOT NULL DEFAULT 'default';

    CREATE INDEX IF NOT EXISTS idx_history_user_time
        ON history(user_id, timestamp);
    ",
];

pub fn run(conn: &Connection) -> Result<()> {
    let version: usize =
        conn.query_row("PRAGMA user_version", [], |row| row.get::<_, i64>(0))? as usize;

    if version >= MIGRATIONS.len() {
        return Ok(());
    }

    for (i, sql) in MIGRATIONS.iter().enumerate().skip(version) {
        conn.execute_batch(sql)?;
        conn.pragma_update(None, "user_version", (i + 1) as i64)?;
        info!("applied schema migration v{}", i + 1);
    }

    Ok(())
}
