use crate::Database;
use crate::models::HistoryRow;
use anyhow::Result;
use chrono::Utc;
use rusqlite::params;
use tracing::debug;

impl Database {
    /// Insert a recognition, or — when `request_id` was seen before — refresh
    /// the existing row's payload and timestamp. Returns the row id either way.
    pub fn add_or_update_record(
        &self,
        image_data: &str,
        latex_result: &str,
        confidence: f64,
        request_id: &str,
        user_id: &str,
    ) -> Result<i64> {
        let timestamp = Utc::now().to_rfc3339();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO history (timestamp, image_data, latex_result, confidence, request_id, user_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(request_id) DO UPDATE SET
                     timestamp    = excluded.timestamp,
                     image_data   = excluded.image_data,
                     latex_result = excluded.latex_result,
                     confidence   = excluded.confidence,
                     user_id      = excluded.user_id",
                params![timestamp, image_data, latex_result, confidence, request_id, user_id],
            )?;

            let id: i64 = conn.query_row(
                "SELECT id FROM history WHERE request_id = ?1",
                [request_id],
                |row| row.get(0),
            )?;
            debug!("stored recognition {request_id} as row {id}");
            Ok(id)
        })
    }

    /// One page of a user's history, newest first, plus the total match count
    /// so callers can clamp the page after deletions. `page` is 1-based;
    /// `search_text` narrows to rows whose LaTeX contains it.
    pub fn list_records(
        &self,
        page: u32,
        page_size: u32,
        search_text: Option<&str>,
        user_id: &str,
    ) -> Result<(Vec<HistoryRow>, u64)> {
        let pattern = search_text.map(|s| format!("%{s}%"));
        let offset = u64::from(page.max(1) - 1) * u64::from(page_size);

        self.with_conn(|conn| {
            let (where_clause, params): (&str, Vec<&dyn rusqlite::types::ToSql>) = match &pattern {
                Some(p) => (
                    "WHERE user_id = ?1 AND latex_result LIKE ?2",
                    vec![&user_id, p],
                ),
                None => ("WHERE user_id = ?1", vec![&user_id]),
            };

            let total_count: u64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM history {where_clause}"),
                params.as_slice(),
                |row| row.get::<_, i64>(0),
            )? as u64;

            let mut stmt = conn.prepare(&format!(
                "SELECT id, timestamp, image_data, latex_result, confidence, request_id, user_id
                 FROM history {where_clause}
                 ORDER BY timestamp DESC, id DESC
                 LIMIT {page_size} OFFSET {offset}"
            ))?;

            let rows = stmt
                .query_map(params.as_slice(), |row| {
                    Ok(HistoryRow {
                        id: row.get(0)?,
                        timestamp: row.get(1)?,
                        image_data: row.get(2)?,
                        latex_result: row.get(3)?,
                        confidence: row.get(4)?,
                        request_id: row.get(5)?,
                        user_id: row.get(6)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok((rows, total_count))
        })
    }

    /// Overwrite a row's LaTeX after a manual edit. Returns false when the
    /// row no longer exists (deleted while the edit was pending).
    pub fn update_latex(&self, id: i64, latex: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE history SET latex_result = ?1 WHERE id = ?2",
                params![latex, id],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn delete_record(&self, id: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM history WHERE id = ?1", [id])?;
            Ok(())
        })
    }

    /// Drop every row owned by one user. Other users' history is untouched.
    pub fn clear(&self, user_id: &str) -> Result<()> {
        self.with_conn(|conn| {
            let removed = conn.execute("DELETE FROM history WHERE user_id = ?1", [user_id])?;
            debug!("cleared {removed} history rows for {user_id}");
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn empty_store_lists_nothing() {
        let db = db();
        let (rows, total) = db.list_records(1, 10, None, "default").unwrap();
        assert!(rows.is_empty());
        assert_eq!(total, 0);
    }

    #[test]
    fn insert_then_list() {
        let db = db();
        db.add_or_update_record("", "x^2", 0.95, "abc123", "default")
            .unwrap();

        let (rows, total) = db.list_records(1, 10, None, "default").unwrap();
        assert_eq!(total, 1);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].latex_result, "x^2");
        assert_eq!(rows[0].request_id, "abc123");
        assert_eq!(rows[0].user_id, "default");
    }

    #[test]
    fn upsert_is_idempotent_on_request_id() {
        let db = db();
        let first = db
            .add_or_update_record("", "x^2", 0.5, "req-1", "default")
            .unwrap();
        let second = db
            .add_or_update_record("", "x^3", 0.9, "req-1", "default")
            .unwrap();
        assert_eq!(first, second);

        let (rows, total) = db.list_records(1, 10, None, "default").unwrap();
        assert_eq!(total, 1);
        assert_eq!(rows[0].latex_result, "x^3");
        assert!((rows[0].confidence - 0.9).abs() < 1e-9);
    }

    #[test]
    fn pages_never_overlap() {
        let db = db();
        for i in 0..25 {
            db.add_or_update_record("", &format!("f_{i}"), 0.5, &format!("req-{i}"), "default")
                .unwrap();
        }

        let (page1, total) = db.list_records(1, 10, None, "default").unwrap();
        let (page2, _) = db.list_records(2, 10, None, "default").unwrap();
        assert_eq!(total, 25);
        assert_eq!(page1.len(), 10);
        assert_eq!(page2.len(), 10);

        for a in &page1 {
            assert!(page2.iter().all(|b| b.id != a.id));
        }

        // Last page holds the remainder.
        let (page3, _) = db.list_records(3, 10, None, "default").unwrap();
        assert_eq!(page3.len(), 5);
    }

    #[test]
    fn newest_first_ordering() {
        let db = db();
        db.add_or_update_record("", "first", 0.5, "r1", "default")
            .unwrap();
        db.add_or_update_record("", "second", 0.5, "r2", "default")
            .unwrap();

        let (rows, _) = db.list_records(1, 10, None, "default").unwrap();
        assert_eq!(rows[0].latex_result, "second");
        assert_eq!(rows[1].latex_result, "first");
    }

    #[test]
    fn search_filters_by_latex_substring() {
        let db = db();
        db.add_or_update_record("", "\\frac{a}{b}", 0.5, "r1", "default")
            .unwrap();
        db.add_or_update_record("", "x^2 + 1", 0.5, "r2", "default")
            .unwrap();

        let (rows, total) = db.list_records(1, 10, Some("frac"), "default").unwrap();
        assert_eq!(total, 1);
        assert_eq!(rows[0].request_id, "r1");

        let (_, none) = db.list_records(1, 10, Some("nothing"), "default").unwrap();
        assert_eq!(none, 0);
    }

    #[test]
    fn records_are_scoped_to_owner() {
        let db = db();
        db.add_or_update_record("", "mine", 0.5, "r1", "alice").unwrap();
        db.add_or_update_record("", "theirs", 0.5, "r2", "bob").unwrap();

        let (rows, total) = db.list_records(1, 10, None, "alice").unwrap();
        assert_eq!(total, 1);
        assert_eq!(rows[0].latex_result, "mine");

        db.clear("alice").unwrap();
        let (_, alice_total) = db.list_records(1, 10, None, "alice").unwrap();
        let (_, bob_total) = db.list_records(1, 10, None, "bob").unwrap();
        assert_eq!(alice_total, 0);
        assert_eq!(bob_total, 1);
    }

    #[test]
    fn update_latex_reports_row_presence() {
        let db = db();
        let id = db
            .add_or_update_record("", "x", 0.5, "r1", "default")
            .unwrap();

        assert!(db.update_latex(id, "y").unwrap());
        let (rows, _) = db.list_records(1, 10, None, "default").unwrap();
        assert_eq!(rows[0].latex_result, "y");

        db.delete_record(id).unwrap();
        assert!(!db.update_latex(id, "z").unwrap());
    }
}
