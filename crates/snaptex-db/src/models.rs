//! Database row types — these map directly to SQLite rows.
//! Distinct from the snaptex-types API models to keep the DB layer independent.

pub struct HistoryRow {
    pub id: i64,
    /// RFC 3339 text, as written by `add_or_update_record`.
    pub timestamp: String,
    /// Base64-encoded PNG.
    pub image_data: String,
    pub latex_result: String,
    pub confidence: f64,
    pub request_id: String,
    pub user_id: String,
}
