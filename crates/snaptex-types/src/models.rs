use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Public user shape handed to the UI. Credential material (hash, salt)
/// never leaves the user store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    /// Path of the avatar image, relative to the data directory.
    pub avatar: String,
}

/// One recognition kept in history. `image_data` is the base64-encoded PNG
/// that was submitted for recognition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub image_data: String,
    pub latex_result: String,
    pub confidence: f64,
    pub request_id: String,
    pub user_id: String,
}
