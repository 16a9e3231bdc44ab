use serde::{Deserialize, Serialize};

use crate::models::{HistoryRecord, User};

// -- Recognition --

/// Body of `POST /api/recognize` when the image comes from the drawing
/// canvas (the file-picker path uses multipart instead).
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecognizeRequest {
    /// Base64-encoded PNG.
    pub image: String,
}

/// Recognition outcome. Failure is a render state for the UI, not an HTTP
/// error, so both shapes share one envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct RecognizeResponse {
    pub status: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latex: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RecognizeResponse {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: false,
            record_id: None,
            latex: None,
            confidence: None,
            request_id: None,
            message: Some(message.into()),
        }
    }
}

// -- History --

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    pub search: Option<String>,
}

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    10
}

/// One page of history plus the total match count, so the client can do
/// pagination math (and clamp the page after deletes).
#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryPage {
    pub records: Vec<HistoryRecord>,
    pub total_count: u64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateLatexRequest {
    pub latex: String,
}

// -- Users --

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<User>,
    pub current_user_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddUserRequest {
    pub name: String,
    #[serde(default)]
    pub avatar: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SwitchUserRequest {
    pub id: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub avatar: Option<String>,
}

// -- Settings --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsDto {
    pub theme: String,
    pub locale: String,
    pub api_url: String,
    pub token: String,
}

/// Field-level validation failure, rendered inline by the settings form.
#[derive(Debug, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}
