//! HTTP surface of the app: route handlers, shared state, the settings
//! store and the edit debouncer.

pub mod debounce;
pub mod events;
pub mod history;
pub mod recognize;
pub mod settings;
pub mod users;

use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::http::StatusCode;

use snaptex_db::Database;
use snaptex_types::api::FieldError;
use snaptex_users::UserStore;

use crate::debounce::LatexDebouncer;
use crate::settings::SettingsStore;

/// Quiet period after a manual LaTeX edit before it is written through.
pub const EDIT_DEBOUNCE: Duration = Duration::from_millis(500);

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub users: UserStore,
    pub db: Arc<Database>,
    pub settings: SettingsStore,
    pub http: reqwest::Client,
    pub debouncer: LatexDebouncer,
}

impl AppStateInner {
    pub fn new(users: UserStore, db: Database, settings: SettingsStore) -> AppState {
        Arc::new(Self {
            users,
            db: Arc::new(db),
            settings,
            http: reqwest::Client::new(),
            debouncer: LatexDebouncer::new(EDIT_DEBOUNCE),
        })
    }
}

/// Error shape shared by every handler: a status plus a field-level message
/// the UI renders inline.
pub type ApiError = (StatusCode, Json<FieldError>);

pub(crate) fn invalid(field: &'static str, message: impl Into<String>) -> ApiError {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(FieldError {
            field,
            message: message.into(),
        }),
    )
}

pub(crate) fn internal(err: anyhow::Error) -> ApiError {
    tracing::error!("internal error: {err:#}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(FieldError {
            field: "",
            message: "internal error".to_string(),
        }),
    )
}
