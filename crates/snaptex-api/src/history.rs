//! History routes. Everything here is scoped to the current user; the store
//! itself takes an explicit owner so tests and future callers can widen that.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use tracing::warn;

use snaptex_db::models::HistoryRow;
use snaptex_types::api::{HistoryPage, HistoryQuery, UpdateLatexRequest};
use snaptex_types::models::HistoryRecord;

use crate::{internal, ApiError, AppState};

pub async fn list_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryPage>, ApiError> {
    let user = state.users.current_user();
    let page_size = query.page_size.clamp(1, 100);

    let (rows, total_count) = state
        .db
        .list_records(query.page, page_size, query.search.as_deref(), &user.id)
        .map_err(internal)?;

    Ok(Json(HistoryPage {
        records: rows.into_iter().map(to_record).collect(),
        total_count,
    }))
}

/// Commit an edited LaTeX value after the quiet period. Returns 202: the
/// write happens once the debounce delay elapses without a newer edit.
pub async fn update_latex(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateLatexRequest>,
) -> StatusCode {
    let db = state.db.clone();
    state.debouncer.schedule(id, move || {
        match db.update_latex(id, &req.latex) {
            Ok(true) => {}
            Ok(false) => warn!("latex edit for row {id} dropped: row no longer exists"),
            Err(e) => warn!("latex edit for row {id} failed: {e:#}"),
        }
    });
    StatusCode::ACCEPTED
}

pub async fn delete_record(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.db.delete_record(id).map_err(internal)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Clear the current user's history only.
pub async fn clear_history(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    let user = state.users.current_user();
    state.db.clear(&user.id).map_err(internal)?;
    Ok(StatusCode::NO_CONTENT)
}

fn to_record(row: HistoryRow) -> HistoryRecord {
    let timestamp = DateTime::parse_from_rfc3339(&row.timestamp)
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);

    HistoryRecord {
        id: row.id,
        timestamp,
        image_data: row.image_data,
        latex_result: row.latex_result,
        confidence: row.confidence,
        request_id: row.request_id,
        user_id: row.user_id,
    }
}
