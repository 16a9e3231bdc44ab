//! Account management routes: roster, add, switch, delete, profile edits.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use tracing::info;

use snaptex_types::api::{
    AddUserRequest, FieldError, SwitchUserRequest, UpdateProfileRequest, UserListResponse,
};

use crate::{invalid, ApiError, AppState};

pub async fn list_users(State(state): State<AppState>) -> Json<UserListResponse> {
    Json(UserListResponse {
        users: state.users.all_users(),
        current_user_id: state.users.current_user().id,
    })
}

pub async fn add_user(
    State(state): State<AppState>,
    Json(req): Json<AddUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(invalid("name", "username must not be empty"));
    }
    if req.password.is_empty() {
        return Err(invalid("password", "password must not be empty"));
    }

    let user = state.users.add_user(name, &req.avatar, &req.password);
    Ok((StatusCode::CREATED, Json(user)))
}

/// Switch the active account. The target's password must check out.
pub async fn switch_user(
    State(state): State<AppState>,
    Json(req): Json<SwitchUserRequest>,
) -> Result<StatusCode, ApiError> {
    let known = state.users.all_users().iter().any(|u| u.id == req.id);
    if !known {
        return Err((
            StatusCode::NOT_FOUND,
            Json(FieldError {
                field: "id",
                message: "no such user".to_string(),
            }),
        ));
    }

    if !state.users.verify_password(&req.id, &req.password) {
        info!("rejected switch to {}: wrong password", req.id);
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(FieldError {
                field: "password",
                message: "wrong password".to_string(),
            }),
        ));
    }

    // The store re-checks the id; a user deleted since the roster check
    // above surfaces here.
    if !state.users.set_current_user(&req.id) {
        return Err((
            StatusCode::NOT_FOUND,
            Json(FieldError {
                field: "id",
                message: "no such user".to_string(),
            }),
        ));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Refused for the active account and for the last remaining one.
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.users.delete_user(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((
            StatusCode::CONFLICT,
            Json(FieldError {
                field: "id",
                message: "cannot delete the active or last remaining user".to_string(),
            }),
        ))
    }
}

pub async fn update_profile(
    State(state): State<AppState>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(name) = &req.name {
        if name.trim().is_empty() {
            return Err(invalid("name", "username must not be empty"));
        }
    }

    state
        .users
        .update_current_user(req.name.as_deref().map(str::trim), req.avatar.as_deref());
    Ok(Json(state.users.current_user()))
}
