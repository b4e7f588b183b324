//! # Request handlers
//!
//! Login issues the session token; everything else is CRUD glue that only
//! runs once a gate has approved the request.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::auth::AuthContext;
use crate::auth::token::TOKEN_LIFETIME_SECS;
use crate::error::{ApiError, Result};
use crate::members::directory::MemberRecord;
use crate::server::AppState;

/// Login credentials.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Member username.
    pub username: String,
    /// Member password.
    pub password: String,
}

/// Successful login response.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// The signed session token.
    pub token: String,
    /// Always `Bearer`.
    pub token_type: &'static str,
    /// Token lifetime in seconds.
    pub expires_in: i64,
}

/// `POST /auth/login` — authenticate and issue a session token.
///
/// Bad credentials return the same generic 401 as a missing token; which
/// field was wrong is not disclosed.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let member = state
        .directory
        .authenticate(&request.username, &request.password)
        .ok_or(ApiError::Unauthenticated)?;

    let token = state
        .codec
        .issue(member.id, &member.username, member.permissions)?;
    tracing::info!(member_id = member.id, "member logged in");

    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer",
        expires_in: TOKEN_LIFETIME_SECS,
    }))
}

/// `GET /auth/me` — identity and permissions behind the current token.
pub async fn current_member(context: AuthContext) -> Json<AuthContext> {
    Json(context)
}

/// `GET /members` — list all members.
pub async fn list_members(State(state): State<AppState>) -> Json<Vec<MemberRecord>> {
    Json(state.directory.list())
}

/// New member data.
#[derive(Debug, Deserialize)]
pub struct CreateMemberRequest {
    /// Unique username.
    pub username: String,
    /// Initial password.
    pub password: String,
    /// Initial permission set.
    #[serde(default)]
    pub permissions: Vec<i32>,
}

/// `POST /members` — create a member.
pub async fn create_member(
    State(state): State<AppState>,
    Json(request): Json<CreateMemberRequest>,
) -> Result<(StatusCode, Json<MemberRecord>)> {
    let member = state.directory.insert(
        &request.username,
        &request.password,
        request.permissions,
    )?;
    tracing::info!(member_id = member.id, "member created");
    Ok((StatusCode::CREATED, Json(member)))
}

/// `GET /members/{id}` — member detail.
pub async fn get_member(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MemberRecord>> {
    let member = state.directory.get(id).ok_or(ApiError::MemberNotFound)?;
    Ok(Json(member))
}

/// Member update data.
#[derive(Debug, Deserialize)]
pub struct UpdateMemberRequest {
    /// New username.
    pub username: String,
}

/// `PATCH /members/{id}` — update a member's username.
pub async fn update_member(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<UpdateMemberRequest>,
) -> Result<Json<MemberRecord>> {
    let member = state.directory.rename(id, &request.username)?;
    tracing::info!(member_id = member.id, "member updated");
    Ok(Json(member))
}
