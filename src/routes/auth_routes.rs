// src/routes/auth_routes.rs
//
// Opaque session provider: login issues a bearer token (only its hash is
// stored), AuthContext resolves it back to username + role on every
// request. The booking core never sees any of this.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    auth::{generate_access_token, hash_access_token, verify_password},
    error::ApiError,
    middleware::auth_context::AuthContext,
    models::{ApiResponse, AppState, Role, UserRow},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/me", get(me))
        .route("/logout", post(logout))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
    pub user: ProfileData,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileData {
    pub username: String,
    pub fullname: String,
    pub role: Role,
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginData>>, ApiError> {
    let username = req.username.trim();
    if username.is_empty() || req.password.is_empty() {
        return Err(ApiError::BadRequest(
            "VALIDATION_ERROR",
            "username and password are required".into(),
        ));
    }

    let user: UserRow = sqlx::query_as::<_, UserRow>(
        r#"
        SELECT user_id, username, fullname, password_hash, role, is_delete
        FROM prevention_user
        WHERE username = $1
        "#,
    )
    .bind(username)
    .fetch_optional(&state.db)
    .await
    .map_err(|e| ApiError::Internal(format!("db error: {e}")))?
    .ok_or_else(ApiError::invalid_credentials)?;

    if user.is_delete {
        return Err(ApiError::Forbidden("FORBIDDEN", "Account is disabled".into()));
    }
    if !verify_password(&req.password, &user.password_hash) {
        return Err(ApiError::invalid_credentials());
    }

    let role: Role = user.role.parse().map_err(ApiError::Internal)?;

    let access_token = generate_access_token();
    let expires_at = Utc::now() + Duration::hours(state.session_ttl_hours);

    sqlx::query(
        r#"
        INSERT INTO session_token (user_id, session_token_hash, expires_at)
        VALUES ($1, $2, $3)
        "#,
    )
    .bind(user.user_id)
    .bind(hash_access_token(&access_token))
    .bind(expires_at)
    .execute(&state.db)
    .await
    .map_err(|e| ApiError::Internal(format!("db error: {e}")))?;

    tracing::info!(username = %user.username, "login");

    Ok(Json(ApiResponse::ok(LoginData {
        access_token,
        expires_at,
        user: ProfileData {
            username: user.username,
            fullname: user.fullname,
            role,
        },
    })))
}

pub async fn me(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<ApiResponse<ProfileData>>, ApiError> {
    let fullname: String = sqlx::query_scalar(
        r#"
        SELECT fullname FROM prevention_user WHERE user_id = $1
        "#,
    )
    .bind(auth.user_id)
    .fetch_one(&state.db)
    .await
    .map_err(|e| ApiError::Internal(format!("db error: {e}")))?;

    Ok(Json(ApiResponse::ok(ProfileData {
        username: auth.username,
        fullname,
        role: auth.role,
    })))
}

#[derive(Debug, Serialize)]
pub struct OkData {
    pub ok: bool,
}

pub async fn logout(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<ApiResponse<OkData>>, ApiError> {
    sqlx::query(
        r#"
        UPDATE session_token
        SET revoked_at = now()
        WHERE session_token_id = $1 AND revoked_at IS NULL
        "#,
    )
    .bind(auth.session_token_id)
    .execute(&state.db)
    .await
    .map_err(|e| ApiError::Internal(format!("db error: {e}")))?;

    Ok(Json(ApiResponse::ok(OkData { ok: true })))
}
