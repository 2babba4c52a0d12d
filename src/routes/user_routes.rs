// src/routes/user_routes.rs

use axum::{Json, Router, extract::State, routing::get};

use crate::{
    error::ApiError,
    middleware::auth_context::AuthContext,
    models::{ApiResponse, AppState, UserSummary},
    store::{AppointmentStore, PgStore, into_domain},
};

fn ensure_staff(auth: &AuthContext) -> Result<(), ApiError> {
    if auth.role.is_staff() {
        Ok(())
    } else {
        Err(ApiError::Forbidden(
            "FORBIDDEN",
            "Only admin/specialist can list users".into(),
        ))
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        // /api/v1/users/list-specialist
        .route("/list-specialist", get(list_specialists))
        // /api/v1/users/list-user
        .route("/list-user", get(list_users))
}

/// Any authenticated caller: the booking form needs the specialist roster.
pub async fn list_specialists(
    State(state): State<AppState>,
    _auth: AuthContext,
) -> Result<Json<ApiResponse<Vec<UserSummary>>>, ApiError> {
    let store = PgStore::new(state.db.clone());
    let specialists = into_domain(store.list_specialists().await?)?;
    Ok(Json(ApiResponse::ok(specialists)))
}

/// Staff only: the admin booking form books on behalf of any user.
pub async fn list_users(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<ApiResponse<Vec<UserSummary>>>, ApiError> {
    ensure_staff(&auth)?;
    let store = PgStore::new(state.db.clone());
    let users = into_domain(store.list_users().await?)?;
    Ok(Json(ApiResponse::ok(users)))
}
