use axum::{Json, Router, extract::State, routing::get};

use crate::error::ApiError;
use crate::middleware::auth_context::AuthContext;
use crate::models::{ApiResponse, AppState, Role};

#[derive(serde::Serialize)]
pub struct HomeData {
    pub view: String,
    pub username: String,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/home", get(home))
}

/// Role-tagged landing payload so the frontend can pick the client or the
/// admin shell without a second request.
pub async fn home(
    State(_state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<ApiResponse<HomeData>>, ApiError> {
    let view = match auth.role {
        Role::Admin | Role::Specialist => "admin",
        Role::User => "client",
    };

    Ok(Json(ApiResponse::ok(HomeData {
        view: view.to_string(),
        username: auth.username,
    })))
}
