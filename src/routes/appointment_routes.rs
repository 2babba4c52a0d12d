// src/routes/appointment_routes.rs

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post, put},
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use std::str::FromStr;

use crate::{
    booking::{self, BookingRequest},
    error::ApiError,
    middleware::auth_context::AuthContext,
    models::{ApiResponse, Appointment, AppState, AppointmentStatus, Page},
    query::{QueryService, SearchSpec},
    store::{AppointmentStore, PgStore, into_domain},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/appointments/find-all", get(find_all))
        .route("/appointments/create", post(create))
        .route("/appointments/change-status/{id}", put(change_status))
        .route("/appointments/{id}", get(get_appointment))
}

/* ============================================================
   GET /appointments/find-all
   ============================================================ */

/// All params arrive as strings and are parsed by hand so a malformed
/// value gets the same {code, message, data} rejection as everything
/// else, instead of the framework's bare 400.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindAllQuery {
    /// 1-based, defaults to the first page.
    pub page: Option<String>,
    pub limit: Option<String>,
    pub keyword: Option<String>,
    pub status: Option<String>,
    pub date: Option<String>,
    pub username: Option<String>,
    pub specialist_name: Option<String>,
}

fn parse_param<T: FromStr>(name: &'static str, raw: Option<&str>) -> Result<Option<T>, ApiError> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<T>()
                .map_err(|_| ApiError::BadRequest("VALIDATION_ERROR", format!("{name} is invalid")))
        })
        .transpose()
}

pub async fn find_all(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(q): Query<FindAllQuery>,
) -> Result<Json<ApiResponse<Page<Appointment>>>, ApiError> {
    let page = parse_param::<i64>("page", q.page.as_deref())?.unwrap_or(1);
    let limit = parse_param::<i64>("limit", q.limit.as_deref())?.unwrap_or(5);
    let status = parse_param::<AppointmentStatus>("status", q.status.as_deref())?;
    let date = parse_param::<NaiveDate>("date", q.date.as_deref())?;

    let mut spec = SearchSpec::page_of(page, limit);
    spec.keyword = q.keyword.filter(|k| !k.trim().is_empty());
    spec.status = status;
    spec.date = date;
    // Plain users only ever see their own bookings, whatever the query
    // says; staff may search unscoped or filter freely.
    spec.username = booking::search_scope(&auth.actor(), q.username);
    spec.specialist_name = q.specialist_name;

    let service = QueryService::new(PgStore::new(state.db.clone()));
    let outcome = service.search(&spec).await?;
    Ok(Json(ApiResponse::ok(outcome.page)))
}

/* ============================================================
   POST /appointments/create
   ============================================================ */

pub async fn create(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(mut req): Json<BookingRequest>,
) -> Result<Json<ApiResponse<Appointment>>, ApiError> {
    req.username = booking::booking_username(&auth.actor(), &req.username)?;

    // All client-detectable violations are rejected here, before any
    // store call.
    let now = Local::now().naive_local();
    let new = booking::validate_create(&req, now)?;

    let store = PgStore::new(state.db.clone());
    let saved = into_domain(store.create(&new).await?)?;

    tracing::info!(
        id = saved.id,
        username = %saved.username,
        specialist = %saved.specialist_name,
        "appointment requested"
    );
    Ok(Json(ApiResponse::ok(saved)))
}

/* ============================================================
   PUT /appointments/change-status/{id}
   ============================================================ */

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

pub async fn change_status(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<i64>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<ApiResponse<Appointment>>, ApiError> {
    let target: AppointmentStatus = req
        .status
        .trim()
        .parse()
        .map_err(|e| ApiError::BadRequest("VALIDATION_ERROR", e))?;

    let store = PgStore::new(state.db.clone());
    let current = into_domain(store.find_by_id(id).await?)?;

    let target =
        booking::validate_transition(current.status, target, &auth.actor(), &current.username)?;

    let updated = into_domain(store.change_status(id, current.status, target).await?)?;

    tracing::info!(id, from = %current.status, to = %updated.status, "appointment status changed");
    Ok(Json(ApiResponse::ok(updated)))
}

/* ============================================================
   GET /appointments/{id}
   ============================================================ */

pub async fn get_appointment(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Appointment>>, ApiError> {
    let store = PgStore::new(state.db.clone());
    let appointment = into_domain(store.find_by_id(id).await?)?;

    if !auth.role.is_staff() && appointment.username != auth.username {
        return Err(ApiError::Forbidden(
            "FORBIDDEN",
            "users may only view their own appointments".into(),
        ));
    }

    Ok(Json(ApiResponse::ok(appointment)))
}
