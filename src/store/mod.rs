// src/store/mod.rs
//
// The persistence collaborator the booking core talks to. Every operation
// answers with the {code, message, data} envelope; a transport-level
// problem is the Err side, a non-200 envelope code is a domain failure
// reported by the collaborator itself.

use async_trait::async_trait;

use crate::error::BookingError;
use crate::models::{ApiResponse, Appointment, AppointmentStatus, NewAppointment, Page, UserSummary};
use crate::query::SearchSpec;

pub mod postgres;

pub use postgres::PgStore;

#[async_trait]
pub trait AppointmentStore: Send + Sync {
    async fn find_all(&self, spec: &SearchSpec)
        -> Result<ApiResponse<Page<Appointment>>, BookingError>;

    async fn find_by_id(&self, id: i64) -> Result<ApiResponse<Appointment>, BookingError>;

    async fn create(&self, new: &NewAppointment) -> Result<ApiResponse<Appointment>, BookingError>;

    async fn change_status(
        &self,
        id: i64,
        current: AppointmentStatus,
        target: AppointmentStatus,
    ) -> Result<ApiResponse<Appointment>, BookingError>;

    async fn list_specialists(&self) -> Result<ApiResponse<Vec<UserSummary>>, BookingError>;

    async fn list_users(&self) -> Result<ApiResponse<Vec<UserSummary>>, BookingError>;
}

/// Collapse an envelope into the payload, treating the envelope `code` as
/// authoritative: non-200 becomes `QueryFailed` carrying the collaborator's
/// message even if the transport itself succeeded.
pub fn into_domain<T>(envelope: ApiResponse<T>) -> Result<T, BookingError> {
    if !envelope.is_success() {
        return Err(BookingError::QueryFailed {
            code: envelope.code,
            message: envelope
                .message
                .unwrap_or_else(|| "collaborator reported failure".into()),
        });
    }
    envelope
        .data
        .ok_or_else(|| BookingError::Transport("success envelope with no data".into()))
}
