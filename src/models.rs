use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub session_ttl_hours: i64,
}

/* -------------------------
   Response envelope
--------------------------*/

/// Every endpoint (and every collaborator reply) is wrapped in this
/// envelope. `code == 200` means success; any other code is a domain
/// failure even when the transport said HTTP 200, and `message` carries
/// the human-readable reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            code: 200,
            message: None,
            data: Some(data),
        }
    }

    pub fn failure(code: i32, message: impl Into<String>) -> Self {
        ApiResponse {
            code,
            message: Some(message.into()),
            data: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == 200
    }
}

/* -------------------------
   Roles
--------------------------*/

/// Single role per account. Stored as TEXT in prevention_user.role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Specialist,
    User,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Specialist => "SPECIALIST",
            Role::User => "USER",
        }
    }

    /// Admin and specialist share the management surface (unscoped search,
    /// confirm/complete transitions). Plain users do not.
    pub fn is_staff(self) -> bool {
        matches!(self, Role::Admin | Role::Specialist)
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Role::Admin),
            "SPECIALIST" => Ok(Role::Specialist),
            "USER" => Ok(Role::User),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/* -------------------------
   Appointment status
--------------------------*/

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AppointmentStatus {
    Pending,
    Confirm,
    Complete,
    Cancel,
}

impl AppointmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "PENDING",
            AppointmentStatus::Confirm => "CONFIRM",
            AppointmentStatus::Complete => "COMPLETE",
            AppointmentStatus::Cancel => "CANCEL",
        }
    }

    /// CANCEL and COMPLETE have no outgoing transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, AppointmentStatus::Complete | AppointmentStatus::Cancel)
    }
}

impl FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(AppointmentStatus::Pending),
            "CONFIRM" => Ok(AppointmentStatus::Confirm),
            "COMPLETE" => Ok(AppointmentStatus::Complete),
            "CANCEL" => Ok(AppointmentStatus::Cancel),
            other => Err(format!("unknown appointment status: {other}")),
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/* -------------------------
   Appointment
--------------------------*/

/// A persisted appointment. `username`, `specialist_name`, `date` and
/// `hours` are write-once: a status change never touches them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: i64,
    pub username: String,
    pub specialist_name: String,
    pub date: NaiveDate,
    pub hours: NaiveTime,
    /// Minutes, always > 0.
    pub duration: i64,
    pub status: AppointmentStatus,
    /// Denormalized display fields, filled by the store from the user
    /// table, never by callers.
    pub user_full_name: Option<String>,
    pub specialist_fullname: Option<String>,
}

/// An appointment that has not been persisted yet. There is deliberately
/// no `id` field: the server assigns one on insert, so "no id yet" is a
/// type, not a sentinel value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAppointment {
    pub username: String,
    pub specialist_name: String,
    pub date: NaiveDate,
    pub hours: NaiveTime,
    pub duration: i64,
    pub status: AppointmentStatus,
}

/* -------------------------
   Paged results
--------------------------*/

/// One page of results. `number` echoes the requested 1-based page and
/// `size` the requested limit; the store never re-pages `content`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total_elements: i64,
    pub total_pages: i64,
    pub number: i64,
    pub size: i64,
}

impl<T> Page<T> {
    pub fn empty(number: i64, size: i64) -> Self {
        Page {
            content: vec![],
            total_elements: 0,
            total_pages: 0,
            number,
            size,
        }
    }
}

/* -------------------------
   User listing
--------------------------*/

/// Shared shape for `list-specialist` and `list-user` (the original
/// platform models specialists as ordinary users with a role).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub fullname: String,
    pub email: Option<String>,
    pub role: Role,
}

/* -------------------------
   DB Row Models
--------------------------*/

#[derive(Debug, sqlx::FromRow)]
pub struct UserRow {
    pub user_id: i64,
    pub username: String,
    pub fullname: String,
    pub password_hash: String,
    pub role: String,
    pub is_delete: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_wire_names() {
        for s in [
            AppointmentStatus::Pending,
            AppointmentStatus::Confirm,
            AppointmentStatus::Complete,
            AppointmentStatus::Cancel,
        ] {
            assert_eq!(s.as_str().parse::<AppointmentStatus>(), Ok(s));
            let json = serde_json::to_string(&s).unwrap();
            assert_eq!(json, format!("\"{}\"", s.as_str()));
        }
        assert!("pending".parse::<AppointmentStatus>().is_err());
    }

    #[test]
    fn terminal_statuses() {
        assert!(AppointmentStatus::Complete.is_terminal());
        assert!(AppointmentStatus::Cancel.is_terminal());
        assert!(!AppointmentStatus::Pending.is_terminal());
        assert!(!AppointmentStatus::Confirm.is_terminal());
    }

    #[test]
    fn envelope_code_is_authoritative() {
        let ok: ApiResponse<i32> = ApiResponse::ok(7);
        assert!(ok.is_success());
        let bad: ApiResponse<i32> = ApiResponse::failure(500, "boom");
        assert!(!bad.is_success());
        assert_eq!(bad.message.as_deref(), Some("boom"));
    }
}
