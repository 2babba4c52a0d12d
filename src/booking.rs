// src/booking.rs
//
// Booking Validator: pure accept/reject rules applied to a proposed
// creation or status change before anything touches the store. Both the
// client-facing booking flow and the admin management flow call the same
// functions here; there is no second copy of these rules anywhere.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Deserialize;

use crate::error::BookingError;
use crate::models::{AppointmentStatus, NewAppointment, Role};

/// The authenticated party asking for a create or a transition.
#[derive(Debug, Clone)]
pub struct Actor {
    pub username: String,
    pub role: Role,
}

impl Actor {
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Actor {
            username: username.into(),
            role,
        }
    }
}

/// Raw creation request as it arrives from a booking form. `date` and
/// `time` stay strings so every rejection, malformed input included, goes
/// through the validator and comes back in the standard envelope (and
/// because `time` must accept both `HH:MM` form inputs and `HH:MM:SS`
/// wire echoes).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub specialist_name: String,
    pub date: Option<String>,
    /// Accepts both the form-state name and the entity field name.
    #[serde(alias = "hours")]
    pub time: Option<String>,
    #[serde(default)]
    pub duration: i64,
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

/// Validate a creation request against `now` (local wall clock, no time
/// zone). On success returns the normalized payload, status forced to
/// PENDING, ready for the store. Performs no I/O.
pub fn validate_create(
    req: &BookingRequest,
    now: NaiveDateTime,
) -> Result<NewAppointment, BookingError> {
    let username = req.username.trim();
    if username.is_empty() {
        return Err(BookingError::MissingField("username"));
    }
    let specialist_name = req.specialist_name.trim();
    if specialist_name.is_empty() {
        return Err(BookingError::MissingField("specialistName"));
    }
    // An unparseable date or time is treated the same as an absent one.
    let date = non_empty(req.date.as_deref())
        .and_then(parse_date)
        .ok_or(BookingError::MissingField("date"))?;
    let hours = non_empty(req.time.as_deref())
        .and_then(parse_time)
        .ok_or(BookingError::MissingField("time"))?;

    if req.duration <= 0 {
        return Err(BookingError::InvalidDuration);
    }

    if date.and_time(hours) <= now {
        return Err(BookingError::PastOrPresentSchedule);
    }

    Ok(NewAppointment {
        username: username.to_string(),
        specialist_name: specialist_name.to_string(),
        date,
        hours,
        duration: req.duration,
        status: AppointmentStatus::Pending,
    })
}

/// Which requester a search may target. Staff pass their filter through
/// (including "no filter"); a plain user is always pinned to their own
/// username, whatever the query string said.
pub fn search_scope(actor: &Actor, requested: Option<String>) -> Option<String> {
    if actor.role.is_staff() {
        requested
    } else {
        Some(actor.username.clone())
    }
}

/// Who a creation request may be booked for. Staff book on behalf of
/// anyone; for a plain user an empty username means "me" and any other
/// name is refused.
pub fn booking_username(actor: &Actor, requested: &str) -> Result<String, BookingError> {
    let requested = requested.trim();
    if actor.role.is_staff() {
        return Ok(requested.to_string());
    }
    if requested.is_empty() || requested == actor.username {
        Ok(actor.username.clone())
    } else {
        Err(BookingError::Forbidden(
            "users may only book appointments for themselves".into(),
        ))
    }
}

/// The complete transition table. Everything not listed here, including
/// no-ops and anything out of a terminal state, is illegal for every role.
fn transition_allowed(from: AppointmentStatus, to: AppointmentStatus) -> bool {
    use AppointmentStatus::*;
    matches!(
        (from, to),
        (Pending, Confirm) | (Pending, Cancel) | (Confirm, Complete)
    )
}

/// Permission table keyed on (role, transition). Staff may perform any
/// legal transition; a plain user may only withdraw a pending request.
fn role_permits(role: Role, from: AppointmentStatus, to: AppointmentStatus) -> bool {
    use AppointmentStatus::*;
    match role {
        Role::Admin | Role::Specialist => true,
        Role::User => matches!((from, to), (Pending, Cancel)),
    }
}

/// Validate a status change requested by `actor` on an appointment owned
/// by `owner`. Legality is checked before role gating, so an admin asking
/// for COMPLETE→CONFIRM still gets `IllegalTransition`, not `Forbidden`.
pub fn validate_transition(
    current: AppointmentStatus,
    target: AppointmentStatus,
    actor: &Actor,
    owner: &str,
) -> Result<AppointmentStatus, BookingError> {
    if !transition_allowed(current, target) {
        return Err(BookingError::IllegalTransition {
            from: current,
            to: target,
        });
    }

    if !role_permits(actor.role, current, target) {
        return Err(BookingError::Forbidden(format!(
            "role {} may not change status from {current} to {target}",
            actor.role.as_str()
        )));
    }

    if actor.role == Role::User && actor.username != owner {
        return Err(BookingError::Forbidden(
            "users may only cancel their own appointments".into(),
        ));
    }

    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    const ALL: [AppointmentStatus; 4] = [
        AppointmentStatus::Pending,
        AppointmentStatus::Confirm,
        AppointmentStatus::Complete,
        AppointmentStatus::Cancel,
    ];

    fn req(duration: i64, date: NaiveDate, time: &str) -> BookingRequest {
        BookingRequest {
            username: "u1".into(),
            specialist_name: "s1".into(),
            date: Some(date.format("%Y-%m-%d").to_string()),
            time: Some(time.into()),
            duration,
        }
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 10)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn accepts_future_booking_and_normalizes_to_pending() {
        let tomorrow = now().date() + Duration::days(1);
        let out = validate_create(&req(30, tomorrow, "09:00"), now()).unwrap();
        assert_eq!(out.status, AppointmentStatus::Pending);
        assert_eq!(out.username, "u1");
        assert_eq!(out.specialist_name, "s1");
        assert_eq!(out.hours, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(out.duration, 30);
    }

    #[test]
    fn accepts_seconds_precision_time() {
        let tomorrow = now().date() + Duration::days(1);
        let out = validate_create(&req(45, tomorrow, "09:30:15"), now()).unwrap();
        assert_eq!(out.hours, NaiveTime::from_hms_opt(9, 30, 15).unwrap());
    }

    #[test]
    fn rejects_missing_fields() {
        let tomorrow = now().date() + Duration::days(1);

        let mut r = req(30, tomorrow, "09:00");
        r.username = "  ".into();
        assert!(matches!(
            validate_create(&r, now()),
            Err(BookingError::MissingField("username"))
        ));

        let mut r = req(30, tomorrow, "09:00");
        r.specialist_name = String::new();
        assert!(matches!(
            validate_create(&r, now()),
            Err(BookingError::MissingField("specialistName"))
        ));

        let mut r = req(30, tomorrow, "09:00");
        r.date = None;
        assert!(matches!(
            validate_create(&r, now()),
            Err(BookingError::MissingField("date"))
        ));

        let mut r = req(30, tomorrow, "09:00");
        r.time = None;
        assert!(matches!(
            validate_create(&r, now()),
            Err(BookingError::MissingField("time"))
        ));

        let r = req(30, tomorrow, "quarter past nine");
        assert!(matches!(
            validate_create(&r, now()),
            Err(BookingError::MissingField("time"))
        ));

        // Malformed dates are rejected through the validator like every
        // other bad input, not by the deserializer.
        let mut r = req(30, tomorrow, "09:00");
        r.date = Some("next tuesday".into());
        assert!(matches!(
            validate_create(&r, now()),
            Err(BookingError::MissingField("date"))
        ));
    }

    #[test]
    fn rejects_non_positive_duration() {
        let tomorrow = now().date() + Duration::days(1);
        for d in [0, -1, -30] {
            assert!(matches!(
                validate_create(&req(d, tomorrow, "09:00"), now()),
                Err(BookingError::InvalidDuration)
            ));
        }
    }

    #[test]
    fn rejects_past_and_present_instants() {
        let yesterday = now().date() - Duration::days(1);
        assert!(matches!(
            validate_create(&req(30, yesterday, "09:00"), now()),
            Err(BookingError::PastOrPresentSchedule)
        ));

        // Exactly now is rejected too: the instant must be strictly later.
        assert!(matches!(
            validate_create(&req(30, now().date(), "12:00"), now()),
            Err(BookingError::PastOrPresentSchedule)
        ));

        // One minute later the same day passes the temporal rule.
        assert!(validate_create(&req(30, now().date(), "12:01"), now()).is_ok());
    }

    #[test]
    fn only_the_three_forward_transitions_are_legal() {
        use AppointmentStatus::*;
        let admin = Actor::new("root", Role::Admin);
        for from in ALL {
            for to in ALL {
                let res = validate_transition(from, to, &admin, "u1");
                let legal = matches!((from, to), (Pending, Confirm) | (Pending, Cancel) | (Confirm, Complete));
                if legal {
                    assert_eq!(res.unwrap(), to);
                } else {
                    assert!(
                        matches!(res, Err(BookingError::IllegalTransition { .. })),
                        "{from} -> {to} should be illegal"
                    );
                }
            }
        }
    }

    #[test]
    fn no_op_transitions_are_illegal() {
        let admin = Actor::new("root", Role::Admin);
        for s in ALL {
            assert!(matches!(
                validate_transition(s, s, &admin, "u1"),
                Err(BookingError::IllegalTransition { .. })
            ));
        }
    }

    #[test]
    fn terminal_states_reject_everything_even_for_admins() {
        let admin = Actor::new("root", Role::Admin);
        assert!(matches!(
            validate_transition(
                AppointmentStatus::Complete,
                AppointmentStatus::Confirm,
                &admin,
                "u1"
            ),
            Err(BookingError::IllegalTransition { .. })
        ));
        assert!(matches!(
            validate_transition(
                AppointmentStatus::Cancel,
                AppointmentStatus::Pending,
                &admin,
                "u1"
            ),
            Err(BookingError::IllegalTransition { .. })
        ));
    }

    #[test]
    fn owner_may_cancel_their_pending_appointment() {
        let owner = Actor::new("u1", Role::User);
        let res = validate_transition(
            AppointmentStatus::Pending,
            AppointmentStatus::Cancel,
            &owner,
            "u1",
        );
        assert_eq!(res.unwrap(), AppointmentStatus::Cancel);
    }

    #[test]
    fn non_owner_user_may_not_cancel() {
        let stranger = Actor::new("u2", Role::User);
        assert!(matches!(
            validate_transition(
                AppointmentStatus::Pending,
                AppointmentStatus::Cancel,
                &stranger,
                "u1"
            ),
            Err(BookingError::Forbidden(_))
        ));
    }

    #[test]
    fn users_never_confirm_or_complete_even_their_own() {
        let owner = Actor::new("u1", Role::User);
        assert!(matches!(
            validate_transition(
                AppointmentStatus::Pending,
                AppointmentStatus::Confirm,
                &owner,
                "u1"
            ),
            Err(BookingError::Forbidden(_))
        ));
        assert!(matches!(
            validate_transition(
                AppointmentStatus::Confirm,
                AppointmentStatus::Complete,
                &owner,
                "u1"
            ),
            Err(BookingError::Forbidden(_))
        ));
    }

    #[test]
    fn search_is_always_scoped_to_a_plain_users_own_name() {
        let user = Actor::new("u1", Role::User);
        assert_eq!(search_scope(&user, None), Some("u1".to_string()));
        // A user asking for someone else's bookings still only gets their own.
        assert_eq!(
            search_scope(&user, Some("u2".into())),
            Some("u1".to_string())
        );

        let admin = Actor::new("root", Role::Admin);
        assert_eq!(search_scope(&admin, None), None);
        assert_eq!(
            search_scope(&admin, Some("u2".into())),
            Some("u2".to_string())
        );
    }

    #[test]
    fn plain_users_book_only_for_themselves() {
        let user = Actor::new("u1", Role::User);
        assert_eq!(booking_username(&user, "").unwrap(), "u1");
        assert_eq!(booking_username(&user, "u1").unwrap(), "u1");
        assert!(matches!(
            booking_username(&user, "u2"),
            Err(BookingError::Forbidden(_))
        ));

        let spec = Actor::new("s1", Role::Specialist);
        assert_eq!(booking_username(&spec, "u2").unwrap(), "u2");
    }

    #[test]
    fn specialist_may_confirm_and_complete_any_appointment() {
        let spec = Actor::new("s1", Role::Specialist);
        assert!(validate_transition(
            AppointmentStatus::Pending,
            AppointmentStatus::Confirm,
            &spec,
            "u1"
        )
        .is_ok());
        assert!(validate_transition(
            AppointmentStatus::Confirm,
            AppointmentStatus::Complete,
            &spec,
            "u1"
        )
        .is_ok());
    }
}
