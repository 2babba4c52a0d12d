// src/store/postgres.rs

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::error::BookingError;
use crate::models::{
    ApiResponse, Appointment, AppointmentStatus, NewAppointment, Page, Role, UserSummary,
};
use crate::query::SearchSpec;
use crate::store::AppointmentStore;

/// sqlx-backed collaborator. Domain-level rejections (unknown users,
/// lost-update conflicts, missing rows) come back as non-200 envelopes;
/// only genuine database trouble becomes `BookingError::Transport`.
#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        PgStore { db }
    }

    async fn user_exists(&self, username: &str, role: Option<Role>) -> Result<bool, BookingError> {
        let found: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT user_id
            FROM prevention_user
            WHERE username = $1
              AND is_delete = FALSE
              AND ($2::text IS NULL OR role = $2)
            "#,
        )
        .bind(username)
        .bind(role.map(Role::as_str))
        .fetch_optional(&self.db)
        .await?;
        Ok(found.is_some())
    }
}

fn decode_appointment(row: &PgRow) -> Result<Appointment, BookingError> {
    let status_raw: String = row.try_get("status").map_err(decode_err)?;
    let status: AppointmentStatus = status_raw
        .parse()
        .map_err(BookingError::Transport)?;

    Ok(Appointment {
        id: row.try_get("id").map_err(decode_err)?,
        username: row.try_get("username").map_err(decode_err)?,
        specialist_name: row.try_get("specialist_name").map_err(decode_err)?,
        date: row.try_get::<NaiveDate, _>("date").map_err(decode_err)?,
        hours: row.try_get::<NaiveTime, _>("hours").map_err(decode_err)?,
        duration: row.try_get("duration").map_err(decode_err)?,
        status,
        user_full_name: row.try_get("user_full_name").map_err(decode_err)?,
        specialist_fullname: row.try_get("specialist_fullname").map_err(decode_err)?,
    })
}

fn decode_user(row: &PgRow) -> Result<UserSummary, BookingError> {
    let role_raw: String = row.try_get("role").map_err(decode_err)?;
    let role: Role = role_raw.parse().map_err(BookingError::Transport)?;

    Ok(UserSummary {
        id: row.try_get("user_id").map_err(decode_err)?,
        username: row.try_get("username").map_err(decode_err)?,
        fullname: row.try_get("fullname").map_err(decode_err)?,
        email: row.try_get("email").map_err(decode_err)?,
        role,
    })
}

fn decode_err(e: sqlx::Error) -> BookingError {
    BookingError::Transport(format!("row decode error: {e}"))
}

const APPOINTMENT_COLUMNS: &str = r#"
    a.id,
    a.username,
    a.specialist_name,
    a.date,
    a.hours,
    a.duration,
    a.status,
    u.fullname AS user_full_name,
    s.fullname AS specialist_fullname
"#;

// Shared by the page query and the count query; the bind order
// ($1 username, $2 specialist, $3 keyword, $4 status, $5 date) must match
// at both call sites.
const SEARCH_FILTERS: &str = r#"
    u.is_delete = FALSE
    AND s.is_delete = FALSE
    AND ($1::text IS NULL OR a.username = $1)
    AND ($2::text IS NULL OR a.specialist_name = $2)
    AND ($3::text IS NULL
         OR a.username ILIKE '%' || $3 || '%'
         OR a.specialist_name ILIKE '%' || $3 || '%'
         OR u.fullname ILIKE '%' || $3 || '%'
         OR s.fullname ILIKE '%' || $3 || '%')
    AND ($4::text IS NULL OR a.status = $4)
    AND ($5::date IS NULL OR a.date = $5)
"#;

fn total_pages(total_elements: i64, limit: i64) -> i64 {
    if total_elements == 0 {
        0
    } else {
        (total_elements + limit - 1) / limit
    }
}

#[async_trait]
impl AppointmentStore for PgStore {
    async fn find_all(
        &self,
        spec: &SearchSpec,
    ) -> Result<ApiResponse<Page<Appointment>>, BookingError> {
        // page/limit arrive pre-translated (1-based) and are used verbatim.
        // The count runs as its own query so a page past the end still
        // reports the true totals, not an empty-page zero.
        let sql = format!(
            r#"
            SELECT {APPOINTMENT_COLUMNS}
            FROM appointment a
            JOIN prevention_user u ON u.username = a.username
            JOIN prevention_user s ON s.username = a.specialist_name
            WHERE {SEARCH_FILTERS}
            ORDER BY a.date DESC, a.hours DESC, a.id DESC
            LIMIT $6 OFFSET $7
            "#
        );

        let rows = sqlx::query(&sql)
            .bind(spec.username.as_deref())
            .bind(spec.specialist_name.as_deref())
            .bind(spec.keyword.as_deref())
            .bind(spec.status.map(AppointmentStatus::as_str))
            .bind(spec.date)
            .bind(spec.limit)
            .bind(spec.page.sql_offset(spec.limit))
            .fetch_all(&self.db)
            .await?;

        let count_sql = format!(
            r#"
            SELECT COUNT(*)
            FROM appointment a
            JOIN prevention_user u ON u.username = a.username
            JOIN prevention_user s ON s.username = a.specialist_name
            WHERE {SEARCH_FILTERS}
            "#
        );

        let total_elements: i64 = sqlx::query_scalar(&count_sql)
            .bind(spec.username.as_deref())
            .bind(spec.specialist_name.as_deref())
            .bind(spec.keyword.as_deref())
            .bind(spec.status.map(AppointmentStatus::as_str))
            .bind(spec.date)
            .fetch_one(&self.db)
            .await?;

        let content = rows
            .iter()
            .map(decode_appointment)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ApiResponse::ok(Page {
            content,
            total_elements,
            total_pages: total_pages(total_elements, spec.limit),
            number: spec.page.get(),
            size: spec.limit,
        }))
    }

    async fn find_by_id(&self, id: i64) -> Result<ApiResponse<Appointment>, BookingError> {
        let sql = format!(
            r#"
            SELECT {APPOINTMENT_COLUMNS}
            FROM appointment a
            JOIN prevention_user u ON u.username = a.username
            JOIN prevention_user s ON s.username = a.specialist_name
            WHERE a.id = $1
            "#
        );

        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.db).await?;

        match row {
            Some(row) => Ok(ApiResponse::ok(decode_appointment(&row)?)),
            None => Ok(ApiResponse::failure(404, format!("appointment {id} not found"))),
        }
    }

    async fn create(&self, new: &NewAppointment) -> Result<ApiResponse<Appointment>, BookingError> {
        if !self.user_exists(&new.username, None).await? {
            return Ok(ApiResponse::failure(
                404,
                format!("user {} not found", new.username),
            ));
        }
        if !self
            .user_exists(&new.specialist_name, Some(Role::Specialist))
            .await?
        {
            return Ok(ApiResponse::failure(
                404,
                format!("specialist {} not found", new.specialist_name),
            ));
        }

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO appointment (username, specialist_name, date, hours, duration, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(&new.username)
        .bind(&new.specialist_name)
        .bind(new.date)
        .bind(new.hours)
        .bind(new.duration)
        .bind(new.status.as_str())
        .fetch_one(&self.db)
        .await?;

        self.find_by_id(id).await
    }

    async fn change_status(
        &self,
        id: i64,
        current: AppointmentStatus,
        target: AppointmentStatus,
    ) -> Result<ApiResponse<Appointment>, BookingError> {
        // Guarded update: the row must still be in the status the caller
        // validated against, otherwise a concurrent change won the race.
        let updated = sqlx::query(
            r#"
            UPDATE appointment
            SET status = $3, updated_at = now()
            WHERE id = $1 AND status = $2
            "#,
        )
        .bind(id)
        .bind(current.as_str())
        .bind(target.as_str())
        .execute(&self.db)
        .await?;

        if updated.rows_affected() == 0 {
            let exists: Option<i64> =
                sqlx::query_scalar(r#"SELECT id FROM appointment WHERE id = $1"#)
                    .bind(id)
                    .fetch_optional(&self.db)
                    .await?;
            return Ok(match exists {
                Some(_) => ApiResponse::failure(
                    409,
                    format!("appointment {id} is no longer {current}"),
                ),
                None => ApiResponse::failure(404, format!("appointment {id} not found")),
            });
        }

        self.find_by_id(id).await
    }

    async fn list_specialists(&self) -> Result<ApiResponse<Vec<UserSummary>>, BookingError> {
        let rows = sqlx::query(
            r#"
            SELECT user_id, username, fullname, email, role
            FROM prevention_user
            WHERE role = 'SPECIALIST' AND is_delete = FALSE
            ORDER BY fullname ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        let users = rows.iter().map(decode_user).collect::<Result<Vec<_>, _>>()?;
        Ok(ApiResponse::ok(users))
    }

    async fn list_users(&self) -> Result<ApiResponse<Vec<UserSummary>>, BookingError> {
        let rows = sqlx::query(
            r#"
            SELECT user_id, username, fullname, email, role
            FROM prevention_user
            WHERE role = 'USER' AND is_delete = FALSE
            ORDER BY fullname ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        let users = rows.iter().map(decode_user).collect::<Result<Vec<_>, _>>()?;
        Ok(ApiResponse::ok(users))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_reflects_true_count_even_for_an_empty_page() {
        // The count query is independent of the requested page, so a page
        // past the end still reports the real totals.
        assert_eq!(total_pages(15, 10), 2);
        assert_eq!(total_pages(20, 10), 2);
        assert_eq!(total_pages(21, 10), 3);
        assert_eq!(total_pages(1, 10), 1);
        assert_eq!(total_pages(0, 10), 0);
    }
}
