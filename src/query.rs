// src/query.rs
//
// Query/pagination contract shared by the "my appointments" and the admin
// "all appointments" views. Pages are 1-based everywhere inside this
// crate; the only place a 0-based index may enter or leave is through
// `PageNumber::from_zero_based` / `PageNumber::zero_based`.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::NaiveDate;

use crate::error::BookingError;
use crate::models::{Appointment, AppointmentStatus, Page};
use crate::store::{into_domain, AppointmentStore};

/// 1-based page index. Constructors clamp to 1 so a stray `page=0` from a
/// client behaves like the first page instead of underflowing the offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageNumber(i64);

impl PageNumber {
    pub const FIRST: PageNumber = PageNumber(1);

    pub fn new(one_based: i64) -> Self {
        PageNumber(one_based.max(1))
    }

    /// Translation point for 0-based surfaces (e.g. table widgets).
    pub fn from_zero_based(zero_based: i64) -> Self {
        PageNumber::new(zero_based + 1)
    }

    pub fn get(self) -> i64 {
        self.0
    }

    pub fn zero_based(self) -> i64 {
        self.0 - 1
    }

    /// Saturates instead of overflowing: an absurdly large page from a
    /// client yields an offset past every row, i.e. an empty page.
    pub fn sql_offset(self, limit: i64) -> i64 {
        self.zero_based().saturating_mul(limit)
    }
}

impl Default for PageNumber {
    fn default() -> Self {
        PageNumber::FIRST
    }
}

/// Search specification. `page` and `limit` are forwarded to the store
/// untouched; all filters are optional and combined with AND.
#[derive(Debug, Clone, Default)]
pub struct SearchSpec {
    pub page: PageNumber,
    pub limit: i64,
    /// Substring match against usernames and full names on both sides of
    /// the appointment.
    pub keyword: Option<String>,
    pub status: Option<AppointmentStatus>,
    /// Exact-day filter.
    pub date: Option<NaiveDate>,
    /// Restrict to one requester's appointments.
    pub username: Option<String>,
    pub specialist_name: Option<String>,
}

impl SearchSpec {
    pub fn page_of(page: i64, limit: i64) -> Self {
        SearchSpec {
            page: PageNumber::new(page),
            limit: limit.max(1),
            ..SearchSpec::default()
        }
    }
}

/// One resolved search, tagged with the generation counter that was
/// current when the request started.
#[derive(Debug)]
pub struct SearchOutcome {
    pub page: Page<Appointment>,
    pub generation: u64,
}

/// Thin service over the store: forwards the spec, checks the envelope,
/// and never re-pages or re-filters what came back. The generation counter
/// is for long-lived holders of a service (a view issuing overlapping
/// searches that can resolve out of order, keeping only outcomes for which
/// `is_current` still holds); the request handlers here build a fresh
/// service per request and never race against themselves.
pub struct QueryService<S> {
    store: S,
    generation: AtomicU64,
}

impl<S: AppointmentStore> QueryService<S> {
    pub fn new(store: S) -> Self {
        QueryService {
            store,
            generation: AtomicU64::new(0),
        }
    }

    pub async fn search(&self, spec: &SearchSpec) -> Result<SearchOutcome, BookingError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let envelope = self.store.find_all(spec).await?;
        let page = into_domain(envelope)?;
        Ok(SearchOutcome { page, generation })
    }

    /// True when no newer search has been started since this outcome.
    pub fn is_current(&self, outcome: &SearchOutcome) -> bool {
        outcome.generation == self.generation.load(Ordering::SeqCst)
    }
}
