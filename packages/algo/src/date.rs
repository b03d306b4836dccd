//! Calendar-day helpers and the clock seam
//!
//! Scheduling works on whole days. Dates are `NaiveDate` everywhere inside
//! the crate and only become `YYYY-MM-DD` strings at the edges.

use std::cell::Cell;
use std::rc::Rc;

use chrono::{DateTime, Days, Local, NaiveDate};

/// Boundary format for dates
pub const DAY_FORMAT: &str = "%Y-%m-%d";

/// Parse a boundary date string
///
/// Accepts `YYYY-MM-DD` and full RFC 3339 timestamps. A timestamp keeps the
/// calendar day of its own offset, so `2024-01-01T23:30:00-05:00` is
/// 2024-01-01.
pub fn parse_day(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    NaiveDate::parse_from_str(value, DAY_FORMAT)
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|ts| ts.date_naive())
        })
}

pub fn format_day(day: NaiveDate) -> String {
    day.format(DAY_FORMAT).to_string()
}

/// `day + days`, saturating at the largest representable date
pub fn add_days(day: NaiveDate, days: u32) -> NaiveDate {
    day.checked_add_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MAX)
}

// ==================== Clock ====================

/// Source of "today"
///
/// The scheduling core never reads wall-clock time except through this trait.
pub trait Clock {
    fn today(&self) -> NaiveDate;
}

/// Local calendar day of the host
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Manually driven clock for tests and replays
///
/// Clones share the same day, so a test can keep a handle after moving a
/// clone into a session.
#[derive(Debug, Clone)]
pub struct FixedClock {
    day: Rc<Cell<NaiveDate>>,
}

impl FixedClock {
    pub fn new(day: NaiveDate) -> Self {
        Self {
            day: Rc::new(Cell::new(day)),
        }
    }

    pub fn set(&self, day: NaiveDate) {
        self.day.set(day);
    }

    pub fn advance(&self, days: u32) {
        self.day.set(add_days(self.day.get(), days));
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.day.get()
    }
}
