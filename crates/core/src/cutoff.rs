//! Point-in-time cutoff for historical "as of" queries.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Cutoff policy selecting which records are visible to a query.
///
/// The same value serves two consumers:
///
/// - [`Cutoff::contains`] — calendar *membership* (a sale on 2024-03-15
///   belongs to `Month { 2024, 3 }`), used by period reporting.
/// - [`Cutoff::visible_as_of`] — the *snapshot* predicate (everything up to
///   the end of the selected period), used for inventory valuation. For
///   `Range`, only the end bound matters here; stock "as of" a date is
///   cumulative over all history before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cutoff {
    /// Unbounded: the live view over all history.
    All,
    /// A single calendar day.
    Day(NaiveDate),
    /// A calendar month.
    Month { year: i32, month: u32 },
    /// A calendar year.
    Year(i32),
    /// An inclusive calendar date range. Absent bounds are unbounded on
    /// that side; in particular a missing end date behaves like [`Cutoff::All`]
    /// rather than rejecting the query.
    Range {
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    },
}

fn day_start(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

impl Cutoff {
    /// Whether a timestamp falls inside the cutoff period (calendar
    /// membership, inclusive on both ends for `Range`).
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        match *self {
            Cutoff::All => true,
            Cutoff::Day(day) => at.date_naive() == day,
            Cutoff::Month { year, month } => at.year() == year && at.month() == month,
            Cutoff::Year(year) => at.year() == year,
            Cutoff::Range { start, end } => {
                let day = at.date_naive();
                start.is_none_or(|s| day >= s) && end.is_none_or(|e| day <= e)
            }
        }
    }

    /// Exclusive upper bound of the cutoff period, or `None` when unbounded.
    ///
    /// The bound is the first instant *after* the period, so `at < bound`
    /// is the inclusive "on or before the period's last day" test.
    pub fn upper_bound(&self) -> Option<DateTime<Utc>> {
        match *self {
            Cutoff::All => None,
            Cutoff::Day(day) => day.succ_opt().map(day_start),
            Cutoff::Month { year, month } => {
                let (next_year, next_month) = if month >= 12 {
                    (year + 1, 1)
                } else {
                    (year, month + 1)
                };
                NaiveDate::from_ymd_opt(next_year, next_month, 1).map(day_start)
            }
            Cutoff::Year(year) => NaiveDate::from_ymd_opt(year + 1, 1, 1).map(day_start),
            Cutoff::Range { end, .. } => end.and_then(|e| e.succ_opt()).map(day_start),
        }
    }

    /// Snapshot visibility: whether a record timestamped `at` is part of
    /// the inventory state "as of" this cutoff.
    pub fn visible_as_of(&self, at: DateTime<Utc>) -> bool {
        match self.upper_bound() {
            Some(bound) => at < bound,
            None => true,
        }
    }
}

impl Default for Cutoff {
    fn default() -> Self {
        Cutoff::All
    }
}
