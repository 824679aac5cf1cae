//! Reporting windows and metric evaluation context.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Hours worked assumed by the rate metrics when none is configured.
pub const DEFAULT_HOURS_WORKED: f64 = 100_000.0;

/// Half-open date range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// A window that cannot be built from the given bounds.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidWindow {
    #[error("window end {end} is before start {start}")]
    Inverted { start: NaiveDate, end: NaiveDate },

    #[error("a window of {days} days ending {end} starts before the earliest supported date")]
    OutOfRange { end: NaiveDate, days: u32 },
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, InvalidWindow> {
        if end < start {
            return Err(InvalidWindow::Inverted { start, end });
        }
        Ok(Self { start, end })
    }

    /// The `days` days before `end` (exclusive).
    ///
    /// # Errors
    ///
    /// [`InvalidWindow::OutOfRange`] when the start would fall before the
    /// earliest date `chrono` can represent.
    pub fn ending_at(end: NaiveDate, days: u32) -> Result<Self, InvalidWindow> {
        let start = end
            .checked_sub_signed(Duration::days(i64::from(days)))
            .ok_or(InvalidWindow::OutOfRange { end, days })?;
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }

    /// Absent dates fall outside every window.
    pub fn contains_opt(&self, date: Option<NaiveDate>) -> bool {
        date.is_some_and(|date| self.contains(date))
    }

    pub fn length_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

/// Everything a metric needs besides the records themselves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricContext {
    pub window: DateWindow,
    /// "Today" for elapsed-day metrics.
    pub as_of: NaiveDate,
    pub hours_worked: f64,
}

impl MetricContext {
    pub fn new(window: DateWindow, as_of: NaiveDate) -> Self {
        Self {
            window,
            as_of,
            hours_worked: DEFAULT_HOURS_WORKED,
        }
    }

    /// Context evaluated as of the window's end.
    pub fn at_window_end(window: DateWindow) -> Self {
        Self::new(window, window.end)
    }

    pub fn with_hours_worked(mut self, hours_worked: f64) -> Self {
        self.hours_worked = hours_worked;
        self
    }
}
