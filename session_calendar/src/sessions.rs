//! Trading-day selection: all dates in a range minus the weekly pattern minus holidays.

use std::fmt;

use chrono::{Datelike, NaiveDate, Weekday};

use crate::holidays::HolidaySet;

/// Weekdays on which the market never trades.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct WeeklyPattern {
    // bit n set => Weekday with num_days_from_monday() == n is closed
    closed: u8,
}

impl WeeklyPattern {
    /// No recurring closures.
    pub const fn none() -> Self {
        Self { closed: 0 }
    }

    /// Saturday and Sunday closed.
    pub const fn saturday_sunday() -> Self {
        Self { closed: 0b110_0000 }
    }

    /// Pattern closing exactly the given weekdays.
    pub fn from_weekdays(days: impl IntoIterator<Item = Weekday>) -> Self {
        let mut p = Self::none();
        for day in days {
            p.closed |= 1 << day.num_days_from_monday();
        }
        p
    }

    /// Whether the market is closed every `day`.
    pub fn is_closed(&self, day: Weekday) -> bool {
        self.closed & (1 << day.num_days_from_monday()) != 0
    }

    /// Closed weekdays, Monday first.
    pub fn weekdays(&self) -> Vec<Weekday> {
        let mut out = Vec::new();
        let mut day = Weekday::Mon;
        for _ in 0..7 {
            if self.is_closed(day) {
                out.push(day);
            }
            day = day.succ();
        }
        out
    }
}

impl fmt::Debug for WeeklyPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.weekdays()).finish()
    }
}

/// Ordered trading days in `[start, end]`.
///
/// A date is a trading day unless its weekday is closed in `weekend` or it is in
/// `holidays`. An inverted or fully excluded range yields an empty vector.
pub fn trading_days(
    start: NaiveDate,
    end: NaiveDate,
    weekend: WeeklyPattern,
    holidays: &HolidaySet,
) -> Vec<NaiveDate> {
    if start > end {
        return Vec::new();
    }
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .filter(|d| !weekend.is_closed(d.weekday()) && !holidays.contains(*d))
        .collect()
}
