//! Per-session boundary instants and the schedule table built from them.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use indexmap::IndexMap;
use serde::Serialize;

use crate::error::{CalendarError, CalendarResult};
use crate::tz::localize;

/// A market's local session structure: open, close and an optional midday break.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalSessionTimes {
    tz: Tz,
    open: NaiveTime,
    close: NaiveTime,
    lunch: Option<(NaiveTime, NaiveTime)>,
}

impl LocalSessionTimes {
    /// Validate and build session times.
    ///
    /// Errors:
    /// - [`CalendarError::Configuration`] unless `open < break_start < break_end < close`
    ///   (or `open < close` without a break).
    pub fn new(
        tz: Tz,
        open: NaiveTime,
        close: NaiveTime,
        lunch: Option<(NaiveTime, NaiveTime)>,
    ) -> CalendarResult<Self> {
        let ordered = match lunch {
            Some((bs, be)) => open < bs && bs < be && be < close,
            None => open < close,
        };
        if !ordered {
            return Err(CalendarError::config(match lunch {
                Some((bs, be)) => format!(
                    "session times must satisfy open < break_start < break_end < close, got {open} / {bs} / {be} / {close}"
                ),
                None => format!("session times must satisfy open < close, got {open} / {close}"),
            }));
        }
        Ok(Self { tz, open, close, lunch })
    }

    /// Market timezone.
    pub fn tz(&self) -> Tz {
        self.tz
    }

    /// Local open time.
    pub fn open(&self) -> NaiveTime {
        self.open
    }

    /// Local close time.
    pub fn close(&self) -> NaiveTime {
        self.close
    }

    /// Local break window `(start, end)`, if the market has one.
    pub fn lunch(&self) -> Option<(NaiveTime, NaiveTime)> {
        self.lunch
    }
}

/// UTC boundary instants of one trading session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionBoundaries {
    /// First tradable minute.
    pub open: DateTime<Utc>,
    /// Last tradable minute before the break.
    pub break_start: Option<DateTime<Utc>>,
    /// First tradable minute after the break.
    pub break_end: Option<DateTime<Utc>>,
    /// Last tradable minute.
    pub close: DateTime<Utc>,
}

impl SessionBoundaries {
    /// Localize `times` on `day`.
    pub fn localize(day: NaiveDate, times: &LocalSessionTimes) -> CalendarResult<Self> {
        let open = localize(day, times.open, times.tz)?;
        let close = localize(day, times.close, times.tz)?;
        let (break_start, break_end) = match times.lunch {
            Some((bs, be)) => (
                Some(localize(day, bs, times.tz)?),
                Some(localize(day, be, times.tz)?),
            ),
            None => (None, None),
        };
        Ok(Self {
            open,
            break_start,
            break_end,
            close,
        })
    }

    /// Boundaries in time order, skipping the absent break.
    fn instants(&self) -> impl Iterator<Item = DateTime<Utc>> {
        [Some(self.open), self.break_start, self.break_end, Some(self.close)]
            .into_iter()
            .flatten()
    }

    /// Whether every boundary is strictly later than the one before it.
    pub fn is_strictly_increasing(&self) -> bool {
        if self.break_start.is_some() != self.break_end.is_some() {
            return false;
        }
        let all: Vec<_> = self.instants().collect();
        all.windows(2).all(|w| w[0] < w[1])
    }

    /// Trading windows `[start, end]` (inclusive), one or two of them.
    pub fn spans(&self) -> impl Iterator<Item = (DateTime<Utc>, DateTime<Utc>)> {
        match (self.break_start, self.break_end) {
            (Some(bs), Some(be)) => [Some((self.open, bs)), Some((be, self.close))],
            _ => [Some((self.open, self.close)), None],
        }
        .into_iter()
        .flatten()
    }

    /// Whether `instant` lies in one of the trading windows (endpoints included).
    pub fn window_containing(&self, instant: DateTime<Utc>) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        self.spans().find(|(start, end)| *start <= instant && instant <= *end)
    }
}

/// Sessions in ascending date order with their boundaries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleTable {
    rows: IndexMap<NaiveDate, SessionBoundaries>,
}

impl ScheduleTable {
    /// Number of sessions.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no sessions.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Boundaries of `day`, if it is a session.
    pub fn get(&self, day: NaiveDate) -> Option<&SessionBoundaries> {
        self.rows.get(&day)
    }

    /// Row index of `day`, if it is a session.
    pub fn position(&self, day: NaiveDate) -> Option<usize> {
        self.rows.get_index_of(&day)
    }

    /// Row at `index`.
    pub fn get_index(&self, index: usize) -> Option<(NaiveDate, &SessionBoundaries)> {
        self.rows.get_index(index).map(|(d, b)| (*d, b))
    }

    /// Session dates, ascending.
    pub fn sessions(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.rows.keys().copied()
    }

    /// Rows, ascending by date.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, &SessionBoundaries)> + '_ {
        self.rows.iter().map(|(d, b)| (*d, b))
    }

    /// Index of the last session whose open is at or before `instant`.
    ///
    /// Binary search over the open column; sessions never overlap, so this is the
    /// only row that can contain `instant`.
    pub fn last_opened_at(&self, instant: DateTime<Utc>) -> Option<usize> {
        self.rows
            .partition_point(|_, b| b.open <= instant)
            .checked_sub(1)
    }

    /// Number of sessions dated strictly before `date`.
    pub fn sessions_before(&self, date: NaiveDate) -> usize {
        self.rows.partition_point(|d, _| *d < date)
    }
}

/// Build the schedule table for `days` (ascending trading days).
///
/// Every row is localized eagerly. The first row violating the boundary ordering
/// aborts the build with a configuration error; real tz data never produces one,
/// so it signals misconfigured session times.
pub fn build_schedule(days: &[NaiveDate], times: &LocalSessionTimes) -> CalendarResult<ScheduleTable> {
    let mut rows = IndexMap::with_capacity(days.len());
    for &day in days {
        let b = SessionBoundaries::localize(day, times)?;
        if !b.is_strictly_increasing() {
            return Err(CalendarError::config(format!(
                "session boundaries on {day} are not strictly increasing after localization: {b:?}"
            )));
        }
        rows.insert(day, b);
    }
    tracing::debug!(sessions = rows.len(), tz = times.tz.name(), "built schedule table");
    Ok(ScheduleTable { rows })
}
