//! The minute grid.
//!
//! - One-minute resolution, UTC.
//! - Each trading window `[start, end]` contributes `(end - start) / 1min + 1`
//!   minutes, both endpoints included.
//! - Total size is computed first, the buffer is allocated once, then filled
//!   session by session in date order. Sessions don't overlap, so the fill order
//!   is already the global sort order.

use std::ops::Range;

use chrono::{DateTime, Duration, Utc};

use crate::error::{CalendarError, CalendarResult};
use crate::schedule::{ScheduleTable, SessionBoundaries};

/// Number of seconds in a minute.
pub const SECS_PER_MINUTE: i64 = 60;

/// Minutes in the inclusive window `[start, end]`.
///
/// Boundaries are minute-aligned by construction; any sub-minute remainder is
/// truncated. `end < start` counts as empty.
pub fn span_minutes(start: DateTime<Utc>, end: DateTime<Utc>) -> usize {
    let whole = (end - start).num_minutes();
    if whole < 0 { 0 } else { whole as usize + 1 }
}

/// Tradable minutes in one session: before-break span plus after-break span.
pub fn session_minutes(b: &SessionBoundaries) -> usize {
    b.spans().map(|(start, end)| span_minutes(start, end)).sum()
}

/// Every tradable minute of every session, ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MinuteGrid {
    minutes: Vec<DateTime<Utc>>,
    // offsets[i]..offsets[i + 1] is the slice of session i
    offsets: Vec<usize>,
}

impl MinuteGrid {
    /// All minutes.
    pub fn as_slice(&self) -> &[DateTime<Utc>] {
        &self.minutes
    }

    /// Total number of minutes.
    pub fn len(&self) -> usize {
        self.minutes.len()
    }

    /// Whether the grid is empty.
    pub fn is_empty(&self) -> bool {
        self.minutes.is_empty()
    }

    /// Index range of session `row` within [`MinuteGrid::as_slice`].
    pub fn session_range(&self, row: usize) -> Option<Range<usize>> {
        let start = *self.offsets.get(row)?;
        let end = *self.offsets.get(row + 1)?;
        Some(start..end)
    }

    /// Minutes of session `row`.
    pub fn session(&self, row: usize) -> Option<&[DateTime<Utc>]> {
        self.session_range(row).map(|r| &self.minutes[r])
    }
}

/// Build the grid for `schedule`.
///
/// The table is trusted: rows are not re-validated. The only check is that the
/// fill wrote exactly the precomputed number of minutes.
///
/// Errors:
/// - [`CalendarError::GridInconsistency`] if the emitted count differs.
pub fn build_minute_grid(schedule: &ScheduleTable) -> CalendarResult<MinuteGrid> {
    let sizes: Vec<usize> = schedule.iter().map(|(_, b)| session_minutes(b)).collect();
    let total: usize = sizes.iter().sum();

    // One allocation for the entire thing.
    let mut minutes = Vec::with_capacity(total);
    let mut offsets = Vec::with_capacity(sizes.len() + 1);
    offsets.push(0);

    let step = Duration::seconds(SECS_PER_MINUTE);
    for (_, b) in schedule.iter() {
        for (start, end) in b.spans() {
            let mut ts = start;
            while ts <= end {
                minutes.push(ts);
                ts += step;
            }
        }
        offsets.push(minutes.len());
    }

    if minutes.len() != total {
        tracing::error!(expected = total, emitted = minutes.len(), "minute grid fill mismatch");
        return Err(CalendarError::GridInconsistency {
            expected: total,
            emitted: minutes.len(),
        });
    }
    Ok(MinuteGrid { minutes, offsets })
}

/// Whether `instant` is a minute of the window starting at `start`: same
/// second-of-minute phase, no sub-second part.
pub(crate) fn on_minute_grid(start: DateTime<Utc>, instant: DateTime<Utc>) -> bool {
    let delta = instant - start;
    delta.num_seconds() % SECS_PER_MINUTE == 0 && delta.subsec_nanos() == 0
}

// -------------------- tests --------------------
#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::{LocalSessionTimes, build_schedule};
    use chrono::{NaiveDate, NaiveTime, TimeZone};

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn shsz() -> LocalSessionTimes {
        LocalSessionTimes::new(
            chrono_tz::Asia::Shanghai,
            t(9, 31),
            t(15, 0),
            Some((t(11, 30), t(13, 1))),
        )
        .unwrap()
    }

    #[test]
    fn inclusive_span_counts() {
        let a = Utc.with_ymd_and_hms(2016, 3, 14, 1, 31, 0).unwrap();
        assert_eq!(span_minutes(a, a), 1);
        assert_eq!(span_minutes(a, a + Duration::minutes(119)), 120);
        assert_eq!(span_minutes(a, a - Duration::minutes(1)), 0);
    }

    #[test]
    fn shanghai_session_has_240_minutes() {
        let day = NaiveDate::from_ymd_opt(2016, 3, 14).unwrap();
        let table = build_schedule(&[day], &shsz()).unwrap();
        let grid = build_minute_grid(&table).unwrap();
        assert_eq!(grid.len(), 240);

        let m = grid.as_slice();
        assert_eq!(m[0], Utc.with_ymd_and_hms(2016, 3, 14, 1, 31, 0).unwrap());
        assert_eq!(m[119], Utc.with_ymd_and_hms(2016, 3, 14, 3, 30, 0).unwrap());
        assert_eq!(m[120], Utc.with_ymd_and_hms(2016, 3, 14, 5, 1, 0).unwrap());
        assert_eq!(m[239], Utc.with_ymd_and_hms(2016, 3, 14, 7, 0, 0).unwrap());
    }

    #[test]
    fn sessions_are_contiguous_slices() {
        let days: Vec<_> = (14..=18).map(|d| NaiveDate::from_ymd_opt(2016, 3, d).unwrap()).collect();
        let table = build_schedule(&days, &shsz()).unwrap();
        let grid = build_minute_grid(&table).unwrap();
        assert_eq!(grid.len(), 5 * 240);
        assert!(grid.as_slice().windows(2).all(|w| w[0] < w[1]));
        for row in 0..5 {
            let s = grid.session(row).unwrap();
            assert_eq!(s.len(), 240);
            let (_, b) = table.get_index(row).unwrap();
            assert_eq!(s.first(), Some(&b.open));
            assert_eq!(s.last(), Some(&b.close));
        }
        assert!(grid.session(5).is_none());
    }

    #[test]
    fn empty_schedule_gives_empty_grid() {
        let grid = build_minute_grid(&ScheduleTable::default()).unwrap();
        assert!(grid.is_empty());
        assert!(grid.session(0).is_none());
    }

    #[test]
    fn grid_phase_check() {
        let a = Utc.with_ymd_and_hms(2016, 3, 14, 1, 31, 0).unwrap();
        assert!(on_minute_grid(a, a + Duration::minutes(7)));
        assert!(!on_minute_grid(a, a + Duration::seconds(30)));
        assert!(!on_minute_grid(a, a + Duration::milliseconds(60_001)));
    }
}
