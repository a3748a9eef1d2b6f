//! The exchange calendar: sessions, boundaries and the minute grid for one market.
//!
//! Construction runs the whole pipeline eagerly:
//! holidays -> trading days -> schedule table -> minute grid.
//! Afterwards the calendar is immutable and can be shared across threads as-is.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use once_cell::sync::OnceCell;

use crate::config::CalendarConfig;
use crate::error::{CalendarError, CalendarResult};
use crate::holidays::{HolidaySet, HolidaySource};
use crate::minutes::{MinuteGrid, build_minute_grid, on_minute_grid, span_minutes};
use crate::schedule::{ScheduleTable, SessionBoundaries, build_schedule};
use crate::sessions::trading_days;

/// A fully built trading calendar.
#[derive(Debug)]
pub struct ExchangeCalendar {
    config: CalendarConfig,
    holidays: HolidaySet,
    schedule: ScheduleTable,
    grid: MinuteGrid,
    minutes_per_session: OnceCell<Vec<usize>>,
}

impl ExchangeCalendar {
    /// Build a calendar from a validated configuration and a holiday snapshot.
    ///
    /// Errors:
    /// - [`CalendarError::Configuration`] if the range is inverted or too long
    ///   (see [`CalendarConfig::validate`]), checked before anything is allocated.
    /// - [`CalendarError::Localization`] if a boundary falls in a tz transition.
    /// - [`CalendarError::Configuration`] if localized boundaries are out of order.
    /// - [`CalendarError::GridInconsistency`] on an internal fill defect.
    pub fn new(config: CalendarConfig, holidays: HolidaySet) -> CalendarResult<Self> {
        config.validate()?;
        let days = trading_days(config.start, config.end, config.weekend, &holidays);
        let schedule = build_schedule(&days, &config.times)?;
        let grid = build_minute_grid(&schedule)?;
        tracing::info!(
            name = %config.name,
            tz = config.tz().name(),
            start = %config.start,
            end = %config.end,
            holidays = holidays.len(),
            sessions = schedule.len(),
            minutes = grid.len(),
            "built exchange calendar"
        );
        Ok(Self {
            config,
            holidays,
            schedule,
            grid,
            minutes_per_session: OnceCell::new(),
        })
    }

    /// Build a calendar, pulling holidays from `source`.
    pub fn from_source(config: CalendarConfig, source: &dyn HolidaySource) -> CalendarResult<Self> {
        Self::new(config, source.fetch_holidays())
    }

    /// Calendar name.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Market timezone.
    pub fn timezone(&self) -> Tz {
        self.config.tz()
    }

    /// Configuration this calendar was built from.
    pub fn config(&self) -> &CalendarConfig {
        &self.config
    }

    /// Holiday snapshot this calendar was built from.
    pub fn holidays(&self) -> &HolidaySet {
        &self.holidays
    }

    /// Session table, ascending by date.
    pub fn schedule(&self) -> &ScheduleTable {
        &self.schedule
    }

    /// Trading sessions, ascending.
    pub fn sessions(&self) -> Vec<NaiveDate> {
        self.schedule.sessions().collect()
    }

    /// First session, if any.
    pub fn first_session(&self) -> Option<NaiveDate> {
        self.schedule.get_index(0).map(|(d, _)| d)
    }

    /// Last session, if any.
    pub fn last_session(&self) -> Option<NaiveDate> {
        self.schedule
            .len()
            .checked_sub(1)
            .and_then(|i| self.schedule.get_index(i))
            .map(|(d, _)| d)
    }

    /// Whether `date` is a session.
    pub fn is_session(&self, date: NaiveDate) -> bool {
        self.schedule.get(date).is_some()
    }

    /// Boundary instants of `day`.
    ///
    /// Errors:
    /// - [`CalendarError::UnknownSession`] if `day` is not a session in range.
    pub fn boundaries_for(&self, day: NaiveDate) -> CalendarResult<&SessionBoundaries> {
        self.schedule.get(day).ok_or(CalendarError::UnknownSession(day))
    }

    /// Every tradable minute, ascending.
    pub fn all_minutes(&self) -> &[DateTime<Utc>] {
        self.grid.as_slice()
    }

    /// Minutes of `day`.
    ///
    /// Errors:
    /// - [`CalendarError::UnknownSession`] if `day` is not a session in range.
    pub fn minutes_for_session(&self, day: NaiveDate) -> CalendarResult<&[DateTime<Utc>]> {
        self.schedule
            .position(day)
            .and_then(|row| self.grid.session(row))
            .ok_or(CalendarError::UnknownSession(day))
    }

    /// Tradable minute count per session, in session order. Computed on first use.
    pub fn minutes_per_session(&self) -> &[usize] {
        self.minutes_per_session.get_or_init(|| {
            (0..self.schedule.len())
                .map(|row| self.grid.session_range(row).map_or(0, |r| r.len()))
                .collect()
        })
    }

    /// Session whose trading window contains `instant` on the minute grid.
    pub fn session_for_minute(&self, instant: DateTime<Utc>) -> Option<NaiveDate> {
        let row = self.schedule.last_opened_at(instant)?;
        let (day, b) = self.schedule.get_index(row)?;
        let (start, _) = b.window_containing(instant)?;
        on_minute_grid(start, instant).then_some(day)
    }

    /// Whether `instant` is an element of [`ExchangeCalendar::all_minutes`].
    ///
    /// Binary search over session opens, then a window check; no grid scan.
    pub fn is_session_minute(&self, instant: DateTime<Utc>) -> bool {
        self.session_for_minute(instant).is_some()
    }

    /// First session strictly after `date`.
    pub fn next_session(&self, date: NaiveDate) -> Option<NaiveDate> {
        let idx = self.schedule.sessions_before(date);
        let idx = if self.is_session(date) { idx + 1 } else { idx };
        self.schedule.get_index(idx).map(|(d, _)| d)
    }

    /// Last session strictly before `date`.
    pub fn previous_session(&self, date: NaiveDate) -> Option<NaiveDate> {
        let idx = self.schedule.sessions_before(date).checked_sub(1)?;
        self.schedule.get_index(idx).map(|(d, _)| d)
    }

    /// Minutes in the before-break and after-break windows of `day`.
    ///
    /// The second value is `None` for markets without a break.
    pub fn window_minutes(&self, day: NaiveDate) -> CalendarResult<(usize, Option<usize>)> {
        let b = self.boundaries_for(day)?;
        Ok(match (b.break_start, b.break_end) {
            (Some(bs), Some(be)) => (span_minutes(b.open, bs), Some(span_minutes(be, b.close))),
            _ => (span_minutes(b.open, b.close), None),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn march_2016() -> ExchangeCalendar {
        let cfg = CalendarConfig::shsz(d(2016, 3, 1), d(2016, 3, 31)).unwrap();
        ExchangeCalendar::new(cfg, HolidaySet::new()).unwrap()
    }

    #[test]
    fn scenario_session_boundaries_and_counts() {
        let cal = march_2016();
        let b = cal.boundaries_for(d(2016, 3, 14)).unwrap();
        assert_eq!(b.open, Utc.with_ymd_and_hms(2016, 3, 14, 1, 31, 0).unwrap());
        assert_eq!(b.close, Utc.with_ymd_and_hms(2016, 3, 14, 7, 0, 0).unwrap());
        assert_eq!(cal.window_minutes(d(2016, 3, 14)).unwrap(), (120, Some(120)));
        assert_eq!(cal.minutes_for_session(d(2016, 3, 14)).unwrap().len(), 240);
    }

    #[test]
    fn weekend_is_unknown_session() {
        let cal = march_2016();
        let err = cal.boundaries_for(d(2016, 3, 12)).unwrap_err();
        assert_eq!(err, CalendarError::UnknownSession(d(2016, 3, 12)));
        assert!(cal.minutes_for_session(d(2016, 3, 12)).is_err());
    }

    #[test]
    fn minutes_per_session_is_cached_and_uniform() {
        let cal = march_2016();
        let first = cal.minutes_per_session().as_ptr();
        assert_eq!(cal.minutes_per_session().len(), cal.sessions().len());
        assert!(cal.minutes_per_session().iter().all(|&n| n == 240));
        assert_eq!(cal.minutes_per_session().as_ptr(), first);
    }

    #[test]
    fn session_minute_membership() {
        let cal = march_2016();
        let open = Utc.with_ymd_and_hms(2016, 3, 14, 1, 31, 0).unwrap();
        let break_start = Utc.with_ymd_and_hms(2016, 3, 14, 3, 30, 0).unwrap();
        let break_end = Utc.with_ymd_and_hms(2016, 3, 14, 5, 1, 0).unwrap();

        assert!(cal.is_session_minute(open));
        assert!(cal.is_session_minute(break_start));
        assert!(cal.is_session_minute(break_end));
        assert!(!cal.is_session_minute(open - Duration::minutes(1)));
        assert!(!cal.is_session_minute(break_start + Duration::minutes(1)));
        assert!(!cal.is_session_minute(break_end - Duration::minutes(1)));
        assert!(!cal.is_session_minute(open + Duration::seconds(30)));
        assert_eq!(cal.session_for_minute(open), Some(d(2016, 3, 14)));
    }

    #[test]
    fn hand_assembled_inverted_range_is_rejected() {
        let base = CalendarConfig::shsz(d(2016, 1, 1), d(2016, 1, 31)).unwrap();
        let cfg = CalendarConfig {
            start: d(2016, 2, 1),
            end: d(2016, 1, 1),
            ..base
        };
        let err = ExchangeCalendar::new(cfg, HolidaySet::new()).unwrap_err();
        assert!(matches!(err, CalendarError::Configuration(_)), "got {err:?}");
    }

    #[test]
    fn hand_assembled_oversized_range_fails_before_building() {
        let base = CalendarConfig::shsz(d(2016, 1, 1), d(2016, 1, 31)).unwrap();
        let cfg = CalendarConfig {
            start: d(1900, 1, 1),
            end: d(2100, 1, 1),
            ..base.clone()
        };
        let err = ExchangeCalendar::new(cfg, HolidaySet::new()).unwrap_err();
        assert!(matches!(err, CalendarError::Configuration(ref msg) if msg.contains("maximum")));

        let blank = CalendarConfig {
            name: "  ".into(),
            ..base
        };
        assert!(ExchangeCalendar::new(blank, HolidaySet::new()).is_err());
    }

    #[test]
    fn next_and_previous_session() {
        let cal = march_2016();
        // Fri 2016-03-11 -> Mon 2016-03-14 across a weekend
        assert_eq!(cal.next_session(d(2016, 3, 11)), Some(d(2016, 3, 14)));
        assert_eq!(cal.next_session(d(2016, 3, 12)), Some(d(2016, 3, 14)));
        assert_eq!(cal.previous_session(d(2016, 3, 14)), Some(d(2016, 3, 11)));
        assert_eq!(cal.previous_session(d(2016, 3, 13)), Some(d(2016, 3, 11)));
        assert_eq!(cal.previous_session(d(2016, 3, 1)), None);
        assert_eq!(cal.next_session(d(2016, 3, 31)), None);
        assert_eq!(cal.first_session(), Some(d(2016, 3, 1)));
        assert_eq!(cal.last_session(), Some(d(2016, 3, 31)));
    }
}
