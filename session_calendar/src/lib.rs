//! Trading-session calendar engine.
//!
//! Given a date range, a weekly closing pattern, a holiday list and a market's
//! local session structure (open, close and an optional midday break), builds:
//! - the ordered trading sessions ([`sessions`]),
//! - the UTC boundary instants of every session ([`schedule`]),
//! - the contiguous one-minute grid of all tradable instants ([`minutes`]).
//!
//! [`ExchangeCalendar`] runs the whole pipeline and exposes the queries;
//! [`SharedCalendar`] publishes rebuilt calendars atomically to concurrent readers.
//!
//! ```
//! use chrono::NaiveDate;
//! use session_calendar::{CalendarConfig, ExchangeCalendar, HolidaySet};
//!
//! let day = NaiveDate::from_ymd_opt(2016, 3, 14).unwrap();
//! let cal = ExchangeCalendar::new(CalendarConfig::shsz(day, day).unwrap(), HolidaySet::new()).unwrap();
//! assert_eq!(cal.all_minutes().len(), 240);
//! ```

#![deny(missing_docs)]

pub mod calendar;
pub mod config;
pub mod error;
pub mod holidays;
pub mod minutes;
pub mod schedule;
pub mod sessions;
pub mod snapshot;
pub mod tz;

pub use calendar::ExchangeCalendar;
pub use config::{CalendarCfg, CalendarConfig, load_config_path, load_config_str};
pub use error::{CalendarError, CalendarResult, LocalizationReason};
pub use holidays::{HolidayFile, HolidaySet, HolidaySource, StaticHolidays, parse_holiday_list};
pub use minutes::MinuteGrid;
pub use schedule::{LocalSessionTimes, ScheduleTable, SessionBoundaries};
pub use sessions::WeeklyPattern;
pub use snapshot::SharedCalendar;
