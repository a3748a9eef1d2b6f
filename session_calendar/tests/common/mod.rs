#![allow(dead_code)]

use chrono::{Datelike, NaiveDate, Weekday};
use session_calendar::{CalendarConfig, ExchangeCalendar, HolidaySet};

pub fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).expect("valid date")
}

/// SHSZ calendar over `[start, end]` with the given holidays.
pub fn shsz(start: NaiveDate, end: NaiveDate, holidays: &[NaiveDate]) -> ExchangeCalendar {
    let cfg = CalendarConfig::shsz(start, end).expect("preset config");
    ExchangeCalendar::new(cfg, holidays.iter().copied().collect()).expect("build calendar")
}

/// Reference session list: every date in range that is neither Sat/Sun nor a holiday.
pub fn brute_force_sessions(start: NaiveDate, end: NaiveDate, holidays: &HolidaySet) -> Vec<NaiveDate> {
    let mut out = Vec::new();
    let mut day = start;
    while day <= end {
        let weekend = matches!(day.weekday(), Weekday::Sat | Weekday::Sun);
        if !weekend && !holidays.contains(day) {
            out.push(day);
        }
        day = day.succ_opt().expect("in range");
    }
    out
}
