//! Local wall-clock to UTC conversion.
//!
//! What this module provides:
//! - [`parse_tz`]: Parse an IANA time zone name (e.g. "Asia/Shanghai") into a
//!   [`chrono_tz::Tz`], mapping failures to a configuration error.
//! - [`localize`]: Convert a (date, local time) pair to the UTC instant it denotes
//!   in a given zone, using the offset in force on that date.
//!
//! Notes:
//! - The offset is looked up per date from the tz database, so historical offset
//!   changes (e.g. China's 1986-1991 summer time) are honoured.
//! - Nonexistent local times (spring-forward gap) and ambiguous local times
//!   (fall-back overlap) are errors. Session boundaries are fixed by regulation and
//!   never land in a transition window for real markets; if one does, the
//!   configuration is wrong and no offset is guessed.
//!
//! Examples
//! - Asia/Shanghai 2016-03-14 09:31 -> 2016-03-14T01:31:00Z
//! - America/New_York 2016-03-13 02:30 -> error (nonexistent)

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{CalendarError, CalendarResult, LocalizationReason};

/// Parse an IANA time zone name.
///
/// Errors:
/// - [`CalendarError::Configuration`] if the name is not in the tz database.
pub fn parse_tz(name: &str) -> CalendarResult<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| CalendarError::config(format!("unknown timezone: {name}")))
}

/// Convert `time` on `date`, read as a wall clock in `tz`, to a UTC instant.
///
/// Behavior:
/// - If the local time maps to a single instant, that instant is returned.
/// - Otherwise a [`CalendarError::Localization`] carrying the date, time and reason.
pub fn localize(date: NaiveDate, time: NaiveTime, tz: Tz) -> CalendarResult<DateTime<Utc>> {
    use chrono::offset::LocalResult::*;
    let naive = date.and_time(time);
    match tz.from_local_datetime(&naive) {
        Single(dt) => Ok(dt.with_timezone(&Utc)),
        Ambiguous(_, _) => Err(localization_error(date, time, tz, LocalizationReason::Ambiguous)),
        None => Err(localization_error(date, time, tz, LocalizationReason::Nonexistent)),
    }
}

fn localization_error(
    date: NaiveDate,
    time: NaiveTime,
    tz: Tz,
    reason: LocalizationReason,
) -> CalendarError {
    CalendarError::Localization {
        date,
        time,
        timezone: tz.name().to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn shanghai_open_is_utc_plus_eight() {
        let got = localize(d(2016, 3, 14), t(9, 31), chrono_tz::Asia::Shanghai).unwrap();
        let want = Utc.with_ymd_and_hms(2016, 3, 14, 1, 31, 0).unwrap();
        assert_eq!(got, want);
    }

    #[test]
    fn shanghai_1991_summer_time_is_utc_plus_nine() {
        // China observed summer time 1986-1991; 1991-06-03 was inside it.
        let got = localize(d(1991, 6, 3), t(9, 31), chrono_tz::Asia::Shanghai).unwrap();
        let want = Utc.with_ymd_and_hms(1991, 6, 3, 0, 31, 0).unwrap();
        assert_eq!(got, want);
    }

    #[test]
    fn ny_spring_forward_gap_is_error() {
        // America/New_York jumps from 02:00 to 03:00 on 2016-03-13.
        let err = localize(d(2016, 3, 13), t(2, 30), chrono_tz::America::New_York).unwrap_err();
        match err {
            CalendarError::Localization { date, time, reason, timezone } => {
                assert_eq!(date, d(2016, 3, 13));
                assert_eq!(time, t(2, 30));
                assert_eq!(reason, LocalizationReason::Nonexistent);
                assert_eq!(timezone, "America/New_York");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn ny_fall_back_overlap_is_error() {
        // America/New_York repeats 01:xx on 2016-11-06.
        let err = localize(d(2016, 11, 6), t(1, 30), chrono_tz::America::New_York).unwrap_err();
        assert!(matches!(
            err,
            CalendarError::Localization { reason: LocalizationReason::Ambiguous, .. }
        ));
    }

    #[test]
    fn same_wall_time_tracks_dst_per_day() {
        // 08:45 New York is 13:45Z before the 2016-03-13 switch and 12:45Z after it.
        let got: Vec<_> = [d(2016, 3, 12), d(2016, 3, 13), d(2016, 3, 14)]
            .into_iter()
            .map(|day| localize(day, t(8, 45), chrono_tz::America::New_York).unwrap())
            .collect();
        assert_eq!(
            got,
            vec![
                Utc.with_ymd_and_hms(2016, 3, 12, 13, 45, 0).unwrap(),
                Utc.with_ymd_and_hms(2016, 3, 13, 12, 45, 0).unwrap(),
                Utc.with_ymd_and_hms(2016, 3, 14, 12, 45, 0).unwrap(),
            ]
        );
        assert!(got.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn unknown_zone_is_configuration_error() {
        let err = parse_tz("Mars/Olympus_Mons").unwrap_err();
        assert!(matches!(err, CalendarError::Configuration(_)));
        assert!(err.to_string().contains("Mars/Olympus_Mons"));
    }
}
