//! Calendar configuration: parsing, normalization, and presets.
//!
//! This module defines the TOML shape of one exchange calendar:
//! - Name and IANA timezone
//! - Local open/close times and an optional break (`"HH:MM"` or `"HH:MM:SS"`)
//! - Covered date range (`YYYY-MM-DD`, inclusive) and a maximum span guard
//! - Weekly closed days (defaults to Saturday + Sunday)
//!
//! Key behaviors:
//! - Normalization trims and uppercases the name, parses the timezone and times,
//!   and de-duplicates weekend days.
//! - Times must be whole minutes; the engine has minute resolution.
//! - `break_start` and `break_end` come as a pair or not at all.
//!
//! Entrypoints:
//! - Parse + normalize from a TOML string: [`load_config_str`]
//! - Parse + normalize from a file path: [`load_config_path`]
//! - Normalize an already deserialized [`CalendarCfg`]: [`normalize_config`]
//! - The Shanghai/Shenzhen preset: [`CalendarConfig::shsz`]

use anyhow::Context;
use chrono::{Duration, NaiveDate, NaiveTime, Timelike, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{CalendarError, CalendarResult};
use crate::schedule::LocalSessionTimes;
use crate::sessions::WeeklyPattern;
use crate::tz::parse_tz;

/// Default cap on the covered range, in days (about a century).
pub const DEFAULT_MAX_SPAN_DAYS: u32 = 36_600;

/// Raw TOML payload for one calendar.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CalendarCfg {
    /// Short calendar name (e.g. "SHSZ").
    pub name: String,
    /// IANA timezone (e.g. "Asia/Shanghai").
    pub timezone: String,
    /// Local open time.
    pub open: String,
    /// Local close time.
    pub close: String,
    /// Local break start, paired with `break_end`.
    pub break_start: Option<String>,
    /// Local break end, paired with `break_start`.
    pub break_end: Option<String>,
    /// First date covered (inclusive).
    pub start: NaiveDate,
    /// Last date covered (inclusive).
    pub end: NaiveDate,
    /// Weekdays the market is always closed ("Sat", "Sunday", ...).
    #[serde(default = "default_weekend")]
    pub weekend: Vec<String>,
    /// Upper bound on `end - start + 1`, in days.
    #[serde(default = "default_max_span_days")]
    pub max_span_days: u32,
}

fn default_weekend() -> Vec<String> {
    vec!["Sat".into(), "Sun".into()]
}

fn default_max_span_days() -> u32 {
    DEFAULT_MAX_SPAN_DAYS
}

/// Validated calendar configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarConfig {
    /// Normalized (trimmed, uppercase) name.
    pub name: String,
    /// First date covered (inclusive).
    pub start: NaiveDate,
    /// Last date covered (inclusive).
    pub end: NaiveDate,
    /// Local session structure.
    pub times: LocalSessionTimes,
    /// Weekly closed days.
    pub weekend: WeeklyPattern,
    /// Span guard in days.
    pub max_span_days: u32,
}

impl CalendarConfig {
    /// Assemble and validate a configuration.
    ///
    /// Errors:
    /// - [`CalendarError::Configuration`] for an empty name, `start > end`, or a
    ///   span above `max_span_days`.
    pub fn new(
        name: impl Into<String>,
        start: NaiveDate,
        end: NaiveDate,
        times: LocalSessionTimes,
        weekend: WeeklyPattern,
        max_span_days: u32,
    ) -> CalendarResult<Self> {
        let config = Self {
            name: name.into().trim().to_uppercase(),
            start,
            end,
            times,
            weekend,
            max_span_days,
        };
        config.validate()?;
        Ok(config)
    }

    /// Re-check the name and range invariants.
    ///
    /// Also run by [`crate::ExchangeCalendar::new`], so configs assembled with
    /// struct literals or field edits are held to the same rules.
    ///
    /// Errors:
    /// - [`CalendarError::Configuration`] for an empty name, `start > end`, or a
    ///   span above `max_span_days`.
    pub fn validate(&self) -> CalendarResult<()> {
        let (start, end, max_span_days) = (self.start, self.end, self.max_span_days);
        if self.name.trim().is_empty() {
            return Err(CalendarError::config("calendar name cannot be empty"));
        }
        if start > end {
            return Err(CalendarError::config(format!("start {start} is after end {end}")));
        }
        let span_days = (end - start).num_days() + 1;
        if span_days > i64::from(max_span_days) {
            return Err(CalendarError::config(format!(
                "range {start}..={end} spans {span_days} days, above the maximum of {max_span_days}"
            )));
        }
        Ok(())
    }

    /// Shanghai/Shenzhen A-share market over `[start, end]`.
    ///
    /// 09:31-11:30 and 13:01-15:00 Asia/Shanghai, closed Saturday and Sunday.
    pub fn shsz(start: NaiveDate, end: NaiveDate) -> CalendarResult<Self> {
        let t = |h, m| NaiveTime::from_hms_opt(h, m, 0).ok_or_else(|| CalendarError::config("bad preset time"));
        let times = LocalSessionTimes::new(
            chrono_tz::Asia::Shanghai,
            t(9, 31)?,
            t(15, 0)?,
            Some((t(11, 30)?, t(13, 1)?)),
        )?;
        Self::new(
            "SHSZ",
            start,
            end,
            times,
            WeeklyPattern::saturday_sunday(),
            DEFAULT_MAX_SPAN_DAYS,
        )
    }

    /// [`CalendarConfig::shsz`] from the first exchange trading day (1990-12-19)
    /// through one year after today (UTC).
    pub fn shsz_default() -> CalendarResult<Self> {
        let start = NaiveDate::from_ymd_opt(1990, 12, 19)
            .ok_or_else(|| CalendarError::config("bad preset start"))?;
        let end = Utc::now().date_naive() + Duration::days(365);
        Self::shsz(start, end)
    }

    /// Market timezone.
    pub fn tz(&self) -> Tz {
        self.times.tz()
    }
}

/// Validate and convert a raw [`CalendarCfg`].
///
/// Errors:
/// - Unknown timezone, unparsable or sub-minute times, a half-specified break,
///   unknown weekday names, session ordering, and range checks (see
///   [`CalendarConfig::new`]).
pub fn normalize_config(cfg: &CalendarCfg) -> CalendarResult<CalendarConfig> {
    let tz = parse_tz(&cfg.timezone)?;
    let open = parse_session_time("open", &cfg.open)?;
    let close = parse_session_time("close", &cfg.close)?;
    let lunch = match (&cfg.break_start, &cfg.break_end) {
        (Some(bs), Some(be)) => Some((
            parse_session_time("break_start", bs)?,
            parse_session_time("break_end", be)?,
        )),
        (None, None) => None,
        _ => {
            return Err(CalendarError::config(
                "break_start and break_end must be given together",
            ));
        }
    };
    let times = LocalSessionTimes::new(tz, open, close, lunch)?;

    let mut weekend = Vec::with_capacity(cfg.weekend.len());
    for raw in &cfg.weekend {
        let day: Weekday = raw
            .trim()
            .parse()
            .map_err(|_| CalendarError::config(format!("unknown weekday in weekend: {raw}")))?;
        weekend.push(day);
    }

    CalendarConfig::new(
        &cfg.name,
        cfg.start,
        cfg.end,
        times,
        WeeklyPattern::from_weekdays(weekend),
        cfg.max_span_days,
    )
}

fn parse_session_time(field: &str, raw: &str) -> CalendarResult<NaiveTime> {
    let s = raw.trim();
    let time = NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|_| CalendarError::config(format!("{field}: cannot parse time '{raw}'")))?;
    if time.second() != 0 || time.nanosecond() != 0 {
        return Err(CalendarError::config(format!(
            "{field}: '{raw}' is not a whole minute"
        )));
    }
    Ok(time)
}

/// Parse and normalize a calendar from a TOML string.
///
/// Errors:
/// - TOML parse failures
/// - Normalization errors (see [`normalize_config`])
pub fn load_config_str(toml_str: &str) -> anyhow::Result<CalendarConfig> {
    let cfg: CalendarCfg = toml::from_str(toml_str).context("failed to parse calendar TOML")?;
    let config = normalize_config(&cfg).context("normalize_config failed")?;
    tracing::debug!(
        name = %config.name,
        tz = config.tz().name(),
        start = %config.start,
        end = %config.end,
        "loaded calendar config"
    );
    Ok(config)
}

/// Read a calendar TOML file from disk, parse, and normalize it.
///
/// See [`load_config_str`] for details on parsing and normalization.
pub fn load_config_path(path: impl AsRef<std::path::Path>) -> anyhow::Result<CalendarConfig> {
    let text = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("read calendar config {}", path.as_ref().display()))?;
    load_config_str(&text)
}
