//! Ad-hoc holiday sets and the sources that supply them.
//!
//! The engine only consumes a [`HolidaySet`]; where it comes from is the
//! caller's business. A source never fails: an unreadable or empty input means
//! "no known extra holidays".

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

/// Dates excluded from trading on top of the weekly pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HolidaySet(BTreeSet<NaiveDate>);

impl HolidaySet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `date` is a holiday.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.0.contains(&date)
    }

    /// Add a date; returns `false` if it was already present.
    pub fn insert(&mut self, date: NaiveDate) -> bool {
        self.0.insert(date)
    }

    /// Number of dates.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set has no dates.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Dates in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<NaiveDate> for HolidaySet {
    fn from_iter<I: IntoIterator<Item = NaiveDate>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Pull interface for holiday lists.
pub trait HolidaySource {
    /// Current snapshot of known holidays. Must not fail; degrade to an empty set.
    fn fetch_holidays(&self) -> HolidaySet;
}

impl HolidaySource for HolidaySet {
    fn fetch_holidays(&self) -> HolidaySet {
        self.clone()
    }
}

/// A fixed, in-memory holiday list.
#[derive(Debug, Clone, Default)]
pub struct StaticHolidays {
    dates: Vec<NaiveDate>,
}

impl StaticHolidays {
    /// Wrap a list of dates (order and duplicates don't matter).
    pub fn new(dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            dates: dates.into_iter().collect(),
        }
    }
}

impl HolidaySource for StaticHolidays {
    fn fetch_holidays(&self) -> HolidaySet {
        self.dates.iter().copied().collect()
    }
}

/// A plain-text holiday list on disk, read on every fetch.
///
/// See [`parse_holiday_list`] for the accepted format.
#[derive(Debug, Clone)]
pub struct HolidayFile {
    path: PathBuf,
}

impl HolidayFile {
    /// Source backed by the file at `path`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path this source reads.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HolidaySource for HolidayFile {
    fn fetch_holidays(&self) -> HolidaySet {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => {
                let set = parse_holiday_list(&text);
                tracing::debug!(path = %self.path.display(), holidays = set.len(), "loaded holiday file");
                set
            }
            Err(err) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "holiday file unreadable, assuming no extra holidays"
                );
                HolidaySet::new()
            }
        }
    }
}

/// Parse one date per line, `YYYYMMDD` or `YYYY-MM-DD`.
///
/// Blank lines and `#` comments (whole-line or trailing) are ignored. A line that
/// is not a valid date is skipped with a warning rather than failing the list.
pub fn parse_holiday_list(text: &str) -> HolidaySet {
    let mut set = HolidaySet::new();
    for (lineno, raw) in text.lines().enumerate() {
        let line = raw.split('#').next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }
        match parse_holiday_date(line) {
            Some(date) => {
                set.insert(date);
            }
            None => tracing::warn!(line = lineno + 1, value = line, "skipping unparsable holiday entry"),
        }
    }
    set
}

fn parse_holiday_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y%m%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .ok()
}
