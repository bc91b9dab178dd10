use std::fmt;
use std::path::{Path, PathBuf};

use time::{Date, Month, OffsetDateTime};

const ARCHIVE_EXTENSION: &str = "zip";

/// The day currently being synchronized. Only ever moves backward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Cursor {
    date: Date,
}

/// Which calendar boundary a [`Cursor::step_back`] crossed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rollover {
    SameMonth,
    NewMonth,
    NewYear,
}

impl Cursor {
    pub fn new(date: Date) -> Self {
        Self { date }
    }

    /// Today in the local timezone, falling back to UTC when the offset is
    /// not determinable (e.g. multi-threaded processes on some platforms).
    pub fn today() -> Self {
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        Self::new(now.date())
    }

    pub fn date(&self) -> Date {
        self.date
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }

    pub fn month(&self) -> Month {
        self.date.month()
    }

    pub fn day(&self) -> u8 {
        self.date.day()
    }

    pub fn month_code(&self) -> &'static str {
        month_code(self.month())
    }

    /// Moves one calendar day back. Returns `None` only at the minimum
    /// representable date, leaving the cursor untouched.
    pub fn step_back(&mut self) -> Option<Rollover> {
        let previous = self.date.previous_day()?;
        let rollover = if previous.year() != self.date.year() {
            Rollover::NewYear
        } else if previous.month() != self.date.month() {
            Rollover::NewMonth
        } else {
            Rollover::SameMonth
        };
        self.date = previous;
        Some(rollover)
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.date)
    }
}

/// Oldest calendar year a run may walk into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncBoundary {
    year: i32,
}

impl SyncBoundary {
    pub fn for_start(start: Cursor) -> Self {
        Self {
            year: start.year() - 1,
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn admits(&self, cursor: &Cursor) -> bool {
        cursor.year() >= self.year
    }
}

pub fn month_code(month: Month) -> &'static str {
    match month {
        Month::January => "JAN",
        Month::February => "FEB",
        Month::March => "MAR",
        Month::April => "APR",
        Month::May => "MAY",
        Month::June => "JUN",
        Month::July => "JUL",
        Month::August => "AUG",
        Month::September => "SEP",
        Month::October => "OCT",
        Month::November => "NOV",
        Month::December => "DEC",
    }
}

pub fn year_dir(root: &Path, year: i32) -> PathBuf {
    root.join(year.to_string())
}

pub fn month_dir(root: &Path, year: i32, month: Month) -> PathBuf {
    year_dir(root, year).join(month_code(month))
}

pub fn archive_file_name(day: u8, month: Month) -> String {
    format!("{day:02}{}.{ARCHIVE_EXTENSION}", month_code(month))
}

/// `<root>/<YYYY>/<MON>/<DD><MON>.zip` for the cursor's day.
pub fn local_path(root: &Path, cursor: &Cursor) -> PathBuf {
    month_dir(root, cursor.year(), cursor.month())
        .join(archive_file_name(cursor.day(), cursor.month()))
}
