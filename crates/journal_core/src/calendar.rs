use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, TimeZone, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::entry::JournalEntry;
use crate::error::{JournalError, Result};

pub const DEFAULT_TRAILING_DAYS: u32 = 90;
/// Ten years of trailing days.
pub const MAX_TRAILING_DAYS: u32 = 3650;

/// Calendar day of `at` in `tz`. This is the bucketing key for every "same day" comparison.
pub fn day_of<Tz: TimeZone>(at: &DateTime<Utc>, tz: &Tz) -> NaiveDate {
    at.with_timezone(tz).date_naive()
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(JournalError::InvalidMonth { year, month });
        }
        Ok(Self { year, month })
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        // `new` and `containing` only admit months whose first day exists.
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn days_in_month(&self) -> u32 {
        let first = self.first_day();
        match first.checked_add_months(Months::new(1)) {
            Some(next) => next.signed_duration_since(first).num_days() as u32,
            None => 31,
        }
    }

    /// Moves forward (positive) or backward (negative) by whole months.
    pub fn shift(&self, months: i32) -> Result<Self> {
        let index = self.year * 12 + self.month as i32 - 1 + months;
        Self::new(index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MonthCell {
    Blank,
    Day(NaiveDate),
}

impl MonthCell {
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            MonthCell::Blank => None,
            MonthCell::Day(date) => Some(*date),
        }
    }
}

/// One row of the scrollable timeline.
#[derive(Debug, Clone)]
pub struct TimelineDay<'a> {
    pub date: NaiveDate,
    pub entries: Vec<&'a JournalEntry>,
}

/// Date-bucketed queries over an externally owned list of entries.
#[derive(Debug, Clone)]
pub struct CalendarIndex<Tz: TimeZone> {
    tz: Tz,
    first_weekday: Weekday,
    trailing_days: u32,
}

impl<Tz: TimeZone> CalendarIndex<Tz> {
    pub fn new(tz: Tz) -> Self {
        Self {
            tz,
            first_weekday: Weekday::Sun,
            trailing_days: DEFAULT_TRAILING_DAYS,
        }
    }

    pub fn with_first_weekday(mut self, weekday: Weekday) -> Self {
        self.first_weekday = weekday;
        self
    }

    /// Clamped to [`MAX_TRAILING_DAYS`].
    pub fn with_trailing_days(mut self, days: u32) -> Self {
        self.trailing_days = days.min(MAX_TRAILING_DAYS);
        self
    }

    pub fn timezone(&self) -> &Tz {
        &self.tz
    }

    pub fn first_weekday(&self) -> Weekday {
        self.first_weekday
    }

    pub fn trailing_days(&self) -> u32 {
        self.trailing_days
    }

    pub fn day_of(&self, at: &DateTime<Utc>) -> NaiveDate {
        day_of(at, &self.tz)
    }

    pub fn has_entries(&self, date: NaiveDate, entries: &[JournalEntry]) -> bool {
        entries.iter().any(|entry| entry.day(&self.tz) == date)
    }

    pub fn entry_count(&self, date: NaiveDate, entries: &[JournalEntry]) -> usize {
        entries
            .iter()
            .filter(|entry| entry.day(&self.tz) == date)
            .count()
    }

    /// Entries written on `date`, most recent first. Ties keep their input order.
    pub fn entries_for_date<'a>(
        &self,
        date: NaiveDate,
        entries: &'a [JournalEntry],
    ) -> Vec<&'a JournalEntry> {
        let mut matching: Vec<&JournalEntry> = entries
            .iter()
            .filter(|entry| entry.day(&self.tz) == date)
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matching
    }

    /// Today, the trailing window behind it, and every day that has an entry, newest first.
    pub fn date_range(&self, entries: &[JournalEntry], now: DateTime<Utc>) -> Vec<NaiveDate> {
        let today = self.day_of(&now);
        let mut days: BTreeSet<NaiveDate> = (0..=u64::from(self.trailing_days))
            .map_while(|back| today.checked_sub_days(Days::new(back)))
            .collect();
        days.extend(entries.iter().map(|entry| entry.day(&self.tz)));
        days.into_iter().rev().collect()
    }

    /// `date_range` with each day's entries attached.
    pub fn timeline<'a>(
        &self,
        entries: &'a [JournalEntry],
        now: DateTime<Utc>,
    ) -> Vec<TimelineDay<'a>> {
        let mut by_day: BTreeMap<NaiveDate, Vec<&'a JournalEntry>> = BTreeMap::new();
        for entry in entries {
            by_day.entry(entry.day(&self.tz)).or_default().push(entry);
        }
        self.date_range(entries, now)
            .into_iter()
            .map(|date| {
                let mut day_entries = by_day.remove(&date).unwrap_or_default();
                day_entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                TimelineDay {
                    date,
                    entries: day_entries,
                }
            })
            .collect()
    }

    /// Cells for a month view: leading blanks up to the weekday of the 1st, one cell per day,
    /// trailing blanks to complete the last week.
    pub fn days_in_month_grid(&self, month: YearMonth) -> Vec<MonthCell> {
        let first = month.first_day();
        let leading = (first.weekday().num_days_from_sunday() + 7
            - self.first_weekday.num_days_from_sunday())
            % 7;

        let mut cells: Vec<MonthCell> = vec![MonthCell::Blank; leading as usize];
        cells.extend(
            first
                .iter_days()
                .take(month.days_in_month() as usize)
                .map(MonthCell::Day),
        );
        while cells.len() % 7 != 0 {
            cells.push(MonthCell::Blank);
        }
        cells
    }

    /// Weekday column headers in display order.
    pub fn weekday_headers(&self) -> [Weekday; 7] {
        let mut headers = [self.first_weekday; 7];
        for i in 1..7 {
            headers[i] = headers[i - 1].succ();
        }
        headers
    }
}
