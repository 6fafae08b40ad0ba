//! Inclusive calendar-date ranges and per-year duration accounting.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;
use thiserror::Error;

pub const DAY_MS: i64 = 86_400_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("start date {start} is after end date {end}")]
pub struct InvertedRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Whole days `start..=end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, InvertedRange> {
        if start > end {
            return Err(InvertedRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Range covering both dates regardless of their order.
    pub fn spanning(a: NaiveDate, b: NaiveDate) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    /// The whole calendar year, `None` outside chrono's supported years.
    pub fn year(year: i32) -> Option<Self> {
        let start = NaiveDate::from_ymd_opt(year, 1, 1)?;
        let end = NaiveDate::from_ymd_opt(year, 12, 31)?;
        Some(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn duration(&self) -> Duration {
        Duration::days(self.days())
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn contains(&self, other: &DateRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// True when either endpoint of `self` falls inside `other`, or `self`
    /// swallows `other` whole. Equivalent to sharing at least one day.
    pub fn overlaps(&self, other: &DateRange) -> bool {
        other.contains_date(self.start) || other.contains_date(self.end) || self.contains(other)
    }

    pub fn intersection(&self, other: &DateRange) -> Option<DateRange> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start <= end).then_some(DateRange { start, end })
    }

    /// Calendar years touched by the range.
    pub fn years(&self) -> RangeInclusive<i32> {
        self.start.year()..=self.end.year()
    }

    /// Portion of the range falling inside `year`, clipped at the year's
    /// boundaries.
    pub fn year_slice(&self, year: i32) -> Duration {
        DateRange::year(year)
            .and_then(|bounds| self.intersection(&bounds))
            .map(|slice| slice.duration())
            .unwrap_or_else(Duration::zero)
    }
}

/// Sums the year slices of `ranges` for each of `years`.
///
/// Every requested year is present in the result, with a zero duration when
/// nothing falls inside it.
pub fn usage_by_year<'a, R, Y>(ranges: R, years: Y) -> BTreeMap<i32, Duration>
where
    R: IntoIterator<Item = &'a DateRange>,
    Y: IntoIterator<Item = i32>,
{
    let mut usage: BTreeMap<i32, Duration> =
        years.into_iter().map(|year| (year, Duration::zero())).collect();

    for range in ranges {
        for year in range.years() {
            if let Some(total) = usage.get_mut(&year) {
                *total += range.year_slice(year);
            }
        }
    }

    usage
}

/// Human form of a duration in days, e.g. `3 day(s)` or `1.50 day(s)`.
pub fn days_label(duration: Duration) -> String {
    let ms = duration.num_milliseconds();
    if ms % DAY_MS == 0 {
        format!("{} day(s)", ms / DAY_MS)
    } else {
        format!("{:.2} day(s)", ms as f64 / DAY_MS as f64)
    }
}
