//! # tzcrontab
//!
//! Timezone-aware cron schedules for job-scheduling frameworks that poll their schedules
//! and dispatch the jobs that are due.
//!
//! ## Features
//! - Parses six-field cron expressions (minute, hour, day of month, month, day of week, year)
//!   or builds them from individual fields.
//! - Finds the next matching local calendar point with a calendar-aware search that always
//!   terminates.
//! - Resolves local times in any `chrono` timezone and reports times that are ambiguous or
//!   skipped by daylight-saving transitions instead of guessing.
//! - Answers the polling question "is it due, and how long until the next run".
//!
//! ## Example
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use tzcrontab::{Cron, FixedClock, Schedule};
//!
//! // Every day at 07:30
//! let cron: Cron = "30 7 * * *".parse().expect("Successful parsing");
//!
//! let now = Utc.with_ymd_and_hms(2018, 6, 9, 23, 48, 0).unwrap();
//! let schedule = Schedule::new(cron, Utc)
//!     .expect("Pattern can match")
//!     .with_clock(FixedClock::new(now));
//!
//! let last_run = Utc.with_ymd_and_hms(2018, 6, 1, 7, 30, 0).unwrap();
//! let state = schedule.is_due(&last_run).unwrap();
//!
//! assert!(!state.due);
//! assert_eq!(state.remaining_seconds, ((7 * 60 + 30 + 12) * 60) as f64);
//! ```
//!
//! ## Pattern
//!
//! ```text
//! // ┌──────────────── minute (0 - 59)
//! // │ ┌────────────── hour (0 - 23)
//! // │ │ ┌──────────── day of month (1 - 31)
//! // │ │ │ ┌────────── month (1 - 12, JAN-DEC)
//! // │ │ │ │ ┌──────── day of week (0 - 6, SUN-SAT or MON-SUN depending on configuration)
//! // │ │ │ │ │ ┌────── (optional) year (1970 - 9999)
//! // │ │ │ │ │ │
//! // * * * * * *
//! ```
//!
//! | Field        | Required | Allowed values          | Allowed special characters |
//! | ------------ | -------- | ----------------------- | -------------------------- |
//! | Minutes      | Yes      | 0-59                    | * , - /                    |
//! | Hours        | Yes      | 0-23                    | * , - /                    |
//! | Day of Month | Yes      | 1-31                    | * , - /                    |
//! | Month        | Yes      | 1-12 or JAN-DEC         | * , - /                    |
//! | Day of Week  | Yes      | 0-6 or SUN-SAT          | * , - /                    |
//! | Year         | Optional | 1970-9999               | * , - /                    |
//!
//! Day of month and day of week are combined with AND: when both are restricted, a date
//! has to satisfy both of them.

pub mod clock;
pub mod component;
pub mod errors;
pub mod fields;
pub mod iterator;
pub mod parser;
pub mod pattern;
pub mod schedule;
pub mod timezone;

pub use clock::{Clock, FixedClock, SystemClock};
pub use errors::CronError;
pub use fields::{CronFields, FieldSpec, FieldValue};
pub use schedule::{Schedule, ScheduleState};
pub use timezone::ResolvedInstant;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, TimeZone, Timelike};

use iterator::CronIterator;
use parser::CronParser;
use pattern::{last_day_of_month, CronPattern};

pub const YEAR_LOWER_LIMIT: i32 = 1970;
pub const YEAR_UPPER_LIMIT: i32 = 9999;

// A Gregorian calendar repeats itself, weekdays included, every 400 years.
const YEAR_SEARCH_LIMIT: u32 = 400;

#[derive(Clone, Copy)]
enum TimeComponent {
    Minute,
    Hour,
    Day,
    Month,
    Year,
}

// The Cron struct represents a parsed cron schedule and provides methods to check
// if a datetime matches it and to find the next occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cron {
    pub pattern: CronPattern, // Parsed cron pattern
}

impl Cron {
    /// Evaluates if a given `DateTime` matches the cron pattern, using its local wall-clock time.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::{FixedOffset, TimeZone};
    /// use tzcrontab::Cron;
    ///
    /// let cron: Cron = "0 12 * * *".parse().expect("Couldn't parse cron string");
    /// let noon = FixedOffset::east_opt(3600)
    ///     .unwrap()
    ///     .with_ymd_and_hms(2023, 1, 1, 12, 0, 0)
    ///     .unwrap();
    ///
    /// assert!(cron.is_time_matching(&noon));
    /// ```
    pub fn is_time_matching<Tz: TimeZone>(&self, time: &DateTime<Tz>) -> bool {
        self.pattern.is_matching(&time.naive_local())
    }

    /// Finds the smallest local calendar point strictly greater than `reference`
    /// that matches every field.
    ///
    /// The result is always aligned to a whole minute.
    pub fn next_local(&self, reference: &NaiveDateTime) -> Result<NaiveDateTime, CronError> {
        self.find_next_local(reference, false)
    }

    /// Finds the next local calendar point that matches the pattern, starting from `start`.
    /// If `inclusive` is `true` the search includes `start` itself, otherwise it starts
    /// from the next second. A start with a fractional second is rounded up.
    ///
    /// The search advances field by field: when no minute of the current hour matches the hour
    /// is advanced, when no hour of the day matches the day is advanced, and so on up to the
    /// year. Each advance resets all finer components to their minimum.
    ///
    /// # Errors
    ///
    /// - `CronError::TimeSearchLimitExceeded`: when no match exists within a full Gregorian
    ///   cycle of years, or when every allowed year has passed. This prevents endless searching
    ///   for patterns like the 31st of April.
    /// - `CronError::InvalidDate`: when the search runs off the representable calendar.
    pub fn find_next_local(
        &self,
        start: &NaiveDateTime,
        inclusive: bool,
    ) -> Result<NaiveDateTime, CronError> {
        let start = if inclusive {
            *start
        } else {
            start
                .checked_add_signed(Duration::seconds(1))
                .ok_or(CronError::InvalidDate)?
        };

        let mut cursor = Cursor::from_naive(&start);
        if start.second() > 0 || start.nanosecond() > 0 {
            cursor.increment(TimeComponent::Minute)?;
        }

        let mut searched_year = cursor.year;
        let mut years_searched = 0;

        loop {
            if cursor.year != searched_year {
                searched_year = cursor.year;
                years_searched += 1;
                if years_searched > YEAR_SEARCH_LIMIT {
                    return Err(CronError::TimeSearchLimitExceeded);
                }
            }

            match self.pattern.next_year_match(cursor.year) {
                None => return Err(CronError::TimeSearchLimitExceeded),
                Some(year) if year != cursor.year => {
                    cursor.set_year(year);
                    continue;
                }
                _ => {}
            }

            match self.pattern.next_month_match(cursor.month) {
                None => {
                    cursor.increment(TimeComponent::Year)?;
                    continue;
                }
                Some(month) if month != cursor.month => {
                    cursor.set_month(month);
                    continue;
                }
                _ => {}
            }

            match self.pattern.next_day_match(cursor.year, cursor.month, cursor.day)? {
                None => {
                    cursor.increment(TimeComponent::Month)?;
                    continue;
                }
                Some(day) if day != cursor.day => {
                    cursor.set_day(day);
                    continue;
                }
                _ => {}
            }

            if !self.pattern.day_match(cursor.year, cursor.month, cursor.day)? {
                cursor.increment(TimeComponent::Day)?;
                continue;
            }

            match self.pattern.next_hour_match(cursor.hour) {
                None => {
                    cursor.increment(TimeComponent::Day)?;
                    continue;
                }
                Some(hour) if hour != cursor.hour => {
                    cursor.set_hour(hour);
                    continue;
                }
                _ => {}
            }

            match self.pattern.next_minute_match(cursor.minute) {
                None => {
                    cursor.increment(TimeComponent::Hour)?;
                    continue;
                }
                Some(minute) if minute != cursor.minute => {
                    cursor.minute = minute;
                    continue;
                }
                _ => {}
            }

            return cursor.to_naive();
        }
    }

    /// Finds the next occurrence at or after (`inclusive`) or strictly after `start`, comparing
    /// wall-clock time in the timezone of `start`, and resolves it back into that timezone.
    ///
    /// The result is a [`ResolvedInstant`], which reports local times that occur twice or not
    /// at all in the timezone rather than picking one interpretation.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use tzcrontab::{Cron, ResolvedInstant};
    ///
    /// let cron: Cron = "5,42 * * * *".parse().unwrap();
    /// let start = Utc.with_ymd_and_hms(2010, 9, 11, 14, 30, 15).unwrap();
    ///
    /// let next = cron.find_next_occurrence(&start, false).unwrap();
    /// assert_eq!(
    ///     next,
    ///     ResolvedInstant::Unambiguous(Utc.with_ymd_and_hms(2010, 9, 11, 14, 42, 0).unwrap())
    /// );
    /// ```
    pub fn find_next_occurrence<Tz: TimeZone>(
        &self,
        start: &DateTime<Tz>,
        inclusive: bool,
    ) -> Result<ResolvedInstant<Tz>, CronError> {
        let local = self.find_next_local(&start.naive_local(), inclusive)?;
        Ok(timezone::resolve(&local, &start.timezone()))
    }

    /// Checks that the fields can match together at all.
    ///
    /// Searches from the start of the supported year range, so a pattern restricted to past
    /// years still passes.
    pub fn check_satisfiable(&self) -> Result<(), CronError> {
        let earliest = NaiveDate::from_ymd_opt(YEAR_LOWER_LIMIT, 1, 1)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .ok_or(CronError::InvalidDate)?;
        self.find_next_local(&earliest, true).map(|_| ())
    }

    /// Creates a `CronIterator` starting from the specified time.
    ///
    /// The iterator yields the resolved occurrences of the schedule, beginning at
    /// `start_from` if it matches.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use tzcrontab::Cron;
    ///
    /// let cron: Cron = "0 0 * * *".parse().unwrap();
    /// let start = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
    ///
    /// let first = cron.iter_from(start).next().unwrap();
    /// assert_eq!(first.single(), Some(&start));
    /// ```
    pub fn iter_from<Tz: TimeZone>(&self, start_from: DateTime<Tz>) -> CronIterator<Tz> {
        CronIterator::new(self.clone(), start_from, true)
    }

    /// Creates a `CronIterator` starting after the specified time.
    ///
    /// The iterator will not yield `start_after` itself, only the occurrences that come
    /// after it.
    pub fn iter_after<Tz: TimeZone>(&self, start_after: DateTime<Tz>) -> CronIterator<Tz> {
        CronIterator::new(self.clone(), start_after, false)
    }
}

// Enables creating a Cron instance from a string slice, using the default parser.
impl FromStr for Cron {
    type Err = CronError;

    fn from_str(cron_string: &str) -> Result<Cron, CronError> {
        CronParser::new().parse(cron_string)
    }
}

impl fmt::Display for Cron {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pattern)
    }
}

#[cfg(feature = "serde")]
mod serialization {
    use std::str::FromStr;

    use serde::de::{self, Visitor};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use crate::Cron;

    impl Serialize for Cron {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            serializer.serialize_str(self.pattern.as_str())
        }
    }

    struct CronVisitor;

    impl Visitor<'_> for CronVisitor {
        type Value = Cron;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a valid cron expression")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Cron::from_str(value).map_err(de::Error::custom)
        }
    }

    impl<'de> Deserialize<'de> for Cron {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            deserializer.deserialize_str(CronVisitor)
        }
    }
}

// Minute-resolution calendar position used while searching.
#[derive(Debug, Clone, Copy)]
struct Cursor {
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
}

impl Cursor {
    fn from_naive(time: &NaiveDateTime) -> Self {
        Self {
            year: time.year(),
            month: time.month(),
            day: time.day(),
            hour: time.hour(),
            minute: time.minute(),
        }
    }

    fn to_naive(self) -> Result<NaiveDateTime, CronError> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
            .and_then(|date| date.and_hms_opt(self.hour, self.minute, 0))
            .ok_or(CronError::InvalidDate)
    }

    fn set_year(&mut self, year: i32) {
        *self = Self {
            year,
            month: 1,
            day: 1,
            hour: 0,
            minute: 0,
        };
    }

    // Each setter resets every finer component to its minimum.
    fn set_month(&mut self, month: u32) {
        self.month = month;
        self.day = 1;
        self.hour = 0;
        self.minute = 0;
    }

    fn set_day(&mut self, day: u32) {
        self.day = day;
        self.hour = 0;
        self.minute = 0;
    }

    fn set_hour(&mut self, hour: u32) {
        self.hour = hour;
        self.minute = 0;
    }

    // Advance one component by one, carrying overflow into the next coarser component.
    fn increment(&mut self, component: TimeComponent) -> Result<(), CronError> {
        match component {
            TimeComponent::Year => {
                let year = self.year.checked_add(1).ok_or(CronError::InvalidDate)?;
                self.set_year(year);
            }
            TimeComponent::Month => {
                if self.month >= 12 {
                    self.increment(TimeComponent::Year)?;
                } else {
                    self.set_month(self.month + 1);
                }
            }
            TimeComponent::Day => {
                if self.day >= last_day_of_month(self.year, self.month)? {
                    self.increment(TimeComponent::Month)?;
                } else {
                    self.set_day(self.day + 1);
                }
            }
            TimeComponent::Hour => {
                if self.hour >= 23 {
                    self.increment(TimeComponent::Day)?;
                } else {
                    self.set_hour(self.hour + 1);
                }
            }
            TimeComponent::Minute => {
                if self.minute >= 59 {
                    self.increment(TimeComponent::Hour)?;
                } else {
                    self.minute += 1;
                }
            }
        }
        Ok(())
    }
}
