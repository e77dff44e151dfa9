use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike, Weekday};

use crate::component::CronComponent;
use crate::errors::CronError;
use crate::parser::WeekStart;

// The expanded fields of one schedule together with the expression they came from.
//
// Matching is a strict conjunction: day-of-month and day-of-week must both accept a
// date, they are never combined with OR.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CronPattern {
    pub(crate) pattern: String, // The original expression

    pub minutes: CronComponent,
    pub hours: CronComponent,
    pub days: CronComponent,
    pub months: CronComponent,
    pub days_of_week: CronComponent,
    pub years: CronComponent,

    pub week_start: WeekStart,
}

impl CronPattern {
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    pub fn minute_match(&self, minute: u32) -> bool {
        self.minutes.contains(minute)
    }

    pub fn hour_match(&self, hour: u32) -> bool {
        self.hours.contains(hour)
    }

    pub fn month_match(&self, month: u32) -> bool {
        self.months.contains(month)
    }

    pub fn year_match(&self, year: i32) -> bool {
        u32::try_from(year).map_or(self.years.is_wildcard(), |year| self.years.contains(year))
    }

    /// Checks a calendar date against both day-of-month and day-of-week.
    ///
    /// Returns `CronError::InvalidDate` for dates that do not exist, like the 30th of February.
    pub fn day_match(&self, year: i32, month: u32, day: u32) -> Result<bool, CronError> {
        let date = NaiveDate::from_ymd_opt(year, month, day).ok_or(CronError::InvalidDate)?;
        let weekday = self.weekday_number(date.weekday());
        Ok(self.days.contains(day) && self.days_of_week.contains(weekday))
    }

    /// Position of `weekday` in the configured day-of-week numbering.
    pub fn weekday_number(&self, weekday: Weekday) -> u32 {
        match self.week_start {
            WeekStart::Sunday => weekday.num_days_from_sunday(),
            WeekStart::Monday => weekday.num_days_from_monday(),
        }
    }

    /// Evaluates if a local calendar point satisfies every field.
    ///
    /// Only whole minutes can match, a point with a non-zero second never does.
    pub fn is_matching(&self, time: &NaiveDateTime) -> bool {
        time.second() == 0
            && time.nanosecond() == 0
            && self.minute_match(time.minute())
            && self.hour_match(time.hour())
            && self.month_match(time.month())
            && self.year_match(time.year())
            && self.days.contains(time.day())
            && self
                .days_of_week
                .contains(self.weekday_number(time.weekday()))
    }

    pub fn next_minute_match(&self, minute: u32) -> Option<u32> {
        self.minutes.next_match(minute)
    }

    pub fn next_hour_match(&self, hour: u32) -> Option<u32> {
        self.hours.next_match(hour)
    }

    pub fn next_month_match(&self, month: u32) -> Option<u32> {
        self.months.next_match(month)
    }

    /// Next day-of-month value at or after `day` that fits in the given month.
    pub fn next_day_match(
        &self,
        year: i32,
        month: u32,
        day: u32,
    ) -> Result<Option<u32>, CronError> {
        let last_day = last_day_of_month(year, month)?;
        Ok(self.days.next_match(day).filter(|&d| d <= last_day))
    }

    pub fn next_year_match(&self, year: i32) -> Option<i32> {
        let from = u32::try_from(year).ok()?;
        self.years
            .next_match(from)
            .and_then(|year| i32::try_from(year).ok())
    }
}

impl fmt::Display for CronPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pattern)
    }
}

// Number of days in the given month.
pub(crate) fn last_day_of_month(year: i32, month: u32) -> Result<u32, CronError> {
    if month == 0 || month > 12 {
        return Err(CronError::InvalidDate);
    }

    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };

    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        .ok_or(CronError::InvalidDate)
}
