use chrono::{DateTime, NaiveDateTime, TimeZone};
use tracing::warn;

use crate::timezone::{self, ResolvedInstant};
use crate::{Cron, CronError};

/// Walks the occurrences of a schedule in one timezone, in ascending local time.
///
/// Every matching local time is yielded once, resolved into the timezone. Local times that
/// fall into a daylight-saving transition are yielded as [`ResolvedInstant::Ambiguous`] or
/// [`ResolvedInstant::NonExistent`] and iteration continues after them.
#[derive(Debug, Clone)]
pub struct CronIterator<Tz>
where
    Tz: TimeZone,
{
    cron: Cron,
    timezone: Tz,
    current: NaiveDateTime,
    inclusive: bool,
    exhausted: bool,
}

impl<Tz> CronIterator<Tz>
where
    Tz: TimeZone,
{
    /// Creates a new `CronIterator`.
    ///
    /// # Arguments
    ///
    /// * `cron` - The `Cron` schedule instance.
    /// * `start` - The `DateTime` to start iterating from, its timezone is used for every
    ///   occurrence.
    /// * `inclusive` - Whether `start` should be included in the results if it matches.
    pub fn new(cron: Cron, start: DateTime<Tz>, inclusive: bool) -> Self {
        CronIterator {
            cron,
            timezone: start.timezone(),
            current: start.naive_local(),
            inclusive,
            exhausted: false,
        }
    }
}

impl<Tz> Iterator for CronIterator<Tz>
where
    Tz: TimeZone,
{
    type Item = ResolvedInstant<Tz>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }

        match self.cron.find_next_local(&self.current, self.inclusive) {
            Ok(local) => {
                // Later searches start strictly after the previous occurrence.
                self.inclusive = false;
                self.current = local;
                Some(timezone::resolve(&local, &self.timezone))
            }
            Err(CronError::TimeSearchLimitExceeded) => {
                self.exhausted = true;
                None
            }
            Err(error) => {
                warn!(schedule = %self.cron, %error, "Stopping occurrence iteration");
                self.exhausted = true;
                None
            }
        }
    }
}
