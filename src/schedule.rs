//! The polling interface: is a schedule due, and how long until its next run.

use std::fmt;

use chrono::{DateTime, Duration, TimeZone, Utc};
use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::errors::CronError;
use crate::timezone::ResolvedInstant;
use crate::Cron;

/// Outcome of one due check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduleState {
    /// `true` when the job should run now.
    pub due: bool,
    /// Advisory number of seconds until the schedule should be checked again.
    pub remaining_seconds: f64,
}

impl ScheduleState {
    /// The state reported when the next occurrence could not be resolved.
    pub const UNDETERMINED: ScheduleState = ScheduleState {
        due: false,
        remaining_seconds: 0.0,
    };
}

/// A cron schedule bound to the timezone its fields are evaluated in.
///
/// The schedule holds no state between calls. "Now" is read from its [`Clock`], which is
/// the system clock unless replaced with [`Schedule::with_clock`].
#[derive(Debug, Clone)]
pub struct Schedule<Tz: TimeZone, C: Clock = SystemClock> {
    cron: Cron,
    timezone: Tz,
    clock: C,
}

impl<Tz: TimeZone> Schedule<Tz, SystemClock> {
    /// Binds `cron` to `timezone`.
    ///
    /// Fails with `CronError::TimeSearchLimitExceeded` when the fields can never match together,
    /// like the 31st of April.
    pub fn new(cron: Cron, timezone: Tz) -> Result<Self, CronError> {
        cron.check_satisfiable()?;
        Ok(Schedule {
            cron,
            timezone,
            clock: SystemClock,
        })
    }

    /// Binds `cron` to `timezone`, or to the application-wide `default` when none is given.
    pub fn with_default_timezone(
        cron: Cron,
        timezone: Option<Tz>,
        default: Tz,
    ) -> Result<Self, CronError> {
        Self::new(cron, timezone.unwrap_or(default))
    }
}

impl<Tz: TimeZone, C: Clock> Schedule<Tz, C> {
    /// Replaces the source of the current instant.
    pub fn with_clock<K: Clock>(self, clock: K) -> Schedule<Tz, K> {
        Schedule {
            cron: self.cron,
            timezone: self.timezone,
            clock,
        }
    }

    pub fn cron(&self) -> &Cron {
        &self.cron
    }

    pub fn timezone(&self) -> &Tz {
        &self.timezone
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// The current instant in the schedule's timezone.
    pub fn now(&self) -> DateTime<Tz> {
        self.clock.now().with_timezone(&self.timezone)
    }

    /// The first occurrence strictly after `reference`, compared in the schedule's timezone.
    pub fn next_occurrence<Z: TimeZone>(
        &self,
        reference: &DateTime<Z>,
    ) -> Result<ResolvedInstant<Tz>, CronError> {
        self.cron
            .find_next_occurrence(&reference.with_timezone(&self.timezone), false)
    }

    /// Time from now until the first occurrence after `last_run`.
    ///
    /// Occurrences missed between `last_run` and now are skipped. Returns `Ok(None)` when that
    /// occurrence is ambiguous or does not exist in the timezone.
    pub fn remaining_estimate<Z: TimeZone>(
        &self,
        last_run: &DateTime<Z>,
    ) -> Result<Option<Duration>, CronError> {
        self.remaining_estimate_at(last_run, self.clock.now())
    }

    /// Like [`Schedule::remaining_estimate`], with an explicit current instant.
    pub fn remaining_estimate_at<Z: TimeZone>(
        &self,
        last_run: &DateTime<Z>,
        now: DateTime<Utc>,
    ) -> Result<Option<Duration>, CronError> {
        // Only occurrences strictly after the last run are of interest.
        let after_last_run = last_run
            .with_timezone(&Utc)
            .checked_add_signed(Duration::seconds(1))
            .ok_or(CronError::InvalidDate)?;
        let start = now.max(after_last_run).with_timezone(&self.timezone);

        match self.cron.find_next_occurrence(&start, true)? {
            ResolvedInstant::Unambiguous(next) => {
                let next = next.with_timezone(&Utc);
                let remaining = next - now;
                debug!(
                    schedule = %self.cron,
                    next = %next,
                    remaining_ms = remaining.num_milliseconds(),
                    "Estimated remaining time"
                );
                Ok(Some(remaining))
            }
            ResolvedInstant::Ambiguous(earliest, _) => {
                warn!(
                    schedule = %self.cron,
                    local = %earliest.naive_local(),
                    "Time is ambiguous in the requested timezone, the task will not be scheduled"
                );
                Ok(None)
            }
            ResolvedInstant::NonExistent(local) => {
                warn!(
                    schedule = %self.cron,
                    local = %local,
                    "Time does not exist in the requested timezone, the task will not be scheduled"
                );
                Ok(None)
            }
        }
    }

    /// Decides if the job that last ran at `last_run` is due now.
    ///
    /// When due, the remaining time looks ahead to the following occurrence. An occurrence that
    /// can not be resolved in the timezone gives [`ScheduleState::UNDETERMINED`].
    ///
    /// # Errors
    ///
    /// Only fails when the pattern has no upcoming occurrence at all.
    pub fn is_due<Z: TimeZone>(&self, last_run: &DateTime<Z>) -> Result<ScheduleState, CronError> {
        self.is_due_at(last_run, self.clock.now())
    }

    /// Like [`Schedule::is_due`], with an explicit current instant.
    pub fn is_due_at<Z: TimeZone>(
        &self,
        last_run: &DateTime<Z>,
        now: DateTime<Utc>,
    ) -> Result<ScheduleState, CronError> {
        let Some(remaining) = self.remaining_estimate_at(last_run, now)? else {
            return Ok(ScheduleState::UNDETERMINED);
        };

        let due = remaining <= Duration::zero();
        debug!(
            schedule = %self.cron,
            due,
            remaining_ms = remaining.num_milliseconds(),
            "Checked schedule"
        );
        if !due {
            return Ok(ScheduleState {
                due,
                remaining_seconds: total_seconds(remaining),
            });
        }

        // Pretend the job runs now so the hint points at the following occurrence.
        let remaining_seconds = match self.remaining_estimate_at(&now, now) {
            Ok(following) => following.map_or(0.0, total_seconds),
            Err(error) => {
                warn!(
                    schedule = %self.cron,
                    %error,
                    "No occurrence follows the due one"
                );
                0.0
            }
        };
        Ok(ScheduleState {
            due,
            remaining_seconds,
        })
    }
}

impl<Tz, C, K> PartialEq<Schedule<Tz, K>> for Schedule<Tz, C>
where
    Tz: TimeZone + PartialEq,
    C: Clock,
    K: Clock,
{
    fn eq(&self, other: &Schedule<Tz, K>) -> bool {
        self.cron == other.cron && self.timezone == other.timezone
    }
}

impl<Tz, C> fmt::Display for Schedule<Tz, C>
where
    Tz: TimeZone + fmt::Display,
    C: Clock,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @{}", self.cron, self.timezone)
    }
}

// Seconds as a float, clamped at zero.
fn total_seconds(delta: Duration) -> f64 {
    let seconds = delta.num_seconds() as f64 + f64::from(delta.subsec_nanos()) / 1e9;
    seconds.max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::FixedOffset;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn schedule(pattern: &str) -> Schedule<Utc> {
        Schedule::new(pattern.parse().unwrap(), Utc).unwrap()
    }

    #[test]
    fn test_unsatisfiable_schedule_is_rejected() {
        let cron: Cron = "0 0 31 4 *".parse().unwrap();
        assert_eq!(
            Schedule::new(cron, Utc).unwrap_err(),
            CronError::TimeSearchLimitExceeded
        );
    }

    #[test]
    fn test_default_timezone() {
        let cron: Cron = "0 12 * * *".parse().unwrap();
        let default = FixedOffset::east_opt(3600).unwrap();
        let explicit = FixedOffset::west_opt(7200).unwrap();

        let with_default = Schedule::with_default_timezone(cron.clone(), None, default).unwrap();
        assert_eq!(with_default.timezone(), &default);

        let with_explicit = Schedule::with_default_timezone(cron, Some(explicit), default).unwrap();
        assert_eq!(with_explicit.timezone(), &explicit);
    }

    #[test]
    fn test_remaining_estimate_from_now() {
        let now = utc(2010, 9, 11, 14, 30) + Duration::seconds(15);
        let schedule = schedule("* * * * *").with_clock(FixedClock::new(now));

        let remaining = schedule.remaining_estimate(&now).unwrap().unwrap();
        assert_eq!(now + remaining, utc(2010, 9, 11, 14, 31));
    }

    #[test]
    fn test_remaining_estimate_skips_last_run() {
        let schedule = schedule("30 7 * * *");
        let last_run = utc(2018, 6, 10, 7, 30);
        let now = utc(2018, 6, 9, 23, 48);

        // The last run lies ahead of now, the next occurrence comes after it.
        let remaining = schedule.remaining_estimate_at(&last_run, now).unwrap().unwrap();
        assert_eq!(now + remaining, utc(2018, 6, 11, 7, 30));
    }

    #[test]
    fn test_due_reports_following_occurrence() {
        let schedule = schedule("*/15 * * * *");
        let state = schedule
            .is_due_at(&utc(2010, 5, 10, 6, 30), utc(2010, 5, 10, 10, 15))
            .unwrap();
        assert_eq!(
            state,
            ScheduleState {
                due: true,
                remaining_seconds: 15.0 * 60.0
            }
        );
    }

    #[test]
    fn test_not_due() {
        let schedule = schedule("*/15 * * * *");
        let state = schedule
            .is_due_at(&utc(2010, 5, 10, 10, 0), utc(2010, 5, 10, 10, 14))
            .unwrap();
        assert!(!state.due);
        assert_eq!(state.remaining_seconds, 60.0);
    }

    #[test]
    fn test_fractional_remaining_seconds() {
        let schedule = schedule("* * * * *");
        let now = utc(2019, 5, 3, 7, 24) + Duration::milliseconds(250);
        let state = schedule.is_due_at(&(now - Duration::seconds(10)), now).unwrap();
        assert!(!state.due);
        assert!((state.remaining_seconds - 59.75).abs() < 1e-9);
    }

    #[test]
    fn test_clock_is_read_through_schedule() {
        let now = utc(2010, 5, 10, 10, 30);
        let schedule = schedule("30 * * * *").with_clock(move || now);
        assert_eq!(schedule.now(), now);

        let state = schedule.is_due(&utc(2010, 5, 10, 6, 30)).unwrap();
        assert!(state.due);
        assert_eq!(state.remaining_seconds, 3600.0);
    }

    #[test]
    fn test_next_occurrence_uses_schedule_timezone() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let schedule = Schedule::new("0 9 * * *".parse().unwrap(), offset).unwrap();

        // 08:00 UTC is already 10:00 at +02:00.
        let next = schedule.next_occurrence(&utc(2020, 1, 1, 8, 0)).unwrap();
        assert_eq!(
            next.single(),
            Some(&offset.with_ymd_and_hms(2020, 1, 2, 9, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_last_occurrence_is_due_without_following() {
        let schedule = schedule("0 0 1 1 * 2030");
        let now = utc(2030, 1, 1, 0, 0);
        let state = schedule.is_due_at(&utc(2029, 6, 1, 0, 0), now).unwrap();
        assert_eq!(
            state,
            ScheduleState {
                due: true,
                remaining_seconds: 0.0
            }
        );

        // Once it has run there is nothing left to wait for.
        assert_eq!(
            schedule.is_due_at(&now, now + Duration::minutes(1)),
            Err(CronError::TimeSearchLimitExceeded)
        );
    }

    #[test]
    fn test_equality_and_display() {
        let a = schedule("30 7 * * *");
        let b = schedule("30 7 * * *").with_clock(FixedClock::new(utc(2000, 1, 1, 0, 0)));
        let c = schedule("30 8 * * *");

        assert!(a == b);
        assert!(a != c);
        assert_eq!(a.to_string(), "30 7 * * * @UTC");
    }
}
