//! Resolution of local calendar points into absolute instants.

use chrono::{DateTime, LocalResult, NaiveDateTime, TimeZone};
use strum::EnumIs;

use crate::errors::CronError;

/// The outcome of mapping a local wall-clock time onto a timezone.
#[derive(Debug, Clone, PartialEq, EnumIs)]
pub enum ResolvedInstant<Tz: TimeZone> {
    /// The local time occurs exactly once.
    Unambiguous(DateTime<Tz>),
    /// The local time occurs twice, around a "fall back" transition. Holds the earlier and the
    /// later instant.
    Ambiguous(DateTime<Tz>, DateTime<Tz>),
    /// The local time is skipped by a "spring forward" transition.
    NonExistent(NaiveDateTime),
}

impl<Tz: TimeZone> ResolvedInstant<Tz> {
    /// The instant, if the local time resolved to exactly one.
    pub fn single(&self) -> Option<&DateTime<Tz>> {
        match self {
            ResolvedInstant::Unambiguous(instant) => Some(instant),
            _ => None,
        }
    }

    /// Converts into a `Result`, turning ambiguous and non-existent local times into errors.
    pub fn into_result(self) -> Result<DateTime<Tz>, CronError> {
        match self {
            ResolvedInstant::Unambiguous(instant) => Ok(instant),
            ResolvedInstant::Ambiguous(earliest, _) => {
                Err(CronError::AmbiguousLocalTime(earliest.naive_local()))
            }
            ResolvedInstant::NonExistent(local) => Err(CronError::NonExistentLocalTime(local)),
        }
    }
}

/// Maps `local` onto `timezone`, without guessing when the mapping is not unique.
pub fn resolve<Tz: TimeZone>(local: &NaiveDateTime, timezone: &Tz) -> ResolvedInstant<Tz> {
    match timezone.from_local_datetime(local) {
        LocalResult::Single(instant) => ResolvedInstant::Unambiguous(instant),
        LocalResult::Ambiguous(earliest, latest) => ResolvedInstant::Ambiguous(earliest, latest),
        LocalResult::None => ResolvedInstant::NonExistent(*local),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, FixedOffset, NaiveDate, Utc};
    use chrono_tz::Europe::Paris;

    fn local(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn test_fixed_offsets_are_unambiguous() {
        let resolved = resolve(&local(2023, 1, 1, 12, 0), &Utc);
        assert_eq!(
            resolved,
            ResolvedInstant::Unambiguous(Utc.with_ymd_and_hms(2023, 1, 1, 12, 0, 0).unwrap())
        );

        let offset = FixedOffset::west_opt(3600).unwrap();
        assert!(resolve(&local(2023, 1, 1, 12, 0), &offset).is_unambiguous());
    }

    #[test]
    fn test_fall_back_is_ambiguous() {
        // Clocks in Paris went back from 03:00 to 02:00 on 2017-10-29.
        let resolved = resolve(&local(2017, 10, 29, 2, 30), &Paris);
        match resolved {
            ResolvedInstant::Ambiguous(earliest, latest) => {
                assert_eq!(latest.clone() - earliest.clone(), Duration::hours(1));
                assert_eq!(
                    earliest.with_timezone(&Utc),
                    Utc.with_ymd_and_hms(2017, 10, 29, 0, 30, 0).unwrap()
                );
            }
            other => panic!("expected an ambiguous time, got {other:?}"),
        }
    }

    #[test]
    fn test_spring_forward_does_not_exist() {
        // Clocks in Paris jumped from 02:00 to 03:00 on 2017-03-26.
        let missing = local(2017, 3, 26, 2, 30);
        assert_eq!(resolve(&missing, &Paris), ResolvedInstant::NonExistent(missing));
        assert!(resolve(&local(2017, 3, 26, 3, 0), &Paris).is_unambiguous());
    }

    #[test]
    fn test_into_result() {
        let missing = local(2017, 3, 26, 2, 30);
        assert_eq!(
            resolve(&missing, &Paris).into_result(),
            Err(CronError::NonExistentLocalTime(missing))
        );

        let repeated = local(2017, 10, 29, 2, 30);
        assert_eq!(
            resolve(&repeated, &Paris).into_result(),
            Err(CronError::AmbiguousLocalTime(repeated))
        );

        assert!(resolve(&local(2017, 7, 1, 9, 0), &Paris).into_result().is_ok());
    }
}
