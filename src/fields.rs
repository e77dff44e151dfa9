//! Construction of a schedule from individual, named fields.
//!
//! ```rust
//! use tzcrontab::CronFields;
//!
//! let cron = CronFields::builder()
//!     .minute([5, 42])
//!     .hour(14)
//!     .day_of_week("mon-fri")
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(cron.to_string(), "5,42 14 * * mon-fri *");
//! ```
//!
//! Every field defaults to `*`.

use std::fmt;

use derive_builder::Builder;

use crate::component::{CronComponent, Field};
use crate::errors::CronError;
use crate::parser::WeekStart;
use crate::pattern::CronPattern;
use crate::Cron;

/// One entry of a pre-expanded field list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldValue {
    Number(i64),
    /// A numeric string or a weekday/month name.
    Name(String),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(number) => write!(f, "{number}"),
            FieldValue::Name(name) => write!(f, "{name}"),
        }
    }
}

/// The specification of a single field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldSpec {
    /// Text in cron field syntax, run through the full grammar.
    Text(String),
    /// An explicit union of values. Entries are bounds-checked but not parsed as ranges or steps.
    Values(Vec<FieldValue>),
}

impl FieldSpec {
    fn expand(&self, field: Field) -> Result<CronComponent, CronError> {
        let mut component = CronComponent::new(field);
        match self {
            FieldSpec::Text(text) => component.parse(text)?,
            FieldSpec::Values(values) => {
                if values.is_empty() {
                    return Err(CronError::field(field, "", "Value list can not be empty."));
                }
                for value in values {
                    match value {
                        FieldValue::Number(number) => component.add_number(*number)?,
                        FieldValue::Name(name) => component.add_token(name)?,
                    }
                }
            }
        }
        Ok(component)
    }
}

impl Default for FieldSpec {
    fn default() -> Self {
        FieldSpec::Text("*".to_string())
    }
}

impl fmt::Display for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldSpec::Text(text) => write!(f, "{}", text.trim()),
            FieldSpec::Values(values) => {
                let joined: Vec<String> = values.iter().map(ToString::to_string).collect();
                write!(f, "{}", joined.join(","))
            }
        }
    }
}

impl From<&str> for FieldSpec {
    fn from(text: &str) -> Self {
        FieldSpec::Text(text.to_string())
    }
}

impl From<String> for FieldSpec {
    fn from(text: String) -> Self {
        FieldSpec::Text(text)
    }
}

impl From<i32> for FieldSpec {
    fn from(number: i32) -> Self {
        FieldSpec::Values(vec![FieldValue::Number(number.into())])
    }
}

impl From<u32> for FieldSpec {
    fn from(number: u32) -> Self {
        FieldSpec::Values(vec![FieldValue::Number(number.into())])
    }
}

impl From<Vec<i32>> for FieldSpec {
    fn from(numbers: Vec<i32>) -> Self {
        FieldSpec::Values(
            numbers
                .into_iter()
                .map(|number| FieldValue::Number(number.into()))
                .collect(),
        )
    }
}

impl<const N: usize> From<[i32; N]> for FieldSpec {
    fn from(numbers: [i32; N]) -> Self {
        numbers.to_vec().into()
    }
}

impl From<Vec<&str>> for FieldSpec {
    fn from(names: Vec<&str>) -> Self {
        FieldSpec::Values(
            names
                .into_iter()
                .map(|name| FieldValue::Name(name.to_string()))
                .collect(),
        )
    }
}

impl<const N: usize> From<[&str; N]> for FieldSpec {
    fn from(names: [&str; N]) -> Self {
        names.to_vec().into()
    }
}

impl From<Vec<FieldValue>> for FieldSpec {
    fn from(values: Vec<FieldValue>) -> Self {
        FieldSpec::Values(values)
    }
}

/// The fields of a schedule given one by one.
///
/// Use [`CronFields::builder`] to set the fields that should not match every value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Builder)]
#[builder(default, build_fn(skip), pattern = "owned", setter(into))]
pub struct CronFields {
    minute: FieldSpec,
    hour: FieldSpec,
    day_of_month: FieldSpec,
    month_of_year: FieldSpec,
    day_of_week: FieldSpec,
    year: FieldSpec,
    /// Which day the numeric day-of-week values start at.
    week_start: WeekStart,
}

impl CronFields {
    pub fn builder() -> CronFieldsBuilder {
        CronFieldsBuilder::default()
    }

    /// The equivalent six-field expression.
    ///
    /// Fields are in `minute hour day-of-month month day-of-week year` order.
    pub fn expression(&self) -> String {
        [
            &self.minute,
            &self.hour,
            &self.day_of_month,
            &self.month_of_year,
            &self.day_of_week,
            &self.year,
        ]
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
    }

    /// Expands and validates every field.
    pub fn to_cron(&self) -> Result<Cron, CronError> {
        Ok(Cron {
            pattern: CronPattern {
                pattern: self.expression(),
                minutes: self.minute.expand(Field::Minute)?,
                hours: self.hour.expand(Field::Hour)?,
                days: self.day_of_month.expand(Field::DayOfMonth)?,
                months: self.month_of_year.expand(Field::Month)?,
                days_of_week: self
                    .day_of_week
                    .expand(Field::DayOfWeek(self.week_start))?,
                years: self.year.expand(Field::Year)?,
                week_start: self.week_start,
            },
        })
    }
}

impl CronFieldsBuilder {
    /// Builds the schedule, failing on the first invalid field.
    pub fn build(self) -> Result<Cron, CronError> {
        let CronFieldsBuilder {
            minute,
            hour,
            day_of_month,
            month_of_year,
            day_of_week,
            year,
            week_start,
        } = self;

        CronFields {
            minute: minute.unwrap_or_default(),
            hour: hour.unwrap_or_default(),
            day_of_month: day_of_month.unwrap_or_default(),
            month_of_year: month_of_year.unwrap_or_default(),
            day_of_week: day_of_week.unwrap_or_default(),
            year: year.unwrap_or_default(),
            week_start: week_start.unwrap_or_default(),
        }
        .to_cron()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::CronParser;

    fn values(component: &CronComponent) -> Vec<u32> {
        component.values().collect()
    }

    #[test]
    fn test_default_fields() -> Result<(), CronError> {
        let cron = CronFields::builder().build()?;
        assert_eq!(cron.to_string(), "* * * * * *");
        assert_eq!(values(&cron.pattern.minutes), (0..60).collect::<Vec<_>>());
        assert_eq!(values(&cron.pattern.hours), (0..24).collect::<Vec<_>>());
        assert_eq!(values(&cron.pattern.days_of_week), (0..7).collect::<Vec<_>>());
        assert_eq!(values(&cron.pattern.days), (1..32).collect::<Vec<_>>());
        assert_eq!(values(&cron.pattern.months), (1..13).collect::<Vec<_>>());
        assert!(cron.pattern.years.is_wildcard());
        Ok(())
    }

    #[test]
    fn test_simple_fields() -> Result<(), CronError> {
        let cron = CronFields::builder().minute(30).build()?;
        assert_eq!(values(&cron.pattern.minutes), vec![30]);
        assert_eq!(values(&cron.pattern.hours), (0..24).collect::<Vec<_>>());
        Ok(())
    }

    #[test]
    fn test_fields_match_parsed_expression() -> Result<(), CronError> {
        let fields = CronFields::builder()
            .minute(vec![5, 42])
            .hour("12,17")
            .day_of_week(["tue", "fri"])
            .month_of_year("jan-jun")
            .year("2020-2030");
        let built = fields.build()?;
        let parsed = CronParser::new().parse("5,42 12,17 * jan-jun tue,fri 2020-2030")?;
        assert_eq!(built, parsed);
        Ok(())
    }

    #[test]
    fn test_value_lists_are_not_parsed_as_ranges() {
        let error = CronFields::builder()
            .minute(vec!["1-5"])
            .build()
            .unwrap_err();
        assert!(matches!(
            error,
            CronError::InvalidFieldSpec { field: Field::Minute, .. }
        ));
    }

    #[test]
    fn test_value_lists_are_bounds_checked() {
        assert!(CronFields::builder().minute([30, 60]).build().is_err());
        assert!(CronFields::builder().hour(-1).build().is_err());
        assert!(CronFields::builder().day_of_month(vec![31, 32]).build().is_err());
        assert!(CronFields::builder()
            .month_of_year(Vec::<FieldValue>::new())
            .build()
            .is_err());
    }

    #[test]
    fn test_week_start_applies_to_fields() -> Result<(), CronError> {
        let cron = CronFields::builder()
            .day_of_week(0)
            .week_start(WeekStart::Monday)
            .build()?;
        assert_eq!(cron.pattern.week_start, WeekStart::Monday);
        // 2010-09-13 is a Monday.
        assert!(cron.pattern.day_match(2010, 9, 13)?);
        Ok(())
    }

    #[test]
    fn test_expression() {
        let fields = CronFields {
            minute: FieldSpec::from(30),
            hour: FieldSpec::from([4, 8, 12]),
            ..Default::default()
        };
        assert_eq!(fields.expression(), "30 4,8,12 * * * *");
    }
}
