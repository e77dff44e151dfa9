//! Parser for textual cron expressions.
//!
//! An expression holds the fields `minute hour day-of-month month day-of-week [year]`,
//! separated by whitespace. Invoking
//!
//! ```rust
//! # use std::str::FromStr as _;
//! #
//! # use tzcrontab::{Cron, parser::CronParser};
//! #
//! Cron::from_str("30 7 * * mon-fri");
//! ```
//!
//! is equivalent to
//!
//! ```rust
//! # use tzcrontab::parser::CronParser;
//! #
//! CronParser::new().parse("30 7 * * mon-fri");
//! ```
//!
//! You can customise the parser by creating a parser builder using
//! [`CronParser::builder`]. So, for example, to number the days of the week
//! from Monday and require the year field:
//!
//! ```rust
//! use tzcrontab::parser::{CronParser, WeekStart, Year};
//!
//! let parser = CronParser::builder()
//!     .week_start(WeekStart::Monday)
//!     .year(Year::Required)
//!     .build();
//!
//! let cron = parser.parse("0 12 * * 0 2030").unwrap();
//! assert!(parser.parse("0 12 * * 0").is_err());
//! ```

use derive_builder::Builder;
use strum::EnumIs;

use crate::{
    component::{CronComponent, Field},
    errors::CronError,
    pattern::CronPattern,
    Cron,
};

/// How the optional trailing year field is handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIs)]
pub enum Year {
    #[default]
    Optional,
    Required,
    Disallowed,
}

/// The day that day-of-week value `0` refers to.
///
/// Names such as `mon` or `friday` are mapped onto the same numbering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIs)]
pub enum WeekStart {
    #[default]
    Sunday,
    Monday,
}

/// Parser for cron expressions.
///
/// In order to build a custom cron parser use [`CronParser::builder`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Builder)]
#[builder(default, build_fn(skip), pattern = "owned")]
pub struct CronParser {
    /// Configure how years should be handled.
    year: Year,
    /// Configure which day the day-of-week numbering starts at.
    week_start: WeekStart,
}

impl CronParser {
    /// Create a new parser.
    ///
    /// You should probably be using [`Cron`]'s implementation of
    /// [`FromStr`][std::str::FromStr] instead of invoking this.
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct a builder for custom parsing.
    ///
    /// Equivalent to [`CronParserBuilder::default`].
    pub fn builder() -> CronParserBuilder {
        CronParserBuilder::default()
    }

    pub fn week_start(&self) -> WeekStart {
        self.week_start
    }

    /// Parses the cron expression string.
    pub fn parse(&self, pattern: &str) -> Result<Cron, CronError> {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return Err(CronError::EmptyPattern);
        }

        // Handle @nicknames
        let fields_source = if pattern.starts_with('@') {
            Self::handle_nicknames(pattern)?
        } else {
            pattern
        };

        let mut parts: Vec<&str> = fields_source.split_whitespace().collect();
        let num_parts = parts.len();

        match self.year {
            Year::Optional if !(5..=6).contains(&num_parts) => {
                return Err(CronError::InvalidPattern(
                    "Pattern must have 5 or 6 fields.".to_string(),
                ))
            }
            Year::Required if num_parts != 6 => {
                return Err(CronError::InvalidPattern(
                    "Pattern must have 6 fields when years are required.".to_string(),
                ))
            }
            Year::Disallowed if num_parts != 5 => {
                return Err(CronError::InvalidPattern(
                    "Pattern must have 5 fields when years are disallowed.".to_string(),
                ))
            }
            _ => {}
        }

        // Default year to "*" if omitted
        if parts.len() == 5 {
            parts.push("*");
        }

        let minutes = Self::parse_component(Field::Minute, parts[0])?;
        let hours = Self::parse_component(Field::Hour, parts[1])?;
        let days = Self::parse_component(Field::DayOfMonth, parts[2])?;
        let months = Self::parse_component(Field::Month, parts[3])?;
        let days_of_week = Self::parse_component(Field::DayOfWeek(self.week_start), parts[4])?;
        let years = Self::parse_component(Field::Year, parts[5])?;

        Ok(Cron {
            pattern: CronPattern {
                pattern: pattern.to_string(),
                minutes,
                hours,
                days,
                months,
                days_of_week,
                years,
                week_start: self.week_start,
            },
        })
    }

    fn parse_component(field: Field, spec: &str) -> Result<CronComponent, CronError> {
        let mut component = CronComponent::new(field);
        component.parse(spec)?;
        Ok(component)
    }

    // Converts named cron pattern shortcuts into their equivalent standard cron pattern.
    fn handle_nicknames(pattern: &str) -> Result<&'static str, CronError> {
        let eq_ignore_case = |a: &str, b: &str| a.eq_ignore_ascii_case(b);

        match pattern {
            p if eq_ignore_case(p, "@yearly") || eq_ignore_case(p, "@annually") => Ok("0 0 1 1 *"),
            p if eq_ignore_case(p, "@monthly") => Ok("0 0 1 * *"),
            p if eq_ignore_case(p, "@weekly") => Ok("0 0 * * sun"),
            p if eq_ignore_case(p, "@daily") || eq_ignore_case(p, "@midnight") => Ok("0 0 * * *"),
            p if eq_ignore_case(p, "@hourly") => Ok("0 * * * *"),
            p => Err(CronError::InvalidPattern(format!("Unknown nickname '{p}'."))),
        }
    }
}

impl CronParserBuilder {
    pub fn build(self) -> CronParser {
        let CronParserBuilder { year, week_start } = self;
        CronParser {
            year: year.unwrap_or_default(),
            week_start: week_start.unwrap_or_default(),
        }
    }
}
