use std::collections::BTreeSet;

use strum::{Display, EnumIs};

use crate::errors::CronError;
use crate::parser::WeekStart;
use crate::{YEAR_LOWER_LIMIT, YEAR_UPPER_LIMIT};

// Weekday names, numbered from Sunday.
const WEEKDAY_NAMES: [(&str, u32); 18] = [
    ("sun", 0),
    ("sunday", 0),
    ("mon", 1),
    ("monday", 1),
    ("tue", 2),
    ("tues", 2),
    ("tuesday", 2),
    ("wed", 3),
    ("weds", 3),
    ("wednesday", 3),
    ("thu", 4),
    ("thur", 4),
    ("thurs", 4),
    ("thursday", 4),
    ("fri", 5),
    ("friday", 5),
    ("sat", 6),
    ("saturday", 6),
];

const MONTH_NAMES: [(&str, u32); 24] = [
    ("jan", 1),
    ("january", 1),
    ("feb", 2),
    ("february", 2),
    ("mar", 3),
    ("march", 3),
    ("apr", 4),
    ("april", 4),
    ("may", 5),
    ("jun", 6),
    ("june", 6),
    ("jul", 7),
    ("july", 7),
    ("aug", 8),
    ("august", 8),
    ("sep", 9),
    ("sept", 9),
    ("september", 9),
    ("oct", 10),
    ("october", 10),
    ("nov", 11),
    ("november", 11),
    ("dec", 12),
    ("december", 12),
];

/// The six fields of a cron schedule, in expression order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIs)]
pub enum Field {
    #[strum(to_string = "minute")]
    Minute,
    #[strum(to_string = "hour")]
    Hour,
    #[strum(to_string = "day-of-month")]
    DayOfMonth,
    #[strum(to_string = "month-of-year")]
    Month,
    /// Day of week, numbered from the configured first day of the week.
    #[strum(to_string = "day-of-week")]
    DayOfWeek(WeekStart),
    #[strum(to_string = "year")]
    Year,
}

impl Field {
    /// Inclusive bounds of the values accepted by this field.
    pub fn bounds(&self) -> (u32, u32) {
        match self {
            Field::Minute => (0, 59),
            Field::Hour => (0, 23),
            Field::DayOfMonth => (1, 31),
            Field::Month => (1, 12),
            Field::DayOfWeek(_) => (0, 6),
            Field::Year => (YEAR_LOWER_LIMIT as u32, YEAR_UPPER_LIMIT as u32),
        }
    }

    // Resolves a case-insensitive weekday or month name to its numeric position.
    fn alias(&self, name: &str) -> Option<u32> {
        let lookup = |table: &[(&str, u32)]| {
            table
                .iter()
                .find(|(alias, _)| alias.eq_ignore_ascii_case(name))
                .map(|&(_, value)| value)
        };

        match self {
            Field::DayOfWeek(week_start) => {
                let from_sunday = lookup(&WEEKDAY_NAMES)?;
                Some(match week_start {
                    WeekStart::Sunday => from_sunday,
                    WeekStart::Monday => (from_sunday + 6) % 7,
                })
            }
            Field::Month => lookup(&MONTH_NAMES),
            _ => None,
        }
    }
}

/// One expanded cron field: the set of values it accepts within its bounds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CronComponent {
    field: Field,
    pub min: u32,
    pub max: u32,
    values: BTreeSet<u32>,
    wildcard: bool, // Set when the field was given as `*`
}

impl CronComponent {
    // Initialize an empty component for the given field.
    pub fn new(field: Field) -> Self {
        let (min, max) = field.bounds();
        Self {
            field,
            min,
            max,
            values: BTreeSet::new(),
            wildcard: false,
        }
    }

    /// Creates a component accepting every value in its range.
    pub fn any(field: Field) -> Self {
        let mut component = Self::new(field);
        component.set_all();
        component
    }

    pub fn field(&self) -> Field {
        self.field
    }

    /// `true` if the field was left unrestricted.
    pub fn is_wildcard(&self) -> bool {
        self.wildcard
    }

    /// The accepted values in ascending order.
    pub fn values(&self) -> impl Iterator<Item = u32> + '_ {
        self.values.iter().copied()
    }

    // Add a single accepted value.
    pub fn set_value(&mut self, pos: u32) -> Result<(), CronError> {
        if pos < self.min || pos > self.max {
            return Err(CronError::field(
                self.field,
                &pos.to_string(),
                format!(
                    "Position {} is out of bounds for the current range ({}-{}).",
                    pos, self.min, self.max
                ),
            ));
        }
        self.values.insert(pos);
        Ok(())
    }

    pub fn contains(&self, value: u32) -> bool {
        self.wildcard || self.values.contains(&value)
    }

    /// Smallest accepted value that is greater than or equal to `from`.
    ///
    /// An unrestricted year field accepts any year, even outside of its nominal bounds.
    pub fn next_match(&self, from: u32) -> Option<u32> {
        if self.wildcard && self.field.is_year() {
            return Some(from);
        }
        self.values.range(from..).next().copied()
    }

    /// Parses a textual field specification.
    ///
    /// Accepts a comma separated union of `*`, literals, names, ranges `a-b`
    /// and steps `*/n`, `a/n` or `a-b/n`.
    pub fn parse(&mut self, field: &str) -> Result<(), CronError> {
        let field = field.trim();
        if field.is_empty() {
            return Err(CronError::field(self.field, field, "Field can not be empty."));
        }

        for part in field.split(',') {
            let part = part.trim();
            if part.is_empty() {
                return Err(CronError::field(self.field, field, "Empty list entry."));
            } else if part == "*" {
                self.set_all();
            } else if part.contains('/') {
                self.handle_stepping(part)?;
            } else if part.contains('-') {
                self.handle_range(part)?;
            } else {
                let value = self.parse_value(part)?;
                self.set_value(value)?;
            }
        }

        Ok(())
    }

    /// Adds one pre-expanded entry, a number or a name, without applying the range grammar.
    pub fn add_token(&mut self, token: &str) -> Result<(), CronError> {
        let value = self.parse_value(token.trim())?;
        self.set_value(value)
    }

    /// Adds one pre-expanded numeric entry.
    pub fn add_number(&mut self, number: i64) -> Result<(), CronError> {
        let value = u32::try_from(number).map_err(|_| {
            CronError::field(
                self.field,
                &number.to_string(),
                format!("Number out of bounds ({}-{}).", self.min, self.max),
            )
        })?;
        self.set_value(value)
    }

    fn set_all(&mut self) {
        self.values.extend(self.min..=self.max);
        self.wildcard = true;
    }

    // Parses a literal number or a name alias into a bounds-checked value.
    fn parse_value(&self, token: &str) -> Result<u32, CronError> {
        if token.is_empty() {
            return Err(CronError::field(self.field, token, "Missing value."));
        }

        let value = if token.bytes().all(|b| b.is_ascii_digit()) {
            token
                .parse::<u32>()
                .map_err(|_| CronError::field(self.field, token, "Invalid number."))?
        } else {
            self.field
                .alias(token)
                .ok_or_else(|| CronError::field(self.field, token, "Unrecognized name."))?
        };

        if value < self.min || value > self.max {
            return Err(CronError::field(
                self.field,
                token,
                format!("Number out of bounds ({}-{}).", self.min, self.max),
            ));
        }
        Ok(value)
    }

    fn handle_range(&mut self, range: &str) -> Result<(), CronError> {
        let (start, end) = self.parse_bounds(range)?;
        for value in start..=end {
            self.set_value(value)?;
        }
        Ok(())
    }

    // Parses `a-b`, rejecting reversed ranges.
    fn parse_bounds(&self, range: &str) -> Result<(u32, u32), CronError> {
        let (start, end) = range
            .split_once('-')
            .ok_or_else(|| CronError::field(self.field, range, "Invalid range syntax."))?;
        let start = self.parse_value(start.trim())?;
        let end = self.parse_value(end.trim())?;

        if start > end {
            return Err(CronError::field(
                self.field,
                range,
                "Range start is after range end.",
            ));
        }
        Ok((start, end))
    }

    fn handle_stepping(&mut self, stepped_range: &str) -> Result<(), CronError> {
        let (range_part, step_str) = stepped_range
            .split_once('/')
            .ok_or_else(|| CronError::field(self.field, stepped_range, "Invalid step syntax."))?;

        let step_str = step_str.trim();
        if step_str.is_empty() || !step_str.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CronError::field(self.field, stepped_range, "Invalid step."));
        }
        let step = step_str
            .parse::<u32>()
            .map_err(|_| CronError::field(self.field, stepped_range, "Invalid step."))?;
        if step == 0 {
            return Err(CronError::field(
                self.field,
                stepped_range,
                "Step cannot be zero.",
            ));
        }

        let range_part = range_part.trim();
        let (start, end) = if range_part == "*" {
            (self.min, self.max)
        } else if range_part.contains('-') {
            self.parse_bounds(range_part)?
        } else {
            // A single start runs up to the end of the field's range.
            (self.parse_value(range_part)?, self.max)
        };

        for value in (start..=end).step_by(step as usize) {
            self.set_value(value)?;
        }
        Ok(())
    }
}
