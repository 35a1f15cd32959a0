//! Typed temporal expressions produced by the grammar

use chrono::Weekday;
use std::fmt;

/// Unit of a relative offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemporalUnit {
    Day,
    Week,
}

/// How a weekday reference picks its occurrence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeekdayQualifier {
    /// "next friday": strictly after the reference date
    Next,
    /// "on friday", "for friday": the closest upcoming friday
    NearestUpcoming,
}

/// A date phrase extracted from an utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemporalExpression {
    Relative { unit: TemporalUnit, offset: i64 },
    WeekdayRef { weekday: Weekday, qualifier: WeekdayQualifier },
    ExplicitDate { day: u32, month: u32, year: Option<i32> },
}

impl TemporalExpression {
    pub fn days(offset: i64) -> Self {
        TemporalExpression::Relative { unit: TemporalUnit::Day, offset }
    }

    pub fn weeks(offset: i64) -> Self {
        TemporalExpression::Relative { unit: TemporalUnit::Week, offset }
    }

    pub fn weekday(weekday: Weekday, qualifier: WeekdayQualifier) -> Self {
        TemporalExpression::WeekdayRef { weekday, qualifier }
    }

    pub fn date(day: u32, month: u32, year: Option<i32>) -> Self {
        TemporalExpression::ExplicitDate { day, month, year }
    }
}

impl fmt::Display for TemporalExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemporalExpression::Relative { unit, offset } => {
                write!(f, "relative {:+} {:?}", offset, unit)
            }
            TemporalExpression::WeekdayRef { weekday, qualifier } => {
                write!(f, "{:?} {}", qualifier, weekday)
            }
            TemporalExpression::ExplicitDate { day, month, year: Some(year) } => {
                write!(f, "{:04}-{:02}-{:02}", year, month, day)
            }
            TemporalExpression::ExplicitDate { day, month, year: None } => {
                write!(f, "{:02}-{:02}", month, day)
            }
        }
    }
}
