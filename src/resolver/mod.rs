//! Temporal resolver
//!
//! Converts a [`TemporalExpression`] into a concrete [`DateRange`] relative to
//! an injected [`ReferenceInstant`]. Nothing in here reads the system clock, so
//! resolving the same expression against the same instant always gives the
//! same range.

mod range;

pub use range::{DateRange, DateRangeError};

use crate::parser::{TemporalExpression, TemporalUnit, WeekdayQualifier};
use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Weekday};
use log::debug;
use serde::{Deserialize, Serialize};

/// Leap years are at most eight years apart, so an existing day/month pair
/// always occurs within this many years of any reference date
const MAX_YEARS_AHEAD: i32 = 8;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("Invalid calendar date: day {day} of month {month}")]
    InvalidCalendarDate { day: u32, month: u32, year: Option<i32> },
    #[error("Date offset of {0} days is out of range")]
    OutOfRange(i64),
}

/// What "on friday" means when it is already friday
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SameWeekdayPolicy {
    /// Today is the friday being asked about
    Today,
    /// The friday a week from today
    #[default]
    NextWeek,
}

/// The "now" that relative expressions are resolved against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReferenceInstant {
    now: NaiveDateTime,
}

impl ReferenceInstant {
    pub fn new(now: NaiveDateTime) -> Self {
        Self { now }
    }

    /// Reference instant at midnight of the given day
    pub fn at_date(date: NaiveDate) -> Self {
        Self { now: date.and_time(NaiveTime::MIN) }
    }

    pub fn from_datetime<Z: TimeZone>(now: &DateTime<Z>) -> Self {
        Self { now: now.naive_local() }
    }

    /// Current wall-clock time in the given timezone
    ///
    /// Only the application shell should call this; library code takes the
    /// instant as a parameter.
    pub fn now_in(tz: &chrono_tz::Tz) -> Self {
        Self::from_datetime(&Local::now().with_timezone(tz))
    }

    pub fn now(&self) -> NaiveDateTime {
        self.now
    }

    pub fn date(&self) -> NaiveDate {
        self.now.date()
    }

    pub fn weekday(&self) -> Weekday {
        self.now.weekday()
    }
}

/// Resolves temporal expressions to date ranges
#[derive(Debug, Clone, Copy, Default)]
pub struct TemporalResolver {
    same_weekday: SameWeekdayPolicy,
}

impl TemporalResolver {
    pub fn new(same_weekday: SameWeekdayPolicy) -> Self {
        Self { same_weekday }
    }

    pub fn same_weekday_policy(&self) -> SameWeekdayPolicy {
        self.same_weekday
    }

    pub fn resolve(
        &self,
        expression: &TemporalExpression,
        reference: &ReferenceInstant,
    ) -> Result<DateRange, ResolveError> {
        let today = reference.date();
        let range = match *expression {
            TemporalExpression::Relative { unit: TemporalUnit::Day, offset } => {
                DateRange::single_day(add_days(today, offset)?)
            }
            TemporalExpression::Relative { unit: TemporalUnit::Week, offset } => {
                week_range(today, offset)?
            }
            TemporalExpression::WeekdayRef { weekday, qualifier } => {
                let offset = self.weekday_offset(today.weekday(), weekday, qualifier);
                DateRange::single_day(add_days(today, offset)?)
            }
            TemporalExpression::ExplicitDate { day, month, year } => {
                DateRange::single_day(explicit_date(today, day, month, year)?)
            }
        };

        // Calendar queries need the midnight after the last day
        if range.end().succ_opt().is_none() {
            return Err(ResolveError::OutOfRange((range.end() - today).num_days()));
        }

        debug!("Resolved {} against {} to {}", expression, reference.now(), range);
        Ok(range)
    }

    fn weekday_offset(&self, current: Weekday, target: Weekday, qualifier: WeekdayQualifier) -> i64 {
        let ahead = i64::from(
            (7 + target.num_days_from_monday() - current.num_days_from_monday()) % 7,
        );
        if ahead > 0 {
            return ahead;
        }

        match (qualifier, self.same_weekday) {
            (WeekdayQualifier::NearestUpcoming, SameWeekdayPolicy::Today) => 0,
            _ => 7,
        }
    }
}

fn add_days(date: NaiveDate, offset: i64) -> Result<NaiveDate, ResolveError> {
    Duration::try_days(offset)
        .and_then(|delta| date.checked_add_signed(delta))
        .ok_or(ResolveError::OutOfRange(offset))
}

/// "this week" runs from today to sunday; other weeks run monday to sunday
fn week_range(today: NaiveDate, offset: i64) -> Result<DateRange, ResolveError> {
    let days_into_week = i64::from(today.weekday().num_days_from_monday());
    let monday = add_days(today, offset.saturating_mul(7).saturating_sub(days_into_week))?;
    let sunday = add_days(monday, 6)?;
    let start = if offset == 0 { today } else { monday };
    DateRange::new(start, sunday).map_err(|_| ResolveError::OutOfRange(offset))
}

fn explicit_date(
    today: NaiveDate,
    day: u32,
    month: u32,
    year: Option<i32>,
) -> Result<NaiveDate, ResolveError> {
    let invalid = ResolveError::InvalidCalendarDate { day, month, year };

    if let Some(year) = year {
        return NaiveDate::from_ymd_opt(year, month, day).ok_or(invalid);
    }

    // 2000 is a leap year, so this only rejects pairs that never exist
    if NaiveDate::from_ymd_opt(2000, month, day).is_none() {
        return Err(invalid);
    }

    (today.year()..=today.year() + MAX_YEARS_AHEAD)
        .filter_map(|year| NaiveDate::from_ymd_opt(year, month, day))
        .find(|candidate| *candidate >= today)
        .ok_or(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{match_expression, normalize};
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    const WEEKDAYS: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn resolve_text(input: &str, reference: NaiveDate) -> Result<DateRange, ResolveError> {
        let matched = match_expression(&normalize(input)).unwrap();
        TemporalResolver::default().resolve(&matched.expression, &ReferenceInstant::at_date(reference))
    }

    #[test]
    fn test_in_two_days_scenario() {
        // 2024-03-01 is a friday
        let range = resolve_text("do i have appointments in two days", date(2024, 3, 1)).unwrap();
        assert_eq!(range, DateRange::single_day(date(2024, 3, 3)));
    }

    #[test]
    fn test_first_of_december_scenario() {
        let range = resolve_text("are there appointments on 1st of december", date(2024, 3, 1)).unwrap();
        assert_eq!(range, DateRange::single_day(date(2024, 12, 1)));
    }

    #[test]
    fn test_on_friday_scenario() {
        // 2024-03-06 is a wednesday
        let range = resolve_text("do i have an event on friday", date(2024, 3, 6)).unwrap();
        assert_eq!(range, DateRange::single_day(date(2024, 3, 8)));
    }

    #[test]
    fn test_relative_days_offsets() {
        let resolver = TemporalResolver::default();
        let reference = ReferenceInstant::at_date(date(2024, 2, 20));
        for offset in 0..=30 {
            let range = resolver.resolve(&TemporalExpression::days(offset), &reference).unwrap();
            assert_eq!(range.start(), date(2024, 2, 20) + Duration::days(offset));
            assert!(range.is_single_day());
        }
    }

    #[test]
    fn test_next_weekday_is_strictly_future() {
        let resolver = TemporalResolver::new(SameWeekdayPolicy::Today);
        let monday = date(2024, 3, 4);
        for ref_offset in 0..7 {
            let reference = ReferenceInstant::at_date(monday + Duration::days(ref_offset));
            for weekday in WEEKDAYS {
                let expression = TemporalExpression::weekday(weekday, WeekdayQualifier::Next);
                let range = resolver.resolve(&expression, &reference).unwrap();
                assert_eq!(range.start().weekday(), weekday);
                assert!(range.start() > reference.date());
                assert!(range.start() <= reference.date() + Duration::days(7));
            }
        }
    }

    #[test]
    fn test_nearest_upcoming_is_within_a_week() {
        let resolver = TemporalResolver::default();
        let reference = ReferenceInstant::at_date(date(2024, 3, 6));
        for weekday in WEEKDAYS {
            let expression = TemporalExpression::weekday(weekday, WeekdayQualifier::NearestUpcoming);
            let range = resolver.resolve(&expression, &reference).unwrap();
            assert_eq!(range.start().weekday(), weekday);
            assert!(range.start() > reference.date());
            assert!(range.start() <= reference.date() + Duration::days(7));
        }
    }

    #[test]
    fn test_same_weekday_defaults_to_next_week() {
        // asked on a friday about "on friday"
        let range = resolve_text("appointments on friday", date(2024, 3, 8)).unwrap();
        assert_eq!(range, DateRange::single_day(date(2024, 3, 15)));
    }

    #[test]
    fn test_same_weekday_today_policy() {
        let resolver = TemporalResolver::new(SameWeekdayPolicy::Today);
        let reference = ReferenceInstant::at_date(date(2024, 3, 8));
        let on_friday = TemporalExpression::weekday(Weekday::Fri, WeekdayQualifier::NearestUpcoming);
        let next_friday = TemporalExpression::weekday(Weekday::Fri, WeekdayQualifier::Next);

        assert_eq!(resolver.resolve(&on_friday, &reference).unwrap().start(), date(2024, 3, 8));
        assert_eq!(resolver.resolve(&next_friday, &reference).unwrap().start(), date(2024, 3, 15));
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let resolver = TemporalResolver::default();
        let reference = ReferenceInstant::new(date(2024, 3, 8).and_hms_opt(17, 45, 0).unwrap());
        let expression = TemporalExpression::weekday(Weekday::Fri, WeekdayQualifier::NearestUpcoming);
        let first = resolver.resolve(&expression, &reference).unwrap();
        let second = resolver.resolve(&expression, &reference).unwrap();
        assert_eq!(first, second);
    }

    #[test_case(date(2024, 3, 1), 12, 1, date(2024, 12, 1); "later this year")]
    #[test_case(date(2024, 12, 15), 12, 1, date(2025, 12, 1); "already passed rolls over")]
    #[test_case(date(2024, 12, 1), 12, 1, date(2024, 12, 1); "today counts")]
    #[test_case(date(2025, 3, 1), 2, 29, date(2028, 2, 29); "leap day waits for leap year")]
    fn test_explicit_date_without_year(reference: NaiveDate, month: u32, day: u32, expected: NaiveDate) {
        let range = TemporalResolver::default()
            .resolve(&TemporalExpression::date(day, month, None), &ReferenceInstant::at_date(reference))
            .unwrap();
        assert_eq!(range, DateRange::single_day(expected));
    }

    #[test]
    fn test_explicit_date_with_year_is_taken_as_is() {
        let range = resolve_text("march 3 2023", date(2024, 3, 1)).unwrap();
        assert_eq!(range, DateRange::single_day(date(2023, 3, 3)));
    }

    #[test]
    fn test_invalid_calendar_dates() {
        assert_eq!(
            resolve_text("on the 31st of february", date(2024, 3, 1)),
            Err(ResolveError::InvalidCalendarDate { day: 31, month: 2, year: None })
        );
        assert_eq!(
            resolve_text("29th of february 2023", date(2024, 3, 1)),
            Err(ResolveError::InvalidCalendarDate { day: 29, month: 2, year: Some(2023) })
        );
        assert!(resolve_text("april 31st", date(2024, 3, 1)).is_err());
    }

    #[test]
    fn test_week_ranges() {
        // wednesday
        let reference = date(2024, 3, 6);
        assert_eq!(
            resolve_text("this week", reference).unwrap(),
            DateRange::new(date(2024, 3, 6), date(2024, 3, 10)).unwrap()
        );
        assert_eq!(
            resolve_text("next week", reference).unwrap(),
            DateRange::new(date(2024, 3, 11), date(2024, 3, 17)).unwrap()
        );
        assert_eq!(
            resolve_text("in two weeks", reference).unwrap(),
            DateRange::new(date(2024, 3, 18), date(2024, 3, 24)).unwrap()
        );
    }

    #[test]
    fn test_yesterday_and_day_after_tomorrow() {
        let reference = date(2024, 1, 1);
        assert_eq!(resolve_text("yesterday", reference).unwrap().start(), date(2023, 12, 31));
        assert_eq!(resolve_text("day after tomorrow", reference).unwrap().start(), date(2024, 1, 3));
    }

    #[test]
    fn test_huge_offset_is_an_error() {
        let resolver = TemporalResolver::default();
        let reference = ReferenceInstant::at_date(date(2024, 1, 1));
        let result = resolver.resolve(&TemporalExpression::days(i64::MAX), &reference);
        assert_eq!(result, Err(ResolveError::OutOfRange(i64::MAX)));
    }

    #[test]
    fn test_range_ending_on_last_day_is_an_error() {
        let resolver = TemporalResolver::default();
        let reference = ReferenceInstant::at_date(date(2024, 3, 1));
        let offset = (NaiveDate::MAX - date(2024, 3, 1)).num_days();

        let result = resolver.resolve(&TemporalExpression::days(offset), &reference);
        assert_eq!(result, Err(ResolveError::OutOfRange(offset)));

        let almost = resolver.resolve(&TemporalExpression::days(offset - 1), &reference).unwrap();
        assert_eq!(almost.end().succ_opt(), Some(NaiveDate::MAX));
    }

    #[test]
    fn test_reference_instant_accessors() {
        let reference = ReferenceInstant::new(date(2024, 3, 6).and_hms_opt(9, 30, 0).unwrap());
        assert_eq!(reference.date(), date(2024, 3, 6));
        assert_eq!(reference.weekday(), Weekday::Wed);
    }
}
