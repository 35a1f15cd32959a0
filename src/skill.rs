//! The appointment skill: utterance in, reply out
//!
//! utterance -> tokens -> expression -> range -> events -> reply

use crate::calendar::{AppointmentQueryEngine, EventRecord, QueryError, build_backend};
use crate::config::{Config, MissingDatePolicy, SkillConfig};
use crate::parser::{Intent, ParseError, parse_utterance};
use crate::resolver::{DateRange, DateRangeError, ReferenceInstant, ResolveError, TemporalResolver};
use crate::response::Answer;
use anyhow::Result;
use chrono::{Duration, NaiveDate};
use log::{debug, info, warn};

/// Why an utterance did not resolve to a date range
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

#[derive(Debug, Clone)]
pub struct AppointmentSkill {
    engine: AppointmentQueryEngine,
    resolver: TemporalResolver,
    missing_date: MissingDatePolicy,
    lookahead_days: u32,
}

impl AppointmentSkill {
    pub fn new(engine: AppointmentQueryEngine, config: &SkillConfig) -> Self {
        Self {
            engine,
            resolver: TemporalResolver::new(config.same_weekday),
            missing_date: config.missing_date,
            lookahead_days: config.next_appointment_lookahead_days,
        }
    }

    /// Build the skill and its calendar backend from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let backend = build_backend(&config.calendar)?;
        let engine = AppointmentQueryEngine::new(backend, config.calendar.timeout());
        Ok(Self::new(engine, &config.skill))
    }

    pub fn resolver(&self) -> &TemporalResolver {
        &self.resolver
    }

    /// Parse and resolve the date an utterance asks about
    pub fn resolve_utterance(
        &self,
        utterance: &str,
        reference: &ReferenceInstant,
    ) -> Result<DateRange, PipelineError> {
        let parsed = parse_utterance(utterance);
        let matched = parsed.temporal?;
        debug!("Matched rule '{}' on tokens {:?}", matched.rule, matched.span);
        Ok(self.resolver.resolve(&matched.expression, reference)?)
    }

    /// Work out the answer to an utterance
    ///
    /// A date in the utterance always wins: "any upcoming appointments on
    /// friday" is answered with friday's agenda.
    pub async fn answer(&self, utterance: &str, reference: &ReferenceInstant) -> Answer {
        let parsed = parse_utterance(utterance);

        let range = match parsed.temporal {
            Ok(matched) => match self.resolver.resolve(&matched.expression, reference) {
                Ok(range) => range,
                Err(e) => {
                    info!("Could not resolve '{}': {}", utterance, e);
                    return Answer::InvalidDate;
                }
            },
            Err(ParseError::NoTemporalExpressionFound) => match parsed.intent {
                Intent::NextAppointment => return self.next_appointment(reference).await,
                Intent::TitleSearch(query) => return self.title_search(query, reference).await,
                Intent::Agenda => match self.missing_date {
                    MissingDatePolicy::Today => DateRange::single_day(reference.date()),
                    MissingDatePolicy::AskForClarification => return Answer::NeedsDate,
                },
            },
        };

        match self.engine.events_in(range).await {
            Ok(events) => Answer::Appointments { range, events },
            Err(QueryError::CalendarUnavailable(reason)) => {
                warn!("Calendar unavailable: {}", reason);
                Answer::CalendarUnavailable
            }
        }
    }

    /// Reply to an utterance; never fails
    pub async fn handle(&self, utterance: &str, reference: &ReferenceInstant) -> String {
        let reply = self.answer(utterance, reference).await.to_reply();
        debug!("Reply to '{}': {}", utterance, reply);
        reply
    }

    async fn next_appointment(&self, reference: &ReferenceInstant) -> Answer {
        match self.upcoming_events(reference).await {
            Ok(events) => Answer::NextAppointment(events.into_iter().next()),
            Err(answer) => answer,
        }
    }

    async fn title_search(&self, query: String, reference: &ReferenceInstant) -> Answer {
        let needle = query.to_lowercase();
        match self.upcoming_events(reference).await {
            Ok(events) => {
                let events: Vec<EventRecord> = events
                    .into_iter()
                    .filter(|event| event.title.to_lowercase().contains(&needle))
                    .collect();
                debug!("{} upcoming events match '{}'", events.len(), query);
                Answer::TitleMatches { query, events }
            }
            Err(answer) => answer,
        }
    }

    /// Events in the lookahead window that start after the reference instant
    async fn upcoming_events(&self, reference: &ReferenceInstant) -> Result<Vec<EventRecord>, Answer> {
        let range = lookahead_range(reference, self.lookahead_days).map_err(|e| {
            warn!("Lookahead window is out of range: {}", e);
            Answer::InvalidDate
        })?;

        match self.engine.events_in(range).await {
            Ok(events) => {
                let now = reference.now();
                Ok(events.into_iter().filter(|event| event.start > now).collect())
            }
            Err(QueryError::CalendarUnavailable(reason)) => {
                warn!("Calendar unavailable: {}", reason);
                Err(Answer::CalendarUnavailable)
            }
        }
    }
}

fn lookahead_range(reference: &ReferenceInstant, days: u32) -> Result<DateRange, DateRangeError> {
    let start = reference.date();
    // Keep the midnight after the window representable
    let last = NaiveDate::MAX.pred_opt().unwrap_or(NaiveDate::MAX);
    let end = start
        .checked_add_signed(Duration::days(i64::from(days)))
        .unwrap_or(last)
        .min(last)
        .max(start);
    DateRange::new(start, end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{
        AppointmentQuery, CalendarBackend, CalendarError, EventRecord, InMemoryCalendar,
    };
    use crate::resolver::SameWeekdayPolicy;
    use crate::response::{CLARIFICATION_REPLY, INVALID_DATE_REPLY, UNAVAILABLE_REPLY};
    use async_trait::async_trait;
    use chrono::{NaiveDate, NaiveDateTime};
    use std::sync::Arc;
    use std::time::Duration as StdDuration;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(date: NaiveDate, h: u32, min: u32) -> NaiveDateTime {
        date.and_hms_opt(h, min, 0).unwrap()
    }

    fn skill_with(backend: Arc<dyn CalendarBackend>, config: SkillConfig) -> AppointmentSkill {
        AppointmentSkill::new(AppointmentQueryEngine::new(backend, StdDuration::from_secs(1)), &config)
    }

    fn sample_skill() -> AppointmentSkill {
        let calendar = InMemoryCalendar::new(vec![
            EventRecord::new("Dentist", at(day(2024, 3, 3), 10, 0)),
            EventRecord::new("Lunch with Sam", at(day(2024, 3, 4), 12, 30)),
            EventRecord::new("Review", at(day(2024, 12, 1), 15, 0)),
        ]);
        skill_with(Arc::new(calendar), SkillConfig::default())
    }

    struct BrokenCalendar;

    #[async_trait]
    impl CalendarBackend for BrokenCalendar {
        async fn events(&self, _query: &AppointmentQuery) -> Result<Vec<EventRecord>, CalendarError> {
            Err(CalendarError::Unreachable("connection refused".into()))
        }

        fn name(&self) -> &str {
            "broken"
        }
    }

    #[tokio::test]
    async fn test_today_with_event() {
        let reference = ReferenceInstant::new(at(day(2024, 3, 3), 8, 0));
        let reply = sample_skill().handle("Do I have an appointment today?", &reference).await;
        assert!(reply.contains("In your calendar"));
        assert!(reply.contains("for"));
        assert!(reply.contains("Dentist"));
    }

    #[tokio::test]
    async fn test_explicit_date_from_earlier_in_year() {
        let reference = ReferenceInstant::at_date(day(2024, 6, 1));
        let reply = sample_skill().handle("Any appointments on the first of December?", &reference).await;
        assert!(reply.contains("Review"), "{}", reply);
    }

    #[tokio::test]
    async fn test_empty_day() {
        let reference = ReferenceInstant::at_date(day(2024, 3, 3));
        let reply = sample_skill().handle("what about wednesday", &reference).await;
        assert_eq!(reply, "You have no appointments on Wednesday, March 6.");
    }

    #[tokio::test]
    async fn test_invalid_date() {
        let reference = ReferenceInstant::at_date(day(2024, 3, 3));
        let reply = sample_skill().handle("anything on the 31st of february", &reference).await;
        assert_eq!(reply, INVALID_DATE_REPLY);
    }

    #[tokio::test]
    async fn test_missing_date_policies() {
        let reference = ReferenceInstant::new(at(day(2024, 3, 3), 7, 0));
        let reply = sample_skill().handle("do I have any appointments", &reference).await;
        assert!(reply.contains("Dentist"), "{}", reply);

        let asking = skill_with(
            Arc::new(InMemoryCalendar::default()),
            SkillConfig { missing_date: MissingDatePolicy::AskForClarification, ..SkillConfig::default() },
        );
        assert_eq!(asking.handle("do I have any appointments", &reference).await, CLARIFICATION_REPLY);
    }

    #[tokio::test]
    async fn test_unavailable_calendar() {
        let skill = skill_with(Arc::new(BrokenCalendar), SkillConfig::default());
        let reference = ReferenceInstant::at_date(day(2024, 3, 3));
        assert_eq!(skill.handle("appointments tomorrow", &reference).await, UNAVAILABLE_REPLY);
        assert_eq!(skill.handle("what is my next appointment", &reference).await, UNAVAILABLE_REPLY);
    }

    #[tokio::test]
    async fn test_next_appointment_skips_past_events() {
        let reference = ReferenceInstant::new(at(day(2024, 3, 3), 11, 0));
        let reply = sample_skill().handle("What's my next appointment?", &reference).await;
        assert_eq!(reply, "In your calendar, your next appointment is for Monday, March 4: Lunch with Sam at 12:30.");
    }

    #[tokio::test]
    async fn test_next_appointment_outside_lookahead() {
        let reference = ReferenceInstant::new(at(day(2024, 3, 4), 13, 0));
        let reply = sample_skill().handle("next meeting", &reference).await;
        assert_eq!(reply, "There are no upcoming appointments in your calendar.");
    }

    #[tokio::test]
    async fn test_date_wins_over_next_appointment() {
        let calendar = InMemoryCalendar::new(vec![
            EventRecord::new("Standup", at(day(2024, 3, 7), 9, 0)),
            EventRecord::new("Dentist", at(day(2024, 3, 8), 10, 0)),
        ]);
        let skill = skill_with(Arc::new(calendar), SkillConfig::default());
        let wednesday = ReferenceInstant::at_date(day(2024, 3, 6));

        let reply = skill.handle("do i have any upcoming appointments on friday", &wednesday).await;
        assert_eq!(reply, "In your calendar, you have 1 appointment for Friday, March 8: Dentist at 10:00.");
    }

    #[tokio::test]
    async fn test_title_search() {
        let calendar = InMemoryCalendar::new(vec![
            EventRecord::new("Dentist", at(day(2024, 3, 1), 8, 0)),
            EventRecord::new("Team sync", at(day(2024, 3, 5), 9, 0)),
            EventRecord::new("dentist checkup", at(day(2024, 3, 12), 15, 0)),
            EventRecord::new("Dentist", at(day(2024, 6, 1), 15, 0)),
        ]);
        let skill = skill_with(Arc::new(calendar), SkillConfig::default());
        let reference = ReferenceInstant::new(at(day(2024, 3, 1), 12, 0));

        let reply = skill.handle("When is my DENTIST appointment?", &reference).await;
        assert_eq!(
            reply,
            "In your calendar, you have 1 appointment for \"dentist\": dentist checkup on Tuesday, March 12 at 15:00."
        );

        let reply = skill.handle("when is the board meeting", &reference).await;
        assert_eq!(reply, "I could not find any upcoming appointments matching \"board\".");

        let broken = skill_with(Arc::new(BrokenCalendar), SkillConfig::default());
        assert_eq!(broken.handle("when is my dentist appointment", &reference).await, UNAVAILABLE_REPLY);
    }

    #[tokio::test]
    async fn test_offset_to_last_day_is_a_graceful_reply() {
        let reference = ReferenceInstant::at_date(day(2024, 3, 1));
        let offset = (NaiveDate::MAX - day(2024, 3, 1)).num_days();
        let reply = sample_skill()
            .handle(&format!("do i have appointments in {} days", offset), &reference)
            .await;
        assert_eq!(reply, INVALID_DATE_REPLY);
    }

    #[test]
    fn test_lookahead_stays_representable() {
        let range = lookahead_range(&ReferenceInstant::at_date(NaiveDate::MAX), 30).unwrap();
        assert_eq!(range.start(), NaiveDate::MAX);
        assert_eq!(range.end(), NaiveDate::MAX);

        let near_end = NaiveDate::MAX - Duration::days(3);
        let range = lookahead_range(&ReferenceInstant::at_date(near_end), 30).unwrap();
        assert!(range.end().succ_opt().is_some());
    }

    #[test]
    fn test_resolve_utterance() {
        let skill = skill_with(
            Arc::new(InMemoryCalendar::default()),
            SkillConfig { same_weekday: SameWeekdayPolicy::Today, ..SkillConfig::default() },
        );
        let sunday = ReferenceInstant::at_date(day(2024, 3, 3));

        assert_eq!(
            skill.resolve_utterance("on sunday", &sunday),
            Ok(DateRange::single_day(day(2024, 3, 3)))
        );
        assert_eq!(
            skill.resolve_utterance("hello there", &sunday),
            Err(PipelineError::Parse(ParseError::NoTemporalExpressionFound))
        );
        assert!(matches!(
            skill.resolve_utterance("february 30", &sunday),
            Err(PipelineError::Resolve(ResolveError::InvalidCalendarDate { .. }))
        ));
    }
}
