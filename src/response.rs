//! Response composer
//!
//! Turns the outcome of a calendar question into the sentence spoken back to
//! the user. Only replies that list appointments mention "for" and
//! "In your calendar"; every other reply avoids both.

use crate::calendar::EventRecord;
use crate::resolver::DateRange;
use chrono::{NaiveDate, NaiveDateTime};
use std::fmt;

pub const UNAVAILABLE_REPLY: &str = "Sorry, I could not reach your calendar right now.";
pub const INVALID_DATE_REPLY: &str = "Sorry, I could not understand that date.";
pub const CLARIFICATION_REPLY: &str = "Which day do you want me to check?";
pub const NO_UPCOMING_REPLY: &str = "There are no upcoming appointments in your calendar.";

/// Outcome of handling one utterance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    /// Events found (possibly none) in a resolved range
    Appointments { range: DateRange, events: Vec<EventRecord> },
    /// First event after the reference instant, if any
    NextAppointment(Option<EventRecord>),
    /// Upcoming events whose title contains `query`
    TitleMatches { query: String, events: Vec<EventRecord> },
    CalendarUnavailable,
    InvalidDate,
    /// No date was given and the skill is set to ask for one
    NeedsDate,
}

impl Answer {
    /// Whether the reply lists at least one appointment
    pub fn has_appointments(&self) -> bool {
        match self {
            Answer::Appointments { events, .. } => !events.is_empty(),
            Answer::NextAppointment(event) => event.is_some(),
            Answer::TitleMatches { events, .. } => !events.is_empty(),
            _ => false,
        }
    }

    pub fn to_reply(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Answer::Appointments { range, events } if events.is_empty() => {
                if range.is_single_day() {
                    write!(f, "You have no appointments on {}.", spoken_date(range.start()))
                } else {
                    write!(
                        f,
                        "You have no appointments between {} and {}.",
                        spoken_date(range.start()),
                        spoken_date(range.end())
                    )
                }
            }
            Answer::Appointments { range, events } => {
                let noun = if events.len() == 1 { "appointment" } else { "appointments" };
                let items: Vec<String> =
                    events.iter().map(|event| describe_event(event, range)).collect();
                write!(
                    f,
                    "In your calendar, you have {} {} for {}: {}.",
                    events.len(),
                    noun,
                    spoken_range(range),
                    join_spoken(&items)
                )
            }
            Answer::NextAppointment(Some(event)) => {
                let what = if event.all_day {
                    format!("{}, all day", event.title)
                } else {
                    format!("{} at {}", event.title, spoken_time(event.start))
                };
                write!(
                    f,
                    "In your calendar, your next appointment is for {}: {}.",
                    spoken_date(event.start.date()),
                    what
                )
            }
            Answer::NextAppointment(None) => f.write_str(NO_UPCOMING_REPLY),
            Answer::TitleMatches { query, events } if events.is_empty() => {
                write!(f, "I could not find any upcoming appointments matching \"{}\".", query)
            }
            Answer::TitleMatches { query, events } => {
                let noun = if events.len() == 1 { "appointment" } else { "appointments" };
                let items: Vec<String> = events.iter().map(describe_dated_event).collect();
                write!(
                    f,
                    "In your calendar, you have {} {} for \"{}\": {}.",
                    events.len(),
                    noun,
                    query,
                    join_spoken(&items)
                )
            }
            Answer::CalendarUnavailable => f.write_str(UNAVAILABLE_REPLY),
            Answer::InvalidDate => f.write_str(INVALID_DATE_REPLY),
            Answer::NeedsDate => f.write_str(CLARIFICATION_REPLY),
        }
    }
}

/// "Sunday, March 3"
pub fn spoken_date(date: NaiveDate) -> String {
    date.format("%A, %B %-d").to_string()
}

/// "Sunday, March 3" or "Monday, March 4 to Sunday, March 10"
pub fn spoken_range(range: &DateRange) -> String {
    if range.is_single_day() {
        spoken_date(range.start())
    } else {
        format!("{} to {}", spoken_date(range.start()), spoken_date(range.end()))
    }
}

fn spoken_time(at: NaiveDateTime) -> String {
    at.format("%H:%M").to_string()
}

fn describe_event(event: &EventRecord, range: &DateRange) -> String {
    let day = event.start.date();
    // Multi-day answers need the day; events that began earlier count as all day
    let on_day = if range.is_single_day() { String::new() } else { format!(" on {}", spoken_date(day)) };

    if event.all_day || !range.contains(day) {
        format!("{}{}, all day", event.title, on_day)
    } else {
        format!("{}{} at {}", event.title, on_day, spoken_time(event.start))
    }
}

fn describe_dated_event(event: &EventRecord) -> String {
    let day = spoken_date(event.start.date());
    if event.all_day {
        format!("{} on {}, all day", event.title, day)
    } else {
        format!("{} on {} at {}", event.title, day, spoken_time(event.start))
    }
}

fn join_spoken(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [only] => only.clone(),
        [rest @ .., last] => format!("{} and {}", rest.join("; "), last),
    }
}
