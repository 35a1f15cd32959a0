//! iCalendar decoding shared by the CalDAV and file backends
//!
//! Turns VEVENT components into `EventRecord`s with start and end expressed in
//! the calendar's local timezone.

use super::{CalendarError, EventRecord, UNTITLED_EVENT};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use ical::parser::ical::component::IcalEvent;
use ical::property::Property;
use log::{debug, warn};
use std::io::BufReader;

/// Parse every VEVENT in an iCalendar document
///
/// `timezone` is the local timezone of the user; all times are converted to it.
/// `url` is attached to each event (the CalDAV resource the data came from).
pub fn parse_calendar_data(
    data: &str,
    timezone: Tz,
    url: Option<&str>,
) -> Result<Vec<EventRecord>, CalendarError> {
    let parser = ical::IcalParser::new(BufReader::new(data.as_bytes()));
    let mut events = Vec::new();

    for calendar in parser {
        let calendar = calendar.map_err(|e| CalendarError::Ical(e.to_string()))?;
        for vevent in &calendar.events {
            match event_from_component(vevent, timezone) {
                Some(mut event) => {
                    event.url = url.map(str::to_string);
                    events.push(event);
                }
                None => warn!("Skipping VEVENT without a usable DTSTART"),
            }
        }
    }

    debug!("Decoded {} events from iCalendar data", events.len());
    Ok(events)
}

fn event_from_component(vevent: &IcalEvent, timezone: Tz) -> Option<EventRecord> {
    let mut title = None;
    let mut start = None;
    let mut end = None;

    for property in &vevent.properties {
        match property.name.to_uppercase().as_str() {
            "SUMMARY" => title = property.value.as_deref().map(unescape_text),
            "DTSTART" => start = parse_date_property(property, timezone),
            "DTEND" => end = parse_date_property(property, timezone),
            _ => {}
        }
    }

    let (start, all_day) = start?;
    Some(EventRecord {
        title: title.filter(|t| !t.trim().is_empty()).unwrap_or_else(|| UNTITLED_EVENT.to_string()),
        start,
        end: end.map(|(end, _)| end),
        all_day,
        url: None,
    })
}

fn param<'a>(property: &'a Property, name: &str) -> Option<&'a str> {
    property
        .params
        .as_ref()?
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .and_then(|(_, values)| values.first())
        .map(String::as_str)
}

/// Parse DTSTART/DTEND into local time, returning whether it was a date-only value
pub fn parse_date_property(property: &Property, timezone: Tz) -> Option<(NaiveDateTime, bool)> {
    let value = property.value.as_deref()?.trim();
    let date_only = param(property, "VALUE").is_some_and(|v| v.eq_ignore_ascii_case("DATE"))
        || (value.len() == 8 && !value.contains('T'));

    if date_only {
        let date = NaiveDate::parse_from_str(value, "%Y%m%d").ok()?;
        return Some((date.and_time(NaiveTime::MIN), true));
    }

    if let Some(utc_value) = value.strip_suffix('Z') {
        let naive = NaiveDateTime::parse_from_str(utc_value, "%Y%m%dT%H%M%S").ok()?;
        let utc: DateTime<Utc> = Utc.from_utc_datetime(&naive);
        return Some((utc.with_timezone(&timezone).naive_local(), false));
    }

    let naive = NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S").ok()?;
    match param(property, "TZID").and_then(|tzid| tzid.trim_start_matches('/').parse::<Tz>().ok()) {
        Some(source) => {
            let local = source.from_local_datetime(&naive).earliest()?;
            Some((local.with_timezone(&timezone).naive_local(), false))
        }
        // Floating time: already wall-clock time for the user
        None => Some((naive, false)),
    }
}

/// Undo TEXT escaping (RFC 5545 3.3.11) in one left-to-right pass
fn unescape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n' | 'N') => out.push(' '),
            Some(escaped @ (',' | ';' | '\\')) => out.push(escaped),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
