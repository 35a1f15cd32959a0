//! CalDAV backend for Nextcloud and other CalDAV servers.
//!
//! Sends a calendar-query REPORT with a VEVENT time-range filter and decodes
//! the calendar-data of every response in the multistatus body.

use super::{AppointmentQuery, CalendarBackend, CalendarError, EventRecord, parse_calendar_data};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use log::{debug, error, info};
use quick_xml::Reader;
use quick_xml::events::Event;
use reqwest::{Client, Method};
use secrecy::{ExposeSecret, SecretString};
use url::Url;

const CALDAV_TIME_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// A single calendar collection on a CalDAV server
pub struct CalDavCalendar {
    client: Client,
    calendar_url: Url,
    username: String,
    password: SecretString,
    timezone: Tz,
}

/// One `<response>` of a multistatus body that carried calendar data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarResource {
    pub href: Option<String>,
    pub data: String,
}

impl CalDavCalendar {
    pub fn new(
        calendar_url: &str,
        username: impl Into<String>,
        password: SecretString,
        timezone: Tz,
    ) -> Result<Self, CalendarError> {
        let calendar_url = Url::parse(calendar_url)
            .map_err(|e| CalendarError::InvalidUrl(format!("'{}': {}", calendar_url, e)))?;
        let client = Client::builder()
            .build()
            .map_err(|e| CalendarError::Unreachable(e.to_string()))?;

        Ok(Self { client, calendar_url, username: username.into(), password, timezone })
    }

    pub fn calendar_url(&self) -> &Url {
        &self.calendar_url
    }

    fn to_utc(&self, local: NaiveDateTime) -> DateTime<Utc> {
        // Skipped local times (DST gaps) fall back to reading the value as UTC
        self.timezone
            .from_local_datetime(&local)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| Utc.from_utc_datetime(&local))
    }

    /// Build the calendar-query REPORT body for a query
    pub fn report_body(&self, query: &AppointmentQuery) -> String {
        let start = self.to_utc(query.range.start_of_window()).format(CALDAV_TIME_FORMAT);
        let end = self.to_utc(query.range.end_of_window()).format(CALDAV_TIME_FORMAT);

        format!(
            r#"<?xml version="1.0" encoding="utf-8" ?>
<C:calendar-query xmlns:D="DAV:" xmlns:C="urn:ietf:params:xml:ns:caldav">
    <D:prop>
        <D:getetag/>
        <C:calendar-data>
            <C:expand start="{start}" end="{end}"/>
        </C:calendar-data>
    </D:prop>
    <C:filter>
        <C:comp-filter name="VCALENDAR">
            <C:comp-filter name="VEVENT">
                <C:time-range start="{start}" end="{end}"/>
            </C:comp-filter>
        </C:comp-filter>
    </C:filter>
</C:calendar-query>"#
        )
    }
}

#[async_trait]
impl CalendarBackend for CalDavCalendar {
    async fn events(&self, query: &AppointmentQuery) -> Result<Vec<EventRecord>, CalendarError> {
        let method =
            Method::from_bytes(b"REPORT").map_err(|e| CalendarError::Unreachable(e.to_string()))?;
        debug!("Sending REPORT to {} for {}", self.calendar_url, query.range);

        let response = self
            .client
            .request(method, self.calendar_url.clone())
            .basic_auth(&self.username, Some(self.password.expose_secret()))
            .header("Content-Type", "application/xml; charset=utf-8")
            .header("Depth", "1")
            .body(self.report_body(query))
            .send()
            .await
            .map_err(|e| CalendarError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("CalDAV REPORT failed: {} - {}", status, body);
            return Err(CalendarError::Http { status: status.as_u16(), body });
        }

        let text = response.text().await.map_err(|e| CalendarError::Unreachable(e.to_string()))?;
        let mut events = Vec::new();
        for resource in parse_multistatus(&text)? {
            let decoded = parse_calendar_data(&resource.data, self.timezone, resource.href.as_deref())?;
            events.extend(decoded.into_iter().filter(|event| event.overlaps(&query.range)));
        }
        events.sort_by(|a, b| a.start.cmp(&b.start));

        info!("Fetched {} events from CalDAV for {}", events.len(), query.range);
        Ok(events)
    }

    fn name(&self) -> &str {
        "caldav"
    }
}

/// Extract href and calendar-data from each response of a multistatus body
pub fn parse_multistatus(body: &str) -> Result<Vec<CalendarResource>, CalendarError> {
    let mut reader = Reader::from_str(body);
    let mut resources = Vec::new();

    let mut current_href: Option<String> = None;
    let mut in_href = false;
    let mut in_calendar_data = false;
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"response" => current_href = None,
                b"href" => {
                    in_href = true;
                    text.clear();
                }
                b"calendar-data" => {
                    in_calendar_data = true;
                    text.clear();
                }
                _ => {}
            },
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"href" if in_href => {
                    in_href = false;
                    current_href = Some(text.trim().to_string());
                }
                b"calendar-data" if in_calendar_data => {
                    in_calendar_data = false;
                    let data = text.trim();
                    if !data.is_empty() {
                        resources.push(CalendarResource {
                            href: current_href.clone(),
                            data: data.to_string(),
                        });
                    }
                }
                _ => {}
            },
            Ok(Event::Text(e)) if in_href || in_calendar_data => {
                let unescaped = e.unescape().map_err(|e| CalendarError::Xml(e.to_string()))?;
                text.push_str(&unescaped);
            }
            Ok(Event::CData(e)) if in_href || in_calendar_data => {
                text.push_str(&String::from_utf8_lossy(&e.into_inner()));
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(CalendarError::Xml(e.to_string())),
            _ => {}
        }
    }

    debug!("Multistatus contained {} calendar resources", resources.len());
    Ok(resources)
}
