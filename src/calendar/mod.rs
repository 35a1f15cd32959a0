use crate::config::{BackendKind, CalendarConfig};
use crate::resolver::DateRange;
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;

mod caldav;
mod ical_events;
mod ics;
mod memory;

pub use caldav::*;
pub use ical_events::*;
pub use ics::*;
pub use memory::*;

/// Title used when an event has no SUMMARY
pub const UNTITLED_EVENT: &str = "untitled event";

/// Custom error type for calendar backends
#[derive(Debug, thiserror::Error)]
pub enum CalendarError {
    #[error("Calendar server could not be reached: {0}")]
    Unreachable(String),
    #[error("Invalid calendar URL {0}")]
    InvalidUrl(String),
    #[error("Calendar server answered with status {status}: {body}")]
    Http { status: u16, body: String },
    #[error("Invalid CalDAV response: {0}")]
    Xml(String),
    #[error("Invalid iCalendar data: {0}")]
    Ical(String),
    #[error("Could not read calendar file: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure of the appointment query engine
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("Calendar unavailable: {0}")]
    CalendarUnavailable(String),
}

/// A calendar entry as seen by the skill
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    pub title: String,
    /// Start in the calendar's local timezone
    pub start: NaiveDateTime,
    pub end: Option<NaiveDateTime>,
    pub all_day: bool,
    pub url: Option<String>,
}

impl EventRecord {
    pub fn new(title: impl Into<String>, start: NaiveDateTime) -> Self {
        Self { title: title.into(), start, end: None, all_day: false, url: None }
    }

    pub fn all_day(title: impl Into<String>, date: chrono::NaiveDate) -> Self {
        let start = date.and_time(chrono::NaiveTime::MIN);
        Self {
            title: title.into(),
            start,
            end: Some(start + chrono::Duration::days(1)),
            all_day: true,
            url: None,
        }
    }

    pub fn with_end(mut self, end: NaiveDateTime) -> Self {
        self.end = Some(end);
        self
    }

    /// Whether any part of the event falls inside the days of `range`
    pub fn overlaps(&self, range: &DateRange) -> bool {
        let window_start = range.start_of_window();
        let window_end = range.end_of_window();
        let end = self.end.filter(|end| *end > self.start).unwrap_or(self.start);
        self.start < window_end && (self.start >= window_start || end > window_start)
    }
}

/// The only value handed to a calendar backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppointmentQuery {
    pub range: DateRange,
}

/// Read-only access to a calendar
///
/// Implementations return the events overlapping the query range sorted by
/// start time. An empty vector is a normal answer.
#[async_trait]
pub trait CalendarBackend: Send + Sync {
    async fn events(&self, query: &AppointmentQuery) -> Result<Vec<EventRecord>, CalendarError>;

    /// Short name for logs
    fn name(&self) -> &str;
}

/// Sends appointment queries to a backend with a deadline
#[derive(Clone)]
pub struct AppointmentQueryEngine {
    backend: Arc<dyn CalendarBackend>,
    timeout: Duration,
}

impl AppointmentQueryEngine {
    pub fn new(backend: Arc<dyn CalendarBackend>, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetch the events for `range`
    ///
    /// Backend errors and timeouts both come back as
    /// [`QueryError::CalendarUnavailable`].
    pub async fn events_in(&self, range: DateRange) -> Result<Vec<EventRecord>, QueryError> {
        let query = AppointmentQuery { range };
        debug!("Querying {} backend for {}", self.backend.name(), range);

        match tokio::time::timeout(self.timeout, self.backend.events(&query)).await {
            Ok(Ok(events)) => {
                info!("Calendar returned {} events for {}", events.len(), range);
                Ok(events)
            }
            Ok(Err(e)) => {
                warn!("Calendar query for {} failed: {}", range, e);
                Err(QueryError::CalendarUnavailable(e.to_string()))
            }
            Err(_) => {
                warn!("Calendar query for {} timed out after {:?}", range, self.timeout);
                Err(QueryError::CalendarUnavailable(format!(
                    "no answer within {} ms",
                    self.timeout.as_millis()
                )))
            }
        }
    }
}

impl std::fmt::Debug for AppointmentQueryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppointmentQueryEngine")
            .field("backend", &self.backend.name())
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Build the backend selected in the configuration
pub fn build_backend(config: &CalendarConfig) -> Result<Arc<dyn CalendarBackend>> {
    let timezone = config.timezone()?;
    match config.backend {
        BackendKind::CalDav => {
            let url = config
                .url
                .as_deref()
                .ok_or_else(|| anyhow!("calendar.url must be set for the caldav backend"))?;
            let username = config
                .username
                .clone()
                .ok_or_else(|| anyhow!("calendar.username must be set for the caldav backend"))?;
            let password = config
                .password()
                .ok_or_else(|| anyhow!("No CalDAV password configured"))?;
            let calendar = CalDavCalendar::new(url, username, password, timezone)
                .context("Failed to set up CalDAV calendar")?;
            info!("Using CalDAV calendar at {}", url);
            Ok(Arc::new(calendar))
        }
        BackendKind::Ics => {
            let path = config
                .ics_path
                .clone()
                .ok_or_else(|| anyhow!("calendar.ics_path must be set for the ics backend"))?;
            info!("Using iCalendar file {}", path.display());
            Ok(Arc::new(IcsFileCalendar::new(path, timezone)))
        }
        BackendKind::Memory => {
            warn!("Using an empty in-memory calendar; configure a caldav or ics backend");
            Ok(Arc::new(InMemoryCalendar::default()))
        }
    }
}
