//! Calendar backed by a local iCalendar (.ics) file
//!
//! The file is read on every query so edits show up without a restart.

use super::{AppointmentQuery, CalendarBackend, CalendarError, EventRecord, parse_calendar_data};
use async_trait::async_trait;
use chrono_tz::Tz;
use log::debug;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct IcsFileCalendar {
    path: PathBuf,
    timezone: Tz,
}

impl IcsFileCalendar {
    pub fn new(path: impl Into<PathBuf>, timezone: Tz) -> Self {
        Self { path: path.into(), timezone }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CalendarBackend for IcsFileCalendar {
    async fn events(&self, query: &AppointmentQuery) -> Result<Vec<EventRecord>, CalendarError> {
        let data = tokio::fs::read_to_string(&self.path).await?;
        debug!("Read {} bytes from {}", data.len(), self.path.display());

        let mut events: Vec<EventRecord> = parse_calendar_data(&data, self.timezone, None)?
            .into_iter()
            .filter(|event| event.overlaps(&query.range))
            .collect();
        events.sort_by(|a, b| a.start.cmp(&b.start));
        Ok(events)
    }

    fn name(&self) -> &str {
        "ics"
    }
}
