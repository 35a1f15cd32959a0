use super::{AppointmentQuery, CalendarBackend, CalendarError, EventRecord};
use async_trait::async_trait;

/// A calendar held in memory, used for tests and demos
#[derive(Debug, Clone, Default)]
pub struct InMemoryCalendar {
    events: Vec<EventRecord>,
}

impl InMemoryCalendar {
    pub fn new(mut events: Vec<EventRecord>) -> Self {
        events.sort_by(|a, b| a.start.cmp(&b.start));
        Self { events }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[async_trait]
impl CalendarBackend for InMemoryCalendar {
    async fn events(&self, query: &AppointmentQuery) -> Result<Vec<EventRecord>, CalendarError> {
        Ok(self.events.iter().filter(|event| event.overlaps(&query.range)).cloned().collect())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
