use super::{ContentShape, EntityKind, require_text};
use crate::core::{EntityError, StoreResult, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Event {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub all_day: bool,
    pub attendee_ids: Vec<UserId>,
    /// RRULE text, interpreted by the calendar UI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Event {
    pub fn ends_at(&self) -> DateTime<Utc> {
        self.end_time.unwrap_or(self.start_time)
    }

    /// True when the event intersects the half-open window `[from, to)`.
    pub fn overlaps(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> bool {
        self.start_time < to && self.ends_at() >= from
    }
}

impl ContentShape for Event {
    const KIND: EntityKind = EntityKind::Event;

    fn validate(&self) -> StoreResult<()> {
        require_text("event title", &self.title)?;
        if let Some(end_time) = self.end_time
            && end_time < self.start_time
        {
            return Err(EntityError::invalid_content("event ends before it starts"));
        }
        Ok(())
    }

    fn display_title(&self) -> Option<String> {
        Some(self.title.clone())
    }

    fn display_summary(&self) -> Option<String> {
        self.description.clone()
    }
}
