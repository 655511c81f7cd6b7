use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::{new_id, Coordinate};
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItineraryEvent {
    pub id: String,
    pub trip_id: String,
    pub name: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub location: String,
    pub coordinate: Option<Coordinate>,
    pub notes: String,
    pub created_by: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventDraft {
    pub name: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub coordinate: Option<Coordinate>,
    #[serde(default)]
    pub notes: String,
}

impl EventDraft {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::bad_request("Event name must not be empty"));
        }
        if self.coordinate.is_some_and(|c| !c.is_valid()) {
            return Err(AppError::bad_request("Event coordinate is out of range"));
        }
        Ok(())
    }
}

impl ItineraryEvent {
    pub fn new(trip_id: &str, created_by: &str, draft: EventDraft) -> Self {
        let mut event = Self {
            id: new_id("event"),
            trip_id: trip_id.to_string(),
            name: String::new(),
            date: draft.date,
            time: draft.time,
            location: String::new(),
            coordinate: None,
            notes: String::new(),
            created_by: created_by.to_string(),
        };
        event.apply(draft);
        event
    }

    pub fn apply(&mut self, draft: EventDraft) {
        self.name = draft.name.trim().to_string();
        self.date = draft.date;
        self.time = draft.time;
        self.location = draft.location.trim().to_string();
        self.coordinate = draft.coordinate;
        self.notes = draft.notes;
    }

    /// Event start, with date and time read as UTC.
    pub fn starts_at(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self.date.and_time(self.time))
    }
}

pub fn sort_events(events: &mut [ItineraryEvent]) {
    events.sort_by(|a, b| (a.date, a.time).cmp(&(b.date, b.time)));
}
