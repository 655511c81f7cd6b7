use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{invite, new_id, Coordinate};
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub id: String,
    pub name: String,
    pub location: String,
    pub coordinate: Option<Coordinate>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub owner_id: String,
    pub member_ids: Vec<String>,
    pub invite_code: String,
    pub created_at: DateTime<Utc>,
}

/// Editable trip fields, shared by create and update.
#[derive(Debug, Clone, Deserialize)]
pub struct TripDraft {
    pub name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub coordinate: Option<Coordinate>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl TripDraft {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::bad_request("Trip name must not be empty"));
        }
        if self.end_date < self.start_date {
            return Err(AppError::bad_request(
                "Trip end date must not be before its start date",
            ));
        }
        if let Some(coordinate) = &self.coordinate {
            if !coordinate.is_valid() {
                return Err(AppError::bad_request("Trip coordinate is out of range"));
            }
        }
        Ok(())
    }
}

impl Trip {
    pub fn new(owner_id: impl Into<String>, draft: TripDraft) -> Self {
        let owner_id = owner_id.into();
        Self {
            id: new_id("trip"),
            name: draft.name.trim().to_string(),
            location: draft.location.trim().to_string(),
            coordinate: draft.coordinate,
            start_date: draft.start_date,
            end_date: draft.end_date,
            member_ids: vec![owner_id.clone()],
            owner_id,
            invite_code: invite::generate(),
            created_at: Utc::now(),
        }
    }

    pub fn apply(&mut self, draft: TripDraft) {
        self.name = draft.name.trim().to_string();
        self.location = draft.location.trim().to_string();
        self.coordinate = draft.coordinate;
        self.start_date = draft.start_date;
        self.end_date = draft.end_date;
    }

    pub fn is_member(&self, user_id: &str) -> bool {
        self.member_ids.iter().any(|id| id == user_id)
    }

    pub fn is_owner(&self, user_id: &str) -> bool {
        self.owner_id == user_id
    }

    /// Appends the member unless already present. Returns whether it was added.
    pub fn add_member(&mut self, user_id: &str) -> bool {
        if self.is_member(user_id) {
            return false;
        }
        self.member_ids.push(user_id.to_string());
        true
    }

    pub fn remove_member(&mut self, user_id: &str) -> bool {
        let before = self.member_ids.len();
        self.member_ids.retain(|id| id != user_id);
        before != self.member_ids.len()
    }

    pub fn share_message(&self) -> String {
        format!(
            "Join my trip \"{name}\" on Get In Loser!\n\n\
             📍 {location}\n\
             📅 {start} - {end}\n\n\
             Use invite code: {code}\n\n\
             Download the app and enter this code to join!",
            name = self.name,
            location = self.location,
            start = self.start_date.format("%b %-d, %Y"),
            end = self.end_date.format("%b %-d, %Y"),
            code = self.invite_code,
        )
    }
}

/// Newest trips first, like the trip list in the apps.
pub fn sort_trips(trips: &mut [Trip]) {
    trips.sort_by(|a, b| {
        b.start_date
            .cmp(&a.start_date)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(name: &str, start: (i32, u32, u32), end: (i32, u32, u32)) -> TripDraft {
        TripDraft {
            name: name.into(),
            location: "Lisbon".into(),
            coordinate: None,
            start_date: NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
            end_date: NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap(),
        }
    }

    #[test]
    fn new_trip_has_owner_as_member_and_an_invite_code() {
        let trip = Trip::new("alice", draft("  Surf week ", (2026, 7, 1), (2026, 7, 8)));
        assert_eq!(trip.name, "Surf week");
        assert_eq!(trip.member_ids, vec!["alice".to_string()]);
        assert!(trip.is_owner("alice"));
        assert!(invite::is_valid(&trip.invite_code));
    }

    #[test]
    fn draft_rejects_inverted_dates_and_blank_names() {
        assert!(draft("Trip", (2026, 7, 8), (2026, 7, 1)).validate().is_err());
        assert!(draft("   ", (2026, 7, 1), (2026, 7, 8)).validate().is_err());
        assert!(draft("Trip", (2026, 7, 1), (2026, 7, 1)).validate().is_ok());
    }

    #[test]
    fn add_member_is_idempotent() {
        let mut trip = Trip::new("alice", draft("Trip", (2026, 7, 1), (2026, 7, 8)));
        assert!(trip.add_member("bob"));
        assert!(!trip.add_member("bob"));
        assert_eq!(trip.member_ids, vec!["alice".to_string(), "bob".to_string()]);
        assert!(trip.remove_member("bob"));
        assert!(!trip.is_member("bob"));
    }

    #[test]
    fn share_message_mentions_code_and_dates() {
        let trip = Trip::new("alice", draft("Surf", (2026, 7, 1), (2026, 7, 8)));
        let message = trip.share_message();
        assert!(message.contains(&trip.invite_code));
        assert!(message.contains("Jul 1, 2026 - Jul 8, 2026"));
    }

    #[test]
    fn trips_sort_newest_start_first() {
        let mut trips = vec![
            Trip::new("a", draft("old", (2025, 1, 1), (2025, 1, 2))),
            Trip::new("a", draft("new", (2026, 1, 1), (2026, 1, 2))),
        ];
        sort_trips(&mut trips);
        assert_eq!(trips[0].name, "new");
    }
}
