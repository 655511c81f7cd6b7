use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The single shared note of a trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripNote {
    pub id: String,
    pub trip_id: String,
    pub content: String,
    pub last_modified_by: String,
    pub last_modified_date: DateTime<Utc>,
}

impl TripNote {
    pub fn id_for(trip_id: &str) -> String {
        format!("note_{trip_id}")
    }

    pub fn empty(trip_id: &str, user_id: &str) -> Self {
        Self::with_content(trip_id, user_id, String::new())
    }

    pub fn with_content(trip_id: &str, user_id: &str, content: String) -> Self {
        Self {
            id: Self::id_for(trip_id),
            trip_id: trip_id.to_string(),
            content,
            last_modified_by: user_id.to_string(),
            last_modified_date: Utc::now(),
        }
    }
}
