use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub trip_id: String,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub read: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EventReminder {
    pub event_id: String,
    pub trip_id: String,
    pub slot: i64,
    pub fire_at: DateTime<Utc>,
    pub delivered: bool,
}
