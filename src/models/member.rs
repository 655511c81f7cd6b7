use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Profile a member shares with the trips they belong to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct TripMember {
    pub user_id: String,
    pub name: String,
    pub phone_number: String,
    pub notifications_enabled: bool,
}

impl TripMember {
    /// Stand-in for members that never saved a profile.
    pub fn anonymous(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            name: user_id.to_string(),
            phone_number: String::new(),
            notifications_enabled: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileDraft {
    pub name: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default = "enabled")]
    pub notifications_enabled: bool,
}

fn enabled() -> bool {
    true
}
