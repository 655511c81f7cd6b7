use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Image,
    Pdf,
    Other,
}

impl FileKind {
    pub fn from_content_type(content_type: &str) -> Self {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        if essence.starts_with("image/") {
            FileKind::Image
        } else if essence == "application/pdf" {
            FileKind::Pdf
        } else {
            FileKind::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Image => "image",
            FileKind::Pdf => "pdf",
            FileKind::Other => "other",
        }
    }

    pub fn parse(raw: &str) -> Self {
        match raw {
            "image" => FileKind::Image,
            "pdf" => FileKind::Pdf,
            _ => FileKind::Other,
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketDocument {
    pub id: String,
    pub trip_id: String,
    pub file_name: String,
    pub content_type: String,
    pub file_kind: FileKind,
    pub size_bytes: i64,
    pub uploaded_by: String,
    pub upload_date: DateTime<Utc>,
    pub file_url: String,
}

/// Most recent upload first.
pub fn sort_tickets(tickets: &mut [TicketDocument]) {
    tickets.sort_by(|a, b| b.upload_date.cmp(&a.upload_date));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_kind_follows_content_type() {
        assert_eq!(FileKind::from_content_type("image/png"), FileKind::Image);
        assert_eq!(
            FileKind::from_content_type("application/PDF; charset=binary"),
            FileKind::Pdf
        );
        assert_eq!(FileKind::from_content_type("text/plain"), FileKind::Other);
        assert_eq!(FileKind::parse(FileKind::Pdf.as_str()), FileKind::Pdf);
    }
}
