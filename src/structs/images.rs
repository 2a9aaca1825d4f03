use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::schema::images;

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = images)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct Images {
    pub id: Uuid,
    pub user_id: Uuid,
    pub original_url: String,
    pub processed_url: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl Images {
    pub fn status(&self) -> ImageStatus {
        ImageStatus::from_column(&self.status)
    }
}

/// Pipeline status as written by the processing service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Other(String),
}

impl ImageStatus {
    pub const COMPLETED: &'static str = "COMPLETED";

    pub fn from_column(value: &str) -> Self {
        match value {
            "PENDING" => ImageStatus::Pending,
            "PROCESSING" => ImageStatus::Processing,
            Self::COMPLETED => ImageStatus::Completed,
            "FAILED" => ImageStatus::Failed,
            other => ImageStatus::Other(other.to_string()),
        }
    }

    pub fn badge(&self) -> &'static str {
        match self {
            ImageStatus::Completed => "success",
            ImageStatus::Failed => "destructive",
            _ => "secondary",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_exact_uppercase_values_are_recognized() {
        assert_eq!(ImageStatus::from_column("COMPLETED"), ImageStatus::Completed);
        assert_eq!(ImageStatus::from_column("completed"), ImageStatus::Other("completed".to_string()));
        assert_eq!(ImageStatus::from_column("FAILED"), ImageStatus::Failed);
    }

    #[test]
    fn badges_follow_terminal_status() {
        assert_eq!(ImageStatus::Completed.badge(), "success");
        assert_eq!(ImageStatus::Failed.badge(), "destructive");
        assert_eq!(ImageStatus::Pending.badge(), "secondary");
        assert_eq!(ImageStatus::Other("QUEUED".to_string()).badge(), "secondary");
    }
}
