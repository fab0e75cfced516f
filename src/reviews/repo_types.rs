use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Uuid,
    pub title: String,
    pub text: String,
    pub rating: i32,
    pub bootcamp_id: Uuid,
    pub user_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub title: String,
    pub text: String,
    pub rating: i32,
    pub bootcamp_id: Uuid,
    pub user_id: Uuid,
}

/// Partial update; `None` leaves the column alone.
#[derive(Debug, Clone, Default)]
pub struct ReviewChanges {
    pub title: Option<String>,
    pub text: Option<String>,
    pub rating: Option<i32>,
}
