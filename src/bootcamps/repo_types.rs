use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Bootcamp {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub website: Option<String>,
    /// Derived from the bootcamp's reviews; never written by clients.
    pub average_rating: f64,
    pub user_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewBootcamp {
    pub name: String,
    pub description: String,
    pub website: Option<String>,
    pub user_id: Uuid,
}
