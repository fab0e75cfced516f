use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::bootcamps::repo_types::{Bootcamp, NewBootcamp};
use crate::error::{AppError, AppResult};

#[async_trait]
pub trait BootcampStore: Send + Sync {
    async fn count(&self) -> AppResult<i64>;
    /// Oldest first.
    async fn list(&self, limit: i64, offset: i64) -> AppResult<Vec<Bootcamp>>;
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Bootcamp>>;
    async fn create(&self, new_bootcamp: NewBootcamp) -> AppResult<Bootcamp>;
    /// Returns whether a row was removed.
    async fn delete(&self, id: Uuid) -> AppResult<bool>;
    async fn set_average_rating(&self, id: Uuid, average_rating: f64) -> AppResult<()>;
}

#[derive(Clone)]
pub struct PgBootcampStore {
    db: PgPool,
}

impl PgBootcampStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BootcampStore for PgBootcampStore {
    async fn count(&self) -> AppResult<i64> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM bootcamps")
            .fetch_one(&self.db)
            .await?;
        Ok(n)
    }

    async fn list(&self, limit: i64, offset: i64) -> AppResult<Vec<Bootcamp>> {
        let rows = sqlx::query_as::<_, Bootcamp>(
            r#"
            SELECT id, name, description, website, average_rating, user_id, created_at
              FROM bootcamps
             ORDER BY created_at ASC, id ASC
             LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Bootcamp>> {
        let row = sqlx::query_as::<_, Bootcamp>(
            r#"
            SELECT id, name, description, website, average_rating, user_id, created_at
              FROM bootcamps
             WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn create(&self, new_bootcamp: NewBootcamp) -> AppResult<Bootcamp> {
        let row = sqlx::query_as::<_, Bootcamp>(
            r#"
            INSERT INTO bootcamps (id, name, description, website, user_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, description, website, average_rating, user_id, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_bootcamp.name)
        .bind(&new_bootcamp.description)
        .bind(&new_bootcamp.website)
        .bind(new_bootcamp.user_id)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let res = sqlx::query("DELETE FROM bootcamps WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn set_average_rating(&self, id: Uuid, average_rating: f64) -> AppResult<()> {
        let res = sqlx::query("UPDATE bootcamps SET average_rating = $2 WHERE id = $1")
            .bind(id)
            .bind(average_rating)
            .execute(&self.db)
            .await?;
        if res.rows_affected() == 0 {
            return Err(AppError::not_found(format!("No bootcamp with the id of {id}")));
        }
        Ok(())
    }
}
