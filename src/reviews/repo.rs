use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::reviews::repo_types::{NewReview, Review, ReviewChanges};

pub const DUPLICATE_REVIEW: &str = "User has already submitted a review for this bootcamp";

#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn list_all(&self) -> AppResult<Vec<Review>>;
    async fn list_by_bootcamp(&self, bootcamp_id: Uuid) -> AppResult<Vec<Review>>;
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Review>>;
    /// At most one review per (bootcamp, user); a second one is a validation error.
    async fn create(&self, new_review: NewReview) -> AppResult<Review>;
    async fn update(&self, id: Uuid, changes: ReviewChanges) -> AppResult<Option<Review>>;
    async fn delete(&self, id: Uuid) -> AppResult<bool>;
    async fn delete_by_bootcamp(&self, bootcamp_id: Uuid) -> AppResult<u64>;
    async fn ratings_for_bootcamp(&self, bootcamp_id: Uuid) -> AppResult<Vec<i32>>;
}

#[derive(Clone)]
pub struct PgReviewStore {
    db: PgPool,
}

impl PgReviewStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ReviewStore for PgReviewStore {
    async fn list_all(&self) -> AppResult<Vec<Review>> {
        let rows = sqlx::query_as::<_, Review>(
            r#"
            SELECT id, title, text, rating, bootcamp_id, user_id, created_at
              FROM reviews
             ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn list_by_bootcamp(&self, bootcamp_id: Uuid) -> AppResult<Vec<Review>> {
        let rows = sqlx::query_as::<_, Review>(
            r#"
            SELECT id, title, text, rating, bootcamp_id, user_id, created_at
              FROM reviews
             WHERE bootcamp_id = $1
             ORDER BY created_at DESC
            "#,
        )
        .bind(bootcamp_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Review>> {
        let row = sqlx::query_as::<_, Review>(
            r#"
            SELECT id, title, text, rating, bootcamp_id, user_id, created_at
              FROM reviews
             WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn create(&self, new_review: NewReview) -> AppResult<Review> {
        let res = sqlx::query_as::<_, Review>(
            r#"
            INSERT INTO reviews (id, title, text, rating, bootcamp_id, user_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, title, text, rating, bootcamp_id, user_id, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_review.title)
        .bind(&new_review.text)
        .bind(new_review.rating)
        .bind(new_review.bootcamp_id)
        .bind(new_review.user_id)
        .fetch_one(&self.db)
        .await;

        match res {
            Ok(review) => Ok(review),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(AppError::validation(DUPLICATE_REVIEW))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update(&self, id: Uuid, changes: ReviewChanges) -> AppResult<Option<Review>> {
        let row = sqlx::query_as::<_, Review>(
            r#"
            UPDATE reviews
               SET title = COALESCE($2, title),
                   text = COALESCE($3, text),
                   rating = COALESCE($4, rating)
             WHERE id = $1
            RETURNING id, title, text, rating, bootcamp_id, user_id, created_at
            "#,
        )
        .bind(id)
        .bind(changes.title)
        .bind(changes.text)
        .bind(changes.rating)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let res = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn delete_by_bootcamp(&self, bootcamp_id: Uuid) -> AppResult<u64> {
        let res = sqlx::query("DELETE FROM reviews WHERE bootcamp_id = $1")
            .bind(bootcamp_id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected())
    }

    async fn ratings_for_bootcamp(&self, bootcamp_id: Uuid) -> AppResult<Vec<i32>> {
        let rows: Vec<(i32,)> = sqlx::query_as("SELECT rating FROM reviews WHERE bootcamp_id = $1")
            .bind(bootcamp_id)
            .fetch_all(&self.db)
            .await?;
        Ok(rows.into_iter().map(|(r,)| r).collect())
    }
}
