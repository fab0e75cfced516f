use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::{NewUser, ResetTokenRecord, User, UserRow};
use crate::error::AppResult;

/// Credential store.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;
    /// Fails with a validation error when the email is taken.
    async fn create(&self, new_user: NewUser) -> AppResult<User>;
    /// Updates only the provided fields; `None` when the user is gone.
    async fn update_details(
        &self,
        id: Uuid,
        name: Option<&str>,
        email: Option<&str>,
    ) -> AppResult<Option<User>>;
    async fn set_password(&self, id: Uuid, password_hash: &str) -> AppResult<()>;
    /// `None` clears both reset fields.
    async fn set_reset_token(&self, id: Uuid, token: Option<ResetTokenRecord>) -> AppResult<()>;
    /// Matches only tokens whose deadline is after `now`.
    async fn find_by_reset_token(
        &self,
        token_hash: &str,
        now: OffsetDateTime,
    ) -> AppResult<Option<User>>;
    /// Replaces the password and clears the reset fields in one write.
    async fn complete_password_reset(&self, id: Uuid, password_hash: &str) -> AppResult<()>;
}

const USER_COLUMNS: &str = "id, name, email, password_hash, role, reset_password_token, \
                            reset_password_expire, created_at";

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn into_user(row: Option<UserRow>) -> AppResult<Option<User>> {
    Ok(row.map(User::try_from).transpose()?)
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        into_user(row)
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        into_user(row)
    }

    async fn create(&self, new_user: NewUser) -> AppResult<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (id, name, email, password_hash, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&new_user.name)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(new_user.role.as_str())
        .fetch_one(&self.db)
        .await?;
        Ok(User::try_from(row)?)
    }

    async fn update_details(
        &self,
        id: Uuid,
        name: Option<&str>,
        email: Option<&str>,
    ) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users
               SET name = COALESCE($2, name),
                   email = COALESCE($3, email)
             WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(name)
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        into_user(row)
    }

    async fn set_password(&self, id: Uuid, password_hash: &str) -> AppResult<()> {
        sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn set_reset_token(&self, id: Uuid, token: Option<ResetTokenRecord>) -> AppResult<()> {
        let (hash, expires_at) = match token {
            Some(t) => (Some(t.token_hash), Some(t.expires_at)),
            None => (None, None),
        };
        sqlx::query(
            r#"
            UPDATE users
               SET reset_password_token = $2,
                   reset_password_expire = $3
             WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(hash)
        .bind(expires_at)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn find_by_reset_token(
        &self,
        token_hash: &str,
        now: OffsetDateTime,
    ) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            SELECT {USER_COLUMNS}
              FROM users
             WHERE reset_password_token = $1
               AND reset_password_expire > $2
            "#
        ))
        .bind(token_hash)
        .bind(now)
        .fetch_optional(&self.db)
        .await?;
        into_user(row)
    }

    async fn complete_password_reset(&self, id: Uuid, password_hash: &str) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE users
               SET password_hash = $2,
                   reset_password_token = NULL,
                   reset_password_expire = NULL
             WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.db)
        .await?;
        Ok(())
    }
}
