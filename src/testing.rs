//! In-memory stores and mailers for unit tests.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex,
};

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    auth::{
        repo::UserStore,
        repo_types::{NewUser, ResetTokenRecord, User},
    },
    bootcamps::{
        repo::BootcampStore,
        repo_types::{Bootcamp, NewBootcamp},
    },
    error::{AppError, AppResult},
    mail::{Email, Mailer},
    reviews::{
        repo::{ReviewStore, DUPLICATE_REVIEW},
        repo_types::{NewReview, Review, ReviewChanges},
    },
};

#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<Vec<User>>,
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn create(&self, new_user: NewUser) -> AppResult<User> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == new_user.email) {
            return Err(AppError::validation("Duplicate field value entered"));
        }
        let user = User {
            id: Uuid::new_v4(),
            name: new_user.name,
            email: new_user.email,
            password_hash: new_user.password_hash,
            role: new_user.role,
            reset_password_token: None,
            reset_password_expire: None,
            created_at: OffsetDateTime::now_utc(),
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn update_details(
        &self,
        id: Uuid,
        name: Option<&str>,
        email: Option<&str>,
    ) -> AppResult<Option<User>> {
        let mut users = self.users.lock().unwrap();
        if let Some(email) = email {
            if users.iter().any(|u| u.email == email && u.id != id) {
                return Err(AppError::validation("Duplicate field value entered"));
            }
        }
        Ok(users.iter_mut().find(|u| u.id == id).map(|u| {
            if let Some(name) = name {
                u.name = name.to_string();
            }
            if let Some(email) = email {
                u.email = email.to_string();
            }
            u.clone()
        }))
    }

    async fn set_password(&self, id: Uuid, password_hash: &str) -> AppResult<()> {
        if let Some(u) = self.users.lock().unwrap().iter_mut().find(|u| u.id == id) {
            u.password_hash = password_hash.to_string();
        }
        Ok(())
    }

    async fn set_reset_token(&self, id: Uuid, token: Option<ResetTokenRecord>) -> AppResult<()> {
        if let Some(u) = self.users.lock().unwrap().iter_mut().find(|u| u.id == id) {
            u.reset_password_token = token.as_ref().map(|t| t.token_hash.clone());
            u.reset_password_expire = token.map(|t| t.expires_at);
        }
        Ok(())
    }

    async fn find_by_reset_token(
        &self,
        token_hash: &str,
        now: OffsetDateTime,
    ) -> AppResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| {
                u.reset_password_token.as_deref() == Some(token_hash)
                    && u.reset_password_expire.is_some_and(|exp| exp > now)
            })
            .cloned())
    }

    async fn complete_password_reset(&self, id: Uuid, password_hash: &str) -> AppResult<()> {
        if let Some(u) = self.users.lock().unwrap().iter_mut().find(|u| u.id == id) {
            u.password_hash = password_hash.to_string();
            u.reset_password_token = None;
            u.reset_password_expire = None;
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryBootcampStore {
    rows: Mutex<Vec<Bootcamp>>,
    fail_rating_writes: AtomicBool,
}

impl MemoryBootcampStore {
    /// Makes `set_average_rating` fail until switched off.
    pub fn fail_rating_writes(&self, on: bool) {
        self.fail_rating_writes.store(on, Ordering::SeqCst);
    }
}

#[async_trait]
impl BootcampStore for MemoryBootcampStore {
    async fn count(&self) -> AppResult<i64> {
        Ok(self.rows.lock().unwrap().len() as i64)
    }

    async fn list(&self, limit: i64, offset: i64) -> AppResult<Vec<Bootcamp>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Bootcamp>> {
        Ok(self.rows.lock().unwrap().iter().find(|b| b.id == id).cloned())
    }

    async fn create(&self, new_bootcamp: NewBootcamp) -> AppResult<Bootcamp> {
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|b| b.name == new_bootcamp.name) {
            return Err(AppError::validation("Duplicate field value entered"));
        }
        let bootcamp = Bootcamp {
            id: Uuid::new_v4(),
            name: new_bootcamp.name,
            description: new_bootcamp.description,
            website: new_bootcamp.website,
            average_rating: 0.0,
            user_id: new_bootcamp.user_id,
            created_at: OffsetDateTime::now_utc(),
        };
        rows.push(bootcamp.clone());
        Ok(bootcamp)
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|b| b.id != id);
        Ok(rows.len() != before)
    }

    async fn set_average_rating(&self, id: Uuid, average_rating: f64) -> AppResult<()> {
        if self.fail_rating_writes.load(Ordering::SeqCst) {
            return Err(AppError::Internal(anyhow::anyhow!("simulated write failure")));
        }
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| AppError::not_found("bootcamp"))?;
        row.average_rating = average_rating;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryReviewStore {
    rows: Mutex<Vec<Review>>,
}

#[async_trait]
impl ReviewStore for MemoryReviewStore {
    async fn list_all(&self) -> AppResult<Vec<Review>> {
        Ok(self.rows.lock().unwrap().clone())
    }

    async fn list_by_bootcamp(&self, bootcamp_id: Uuid) -> AppResult<Vec<Review>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.bootcamp_id == bootcamp_id)
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Review>> {
        Ok(self.rows.lock().unwrap().iter().find(|r| r.id == id).cloned())
    }

    async fn create(&self, new_review: NewReview) -> AppResult<Review> {
        let mut rows = self.rows.lock().unwrap();
        if rows
            .iter()
            .any(|r| r.bootcamp_id == new_review.bootcamp_id && r.user_id == new_review.user_id)
        {
            return Err(AppError::validation(DUPLICATE_REVIEW));
        }
        let review = Review {
            id: Uuid::new_v4(),
            title: new_review.title,
            text: new_review.text,
            rating: new_review.rating,
            bootcamp_id: new_review.bootcamp_id,
            user_id: new_review.user_id,
            created_at: OffsetDateTime::now_utc(),
        };
        rows.push(review.clone());
        Ok(review)
    }

    async fn update(&self, id: Uuid, changes: ReviewChanges) -> AppResult<Option<Review>> {
        let mut rows = self.rows.lock().unwrap();
        Ok(rows.iter_mut().find(|r| r.id == id).map(|r| {
            if let Some(title) = changes.title {
                r.title = title;
            }
            if let Some(text) = changes.text {
                r.text = text;
            }
            if let Some(rating) = changes.rating {
                r.rating = rating;
            }
            r.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|r| r.id != id);
        Ok(rows.len() != before)
    }

    async fn delete_by_bootcamp(&self, bootcamp_id: Uuid) -> AppResult<u64> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|r| r.bootcamp_id != bootcamp_id);
        Ok((before - rows.len()) as u64)
    }

    async fn ratings_for_bootcamp(&self, bootcamp_id: Uuid) -> AppResult<Vec<i32>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.bootcamp_id == bootcamp_id)
            .map(|r| r.rating)
            .collect())
    }
}

/// Keeps every email it is asked to send; `failing()` rejects them all.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<Email>>,
    fail: bool,
}

impl RecordingMailer {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::default(),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<Email> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &Email) -> anyhow::Result<()> {
        if self.fail {
            anyhow::bail!("smtp unavailable");
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

pub async fn seed_bootcamp(store: &dyn BootcampStore, name: &str) -> Bootcamp {
    store
        .create(NewBootcamp {
            name: name.to_string(),
            description: format!("{name} description"),
            website: None,
            user_id: Uuid::new_v4(),
        })
        .await
        .expect("seed bootcamp")
}

/// Review by a fresh random user.
pub async fn seed_review(store: &dyn ReviewStore, bootcamp_id: Uuid, rating: i32) -> Review {
    store
        .create(NewReview {
            title: "Great".into(),
            text: "Learned a lot".into(),
            rating,
            bootcamp_id,
            user_id: Uuid::new_v4(),
        })
        .await
        .expect("seed review")
}
