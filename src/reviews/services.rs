use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    auth::{
        repo_types::{Role, User},
        services::authorize,
    },
    error::{AppError, AppResult},
    reviews::{
        dto::{CreateReviewRequest, UpdateReviewRequest},
        rating,
        repo_types::{NewReview, Review, ReviewChanges},
    },
    state::AppState,
};

pub const MAX_TITLE_LEN: usize = 100;
pub const RATING_RANGE: std::ops::RangeInclusive<i32> = 1..=10;

fn validate_title(title: &str) -> AppResult<()> {
    if title.is_empty() {
        return Err(AppError::validation("Please add a title for the review"));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(AppError::validation(format!(
            "Title can not be more than {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(())
}

fn validate_text(text: &str) -> AppResult<()> {
    if text.trim().is_empty() {
        return Err(AppError::validation("Please add some text"));
    }
    Ok(())
}

fn validate_rating(rating: i32) -> AppResult<()> {
    if !RATING_RANGE.contains(&rating) {
        return Err(AppError::validation("Please add a rating between 1 and 10"));
    }
    Ok(())
}

async fn ensure_bootcamp(state: &AppState, bootcamp_id: Uuid) -> AppResult<()> {
    if state.bootcamps.find_by_id(bootcamp_id).await?.is_none() {
        return Err(AppError::not_found(format!(
            "No bootcamp with the id of {bootcamp_id}"
        )));
    }
    Ok(())
}

fn ensure_owner_or_admin(user: &User, review: &Review) -> AppResult<()> {
    if review.user_id == user.id || user.role == Role::Admin {
        return Ok(());
    }
    warn!(user_id = %user.id, review_id = %review.id, "review access denied");
    Err(AppError::forbidden("Not authorized to modify this review"))
}

async fn refresh_rating(state: &AppState, bootcamp_id: Uuid) {
    rating::recompute(state.reviews.as_ref(), state.bootcamps.as_ref(), bootcamp_id).await;
}

pub async fn list_reviews(state: &AppState, bootcamp_id: Option<Uuid>) -> AppResult<Vec<Review>> {
    match bootcamp_id {
        Some(id) => {
            ensure_bootcamp(state, id).await?;
            state.reviews.list_by_bootcamp(id).await
        }
        None => state.reviews.list_all().await,
    }
}

pub async fn get_review(state: &AppState, id: Uuid) -> AppResult<Review> {
    state
        .reviews
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("No review found with the id of {id}")))
}

pub async fn add_review(
    state: &AppState,
    user: &User,
    bootcamp_id: Uuid,
    payload: CreateReviewRequest,
) -> AppResult<Review> {
    authorize(user, &[Role::User, Role::Admin])?;

    let title = payload.title.trim().to_string();
    validate_title(&title)?;
    validate_text(&payload.text)?;
    let rating = payload
        .rating
        .ok_or_else(|| AppError::validation("Please add a rating between 1 and 10"))?;
    validate_rating(rating)?;

    ensure_bootcamp(state, bootcamp_id).await?;

    let review = state
        .reviews
        .create(NewReview {
            title,
            text: payload.text,
            rating,
            bootcamp_id,
            user_id: user.id,
        })
        .await?;

    info!(review_id = %review.id, %bootcamp_id, user_id = %user.id, "review created");
    refresh_rating(state, bootcamp_id).await;
    Ok(review)
}

pub async fn update_review(
    state: &AppState,
    user: &User,
    id: Uuid,
    payload: UpdateReviewRequest,
) -> AppResult<Review> {
    let existing = get_review(state, id).await?;
    ensure_owner_or_admin(user, &existing)?;

    let title = payload.title.map(|t| t.trim().to_string());
    if let Some(title) = title.as_deref() {
        validate_title(title)?;
    }
    if let Some(text) = payload.text.as_deref() {
        validate_text(text)?;
    }
    if let Some(rating) = payload.rating {
        validate_rating(rating)?;
    }

    let review = state
        .reviews
        .update(
            id,
            ReviewChanges {
                title,
                text: payload.text,
                rating: payload.rating,
            },
        )
        .await?
        .ok_or_else(|| AppError::not_found(format!("No review found with the id of {id}")))?;

    if payload.rating.is_some() {
        refresh_rating(state, review.bootcamp_id).await;
    }
    Ok(review)
}

pub async fn delete_review(state: &AppState, user: &User, id: Uuid) -> AppResult<()> {
    let review = get_review(state, id).await?;
    ensure_owner_or_admin(user, &review)?;

    if !state.reviews.delete(id).await? {
        return Err(AppError::not_found(format!("No review found with the id of {id}")));
    }

    info!(review_id = %id, bootcamp_id = %review.bootcamp_id, "review deleted");
    refresh_rating(state, review.bootcamp_id).await;
    Ok(())
}
