use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::extractors::CurrentUser,
    error::AppResult,
    response::ApiResponse,
    reviews::{
        dto::{CreateReviewRequest, ReviewList, UpdateReviewRequest},
        repo_types::Review,
        services,
    },
    state::AppState,
};

pub fn review_routes() -> Router<AppState> {
    Router::new()
        .route("/reviews", get(list_all))
        .route(
            "/reviews/:id",
            get(get_review).put(update_review).delete(delete_review),
        )
        .route(
            "/bootcamps/:id/reviews",
            get(list_for_bootcamp).post(add_review),
        )
}

#[instrument(skip(state))]
pub async fn list_all(State(state): State<AppState>) -> AppResult<Json<ReviewList<Review>>> {
    let reviews = services::list_reviews(&state, None).await?;
    Ok(Json(ReviewList::new(reviews)))
}

#[instrument(skip(state))]
pub async fn list_for_bootcamp(
    State(state): State<AppState>,
    Path(bootcamp_id): Path<Uuid>,
) -> AppResult<Json<ReviewList<Review>>> {
    let reviews = services::list_reviews(&state, Some(bootcamp_id)).await?;
    Ok(Json(ReviewList::new(reviews)))
}

#[instrument(skip(state))]
pub async fn get_review(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Review>>> {
    let review = services::get_review(&state, id).await?;
    Ok(Json(ApiResponse::success(review)))
}

#[instrument(skip(state, user, payload))]
pub async fn add_review(
    State(state): State<AppState>,
    Path(bootcamp_id): Path<Uuid>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CreateReviewRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Review>>)> {
    let review = services::add_review(&state, &user, bootcamp_id, payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(review))))
}

#[instrument(skip(state, user, payload))]
pub async fn update_review(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<UpdateReviewRequest>,
) -> AppResult<Json<ApiResponse<Review>>> {
    let review = services::update_review(&state, &user, id, payload).await?;
    Ok(Json(ApiResponse::success(review)))
}

#[instrument(skip(state, user))]
pub async fn delete_review(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<ApiResponse<Value>>> {
    services::delete_review(&state, &user, id).await?;
    Ok(Json(ApiResponse::success(json!({}))))
}
