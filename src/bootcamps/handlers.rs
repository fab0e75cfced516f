use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::extractors::CurrentUser,
    bootcamps::{
        dto::{BootcampPage, CreateBootcampRequest, PageQuery},
        repo_types::Bootcamp,
        services,
    },
    error::AppResult,
    response::ApiResponse,
    state::AppState,
};

pub fn bootcamp_routes() -> Router<AppState> {
    Router::new()
        .route("/bootcamps", get(list_bootcamps).post(create_bootcamp))
        .route("/bootcamps/:id", get(get_bootcamp).delete(delete_bootcamp))
}

#[instrument(skip(state))]
pub async fn list_bootcamps(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<BootcampPage<Bootcamp>>> {
    let (data, pagination) = services::list_bootcamps(&state, &query).await?;
    Ok(Json(BootcampPage {
        success: true,
        count: data.len(),
        pagination,
        data,
    }))
}

#[instrument(skip(state))]
pub async fn get_bootcamp(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Bootcamp>>> {
    let bootcamp = services::get_bootcamp(&state, id).await?;
    Ok(Json(ApiResponse::success(bootcamp)))
}

#[instrument(skip(state, user, payload))]
pub async fn create_bootcamp(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CreateBootcampRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Bootcamp>>)> {
    let bootcamp = services::create_bootcamp(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(bootcamp))))
}

#[instrument(skip(state, user))]
pub async fn delete_bootcamp(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<ApiResponse<Value>>> {
    services::delete_bootcamp(&state, &user, id).await?;
    Ok(Json(ApiResponse::success(json!({}))))
}
