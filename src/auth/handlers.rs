use axum::{
    extract::{Path, State},
    http::{header::HOST, HeaderMap},
    routing::{get, post, put},
    Json, Router,
};
use axum_extra::extract::CookieJar;
use serde_json::{json, Value};
use tracing::instrument;

use crate::{
    auth::{
        cookies::{logout_cookie, session_cookie},
        dto::{
            ForgotPasswordRequest, LoginRequest, RegisterRequest, ResetPasswordRequest,
            TokenResponse, UpdateDetailsRequest, UpdatePasswordRequest,
        },
        extractors::AuthUser,
        repo_types::User,
        services,
    },
    error::AppResult,
    response::ApiResponse,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", get(logout))
        .route("/auth/me", get(get_me))
        .route("/auth/updatedetails", put(update_details))
        .route("/auth/updatepassword", put(update_password))
        .route("/auth/forgotpassword", post(forgot_password))
        .route("/auth/resetpassword/:resettoken", put(reset_password))
}

/// Sets the session cookie and echoes the token in the body.
fn token_response(state: &AppState, jar: CookieJar, token: String) -> (CookieJar, Json<TokenResponse>) {
    let jar = jar.add(session_cookie(token.clone(), &state.config));
    (
        jar,
        Json(TokenResponse {
            success: true,
            token,
        }),
    )
}

#[instrument(skip(state, jar, payload))]
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<(CookieJar, Json<TokenResponse>)> {
    let (_, token) = services::register(&state, payload).await?;
    Ok(token_response(&state, jar, token))
}

#[instrument(skip(state, jar, payload))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> AppResult<(CookieJar, Json<TokenResponse>)> {
    let (_, token) = services::login(&state, payload).await?;
    Ok(token_response(&state, jar, token))
}

#[instrument(skip(jar))]
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<ApiResponse<Value>>) {
    (jar.add(logout_cookie()), Json(ApiResponse::success(json!({}))))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<ApiResponse<User>>> {
    let user = services::current_user(&state, user_id).await?;
    Ok(Json(ApiResponse::success(user)))
}

#[instrument(skip(state, payload))]
pub async fn update_details(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<UpdateDetailsRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    let user = services::update_details(&state, user_id, payload).await?;
    Ok(Json(ApiResponse::success(user)))
}

#[instrument(skip(state, jar, payload))]
pub async fn update_password(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    jar: CookieJar,
    Json(payload): Json<UpdatePasswordRequest>,
) -> AppResult<(CookieJar, Json<TokenResponse>)> {
    let token = services::update_password(&state, user_id, payload).await?;
    Ok(token_response(&state, jar, token))
}

#[instrument(skip(state, headers, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<ForgotPasswordRequest>,
) -> AppResult<Json<ApiResponse<&'static str>>> {
    let base_url = match &state.config.public_url {
        Some(url) => url.clone(),
        None => {
            let host = headers
                .get(HOST)
                .and_then(|h| h.to_str().ok())
                .unwrap_or("localhost");
            format!("http://{host}")
        }
    };
    services::forgot_password(&state, &payload.email, &base_url).await?;
    Ok(Json(ApiResponse::success("Email sent")))
}

#[instrument(skip(state, jar, resettoken, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Path(resettoken): Path<String>,
    jar: CookieJar,
    Json(payload): Json<ResetPasswordRequest>,
) -> AppResult<(CookieJar, Json<TokenResponse>)> {
    let token = services::reset_password(&state, &resettoken, &payload.password).await?;
    Ok(token_response(&state, jar, token))
}
