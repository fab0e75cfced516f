//! Register, login and password lifecycle.
//!
//! Handlers own cookies and HTTP details; everything here works on the
//! stores in [`AppState`] and returns freshly issued session tokens.

use lazy_static::lazy_static;
use regex::Regex;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{LoginRequest, RegisterRequest, UpdateDetailsRequest, UpdatePasswordRequest},
        jwt::JwtKeys,
        password::{generate_reset_token, hash_password, hash_reset_token, verify_password},
        repo_types::{NewUser, ResetTokenRecord, Role, User},
    },
    error::{AppError, AppResult},
    mail::Email,
    state::AppState,
};

pub const MIN_PASSWORD_LEN: usize = 8;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    // Compared against when the email is unknown so both login failures cost the same.
    static ref DUMMY_HASH: Option<String> = hash_password("not-a-real-password").ok();
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_password(password: &str) -> AppResult<()> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

fn parse_signup_role(role: Option<&str>) -> AppResult<Role> {
    match role.map(str::trim).filter(|r| !r.is_empty()) {
        None => Ok(Role::User),
        Some(raw) => match raw.parse::<Role>() {
            Ok(Role::Admin) => Err(AppError::validation("Role admin cannot be self-assigned")),
            Ok(role) => Ok(role),
            Err(_) => Err(AppError::validation(format!("Unknown role {raw}"))),
        },
    }
}

fn issue_token(state: &AppState, user_id: Uuid) -> AppResult<String> {
    let keys = JwtKeys::from_config(&state.config.jwt);
    keys.issue(user_id).map_err(|e| {
        error!(error = %e, "jwt sign failed");
        AppError::Internal(e)
    })
}

fn hash(plain: &str) -> AppResult<String> {
    Ok(hash_password(plain)?)
}

pub async fn register(state: &AppState, payload: RegisterRequest) -> AppResult<(User, String)> {
    let name = payload.name.trim().to_string();
    let email = normalize_email(&payload.email);

    if email.is_empty() || payload.password.is_empty() {
        return Err(AppError::validation("Email & password required"));
    }
    if name.is_empty() {
        return Err(AppError::validation("Please add a name"));
    }
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(AppError::validation("Please add a valid email"));
    }
    validate_password(&payload.password)?;
    let role = parse_signup_role(payload.role.as_deref())?;

    if state.users.find_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(AppError::validation("Email already registered"));
    }

    let user = state
        .users
        .create(NewUser {
            name,
            email,
            password_hash: hash(&payload.password)?,
            role,
        })
        .await?;

    let token = issue_token(state, user.id)?;
    info!(user_id = %user.id, email = %user.email, role = %user.role, "user registered");
    Ok((user, token))
}

pub async fn login(state: &AppState, payload: LoginRequest) -> AppResult<(User, String)> {
    let email = normalize_email(&payload.email);
    if email.is_empty() || payload.password.is_empty() {
        return Err(AppError::validation("Email & password required"));
    }

    let Some(user) = state.users.find_by_email(&email).await? else {
        if let Some(dummy) = DUMMY_HASH.as_deref() {
            let _ = verify_password(&payload.password, dummy);
        }
        warn!(email = %email, "login unknown email");
        return Err(AppError::InvalidCredentials);
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    let token = issue_token(state, user.id)?;
    info!(user_id = %user.id, "user logged in");
    Ok((user, token))
}

pub async fn current_user(state: &AppState, user_id: Uuid) -> AppResult<User> {
    state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))
}

/// Fails with `Forbidden` unless the user holds one of `roles`.
pub fn authorize(user: &User, roles: &[Role]) -> AppResult<()> {
    if roles.contains(&user.role) {
        Ok(())
    } else {
        Err(AppError::forbidden(format!(
            "User role {} is not authorized to access this route",
            user.role
        )))
    }
}

pub async fn update_details(
    state: &AppState,
    user_id: Uuid,
    payload: UpdateDetailsRequest,
) -> AppResult<User> {
    let name = payload
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());
    let email = payload
        .email
        .map(|e| normalize_email(&e))
        .filter(|e| !e.is_empty());

    if let Some(email) = email.as_deref() {
        if !is_valid_email(email) {
            return Err(AppError::validation("Please add a valid email"));
        }
        if let Some(other) = state.users.find_by_email(email).await? {
            if other.id != user_id {
                return Err(AppError::validation("Email already registered"));
            }
        }
    }

    state
        .users
        .update_details(user_id, name.as_deref(), email.as_deref())
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))
}

pub async fn update_password(
    state: &AppState,
    user_id: Uuid,
    payload: UpdatePasswordRequest,
) -> AppResult<String> {
    let user = current_user(state, user_id).await?;

    if !verify_password(&payload.current_password, &user.password_hash)? {
        warn!(user_id = %user.id, "update password with wrong current password");
        return Err(AppError::InvalidCredentials);
    }
    validate_password(&payload.new_password)?;

    state
        .users
        .set_password(user.id, &hash(&payload.new_password)?)
        .await?;
    info!(user_id = %user.id, "password updated");
    issue_token(state, user.id)
}

/// Stores a hashed reset token and mails the raw one inside a reset URL.
///
/// If the mail cannot be sent the token fields are cleared again. The clear
/// is a separate write, so a crash in between leaves the token usable until
/// it expires.
pub async fn forgot_password(state: &AppState, email: &str, base_url: &str) -> AppResult<()> {
    let email = normalize_email(email);
    if email.is_empty() {
        return Err(AppError::validation("Email required"));
    }

    let user = state
        .users
        .find_by_email(&email)
        .await?
        .ok_or_else(|| AppError::not_found("There is no user with that email"))?;

    let raw_token = generate_reset_token();
    let expires_at =
        OffsetDateTime::now_utc() + TimeDuration::minutes(state.config.reset_token_ttl_minutes);
    state
        .users
        .set_reset_token(
            user.id,
            Some(ResetTokenRecord {
                token_hash: hash_reset_token(&raw_token),
                expires_at,
            }),
        )
        .await?;

    let reset_url = format!(
        "{}/api/v1/auth/resetpassword/{raw_token}",
        base_url.trim_end_matches('/')
    );
    let message = Email {
        to: user.email.clone(),
        subject: "Password reset token".into(),
        body: format!(
            "You are receiving this email because you (or someone else) has requested \
             the reset of a password. Please make a PUT request to: \n\n{reset_url}"
        ),
    };

    if let Err(e) = state.mailer.send(&message).await {
        error!(error = %e, user_id = %user.id, "reset email failed");
        if let Err(clear_err) = state.users.set_reset_token(user.id, None).await {
            error!(error = %clear_err, user_id = %user.id, "failed to clear reset token");
        }
        return Err(AppError::Delivery);
    }

    info!(user_id = %user.id, "reset email sent");
    Ok(())
}

pub async fn reset_password(
    state: &AppState,
    raw_token: &str,
    new_password: &str,
) -> AppResult<String> {
    let token_hash = hash_reset_token(raw_token);
    let user = state
        .users
        .find_by_reset_token(&token_hash, OffsetDateTime::now_utc())
        .await?
        .ok_or(AppError::InvalidOrExpiredToken)?;

    validate_password(new_password)?;

    state
        .users
        .complete_password_reset(user.id, &hash(new_password)?)
        .await?;
    info!(user_id = %user.id, "password reset");
    issue_token(state, user.id)
}
