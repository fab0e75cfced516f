use axum_extra::extract::cookie::{Cookie, SameSite};
use time::{Duration as TimeDuration, OffsetDateTime};

use crate::config::AppConfig;

pub const TOKEN_COOKIE: &str = "token";
/// Placeholder written on logout.
pub const LOGGED_OUT_VALUE: &str = "none";

/// HTTP-only `token` cookie; `Secure` in production.
pub fn session_cookie(token: String, config: &AppConfig) -> Cookie<'static> {
    let expires = OffsetDateTime::now_utc() + TimeDuration::days(config.jwt.cookie_expire_days);
    Cookie::build((TOKEN_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(config.production)
        .same_site(SameSite::Lax)
        .expires(expires)
        .build()
}

/// Overwrites the session cookie with a placeholder that lapses in 10 seconds.
pub fn logout_cookie() -> Cookie<'static> {
    Cookie::build((TOKEN_COOKIE, LOGGED_OUT_VALUE))
        .path("/")
        .http_only(true)
        .expires(OffsetDateTime::now_utc() + TimeDuration::seconds(10))
        .build()
}
