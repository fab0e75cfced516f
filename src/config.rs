use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub cookie_expire_days: i64,
}

impl JwtConfig {
    /// Clamps token and cookie lifetimes into `1..=MAX`.
    pub fn bounded(self) -> Self {
        Self {
            ttl_minutes: self.ttl_minutes.clamp(1, MAX_JWT_TTL_MINUTES),
            cookie_expire_days: self.cookie_expire_days.clamp(1, MAX_COOKIE_EXPIRE_DAYS),
            ..self
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: Option<String>,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub tls: bool,
    pub from_address: Option<String>,
    pub from_name: String,
}

impl SmtpConfig {
    pub fn is_configured(&self) -> bool {
        self.host.is_some() && self.from_address.is_some()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub smtp: SmtpConfig,
    /// Marks the `token` cookie `Secure`.
    pub production: bool,
    pub reset_token_ttl_minutes: i64,
    pub public_url: Option<String>,
}

/// Upper bounds on configured lifetimes so expiry arithmetic cannot overflow.
pub const MAX_JWT_TTL_MINUTES: i64 = 60 * 24 * 365 * 10;
pub const MAX_COOKIE_EXPIRE_DAYS: i64 = 365 * 10;
pub const MAX_RESET_TOKEN_TTL_MINUTES: i64 = 60 * 24;

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "devcamper".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "devcamper-users".into()),
            ttl_minutes: env_or("JWT_TTL_MINUTES", 60 * 24 * 30),
            cookie_expire_days: env_or("JWT_COOKIE_EXPIRE_DAYS", 30),
        }
        .bounded();
        let smtp = SmtpConfig {
            host: std::env::var("SMTP_HOST").ok(),
            port: env_or("SMTP_PORT", 587),
            username: std::env::var("SMTP_USERNAME").ok(),
            password: std::env::var("SMTP_PASSWORD").ok(),
            tls: env_or("SMTP_TLS", true),
            from_address: std::env::var("FROM_EMAIL").ok(),
            from_name: std::env::var("FROM_NAME").unwrap_or_else(|_| "DevCamper".into()),
        };
        let production = std::env::var("APP_ENV")
            .map(|v| v == "production")
            .unwrap_or(false);

        Ok(Self {
            database_url,
            jwt,
            smtp,
            production,
            reset_token_ttl_minutes: env_or("RESET_TOKEN_TTL_MINUTES", 10)
                .clamp(1, MAX_RESET_TOKEN_TTL_MINUTES),
            public_url: std::env::var("PUBLIC_URL").ok(),
        })
    }
}
