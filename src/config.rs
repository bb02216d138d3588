use anyhow::Context;
use serde::Deserialize;

/// Session tokens never live shorter than a day or longer than a week.
pub const MIN_TOKEN_TTL_MINUTES: i64 = 60 * 24;
pub const MAX_TOKEN_TTL_MINUTES: i64 = 60 * 24 * 7;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub cookie_secure: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt: JwtConfig,
    pub session: SessionConfig,
    /// Whether the public register endpoint honours `role: "admin"`.
    pub allow_admin_signup: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET is not set")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "hiro".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "hiro-users".into()),
            ttl_minutes: clamp_ttl(env_parse("JWT_TTL_MINUTES").unwrap_or(MIN_TOKEN_TTL_MINUTES)),
        };
        let session = SessionConfig {
            cookie_name: std::env::var("SESSION_COOKIE_NAME").unwrap_or_else(|_| "token".into()),
            cookie_secure: env_parse("SESSION_COOKIE_SECURE").unwrap_or(true),
        };
        Ok(Self {
            database_url,
            database_max_connections: env_parse("DATABASE_MAX_CONNECTIONS").unwrap_or(10),
            jwt,
            session,
            allow_admin_signup: env_parse("ALLOW_ADMIN_SIGNUP").unwrap_or(true),
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}

fn clamp_ttl(minutes: i64) -> i64 {
    minutes.clamp(MIN_TOKEN_TTL_MINUTES, MAX_TOKEN_TTL_MINUTES)
}
