use axum::http::{header, HeaderMap};

use crate::config::SessionConfig;

/// `Set-Cookie` value carrying a freshly issued token.
pub fn session_cookie(cfg: &SessionConfig, token: &str, max_age_secs: u64) -> String {
    format!(
        "{}={}; HttpOnly; Path=/; Max-Age={}; {}",
        cfg.cookie_name,
        token,
        max_age_secs,
        attributes(cfg)
    )
}

/// `Set-Cookie` value that makes the browser drop the session cookie.
pub fn cleared_cookie(cfg: &SessionConfig) -> String {
    format!(
        "{}=; HttpOnly; Path=/; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT; {}",
        cfg.cookie_name,
        attributes(cfg)
    )
}

fn attributes(cfg: &SessionConfig) -> &'static str {
    // Cross-site cookies need SameSite=None, which browsers only accept with Secure.
    if cfg.cookie_secure {
        "SameSite=None; Secure"
    } else {
        "SameSite=Lax"
    }
}

/// Finds a cookie value across all `Cookie` headers.
pub fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v)
        .filter(|v| !v.is_empty())
}
