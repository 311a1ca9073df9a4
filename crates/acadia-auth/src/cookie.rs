//! Cookie transport for the token pair

use axum::http::{HeaderMap, HeaderName, header};
use axum::response::AppendHeaders;

use crate::token::IssuedToken;

/// Cookie name for the access token (short-lived).
pub const ACCESS_COOKIE: &str = "acadia_access";

/// Cookie name for the refresh token (long-lived).
pub const REFRESH_COOKIE: &str = "acadia_refresh";

fn build_cookie(name: &str, value: &str, max_age: i64, secure: bool) -> String {
    let secure = if secure { "; Secure" } else { "" };
    format!(
        "{}={}; HttpOnly; SameSite=Strict; Path=/; Max-Age={}{}",
        name, value, max_age, secure
    )
}

/// Build the `Set-Cookie` headers carrying a freshly issued token pair.
/// Each cookie's Max-Age matches its token's own lifetime.
pub fn auth_cookies(
    access: &IssuedToken,
    refresh: &IssuedToken,
    secure: bool,
) -> AppendHeaders<[(HeaderName, String); 2]> {
    AppendHeaders([
        (
            header::SET_COOKIE,
            build_cookie(ACCESS_COOKIE, &access.token, access.max_age, secure),
        ),
        (
            header::SET_COOKIE,
            build_cookie(REFRESH_COOKIE, &refresh.token, refresh.max_age, secure),
        ),
    ])
}

/// Build the `Set-Cookie` headers that overwrite both auth cookies with
/// immediate expiry. Used on logout.
pub fn clear_cookies(secure: bool) -> AppendHeaders<[(HeaderName, String); 2]> {
    AppendHeaders([
        (
            header::SET_COOKIE,
            build_cookie(ACCESS_COOKIE, "", 0, secure),
        ),
        (
            header::SET_COOKIE,
            build_cookie(REFRESH_COOKIE, "", 0, secure),
        ),
    ])
}

/// Extract a cookie value from the Cookie header.
fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;
    for part in cookie_header.split(';') {
        let part = part.trim();
        if let Some((key, value)) = part.split_once('=') {
            if key.trim() == name {
                return Some(value.trim());
            }
        }
    }
    None
}

/// Extract a bearer token from the Authorization header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let auth_header = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    auth_header.strip_prefix("Bearer ")
}

/// Extract the access token from a request. Cookie first, with an
/// `Authorization: Bearer` fallback for non-browser clients.
pub fn access_token(headers: &HeaderMap) -> Option<&str> {
    cookie_value(headers, ACCESS_COOKIE).or_else(|| bearer_token(headers))
}

/// Extract the refresh token from a request. Cookie only.
pub fn refresh_token(headers: &HeaderMap) -> Option<&str> {
    cookie_value(headers, REFRESH_COOKIE)
}
