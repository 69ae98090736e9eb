//! Session cookie formatting and lookup.

use axum::http::{header, HeaderMap};
use cookie::time::Duration;
use cookie::Cookie;

/// Carries the access token.
pub const AUTHENTICATION_COOKIE: &str = "Authentication";

/// Carries the refresh token.
pub const REFRESH_COOKIE: &str = "Refresh";

fn session_cookie(name: &'static str, value: &str, max_age_secs: u64) -> String {
    let max_age = Duration::seconds(i64::try_from(max_age_secs).unwrap_or(i64::MAX));
    Cookie::build((name, value.to_string()))
        .http_only(true)
        .path("/")
        .max_age(max_age)
        .build()
        .encoded()
        .to_string()
}

/// `Set-Cookie` value for a freshly issued access token.
pub fn authentication_cookie(token: &str, expires_in: u64) -> String {
    session_cookie(AUTHENTICATION_COOKIE, token, expires_in)
}

/// `Set-Cookie` value for a freshly issued refresh token.
pub fn refresh_cookie(token: &str, expires_in: u64) -> String {
    session_cookie(REFRESH_COOKIE, token, expires_in)
}

/// Expire both session cookies.
pub fn clear_cookies() -> [String; 2] {
    [
        session_cookie(AUTHENTICATION_COOKIE, "", 0),
        session_cookie(REFRESH_COOKIE, "", 0),
    ]
}

/// First non-empty value of cookie `name` across all `Cookie` headers.
///
/// Values are percent-decoded and stripped of surrounding double quotes.
/// Malformed pairs are skipped.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse_encoded)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == name && !cookie.value_trimmed().is_empty())
        .map(|cookie| cookie.value_trimmed().to_string())
}
