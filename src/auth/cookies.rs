use axum::http::{header, HeaderMap, HeaderValue};
use cookie::{time::Duration, Cookie, SameSite};

pub const ACCESS_COOKIE: &str = "access_token";
pub const REFRESH_COOKIE: &str = "refresh_token";

/// Fixed browser-side lifetimes of the session cookies.
pub const ACCESS_MAX_AGE: Duration = Duration::hours(1);
pub const REFRESH_MAX_AGE: Duration = Duration::hours(24);

fn session_cookie(name: &'static str, value: String, max_age: Duration, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::None)
        .path("/")
        .max_age(max_age)
        .build()
}

fn append(headers: &mut HeaderMap, cookie: Cookie<'_>) -> anyhow::Result<()> {
    headers.append(header::SET_COOKIE, HeaderValue::from_str(&cookie.to_string())?);
    Ok(())
}

pub fn set_access(headers: &mut HeaderMap, token: &str, secure: bool) -> anyhow::Result<()> {
    append(headers, session_cookie(ACCESS_COOKIE, token.to_string(), ACCESS_MAX_AGE, secure))
}

pub fn set_refresh(headers: &mut HeaderMap, token: &str, secure: bool) -> anyhow::Result<()> {
    append(headers, session_cookie(REFRESH_COOKIE, token.to_string(), REFRESH_MAX_AGE, secure))
}

/// Overwrites both session cookies with empty, already-expired values.
pub fn clear_session(headers: &mut HeaderMap, secure: bool) -> anyhow::Result<()> {
    append(headers, session_cookie(ACCESS_COOKIE, String::new(), Duration::ZERO, secure))?;
    append(headers, session_cookie(REFRESH_COOKIE, String::new(), Duration::ZERO, secure))
}

/// Value of the named cookie from the request's `Cookie` headers.
pub fn read(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|raw| Cookie::split_parse(raw.to_string()))
        .filter_map(Result::ok)
        .find(|c| c.name() == name && !c.value().is_empty())
        .map(|c| c.value().to_string())
}
