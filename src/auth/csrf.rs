use axum::{
    extract::Request,
    http::{header::AUTHORIZATION, HeaderMap, Method},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::auth::AuthError;

pub const CSRF_COOKIE: &str = "csrf_token";
pub const CSRF_HEADER: &str = "x-csrf-token";
pub const SESSION_COOKIE: &str = "session";
pub const CSRF_TOKEN_LEN: usize = 32;

/// Readable by the client script so it can echo the value in `X-CSRF-Token`.
pub fn csrf_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((CSRF_COOKIE, token))
        .path("/")
        .http_only(false)
        .secure(secure)
        .same_site(SameSite::Strict)
        .build()
}

pub fn session_cookie(token: String, max_age_seconds: i64, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(max_age_seconds))
        .build()
}

/// Cookie to hand to `CookieJar::remove` when a session ends.
pub fn session_cookie_removal() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}

fn is_safe_method(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE)
}

fn has_bearer_auth(headers: &HeaderMap) -> bool {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("Bearer "))
}

fn tokens_match(expected: &str, provided: &str) -> bool {
    expected.len() == provided.len()
        && expected
            .bytes()
            .zip(provided.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

/// Double-submit check for state-changing requests.
///
/// Browsers send cookies automatically, so a request authenticated by cookie
/// must also prove it can read the `csrf_token` cookie. Bearer-authenticated
/// requests are exempt because the header is never attached implicitly.
pub async fn csrf_middleware(request: Request, next: Next) -> Result<Response, AuthError> {
    if is_safe_method(request.method()) || has_bearer_auth(request.headers()) {
        return Ok(next.run(request).await);
    }

    let jar = CookieJar::from_headers(request.headers());
    let cookie_token = jar.get(CSRF_COOKIE).map(|cookie| cookie.value().to_string());
    let header_token = request
        .headers()
        .get(CSRF_HEADER)
        .and_then(|value| value.to_str().ok());

    let valid = match (cookie_token.as_deref(), header_token) {
        (Some(expected), Some(provided)) => !expected.is_empty() && tokens_match(expected, provided),
        _ => false,
    };

    if !valid {
        tracing::warn!(path = %request.uri().path(), "csrf check failed");
        return Err(AuthError::CsrfMismatch);
    }

    Ok(next.run(request).await)
}
