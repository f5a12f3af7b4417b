//! Double-submit anti-forgery check.
//!
//! `GET /csrf` hands out a random token as the `XSRF-TOKEN` cookie. Unsafe
//! requests must echo the same value in the `X-XSRF-TOKEN` header.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, Method},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand_core::{OsRng, RngCore};

use super::auth::SecurityState;
use crate::error::ApiError;

pub const CSRF_COOKIE: &str = "XSRF-TOKEN";
pub const CSRF_HEADER: &str = "X-XSRF-TOKEN";

/// Fresh 256-bit token, URL-safe base64
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// `XSRF-TOKEN` cookie readable by browser scripts
pub fn token_cookie(token: String) -> Cookie<'static> {
    Cookie::build((CSRF_COOKIE, token))
        .path("/")
        .same_site(SameSite::Lax)
        .build()
}

pub fn is_safe_method(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE)
}

pub async fn csrf_protection(
    State(security): State<SecurityState>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if security.csrf_enabled && !is_safe_method(request.method()) && !tokens_match(&jar, request.headers()) {
        tracing::warn!("Rejected {} {}: missing or mismatched CSRF token", request.method(), request.uri().path());
        return Err(ApiError::forbidden("Invalid CSRF token"));
    }

    Ok(next.run(request).await)
}

fn tokens_match(jar: &CookieJar, headers: &HeaderMap) -> bool {
    let submitted = headers
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    let issued = jar.get(CSRF_COOKIE).map(|c| c.value()).filter(|v| !v.is_empty());

    match (submitted, issued) {
        (Some(header_token), Some(cookie_token)) => header_token == cookie_token,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderValue};

    fn check(cookies: &[&str], token: Option<&str>) -> bool {
        let mut headers = HeaderMap::new();
        for cookie in cookies {
            headers.append(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
        }
        if let Some(t) = token {
            headers.insert(CSRF_HEADER, HeaderValue::from_str(t).unwrap());
        }
        tokens_match(&CookieJar::from_headers(&headers), &headers)
    }

    #[test]
    fn matching_cookie_and_header_pass() {
        assert!(check(&["a=1; XSRF-TOKEN=abc"], Some("abc")));
    }

    #[test]
    fn token_found_in_any_cookie_header() {
        assert!(check(&["session=s1", "XSRF-TOKEN=abc"], Some("abc")));
    }

    #[test]
    fn mismatch_or_missing_half_fails() {
        assert!(!check(&["XSRF-TOKEN=abc"], Some("abd")));
        assert!(!check(&["XSRF-TOKEN=abc"], None));
        assert!(!check(&[], Some("abc")));
        assert!(!check(&["XSRF-TOKEN="], Some("")));
    }

    #[test]
    fn issued_cookie_is_site_wide_and_lax() {
        let cookie = token_cookie("abc".into());
        assert_eq!(cookie.name(), CSRF_COOKIE);
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.http_only(), None);
    }

    #[test]
    fn generated_tokens_are_distinct() {
        let a = generate_token();
        assert_eq!(a.len(), 43);
        assert_ne!(a, generate_token());
    }
}
