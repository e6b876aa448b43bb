// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Auth-cookie session plumbing.
//!
//! Tokens live exclusively in HTTP-only cookies and are treated as opaque
//! strings; the gateway never inspects their contents. This module owns the
//! cookie names, the lifetime policy and the stale-cookie cleanup applied to
//! unauthenticated responses.

use axum::{
    extract::Request,
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

/// Cookie carrying the short-lived bearer token for backend calls.
pub const ACCESS_COOKIE: &str = "access-token";
/// Cookie carrying the long-lived credential exchanged for new access tokens.
pub const REFRESH_COOKIE: &str = "refresh-token";

/// Access-token cookie lifetime. The source portal used 15 and 30 minutes on
/// different routes; a single 30-minute policy is used everywhere.
pub const ACCESS_TOKEN_MAX_AGE: time::Duration = time::Duration::minutes(30);
/// Refresh-token cookie lifetime.
pub const REFRESH_TOKEN_MAX_AGE: time::Duration = time::Duration::days(7);

/// Tokens extracted from the inbound request's cookies.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub access: Option<String>,
    pub refresh: Option<String>,
}

impl Session {
    /// Read both auth cookies from the jar. Empty values count as absent.
    pub fn from_jar(jar: &CookieJar) -> Self {
        let read = |name: &str| {
            jar.get(name)
                .map(|c| c.value().to_string())
                .filter(|v| !v.is_empty())
        };
        Self {
            access: read(ACCESS_COOKIE),
            refresh: read(REFRESH_COOKIE),
        }
    }

    /// Whether the request carried any auth cookie at all.
    pub fn is_empty(&self) -> bool {
        self.access.is_none() && self.refresh.is_none()
    }
}

fn auth_cookie(name: &'static str, value: String, max_age: time::Duration, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(max_age)
        .build()
}

/// Build the `access-token` cookie.
pub fn access_cookie(value: String, secure: bool) -> Cookie<'static> {
    auth_cookie(ACCESS_COOKIE, value, ACCESS_TOKEN_MAX_AGE, secure)
}

/// Build the `refresh-token` cookie.
pub fn refresh_cookie(value: String, secure: bool) -> Cookie<'static> {
    auth_cookie(REFRESH_COOKIE, value, REFRESH_TOKEN_MAX_AGE, secure)
}

/// Build a removal cookie with attributes matching the creation attributes,
/// so browsers actually drop it.
pub fn expired_cookie(name: &'static str, secure: bool) -> Cookie<'static> {
    auth_cookie(name, String::new(), time::Duration::ZERO, secure)
}

/// Add a renewed `access-token` cookie to the jar when the refresh-and-retry
/// engine produced one.
pub fn apply_renewed(jar: CookieJar, renewed: Option<String>, secure: bool) -> CookieJar {
    match renewed {
        Some(token) => jar.add(access_cookie(token, secure)),
        None => jar,
    }
}

/// Middleware clearing stale auth cookies on unauthenticated responses.
///
/// Whenever a request that carried auth cookies ends in 401 — expired access
/// token with no usable refresh token, rejected refresh, failed retry — both
/// cookies are expired on the response so the browser stops resending dead
/// credentials.
pub async fn clear_stale_cookies(request: Request, next: Next) -> Response {
    let jar = CookieJar::from_headers(request.headers());
    let had_cookies = !Session::from_jar(&jar).is_empty();
    let secure = request
        .uri()
        .scheme_str()
        .map(|s| s == "https")
        .unwrap_or(false);

    let mut response = next.run(request).await;

    if response.status() == StatusCode::UNAUTHORIZED && had_cookies {
        for name in [ACCESS_COOKIE, REFRESH_COOKIE] {
            let cookie = expired_cookie(name, secure);
            if let Ok(value) = HeaderValue::from_str(&cookie.to_string()) {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
        }
    }

    response
}
