// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Backend API client and the authorized-call engine.
//!
//! Handles:
//! - Login and token refresh against the backend token endpoints
//! - Generic authorized JSON calls on behalf of the browser
//! - The refresh-and-retry contract: one refresh, one retry, never more
//!
//! Every proxy route funnels its upstream call through
//! [`BackendService::with_refresh`], so the 401-refresh-retry behavior lives
//! in exactly one place.

use crate::error::AppError;
use crate::middleware::Session;
use crate::models::{LoginUpstream, UserInfo};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Low-level backend API client.
#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Exchange credentials for a token pair and the user record.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginUpstream, AppError> {
        let body = serde_json::json!({ "email": email, "password": password });
        let response = self
            .http
            .post(self.url("/api/auth/login/"))
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Login request failed: {}", e)))?;

        self.check_public_json(response).await
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// A 4xx from the backend means the refresh token is invalid or expired,
    /// which ends the session.
    pub async fn refresh(&self, refresh_token: &str) -> Result<String, AppError> {
        let body = serde_json::json!({ "refresh": refresh_token });
        let response = self
            .http
            .post(self.url("/api/token/refresh/"))
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Token refresh request failed: {}", e)))?;

        let status = response.status();
        if status.is_client_error() {
            tracing::info!(status = status.as_u16(), "Refresh token rejected by backend");
            return Err(AppError::Unauthorized);
        }

        let payload: Value = self.check_json(response).await?;
        payload
            .get("access")
            .and_then(|v| v.as_str())
            .map(String::from)
            .ok_or_else(|| AppError::Upstream("Refresh response missing access token".to_string()))
    }

    /// Authorized GET returning the raw JSON payload.
    pub async fn get_value(
        &self,
        path: &str,
        query: &[(String, String)],
        access_token: &str,
    ) -> Result<Value, AppError> {
        let response = self
            .http
            .get(self.url(path))
            .query(query)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?;

        self.check_json(response).await
    }

    /// Authorized GET deserialized into a typed model.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        access_token: &str,
    ) -> Result<T, AppError> {
        let response = self
            .http
            .get(self.url(path))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?;

        self.check_json(response).await
    }

    /// Authorized request with a JSON body (PUT/POST/PATCH), forwarding the
    /// browser's CSRF token when present.
    pub async fn send_json(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &Value,
        csrf_token: Option<&str>,
        access_token: &str,
    ) -> Result<Value, AppError> {
        let mut request = self
            .http
            .request(method, self.url(path))
            .bearer_auth(access_token)
            .json(body);

        if let Some(csrf) = csrf_token {
            request = request.header("X-CSRFToken", csrf);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?;

        self.check_json(response).await
    }

    /// Authorized raw-body POST (multipart uploads are forwarded untouched,
    /// boundary and all, via the original Content-Type header).
    pub async fn post_bytes(
        &self,
        path: &str,
        body: Vec<u8>,
        content_type: Option<String>,
        access_token: &str,
    ) -> Result<Value, AppError> {
        let mut request = self
            .http
            .post(self.url(path))
            .bearer_auth(access_token)
            .body(body);

        if let Some(ct) = content_type {
            request = request.header(reqwest::header::CONTENT_TYPE, ct);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?;

        self.check_json(response).await
    }

    /// Unauthenticated POST (password-reset flows).
    pub async fn post_public(&self, path: &str, body: &Value) -> Result<Value, AppError> {
        let response = self
            .http
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?;

        self.check_public_json(response).await
    }

    /// Fetch the caller's user-info record (includes the intranet credential).
    pub async fn user_info(&self, access_token: &str) -> Result<UserInfo, AppError> {
        self.get_json("/user/user-info/", access_token).await
    }

    /// Obtain a CSRF token from the backend.
    ///
    /// Django sets `csrftoken` as a cookie on any GET; the token is read out
    /// of the Set-Cookie headers of the API root.
    pub async fn fetch_csrf_token(&self) -> Result<String, AppError> {
        let response = self
            .http
            .get(self.url("/api/"))
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("CSRF request failed: {}", e)))?;

        response
            .headers()
            .get_all(reqwest::header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find_map(|cookie| {
                cookie
                    .split(';')
                    .next()
                    .and_then(|pair| pair.trim().strip_prefix("csrftoken="))
                    .map(String::from)
            })
            .ok_or_else(|| AppError::Upstream("Backend did not issue a CSRF token".to_string()))
    }

    /// Check an authorized response: 401 marks the bearer token as rejected
    /// (candidate for a refresh retry), other 4xx are propagated, 5xx
    /// collapse to a gateway error.
    async fn check_json<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();

            if status.as_u16() == 401 {
                return Err(AppError::TokenRejected);
            }
            if status.is_client_error() {
                return Err(AppError::UpstreamStatus {
                    status: status.as_u16(),
                    message: upstream_message(&body),
                });
            }
            return Err(AppError::Upstream(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("JSON parse error: {}", e)))
    }

    /// Check an unauthenticated response: every 4xx (including 401, e.g. bad
    /// credentials at login) is propagated with the backend's message.
    async fn check_public_json<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();

            if status.is_client_error() {
                return Err(AppError::UpstreamStatus {
                    status: status.as_u16(),
                    message: upstream_message(&body),
                });
            }
            return Err(AppError::Upstream(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("JSON parse error: {}", e)))
    }
}

/// Pull a human-readable message out of a backend error body.
/// Django-style bodies carry `message`, `detail` or `error`.
fn upstream_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            ["message", "detail", "error"]
                .iter()
                .find_map(|key| v.get(key).and_then(|m| m.as_str()).map(String::from))
        })
        .unwrap_or_else(|| {
            if body.is_empty() {
                "backend_error".to_string()
            } else {
                body.chars().take(200).collect()
            }
        })
}

// ─────────────────────────────────────────────────────────────────────────────
// BackendService - authorized calls with the refresh-and-retry contract
// ─────────────────────────────────────────────────────────────────────────────

/// Result of an authorized backend call, carrying the renewed access token
/// when a mid-request refresh happened so the route can set the new cookie.
pub struct ProxyOutcome<T> {
    pub value: T,
    pub renewed_access: Option<String>,
}

/// High-level backend service implementing the authorized-call contract.
#[derive(Clone)]
pub struct BackendService {
    client: BackendClient,
}

impl BackendService {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: BackendClient::new(base_url),
        }
    }

    /// The low-level client, for calls that manage tokens themselves
    /// (login, explicit refresh, password-reset flows).
    pub fn client(&self) -> &BackendClient {
        &self.client
    }

    /// Run an authorized operation under the refresh-and-retry contract.
    ///
    /// - No tokens in the session: fail unauthenticated without touching the
    ///   backend.
    /// - Access token present: run the operation once. If the backend rejects
    ///   the token (401) and a refresh token exists, refresh once and retry
    ///   once; the renewed token is returned for cookie propagation.
    /// - Access token absent but refresh token present (the access cookie
    ///   already expired out of the browser jar): refresh first, then run the
    ///   operation once.
    ///
    /// At most one refresh and one retry per call. A failed refresh or a
    /// rejected retry ends the session as unauthenticated.
    pub async fn with_refresh<T, F, Fut>(
        &self,
        session: &Session,
        op: F,
    ) -> Result<ProxyOutcome<T>, AppError>
    where
        F: Fn(String) -> Fut,
        Fut: std::future::Future<Output = Result<T, AppError>>,
    {
        match &session.access {
            Some(access) => match op(access.clone()).await {
                Ok(value) => Ok(ProxyOutcome {
                    value,
                    renewed_access: None,
                }),
                Err(AppError::TokenRejected) if session.refresh.is_some() => {
                    tracing::info!("Access token rejected, refreshing");
                    self.refresh_and_run(session, op).await
                }
                Err(AppError::TokenRejected) => Err(AppError::Unauthorized),
                Err(e) => Err(e),
            },
            None if session.refresh.is_some() => {
                tracing::info!("No access token in session, refreshing before call");
                self.refresh_and_run(session, op).await
            }
            None => Err(AppError::Unauthorized),
        }
    }

    /// Refresh the access token and run the operation exactly once.
    async fn refresh_and_run<T, F, Fut>(
        &self,
        session: &Session,
        op: F,
    ) -> Result<ProxyOutcome<T>, AppError>
    where
        F: Fn(String) -> Fut,
        Fut: std::future::Future<Output = Result<T, AppError>>,
    {
        let refresh_token = session.refresh.as_deref().ok_or(AppError::Unauthorized)?;

        let new_access = self.client.refresh(refresh_token).await?;

        match op(new_access.clone()).await {
            Ok(value) => Ok(ProxyOutcome {
                value,
                renewed_access: Some(new_access),
            }),
            // The freshly issued token was rejected too; do not loop.
            Err(AppError::TokenRejected) => Err(AppError::Unauthorized),
            Err(e) => Err(e),
        }
    }
}
